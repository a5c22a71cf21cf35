//! Renderbuffers (spec §3 `Renderbuffer`): single-sample or multisample
//! attachment-only storage, never sampled directly.

use bitflags::bitflags;

use crate::backend::Backend;
use crate::resource::GfxFormat;

use super::internal_ref::InternalRefCount;

bitflags! {
    pub struct RenderbufferUsage: u32 {
        const CLEAR = 0x1;
        const BLIT_FROM = 0x2;
        const BLIT_TO = 0x4;
        const CONTINUE = 0x8;
    }
}

pub struct Renderbuffer<B: Backend> {
    handle: Option<B::RenderbufferHandle>,
    width: u32,
    height: u32,
    samples: u32,
    format: GfxFormat,
    usage: RenderbufferUsage,
    internal_ref: InternalRefCount,
}

impl<B: Backend> Renderbuffer<B> {
    pub(crate) fn new(handle: B::RenderbufferHandle, width: u32, height: u32, samples: u32, format: GfxFormat, usage: RenderbufferUsage) -> Self {
        Renderbuffer { handle: Some(handle), width, height, samples, format, usage, internal_ref: InternalRefCount::new() }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn format(&self) -> GfxFormat {
        self.format
    }

    pub fn usage(&self) -> RenderbufferUsage {
        self.usage
    }

    pub(crate) fn internal_ref(&self) -> &InternalRefCount {
        &self.internal_ref
    }

    pub(crate) fn handle(&self) -> &B::RenderbufferHandle {
        self.handle.as_ref().expect("renderbuffer already destroyed")
    }

    pub(crate) fn take_handle(&mut self) -> B::RenderbufferHandle {
        self.handle.take().expect("renderbuffer already destroyed")
    }
}
