//! Textures and offscreens (spec §3 `Texture / Offscreen`).

use bitflags::bitflags;

use crate::backend::Backend;
use crate::resource::GfxFormat;

use super::internal_ref::InternalRefCount;

/// The dimensionality of a texture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    D1,
    D2,
    D3,
    Cube,
}

bitflags! {
    pub struct TextureUsage: u32 {
        const TEXTURE = 0x01;
        const IMAGE = 0x02;
        const COPY_FROM = 0x04;
        const COPY_TO = 0x08;
        const OFFSCREEN_CONTINUE = 0x10;
    }
}

/// A texture or offscreen render target.
pub struct Texture<B: Backend> {
    handle: Option<B::TextureHandle>,
    dimension: Dimension,
    width: u32,
    height: u32,
    depth: u32,
    mip_levels: u32,
    samples: u32,
    format: GfxFormat,
    resolve: bool,
    usage: TextureUsage,
    internal_ref: InternalRefCount,
}

impl<B: Backend> Texture<B> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        handle: B::TextureHandle,
        dimension: Dimension,
        width: u32,
        height: u32,
        depth: u32,
        mip_levels: u32,
        samples: u32,
        format: GfxFormat,
        resolve: bool,
        usage: TextureUsage,
    ) -> Self {
        Texture {
            handle: Some(handle),
            dimension,
            width,
            height,
            depth,
            mip_levels,
            samples,
            format,
            resolve,
            usage,
            internal_ref: InternalRefCount::new(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn format(&self) -> GfxFormat {
        self.format
    }

    pub fn resolve(&self) -> bool {
        self.resolve
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    /// Whether this texture can serve as a framebuffer attachment input,
    /// per spec §4.9's "inputs are offscreens" begin-pass check.
    pub fn is_offscreen(&self) -> bool {
        self.usage.contains(TextureUsage::OFFSCREEN_CONTINUE) || self.usage.contains(TextureUsage::COPY_TO)
    }

    pub(crate) fn internal_ref(&self) -> &InternalRefCount {
        &self.internal_ref
    }

    pub(crate) fn handle(&self) -> &B::TextureHandle {
        self.handle.as_ref().expect("texture already destroyed")
    }

    pub(crate) fn take_handle(&mut self) -> B::TextureHandle {
        self.handle.take().expect("texture already destroyed")
    }
}
