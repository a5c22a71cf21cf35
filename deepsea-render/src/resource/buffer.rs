//! GPU buffers (spec §3 `GfxBuffer`).

use bitflags::bitflags;

use crate::backend::Backend;
use crate::error::{Error, ErrorKind, Result};

use super::internal_ref::InternalRefCount;

bitflags! {
    /// How a buffer may be used; at least these usages are backend-visible.
    pub struct BufferUsage: u32 {
        const INDIRECT_DRAW = 0x001;
        const INDIRECT_DISPATCH = 0x002;
        const UNIFORM_BLOCK = 0x004;
        const UNIFORM_BUFFER = 0x008;
        const TEXTURE_BUFFER = 0x010;
        const IMAGE_BUFFER = 0x020;
        const VERTEX = 0x040;
        const INDEX = 0x080;
        const COPY_FROM = 0x100;
        const COPY_TO = 0x200;
    }
}

/// The mapped range of a buffer currently visible to the CPU, if any.
#[derive(Copy, Clone, Debug, Default)]
pub struct MapState {
    pub offset: u64,
    pub size: u64,
    pub mapped: bool,
}

/// A GPU buffer: vertex/index data, uniforms, indirect-draw arguments, or a
/// texel buffer, depending on `usage`.
pub struct GfxBuffer<B: Backend> {
    handle: Option<B::BufferHandle>,
    size: u64,
    usage: BufferUsage,
    map_state: MapState,
    internal_ref: InternalRefCount,
}

impl<B: Backend> GfxBuffer<B> {
    pub(crate) fn new(handle: B::BufferHandle, size: u64, usage: BufferUsage) -> Self {
        GfxBuffer { handle: Some(handle), size, usage, map_state: MapState::default(), internal_ref: InternalRefCount::new() }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn map_state(&self) -> MapState {
        self.map_state
    }

    /// Records that `[offset, offset + size)` is mapped for CPU access.
    /// Fails with [`ErrorKind::OutOfRange`] if the range exceeds the
    /// buffer, or [`ErrorKind::PermissionDenied`] if already mapped.
    pub fn map(&mut self, offset: u64, size: u64) -> Result<()> {
        if self.map_state.mapped {
            return Err(Error::new(ErrorKind::PermissionDenied, "buffer is already mapped"));
        }
        if offset.checked_add(size).map_or(true, |end| end > self.size) {
            return Err(Error::new(ErrorKind::OutOfRange, "map range exceeds buffer size"));
        }
        self.map_state = MapState { offset, size, mapped: true };
        Ok(())
    }

    pub fn unmap(&mut self) {
        self.map_state.mapped = false;
    }

    pub(crate) fn internal_ref(&self) -> &InternalRefCount {
        &self.internal_ref
    }

    pub(crate) fn handle(&self) -> &B::BufferHandle {
        self.handle.as_ref().expect("buffer already destroyed")
    }

    pub(crate) fn take_handle(&mut self) -> B::BufferHandle {
        self.handle.take().expect("buffer already destroyed")
    }
}
