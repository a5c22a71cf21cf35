//! A [`Backend`] that performs no graphics work: every resource creation
//! hands out a fresh opaque id and every command simply succeeds. Useful for
//! exercising `deepsea-render`'s state machine and validation in a test
//! environment without a real GPU driver behind it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use deepsea_render::backend::{Backend, Rect2i};
use deepsea_render::command_buffer::{ClearAttachment, DrawIndirectArgs, DrawRange, IndexedDrawRange};
use deepsea_render::config::{RenderSurfaceType, VSync};
use deepsea_render::error::Result;
use deepsea_render::render_pass::RenderPassDescription;
use deepsea_render::resource::{BufferUsage, Dimension, GfxFormat, RenderbufferUsage, TextureUsage};

/// An opaque id handed out by [`EmptyBackend`] in place of a real driver
/// handle. Carries no resource-specific state: there is nothing to free.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EmptyHandle(u64);

impl fmt::Debug for EmptyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmptyHandle({})", self.0)
    }
}

/// A no-op [`Backend`]. Every create call allocates a fresh [`EmptyHandle`]
/// from a monotonic counter; every other call is a successful no-op.
pub struct EmptyBackend {
    next_handle: AtomicU64,
}

impl EmptyBackend {
    pub fn new() -> Self {
        EmptyBackend { next_handle: AtomicU64::new(1) }
    }

    fn allocate(&self) -> EmptyHandle {
        EmptyHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EmptyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for EmptyBackend {
    type CommandBufferPool = EmptyHandle;
    type RenderSurfaceHandle = EmptyHandle;
    type RenderPassHandle = EmptyHandle;
    type FramebufferHandle = EmptyHandle;
    type BufferHandle = EmptyHandle;
    type TextureHandle = EmptyHandle;
    type RenderbufferHandle = EmptyHandle;
    type ShaderHandle = EmptyHandle;
    type FenceHandle = EmptyHandle;
    type QueryPoolHandle = EmptyHandle;

    fn destroy(&self) -> Result<()> {
        Ok(())
    }

    fn begin_frame(&self) -> Result<()> {
        Ok(())
    }

    fn end_frame(&self) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn wait_until_idle(&self) -> Result<()> {
        Ok(())
    }

    fn restore_global_state(&self) -> Result<()> {
        Ok(())
    }

    fn set_extra_debugging(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    fn set_surface_samples(&self, _samples: u32) -> Result<()> {
        Ok(())
    }

    fn set_default_samples(&self, _samples: u32) -> Result<()> {
        Ok(())
    }

    fn set_vsync(&self, _vsync: VSync) -> Result<()> {
        Ok(())
    }

    fn set_default_anisotropy(&self, _anisotropy: f32) -> Result<()> {
        Ok(())
    }

    fn create_render_surface(&self, _name: &str, _os_handle: u64, _surface_type: RenderSurfaceType, width_hint: u32, height_hint: u32) -> Result<(Self::RenderSurfaceHandle, u32, u32)> {
        Ok((self.allocate(), width_hint, height_hint))
    }

    fn destroy_render_surface(&self, _handle: Self::RenderSurfaceHandle) -> Result<()> {
        Ok(())
    }

    fn update_render_surface(&self, _handle: &Self::RenderSurfaceHandle, _width_hint: u32, _height_hint: u32) -> Result<Option<(u32, u32)>> {
        Ok(None)
    }

    fn begin_render_surface(&self, _handle: &Self::RenderSurfaceHandle) -> Result<()> {
        Ok(())
    }

    fn end_render_surface(&self, _handle: &Self::RenderSurfaceHandle) -> Result<()> {
        Ok(())
    }

    fn swap_render_surface_buffers(&self, _surfaces: &[&Self::RenderSurfaceHandle]) -> Result<()> {
        Ok(())
    }

    fn create_buffer(&self, _size: u64, _usage: BufferUsage) -> Result<Self::BufferHandle> {
        Ok(self.allocate())
    }

    fn destroy_buffer(&self, _handle: Self::BufferHandle) -> Result<()> {
        Ok(())
    }

    fn create_texture(
        &self,
        _dimension: Dimension,
        _format: GfxFormat,
        _width: u32,
        _height: u32,
        _depth: u32,
        _mip_levels: u32,
        _samples: u32,
        _usage: TextureUsage,
    ) -> Result<Self::TextureHandle> {
        Ok(self.allocate())
    }

    fn destroy_texture(&self, _handle: Self::TextureHandle) -> Result<()> {
        Ok(())
    }

    fn create_renderbuffer(&self, _format: GfxFormat, _width: u32, _height: u32, _samples: u32, _usage: RenderbufferUsage) -> Result<Self::RenderbufferHandle> {
        Ok(self.allocate())
    }

    fn destroy_renderbuffer(&self, _handle: Self::RenderbufferHandle) -> Result<()> {
        Ok(())
    }

    fn create_framebuffer(&self, _width: u32, _height: u32, _layers: u32) -> Result<Self::FramebufferHandle> {
        Ok(self.allocate())
    }

    fn destroy_framebuffer(&self, _handle: Self::FramebufferHandle) -> Result<()> {
        Ok(())
    }

    fn create_shader(&self, _module: &[u8]) -> Result<Self::ShaderHandle> {
        Ok(self.allocate())
    }

    fn destroy_shader(&self, _handle: Self::ShaderHandle) -> Result<()> {
        Ok(())
    }

    fn create_command_buffer_pool(&self) -> Result<Self::CommandBufferPool> {
        Ok(self.allocate())
    }

    fn destroy_command_buffer_pool(&self, _pool: Self::CommandBufferPool) -> Result<()> {
        Ok(())
    }

    fn reset_command_buffer_pool(&self, _pool: &Self::CommandBufferPool) -> Result<()> {
        Ok(())
    }

    fn begin_command_buffer(&self, _pool: &Self::CommandBufferPool) -> Result<()> {
        Ok(())
    }

    fn begin_secondary_command_buffer(&self, _pool: &Self::CommandBufferPool) -> Result<()> {
        Ok(())
    }

    fn end_command_buffer(&self, _pool: &Self::CommandBufferPool) -> Result<()> {
        Ok(())
    }

    fn submit_command_buffer(&self, _primary: &Self::CommandBufferPool, _secondary: Option<&Self::CommandBufferPool>) -> Result<()> {
        Ok(())
    }

    fn create_render_pass(&self, _description: &RenderPassDescription) -> Result<Self::RenderPassHandle> {
        Ok(self.allocate())
    }

    fn destroy_render_pass(&self, _handle: Self::RenderPassHandle) -> Result<()> {
        Ok(())
    }

    fn begin_render_pass(&self, _pool: &Self::CommandBufferPool, _pass: &Self::RenderPassHandle, _framebuffer: &Self::FramebufferHandle, _viewport: Rect2i, _secondary: bool) -> Result<()> {
        Ok(())
    }

    fn next_render_subpass(&self, _pool: &Self::CommandBufferPool, _pass: &Self::RenderPassHandle, _subpass_index: u32, _secondary: bool) -> Result<()> {
        Ok(())
    }

    fn end_render_pass(&self, _pool: &Self::CommandBufferPool, _pass: &Self::RenderPassHandle) -> Result<()> {
        Ok(())
    }

    fn set_viewport(&self, _pool: &Self::CommandBufferPool, _viewport: Rect2i) -> Result<()> {
        Ok(())
    }

    fn clear_attachments(&self, _pool: &Self::CommandBufferPool, _attachments: &[ClearAttachment]) -> Result<()> {
        Ok(())
    }

    fn draw(&self, _pool: &Self::CommandBufferPool, _range: DrawRange) -> Result<()> {
        Ok(())
    }

    fn draw_indexed(&self, _pool: &Self::CommandBufferPool, _range: IndexedDrawRange) -> Result<()> {
        Ok(())
    }

    fn draw_indirect(&self, _pool: &Self::CommandBufferPool, _buffer: &Self::BufferHandle, _args: DrawIndirectArgs) -> Result<()> {
        Ok(())
    }

    fn draw_indexed_indirect(&self, _pool: &Self::CommandBufferPool, _buffer: &Self::BufferHandle, _args: DrawIndirectArgs) -> Result<()> {
        Ok(())
    }

    fn dispatch_compute(&self, _pool: &Self::CommandBufferPool, _x: u32, _y: u32, _z: u32) -> Result<()> {
        Ok(())
    }

    fn dispatch_compute_indirect(&self, _pool: &Self::CommandBufferPool, _buffer: &Self::BufferHandle, _offset: u64) -> Result<()> {
        Ok(())
    }

    fn blit_surface(&self, _pool: &Self::CommandBufferPool, _src: Rect2i, _dst: Rect2i) -> Result<()> {
        Ok(())
    }

    fn push_debug_group(&self, _pool: &Self::CommandBufferPool, _name: &str) -> Result<()> {
        Ok(())
    }

    fn pop_debug_group(&self, _pool: &Self::CommandBufferPool) -> Result<()> {
        Ok(())
    }

    fn memory_barrier(&self, _pool: &Self::CommandBufferPool, _before_stages: u32, _after_stages: u32) -> Result<()> {
        Ok(())
    }

    fn timestamp_period(&self) -> f64 {
        // Zero disables the profiler (spec behavior); a real backend reports
        // its actual tick length.
        0.0
    }

    fn create_query_pool(&self, _query_count: u32) -> Result<Self::QueryPoolHandle> {
        Ok(self.allocate())
    }

    fn destroy_query_pool(&self, _handle: Self::QueryPoolHandle) -> Result<()> {
        Ok(())
    }

    fn write_timestamp(&self, _pool: &Self::CommandBufferPool, _queries: &Self::QueryPoolHandle, _query_index: u32) -> Result<()> {
        Ok(())
    }

    fn get_query_timestamp(&self, _queries: &Self::QueryPoolHandle, _query_index: u32) -> Result<Option<u64>> {
        Ok(Some(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_hands_out_distinct_handles() {
        let backend = EmptyBackend::new();
        let a = backend.create_buffer(256, BufferUsage::UNIFORM_BLOCK).unwrap();
        let b = backend.create_buffer(256, BufferUsage::UNIFORM_BLOCK).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn profiler_is_disabled_by_default() {
        assert_eq!(EmptyBackend::new().timestamp_period(), 0.0);
    }
}
