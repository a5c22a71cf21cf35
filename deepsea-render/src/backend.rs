//! The backend vtable (spec §6): an opaque-object-plus-function-table
//! boundary the render core calls through. Grounded on the teacher's
//! `hal::Backend` associated-type pattern (`src/hal/src/lib.rs`) — one
//! opaque, `Debug + Send + Sync` handle type per resource kind instead of
//! the source's "first field is the base struct" downcasting.
//!
//! A concrete backend (OpenGL, Vulkan, Metal, ... in the source; the
//! `deepsea-render-empty` no-op stand-in here) implements this trait once,
//! chosen at compile time as `Renderer<B>`'s type parameter — static
//! dispatch per spec §9's redesign note, rather than a boxed trait object.
//! Every method takes `&self`: a backend is shared across threads exactly
//! as a [`crate::renderer::Renderer`] is, and owns its own synchronization.

use std::fmt::Debug;

use crate::command_buffer::{ClearAttachment, DrawIndirectArgs, DrawRange, IndexedDrawRange};
use crate::config::{RenderSurfaceType, VSync};
use crate::error::Result;
use crate::render_pass::RenderPassDescription;
use crate::resource::{BufferUsage, Dimension, GfxFormat, RenderbufferUsage, TextureUsage};

/// A rectangular region of a framebuffer or surface, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Rect2i {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The concrete GPU driver a [`crate::renderer::Renderer`] is built on.
pub trait Backend: 'static + Send + Sync {
    /// Backend-private state for a pool of command buffers.
    type CommandBufferPool: Debug + Send + Sync;
    /// Backend-private state for a render surface (window, pixmap, or
    /// offscreen target).
    type RenderSurfaceHandle: Debug + Send + Sync;
    /// Backend-private state for a compiled render pass.
    type RenderPassHandle: Debug + Send + Sync;
    /// Backend-private state for a framebuffer.
    type FramebufferHandle: Debug + Send + Sync;
    /// Backend-private state for a GPU buffer.
    type BufferHandle: Debug + Send + Sync;
    /// Backend-private state for a texture or offscreen.
    type TextureHandle: Debug + Send + Sync;
    /// Backend-private state for a renderbuffer.
    type RenderbufferHandle: Debug + Send + Sync;
    /// Backend-private state for a shader module.
    type ShaderHandle: Debug + Send + Sync;
    /// Backend-private completion token read back by [`crate::fence_sync`].
    type FenceHandle: Debug + Send + Sync;
    /// Backend-private state for a fixed-capacity GPU timestamp query pool.
    type QueryPoolHandle: Debug + Send + Sync;

    // -- Lifecycle --
    fn destroy(&self) -> Result<()>;
    fn begin_frame(&self) -> Result<()>;
    fn end_frame(&self) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn wait_until_idle(&self) -> Result<()>;
    fn restore_global_state(&self) -> Result<()>;
    fn set_extra_debugging(&self, enabled: bool) -> Result<()>;

    // -- Capability tuning --
    fn set_surface_samples(&self, samples: u32) -> Result<()>;
    fn set_default_samples(&self, samples: u32) -> Result<()>;
    fn set_vsync(&self, vsync: VSync) -> Result<()>;
    fn set_default_anisotropy(&self, anisotropy: f32) -> Result<()>;

    // -- Render surfaces --
    fn create_render_surface(
        &self,
        name: &str,
        os_handle: u64,
        surface_type: RenderSurfaceType,
        width_hint: u32,
        height_hint: u32,
    ) -> Result<(Self::RenderSurfaceHandle, u32, u32)>;
    fn destroy_render_surface(&self, handle: Self::RenderSurfaceHandle) -> Result<()>;
    fn update_render_surface(&self, handle: &Self::RenderSurfaceHandle, width_hint: u32, height_hint: u32) -> Result<Option<(u32, u32)>>;
    fn begin_render_surface(&self, handle: &Self::RenderSurfaceHandle) -> Result<()>;
    fn end_render_surface(&self, handle: &Self::RenderSurfaceHandle) -> Result<()>;
    fn swap_render_surface_buffers(&self, surfaces: &[&Self::RenderSurfaceHandle]) -> Result<()>;

    // -- Resources --
    fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<Self::BufferHandle>;
    fn destroy_buffer(&self, handle: Self::BufferHandle) -> Result<()>;
    #[allow(clippy::too_many_arguments)]
    fn create_texture(
        &self,
        dimension: Dimension,
        format: GfxFormat,
        width: u32,
        height: u32,
        depth: u32,
        mip_levels: u32,
        samples: u32,
        usage: TextureUsage,
    ) -> Result<Self::TextureHandle>;
    fn destroy_texture(&self, handle: Self::TextureHandle) -> Result<()>;
    fn create_renderbuffer(&self, format: GfxFormat, width: u32, height: u32, samples: u32, usage: RenderbufferUsage) -> Result<Self::RenderbufferHandle>;
    fn destroy_renderbuffer(&self, handle: Self::RenderbufferHandle) -> Result<()>;
    fn create_framebuffer(&self, width: u32, height: u32, layers: u32) -> Result<Self::FramebufferHandle>;
    fn destroy_framebuffer(&self, handle: Self::FramebufferHandle) -> Result<()>;
    fn create_shader(&self, module: &[u8]) -> Result<Self::ShaderHandle>;
    fn destroy_shader(&self, handle: Self::ShaderHandle) -> Result<()>;

    // -- Command buffers --
    fn create_command_buffer_pool(&self) -> Result<Self::CommandBufferPool>;
    fn destroy_command_buffer_pool(&self, pool: Self::CommandBufferPool) -> Result<()>;
    fn reset_command_buffer_pool(&self, pool: &Self::CommandBufferPool) -> Result<()>;
    fn begin_command_buffer(&self, pool: &Self::CommandBufferPool) -> Result<()>;
    fn begin_secondary_command_buffer(&self, pool: &Self::CommandBufferPool) -> Result<()>;
    fn end_command_buffer(&self, pool: &Self::CommandBufferPool) -> Result<()>;
    fn submit_command_buffer(&self, primary: &Self::CommandBufferPool, secondary: Option<&Self::CommandBufferPool>) -> Result<()>;

    // -- Render passes --
    fn create_render_pass(&self, description: &RenderPassDescription) -> Result<Self::RenderPassHandle>;
    fn destroy_render_pass(&self, handle: Self::RenderPassHandle) -> Result<()>;
    fn begin_render_pass(&self, pool: &Self::CommandBufferPool, pass: &Self::RenderPassHandle, framebuffer: &Self::FramebufferHandle, viewport: Rect2i, secondary: bool) -> Result<()>;
    fn next_render_subpass(&self, pool: &Self::CommandBufferPool, pass: &Self::RenderPassHandle, subpass_index: u32, secondary: bool) -> Result<()>;
    fn end_render_pass(&self, pool: &Self::CommandBufferPool, pass: &Self::RenderPassHandle) -> Result<()>;

    // -- Recording --
    fn set_viewport(&self, pool: &Self::CommandBufferPool, viewport: Rect2i) -> Result<()>;
    fn clear_attachments(&self, pool: &Self::CommandBufferPool, attachments: &[ClearAttachment]) -> Result<()>;
    fn draw(&self, pool: &Self::CommandBufferPool, range: DrawRange) -> Result<()>;
    fn draw_indexed(&self, pool: &Self::CommandBufferPool, range: IndexedDrawRange) -> Result<()>;
    fn draw_indirect(&self, pool: &Self::CommandBufferPool, buffer: &Self::BufferHandle, args: DrawIndirectArgs) -> Result<()>;
    fn draw_indexed_indirect(&self, pool: &Self::CommandBufferPool, buffer: &Self::BufferHandle, args: DrawIndirectArgs) -> Result<()>;
    fn dispatch_compute(&self, pool: &Self::CommandBufferPool, x: u32, y: u32, z: u32) -> Result<()>;
    fn dispatch_compute_indirect(&self, pool: &Self::CommandBufferPool, buffer: &Self::BufferHandle, offset: u64) -> Result<()>;
    fn blit_surface(&self, pool: &Self::CommandBufferPool, src: Rect2i, dst: Rect2i) -> Result<()>;
    fn push_debug_group(&self, pool: &Self::CommandBufferPool, name: &str) -> Result<()>;
    fn pop_debug_group(&self, pool: &Self::CommandBufferPool) -> Result<()>;
    fn memory_barrier(&self, pool: &Self::CommandBufferPool, before_stages: u32, after_stages: u32) -> Result<()>;

    // -- Profiling --
    /// Nanoseconds represented by one tick of [`Self::write_timestamp`]. Zero
    /// disables the profiler entirely (spec §4.4).
    fn timestamp_period(&self) -> f64;
    fn create_query_pool(&self, query_count: u32) -> Result<Self::QueryPoolHandle>;
    fn destroy_query_pool(&self, handle: Self::QueryPoolHandle) -> Result<()>;
    fn write_timestamp(&self, pool: &Self::CommandBufferPool, queries: &Self::QueryPoolHandle, query_index: u32) -> Result<()>;
    /// Reads back a previously written timestamp, in backend ticks. `None`
    /// means the result is not yet available.
    fn get_query_timestamp(&self, queries: &Self::QueryPoolHandle, query_index: u32) -> Result<Option<u64>>;
}
