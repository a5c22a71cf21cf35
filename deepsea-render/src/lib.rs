//! Thread-safe, backend-agnostic render-graph execution core: GPU resource
//! lifecycle, draw-time validation, per-frame submission, and a cross-frame
//! GPU-timestamp profiler.
//!
//! A concrete GPU driver implements [`backend::Backend`] once; everything
//! else in this crate is generic over it and has no knowledge of any
//! particular graphics API.

pub mod backend;
pub mod command_buffer;
pub mod config;
pub mod draw_validation;
pub mod error;
pub mod fence_sync;
pub mod profiler;
pub mod projection;
pub mod render_pass;
pub mod renderer;
pub mod resource;
pub mod resource_command_buffers;
pub mod resource_manager;
pub mod shader_version;

pub use backend::{Backend, Rect2i};
pub use command_buffer::{ClearAttachment, ClearValue, CommandBuffer, CommandBufferUsage, DrawIndirectArgs, DrawRange, IndexedDrawRange, Viewport};
pub use config::{ProjectionOptions, RenderSurfaceType, RendererOptions, VSync};
pub use error::{Error, ErrorKind, Result};
pub use fence_sync::{FenceSync, FenceSyncPool, FenceSyncRef};
pub use profiler::{GpuProfiler, ProfileResult};
pub use render_pass::{AccessTypes, AttachmentInfo, AttachmentRef, AttachmentUsage, PipelineStages, RenderPass, RenderPassDescription, SubpassDependency, SubpassInfo};
pub use renderer::{Renderer, RendererCaps, RendererLimits};
pub use resource::{
    AttachmentSource, BufferId, BufferUsage, Dimension, Framebuffer, FramebufferId, GfxBuffer, GfxFormat, MapState, Renderbuffer, RenderbufferId,
    RenderbufferUsage, RenderPassId, RenderSurface, Rotation, ShaderId, ShaderModule, SurfaceId, Texture, TextureId, TextureUsage,
};
pub use resource_manager::{ResourceManager, ResourceStatistics};
