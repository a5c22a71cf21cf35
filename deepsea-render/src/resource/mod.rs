//! GPU-visible resources: buffers, textures, renderbuffers, framebuffers,
//! render surfaces, and opaque shader objects.
//!
//! Resources live in the renderer's `ResourceManager` and are referenced
//! from elsewhere (a framebuffer's surface list, a bound-state field on a
//! command buffer) by the typed handles in [`ids`], not by `Arc`. Every
//! concrete resource still embeds an [`internal_ref::InternalRefCount`] per
//! spec §5's shared-resource policy, tracking GPU-side references taken
//! across a command buffer submission independently of the handle's own
//! lifetime.

mod buffer;
mod framebuffer;
pub mod ids;
pub(crate) mod internal_ref;
mod renderbuffer;
mod shader;
mod surface;
mod texture;

pub use buffer::{BufferUsage, GfxBuffer, MapState};
pub use framebuffer::{Framebuffer, FramebufferSurface};
pub use ids::{AttachmentSource, BufferId, FramebufferId, RenderPassId, RenderbufferId, ShaderId, SurfaceId, TextureId};
pub use internal_ref::InternalRefCount;
pub use renderbuffer::{Renderbuffer, RenderbufferUsage};
pub use shader::ShaderModule;
pub use surface::{RenderSurface, RenderSurfaceUsage, Rotation};
pub use texture::{Dimension, Texture, TextureUsage};

/// Pixel/vertex formats recognized by the render core. Intentionally small
/// relative to the source's format table: enough variety to distinguish
/// color-renderable, depth, stencil, and combined depth-stencil formats for
/// render-pass validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GfxFormat {
    R8G8B8A8Unorm,
    R8G8B8A8Srgb,
    R16G16B16A16Float,
    R32G32B32A32Float,
    D16Unorm,
    D24UnormS8Uint,
    D32Float,
    D32FloatS8Uint,
}

impl GfxFormat {
    /// Whether this format can be used as a color attachment.
    pub fn is_color(self) -> bool {
        !self.is_depth_stencil()
    }

    /// Whether this format carries a depth and/or stencil component.
    pub fn is_depth_stencil(self) -> bool {
        matches!(
            self,
            GfxFormat::D16Unorm | GfxFormat::D24UnormS8Uint | GfxFormat::D32Float | GfxFormat::D32FloatS8Uint
        )
    }

    /// Whether this format carries a stencil component.
    pub fn has_stencil(self) -> bool {
        matches!(self, GfxFormat::D24UnormS8Uint | GfxFormat::D32FloatS8Uint)
    }
}
