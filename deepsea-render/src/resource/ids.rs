//! Opaque resource handles returned by [`crate::renderer::Renderer`]'s
//! create calls, and looked up through its `ResourceManager`.
//!
//! Spec §9 replaces the source's "first field is the base struct"
//! downcasting with a typed handle per resource kind; we additionally keep
//! resource storage centralized (rather than `Arc`-shared) so a
//! render pass's attachment list and a framebuffer's surface list can both
//! name a resource without fighting the borrow checker over shared mutable
//! renderer state.

macro_rules! resource_id {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);
    };
}

resource_id!(BufferId);
resource_id!(TextureId);
resource_id!(RenderbufferId);
resource_id!(FramebufferId);
resource_id!(SurfaceId);
resource_id!(RenderPassId);
resource_id!(ShaderId);

/// Any attachable image resource: a texture/offscreen, a renderbuffer, or a
/// render surface, as referenced by a [`crate::resource::FramebufferSurface`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttachmentSource {
    Texture(TextureId),
    Renderbuffer(RenderbufferId),
    Surface(SurfaceId),
}
