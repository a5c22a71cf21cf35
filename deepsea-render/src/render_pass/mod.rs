//! Render passes (spec §3 `RenderPass`, §4.6): attachments, subpasses, and
//! the dependency graph that orders GPU work between them.

mod builder;
mod types;
mod validate;

pub use builder::derive_default_dependencies;
pub use types::{
    AccessTypes, AttachmentInfo, AttachmentRef, AttachmentUsage, PipelineStages, RenderPassDescription, SubpassDependency, SubpassInfo, EXTERNAL_SUBPASS,
    NO_ATTACHMENT,
};
pub use validate::validate_render_pass_description;

use crate::backend::Backend;
use crate::error::Result;
use crate::resource::RenderPassId;

/// A validated, backend-created render pass. Construction fills in default
/// subpass dependencies when the caller left `subpass_dependencies` empty.
pub struct RenderPass<B: Backend> {
    handle: Option<B::RenderPassHandle>,
    description: RenderPassDescription,
}

impl<B: Backend> RenderPass<B> {
    /// Validates `description` (deriving default dependencies first if none
    /// were supplied), then asks the backend to create it.
    pub(crate) fn create(backend: &B, mut description: RenderPassDescription, max_color_attachments: u32, requires_any_surface: bool) -> Result<Self> {
        if description.subpass_dependencies.is_empty() && !description.subpasses.is_empty() {
            description.subpass_dependencies = derive_default_dependencies(&description);
        }
        validate_render_pass_description(&description, max_color_attachments, requires_any_surface)?;
        let handle = backend.create_render_pass(&description)?;
        Ok(RenderPass { handle: Some(handle), description })
    }

    pub fn description(&self) -> &RenderPassDescription {
        &self.description
    }

    pub fn attachment_count(&self) -> usize {
        self.description.attachments.len()
    }

    pub fn subpass_count(&self) -> usize {
        self.description.subpasses.len()
    }

    pub(crate) fn handle(&self) -> &B::RenderPassHandle {
        self.handle.as_ref().expect("render pass already destroyed")
    }

    pub(crate) fn take_handle(&mut self) -> B::RenderPassHandle {
        self.handle.take().expect("render pass already destroyed")
    }
}

/// Keys a [`RenderPass`] in the renderer's resource tables; kept alongside
/// the type for symmetry with the other resource ID re-exports.
pub type Id = RenderPassId;
