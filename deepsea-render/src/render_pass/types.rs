//! Render pass data model (spec §3): attachments, subpasses, and the
//! subpass dependency graph between them.

use bitflags::bitflags;

use crate::resource::GfxFormat;

/// Sentinel subpass index meaning "outside the render pass" in a
/// [`SubpassDependency`].
pub const EXTERNAL_SUBPASS: u32 = u32::MAX;
/// Sentinel attachment index meaning "no attachment bound" in an
/// [`AttachmentRef`].
pub const NO_ATTACHMENT: u32 = u32::MAX;

bitflags! {
    /// Pipeline stages a subpass dependency synchronizes between.
    pub struct PipelineStages: u32 {
        const FRAGMENT_SHADER = 0x01;
        const COLOR_OUTPUT = 0x02;
        const PRE_FRAGMENT_SHADER_TESTS = 0x04;
        const POST_FRAGMENT_SHADER_TESTS = 0x08;
        const ALL_GRAPHICS = 0x10;
    }
}

bitflags! {
    /// Memory access types a subpass dependency synchronizes between.
    pub struct AccessTypes: u32 {
        const INPUT_ATTACHMENT_READ = 0x01;
        const COLOR_ATTACHMENT_READ = 0x02;
        const COLOR_ATTACHMENT_WRITE = 0x04;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x08;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x10;
    }
}

bitflags! {
    /// How an attachment may be used across the render pass it belongs to.
    pub struct AttachmentUsage: u32 {
        const CLEAR = 0x1;
        const KEEP_BEFORE = 0x2;
        const KEEP_AFTER = 0x4;
    }
}

/// One attachment slot in a render pass.
#[derive(Clone, Debug)]
pub struct AttachmentInfo {
    pub format: GfxFormat,
    pub samples: u32,
    pub usage: AttachmentUsage,
}

/// A reference from a subpass to one of the render pass's attachments.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRef {
    pub index: u32,
    pub resolve: bool,
}

impl AttachmentRef {
    pub const NONE: AttachmentRef = AttachmentRef { index: NO_ATTACHMENT, resolve: false };

    pub fn is_bound(self) -> bool {
        self.index != NO_ATTACHMENT
    }
}

/// One subpass's attachment usage within a render pass.
#[derive(Clone, Debug)]
pub struct SubpassInfo {
    pub name: String,
    pub input_attachments: Vec<u32>,
    pub color_attachments: Vec<AttachmentRef>,
    pub depth_stencil_attachment: AttachmentRef,
}

/// A producer/consumer declaration between two subpasses (or
/// [`EXTERNAL_SUBPASS`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessTypes,
    pub dst_access: AccessTypes,
    pub region_dependency: bool,
}

/// A full render pass description, as handed to
/// [`crate::backend::Backend::create_render_pass`] after validation.
#[derive(Clone, Debug)]
pub struct RenderPassDescription {
    pub attachments: Vec<AttachmentInfo>,
    pub subpasses: Vec<SubpassInfo>,
    pub subpass_dependencies: Vec<SubpassDependency>,
}
