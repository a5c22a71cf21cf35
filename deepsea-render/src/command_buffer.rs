//! Command buffers (spec §3 `CommandBuffer`): bound per-frame, not
//! ref-counted like the resources they record work against.

use bitflags::bitflags;

use crate::backend::{Backend, Rect2i};
use crate::renderer::Renderer;
use crate::resource::{FramebufferId, RenderPassId, ShaderId, SurfaceId};

bitflags! {
    /// How a command buffer may be recorded into and submitted.
    pub struct CommandBufferUsage: u32 {
        /// May be re-submitted across more than one frame without being re-recorded.
        const MULTI_FRAME = 0x1;
        /// May be submitted more than once per frame.
        const MULTI_SUBMIT = 0x2;
        /// Allocated from the resource manager's pool for off-main-thread resource uploads.
        const RESOURCE = 0x4;
        /// Recorded standalone for inclusion inside a render pass subpass declared `secondary`.
        const SECONDARY = 0x8;
    }
}

/// A viewport: a screen-space rectangle plus the depth range mapped onto it.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Viewport {
    pub rect: Rect2i,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// A clear value paired with the attachment index it applies to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClearAttachment {
    pub attachment_index: u32,
    pub value: ClearValue,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    ColorInt([i32; 4]),
    ColorUint([u32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DrawRange {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct IndexedDrawRange {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DrawIndirectArgs {
    pub offset: u64,
    pub count: u32,
    pub stride: u32,
}

/// Bookkeeping the profiler reads at begin/end boundary calls (spec §4.4)
/// without needing to reach back into the `QueryPools` rotation itself.
#[derive(Copy, Clone, Debug, Default)]
pub struct ProfileInfo {
    pub begin_surface_index: u32,
    pub begin_surface_swap_count: u32,
    pub begin_subpass_index: u32,
    pub begin_subpass_swap_count: u32,
    pub begin_compute_index: u32,
    pub begin_compute_swap_count: u32,
    pub begin_deferred_resources_index: u32,
    pub begin_deferred_resources_swap_count: u32,
    pub subpass_debug_groups: bool,
}

/// A recorded sequence of GPU commands, bound to exactly one frame unless
/// [`CommandBufferUsage::MULTI_FRAME`] is set.
pub struct CommandBuffer<'r, B: Backend> {
    renderer: &'r Renderer<B>,
    pool: Option<B::CommandBufferPool>,
    usage: CommandBufferUsage,
    frame_active: bool,
    bound_surface: Option<SurfaceId>,
    bound_framebuffer: Option<FramebufferId>,
    bound_render_pass: Option<RenderPassId>,
    active_render_subpass: u32,
    bound_shader: Option<ShaderId>,
    bound_compute_shader: Option<ShaderId>,
    secondary_render_pass_commands: bool,
    viewport: Viewport,
    scissor: Rect2i,
    profile_info: ProfileInfo,
}

impl<'r, B: Backend> CommandBuffer<'r, B> {
    pub(crate) fn new(renderer: &'r Renderer<B>, pool: B::CommandBufferPool, usage: CommandBufferUsage) -> Self {
        CommandBuffer {
            renderer,
            pool: Some(pool),
            usage,
            frame_active: false,
            bound_surface: None,
            bound_framebuffer: None,
            bound_render_pass: None,
            active_render_subpass: 0,
            bound_shader: None,
            bound_compute_shader: None,
            secondary_render_pass_commands: false,
            viewport: Viewport::default(),
            scissor: Rect2i::default(),
            profile_info: ProfileInfo::default(),
        }
    }

    pub fn usage(&self) -> CommandBufferUsage {
        self.usage
    }

    pub fn is_secondary(&self) -> bool {
        self.usage.contains(CommandBufferUsage::SECONDARY)
    }

    pub fn frame_active(&self) -> bool {
        self.frame_active
    }

    pub fn bound_render_pass(&self) -> Option<RenderPassId> {
        self.bound_render_pass
    }

    pub fn active_render_subpass(&self) -> u32 {
        self.active_render_subpass
    }

    pub fn bound_shader(&self) -> Option<ShaderId> {
        self.bound_shader
    }

    pub fn bound_compute_shader(&self) -> Option<ShaderId> {
        self.bound_compute_shader
    }

    pub fn secondary_render_pass_commands(&self) -> bool {
        self.secondary_render_pass_commands
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scissor(&self) -> Rect2i {
        self.scissor
    }

    pub fn profile_info(&self) -> ProfileInfo {
        self.profile_info
    }

    pub(crate) fn pool(&self) -> &B::CommandBufferPool {
        self.pool.as_ref().expect("command buffer pool already flushed")
    }

    pub(crate) fn pool_mut(&mut self) -> &mut Option<B::CommandBufferPool> {
        &mut self.pool
    }

    pub(crate) fn renderer(&self) -> &'r Renderer<B> {
        self.renderer
    }

    pub(crate) fn set_frame_active(&mut self, active: bool) {
        self.frame_active = active;
    }

    pub(crate) fn set_bound_surface(&mut self, surface: Option<SurfaceId>) {
        self.bound_surface = surface;
    }

    pub(crate) fn bound_surface(&self) -> Option<SurfaceId> {
        self.bound_surface
    }

    pub(crate) fn set_bound_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.bound_framebuffer = framebuffer;
    }

    pub(crate) fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer
    }

    pub(crate) fn set_render_pass_state(&mut self, pass: Option<RenderPassId>, subpass: u32, secondary: bool) {
        self.bound_render_pass = pass;
        self.active_render_subpass = subpass;
        self.secondary_render_pass_commands = secondary;
    }

    pub(crate) fn set_bound_shader(&mut self, shader: Option<ShaderId>) {
        self.bound_shader = shader;
    }

    pub(crate) fn set_bound_compute_shader(&mut self, shader: Option<ShaderId>) {
        self.bound_compute_shader = shader;
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub(crate) fn set_scissor(&mut self, scissor: Rect2i) {
        self.scissor = scissor;
    }

    pub(crate) fn profile_info_mut(&mut self) -> &mut ProfileInfo {
        &mut self.profile_info
    }
}
