//! The renderer (spec §3 `Renderer`, §4.8, §5): owns every GPU resource,
//! the main command buffer's bound state, and the main-thread ownership
//! rule that the rest of the crate's entry points enforce through it.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use deepsea_core::allocator::Allocator;
use deepsea_core::sync::{RwLock, Spinlock};

use crate::backend::{Backend, Rect2i};
use crate::command_buffer::{
    ClearAttachment, ClearValue, CommandBuffer, CommandBufferUsage, DrawIndirectArgs, DrawRange, IndexedDrawRange, ProfileInfo, Viewport,
};
use crate::config::{ProjectionOptions, RenderSurfaceType, RendererOptions, VSync};
use crate::draw_validation;
use crate::error::{Error, ErrorKind, Result};
use crate::fence_sync::FenceSyncPool;
use crate::profiler::{GpuProfiler, ProfileResult};
use crate::render_pass::{AccessTypes, PipelineStages, RenderPass, RenderPassDescription};
use crate::resource::{
    BufferId, BufferUsage, Dimension, Framebuffer, FramebufferId, FramebufferSurface, GfxBuffer, GfxFormat, Renderbuffer, RenderbufferId,
    RenderbufferUsage, RenderPassId, RenderSurface, ShaderId, ShaderModule, SurfaceId, Texture, TextureId, TextureUsage,
};
use crate::resource_command_buffers::ResourceCommandBuffers;
use crate::resource_manager::{ResourceManager, ResourceStatistics};

/// Fixed renderer capabilities reported by the backend at construction
/// (spec §3 `Renderer.caps`).
#[derive(Copy, Clone, Debug)]
pub struct RendererCaps {
    pub has_geometry_shaders: bool,
    pub has_tessellation_shaders: bool,
    pub has_instanced_drawing: bool,
    pub has_start_instance: bool,
    pub has_independent_blend: bool,
    pub has_dual_src_blend: bool,
    pub has_logic_ops: bool,
    pub has_sample_shading: bool,
    pub has_depth_bounds: bool,
    pub has_depth_clamp: bool,
    pub has_depth_bias_clamp: bool,
    pub has_native_multidraw: bool,
    pub has_depth_stencil_multisample_resolve: bool,
    pub single_buffer: bool,
    pub stereoscopic: bool,
    pub clip_half_depth: bool,
    pub clip_invert_y: bool,
    pub strict_render_pass_secondary_commands: bool,
    pub projection_options: ProjectionOptions,
}

/// Fixed limits the backend reports at construction and the renderer never
/// re-queries afterward.
#[derive(Copy, Clone, Debug)]
pub struct RendererLimits {
    pub max_color_attachments: u32,
    pub max_anisotropy: f32,
    pub max_surface_samples: u32,
    pub max_compute_work_group_size: [u32; 3],
}

/// Bound state for the one command buffer every frame implicitly owns
/// (spec §3 `CommandBuffer`, attached here rather than to a standalone
/// `CommandBuffer` value since the renderer itself, not a borrow of it, is
/// what's shared across threads between frames).
struct MainCommandBuffer<B: Backend> {
    pool: Option<B::CommandBufferPool>,
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

impl<B: Backend> MainCommandBuffer<B> {
    fn new() -> Self {
        MainCommandBuffer {
            pool: None,
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

    fn clear_bound_state(&mut self) {
        self.bound_surface = None;
        self.bound_framebuffer = None;
        self.bound_render_pass = None;
        self.active_render_subpass = 0;
        self.bound_shader = None;
        self.bound_compute_shader = None;
        self.secondary_render_pass_commands = false;
    }
}

fn permission_denied<T>(message: impl Into<String>) -> Result<T> {
    Err(Error::new(ErrorKind::PermissionDenied, message))
}

/// The render-graph execution core (spec §3 `Renderer`): a single logical
/// GPU device, shared freely across threads per spec §5's shared-resource
/// policy, but with a short list of main-thread-only entry points.
pub struct Renderer<B: Backend> {
    backend: B,
    allocator: Arc<dyn Allocator + Send + Sync>,
    resource_manager: RwLock<ResourceManager<B>>,
    resource_command_buffers: ResourceCommandBuffers<B>,
    fence_sync_pool: FenceSyncPool,
    main_thread_id: ThreadId,
    main: Spinlock<MainCommandBuffer<B>>,
    frame_number: AtomicU64,

    surface_color_format: GfxFormat,
    surface_depth_stencil_format: Option<GfxFormat>,
    surface_samples: AtomicU32,
    default_samples: AtomicU32,

    limits: RendererLimits,
    caps: RendererCaps,

    vsync: Spinlock<VSync>,
    default_anisotropy: Spinlock<f32>,

    profile_context: Option<GpuProfiler<B>>,
}

impl<B: Backend> Renderer<B> {
    /// Constructs a renderer around an already-initialized backend. The
    /// calling thread becomes `main_thread_id` for the lifetime of the
    /// renderer (spec §5).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: B,
        allocator: Arc<dyn Allocator + Send + Sync>,
        options: &RendererOptions,
        surface_color_format: GfxFormat,
        surface_depth_stencil_format: Option<GfxFormat>,
        limits: RendererLimits,
        caps: RendererCaps,
        on_profile_result: Option<Box<dyn Fn(&ProfileResult) + Send + Sync>>,
    ) -> Result<Self> {
        let timestamp_period = backend.timestamp_period();
        let profile_context = on_profile_result.map(|callback| GpuProfiler::new(timestamp_period, move |result| callback(result)));
        let fence_sync_pool = FenceSyncPool::new(64)?;

        Ok(Renderer {
            backend,
            allocator,
            resource_manager: RwLock::new(ResourceManager::new()),
            resource_command_buffers: ResourceCommandBuffers::new(),
            fence_sync_pool,
            main_thread_id: thread::current().id(),
            main: Spinlock::new(MainCommandBuffer::new()),
            frame_number: AtomicU64::new(0),
            surface_color_format,
            surface_depth_stencil_format,
            surface_samples: AtomicU32::new(options.surface_samples.max(1)),
            default_samples: AtomicU32::new(options.default_samples.max(1)),
            limits,
            caps,
            vsync: Spinlock::new(if options.single_buffer { VSync::Disabled } else { VSync::Enabled }),
            default_anisotropy: Spinlock::new(1.0),
            profile_context,
        })
    }

    fn check_main_thread(&self, entry_point: &str) -> Result<()> {
        if thread::current().id() != self.main_thread_id {
            return permission_denied(format!("{entry_point} may only be called from the thread that created the renderer"));
        }
        Ok(())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn allocator(&self) -> &Arc<dyn Allocator + Send + Sync> {
        &self.allocator
    }

    pub fn caps(&self) -> RendererCaps {
        self.caps
    }

    pub fn limits(&self) -> RendererLimits {
        self.limits
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number.load(Ordering::Acquire)
    }

    pub fn frame_active(&self) -> bool {
        self.main.lock().frame_active
    }

    pub fn surface_color_format(&self) -> GfxFormat {
        self.surface_color_format
    }

    pub fn surface_depth_stencil_format(&self) -> Option<GfxFormat> {
        self.surface_depth_stencil_format
    }

    pub fn surface_samples(&self) -> u32 {
        self.surface_samples.load(Ordering::Acquire)
    }

    pub fn default_samples(&self) -> u32 {
        self.default_samples.load(Ordering::Acquire)
    }

    pub fn vsync(&self) -> VSync {
        *self.vsync.lock()
    }

    pub fn default_anisotropy(&self) -> f32 {
        *self.default_anisotropy.lock()
    }

    pub fn resource_statistics(&self) -> ResourceStatistics {
        self.resource_manager.read().statistics()
    }

    // -- Capability tuning (main-thread only, spec §5) --

    pub fn set_surface_samples(&self, samples: u32) -> Result<()> {
        self.check_main_thread("setSurfaceSamples")?;
        if samples == 0 || samples > self.limits.max_surface_samples {
            return Err(Error::new(ErrorKind::InvalidArgument, format!("surface sample count {samples} exceeds backend maximum {}", self.limits.max_surface_samples)));
        }
        self.backend.set_surface_samples(samples)?;
        self.surface_samples.store(samples, Ordering::Release);
        Ok(())
    }

    pub fn set_default_samples(&self, samples: u32) -> Result<()> {
        self.check_main_thread("setDefaultSamples")?;
        self.backend.set_default_samples(samples)?;
        self.default_samples.store(samples.max(1), Ordering::Release);
        Ok(())
    }

    pub fn set_vsync(&self, vsync: VSync) -> Result<()> {
        self.check_main_thread("setVSync")?;
        self.backend.set_vsync(vsync)?;
        *self.vsync.lock() = vsync;
        Ok(())
    }

    pub fn set_default_anisotropy(&self, anisotropy: f32) -> Result<()> {
        self.check_main_thread("setDefaultAnisotropy")?;
        if anisotropy < 1.0 || anisotropy > self.limits.max_anisotropy {
            return Err(Error::new(ErrorKind::InvalidArgument, format!("anisotropy {anisotropy} exceeds backend maximum {}", self.limits.max_anisotropy)));
        }
        self.backend.set_default_anisotropy(anisotropy)?;
        *self.default_anisotropy.lock() = anisotropy;
        Ok(())
    }

    pub fn set_extra_debugging(&self, enabled: bool) -> Result<()> {
        self.backend.set_extra_debugging(enabled)
    }

    // -- Lifecycle (main-thread only) --

    pub fn wait_until_idle(&self) -> Result<()> {
        self.check_main_thread("waitUntilIdle")?;
        self.backend.wait_until_idle()
    }

    pub fn restore_global_state(&self) -> Result<()> {
        self.check_main_thread("restoreGlobalState")?;
        self.backend.restore_global_state()
    }

    pub fn flush(&self) -> Result<()> {
        self.check_main_thread("flush")?;
        self.backend.flush()
    }

    pub fn destroy(&self) -> Result<()> {
        self.check_main_thread("destroy")?;
        if let Some(profiler) = &self.profile_context {
            profiler.destroy(&self.backend)?;
        }
        self.backend.destroy()
    }

    // -- Frame lifecycle (spec §4.8) --

    pub fn begin_frame(&self) -> Result<()> {
        self.check_main_thread("beginFrame")?;
        let mut main = self.main.lock();
        if main.frame_active {
            return permission_denied("beginFrame called while a frame is already active");
        }
        self.backend.begin_frame()?;
        main.pool = Some(self.backend.create_command_buffer_pool()?);
        self.backend.begin_command_buffer(main.pool.as_ref().unwrap())?;
        main.frame_active = true;
        main.clear_bound_state();
        self.frame_number.fetch_add(1, Ordering::AcqRel);
        log::trace!("begin frame {}", self.frame_number());
        Ok(())
    }

    pub fn end_frame(&self) -> Result<()> {
        self.check_main_thread("endFrame")?;
        let mut main = self.main.lock();
        if !main.frame_active {
            return permission_denied("endFrame called without a matching beginFrame");
        }
        if main.bound_render_pass.is_some() {
            return permission_denied("endFrame called with a render pass still bound");
        }
        if main.bound_compute_shader.is_some() {
            return permission_denied("endFrame called with a compute shader still bound");
        }
        if main.bound_surface.is_some() {
            return permission_denied("endFrame called with a render surface still bound");
        }
        self.resource_command_buffers.submit(&self.backend, main.pool.as_ref().unwrap())?;
        self.backend.end_command_buffer(main.pool.as_ref().unwrap())?;
        self.backend.submit_command_buffer(main.pool.as_ref().unwrap(), None)?;
        self.backend.end_frame()?;
        if let Some(profiler) = &self.profile_context {
            profiler.end_frame(&self.backend)?;
        }
        let stats = self.resource_manager.read().statistics();
        log::debug!(
            "end frame {}: {} buffers, {} textures, {} renderbuffers, {} framebuffers, {} surfaces, {} render passes, {} shaders",
            self.frame_number(),
            stats.buffer_count,
            stats.texture_count,
            stats.renderbuffer_count,
            stats.framebuffer_count,
            stats.surface_count,
            stats.render_pass_count,
            stats.shader_count,
        );
        if let Some(pool) = main.pool.take() {
            self.backend.destroy_command_buffer_pool(pool)?;
        }
        main.frame_active = false;
        Ok(())
    }

    /// Swaps every listed surface's back buffer under a single GPU-profile
    /// "Swap buffers" scope (spec §4.8).
    pub fn swap_render_surface_buffers(&self, surfaces: &[&RenderSurface<B>]) -> Result<()> {
        self.check_main_thread("swapBuffers")?;
        let handles: Vec<&B::RenderSurfaceHandle> = surfaces.iter().map(|s| s.handle()).collect();
        if let Some(profiler) = &self.profile_context {
            let main = self.main.lock();
            if let Some(pool) = main.pool.as_ref() {
                let swap_count = profiler.current_swap_count();
                let index = profiler.begin(&self.backend, pool, "Swap buffers", "Swap buffers")?;
                drop(main);
                let result = self.backend.swap_render_surface_buffers(&handles);
                let main = self.main.lock();
                if let Some(pool) = main.pool.as_ref() {
                    profiler.end(&self.backend, pool, index, swap_count)?;
                }
                return result;
            }
        }
        self.backend.swap_render_surface_buffers(&handles)
    }

    // -- Render surfaces --

    pub fn create_render_surface(&self, name: &str, os_handle: u64, surface_type: RenderSurfaceType, width_hint: u32, height_hint: u32) -> Result<SurfaceId> {
        self.check_main_thread("createRenderSurface")?;
        let (handle, width, height) = self.backend.create_render_surface(name, os_handle, surface_type, width_hint, height_hint)?;
        let surface = RenderSurface::new(handle, name.to_string(), surface_type, crate::resource::RenderSurfaceUsage::empty(), width, height);
        Ok(self.resource_manager.write().insert_surface(surface))
    }

    pub fn destroy_render_surface(&self, id: SurfaceId) -> Result<()> {
        self.check_main_thread("destroyRenderSurface")?;
        let mut surface = self.resource_manager.write().remove_surface(id)?;
        self.backend.destroy_render_surface(surface.take_handle())
    }

    pub fn update_render_surface(&self, id: SurfaceId, width_hint: u32, height_hint: u32) -> Result<bool> {
        let mut manager = self.resource_manager.write();
        let surface = manager.surface_mut(id)?;
        match self.backend.update_render_surface(surface.handle(), width_hint, height_hint)? {
            Some((width, height)) => Ok(surface.apply_resize(width, height)),
            None => Ok(false),
        }
    }

    /// `beginDraw`: records the bound surface and pushes a "Surface: <name>"
    /// profile scope (spec §4.9).
    pub fn begin_render_surface(&self, id: SurfaceId) -> Result<()> {
        let manager = self.resource_manager.read();
        let surface = manager.surface(id)?;
        self.backend.begin_render_surface(surface.handle())?;
        let mut main = self.main.lock();
        if let Some(profiler) = &self.profile_context {
            if let Some(pool) = main.pool.as_ref() {
                let swap_count = profiler.current_swap_count();
                let index = profiler.begin(&self.backend, pool, "Surface", surface.name())?;
                main.profile_info.begin_surface_index = index;
                main.profile_info.begin_surface_swap_count = swap_count;
            }
        }
        main.bound_surface = Some(id);
        Ok(())
    }

    pub fn end_render_surface(&self, id: SurfaceId) -> Result<()> {
        let manager = self.resource_manager.read();
        let surface = manager.surface(id)?;
        self.backend.end_render_surface(surface.handle())?;
        drop(manager);
        let mut main = self.main.lock();
        if let Some(profiler) = &self.profile_context {
            if let Some(pool) = main.pool.as_ref() {
                let (index, swap_count) = (main.profile_info.begin_surface_index, main.profile_info.begin_surface_swap_count);
                profiler.end(&self.backend, pool, index, swap_count)?;
            }
        }
        main.bound_surface = None;
        Ok(())
    }

    // -- Resource creation / destruction --

    pub fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<BufferId> {
        if size == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument, "buffer size must be non-zero"));
        }
        let handle = self.backend.create_buffer(size, usage)?;
        Ok(self.resource_manager.write().insert_buffer(GfxBuffer::new(handle, size, usage)))
    }

    pub fn destroy_buffer(&self, id: BufferId) -> Result<()> {
        let mut manager = self.resource_manager.write();
        if let Some(mut buffer) = manager.take_buffer_for_destroy(id)? {
            drop(manager);
            self.backend.destroy_buffer(buffer.take_handle())?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_texture(&self, dimension: Dimension, format: GfxFormat, width: u32, height: u32, depth: u32, mip_levels: u32, samples: u32, resolve: bool, usage: TextureUsage) -> Result<TextureId> {
        let handle = self.backend.create_texture(dimension, format, width, height, depth, mip_levels, samples, usage)?;
        Ok(self.resource_manager.write().insert_texture(Texture::new(handle, dimension, width, height, depth, mip_levels, samples, format, resolve, usage)))
    }

    pub fn destroy_texture(&self, id: TextureId) -> Result<()> {
        let mut manager = self.resource_manager.write();
        if let Some(mut texture) = manager.take_texture_for_destroy(id)? {
            drop(manager);
            self.backend.destroy_texture(texture.take_handle())?;
        }
        Ok(())
    }

    pub fn create_renderbuffer(&self, format: GfxFormat, width: u32, height: u32, samples: u32, usage: RenderbufferUsage) -> Result<RenderbufferId> {
        let handle = self.backend.create_renderbuffer(format, width, height, samples, usage)?;
        Ok(self.resource_manager.write().insert_renderbuffer(Renderbuffer::new(handle, width, height, samples, format, usage)))
    }

    pub fn destroy_renderbuffer(&self, id: RenderbufferId) -> Result<()> {
        let mut manager = self.resource_manager.write();
        if let Some(mut renderbuffer) = manager.take_renderbuffer_for_destroy(id)? {
            drop(manager);
            self.backend.destroy_renderbuffer(renderbuffer.take_handle())?;
        }
        Ok(())
    }

    pub fn create_framebuffer(&self, name: &str, width: u32, height: u32, layers: u32, surfaces: Vec<FramebufferSurface>) -> Result<FramebufferId> {
        let handle = self.backend.create_framebuffer(width, height, layers)?;
        Ok(self.resource_manager.write().insert_framebuffer(Framebuffer::new(handle, name.to_string(), width, height, layers, surfaces)))
    }

    pub fn destroy_framebuffer(&self, id: FramebufferId) -> Result<()> {
        let mut framebuffer = self.resource_manager.write().remove_framebuffer(id)?;
        self.backend.destroy_framebuffer(framebuffer.take_handle())
    }

    pub fn create_shader(&self, module: &[u8]) -> Result<ShaderId> {
        let handle = self.backend.create_shader(module)?;
        Ok(self.resource_manager.write().insert_shader(ShaderModule::new(handle)))
    }

    pub fn destroy_shader(&self, id: ShaderId) -> Result<()> {
        let mut shader = self.resource_manager.write().remove_shader(id)?;
        self.backend.destroy_shader(shader.take_handle())
    }

    pub fn create_render_pass(&self, description: RenderPassDescription) -> Result<RenderPassId> {
        let requires_any_surface = description.attachments.is_empty();
        let render_pass = RenderPass::create(&self.backend, description, self.limits.max_color_attachments, !requires_any_surface)?;
        Ok(self.resource_manager.write().insert_render_pass(render_pass))
    }

    pub fn destroy_render_pass(&self, id: RenderPassId) -> Result<()> {
        let mut render_pass = self.resource_manager.write().remove_render_pass(id)?;
        self.backend.destroy_render_pass(render_pass.take_handle())
    }

    // -- Resource / secondary command buffers --

    /// Acquires a standalone command buffer for off-main-thread resource
    /// work or secondary subpass recording (spec §4.5). `usage` must
    /// include [`CommandBufferUsage::RESOURCE`] or
    /// [`CommandBufferUsage::SECONDARY`].
    pub fn acquire_command_buffer(&self, usage: CommandBufferUsage) -> Result<CommandBuffer<'_, B>> {
        let pool = if usage.contains(CommandBufferUsage::SECONDARY) {
            let pool = self.backend.create_command_buffer_pool()?;
            self.backend.begin_secondary_command_buffer(&pool)?;
            pool
        } else {
            self.resource_command_buffers.acquire(&self.backend)?
        };
        Ok(CommandBuffer::new(self, pool, usage))
    }

    /// Ends recording and, for [`CommandBufferUsage::RESOURCE`] buffers,
    /// hands the pool to the pending queue for the next `endFrame`'s
    /// deferred-resource submission.
    pub fn flush_command_buffer(&self, mut cb: CommandBuffer<'_, B>) -> Result<()> {
        let pool = std::mem::replace(cb.pool_mut(), None);
        let pool = pool.expect("command buffer pool already flushed");
        if cb.usage().contains(CommandBufferUsage::RESOURCE) {
            self.resource_command_buffers.flush(&self.backend, pool)
        } else {
            self.backend.end_command_buffer(&pool)?;
            self.backend.destroy_command_buffer_pool(pool)
        }
    }

    // -- Render pass state machine (spec §4.6) --

    #[allow(clippy::too_many_arguments)]
    pub fn begin_render_pass(&self, pass_id: RenderPassId, framebuffer_id: FramebufferId, viewport: Rect2i, clear_values: &[ClearValue], secondary: bool) -> Result<()> {
        let manager = self.resource_manager.read();
        let pass = manager.render_pass(pass_id)?;
        let framebuffer = manager.framebuffer(framebuffer_id)?;

        let mut main = self.main.lock();
        if !main.frame_active {
            return permission_denied("beginRenderPass requires an active frame");
        }
        if main.bound_render_pass.is_some() {
            return permission_denied("beginRenderPass called with a render pass already bound");
        }
        if main.bound_compute_shader.is_some() {
            return permission_denied("beginRenderPass called with a compute shader bound");
        }
        if viewport.x < 0 || viewport.y < 0 || (viewport.x as u32 + viewport.width) > framebuffer.width() || (viewport.y as u32 + viewport.height) > framebuffer.height() {
            return Err(Error::new(ErrorKind::InvalidArgument, "render pass viewport does not lie within the framebuffer"));
        }
        if framebuffer.surfaces().len() != pass.attachment_count() {
            return Err(Error::new(ErrorKind::InvalidArgument, "framebuffer surface count does not match render pass attachment count"));
        }
        let has_clear_usage = pass.description().attachments.iter().any(|a| a.usage.contains(crate::render_pass::AttachmentUsage::CLEAR));
        if has_clear_usage && clear_values.len() != pass.attachment_count() {
            return Err(Error::new(ErrorKind::InvalidArgument, "clear values must cover every attachment when any attachment requests a clear"));
        }

        let debug_group_name = match pass.description().subpasses.first() {
            Some(first) => format!("{}: {}", framebuffer.name(), first.name),
            None => framebuffer.name().to_string(),
        };
        self.backend.push_debug_group(main.pool.as_ref().unwrap(), &debug_group_name)?;
        if let Some(profiler) = &self.profile_context {
            let swap_count = profiler.current_swap_count();
            let index = profiler.begin(&self.backend, main.pool.as_ref().unwrap(), "Subpass", &debug_group_name)?;
            main.profile_info.begin_subpass_index = index;
            main.profile_info.begin_subpass_swap_count = swap_count;
            main.profile_info.subpass_debug_groups = !secondary;
        }
        self.backend.begin_render_pass(main.pool.as_ref().unwrap(), pass.handle(), framebuffer.handle(), viewport, secondary)?;

        main.bound_framebuffer = Some(framebuffer_id);
        main.bound_render_pass = Some(pass_id);
        main.active_render_subpass = 0;
        main.secondary_render_pass_commands = secondary;
        main.viewport = Viewport { rect: viewport, min_depth: 0.0, max_depth: 1.0 };
        Ok(())
    }

    pub fn next_render_subpass(&self, secondary: bool) -> Result<()> {
        let manager = self.resource_manager.read();
        let mut main = self.main.lock();
        let pass_id = main.bound_render_pass.ok_or_else(|| Error::new(ErrorKind::PermissionDenied, "nextSubpass requires a bound render pass"))?;
        if main.bound_shader.is_some() {
            return permission_denied("nextSubpass called with a shader still bound");
        }
        let pass = manager.render_pass(pass_id)?;
        if main.active_render_subpass + 1 >= pass.subpass_count() as u32 {
            return Err(Error::new(ErrorKind::OutOfRange, "nextSubpass called on the render pass's last subpass"));
        }
        let next_index = main.active_render_subpass + 1;
        if let Some(profiler) = &self.profile_context {
            let (index, swap_count) = (main.profile_info.begin_subpass_index, main.profile_info.begin_subpass_swap_count);
            profiler.end(&self.backend, main.pool.as_ref().unwrap(), index, swap_count)?;
            let name = &pass.description().subpasses[next_index as usize].name;
            let new_swap_count = profiler.current_swap_count();
            let new_index = profiler.begin(&self.backend, main.pool.as_ref().unwrap(), "Subpass", name)?;
            main.profile_info.begin_subpass_index = new_index;
            main.profile_info.begin_subpass_swap_count = new_swap_count;
        }
        self.backend.next_render_subpass(main.pool.as_ref().unwrap(), pass.handle(), next_index, secondary)?;
        main.active_render_subpass = next_index;
        main.secondary_render_pass_commands = secondary;
        Ok(())
    }

    pub fn end_render_pass(&self) -> Result<()> {
        let manager = self.resource_manager.read();
        let mut main = self.main.lock();
        let pass_id = main.bound_render_pass.ok_or_else(|| Error::new(ErrorKind::PermissionDenied, "endRenderPass requires a bound render pass"))?;
        let pass = manager.render_pass(pass_id)?;
        if main.active_render_subpass + 1 != pass.subpass_count() as u32 {
            return Err(Error::new(ErrorKind::PermissionDenied, "endRenderPass called before reaching the last subpass"));
        }
        self.backend.end_render_pass(main.pool.as_ref().unwrap(), pass.handle())?;
        if let Some(profiler) = &self.profile_context {
            let (index, swap_count) = (main.profile_info.begin_subpass_index, main.profile_info.begin_subpass_swap_count);
            profiler.end(&self.backend, main.pool.as_ref().unwrap(), index, swap_count)?;
        }
        self.backend.pop_debug_group(main.pool.as_ref().unwrap())?;
        main.bound_render_pass = None;
        main.bound_framebuffer = None;
        main.active_render_subpass = 0;
        main.secondary_render_pass_commands = false;
        Ok(())
    }

    pub fn bind_shader(&self, id: ShaderId) -> Result<()> {
        self.resource_manager.read().shader(id)?;
        self.main.lock().bound_shader = Some(id);
        Ok(())
    }

    pub fn unbind_shader(&self) {
        self.main.lock().bound_shader = None;
    }

    pub fn bind_compute_shader(&self, id: ShaderId) -> Result<()> {
        self.resource_manager.read().shader(id)?;
        self.main.lock().bound_compute_shader = Some(id);
        Ok(())
    }

    pub fn unbind_compute_shader(&self) {
        self.main.lock().bound_compute_shader = None;
    }

    // -- Draw-time recording (spec §4.7) --

    pub fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let mut main = self.main.lock();
        self.backend.set_viewport(main.pool.as_ref().unwrap(), viewport.rect)?;
        main.viewport = viewport;
        Ok(())
    }

    pub fn draw(&self, range: DrawRange, vertex_count: u32) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_draw_state(main.bound_render_pass.is_some(), main.bound_shader.is_some(), main.secondary_render_pass_commands, true)?;
        draw_validation::validate_draw_range(vertex_count, range.first_vertex, range.vertex_count)?;
        draw_validation::validate_instancing(self.caps.has_instanced_drawing, self.caps.has_start_instance, range.first_instance, range.instance_count)?;
        self.backend.draw(main.pool.as_ref().unwrap(), range)
    }

    pub fn draw_indexed(&self, range: IndexedDrawRange, index_count: u32) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_draw_state(main.bound_render_pass.is_some(), main.bound_shader.is_some(), main.secondary_render_pass_commands, true)?;
        draw_validation::validate_indexed_draw_range(index_count, range)?;
        draw_validation::validate_instancing(self.caps.has_instanced_drawing, self.caps.has_start_instance, range.first_instance, range.instance_count)?;
        self.backend.draw_indexed(main.pool.as_ref().unwrap(), range)
    }

    pub fn draw_indirect(&self, buffer: &GfxBuffer<B>, args: DrawIndirectArgs, struct_size: u64) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_draw_state(main.bound_render_pass.is_some(), main.bound_shader.is_some(), main.secondary_render_pass_commands, true)?;
        draw_validation::validate_indirect_buffer(buffer.size(), buffer.usage(), BufferUsage::INDIRECT_DRAW, args.offset, struct_size, args.stride as u64, args.count)?;
        self.backend.draw_indirect(main.pool.as_ref().unwrap(), buffer.handle(), args)
    }

    pub fn draw_indexed_indirect(&self, buffer: &GfxBuffer<B>, args: DrawIndirectArgs, struct_size: u64) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_draw_state(main.bound_render_pass.is_some(), main.bound_shader.is_some(), main.secondary_render_pass_commands, true)?;
        draw_validation::validate_indirect_buffer(buffer.size(), buffer.usage(), BufferUsage::INDIRECT_DRAW, args.offset, struct_size, args.stride as u64, args.count)?;
        self.backend.draw_indexed_indirect(main.pool.as_ref().unwrap(), buffer.handle(), args)
    }

    pub fn dispatch_compute(&self, x: u32, y: u32, z: u32) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_dispatch_state(main.bound_compute_shader.is_some())?;
        self.backend.dispatch_compute(main.pool.as_ref().unwrap(), x, y, z)
    }

    pub fn dispatch_compute_indirect(&self, buffer: &GfxBuffer<B>, offset: u64, struct_size: u64) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_dispatch_state(main.bound_compute_shader.is_some())?;
        draw_validation::validate_indirect_buffer(buffer.size(), buffer.usage(), BufferUsage::INDIRECT_DISPATCH, offset, struct_size, struct_size, 1)?;
        self.backend.dispatch_compute_indirect(main.pool.as_ref().unwrap(), buffer.handle(), offset)
    }

    pub fn clear_attachments(&self, clears: &[ClearAttachment], bound_color_attachments: &[bool], has_depth_stencil_attachment: bool, region: Option<(u32, u32, u32, u32)>) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_clear_attachments(clears, bound_color_attachments, has_depth_stencil_attachment, main.viewport.rect.width, main.viewport.rect.height, region)?;
        self.backend.clear_attachments(main.pool.as_ref().unwrap(), clears)
    }

    /// Self-dependencies of the active subpass, for
    /// [`Self::memory_barrier`]'s validation.
    fn active_self_dependencies(&self, manager: &ResourceManager<B>, main: &MainCommandBuffer<B>) -> Result<Vec<(PipelineStages, PipelineStages, AccessTypes, AccessTypes)>> {
        let pass_id = main.bound_render_pass.ok_or_else(|| Error::new(ErrorKind::PermissionDenied, "memoryBarrier inside a render pass requires a bound render pass"))?;
        let pass = manager.render_pass(pass_id)?;
        Ok(pass
            .description()
            .subpass_dependencies
            .iter()
            .filter(|dep| dep.src_subpass == main.active_render_subpass && dep.dst_subpass == main.active_render_subpass)
            .map(|dep| (dep.src_stages, dep.dst_stages, dep.src_access, dep.dst_access))
            .collect())
    }

    pub fn memory_barrier(&self, before_stages: PipelineStages, after_stages: PipelineStages) -> Result<()> {
        let manager = self.resource_manager.read();
        let main = self.main.lock();
        if main.bound_render_pass.is_some() {
            let deps = self.active_self_dependencies(&manager, &main)?;
            draw_validation::validate_memory_barrier_in_render_pass(&deps, before_stages, after_stages)?;
        }
        self.backend.memory_barrier(main.pool.as_ref().unwrap(), before_stages.bits(), after_stages.bits())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn blit_surface(
        &self,
        src_allows_blit_from: bool,
        dst_allows_blit_to: bool,
        formats_compatible: bool,
        src: Rect2i,
        dst: Rect2i,
        block_size: u32,
    ) -> Result<()> {
        let main = self.main.lock();
        draw_validation::validate_blit(
            src_allows_blit_from,
            dst_allows_blit_to,
            formats_compatible,
            (src.x as u32, src.y as u32, src.width, src.height),
            (dst.x as u32, dst.y as u32, dst.width, dst.height),
            block_size,
        )?;
        self.backend.blit_surface(main.pool.as_ref().unwrap(), src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> RendererCaps {
        RendererCaps {
            has_geometry_shaders: false,
            has_tessellation_shaders: false,
            has_instanced_drawing: true,
            has_start_instance: true,
            has_independent_blend: false,
            has_dual_src_blend: false,
            has_logic_ops: false,
            has_sample_shading: false,
            has_depth_bounds: false,
            has_depth_clamp: false,
            has_depth_bias_clamp: false,
            has_native_multidraw: false,
            has_depth_stencil_multisample_resolve: false,
            single_buffer: false,
            stereoscopic: false,
            clip_half_depth: false,
            clip_invert_y: false,
            strict_render_pass_secondary_commands: false,
            projection_options: ProjectionOptions::empty(),
        }
    }

    fn limits() -> RendererLimits {
        RendererLimits { max_color_attachments: 4, max_anisotropy: 16.0, max_surface_samples: 8, max_compute_work_group_size: [128, 128, 64] }
    }

    #[test]
    fn caps_are_plain_copy_data() {
        let c = caps();
        let c2 = c;
        assert_eq!(c.has_instanced_drawing, c2.has_instanced_drawing);
    }

    #[test]
    fn limits_are_plain_copy_data() {
        let l = limits();
        assert_eq!(l.max_color_attachments, 4);
    }
}
