//! Centralized GPU resource storage (spec §3 "GPU resources", §5 "Shared-resource
//! policy"). Every resource a [`crate::renderer::Renderer`] creates is owned
//! here, keyed by the typed IDs in [`crate::resource::ids`], rather than
//! shared via `Arc` — see `ids.rs` for why.

use crate::backend::Backend;
use crate::error::{Error, ErrorKind, Result};
use crate::render_pass::RenderPass;
use crate::resource::{BufferId, FramebufferId, GfxBuffer, Framebuffer, Renderbuffer, RenderbufferId, RenderPassId, RenderSurface, ShaderId, ShaderModule, SurfaceId, Texture, TextureId};

/// A generation-free slot table: indices are reused once freed, so callers
/// must not retain an ID past its `destroy` call.
struct Slab<T> {
    items: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Slab<T> {
    fn new() -> Self {
        Slab { items: Vec::new(), free: Vec::new() }
    }

    fn insert(&mut self, value: T) -> u32 {
        if let Some(index) = self.free.pop() {
            self.items[index as usize] = Some(value);
            index
        } else {
            self.items.push(Some(value));
            (self.items.len() - 1) as u32
        }
    }

    fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize).and_then(|slot| slot.as_ref())
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.items.get_mut(index as usize).and_then(|slot| slot.as_mut())
    }

    fn remove(&mut self, index: u32) -> Option<T> {
        let slot = self.items.get_mut(index as usize)?;
        let value = slot.take()?;
        self.free.push(index);
        Some(value)
    }

    fn live_count(&self) -> usize {
        self.items.iter().filter(|slot| slot.is_some()).count()
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts reported through [`ResourceManager::statistics`] at `endFrame`
/// (spec §4.8, SPEC_FULL §2's resource-manager statistics addition).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceStatistics {
    pub buffer_count: usize,
    pub texture_count: usize,
    pub renderbuffer_count: usize,
    pub framebuffer_count: usize,
    pub surface_count: usize,
    pub render_pass_count: usize,
    pub shader_count: usize,
}

/// Owns every GPU resource a renderer has created, keyed by typed ID.
pub struct ResourceManager<B: Backend> {
    buffers: Slab<GfxBuffer<B>>,
    textures: Slab<Texture<B>>,
    renderbuffers: Slab<Renderbuffer<B>>,
    framebuffers: Slab<Framebuffer<B>>,
    surfaces: Slab<RenderSurface<B>>,
    render_passes: Slab<RenderPass<B>>,
    shaders: Slab<ShaderModule<B>>,
}

fn not_found(kind: &str) -> Error {
    Error::new(ErrorKind::NotFound, format!("{kind} resource does not exist"))
}

impl<B: Backend> ResourceManager<B> {
    pub fn new() -> Self {
        ResourceManager {
            buffers: Slab::new(),
            textures: Slab::new(),
            renderbuffers: Slab::new(),
            framebuffers: Slab::new(),
            surfaces: Slab::new(),
            render_passes: Slab::new(),
            shaders: Slab::new(),
        }
    }

    pub fn statistics(&self) -> ResourceStatistics {
        ResourceStatistics {
            buffer_count: self.buffers.live_count(),
            texture_count: self.textures.live_count(),
            renderbuffer_count: self.renderbuffers.live_count(),
            framebuffer_count: self.framebuffers.live_count(),
            surface_count: self.surfaces.live_count(),
            render_pass_count: self.render_passes.live_count(),
            shader_count: self.shaders.live_count(),
        }
    }

    pub(crate) fn insert_buffer(&mut self, buffer: GfxBuffer<B>) -> BufferId {
        BufferId(self.buffers.insert(buffer))
    }

    pub fn buffer(&self, id: BufferId) -> Result<&GfxBuffer<B>> {
        self.buffers.get(id.0).ok_or_else(|| not_found("buffer"))
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> Result<&mut GfxBuffer<B>> {
        self.buffers.get_mut(id.0).ok_or_else(|| not_found("buffer"))
    }

    /// Removes and returns the buffer if its internal ref count allows
    /// immediate destruction, or marks it for deferred destruction and
    /// returns `Ok(None)` otherwise (spec §5).
    pub(crate) fn take_buffer_for_destroy(&mut self, id: BufferId) -> Result<Option<GfxBuffer<B>>> {
        let buffer = self.buffers.get(id.0).ok_or_else(|| not_found("buffer"))?;
        if buffer.internal_ref().request_destroy() {
            Ok(self.buffers.remove(id.0))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn insert_texture(&mut self, texture: Texture<B>) -> TextureId {
        TextureId(self.textures.insert(texture))
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture<B>> {
        self.textures.get(id.0).ok_or_else(|| not_found("texture"))
    }

    pub(crate) fn take_texture_for_destroy(&mut self, id: TextureId) -> Result<Option<Texture<B>>> {
        let texture = self.textures.get(id.0).ok_or_else(|| not_found("texture"))?;
        if texture.internal_ref().request_destroy() {
            Ok(self.textures.remove(id.0))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn insert_renderbuffer(&mut self, renderbuffer: Renderbuffer<B>) -> RenderbufferId {
        RenderbufferId(self.renderbuffers.insert(renderbuffer))
    }

    pub fn renderbuffer(&self, id: RenderbufferId) -> Result<&Renderbuffer<B>> {
        self.renderbuffers.get(id.0).ok_or_else(|| not_found("renderbuffer"))
    }

    pub(crate) fn take_renderbuffer_for_destroy(&mut self, id: RenderbufferId) -> Result<Option<Renderbuffer<B>>> {
        let renderbuffer = self.renderbuffers.get(id.0).ok_or_else(|| not_found("renderbuffer"))?;
        if renderbuffer.internal_ref().request_destroy() {
            Ok(self.renderbuffers.remove(id.0))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn insert_framebuffer(&mut self, framebuffer: Framebuffer<B>) -> FramebufferId {
        FramebufferId(self.framebuffers.insert(framebuffer))
    }

    pub fn framebuffer(&self, id: FramebufferId) -> Result<&Framebuffer<B>> {
        self.framebuffers.get(id.0).ok_or_else(|| not_found("framebuffer"))
    }

    pub(crate) fn remove_framebuffer(&mut self, id: FramebufferId) -> Result<Framebuffer<B>> {
        self.framebuffers.remove(id.0).ok_or_else(|| not_found("framebuffer"))
    }

    pub(crate) fn insert_surface(&mut self, surface: RenderSurface<B>) -> SurfaceId {
        SurfaceId(self.surfaces.insert(surface))
    }

    pub fn surface(&self, id: SurfaceId) -> Result<&RenderSurface<B>> {
        self.surfaces.get(id.0).ok_or_else(|| not_found("surface"))
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut RenderSurface<B>> {
        self.surfaces.get_mut(id.0).ok_or_else(|| not_found("surface"))
    }

    pub(crate) fn remove_surface(&mut self, id: SurfaceId) -> Result<RenderSurface<B>> {
        self.surfaces.remove(id.0).ok_or_else(|| not_found("surface"))
    }

    pub(crate) fn insert_render_pass(&mut self, render_pass: RenderPass<B>) -> RenderPassId {
        RenderPassId(self.render_passes.insert(render_pass))
    }

    pub fn render_pass(&self, id: RenderPassId) -> Result<&RenderPass<B>> {
        self.render_passes.get(id.0).ok_or_else(|| not_found("render pass"))
    }

    pub(crate) fn remove_render_pass(&mut self, id: RenderPassId) -> Result<RenderPass<B>> {
        self.render_passes.remove(id.0).ok_or_else(|| not_found("render pass"))
    }

    pub(crate) fn insert_shader(&mut self, shader: ShaderModule<B>) -> ShaderId {
        ShaderId(self.shaders.insert(shader))
    }

    pub fn shader(&self, id: ShaderId) -> Result<&ShaderModule<B>> {
        self.shaders.get(id.0).ok_or_else(|| not_found("shader"))
    }

    pub(crate) fn remove_shader(&mut self, id: ShaderId) -> Result<ShaderModule<B>> {
        self.shaders.remove(id.0).ok_or_else(|| not_found("shader"))
    }
}

impl<B: Backend> Default for ResourceManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slab_reuses_freed_slots() {
        let mut slab: Slab<u32> = Slab::new();
        let a = slab.insert(1);
        let b = slab.insert(2);
        assert_eq!(slab.remove(a), Some(1));
        let c = slab.insert(3);
        assert_eq!(c, a);
        assert_eq!(slab.get(b), Some(&2));
    }
}
