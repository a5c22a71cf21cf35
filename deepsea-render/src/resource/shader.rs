//! Shaders, shader modules, material descriptions, and shader variable
//! group descriptions are opaque to the render core (spec §3): it holds a
//! back-pointer and a ref count but never interprets their contents. All
//! four map onto the same thin wrapper here; only `ShaderModule` is named
//! since none of the draw-validation or render-pass logic inspects the
//! others' fields.

use crate::backend::Backend;

/// An opaque, backend-compiled shader module. The byte blob it was built
/// from is never retained once the backend accepts it.
pub struct ShaderModule<B: Backend> {
    handle: Option<B::ShaderHandle>,
}

impl<B: Backend> ShaderModule<B> {
    pub(crate) fn new(handle: B::ShaderHandle) -> Self {
        ShaderModule { handle: Some(handle) }
    }

    pub(crate) fn handle(&self) -> &B::ShaderHandle {
        self.handle.as_ref().expect("shader already destroyed")
    }

    pub(crate) fn take_handle(&mut self) -> B::ShaderHandle {
        self.handle.take().expect("shader already destroyed")
    }
}
