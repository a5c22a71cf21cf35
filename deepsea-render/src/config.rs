//! Renderer construction options.

use std::env;

use bitflags::bitflags;

/// Vertical sync behavior requested at renderer construction, and settable
/// afterward through [`crate::renderer::Renderer::set_vsync`] from the main
/// thread.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VSync {
    Disabled,
    Adaptive,
    Enabled,
}

/// How projection matrices built by [`crate::projection`] lay out clip
/// space; consulted by `makeOrtho`/`makeFrustum`/`makePerspective`/
/// `frustumFromMatrix`.
bitflags! {
    pub struct ProjectionOptions: u32 {
        /// Clip space Z ranges over `[0, 1]` instead of `[-1, 1]`.
        const HALF_DEPTH = 0x1;
        /// Y increases downward in clip space.
        const INVERT_Y = 0x2;
        /// Depth comparisons and clip-space Z are reversed (far maps to 0).
        const REVERSE_Z = 0x4;
    }
}

/// The surface type a render surface is backed by, passed through to the
/// backend's `createRenderSurface`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderSurfaceType {
    Window,
    Pixmap,
    Offscreen,
}

/// Renderer construction options, mirroring the source's
/// `dsRendererOptions`. Platform/display handles are passed through to the
/// backend as opaque tokens; this crate does not interpret them.
#[derive(Clone, Debug)]
pub struct RendererOptions {
    pub platform: Option<String>,
    pub os_display: Option<u64>,
    pub gfx_display: Option<u64>,
    pub background_surface_type: RenderSurfaceType,

    pub application_name: String,
    pub application_version: (u32, u32, u32),

    pub red_bits: u32,
    pub green_bits: u32,
    pub blue_bits: u32,
    pub alpha_bits: u32,
    pub depth_bits: u32,
    pub stencil_bits: u32,

    pub forced_color_format: Option<u32>,
    pub forced_depth_stencil_format: Option<u32>,

    pub surface_samples: u32,
    pub default_samples: u32,

    pub single_buffer: bool,
    pub reverse_z: bool,
    pub srgb: bool,
    pub prefer_half_depth_range: bool,
    pub stereoscopic: bool,

    /// Base debug setting, overridden by `DEEPSEA_GRAPHICS_DEBUG` per
    /// [`RendererOptions::resolve_debug`].
    pub debug: bool,

    pub max_resource_threads: u32,
    pub shader_cache_dir: Option<String>,

    pub device_uuid: Option<[u8; 16]>,
    pub device_name: Option<String>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        RendererOptions {
            platform: None,
            os_display: None,
            gfx_display: None,
            background_surface_type: RenderSurfaceType::Window,
            application_name: String::new(),
            application_version: (0, 0, 0),
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 0,
            depth_bits: 24,
            stencil_bits: 0,
            forced_color_format: None,
            forced_depth_stencil_format: None,
            surface_samples: 1,
            default_samples: 1,
            single_buffer: false,
            reverse_z: false,
            srgb: false,
            prefer_half_depth_range: false,
            stereoscopic: false,
            debug: false,
            max_resource_threads: 0,
            shader_cache_dir: None,
            device_uuid: None,
            device_name: None,
        }
    }
}

impl RendererOptions {
    /// Resolves the effective debug flag: `DEEPSEA_GRAPHICS_DEBUG`, when
    /// set, overrides [`RendererOptions::debug`]. Its value is false only
    /// for `"0"`, `"off"`, or `"false"` (case-insensitive); any other value
    /// (including the empty string) is true.
    pub fn resolve_debug(&self) -> bool {
        match env::var("DEEPSEA_GRAPHICS_DEBUG") {
            Ok(value) => !matches!(value.to_ascii_lowercase().as_str(), "0" | "off" | "false"),
            Err(_) => self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // DEEPSEA_GRAPHICS_DEBUG is process-global; serialize the tests that
    // touch it so they don't race under the default parallel test runner.
    static ENV_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn default_debug_is_used_when_env_var_is_unset() {
        let _guard = ENV_GUARD.lock().unwrap();
        env::remove_var("DEEPSEA_GRAPHICS_DEBUG");
        let mut options = RendererOptions::default();
        options.debug = true;
        assert!(options.resolve_debug());
        options.debug = false;
        assert!(!options.resolve_debug());
    }

    #[test]
    fn env_var_negative_values_force_debug_off() {
        let _guard = ENV_GUARD.lock().unwrap();
        for value in ["0", "off", "OFF", "false", "False"] {
            env::set_var("DEEPSEA_GRAPHICS_DEBUG", value);
            let mut options = RendererOptions::default();
            options.debug = true;
            assert!(!options.resolve_debug(), "value {value:?} should disable debug");
        }
        env::remove_var("DEEPSEA_GRAPHICS_DEBUG");
    }

    #[test]
    fn env_var_other_values_force_debug_on() {
        let _guard = ENV_GUARD.lock().unwrap();
        env::set_var("DEEPSEA_GRAPHICS_DEBUG", "1");
        let mut options = RendererOptions::default();
        options.debug = false;
        assert!(options.resolve_debug());
        env::remove_var("DEEPSEA_GRAPHICS_DEBUG");
    }
}
