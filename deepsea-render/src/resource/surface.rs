//! Render surfaces (spec §3 `RenderSurface`, §4.9): an OS-backed window,
//! pixmap, or offscreen swap target.

use bitflags::bitflags;

use crate::backend::Backend;
use crate::config::RenderSurfaceType;
use crate::error::{Error, ErrorKind, Result};

bitflags! {
    pub struct RenderSurfaceUsage: u32 {
        const BLIT_COLOR_FROM = 0x1;
        const BLIT_COLOR_TO = 0x2;
        const BLIT_DEPTH_STENCIL_FROM = 0x4;
        const BLIT_DEPTH_STENCIL_TO = 0x8;
    }
}

/// A surface's pre-rotation, reported by the backend and consulted by
/// [`crate::projection`]'s rotation matrix helpers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Degrees of clockwise rotation, for diagnostics.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }
}

pub struct RenderSurface<B: Backend> {
    handle: Option<B::RenderSurfaceHandle>,
    name: String,
    surface_type: RenderSurfaceType,
    usage: RenderSurfaceUsage,
    width: u32,
    height: u32,
    pre_rotate_width: u32,
    pre_rotate_height: u32,
    rotation: Rotation,
}

impl<B: Backend> RenderSurface<B> {
    pub(crate) fn new(handle: B::RenderSurfaceHandle, name: String, surface_type: RenderSurfaceType, usage: RenderSurfaceUsage, width: u32, height: u32) -> Self {
        RenderSurface {
            handle: Some(handle),
            name,
            surface_type,
            usage,
            width,
            height,
            pre_rotate_width: width,
            pre_rotate_height: height,
            rotation: Rotation::None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface_type(&self) -> RenderSurfaceType {
        self.surface_type
    }

    pub fn usage(&self) -> RenderSurfaceUsage {
        self.usage
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Applies a backend-reported resize. Returns `true` iff the size
    /// actually changed.
    pub(crate) fn apply_resize(&mut self, width: u32, height: u32) -> bool {
        let changed = width != self.width || height != self.height;
        self.width = width;
        self.height = height;
        changed
    }

    pub(crate) fn handle(&self) -> &B::RenderSurfaceHandle {
        self.handle.as_ref().expect("surface already destroyed")
    }

    pub(crate) fn take_handle(&mut self) -> B::RenderSurfaceHandle {
        self.handle.take().expect("surface already destroyed")
    }
}

/// A 2x2 or 4x4 rotation matrix (column-major, as consumed by the backend),
/// for exactly the four cardinal [`Rotation`] values.
pub fn make_rotation_matrix22(rotation: Rotation) -> Result<[[f32; 2]; 2]> {
    Ok(match rotation {
        Rotation::None => [[1.0, 0.0], [0.0, 1.0]],
        Rotation::Rotate90 => [[0.0, 1.0], [-1.0, 0.0]],
        Rotation::Rotate180 => [[-1.0, 0.0], [0.0, -1.0]],
        Rotation::Rotate270 => [[0.0, -1.0], [1.0, 0.0]],
    })
}

pub fn make_rotation_matrix44(rotation: Rotation) -> Result<[[f32; 4]; 4]> {
    let m22 = make_rotation_matrix22(rotation)?;
    let mut m44 = [[0.0f32; 4]; 4];
    m44[0][0] = m22[0][0];
    m44[0][1] = m22[0][1];
    m44[1][0] = m22[1][0];
    m44[1][1] = m22[1][1];
    m44[2][2] = 1.0;
    m44[3][3] = 1.0;
    Ok(m44)
}

/// Validates a raw rotation value (degrees) and maps it onto [`Rotation`].
/// Fails with [`ErrorKind::InvalidArgument`] for anything but the four
/// cardinal values.
pub fn rotation_from_degrees(degrees: u32) -> Result<Rotation> {
    match degrees {
        0 => Ok(Rotation::None),
        90 => Ok(Rotation::Rotate90),
        180 => Ok(Rotation::Rotate180),
        270 => Ok(Rotation::Rotate270),
        other => Err(Error::new(ErrorKind::InvalidArgument, format!("unsupported surface rotation: {other} degrees"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_matrices_match_cardinal_angles() {
        assert_eq!(make_rotation_matrix22(Rotation::None).unwrap(), [[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(make_rotation_matrix22(Rotation::Rotate90).unwrap(), [[0.0, 1.0], [-1.0, 0.0]]);
        assert_eq!(make_rotation_matrix22(Rotation::Rotate180).unwrap(), [[-1.0, 0.0], [0.0, -1.0]]);
        assert_eq!(make_rotation_matrix22(Rotation::Rotate270).unwrap(), [[0.0, -1.0], [1.0, 0.0]]);
    }

    #[test]
    fn invalid_rotation_degrees_are_rejected() {
        let err = rotation_from_degrees(45).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
