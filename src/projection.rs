use glam::Mat4;
use serde::{Deserialize, Serialize};

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;
/// Half extent of the fixed orthographic view box.
pub const ORTHO_HALF_EXTENT: f32 = 5.0;

/// How the view volume is projected onto the screen. Clip depth spans `0..1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    /// Builds the projection matrix; `fov_degrees` is only used in perspective mode.
    pub fn matrix(self, fov_degrees: f32, aspect: f32) -> Mat4 {
        match self {
            Self::Perspective => {
                Mat4::perspective_rh(fov_degrees.to_radians(), sanitize_aspect(aspect), NEAR_PLANE, FAR_PLANE)
            }
            Self::Orthographic => Mat4::orthographic_rh(
                -ORTHO_HALF_EXTENT,
                ORTHO_HALF_EXTENT,
                -ORTHO_HALF_EXTENT,
                ORTHO_HALF_EXTENT,
                NEAR_PLANE,
                FAR_PLANE,
            ),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
        }
    }
}

/// Returns the width/height ratio of a surface, falling back to 1 for empty surfaces.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}
