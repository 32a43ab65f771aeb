use std::f32::consts::{PI, TAU};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Radial resolution shared by the round primitives.
pub const SEGMENTS: u32 = 36;
const SPHERE_STACKS: u32 = 18;
const TORUS_TUBE_SEGMENTS: u32 = 12;
const TORUS_MINOR_RADIUS: f32 = 0.1;
const TAPERED_TOP_RADIUS: f32 = 0.5;

/// Built-in primitive shapes the scene is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshKind {
    /// `[-1, 1]` square in the XZ plane facing +Y.
    Plane,
    /// Unit cube centred on the origin.
    Box,
    /// Radius 1, spanning y in `[0, 1]`, capped at both ends.
    Cylinder,
    /// Like [`MeshKind::Cylinder`] but narrowing to radius 0.5 at the top.
    TaperedCylinder,
    /// Ring of radius 1 around the Z axis.
    Torus,
    /// Radius 1 centred on the origin.
    Sphere,
}

impl MeshKind {
    pub const ALL: [MeshKind; 6] = [
        MeshKind::Plane,
        MeshKind::Box,
        MeshKind::Cylinder,
        MeshKind::TaperedCylinder,
        MeshKind::Torus,
        MeshKind::Sphere,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MeshKind::Plane => "plane",
            MeshKind::Box => "box",
            MeshKind::Cylinder => "cylinder",
            MeshKind::TaperedCylinder => "tapered_cylinder",
            MeshKind::Torus => "torus",
            MeshKind::Sphere => "sphere",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Generates the triangle list for this shape.
    pub fn build(self) -> MeshData {
        match self {
            MeshKind::Plane => plane(),
            MeshKind::Box => unit_box(),
            MeshKind::Cylinder => frustum(1.0, 1.0),
            MeshKind::TaperedCylinder => frustum(1.0, TAPERED_TOP_RADIUS),
            MeshKind::Torus => torus(1.0, TORUS_MINOR_RADIUS),
            MeshKind::Sphere => sphere(),
        }
    }
}

/// Interleaved vertex/index arrays ready for upload.
///
/// Vertices are laid out as `position.xyz` followed by `normal.xyz`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub const STRIDE: usize = 6;

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / Self::STRIDE
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
        index
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * Self::STRIDE;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * Self::STRIDE + 3;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }
}

fn plane() -> MeshData {
    let mut mesh = MeshData::default();
    for (x, z) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        mesh.push_vertex(Vec3::new(x, 0.0, z), Vec3::Y);
    }
    mesh.indices = vec![0, 2, 1, 0, 3, 2];
    mesh
}

const CUBE_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

const CUBE_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];

fn unit_box() -> MeshData {
    MeshData {
        vertices: CUBE_VERTICES.to_vec(),
        indices: CUBE_INDICES.to_vec(),
    }
}

/// Capped frustum around +Y from y = 0 (radius `bottom`) to y = 1 (radius `top`).
fn frustum(bottom: f32, top: f32) -> MeshData {
    let mut mesh = MeshData::default();

    for (y, radius, normal) in [(0.0, bottom, Vec3::NEG_Y), (1.0, top, Vec3::Y)] {
        let center = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal);
        for step in 0..SEGMENTS {
            let (sin, cos) = (step as f32 / SEGMENTS as f32 * TAU).sin_cos();
            mesh.push_vertex(Vec3::new(cos * radius, y, sin * radius), normal);
        }
        for step in 0..SEGMENTS {
            let a = center + 1 + step;
            let b = center + 1 + (step + 1) % SEGMENTS;
            if normal.y > 0.0 {
                mesh.indices.extend_from_slice(&[center, b, a]);
            } else {
                mesh.indices.extend_from_slice(&[center, a, b]);
            }
        }
    }

    // The side slopes inward by (bottom - top) over a height of one.
    let slope = bottom - top;
    let side_start = mesh.vertex_count() as u32;
    for step in 0..=SEGMENTS {
        let (sin, cos) = (step as f32 / SEGMENTS as f32 * TAU).sin_cos();
        let normal = Vec3::new(cos, slope, sin).normalize();
        mesh.push_vertex(Vec3::new(cos * bottom, 0.0, sin * bottom), normal);
        mesh.push_vertex(Vec3::new(cos * top, 1.0, sin * top), normal);
    }
    for step in 0..SEGMENTS {
        let lower = side_start + step * 2;
        let upper = lower + 1;
        let next_lower = lower + 2;
        let next_upper = lower + 3;
        mesh.indices
            .extend_from_slice(&[lower, upper, next_lower, next_lower, upper, next_upper]);
    }
    mesh
}

fn torus(major: f32, minor: f32) -> MeshData {
    let mut mesh = MeshData::default();
    for ring in 0..=SEGMENTS {
        let (ring_sin, ring_cos) = (ring as f32 / SEGMENTS as f32 * TAU).sin_cos();
        let ring_dir = Vec3::new(ring_cos, ring_sin, 0.0);
        for tube in 0..=TORUS_TUBE_SEGMENTS {
            let (tube_sin, tube_cos) = (tube as f32 / TORUS_TUBE_SEGMENTS as f32 * TAU).sin_cos();
            let normal = ring_dir * tube_cos + Vec3::Z * tube_sin;
            mesh.push_vertex(ring_dir * major + normal * minor, normal);
        }
    }
    let row = TORUS_TUBE_SEGMENTS + 1;
    for ring in 0..SEGMENTS {
        for tube in 0..TORUS_TUBE_SEGMENTS {
            let a = ring * row + tube;
            let b = (ring + 1) * row + tube;
            mesh.indices
                .extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

fn sphere() -> MeshData {
    let mut mesh = MeshData::default();
    for stack in 0..=SPHERE_STACKS {
        let phi = stack as f32 / SPHERE_STACKS as f32 * PI;
        let (phi_sin, phi_cos) = phi.sin_cos();
        for slice in 0..=SEGMENTS {
            let (theta_sin, theta_cos) = (slice as f32 / SEGMENTS as f32 * TAU).sin_cos();
            let normal = Vec3::new(phi_sin * theta_cos, phi_cos, phi_sin * theta_sin);
            mesh.push_vertex(normal, normal);
        }
    }
    let row = SEGMENTS + 1;
    for stack in 0..SPHERE_STACKS {
        for slice in 0..SEGMENTS {
            let a = stack * row + slice;
            let b = a + row;
            mesh.indices
                .extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }
    mesh
}
