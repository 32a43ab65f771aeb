use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};

use crate::context::FrameParams;
pub use crate::lighting::MAX_LAMPS;
use crate::lighting::LightDescriptor;
use crate::scene::{normal_matrix, Placement};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// `xyz` position, `w` ambient strength.
    pub sun_position: [f32; 4],
    pub sun_color: [f32; 4],
    pub lamp_positions: [[f32; 4]; MAX_LAMPS],
    pub lamp_colors: [[f32; 4]; MAX_LAMPS],
    /// `x` specular intensity, `y` shininess.
    pub shading: [f32; 4],
    /// `x` number of populated lamp slots.
    pub lamp_count: [u32; 4],
}

impl GlobalUniform {
    pub fn from_frame(frame: &FrameParams) -> Self {
        let mut lamp_positions = [[0.0; 4]; MAX_LAMPS];
        let mut lamp_colors = [[0.0; 4]; MAX_LAMPS];
        let uploaded = frame.lamps.len().min(MAX_LAMPS);
        for (slot, lamp) in frame.lamps.iter().take(MAX_LAMPS).enumerate() {
            let (position, color) = pack_light(lamp);
            lamp_positions[slot] = position;
            lamp_colors[slot] = color;
        }
        let (sun_position, sun_color) = pack_light(&frame.sun);
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            camera_position: frame.camera_position.extend(1.0).into(),
            sun_position,
            sun_color,
            lamp_positions,
            lamp_colors,
            shading: [frame.shading.specular_intensity, frame.shading.shininess, 0.0, 0.0],
            lamp_count: [uploaded as u32, 0, 0, 0],
        }
    }
}

fn pack_light(light: &LightDescriptor) -> ([f32; 4], [f32; 4]) {
    (
        light.position.extend(light.strength).into(),
        light.color().extend(1.0).into(),
    )
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    /// `x` is one for emissive placements.
    pub flags: [f32; 4],
}

impl ObjectConstants {
    pub fn from_placement(placement: &Placement) -> Self {
        let model = placement.model_matrix();
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal_matrix(model)),
            color: placement.surface_color().extend(1.0).into(),
            flags: [if placement.emissive { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    [
        matrix.x_axis.extend(0.0).into(),
        matrix.y_axis.extend(0.0).into(),
        matrix.z_axis.extend(0.0).into(),
    ]
}

pub const CLEAR_COLOR: Vec3 = Vec3::new(0.03, 0.03, 0.05);

pub(crate) const SHADER: &str = r#"
const MAX_LAMPS: u32 = 4u;

struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    sun_position: vec4<f32>,
    sun_color: vec4<f32>,
    lamp_positions: array<vec4<f32>, 4>,
    lamp_colors: array<vec4<f32>, 4>,
    shading: vec4<f32>,
    lamp_count: vec4<u32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    flags: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;
    out.normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;
    return out;
}

fn normalize_or_zero(v: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if len > 0.0 {
        return v / len;
    }
    return vec3<f32>(0.0);
}

fn light_terms(position: vec4<f32>, color: vec3<f32>, world_pos: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    if all(color == vec3<f32>(0.0)) {
        return vec3<f32>(0.0);
    }
    let ambient = position.w * color;

    let light_dir = normalize_or_zero(position.xyz - world_pos);
    let diffuse = max(dot(normal, light_dir), 0.0) * color;

    let view_dir = normalize_or_zero(globals.camera_position.xyz - world_pos);
    let reflect_dir = reflect(-light_dir, normal);
    let highlight = pow(max(dot(view_dir, reflect_dir), 0.0), globals.shading.y);
    let specular = globals.shading.x * highlight * color;

    return ambient + diffuse + specular;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    if object.flags.x > 0.5 {
        return vec4<f32>(1.0);
    }
    let normal = normalize_or_zero(input.normal);
    var total = light_terms(globals.sun_position, globals.sun_color.rgb, input.world_pos, normal);
    let count = min(globals.lamp_count.x, MAX_LAMPS);
    for (var i = 0u; i < count; i = i + 1u) {
        total += light_terms(globals.lamp_positions[i], globals.lamp_colors[i].rgb, input.world_pos, normal);
    }
    return vec4<f32>(total * object.color.rgb, 1.0);
}
"#;
