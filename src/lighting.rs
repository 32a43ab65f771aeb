//! Phong lighting shared by the CPU evaluator and the WGSL fragment stage.
//!
//! The evaluator sums an ambient, diffuse and specular term per light and
//! modulates the sum by the sampled surface colour. A light whose colour is
//! zero contributes nothing, which is how the scene switches lights off.

use glam::{Vec2, Vec3, Vec4};
use log::info;
use serde::{Deserialize, Serialize};

/// Colour the lamps take when switched on, a warm fire orange.
pub const LAMP_ON_COLOR: Vec3 = Vec3::new(1.0, 0.6, 0.0);
pub const SUN_ON_COLOR: Vec3 = Vec3::ONE;

/// Most lamps a scene may carry; the GPU uniform has one slot per lamp.
pub const MAX_LAMPS: usize = 4;

/// Scalar parameters of the Phong model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingParams {
    /// Ambient multiplier for the global light.
    pub light_strength: f32,
    /// Ambient multiplier for each lamp.
    pub key_light_strength: f32,
    pub specular_intensity: f32,
    pub shininess: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            light_strength: 1.0,
            key_light_strength: 0.5,
            specular_intensity: 0.4,
            shininess: 16.0,
        }
    }
}

/// Point light with a colour clamped to `[0, 1]` per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescriptor {
    color: Vec3,
    pub position: Vec3,
    /// Ambient multiplier applied to this light's colour.
    pub strength: f32,
}

impl LightDescriptor {
    pub fn new(color: Vec3, position: Vec3, strength: f32) -> Self {
        Self {
            color: clamp_color(color),
            position,
            strength,
        }
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = clamp_color(color);
    }

    pub fn is_off(&self) -> bool {
        self.color == Vec3::ZERO
    }
}

fn clamp_color(color: Vec3) -> Vec3 {
    let color = Vec3::select(color.is_nan_mask(), Vec3::ZERO, color);
    color.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Geometry and colour of one rasterised fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub texture_color: Vec3,
    pub uv: Vec2,
}

impl SurfaceSample {
    pub fn new(world_position: Vec3, world_normal: Vec3, texture_color: Vec3) -> Self {
        Self {
            world_position,
            world_normal,
            texture_color,
            uv: Vec2::ZERO,
        }
    }
}

/// Lighting terms accumulated across every light, before the texture modulation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhongTerms {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl PhongTerms {
    pub fn total(&self) -> Vec3 {
        self.ambient + self.diffuse + self.specular
    }
}

/// Computes the contribution of a single light at a fragment.
pub fn light_terms(
    light: &LightDescriptor,
    sample: &SurfaceSample,
    view_position: Vec3,
    params: &ShadingParams,
) -> PhongTerms {
    if light.is_off() {
        return PhongTerms::default();
    }
    let color = light.color();
    let ambient = light.strength * color;

    let norm = sample.world_normal.normalize_or_zero();
    let light_dir = (light.position - sample.world_position).normalize_or_zero();
    let diffuse = norm.dot(light_dir).max(0.0) * color;

    let view_dir = (view_position - sample.world_position).normalize_or_zero();
    let reflect_dir = reflect(-light_dir, norm);
    let highlight = view_dir.dot(reflect_dir).max(0.0).powf(params.shininess);
    let specular = params.specular_intensity * highlight * color;

    PhongTerms {
        ambient,
        diffuse,
        specular,
    }
}

/// Sums every light's terms at the fragment.
pub fn accumulate<'a>(
    lights: impl IntoIterator<Item = &'a LightDescriptor>,
    sample: &SurfaceSample,
    view_position: Vec3,
    params: &ShadingParams,
) -> PhongTerms {
    lights
        .into_iter()
        .map(|light| light_terms(light, sample, view_position, params))
        .fold(PhongTerms::default(), |acc, terms| PhongTerms {
            ambient: acc.ambient + terms.ambient,
            diffuse: acc.diffuse + terms.diffuse,
            specular: acc.specular + terms.specular,
        })
}

/// Final fragment colour. Values above one are left for the output stage to saturate.
pub fn shade<'a>(
    lights: impl IntoIterator<Item = &'a LightDescriptor>,
    sample: &SurfaceSample,
    view_position: Vec3,
    params: &ShadingParams,
) -> Vec4 {
    let terms = accumulate(lights, sample, view_position, params);
    (terms.total() * sample.texture_color).extend(1.0)
}

/// GLSL-style reflection of `incident` about `normal`.
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// The global sun light plus the lamp-post key lights.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    sun: LightDescriptor,
    lamps: Vec<LightDescriptor>,
}

impl LightRig {
    /// Starts with the sun on and the lamps off.
    pub fn new(sun_position: Vec3, lamp_positions: &[Vec3], params: &ShadingParams) -> Self {
        Self {
            sun: LightDescriptor::new(SUN_ON_COLOR, sun_position, params.light_strength),
            lamps: lamp_positions
                .iter()
                .map(|&position| LightDescriptor::new(Vec3::ZERO, position, params.key_light_strength))
                .collect(),
        }
    }

    pub fn sun(&self) -> &LightDescriptor {
        &self.sun
    }

    pub fn lamps(&self) -> &[LightDescriptor] {
        &self.lamps
    }

    /// Colour shared by every lamp.
    pub fn lamp_color(&self) -> Vec3 {
        self.lamps.first().map_or(Vec3::ZERO, |lamp| lamp.color())
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightDescriptor> {
        std::iter::once(&self.sun).chain(self.lamps.iter())
    }

    /// Switches the lamps on and the sun off.
    pub fn lamps_on(&mut self) {
        if self.sun.is_off() && self.lamp_color() == LAMP_ON_COLOR {
            return;
        }
        info!("switching to lamp light, sun off");
        self.set_lamp_color(LAMP_ON_COLOR);
        self.sun.set_color(Vec3::ZERO);
    }

    /// Switches the sun on and the lamps off.
    pub fn sun_on(&mut self) {
        if self.sun.color() == SUN_ON_COLOR && self.lamp_color() == Vec3::ZERO {
            return;
        }
        info!("switching to sun light, lamps off");
        self.sun.set_color(SUN_ON_COLOR);
        self.set_lamp_color(Vec3::ZERO);
    }

    pub fn set_lamp_color(&mut self, color: Vec3) {
        for lamp in &mut self.lamps {
            lamp.set_color(color);
        }
    }

    /// Re-applies ambient strengths after the shading parameters change.
    pub fn apply_params(&mut self, params: &ShadingParams) {
        self.sun.strength = params.light_strength;
        for lamp in &mut self.lamps {
            lamp.strength = params.key_light_strength;
        }
    }

    pub fn shade(&self, sample: &SurfaceSample, view_position: Vec3, params: &ShadingParams) -> Vec4 {
        shade(self.lights(), sample, view_position, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn upward_sample() -> SurfaceSample {
        SurfaceSample::new(Vec3::ZERO, Vec3::Y, Vec3::ONE)
    }

    #[test]
    fn zero_color_light_contributes_nothing() {
        let params = ShadingParams::default();
        let light = LightDescriptor::new(Vec3::ZERO, Vec3::new(3.0, 7.0, -2.0), 1.0);
        let terms = light_terms(&light, &upward_sample(), Vec3::new(0.0, 4.0, 4.0), &params);
        assert_eq!(terms, PhongTerms::default());
        let color = shade([&light], &upward_sample(), Vec3::new(0.0, 4.0, 4.0), &params);
        assert_eq!(color, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn overhead_white_light_gives_full_diffuse() {
        let params = ShadingParams::default();
        let light = LightDescriptor::new(Vec3::ONE, Vec3::new(0.0, 10.0, 0.0), params.light_strength);
        let terms = light_terms(&light, &upward_sample(), Vec3::new(5.0, 1.0, 0.0), &params);
        assert!(terms.diffuse.abs_diff_eq(Vec3::splat(params.light_strength), EPSILON));
        assert!(terms.ambient.abs_diff_eq(Vec3::ONE, EPSILON));
    }

    #[test]
    fn specular_peaks_along_mirror_direction() {
        let params = ShadingParams::default();
        let light = LightDescriptor::new(Vec3::ONE, Vec3::new(-4.0, 4.0, 0.0), 1.0);
        let mirror = light_terms(&light, &upward_sample(), Vec3::new(4.0, 4.0, 0.0), &params);
        assert!(mirror.specular.abs_diff_eq(Vec3::splat(params.specular_intensity), EPSILON));
        let behind = light_terms(&light, &upward_sample(), Vec3::new(-4.0, -4.0, 0.0), &params);
        assert_eq!(behind.specular, Vec3::ZERO);
    }

    #[test]
    fn back_facing_light_keeps_only_ambient() {
        let params = ShadingParams::default();
        let light = LightDescriptor::new(Vec3::ONE, Vec3::new(0.0, -5.0, 0.0), 0.5);
        let terms = light_terms(&light, &upward_sample(), Vec3::new(0.0, 5.0, 0.0), &params);
        assert_eq!(terms.diffuse, Vec3::ZERO);
        assert_eq!(terms.specular, Vec3::ZERO);
        assert!(terms.ambient.abs_diff_eq(Vec3::splat(0.5), EPSILON));
    }

    #[test]
    fn output_is_modulated_by_texture_and_not_clamped() {
        let params = ShadingParams::default();
        let light = LightDescriptor::new(Vec3::ONE, Vec3::new(0.0, 10.0, 0.0), 1.0);
        let mut sample = upward_sample();
        sample.texture_color = Vec3::new(1.0, 0.5, 0.0);
        let color = shade([&light], &sample, Vec3::new(0.0, 10.0, 0.0), &params);
        let total = 1.0 + 1.0 + params.specular_intensity;
        assert!(color.abs_diff_eq(Vec4::new(total, total * 0.5, 0.0, 1.0), EPSILON));
        assert!(color.x > 1.0);
    }

    #[test]
    fn colors_are_clamped() {
        let mut light = LightDescriptor::new(Vec3::new(2.0, -1.0, 0.5), Vec3::ZERO, 1.0);
        assert_eq!(light.color(), Vec3::new(1.0, 0.0, 0.5));
        light.set_color(Vec3::new(f32::NAN, 3.0, 0.25));
        assert_eq!(light.color(), Vec3::new(0.0, 1.0, 0.25));
    }

    #[test]
    fn degenerate_geometry_does_not_produce_nan() {
        let params = ShadingParams::default();
        let light = LightDescriptor::new(Vec3::ONE, Vec3::ZERO, 1.0);
        let sample = SurfaceSample::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
        let color = shade([&light], &sample, Vec3::ZERO, &params);
        assert!(color.is_finite());
    }

    #[test]
    fn reflect_matches_glsl() {
        let reflected = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(reflected, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn sun_and_lamps_are_mutually_exclusive() {
        let params = ShadingParams::default();
        let lamps = [Vec3::new(22.5, 6.0, -20.0), Vec3::new(47.5, 6.0, 20.0)];
        let mut rig = LightRig::new(Vec3::new(10.5, 20.0, 20.0), &lamps, &params);
        assert_eq!(rig.sun().color(), SUN_ON_COLOR);
        assert!(rig.lamps().iter().all(LightDescriptor::is_off));

        rig.lamps_on();
        assert!(rig.sun().is_off());
        assert!(rig.lamps().iter().all(|lamp| lamp.color() == LAMP_ON_COLOR));

        rig.sun_on();
        assert_eq!(rig.sun().color(), SUN_ON_COLOR);
        assert!(rig.lamps().iter().all(LightDescriptor::is_off));
    }

    #[test]
    fn every_lamp_lights_the_fragment() {
        let params = ShadingParams::default();
        let lamps = [Vec3::new(-3.0, 2.0, 0.0), Vec3::new(3.0, 2.0, 0.0)];
        let mut rig = LightRig::new(Vec3::new(0.0, 50.0, 0.0), &lamps, &params);
        rig.lamps_on();
        let sample = upward_sample();
        let view = Vec3::new(0.0, 10.0, 10.0);
        let both = rig.shade(&sample, view, &params);
        let single = shade([&rig.lamps()[0]], &sample, view, &params);
        assert!(both.x > single.x);
        assert!((both.x - 2.0 * single.x).abs() < EPSILON);
    }

    #[test]
    fn lamp_strength_follows_params() {
        let mut params = ShadingParams::default();
        let mut rig = LightRig::new(Vec3::Y, &[Vec3::X], &params);
        params.key_light_strength = 0.25;
        params.light_strength = 0.75;
        rig.apply_params(&params);
        assert_eq!(rig.lamps()[0].strength, 0.25);
        assert_eq!(rig.sun().strength, 0.75);
    }
}
