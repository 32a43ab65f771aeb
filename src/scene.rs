use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat3, Mat4, Quat, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::lighting::MAX_LAMPS;
use crate::shapes::MeshKind;

pub const DEFAULT_SUN_POSITION: Vec3 = Vec3::new(10.5, 20.0, 20.0);

/// Surface finish of a placement. Each material samples as a flat colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Plain,
    Grass,
    Sidewalk,
    LampBase,
    LampLight,
    Pot,
    Dirt,
    Bark,
    Leaves,
    Stem,
    Brick,
}

impl Material {
    pub const ALL: [Material; 11] = [
        Material::Plain,
        Material::Grass,
        Material::Sidewalk,
        Material::LampBase,
        Material::LampLight,
        Material::Pot,
        Material::Dirt,
        Material::Bark,
        Material::Leaves,
        Material::Stem,
        Material::Brick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Material::Plain => "plain",
            Material::Grass => "grass",
            Material::Sidewalk => "sidewalk",
            Material::LampBase => "lamp_base",
            Material::LampLight => "lamp_light",
            Material::Pot => "pot",
            Material::Dirt => "dirt",
            Material::Bark => "bark",
            Material::Leaves => "leaves",
            Material::Stem => "stem",
            Material::Brick => "brick",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|material| material.name() == name)
    }

    /// Colour handed to the lighting evaluator as the sampled texture colour.
    pub fn base_color(self) -> Vec3 {
        match self {
            Material::Plain => Vec3::ONE,
            Material::Grass => Vec3::new(0.30, 0.55, 0.20),
            Material::Sidewalk => Vec3::new(0.62, 0.62, 0.60),
            Material::LampBase => Vec3::new(0.15, 0.15, 0.17),
            Material::LampLight => Vec3::new(0.95, 0.90, 0.70),
            Material::Pot => Vec3::new(0.80, 0.42, 0.26),
            Material::Dirt => Vec3::new(0.36, 0.25, 0.16),
            Material::Bark => Vec3::new(0.40, 0.28, 0.18),
            Material::Leaves => Vec3::new(0.22, 0.50, 0.18),
            Material::Stem => Vec3::new(0.35, 0.55, 0.25),
            Material::Brick => Vec3::new(0.62, 0.27, 0.20),
        }
    }
}

/// Scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(translation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    /// Applies a further rotation of `angle` radians about `axis` after the current one.
    /// A zero axis leaves the rotation unchanged.
    pub fn rotated(mut self, angle: f32, axis: Vec3) -> Self {
        self.rotation = axis_angle(angle, axis) * self.rotation;
        self
    }

    /// Model matrix `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

fn axis_angle(angle: f32, axis: Vec3) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO || angle == 0.0 {
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(axis, angle)
    }
}

/// Inverse-transpose of the model's upper 3x3, used to carry normals into world space.
///
/// Flattened transforms have no inverse; their linear part is used as is.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(model);
    if linear.determinant() == 0.0 {
        return linear;
    }
    let inverse = linear.inverse();
    if inverse.is_finite() {
        inverse.transpose()
    } else {
        linear
    }
}

/// One entry of the per-frame draw list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub name: String,
    pub mesh: MeshKind,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default = "default_tint")]
    pub tint: Vec3,
    /// Drawn unlit in white, like the light marker cubes.
    #[serde(default)]
    pub emissive: bool,
}

fn default_tint() -> Vec3 {
    Vec3::ONE
}

impl Placement {
    pub fn new(name: impl Into<String>, mesh: MeshKind, material: Material, transform: Transform) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
            transform,
            tint: default_tint(),
            emissive: false,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn surface_color(&self) -> Vec3 {
        self.material.base_color() * self.tint
    }
}

/// Declarative scene: the placements drawn every frame plus the light positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    placements: Vec<Placement>,
    sun_position: Vec3,
    lamp_positions: Vec<Vec3>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::garden()
    }
}

impl Scene {
    pub fn new(placements: Vec<Placement>, sun_position: Vec3, lamp_positions: Vec<Vec3>) -> Self {
        Self {
            placements,
            sun_position,
            lamp_positions,
        }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn sun_position(&self) -> Vec3 {
        self.sun_position
    }

    pub fn lamp_positions(&self) -> &[Vec3] {
        &self.lamp_positions
    }

    /// The garden: lawn and sidewalk, four lamp posts, two potted plants, a tree and brick borders.
    pub fn garden() -> Self {
        use Material::*;
        use MeshKind::{Box as Cuboid, Cylinder, Plane, Sphere, TaperedCylinder, Torus};

        let mut placements = vec![
            Placement::new(
                "Grass",
                Plane,
                Grass,
                Transform::new(Vec3::ZERO, Vec3::new(50.0, 1.0, 40.0)),
            ),
            Placement::new(
                "Sidewalk",
                Plane,
                Sidewalk,
                Transform::new(Vec3::new(35.0, 0.01, 0.0), Vec3::new(10.0, 1.0, 40.0)),
            ),
        ];

        let lamp_positions = vec![
            Vec3::new(22.5, 6.0, -20.0),
            Vec3::new(22.5, 6.0, 20.0),
            Vec3::new(47.5, 6.0, -20.0),
            Vec3::new(47.5, 6.0, 20.0),
        ];
        for (index, lamp) in lamp_positions.iter().enumerate() {
            placements.extend(lamp_post(index + 1, lamp.x, lamp.z));
        }

        let flip = |t: Transform| t.rotated(3.14, Vec3::Z);
        let lay_flat = |t: Transform| t.rotated(4.7, Vec3::X);

        // Large plant with leaves and a bud.
        let plant = Vec3::new(2.5, 5.0, 20.0);
        placements.extend([
            Placement::new("Plant 1 pot", TaperedCylinder, Pot, flip(Transform::new(plant, Vec3::new(3.0, 5.0, 3.0)))),
            Placement::new("Plant 1 rim", Torus, Pot, lay_flat(Transform::new(plant, Vec3::new(2.84, 2.84, 5.0)))),
            Placement::new("Plant 1 dirt", Cylinder, Dirt, Transform::new(plant, Vec3::new(2.7, 0.01, 2.7))),
            Placement::new("Plant 1 stem", Cylinder, Stem, Transform::new(plant, Vec3::new(0.2, 3.0, 0.2))),
        ]);
        let leaves = [
            (Vec3::new(1.4, 0.01, 0.4), 0.8, Vec3::Z, Vec3::new(3.5, 8.9, 20.0)),
            (Vec3::new(1.4, 0.01, 0.4), -0.8, Vec3::Z, Vec3::new(1.5, 8.9, 20.0)),
            (Vec3::new(0.4, 0.01, 1.4), -0.8, Vec3::X, Vec3::new(2.5, 8.9, 21.0)),
            (Vec3::new(0.4, 0.01, 1.4), 0.8, Vec3::X, Vec3::new(2.5, 8.9, 19.0)),
            (Vec3::new(0.4, 0.01, 1.4), -0.8, Vec3::X, Vec3::new(2.5, 6.9, 21.0)),
            (Vec3::new(0.4, 0.01, 1.4), 0.8, Vec3::X, Vec3::new(2.5, 7.9, 19.0)),
            (Vec3::new(1.4, 0.01, 0.4), -0.8, Vec3::Z, Vec3::new(1.5, 7.45, 20.0)),
        ];
        for (index, (scale, angle, axis, position)) in leaves.into_iter().enumerate() {
            placements.push(Placement::new(
                format!("Plant 1 leaf {}", index + 1),
                Cylinder,
                Leaves,
                Transform::new(position, scale).rotated(angle, axis),
            ));
        }
        placements.push(Placement::new(
            "Plant 1 bud",
            Sphere,
            Leaves,
            Transform::new(Vec3::new(2.5, 8.0, 20.0), Vec3::splat(0.15)).rotated(-0.4, Vec3::Y),
        ));

        let small_plant = Vec3::new(5.5, 2.5, 15.0);
        placements.extend([
            Placement::new("Plant 2 pot", TaperedCylinder, Pot, flip(Transform::new(small_plant, Vec3::new(1.5, 2.5, 1.5)))),
            Placement::new("Plant 2 rim", Torus, Pot, lay_flat(Transform::new(small_plant, Vec3::new(1.4, 1.4, 3.0)))),
            Placement::new("Plant 2 dirt", Cylinder, Dirt, Transform::new(small_plant, Vec3::new(1.4, 0.01, 1.4))),
        ]);

        placements.extend([
            Placement::new(
                "Tree trunk",
                Cylinder,
                Bark,
                Transform::new(Vec3::new(-10.5, -0.5, -23.0), Vec3::new(1.25, 10.0, 1.25)).rotated(0.3, Vec3::X),
            ),
            Placement::new(
                "Tree leaves",
                Sphere,
                Leaves,
                Transform::new(Vec3::new(-10.5, 13.5, -18.0), Vec3::new(15.0, 9.0, 24.0)).rotated(-0.4, Vec3::Y),
            ),
            Placement::new(
                "Brick border (porch to tree)",
                Cuboid,
                Brick,
                Transform::new(Vec3::new(-30.5, -0.25, 20.0), Vec3::new(35.5, 1.0, 1.5)).rotated(1.57, Vec3::Y),
            ),
            Placement::new(
                "Brick border (left to right)",
                Cuboid,
                Brick,
                Transform::new(Vec3::new(-6.0, -0.25, 3.0), Vec3::new(47.5, 1.0, 1.5)),
            ),
        ]);

        Self {
            placements,
            sun_position: DEFAULT_SUN_POSITION,
            lamp_positions,
        }
    }

    /// Parses a scene description:
    ///
    /// ```xml
    /// <scene>
    ///   <sun><position>10.5 20 20</position></sun>
    ///   <lamp><position>22.5 6 -20</position></lamp>
    ///   <placement>
    ///     <name>Grass</name>
    ///     <mesh>plane</mesh>
    ///     <material>grass</material>
    ///     <position>0 0 0</position>
    ///     <rotation>1.57 0 1 0</rotation>
    ///     <scale>50 1 40</scale>
    ///     <tint>255 255 255</tint>
    ///   </placement>
    /// </scene>
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("expected <scene> root element, found <{}>", root.tag_name().name());
        }

        let mut placements = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("placement")) {
            let name = required_text(&node, "name")?;
            let placement =
                parse_placement(&node, name.clone()).with_context(|| format!("invalid placement {name}"))?;
            placements.push(placement);
        }

        let sun_position = match root.children().find(|n| n.has_tag_name("sun")) {
            Some(sun) => parse_vec3(optional_text(&sun, "position"), DEFAULT_SUN_POSITION)
                .context("invalid sun position")?,
            None => DEFAULT_SUN_POSITION,
        };

        let lamp_positions = root
            .children()
            .filter(|n| n.has_tag_name("lamp"))
            .map(|lamp| {
                let position = optional_text(&lamp, "position")
                    .ok_or_else(|| anyhow!("<lamp> is missing <position>"))?;
                parse_vec3(Some(position), Vec3::ZERO)
            })
            .collect::<Result<Vec<_>>>()?;
        if lamp_positions.len() > MAX_LAMPS {
            bail!(
                "scene has {} lamps, at most {MAX_LAMPS} are supported",
                lamp_positions.len()
            );
        }

        Ok(Self {
            placements,
            sun_position,
            lamp_positions,
        })
    }

    /// White unlit cubes marking the sun and each lamp.
    pub fn light_markers(&self) -> Vec<Placement> {
        std::iter::once(("Sun marker".to_string(), self.sun_position))
            .chain(
                self.lamp_positions
                    .iter()
                    .enumerate()
                    .map(|(index, position)| (format!("Lamp {} marker", index + 1), *position)),
            )
            .map(|(name, position)| Placement {
                emissive: true,
                ..Placement::new(name, MeshKind::Box, Material::Plain, Transform::new(position, Vec3::ONE))
            })
            .collect()
    }

    /// Every placement submitted each frame, in draw order.
    pub fn draw_list(&self) -> Vec<Placement> {
        let mut list = self.placements.clone();
        list.extend(self.light_markers());
        list
    }
}

fn lamp_post(number: usize, x: f32, z: f32) -> Vec<Placement> {
    use Material::{LampBase, LampLight};
    use MeshKind::{Cylinder, TaperedCylinder, Torus};

    let at = |y: f32| Vec3::new(x, y, z);
    vec![
        Placement::new(format!("Lamp {number} post"), Cylinder, LampBase, Transform::new(at(0.0), Vec3::new(0.5, 4.0, 0.5))),
        Placement::new(format!("Lamp {number} light"), Cylinder, LampLight, Transform::new(at(6.0), Vec3::new(2.0, 2.5, 2.0))),
        Placement::new(
            format!("Lamp {number} neck"),
            TaperedCylinder,
            LampBase,
            Transform::new(at(5.0), Vec3::ONE).rotated(3.14, Vec3::Z),
        ),
        Placement::new(
            format!("Lamp {number} shade"),
            TaperedCylinder,
            LampBase,
            Transform::new(at(6.0), Vec3::new(2.0, 1.0, 2.0)).rotated(3.14, Vec3::Z),
        ),
        Placement::new(
            format!("Lamp {number} cap"),
            Torus,
            LampBase,
            Transform::new(at(8.5), Vec3::new(1.84, 1.84, 1.0)).rotated(4.7, Vec3::X),
        ),
    ]
}

fn parse_placement(node: &Node<'_, '_>, name: String) -> Result<Placement> {
    let mesh_name = required_text(node, "mesh")?;
    let mesh = MeshKind::from_name(&mesh_name).ok_or_else(|| anyhow!("unknown mesh `{mesh_name}`"))?;
    let material = match optional_text(node, "material") {
        Some(value) => Material::from_name(&value).ok_or_else(|| anyhow!("unknown material `{value}`"))?,
        None => Material::Plain,
    };
    let translation = parse_vec3(optional_text(node, "position"), Vec3::ZERO)?;
    let scale = parse_vec3(optional_text(node, "scale"), Vec3::ONE)?;
    let (angle, axis) = parse_rotation(optional_text(node, "rotation"))?;
    let tint = parse_color(optional_text(node, "tint"), Vec3::ONE)?;
    let emissive = parse_bool(optional_text(node, "emissive"), false)?;

    Ok(Placement {
        name,
        mesh,
        material,
        transform: Transform::new(translation, scale).rotated(angle, axis),
        tint,
        emissive,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_numbers<const N: usize>(value: &str, what: &str) -> Result<[f32; N]> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid {what} component `{component}`: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    numbers
        .try_into()
        .map_err(|numbers: Vec<f32>| anyhow!("{what} needs {N} components, found {}", numbers.len()))
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_numbers(&value, "vector")?))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let [r, g, b] = parse_numbers(&value, "color")?;
    Ok(Vec3::new(r / 255.0, g / 255.0, b / 255.0).clamp(Vec3::ZERO, Vec3::ONE))
}

fn parse_rotation(value: Option<String>) -> Result<(f32, Vec3)> {
    let Some(value) = value else {
        return Ok((0.0, Vec3::Y));
    };
    let [angle, x, y, z] = parse_numbers(&value, "rotation")?;
    Ok((angle, Vec3::new(x, y, z)))
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(anyhow!("expected a boolean, found `{other}`")),
    }
}
