use std::fs;
use std::io;
use std::path::Path;

use log::{ debug, info };
use nalgebra::{ Matrix4, Point3, Vector3 };
use serde::{ Serialize, Deserialize };
use thiserror::Error;

use crate::color::Color;
use crate::camera::Camera;
use crate::light::{ Material, PointLight };
use crate::pattern::{ Pattern, PatternKind };
use crate::shape::{ Extent, Shape, ShapeId, ShapeKind };
use crate::transform::{ self, TransformError };
use crate::world::{ World, WorldConfig, WorldError };

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("could not read scene: {0}")]
    Io(#[from] io::Error),

    #[error("malformed scene description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    World(#[from] WorldError),
}

/// Reads a JSON scene description from `path` and builds it.
pub fn load(path: &Path) -> Result<(World, Camera), SceneError> {
    let text = fs::read_to_string(path)?;
    let description: SceneDescription = serde_json::from_str(&text)?;
    info!("loaded scene {} with {} top-level shapes", path.display(),
        description.shapes.len());

    description.build()
}

/// A scene as written in a JSON scene file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    pub camera: CameraDescription,
    pub light: LightDescription,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub shapes: Vec<ShapeDescription>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraDescription {
    pub width: usize,
    pub height: usize,

    /// In radians.
    pub field_of_view: f64,

    pub from: [f64; 3],
    pub to: [f64; 3],
    pub up: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightDescription {
    pub position: [f64; 3],

    #[serde(default = "white")]
    pub intensity: [f64; 3],
}

fn white() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// Values shared by every shape in the scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default)]
    pub material: MaterialDescription,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    Sphere,
    Plane,
    Cube,
    Cylinder,
    Cone,
    Group,
}

/// One step of a transform list. Steps apply to the shape in listed order.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOp {
    Translate([f64; 3]),
    Scale([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),

    /// `[xy, xz, yx, yz, zx, zy]`
    Shear([f64; 6]),
}

impl TransformOp {
    pub fn matrix(&self) -> Matrix4<f64> {
        match *self {
            TransformOp::Translate([x, y, z]) => {
                transform::translation(x, y, z)
            },
            TransformOp::Scale([x, y, z]) => transform::scaling(x, y, z),
            TransformOp::RotateX(r) => transform::rotation_x(r),
            TransformOp::RotateY(r) => transform::rotation_y(r),
            TransformOp::RotateZ(r) => transform::rotation_z(r),
            TransformOp::Shear([xy, xz, yx, yz, zx, zy]) => {
                transform::shearing(xy, xz, yx, yz, zx, zy)
            },
        }
    }
}

/// Composes a transform list; the first step listed is applied first.
pub fn compose(ops: &[TransformOp]) -> Matrix4<f64> {
    ops.iter().fold(Matrix4::identity(), |m, op| op.matrix() * m)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDescription {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub colors: [[f64; 3]; 2],

    #[serde(default)]
    pub transform: Vec<TransformOp>,
}

impl PatternDescription {
    pub fn to_pattern(&self) -> Result<Pattern, TransformError> {
        let [primary, secondary] = self.colors;
        Pattern::new(self.kind, Color::from(&primary[..]),
            Color::from(&secondary[..]))
            .with_transform(compose(&self.transform))
    }
}

/// Material overrides. Anything left out keeps the value it is applied to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialDescription {
    pub color: Option<[f64; 3]>,
    pub pattern: Option<PatternDescription>,

    pub ambient: Option<f64>,
    pub diffuse: Option<f64>,
    pub specular: Option<f64>,
    pub shininess: Option<f64>,

    pub reflective: Option<f64>,
    pub transparency: Option<f64>,
    pub refractive_index: Option<f64>,
}

impl MaterialDescription {
    pub fn apply(&self, base: &Material) -> Result<Material, TransformError> {
        let mut m = *base;

        if let Some(ref color) = self.color {
            m.color = Color::from(&color[..]);
        }
        if let Some(ref pattern) = self.pattern {
            m.pattern = Some(pattern.to_pattern()?);
        }

        m.ambient = self.ambient.unwrap_or(m.ambient);
        m.diffuse = self.diffuse.unwrap_or(m.diffuse);
        m.specular = self.specular.unwrap_or(m.specular);
        m.shininess = self.shininess.unwrap_or(m.shininess);
        m.reflective = self.reflective.unwrap_or(m.reflective);
        m.transparency = self.transparency.unwrap_or(m.transparency);
        m.refractive_index = self.refractive_index
            .unwrap_or(m.refractive_index);

        Ok(m)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeDescription {
    #[serde(rename = "type")]
    pub kind: ShapeType,

    /// Cylinders and cones only.
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    #[serde(default)]
    pub closed: bool,

    #[serde(default)]
    pub transform: Vec<TransformOp>,

    #[serde(default)]
    pub material: MaterialDescription,

    /// Groups only.
    #[serde(default)]
    pub children: Vec<ShapeDescription>,
}

impl ShapeDescription {
    pub fn to_shape(&self, base: &Material) -> Result<Shape, TransformError> {
        let extent = Extent::new(
            self.minimum.unwrap_or(f64::NEG_INFINITY),
            self.maximum.unwrap_or(f64::INFINITY),
            self.closed,
        );

        let kind = match self.kind {
            ShapeType::Sphere => ShapeKind::Sphere,
            ShapeType::Plane => ShapeKind::Plane,
            ShapeType::Cube => ShapeKind::Cube,
            ShapeType::Cylinder => ShapeKind::Cylinder(extent),
            ShapeType::Cone => ShapeKind::Cone(extent),
            ShapeType::Group => ShapeKind::Group,
        };

        Ok(Shape::new(kind)
            .with_transform(compose(&self.transform))?
            .with_material(self.material.apply(base)?))
    }
}

impl SceneDescription {
    /// Builds the world and camera this description names.
    pub fn build(&self) -> Result<(World, Camera), SceneError> {
        let c = &self.camera;
        let view = transform::view_transform(
            Point3::from(c.from),
            Point3::from(c.to),
            Vector3::from(c.up),
        );
        let camera = Camera::new(c.width, c.height, c.field_of_view, view)?;

        let config = WorldConfig {
            light: PointLight::new(
                Color::from(&self.light.intensity[..]),
                Point3::from(self.light.position),
            ),
            material: self.defaults.material.apply(&Material::default())?,
        };

        let mut world = World::new(config);
        for shape in self.shapes.iter() {
            add_shape(&mut world, None, shape)?;
        }

        debug!("built world with {} shapes", world.len());
        Ok((world, camera))
    }
}

fn add_shape(world: &mut World, parent: Option<ShapeId>,
    description: &ShapeDescription) -> Result<ShapeId, SceneError> {
    let shape = description.to_shape(world.default_material())?;

    let id = match parent {
        Some(group) => world.add_child(group, shape)?,
        None => world.add(shape),
    };

    for child in description.children.iter() {
        add_shape(world, Some(id), child)?;
    }

    Ok(id)
}

#[cfg(test)]
const TEST_SCENE: &str = r#"{
    "camera": {
        "width": 40, "height": 20, "field_of_view": 1.0472,
        "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0]
    },
    "light": { "position": [-10, 10, -10] },
    "defaults": { "material": { "specular": 0.3 } },
    "shapes": [
        {
            "type": "plane",
            "material": {
                "reflective": 0.5,
                "pattern": {
                    "type": "checker",
                    "colors": [[1, 1, 1], [0, 0, 0]],
                    "transform": [{ "scale": [0.5, 0.5, 0.5] }]
                }
            }
        },
        {
            "type": "group",
            "transform": [{ "translate": [0, 1, 0] }],
            "children": [
                { "type": "sphere", "material": { "color": [1, 0, 0] } },
                {
                    "type": "cone", "minimum": -1, "maximum": 0,
                    "closed": true
                }
            ]
        }
    ]
}"#;

#[test]
fn parse_and_build_scene() {
    let description: SceneDescription = serde_json::from_str(TEST_SCENE)
        .unwrap();
    let (world, camera) = description.build().unwrap();

    assert_eq!((camera.hsize, camera.vsize), (40, 20));
    assert_eq!(world.light.position, Point3::new(-10.0, 10.0, -10.0));
    assert_eq!(world.light.intensity, Color::white());

    assert_eq!(world.objects().len(), 2);
    assert_eq!(world.len(), 4);

    let plane = world.shape(world.objects()[0]);
    assert_eq!(plane.material.reflective, 0.5);
    assert_eq!(plane.material.specular, 0.3);
    assert!(plane.material.pattern.is_some());

    let group = world.shape(world.objects()[1]);
    assert!(group.is_group());

    let sphere = world.shape(group.children()[0]);
    assert_eq!(sphere.material.color, Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(sphere.material.specular, 0.3);

    let cone = world.shape(group.children()[1]);
    assert_eq!(*cone.kind(), ShapeKind::Cone(Extent::new(-1.0, 0.0, true)));
}

#[test]
fn transform_steps_apply_in_listed_order() {
    use approx::assert_abs_diff_eq;

    let ops: Vec<TransformOp> = serde_json::from_str(
        r#"[{ "scale": [2, 2, 2] }, { "translate": [1, 0, 0] }]"#
    ).unwrap();
    let m = compose(&ops);

    assert_abs_diff_eq!(m.transform_point(&Point3::new(1.0, 0.0, 0.0)),
        Point3::new(3.0, 0.0, 0.0), epsilon = 1e-9);
}

#[test]
fn children_on_a_primitive_are_rejected() {
    let json = r#"{
        "camera": {
            "width": 4, "height": 4, "field_of_view": 1.0,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0]
        },
        "light": { "position": [0, 10, 0] },
        "shapes": [{ "type": "sphere", "children": [{ "type": "cube" }] }]
    }"#;
    let description: SceneDescription = serde_json::from_str(json).unwrap();

    assert!(matches!(description.build(),
        Err(SceneError::World(WorldError::NotAGroup(_)))));
}

#[test]
fn singular_shape_transform_is_rejected() {
    let json = r#"{
        "camera": {
            "width": 4, "height": 4, "field_of_view": 1.0,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0]
        },
        "light": { "position": [0, 10, 0] },
        "shapes": [{ "type": "cube", "transform": [{ "scale": [1, 0, 1] }] }]
    }"#;
    let description: SceneDescription = serde_json::from_str(json).unwrap();

    assert!(matches!(description.build(), Err(SceneError::Transform(_))));
}

#[test]
fn camera_looking_at_itself_is_rejected() {
    let json = r#"{
        "camera": {
            "width": 4, "height": 4, "field_of_view": 1.0,
            "from": [0, 0, 0], "to": [0, 0, 0], "up": [0, 1, 0]
        },
        "light": { "position": [0, 10, 0] }
    }"#;
    let description: SceneDescription = serde_json::from_str(json).unwrap();

    assert!(matches!(description.build(), Err(SceneError::Transform(_))));
}

#[test]
fn unknown_shape_type_fails_to_parse() {
    let result = serde_json::from_str::<ShapeDescription>(
        r#"{ "type": "teapot" }"#);

    assert!(result.is_err());
}

#[test]
fn load_bundled_scene() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scenes")
        .join("showcase.json");
    let (world, camera) = load(&path).unwrap();

    assert!(!world.is_empty());
    assert!(camera.hsize > 0 && camera.vsize > 0);
}

#[test]
fn missing_scene_file_is_an_io_error() {
    let result = load(Path::new("no/such/scene.json"));

    assert!(matches!(result, Err(SceneError::Io(_))));
}
