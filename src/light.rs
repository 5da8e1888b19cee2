use nalgebra::{ Point3, Vector3 };

use crate::color::Color;
use crate::pattern::Pattern;
use crate::shape::ShapeId;
use crate::world::World;
use crate::consts::{ VACUUM_RI, GLASS_RI };

/// A point light.
///
/// A very simple light source. Provides a color and a position where light is
/// produced from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Point3<f64>,
}

impl PointLight {
    pub fn new(intensity: Color, position: Point3<f64>) -> PointLight {
        PointLight { intensity, position }
    }
}

impl Default for PointLight {
    fn default() -> PointLight {
        PointLight::new(Color::white(), Point3::new(-10.0, 10.0, -10.0))
    }
}

/// A material record.
///
/// Materials use attributes from the Phong reflection model; ambient, diffuse,
/// specular and shininess. On top of those, `reflective` and `transparency`
/// (both within 0.0 to 1.0) control how much of the reflected and refracted
/// rays contribute, and `refractive_index` bends refracted rays.
///
/// Materials are plain values. A world only hands them out by shared
/// reference while rendering, so they cannot change mid-render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub transparency: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::white(),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            transparency: 0.0,
            refractive_index: VACUUM_RI,
        }
    }
}

impl Material {
    /// A fully transparent glass material.
    pub fn glass() -> Material {
        Material {
            transparency: 1.0,
            refractive_index: GLASS_RI,
            ..Default::default()
        }
    }
}

/// Reflects a vector across a normal.
pub fn reflect(v: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    *v - *normal * (2.0 * v.dot(normal))
}

/// Calculates the Phong lighting at a point on shape `object`.
///
/// The surface color is the material's pattern (evaluated in the object's
/// space) if it has one, otherwise its flat color. If the point is in shadow
/// only the ambient term contributes.
#[allow(clippy::too_many_arguments)]
pub fn lighting(m: &Material, world: &World, object: ShapeId,
    light: &PointLight, point: &Point3<f64>, eyev: &Vector3<f64>,
    normalv: &Vector3<f64>, in_shadow: bool) -> Color {
    let color = match m.pattern {
        Some(ref pat) => pat.pattern_at_shape(world, object, point),
        None => m.color,
    };

    // Combine surface color with light's color
    let effective_color = color * light.intensity;
    let ambient = effective_color * m.ambient;

    if in_shadow {
        return ambient;
    }

    let lightv = (light.position - *point).normalize();

    // A negative dot product means the light is on the other side of the
    // surface, so neither diffuse nor specular light reaches the eye.
    let light_dot_normal = lightv.dot(normalv);
    if light_dot_normal < 0.0 {
        return ambient;
    }

    let diffuse = effective_color * m.diffuse * light_dot_normal;

    let reflectv = reflect(&-lightv, normalv);
    let reflect_dot_eye = reflectv.dot(eyev);

    let specular = if reflect_dot_eye <= 0.0 {
        Color::black()
    } else {
        light.intensity * m.specular * reflect_dot_eye.powf(m.shininess)
    };

    ambient + diffuse + specular
}

#[cfg(test)]
fn lighting_fixture() -> (World, ShapeId) {
    use crate::shape::Shape;
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere());
    (w, s)
}

#[test]
fn eye_between_light_and_surface() {
    let (w, s) = lighting_fixture();
    let m = Material::default();

    let eyev = Vector3::new(0.0, 0.0, -1.0);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 0.0, -10.0));

    let res = lighting(&m, &w, s, &light, &Point3::origin(), &eyev, &normalv,
        false);
    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_between_light_and_surface_offset_45() {
    let (w, s) = lighting_fixture();
    let m = Material::default();

    let eyev = Vector3::new(0.0, 2.0f64.sqrt() / 2.0, 2.0f64.sqrt() / 2.0);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 0.0, -10.0));

    let res = lighting(&m, &w, s, &light, &Point3::origin(), &eyev, &normalv,
        false);
    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn eye_opposite_surface_light_offset_45() {
    let (w, s) = lighting_fixture();
    let m = Material::default();

    let eyev = Vector3::new(0.0, 0.0, -1.0);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 10.0, -10.0));

    let res = lighting(&m, &w, s, &light, &Point3::origin(), &eyev, &normalv,
        false);
    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_in_path_of_reflection() {
    let (w, s) = lighting_fixture();
    let m = Material::default();

    let eyev = Vector3::new(0., -(2.0f64.sqrt())/2., -(2.0f64.sqrt())/2.);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 10.0, -10.0));

    let res = lighting(&m, &w, s, &light, &Point3::origin(), &eyev, &normalv,
        false);
    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn light_behind_surface() {
    let (w, s) = lighting_fixture();
    let m = Material::default();

    let eyev = Vector3::new(0.0, 0.0, -1.0);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 0.0, 10.0));

    let res = lighting(&m, &w, s, &light, &Point3::origin(), &eyev, &normalv,
        false);
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn surface_in_shadow_gets_ambient_only() {
    let (w, s) = lighting_fixture();
    let m = Material::default();

    let eyev = Vector3::new(0.0, 0.0, -1.0);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 0.0, -10.0));

    let res = lighting(&m, &w, s, &light, &Point3::origin(), &eyev, &normalv,
        true);
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_with_stripe_pattern() {
    let (w, s) = lighting_fixture();

    // Only ambient light is used, so the output is exactly the pattern.
    let m = Material {
        pattern: Some(Pattern::stripe(Color::white(), Color::black())),
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,
        ..Default::default()
    };

    let eyev = Vector3::new(0.0, 0.0, -1.0);
    let normalv = Vector3::new(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Point3::new(0.0, 0.0, -10.0));

    assert_eq!(
        lighting(&m, &w, s, &light, &Point3::new(0.9, 0.0, 0.0),
            &eyev, &normalv, false),
        Color::white()
    );
    assert_eq!(
        lighting(&m, &w, s, &light, &Point3::new(1.1, 0.0, 0.0),
            &eyev, &normalv, false),
        Color::black()
    );
}

#[test]
fn reflect_vector_at_45() {
    let v = Vector3::new(1.0, -1.0, 0.0);
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(reflect(&v, &n), Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn reflect_off_slanted_surface() {
    use approx::assert_abs_diff_eq;

    let v = Vector3::new(0.0, -1.0, 0.0);
    let n = Vector3::new(2.0f64.sqrt() / 2.0, 2.0f64.sqrt() / 2.0, 0.0);

    assert_abs_diff_eq!(reflect(&v, &n), Vector3::new(1.0, 0.0, 0.0),
        epsilon = 1e-9);
}
