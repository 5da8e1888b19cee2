use log::trace;
use nalgebra::{ Point3, Vector3 };
use thiserror::Error;

use crate::ray::Ray;
use crate::color::Color;
use crate::light::{ PointLight, Material, lighting };
use crate::shape::{ Shape, ShapeId, ShapeKind };
use crate::intersect::{ Intersection, Intersections, Computations, TraceError };

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("shape {0:?} is not a group and cannot have children")]
    NotAGroup(ShapeId),

    #[error("shape {0:?} does not belong to this world")]
    UnknownShape(ShapeId),
}

/// The defaults a world is built from.
///
/// `material` is what scene descriptions start every shape from before
/// applying their own overrides.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorldConfig {
    pub light: PointLight,
    pub material: Material,
}

/// A world with objects and light.
///
/// Shapes are stored in an arena and referred to by `ShapeId`. Top-level
/// objects are kept in insertion order; groups hold the ids of their children
/// and every child holds the id of its parent.
///
/// Rendering only ever borrows a world immutably, so the scene cannot be
/// mutated while workers are reading it.
#[derive(Clone, Debug)]
pub struct World {
    shapes: Vec<Shape>,
    objects: Vec<ShapeId>,
    default_material: Material,
    pub light: PointLight,
}

impl World {
    /// Creates an empty world lit by the configured light.
    pub fn new(config: WorldConfig) -> World {
        World {
            shapes: Vec::new(),
            objects: Vec::new(),
            default_material: config.material,
            light: config.light,
        }
    }

    pub fn default_material(&self) -> &Material {
        &self.default_material
    }

    /// Adds a top-level object to the world.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = self.insert(shape, None);
        self.objects.push(id);
        id
    }

    /// Adds `shape` as the last child of `group`.
    pub fn add_child(&mut self, group: ShapeId, shape: Shape)
        -> Result<ShapeId, WorldError> {
        let parent = self.shapes.get(group.0)
            .ok_or(WorldError::UnknownShape(group))?;
        if !parent.is_group() {
            return Err(WorldError::NotAGroup(group));
        }

        let id = self.insert(shape, Some(group));
        self.shapes[group.0].children.push(id);
        Ok(id)
    }

    fn insert(&mut self, mut shape: Shape, parent: Option<ShapeId>)
        -> ShapeId {
        shape.parent = parent;
        shape.children.clear();

        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    /// Looks up a shape of this world.
    ///
    /// # Panics
    ///
    /// If `id` was not handed out by this world; see `get` for a checked
    /// lookup.
    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.0]
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.0]
    }

    pub fn get(&self, id: ShapeId) -> Result<&Shape, WorldError> {
        self.shapes.get(id.0).ok_or(WorldError::UnknownShape(id))
    }

    /// The top-level objects, in insertion order.
    pub fn objects(&self) -> &[ShapeId] {
        &self.objects
    }

    /// Total number of shapes, including groups and their descendants.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Converts a world-space point into the object space of shape `id`.
    ///
    /// Each enclosing group's transform is undone first, outermost group
    /// first, followed by the shape's own.
    pub fn world_to_object(&self, id: ShapeId, point: &Point3<f64>)
        -> Point3<f64> {
        let shape = self.shape(id);
        let point = match shape.parent() {
            Some(parent) => self.world_to_object(parent, point),
            None => *point,
        };

        shape.transform().to_local(&point)
    }

    /// Converts an object-space normal of shape `id` into world space.
    ///
    /// `None` if the normal is degenerate (zero length) at any step.
    pub fn normal_to_world(&self, id: ShapeId, normal: &Vector3<f64>)
        -> Option<Vector3<f64>> {
        let shape = self.shape(id);
        let normal = shape.transform().normal_to_outer(normal)?;

        match shape.parent() {
            Some(parent) => self.normal_to_world(parent, &normal),
            None => Some(normal),
        }
    }

    /// Computes the world-space unit normal of shape `id` at a world point.
    pub fn normal_at(&self, id: ShapeId, world_point: &Point3<f64>)
        -> Option<Vector3<f64>> {
        let local_point = self.world_to_object(id, world_point);
        let local_normal = self.shape(id).local_normal_at(&local_point);

        self.normal_to_world(id, &local_normal)
    }

    /// Intersects a ray with one shape (and, for groups, its descendants).
    ///
    /// The result is not sorted.
    pub fn intersect_object(&self, id: ShapeId, r: &Ray)
        -> Result<Intersections, TraceError> {
        let mut xs = Intersections::with_capacity(2);
        if check_ray(r)? {
            self.collect(id, r, &mut xs);
        }

        Ok(xs)
    }

    /// Intersects a ray against all objects in a world.
    ///
    /// The intersections are sorted by ascending `t`, including those behind
    /// the ray origin.
    pub fn intersect(&self, r: &Ray) -> Result<Intersections, TraceError> {
        let mut xs = Intersections::with_capacity(2 * self.objects.len());
        if check_ray(r)? {
            for &id in self.objects.iter() {
                self.collect(id, r, &mut xs);
            }
        }

        xs.sort();
        Ok(xs)
    }

    /// Brings `r` into the space of shape `id` and gathers its hits.
    fn collect(&self, id: ShapeId, r: &Ray, xs: &mut Intersections) {
        let shape = self.shape(id);
        let local_ray = r.transform(shape.transform().inverse());

        match shape.kind() {
            ShapeKind::Group => {
                for &child in shape.children() {
                    self.collect(child, &local_ray, xs);
                }
            },
            _ => {
                let hits = shape.local_intersect(&local_ray).into_iter()
                    // t = 0 means the ray starts on the surface; that is
                    // never a hit.
                    .filter(|&t| t.is_finite() && t != 0.0)
                    .map(|t| Intersection::new(t, id));

                xs.intersections.extend(hits);
            },
        }
    }

    /// Determines whether a point is shadowed from the light.
    ///
    /// A point is shadowed if something lies between it and the light. If the
    /// shadow ray cannot be traced the point is treated as lit.
    pub fn is_shadowed(&self, p: &Point3<f64>) -> bool {
        let v = self.light.position - *p;
        let distance = v.magnitude();
        let r = Ray::new(*p, v.normalize());

        match self.intersect(&r) {
            Ok(xs) => xs.hit().map_or(false, |i| i.t < distance),
            Err(err) => {
                trace!("treating {:?} as lit: {}", p, err);
                false
            },
        }
    }

    /// Calculates the color for a hit from direct light, reflection and
    /// refraction.
    ///
    /// Surfaces that both reflect and refract blend the two by the Schlick
    /// reflectance instead of adding them.
    pub fn shade_hit(&self, comps: &Computations, remaining: usize) -> Color {
        let material = &self.shape(comps.object).material;
        let shadowed = self.is_shadowed(&comps.over_point);

        let surface = lighting(material, self, comps.object, &self.light,
            &comps.over_point, &comps.eyev, &comps.normalv, shadowed);

        let reflected = self.reflected_color(comps, remaining);
        let refracted = self.refracted_color(comps, remaining);

        if material.reflective > 0.0 && material.transparency > 0.0 {
            let reflectance = comps.schlick();
            surface + reflected * reflectance + refracted * (1.0 - reflectance)
        } else {
            surface + reflected + refracted
        }
    }

    /// Determines the color seen along a ray.
    ///
    /// `remaining` bounds how many more times reflected and refracted rays may
    /// recurse. Rays that miss everything, or that cannot be traced, are
    /// black.
    pub fn color_at(&self, r: &Ray, remaining: usize) -> Color {
        self.trace(r, remaining).unwrap_or_else(|err| {
            trace!("dropping ray {:?}: {}", r, err);
            Color::black()
        })
    }

    fn trace(&self, r: &Ray, remaining: usize) -> Result<Color, TraceError> {
        let xs = self.intersect(r)?;

        match xs.hit() {
            None => Ok(Color::black()),
            Some(hit) => {
                let comps = Computations::prepare(self, &hit, r, Some(&xs))?;
                Ok(self.shade_hit(&comps, remaining))
            },
        }
    }

    /// The color contributed by the reflected ray at a hit.
    pub fn reflected_color(&self, comps: &Computations, remaining: usize)
        -> Color {
        let reflective = self.shape(comps.object).material.reflective;
        if remaining < 1 || reflective <= 0.0 {
            return Color::black();
        }

        let reflect_ray = Ray::new(comps.over_point, comps.reflectv);
        self.color_at(&reflect_ray, remaining - 1) * reflective
    }

    /// The color contributed by the refracted ray at a hit.
    ///
    /// Black under total internal reflection; that light is accounted for by
    /// the reflected ray instead.
    pub fn refracted_color(&self, comps: &Computations, remaining: usize)
        -> Color {
        let transparency = self.shape(comps.object).material.transparency;
        if remaining < 1 || transparency <= 0.0 {
            return Color::black();
        }

        // Snell's law: sin(theta_t) = (n1 / n2) * sin(theta_i).
        let n_ratio = comps.n1 / comps.n2;
        let cos_i = comps.eyev.dot(&comps.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));
        if sin2_t > 1.0 {
            return Color::black();
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        let direction = comps.normalv * (n_ratio * cos_i - cos_t)
            - comps.eyev * n_ratio;

        let refract_ray = Ray::new(comps.under_point, direction);
        self.color_at(&refract_ray, remaining - 1) * transparency
    }
}

/// Rejects non-finite rays. `Ok(false)` for a zero-length direction, which
/// cannot hit anything.
fn check_ray(r: &Ray) -> Result<bool, TraceError> {
    if !r.is_finite() {
        return Err(TraceError::DegenerateRay);
    }

    Ok(r.direction.magnitude() > f64::EPSILON)
}

/// The two-sphere world most tests start from.
#[cfg(test)]
pub(crate) fn default_world() -> World {
    use crate::transform::scaling;

    let mut w = World::new(WorldConfig::default());

    let m1 = Material {
        color: Color::rgb(0.8, 1.0, 0.6),
        diffuse: 0.7,
        specular: 0.2,
        ..Default::default()
    };
    w.add(Shape::sphere().with_material(m1));
    w.add(Shape::sphere().with_transform(scaling(0.5, 0.5, 0.5)).unwrap());

    w
}

#[cfg(test)]
fn assert_near(actual: Color, expected: Color) {
    use approx::assert_abs_diff_eq;

    assert_abs_diff_eq!(actual.r, expected.r, epsilon = 1e-3);
    assert_abs_diff_eq!(actual.g, expected.g, epsilon = 1e-3);
    assert_abs_diff_eq!(actual.b, expected.b, epsilon = 1e-3);
}

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray {
    Ray::new(
        Point3::new(origin.0, origin.1, origin.2),
        Vector3::new(direction.0, direction.1, direction.2),
    )
}

#[test]
fn intersect_default_world_with_ray() {
    let w = default_world();
    let xs = w.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))).unwrap();

    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();
    assert_eq!(ts.len(), 4);
    for (t, expected) in ts.iter().zip(&[4.0, 4.5, 5.5, 6.0]) {
        assert!(crate::feq(*t, *expected));
    }
}

#[test]
fn zero_length_ray_hits_nothing() {
    let w = default_world();
    let xs = w.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 0.0))).unwrap();

    assert!(xs.is_empty());
}

#[test]
fn non_finite_ray_is_an_error() {
    let w = default_world();

    assert_eq!(w.intersect(&ray((0.0, f64::NAN, -5.0), (0.0, 0.0, 1.0))),
        Err(TraceError::DegenerateRay));
}

#[test]
fn intersect_scaled_and_translated_spheres() {
    use crate::transform::{ scaling, translation };

    let mut w = World::new(WorldConfig::default());
    let scaled = w.add(Shape::sphere()
        .with_transform(scaling(2.0, 2.0, 2.0)).unwrap());
    let moved = w.add(Shape::sphere()
        .with_transform(translation(5.0, 0.0, 0.0)).unwrap());

    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let xs = w.intersect_object(scaled, &r).unwrap();
    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();

    assert_eq!(ts.len(), 2);
    assert!(crate::feq(ts[0], 3.0) && crate::feq(ts[1], 7.0));
    assert!(w.intersect_object(moved, &r).unwrap().is_empty());
}

#[test]
fn normal_on_transformed_sphere() {
    use approx::assert_abs_diff_eq;
    use crate::transform::{ scaling, rotation_z };

    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere().with_transform(
        scaling(1.0, 0.5, 1.0) * rotation_z(std::f64::consts::PI / 5.0)
    ).unwrap());

    let k = 2.0f64.sqrt() / 2.0;
    let n = w.normal_at(s, &Point3::new(0.0, k, -k)).unwrap();

    assert_abs_diff_eq!(n, Vector3::new(0.0, 0.97014, -0.24254),
        epsilon = 1e-4);
}

#[test]
fn shade_intersection_from_outside() {
    let w = default_world();
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, w.objects()[0]);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_eq!(w.shade_hit(&comps, 4), Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_intersection_from_inside() {
    let mut w = default_world();
    w.light = PointLight::new(Color::white(), Point3::new(0.0, 0.25, 0.0));

    let r = ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0));
    let i = Intersection::new(0.5, w.objects()[1]);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_eq!(w.shade_hit(&comps, 4), Color::rgb(0.90498, 0.90498, 0.90498));
}

#[test]
fn shade_intersection_in_shadow() {
    use crate::transform::translation;

    let mut w = World::new(WorldConfig {
        light: PointLight::new(Color::white(), Point3::new(0.0, 0.0, -10.0)),
        ..Default::default()
    });
    w.add(Shape::sphere());
    let s2 = w.add(Shape::sphere()
        .with_transform(translation(0.0, 0.0, 10.0)).unwrap());

    let r = ray((0.0, 0.0, 5.0), (0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, s2);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_eq!(w.shade_hit(&comps, 4), Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn color_ray_miss() {
    let w = default_world();

    assert_eq!(w.color_at(&ray((0.0, 0.0, -5.0), (0.0, 1.0, 0.0)), 4),
        Color::black());
}

#[test]
fn color_ray_hit() {
    let w = default_world();

    assert_eq!(w.color_at(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)), 4),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn color_behind_ray() {
    let mut w = default_world();
    let outer = w.objects()[0];
    let inner = w.objects()[1];
    w.shape_mut(outer).material.ambient = 1.0;
    w.shape_mut(inner).material.ambient = 1.0;

    let r = ray((0.0, 0.0, 0.75), (0.0, 0.0, -1.0));
    assert_eq!(w.color_at(&r, 4), w.shape(inner).material.color);
}

#[test]
fn degenerate_ray_renders_black() {
    let w = default_world();
    let r = ray((0.0, 0.0, -5.0), (f64::INFINITY, 0.0, 1.0));

    assert_eq!(w.color_at(&r, 4), Color::black());
}

#[test]
fn shadow_collinear_point_and_light() {
    let w = default_world();

    assert!(!w.is_shadowed(&Point3::new(0.0, 10.0, 0.0)));
}

#[test]
fn shadow_object_between_point_and_light() {
    let w = default_world();

    assert!(w.is_shadowed(&Point3::new(10.0, -10.0, 10.0)));
}

#[test]
fn shadow_object_behind_light() {
    let w = default_world();

    assert!(!w.is_shadowed(&Point3::new(-20.0, 20.0, -20.0)));
}

#[test]
fn shadow_object_behind_point() {
    let w = default_world();

    assert!(!w.is_shadowed(&Point3::new(-2.0, 2.0, -2.0)));
}

#[test]
fn point_at_light_is_lit() {
    let w = default_world();

    assert!(!w.is_shadowed(&w.light.position));
}

#[test]
fn reflected_color_for_nonreflective_material() {
    let mut w = default_world();
    let inner = w.objects()[1];
    w.shape_mut(inner).material.ambient = 1.0;

    let r = ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, inner);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_eq!(w.reflected_color(&comps, 4), Color::black());
}

#[cfg(test)]
fn world_with_reflective_floor() -> (World, ShapeId) {
    use crate::transform::translation;

    let mut w = default_world();
    let floor = w.add(Shape::plane()
        .with_transform(translation(0.0, -1.0, 0.0)).unwrap()
        .with_material(Material { reflective: 0.5, ..Default::default() }));

    (w, floor)
}

#[test]
fn reflected_color_for_reflective_material() {
    let (w, floor) = world_with_reflective_floor();
    let k = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, -3.0), (0.0, -k, k));
    let i = Intersection::new(2.0f64.sqrt(), floor);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_near(w.reflected_color(&comps, 4),
        Color::rgb(0.19032, 0.2379, 0.14274));
}

#[test]
fn shade_hit_with_reflective_material() {
    let (w, floor) = world_with_reflective_floor();
    let k = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, -3.0), (0.0, -k, k));
    let i = Intersection::new(2.0f64.sqrt(), floor);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_near(w.shade_hit(&comps, 4), Color::rgb(0.87677, 0.92436, 0.82918));
}

#[test]
fn reflected_color_at_maximum_recursive_depth() {
    let (mut w, floor) = world_with_reflective_floor();
    w.shape_mut(floor).material.reflective = 1.0;

    let k = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, -3.0), (0.0, -k, k));
    let i = Intersection::new(2.0f64.sqrt(), floor);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();
    assert_eq!(w.reflected_color(&comps, 0), Color::black());
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    use crate::consts::DEFAULT_RECURSION_DEPTH;
    use crate::transform::translation;

    let mut w = World::new(WorldConfig {
        light: PointLight::new(Color::white(), Point3::new(0.0, 0.0, 0.0)),
        ..Default::default()
    });
    let mirror = Material { reflective: 1.0, ..Default::default() };
    w.add(Shape::plane()
        .with_transform(translation(0.0, -1.0, 0.0)).unwrap()
        .with_material(mirror));
    w.add(Shape::plane()
        .with_transform(translation(0.0, 1.0, 0.0)).unwrap()
        .with_material(mirror));

    let c = w.color_at(&ray((0.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
        DEFAULT_RECURSION_DEPTH);
    assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
    assert!(c.r > 0.0);
}

#[test]
fn refracted_color_with_opaque_surface() {
    let w = default_world();
    let s = w.objects()[0];
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![
        Intersection::new(4.0, s),
        Intersection::new(6.0, s),
    ]);

    let comps = Computations::prepare(&w, &xs[0], &r, Some(&xs)).unwrap();
    assert_eq!(w.refracted_color(&comps, 5), Color::black());
}

#[test]
fn refracted_color_at_maximum_recursive_depth() {
    let mut w = default_world();
    let s = w.objects()[0];
    w.shape_mut(s).material.transparency = 1.0;
    w.shape_mut(s).material.refractive_index = 1.5;

    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![
        Intersection::new(4.0, s),
        Intersection::new(6.0, s),
    ]);

    let comps = Computations::prepare(&w, &xs[0], &r, Some(&xs)).unwrap();
    assert_eq!(w.refracted_color(&comps, 0), Color::black());
}

#[test]
fn refracted_color_under_total_internal_reflection() {
    let mut w = default_world();
    let s = w.objects()[0];
    w.shape_mut(s).material.transparency = 1.0;
    w.shape_mut(s).material.refractive_index = 1.5;

    let k = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, k), (0.0, 1.0, 0.0));
    let xs = Intersections::from(vec![
        Intersection::new(-k, s),
        Intersection::new(k, s),
    ]);

    // Inside the sphere, so look at the second intersection.
    let comps = Computations::prepare(&w, &xs[1], &r, Some(&xs)).unwrap();
    assert_eq!(w.refracted_color(&comps, 5), Color::black());
}

#[cfg(test)]
fn world_with_glass_floor(floor_material: Material) -> (World, ShapeId) {
    use crate::transform::translation;

    let mut w = default_world();
    let floor = w.add(Shape::plane()
        .with_transform(translation(0.0, -1.0, 0.0)).unwrap()
        .with_material(floor_material));

    let ball = Material {
        color: Color::rgb(1.0, 0.0, 0.0),
        ambient: 0.5,
        ..Default::default()
    };
    w.add(Shape::sphere()
        .with_transform(translation(0.0, -3.5, -0.5)).unwrap()
        .with_material(ball));

    (w, floor)
}

#[test]
fn shade_hit_with_transparent_material() {
    let (w, floor) = world_with_glass_floor(Material {
        transparency: 0.5,
        refractive_index: 1.5,
        ..Default::default()
    });

    let k = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, -3.0), (0.0, -k, k));
    let xs = Intersections::from(vec![
        Intersection::new(2.0f64.sqrt(), floor),
    ]);

    let comps = Computations::prepare(&w, &xs[0], &r, Some(&xs)).unwrap();
    assert_near(w.shade_hit(&comps, 5), Color::rgb(0.93642, 0.68642, 0.68642));
}

#[test]
fn shade_hit_blends_reflection_and_refraction_by_schlick() {
    let (w, floor) = world_with_glass_floor(Material {
        reflective: 0.5,
        transparency: 0.5,
        refractive_index: 1.5,
        ..Default::default()
    });

    let k = 2.0f64.sqrt() / 2.0;
    let r = ray((0.0, 0.0, -3.0), (0.0, -k, k));
    let xs = Intersections::from(vec![
        Intersection::new(2.0f64.sqrt(), floor),
    ]);

    let comps = Computations::prepare(&w, &xs[0], &r, Some(&xs)).unwrap();
    assert_near(w.shade_hit(&comps, 5), Color::rgb(0.93391, 0.69643, 0.69243));
}

#[test]
fn add_child_to_non_group_fails() {
    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere());

    assert_eq!(w.add_child(s, Shape::cube()), Err(WorldError::NotAGroup(s)));
}

#[test]
fn adding_child_records_parent() {
    let mut w = World::new(WorldConfig::default());
    let g = w.add(Shape::group());
    let s = w.add_child(g, Shape::sphere()).unwrap();

    assert_eq!(w.shape(g).children(), &[s]);
    assert_eq!(w.shape(s).parent(), Some(g));
    assert_eq!(w.objects(), &[g]);
}

#[test]
fn intersecting_ray_with_empty_group() {
    let mut w = World::new(WorldConfig::default());
    let g = w.add(Shape::group());

    let r = ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0));
    assert!(w.intersect_object(g, &r).unwrap().is_empty());
}

#[test]
fn intersecting_ray_with_nonempty_group() {
    use crate::transform::translation;

    let mut w = World::new(WorldConfig::default());
    let g = w.add(Shape::group());
    let s1 = w.add_child(g, Shape::sphere()).unwrap();
    let s2 = w.add_child(g, Shape::sphere()
        .with_transform(translation(0.0, 0.0, -3.0)).unwrap()).unwrap();
    w.add_child(g, Shape::sphere()
        .with_transform(translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let xs = w.intersect(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))).unwrap();
    let hit: Vec<ShapeId> = xs.iter().map(|i| i.object).collect();

    assert_eq!(hit, vec![s2, s2, s1, s1]);
}

#[test]
fn intersecting_transformed_group() {
    use crate::transform::{ scaling, translation };

    let mut w = World::new(WorldConfig::default());
    let g = w.add(Shape::group()
        .with_transform(scaling(2.0, 2.0, 2.0)).unwrap());
    w.add_child(g, Shape::sphere()
        .with_transform(translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let xs = w.intersect(&ray((10.0, 0.0, -10.0), (0.0, 0.0, 1.0))).unwrap();
    assert_eq!(xs.len(), 2);
}

#[cfg(test)]
fn nested_groups() -> (World, ShapeId) {
    use crate::transform::{ rotation_y, scaling, translation };

    let mut w = World::new(WorldConfig::default());
    let g1 = w.add(Shape::group()
        .with_transform(rotation_y(std::f64::consts::FRAC_PI_2)).unwrap());
    let g2 = w.add_child(g1, Shape::group()
        .with_transform(scaling(1.0, 2.0, 3.0)).unwrap()).unwrap();
    let s = w.add_child(g2, Shape::sphere()
        .with_transform(translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    (w, s)
}

#[test]
fn converting_point_from_world_to_object_space() {
    use approx::assert_abs_diff_eq;
    use crate::transform::{ rotation_y, scaling, translation };

    let mut w = World::new(WorldConfig::default());
    let g1 = w.add(Shape::group()
        .with_transform(rotation_y(std::f64::consts::FRAC_PI_2)).unwrap());
    let g2 = w.add_child(g1, Shape::group()
        .with_transform(scaling(2.0, 2.0, 2.0)).unwrap()).unwrap();
    let s = w.add_child(g2, Shape::sphere()
        .with_transform(translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let p = w.world_to_object(s, &Point3::new(-2.0, 0.0, -10.0));
    assert_abs_diff_eq!(p, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-9);
}

#[test]
fn converting_normal_from_object_to_world_space() {
    use approx::assert_abs_diff_eq;

    let (w, s) = nested_groups();
    let k = 3.0f64.sqrt() / 3.0;
    let n = w.normal_to_world(s, &Vector3::new(k, k, k)).unwrap();

    assert_abs_diff_eq!(n, Vector3::new(0.2857, 0.4286, -0.8571),
        epsilon = 1e-4);
}

#[test]
fn finding_normal_on_child_object() {
    use approx::assert_abs_diff_eq;

    let (w, s) = nested_groups();
    let n = w.normal_at(s, &Point3::new(1.7321, 1.1547, -5.5774)).unwrap();

    assert_abs_diff_eq!(n, Vector3::new(0.2857, 0.4286, -0.8571),
        epsilon = 1e-4);
}

#[test]
fn add_child_with_foreign_id_fails() {
    let mut other = World::new(WorldConfig::default());
    other.add(Shape::sphere());
    let foreign = other.add(Shape::group());

    let mut w = World::new(WorldConfig::default());

    assert_eq!(w.add_child(foreign, Shape::cube()),
        Err(WorldError::UnknownShape(foreign)));
    assert_eq!(w.get(foreign), Err(WorldError::UnknownShape(foreign)));
    assert!(w.is_empty());
}

#[test]
fn ray_starting_on_surface_does_not_hit_it_there() {
    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere());

    let r = ray((0.0, 0.0, -1.0), (0.0, 0.0, 1.0));
    let xs = w.intersect_object(s, &r).unwrap();
    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();

    assert_eq!(ts.len(), 1);
    assert!(crate::feq(ts[0], 2.0));
    assert!(crate::feq(xs.hit().unwrap().t, 2.0));
}

#[test]
fn plane_crossing_is_entered_and_left() {
    let mut w = World::new(WorldConfig::default());
    let p = w.add(Shape::plane());

    let xs = w.intersect(&ray((0.0, 1.0, 0.0), (0.0, -1.0, 0.0))).unwrap();
    let hit: Vec<ShapeId> = xs.iter().map(|i| i.object).collect();

    assert_eq!(hit, vec![p, p]);
}

#[test]
fn transparent_plane_does_not_contain_objects_behind_it() {
    use crate::transform::translation;

    let mut w = World::new(WorldConfig::default());
    w.add(Shape::plane().with_material(Material {
        transparency: 1.0,
        refractive_index: 1.33,
        ..Default::default()
    }));
    let ball = w.add(Shape::sphere()
        .with_transform(translation(0.0, -3.0, 0.0)).unwrap()
        .with_material(Material::glass()));

    let r = ray((0.0, 5.0, 0.0), (0.0, -1.0, 0.0));
    let xs = w.intersect(&r).unwrap();
    let entry = xs.iter().copied().find(|i| i.object == ball).unwrap();
    assert!(crate::feq(entry.t, 7.0));

    let comps = Computations::prepare(&w, &entry, &r, Some(&xs)).unwrap();
    assert!(crate::feq(comps.n1, 1.0));
    assert!(crate::feq(comps.n2, 1.5));
}
