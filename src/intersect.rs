use std::cmp::Ordering;

use nalgebra::{ Point3, Vector3 };
use thiserror::Error;

use crate::consts::{ FEQ_EPSILON, VACUUM_RI };
use crate::ray::Ray;
use crate::light::reflect;
use crate::shape::ShapeId;
use crate::world::World;

/// Failures while tracing a single ray.
///
/// These never escape a render: `World::color_at` turns them into black and
/// `World::is_shadowed` into "not shadowed".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    #[error("ray has a non-finite origin or direction")]
    DegenerateRay,

    #[error("surface normal of shape {0:?} is undefined at the hit point")]
    DegenerateNormal(ShapeId),
}

/// An intersection.
///
/// Parameter `t` is the signed offset along the ray; negative offsets lie
/// behind the ray origin. `object` is the (leaf) shape that was hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Intersection {
    pub t: f64,
    pub object: ShapeId,
}

impl Intersection {
    pub fn new(t: f64, object: ShapeId) -> Intersection {
        Intersection { t, object }
    }
}

/// Orders offsets so that any non-negative `t` sorts before any negative one.
///
/// Taking the minimum under this ordering finds the nearest visible hit; hits
/// behind the ray origin only win if nothing is in front.
pub fn visible_order(a: f64, b: f64) -> Ordering {
    match (a < 0.0, b < 0.0) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// A collection of intersections.
///
/// Mostly a wrapper for a vector of `Intersection` objects. Lists produced by
/// `World::intersect` are sorted by ascending `t`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Intersections {
    pub intersections: Vec<Intersection>,
}

impl Intersections {
    pub fn new() -> Intersections {
        Intersections { intersections: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Intersections {
        Intersections { intersections: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intersection> {
        self.intersections.iter()
    }

    /// Finds the visible hit: the intersection with the smallest `t >= 0`.
    ///
    /// Returns `None` if the list is empty or every intersection lies behind
    /// the ray origin. The list does not need to be sorted.
    pub fn hit(&self) -> Option<Intersection> {
        self.intersections.iter()
            .copied()
            .min_by(|a, b| visible_order(a.t, b.t))
            .filter(|i| i.t >= 0.0)
    }

    /// Sorts the intersections by ascending `t`. The sort is stable.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal)
        );
    }
}

impl From<Vec<Intersection>> for Intersections {
    fn from(intersections: Vec<Intersection>) -> Intersections {
        Intersections { intersections }
    }
}

impl std::ops::Index<usize> for Intersections {
    type Output = Intersection;

    fn index(&self, index: usize) -> &Intersection {
        &self.intersections[index]
    }
}

/// Shading state for the chosen hit.
///
/// Everything `World::shade_hit` needs about a hit, computed once. Never kept
/// past the shading call that produced it.
#[derive(Clone, Debug)]
pub struct Computations {
    /// The "time" of the ray intersection.
    pub t: f64,

    /// The object being intersected.
    pub object: ShapeId,

    /// The point where the intersection occurs.
    pub point: Point3<f64>,

    /// A point slightly above the intersected surface. Shadow and reflection
    /// rays start here so a surface does not shadow itself ("acne").
    pub over_point: Point3<f64>,

    /// A point slightly below the intersected surface, where refracted rays
    /// start.
    pub under_point: Point3<f64>,

    /// The eye vector for the intersection.
    pub eyev: Vector3<f64>,

    /// The world-space normal, flipped to face the eye if needed.
    pub normalv: Vector3<f64>,

    /// The incoming ray direction, reflected across the normal.
    pub reflectv: Vector3<f64>,

    /// Whether the hit occurs from inside the object.
    pub inside: bool,

    /// The refractive index of the material being exited.
    pub n1: f64,

    /// The refractive index of the material being entered.
    pub n2: f64,
}

impl Computations {
    /// Prepares the shading state for `hit`, an intersection of `ray`.
    ///
    /// If `xs` (the full sorted intersection list containing `hit`) is given,
    /// the refractive indices on each side of the surface are computed;
    /// otherwise both are 1.0.
    pub fn prepare(world: &World, hit: &Intersection, ray: &Ray,
        xs: Option<&Intersections>) -> Result<Computations, TraceError> {
        let t = hit.t;
        let object = hit.object;
        let point = ray.position(t);
        let eyev = -ray.direction;

        let mut normalv = world.normal_at(object, &point)
            .ok_or(TraceError::DegenerateNormal(object))?;

        let inside = normalv.dot(&eyev) < 0.0;
        if inside {
            normalv = -normalv;
        }

        let over_point = point + normalv * FEQ_EPSILON;
        let under_point = point - normalv * FEQ_EPSILON;
        let reflectv = reflect(&ray.direction, &normalv);

        let (n1, n2) = match xs {
            Some(xs) => refractive_indices(world, hit, xs),
            None => (VACUUM_RI, VACUUM_RI),
        };

        Ok(Computations {
            t, object,
            point, over_point, under_point,
            eyev, normalv, reflectv,
            inside,
            n1, n2,
        })
    }

    /// Approximates the Fresnel reflectance with Schlick's formula.
    ///
    /// The result is the fraction of light reflected at this hit, between 0
    /// and 1. Total internal reflection gives exactly 1.
    pub fn schlick(&self) -> f64 {
        let mut cos = self.eyev.dot(&self.normalv);

        // Total internal reflection can only occur if n1 > n2.
        if self.n1 > self.n2 {
            let n = self.n1 / self.n2;
            let sin2_t = n.powi(2) * (1.0 - cos.powi(2));
            if sin2_t > 1.0 {
                return 1.0;
            }

            cos = (1.0 - sin2_t).sqrt();
        }

        let r0 = ((self.n1 - self.n2) / (self.n1 + self.n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).powi(5)
    }
}

/// Replays `xs` up to `hit` to find the media on either side of it.
///
/// `containers` holds the objects the ray is currently inside, innermost
/// last. Meeting an object already in it means leaving that object.
fn refractive_indices(world: &World, hit: &Intersection, xs: &Intersections)
    -> (f64, f64) {
    let index_of = |containers: &[ShapeId]| {
        containers.last()
            .map_or(VACUUM_RI, |&id| world.shape(id).material.refractive_index)
    };

    let mut containers: Vec<ShapeId> = Vec::new();
    for i in xs.iter() {
        let is_hit = i == hit;
        let n1 = index_of(&containers);

        match containers.iter().position(|&c| c == i.object) {
            Some(j) => { containers.remove(j); },
            None => containers.push(i.object),
        }

        if is_hit {
            return (n1, index_of(&containers));
        }
    }

    (VACUUM_RI, VACUUM_RI)
}

#[cfg(test)]
fn ids(n: usize) -> Vec<ShapeId> {
    (0..n).map(ShapeId).collect()
}

#[test]
fn hit_with_all_positive() {
    let s = ids(1)[0];
    let xs = Intersections::from(vec![
        Intersection::new(1.0, s),
        Intersection::new(2.0, s),
    ]);

    assert_eq!(xs.hit(), Some(Intersection::new(1.0, s)));
}

#[test]
fn hit_with_some_negative() {
    let s = ids(1)[0];
    let xs = Intersections::from(vec![
        Intersection::new(-1.0, s),
        Intersection::new(1.0, s),
    ]);

    assert_eq!(xs.hit(), Some(Intersection::new(1.0, s)));
}

#[test]
fn hit_with_all_negative() {
    let s = ids(1)[0];
    let xs = Intersections::from(vec![
        Intersection::new(-2.0, s),
        Intersection::new(-1.0, s),
    ]);

    assert_eq!(xs.hit(), None);
}

#[test]
fn hit_of_empty_list() {
    assert_eq!(Intersections::new().hit(), None);
}

#[test]
fn hit_is_lowest_nonnegative_in_any_order() {
    let s = ids(1)[0];
    let xs = Intersections::from(vec![
        Intersection::new(5.0, s),
        Intersection::new(7.0, s),
        Intersection::new(-3.0, s),
        Intersection::new(2.0, s),
    ]);

    assert_eq!(xs.hit(), Some(Intersection::new(2.0, s)));

    let mut reversed = xs.clone();
    reversed.intersections.reverse();
    assert_eq!(reversed.hit(), Some(Intersection::new(2.0, s)));
}

#[test]
fn visible_order_puts_negatives_last() {
    assert_eq!(visible_order(-1.0, 100.0), Ordering::Greater);
    assert_eq!(visible_order(100.0, -1.0), Ordering::Less);
    assert_eq!(visible_order(1.0, 2.0), Ordering::Less);
    assert_eq!(visible_order(-1.0, -2.0), Ordering::Greater);
}

#[test]
fn sort_is_ascending() {
    let s = ids(1)[0];
    let mut xs = Intersections::from(vec![
        Intersection::new(3.0, s),
        Intersection::new(-1.0, s),
        Intersection::new(0.5, s),
    ]);
    xs.sort();

    let ts: Vec<f64> = xs.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![-1.0, 0.5, 3.0]);
}

#[cfg(test)]
fn single_sphere(transform: nalgebra::Matrix4<f64>) -> (World, ShapeId) {
    use crate::shape::Shape;
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere().with_transform(transform).unwrap());
    (w, s)
}

#[test]
fn precompute_intersection_state() {
    let (w, s) = single_sphere(nalgebra::Matrix4::identity());
    let r = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, s);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();

    assert_eq!(comps.t, i.t);
    assert_eq!(comps.object, s);
    assert_eq!(comps.point, Point3::new(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Vector3::new(0.0, 0.0, -1.0));
    assert!(!comps.inside);
}

#[test]
fn precompute_inside_intersection() {
    let (w, s) = single_sphere(nalgebra::Matrix4::identity());
    let r = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, s);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();

    assert_eq!(comps.point, Point3::new(0.0, 0.0, 1.0));
    assert_eq!(comps.eyev, Vector3::new(0.0, 0.0, -1.0));
    assert!(comps.inside);
    // The normal is inverted to face the eye.
    assert_eq!(comps.normalv, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn hit_should_offset_point() {
    use crate::transform::translation;

    let (w, s) = single_sphere(translation(0.0, 0.0, 1.0));
    let r = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let i = Intersection::new(5.0, s);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();

    assert!(comps.over_point.z < -FEQ_EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
}

#[test]
fn under_point_is_below_surface() {
    use crate::transform::translation;

    let (w, s) = single_sphere(translation(0.0, 0.0, 1.0));
    let r = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let i = Intersection::new(5.0, s);
    let xs = Intersections::from(vec![i]);

    let comps = Computations::prepare(&w, &i, &r, Some(&xs)).unwrap();

    assert!(comps.under_point.z > FEQ_EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn precompute_reflection_vector() {
    use crate::shape::Shape;
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let p = w.add(Shape::plane());

    let k = 2.0f64.sqrt() / 2.0;
    let r = Ray::new(Point3::new(0.0, 1.0, -1.0), Vector3::new(0.0, -k, k));
    let i = Intersection::new(2.0f64.sqrt(), p);

    let comps = Computations::prepare(&w, &i, &r, None).unwrap();

    assert!((comps.reflectv - Vector3::new(0.0, k, k)).magnitude() < 1e-9);
}

#[test]
fn n1_and_n2_at_various_intersections() {
    use crate::light::Material;
    use crate::shape::Shape;
    use crate::transform::{ scaling, translation };
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let glass = |ri: f64| Material { refractive_index: ri, ..Material::glass() };

    let a = w.add(Shape::sphere()
        .with_transform(scaling(2.0, 2.0, 2.0)).unwrap()
        .with_material(glass(1.5)));
    let b = w.add(Shape::sphere()
        .with_transform(translation(0.0, 0.0, -0.25)).unwrap()
        .with_material(glass(2.0)));
    let c = w.add(Shape::sphere()
        .with_transform(translation(0.0, 0.0, 0.25)).unwrap()
        .with_material(glass(2.5)));

    let r = Ray::new(Point3::new(0.0, 0.0, -4.0), Vector3::new(0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![
        Intersection::new(2.0, a),
        Intersection::new(2.75, b),
        Intersection::new(3.25, c),
        Intersection::new(4.75, b),
        Intersection::new(5.25, c),
        Intersection::new(6.0, a),
    ]);

    let expected = [
        (1.0, 1.5), (1.5, 2.0), (2.0, 2.5), (2.5, 2.5), (2.5, 1.5), (1.5, 1.0),
    ];

    for (index, &(n1, n2)) in expected.iter().enumerate() {
        let comps = Computations::prepare(&w, &xs[index], &r, Some(&xs))
            .unwrap();
        assert_eq!((comps.n1, comps.n2), (n1, n2), "at index {}", index);
    }
}

#[test]
fn schlick_under_total_internal_reflection() {
    let (mut w, s) = single_sphere(nalgebra::Matrix4::identity());
    w.shape_mut(s).material = crate::light::Material::glass();

    let k = 2.0f64.sqrt() / 2.0;
    let r = Ray::new(Point3::new(0.0, 0.0, k), Vector3::new(0.0, 1.0, 0.0));
    let xs = Intersections::from(vec![
        Intersection::new(-k, s),
        Intersection::new(k, s),
    ]);

    let comps = Computations::prepare(&w, &xs[1], &r, Some(&xs)).unwrap();
    assert_eq!(comps.schlick(), 1.0);
}

#[test]
fn schlick_with_perpendicular_ray() {
    let (mut w, s) = single_sphere(nalgebra::Matrix4::identity());
    w.shape_mut(s).material = crate::light::Material::glass();

    let r = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
    let xs = Intersections::from(vec![
        Intersection::new(-1.0, s),
        Intersection::new(1.0, s),
    ]);

    let comps = Computations::prepare(&w, &xs[1], &r, Some(&xs)).unwrap();

    // At normal incidence reflectance is ((n1 - n2) / (n1 + n2))^2.
    let expected = ((comps.n1 - comps.n2) / (comps.n1 + comps.n2)).powi(2);
    assert!(crate::feq(comps.schlick(), expected));
    assert!(crate::feq(comps.schlick(), 0.04));
}

#[test]
fn schlick_with_small_angle_and_n2_greater() {
    let (mut w, s) = single_sphere(nalgebra::Matrix4::identity());
    w.shape_mut(s).material = crate::light::Material::glass();

    let r = Ray::new(Point3::new(0.0, 0.99, -2.0), Vector3::new(0.0, 0.0, 1.0));
    let xs = Intersections::from(vec![Intersection::new(1.8589, s)]);

    let comps = Computations::prepare(&w, &xs[0], &r, Some(&xs)).unwrap();
    assert!(crate::feq(comps.schlick(), 0.48873));
}

#[test]
fn cone_apex_normal_is_degenerate() {
    use crate::shape::Shape;
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let cone = w.add(Shape::cone());
    let r = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
    let i = Intersection::new(5.0, cone);

    assert_eq!(Computations::prepare(&w, &i, &r, None).unwrap_err(),
        TraceError::DegenerateNormal(cone));
}
