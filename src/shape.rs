use nalgebra::{ Matrix4, Point3, Vector3 };

use crate::consts::{ FEQ_EPSILON, LARGE_DIVISOR };
use crate::ray::Ray;
use crate::light::Material;
use crate::transform::{ Transform, TransformError };

/// Identifies a shape within the `World` that owns it.
///
/// Shapes are stored in an arena, so an id is simply an index into it. Hits
/// carry an id rather than a reference, which keeps them `Copy` and lets a
/// shape point back at its parent group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) usize);

impl ShapeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The Y extent of a cylinder or cone, and whether its ends are capped.
///
/// Both bounds are exclusive for the lateral surface; an unbounded shape uses
/// infinite bounds (caps are then never hit).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub minimum: f64,
    pub maximum: f64,
    pub closed: bool,
}

impl Default for Extent {
    fn default() -> Extent {
        Extent {
            minimum: f64::NEG_INFINITY,
            maximum: f64::INFINITY,
            closed: false,
        }
    }
}

impl Extent {
    pub fn new(minimum: f64, maximum: f64, closed: bool) -> Extent {
        Extent { minimum, maximum, closed }
    }

    fn contains(&self, y: f64) -> bool {
        self.minimum < y && y < self.maximum
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The XZ plane, stretching indefinitely with its normal along +Y.
    Plane,

    /// An axis-aligned cube spanning -1 to 1 on every axis.
    Cube,

    /// A cylinder of radius 1 around the Y axis.
    Cylinder(Extent),

    /// A double-napped cone around the Y axis with its apex at the origin.
    /// Its radius at height `y` is `|y|`.
    Cone(Extent),

    /// A node whose children are transformed by its own transform. Groups
    /// have no surface; rays are intersected with their children instead.
    Group,
}

/// A shape in a `World`.
///
/// The transform is private so that its cached inverse can never drift from
/// the matrix; use `set_transform` to change it. Parent and children links are
/// maintained by `World::add_child`.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    pub material: Material,
    transform: Transform,

    pub(crate) parent: Option<ShapeId>,
    pub(crate) children: Vec<ShapeId>,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Shape {
        Shape {
            kind,
            material: Default::default(),
            transform: Transform::identity(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Creates a unit sphere with identity transform and default material.
    pub fn sphere() -> Shape {
        Shape::new(ShapeKind::Sphere)
    }

    pub fn plane() -> Shape {
        Shape::new(ShapeKind::Plane)
    }

    pub fn cube() -> Shape {
        Shape::new(ShapeKind::Cube)
    }

    /// Creates an infinitely long cylinder with no end caps.
    pub fn cylinder() -> Shape {
        Shape::new(ShapeKind::Cylinder(Extent::default()))
    }

    /// Creates a cylinder cut off (but left open) at `minimum` and `maximum`.
    pub fn bounded_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeKind::Cylinder(Extent::new(minimum, maximum, false)))
    }

    /// Creates a bounded cylinder with caps.
    pub fn capped_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeKind::Cylinder(Extent::new(minimum, maximum, true)))
    }

    /// Creates an infinite double-napped cone.
    pub fn cone() -> Shape {
        Shape::new(ShapeKind::Cone(Extent::default()))
    }

    pub fn bounded_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeKind::Cone(Extent::new(minimum, maximum, false)))
    }

    pub fn capped_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeKind::Cone(Extent::new(minimum, maximum, true)))
    }

    /// Creates an empty group. Children are added through the `World`.
    pub fn group() -> Shape {
        Shape::new(ShapeKind::Group)
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == ShapeKind::Group
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replaces the transform, recomputing its inverse.
    ///
    /// On error the previous transform is left in place.
    pub fn set_transform(&mut self, m: Matrix4<f64>)
        -> Result<(), TransformError> {
        self.transform = Transform::new(m)?;
        Ok(())
    }

    pub fn with_transform(mut self, m: Matrix4<f64>)
        -> Result<Shape, TransformError> {
        self.set_transform(m)?;
        Ok(self)
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    pub fn parent(&self) -> Option<ShapeId> {
        self.parent
    }

    pub fn children(&self) -> &[ShapeId] {
        &self.children
    }

    /// Intersects a ray, already in object space, with this shape's surface.
    ///
    /// Returns the `t` offsets of every crossing, in no particular order. A
    /// tangent ray may produce two equal offsets. Groups have no surface of
    /// their own and always return nothing here.
    pub fn local_intersect(&self, ray: &Ray) -> Vec<f64> {
        match self.kind {
            ShapeKind::Sphere => intersect_sphere(ray),
            ShapeKind::Plane => intersect_plane(ray),
            ShapeKind::Cube => intersect_cube(ray),
            ShapeKind::Cylinder(ref extent) => intersect_cylinder(extent, ray),
            ShapeKind::Cone(ref extent) => intersect_cone(extent, ray),
            ShapeKind::Group => Vec::new(),
        }
    }

    /// Obtains the unit outward normal at an object-space point.
    ///
    /// Where the normal is undefined (the apex of a cone, or any point of a
    /// group) the zero vector is returned; callers treat it as degenerate.
    pub fn local_normal_at(&self, at: &Point3<f64>) -> Vector3<f64> {
        let normal = match self.kind {
            ShapeKind::Sphere => at.coords,
            ShapeKind::Plane => Vector3::new(0.0, 1.0, 0.0),
            ShapeKind::Cube => normal_at_cube(at),
            ShapeKind::Cylinder(ref extent) => normal_at_cylinder(extent, at),
            ShapeKind::Cone(ref extent) => normal_at_cone(extent, at),
            ShapeKind::Group => Vector3::zeros(),
        };

        normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
    }
}

/// Solves the sphere quadratic for a unit sphere at the origin.
fn intersect_sphere(ray: &Ray) -> Vec<f64> {
    let sphere_to_ray = ray.origin.coords;

    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * ray.direction.dot(&sphere_to_ray);
    let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

    let discriminant = b.powi(2) - (4.0 * a * c);
    if discriminant < 0.0 {
        return Vec::new();
    }

    let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
    let t2 = (-b + discriminant.sqrt()) / (2.0 * a);
    vec![t1, t2]
}

/// The plane has no thickness, so a crossing enters and leaves it at the same
/// offset; both are reported.
fn intersect_plane(ray: &Ray) -> Vec<f64> {
    // A ray (nearly) parallel to the plane never crosses it. A coplanar ray
    // is treated the same way.
    if ray.direction.y.abs() < FEQ_EPSILON {
        return Vec::new();
    }

    let t = -ray.origin.y / ray.direction.y;
    vec![t, t]
}

/// Slab test against the cube spanning -1 to 1 on every axis.
fn intersect_cube(ray: &Ray) -> Vec<f64> {
    let (xtmin, xtmax) = check_axis(ray.origin.x, ray.direction.x);
    let (ytmin, ytmax) = check_axis(ray.origin.y, ray.direction.y);
    let (ztmin, ztmax) = check_axis(ray.origin.z, ray.direction.z);

    let tmin = xtmin.max(ytmin).max(ztmin);
    let tmax = xtmax.min(ytmax).min(ztmax);

    if tmin > tmax {
        return Vec::new();
    }

    vec![tmin, tmax]
}

/// Gets the offsets where a ray crosses the two faces of one cube axis.
///
/// The smaller `t` is first in the tuple. A near-zero direction is replaced by
/// a large finite factor rather than dividing by zero, so the result stays
/// finite (and an origin exactly on a face gives 0 rather than NaN).
fn check_axis(origin: f64, direction: f64) -> (f64, f64) {
    let tmin_numerator = -1.0 - origin;
    let tmax_numerator =  1.0 - origin;

    let (tmin, tmax) = if direction.abs() >= FEQ_EPSILON {
        (tmin_numerator / direction, tmax_numerator / direction)
    } else {
        (tmin_numerator * LARGE_DIVISOR, tmax_numerator * LARGE_DIVISOR)
    };

    if tmin > tmax {
        (tmax, tmin)
    } else {
        (tmin, tmax)
    }
}

fn normal_at_cube(p: &Point3<f64>) -> Vector3<f64> {
    let xa = p.x.abs();
    let ya = p.y.abs();
    let za = p.z.abs();

    let max_component = xa.max(ya).max(za);
    if max_component == xa {
        Vector3::new(p.x, 0.0, 0.0)
    } else if max_component == ya {
        Vector3::new(0.0, p.y, 0.0)
    } else {
        Vector3::new(0.0, 0.0, p.z)
    }
}

fn intersect_cylinder(extent: &Extent, ray: &Ray) -> Vec<f64> {
    let mut xs = Vec::new();
    let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);

    // Parallel to the Y axis: only the caps can be hit.
    if a < FEQ_EPSILON {
        intersect_caps(extent, ray, &mut xs, |_| 1.0);
        return xs;
    }

    let b = 2.0 * ray.origin.x * ray.direction.x
          + 2.0 * ray.origin.z * ray.direction.z;
    let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;

    let disc = b.powi(2) - 4.0 * a * c;
    if disc < 0.0 {
        return xs;
    }

    let t0 = (-b - disc.sqrt()) / (2.0 * a);
    let t1 = (-b + disc.sqrt()) / (2.0 * a);
    push_within_extent(extent, ray, t0.min(t1), &mut xs);
    push_within_extent(extent, ray, t0.max(t1), &mut xs);

    intersect_caps(extent, ray, &mut xs, |_| 1.0);
    xs
}

fn normal_at_cylinder(extent: &Extent, at: &Point3<f64>) -> Vector3<f64> {
    // Square of the distance from the Y axis.
    let dist = at.x.powi(2) + at.z.powi(2);

    if dist < 1.0 && at.y >= extent.maximum - FEQ_EPSILON {
        Vector3::new(0.0, 1.0, 0.0)
    } else if dist < 1.0 && at.y <= extent.minimum + FEQ_EPSILON {
        Vector3::new(0.0, -1.0, 0.0)
    } else {
        Vector3::new(at.x, 0.0, at.z)
    }
}

fn intersect_cone(extent: &Extent, ray: &Ray) -> Vec<f64> {
    let mut xs = Vec::new();
    let (o, d) = (&ray.origin, &ray.direction);

    let a = d.x.powi(2) - d.y.powi(2) + d.z.powi(2);
    let b = 2.0 * o.x * d.x - 2.0 * o.y * d.y + 2.0 * o.z * d.z;
    let c = o.x.powi(2) - o.y.powi(2) + o.z.powi(2);

    if a.abs() < FEQ_EPSILON {
        // Parallel to one of the nappes: at most one crossing, and none at
        // all when b is zero too.
        if b.abs() >= FEQ_EPSILON {
            push_within_extent(extent, ray, -c / (2.0 * b), &mut xs);
        }

        intersect_caps(extent, ray, &mut xs, f64::abs);
        return xs;
    }

    let mut disc = b.powi(2) - 4.0 * a * c;
    if disc < 0.0 {
        // Rays grazing the apex can land a hair below zero; tolerate that in
        // proportion to the magnitude of the coefficients.
        let scale = a.abs().max(b.abs()).max(c.abs());
        if disc < -FEQ_EPSILON * scale * scale {
            return xs;
        }
        disc = 0.0;
    }

    let t0 = (-b - disc.sqrt()) / (2.0 * a);
    let t1 = (-b + disc.sqrt()) / (2.0 * a);
    push_within_extent(extent, ray, t0.min(t1), &mut xs);
    push_within_extent(extent, ray, t0.max(t1), &mut xs);

    intersect_caps(extent, ray, &mut xs, f64::abs);
    xs
}

fn normal_at_cone(extent: &Extent, at: &Point3<f64>) -> Vector3<f64> {
    let dist = at.x.powi(2) + at.z.powi(2);

    // Caps have the radius of the cone at their height.
    if dist < extent.maximum.powi(2) && at.y >= extent.maximum - FEQ_EPSILON {
        Vector3::new(0.0, 1.0, 0.0)
    } else if dist < extent.minimum.powi(2)
        && at.y <= extent.minimum + FEQ_EPSILON {
        Vector3::new(0.0, -1.0, 0.0)
    } else {
        // The slope is 45 degrees, so the Y magnitude matches the radius.
        let mut y = dist.sqrt();
        if at.y > 0.0 {
            y = -y;
        }

        Vector3::new(at.x, y, at.z)
    }
}

/// Adds `t` if the ray is strictly within the extent's Y bounds there.
fn push_within_extent(extent: &Extent, ray: &Ray, t: f64, xs: &mut Vec<f64>) {
    let y = ray.origin.y + t * ray.direction.y;
    if extent.contains(y) {
        xs.push(t);
    }
}

/// Intersects the end caps of a closed cylinder or cone.
///
/// `radius_at` gives the cap radius at a cap height: constant for cylinders,
/// `|y|` for cones. Caps are skipped for open shapes, and for rays that run
/// parallel to the cap planes.
fn intersect_caps<F>(extent: &Extent, ray: &Ray, xs: &mut Vec<f64>,
    radius_at: F) where F: Fn(f64) -> f64 {
    if !extent.closed || ray.direction.y.abs() < FEQ_EPSILON {
        return;
    }

    for &y in &[extent.minimum, extent.maximum] {
        let t = (y - ray.origin.y) / ray.direction.y;
        let x = ray.origin.x + t * ray.direction.x;
        let z = ray.origin.z + t * ray.direction.z;

        if x.powi(2) + z.powi(2) <= radius_at(y).powi(2) {
            xs.push(t);
        }
    }
}

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray {
    Ray::new(
        Point3::new(origin.0, origin.1, origin.2),
        Vector3::new(direction.0, direction.1, direction.2),
    )
}

#[cfg(test)]
fn assert_hits(actual: Vec<f64>, expected: &[f64]) {
    use crate::feq;

    let mut actual = actual;
    actual.sort_by(|a, b| a.partial_cmp(b).unwrap());

    assert_eq!(actual.len(), expected.len(), "hits: {:?}", actual);
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(feq(*a, *e), "expected {:?}, got {:?}", expected, actual);
    }
}

#[test]
fn ray_intersects_sphere_at_two_points() {
    let s = Shape::sphere();

    assert_hits(s.local_intersect(&ray((0., 0., -5.), (0., 0., 1.))),
        &[4.0, 6.0]);
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = Shape::sphere();

    assert_hits(s.local_intersect(&ray((0., 1., -5.), (0., 0., 1.))),
        &[5.0, 5.0]);
}

#[test]
fn ray_misses_sphere() {
    let s = Shape::sphere();

    assert!(s.local_intersect(&ray((0., 2., -5.), (0., 0., 1.))).is_empty());
}

#[test]
fn ray_is_inside_sphere() {
    let s = Shape::sphere();

    assert_hits(s.local_intersect(&ray((0., 0., 0.), (0., 0., 1.))),
        &[-1.0, 1.0]);
}

#[test]
fn sphere_is_behind_ray() {
    let s = Shape::sphere();

    assert_hits(s.local_intersect(&ray((0., 0., 5.), (0., 0., 1.))),
        &[-6.0, -4.0]);
}

#[test]
fn normal_on_sphere_is_normalized() {
    use approx::assert_abs_diff_eq;

    let s = Shape::sphere();
    let k = 3.0f64.sqrt() / 3.0;
    let n = s.local_normal_at(&Point3::new(k, k, k));

    assert_abs_diff_eq!(n, Vector3::new(k, k, k), epsilon = 1e-9);
    assert_abs_diff_eq!(n.magnitude(), 1.0, epsilon = 1e-9);
}

#[test]
fn plane_normal_is_constant() {
    let p = Shape::plane();

    for at in &[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, -10.0),
        Point3::new(-5.0, 0.0, 150.0),
    ] {
        assert_eq!(p.local_normal_at(at), Vector3::new(0.0, 1.0, 0.0));
    }
}

#[test]
fn ray_parallel_to_plane() {
    let p = Shape::plane();

    assert!(p.local_intersect(&ray((0., 10., 0.), (0., 0., 1.))).is_empty());
}

#[test]
fn coplanar_ray_misses_plane() {
    let p = Shape::plane();

    assert!(p.local_intersect(&ray((0., 0., 0.), (0., 0., 1.))).is_empty());
}

#[test]
fn ray_intersecting_plane_from_above_and_below() {
    let p = Shape::plane();

    assert_hits(p.local_intersect(&ray((0., 1., 0.), (0., -1., 0.))),
        &[1.0, 1.0]);
    assert_hits(p.local_intersect(&ray((0., -1., 0.), (0., 1., 0.))),
        &[1.0, 1.0]);
}

#[test]
fn ray_intersects_cube_faces() {
    let c = Shape::cube();

    let cases = [
        ((5.0, 0.5, 0.0), (-1.0, 0.0, 0.0), 4.0, 6.0),
        ((-5.0, 0.5, 0.0), (1.0, 0.0, 0.0), 4.0, 6.0),
        ((0.5, 5.0, 0.0), (0.0, -1.0, 0.0), 4.0, 6.0),
        ((0.5, -5.0, 0.0), (0.0, 1.0, 0.0), 4.0, 6.0),
        ((0.5, 0.0, 5.0), (0.0, 0.0, -1.0), 4.0, 6.0),
        ((0.5, 0.0, -5.0), (0.0, 0.0, 1.0), 4.0, 6.0),
        ((0.0, 0.5, 0.0), (0.0, 0.0, 1.0), -1.0, 1.0),
    ];

    for &(origin, direction, t1, t2) in cases.iter() {
        assert_hits(c.local_intersect(&ray(origin, direction)), &[t1, t2]);
    }
}

#[test]
fn ray_misses_cube() {
    let c = Shape::cube();

    let cases = [
        ((-2.0, 0.0, 0.0), (0.2673, 0.5345, 0.8018)),
        ((0.0, -2.0, 0.0), (0.8018, 0.2673, 0.5345)),
        ((0.0, 0.0, -2.0), (0.5345, 0.8018, 0.2673)),
        ((2.0, 0.0, 2.0), (0.0, 0.0, -1.0)),
        ((0.0, 2.0, 2.0), (0.0, -1.0, 0.0)),
        ((2.0, 2.0, 0.0), (-1.0, 0.0, 0.0)),
    ];

    for &(origin, direction) in cases.iter() {
        assert!(c.local_intersect(&ray(origin, direction)).is_empty());
    }
}

#[test]
fn ray_on_cube_face_stays_finite() {
    let c = Shape::cube();

    // Origin exactly on the x = 1 face, travelling parallel to it.
    let xs = c.local_intersect(&ray((1.0, 0.0, -5.0), (0.0, 0.0, 1.0)));
    assert!(xs.iter().all(|t| t.is_finite()));
}

#[test]
fn normal_on_cube_surface() {
    let c = Shape::cube();

    let cases = [
        ((1.0, 0.5, -0.8), (1.0, 0.0, 0.0)),
        ((-1.0, -0.2, 0.9), (-1.0, 0.0, 0.0)),
        ((-0.4, 1.0, -0.1), (0.0, 1.0, 0.0)),
        ((0.3, -1.0, -0.7), (0.0, -1.0, 0.0)),
        ((-0.6, 0.3, 1.0), (0.0, 0.0, 1.0)),
        ((0.4, 0.4, -1.0), (0.0, 0.0, -1.0)),
        ((1.0, 1.0, 1.0), (1.0, 0.0, 0.0)),
        ((-1.0, -1.0, -1.0), (-1.0, 0.0, 0.0)),
    ];

    for &((px, py, pz), (nx, ny, nz)) in cases.iter() {
        assert_eq!(c.local_normal_at(&Point3::new(px, py, pz)),
            Vector3::new(nx, ny, nz));
    }
}

#[test]
fn ray_misses_cylinder() {
    let cyl = Shape::cylinder();

    let cases = [
        ((1.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
        ((0.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
        ((0.0, 0.0, -5.0), (1.0, 1.0, 1.0)),
    ];

    for &(origin, direction) in cases.iter() {
        let direction = Vector3::new(direction.0, direction.1, direction.2)
            .normalize();
        let r = ray(origin, (direction.x, direction.y, direction.z));
        assert!(cyl.local_intersect(&r).is_empty());
    }
}

#[test]
fn ray_strikes_cylinder() {
    let cyl = Shape::cylinder();

    let cases = [
        ((1.0, 0.0, -5.0), (0.0, 0.0, 1.0), 5.0, 5.0),
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 4.0, 6.0),
        ((0.5, 0.0, -5.0), (0.1, 1.0, 1.0), 6.80798, 7.08872),
    ];

    for &(origin, direction, t0, t1) in cases.iter() {
        let direction = Vector3::new(direction.0, direction.1, direction.2)
            .normalize();
        let r = ray(origin, (direction.x, direction.y, direction.z));
        assert_hits(cyl.local_intersect(&r), &[t0, t1]);
    }
}

#[test]
fn normal_on_cylinder() {
    let cyl = Shape::cylinder();

    let cases = [
        ((1.0, 0.0, 0.0), (1.0, 0.0, 0.0)),
        ((0.0, 5.0, -1.0), (0.0, 0.0, -1.0)),
        ((0.0, -2.0, 1.0), (0.0, 0.0, 1.0)),
        ((-1.0, 1.0, 0.0), (-1.0, 0.0, 0.0)),
    ];

    for &((px, py, pz), (nx, ny, nz)) in cases.iter() {
        assert_eq!(cyl.local_normal_at(&Point3::new(px, py, pz)),
            Vector3::new(nx, ny, nz));
    }
}

#[test]
fn intersecting_constrained_cylinder() {
    let cyl = Shape::bounded_cylinder(1.0, 2.0);

    let cases = [
        ((0.0, 1.5, 0.0), (0.1, 1.0, 0.0), 0),
        ((0.0, 3.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 2.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.5, -2.0), (0.0, 0.0, 1.0), 2),
    ];

    for &(origin, direction, count) in cases.iter() {
        let direction = Vector3::new(direction.0, direction.1, direction.2)
            .normalize();
        let r = ray(origin, (direction.x, direction.y, direction.z));
        assert_eq!(cyl.local_intersect(&r).len(), count);
    }
}

#[test]
fn intersecting_caps_of_closed_cylinder() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);

    let cases = [
        ((0.0, 3.0, 0.0), (0.0, -1.0, 0.0), 2),
        ((0.0, 3.0, -2.0), (0.0, -1.0, 2.0), 2),
        ((0.0, 4.0, -2.0), (0.0, -1.0, 1.0), 2),
        ((0.0, 0.0, -2.0), (0.0, 1.0, 2.0), 2),
        ((0.0, -1.0, -2.0), (0.0, 1.0, 1.0), 2),
    ];

    for &(origin, direction, count) in cases.iter() {
        let direction = Vector3::new(direction.0, direction.1, direction.2)
            .normalize();
        let r = ray(origin, (direction.x, direction.y, direction.z));
        assert_eq!(cyl.local_intersect(&r).len(), count);
    }
}

#[test]
fn normal_on_cylinder_caps() {
    let cyl = Shape::capped_cylinder(1.0, 2.0);

    let cases = [
        ((0.0, 1.0, 0.0), (0.0, -1.0, 0.0)),
        ((0.5, 1.0, 0.0), (0.0, -1.0, 0.0)),
        ((0.0, 1.0, 0.5), (0.0, -1.0, 0.0)),
        ((0.0, 2.0, 0.0), (0.0, 1.0, 0.0)),
        ((0.5, 2.0, 0.0), (0.0, 1.0, 0.0)),
        ((0.0, 2.0, 0.5), (0.0, 1.0, 0.0)),
    ];

    for &((px, py, pz), (nx, ny, nz)) in cases.iter() {
        assert_eq!(cyl.local_normal_at(&Point3::new(px, py, pz)),
            Vector3::new(nx, ny, nz));
    }
}

#[test]
fn intersecting_cone_with_ray() {
    let cone = Shape::cone();

    let cases = [
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 5.0, 5.0),
        ((0.0, 0.0, -5.0), (1.0, 1.0, 1.0), 8.66025, 8.66025),
        ((1.0, 1.0, -5.0), (-0.5, -1.0, 1.0), 4.55006, 49.44994),
    ];

    for &(origin, direction, t0, t1) in cases.iter() {
        let direction = Vector3::new(direction.0, direction.1, direction.2)
            .normalize();
        let r = ray(origin, (direction.x, direction.y, direction.z));
        assert_hits(cone.local_intersect(&r), &[t0, t1]);
    }
}

#[test]
fn ray_parallel_to_one_cone_half() {
    let cone = Shape::cone();
    let direction = Vector3::new(0.0, 1.0, 1.0).normalize();
    let r = ray((0.0, 0.0, -1.0), (direction.x, direction.y, direction.z));

    assert_hits(cone.local_intersect(&r), &[0.35355]);
}

#[test]
fn intersecting_cone_end_caps() {
    let cone = Shape::capped_cone(-0.5, 0.5);

    let cases = [
        ((0.0, 0.0, -5.0), (0.0, 1.0, 0.0), 0),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 1.0), 2),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 0.0), 4),
    ];

    for &(origin, direction, count) in cases.iter() {
        let direction = Vector3::new(direction.0, direction.1, direction.2)
            .normalize();
        let r = ray(origin, (direction.x, direction.y, direction.z));
        assert_eq!(cone.local_intersect(&r).len(), count);
    }
}

#[test]
fn open_cone_ignores_caps() {
    let cone = Shape::bounded_cone(-0.5, 0.5);
    let r = ray((0.0, 0.0, -0.25), (0.0, 1.0, 0.0));

    assert_eq!(cone.local_intersect(&r).len(), 2);
}

#[test]
fn normal_on_cone() {
    use approx::assert_abs_diff_eq;

    let cone = Shape::cone();

    assert_eq!(cone.local_normal_at(&Point3::new(0.0, 0.0, 0.0)),
        Vector3::zeros());
    assert_abs_diff_eq!(cone.local_normal_at(&Point3::new(1.0, 1.0, 1.0)),
        Vector3::new(1.0, -(2.0f64.sqrt()), 1.0).normalize(), epsilon = 1e-9);
    assert_abs_diff_eq!(cone.local_normal_at(&Point3::new(-1.0, -1.0, 0.0)),
        Vector3::new(-1.0, 1.0, 0.0).normalize(), epsilon = 1e-9);
}

#[test]
fn normal_on_cone_caps() {
    let cone = Shape::capped_cone(-2.0, 1.0);

    assert_eq!(cone.local_normal_at(&Point3::new(0.5, 1.0, 0.0)),
        Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(cone.local_normal_at(&Point3::new(1.5, -2.0, 0.0)),
        Vector3::new(0.0, -1.0, 0.0));
}

#[test]
fn singular_transform_is_rejected() {
    use crate::transform::scaling;

    let mut s = Shape::sphere();

    assert!(s.set_transform(scaling(0.0, 1.0, 1.0)).is_err());
    assert_eq!(s.transform(), &Transform::identity());
}
