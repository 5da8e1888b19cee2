use nalgebra::{ Matrix4, Point3, Vector3 };

/// A ray with an origin point and a direction vector.
///
/// The direction does not have to be unit length. Rays are transformed into
/// object space without renormalizing, so `t` values stay comparable between
/// world space and object space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Ray {
        Ray { origin, direction }
    }

    pub fn position(&self, t: f64) -> Point3<f64> {
        self.origin + (t * self.direction)
    }

    pub fn transform(&self, m: &Matrix4<f64>) -> Ray {
        Ray {
            origin: m.transform_point(&self.origin),
            direction: m.transform_vector(&self.direction),
        }
    }

    /// False if any component of the ray is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.origin.iter().chain(self.direction.iter()).all(|c| c.is_finite())
    }
}

#[test]
fn ray_position() {
    let r = Ray::new(
                Point3::new(2.0, 3.0, 4.0),
                Vector3::new(1.0, 0.0, 0.0)
            );

    assert_eq!(r.position(0.0), Point3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Point3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Point3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Point3::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_translation() {
    use crate::transform::translation;

    let r = Ray::new(
                Point3::new(1.0, 2.0, 3.0),
                Vector3::new(0.0, 1.0, 0.0)
            );
    let t = r.transform(&translation(3.0, 4.0, 5.0));

    assert_eq!(t.origin, Point3::new(4.0, 6.0, 8.0));
    assert_eq!(t.direction, Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn ray_scaling() {
    use crate::transform::scaling;

    let r = Ray::new(
                Point3::new(1.0, 2.0, 3.0),
                Vector3::new(0.0, 1.0, 0.0)
            );
    let t = r.transform(&scaling(2.0, 3.0, 4.0));

    assert_eq!(t.origin, Point3::new(2.0, 6.0, 12.0));
    assert_eq!(t.direction, Vector3::new(0.0, 3.0, 0.0));
}

#[test]
fn ray_round_trips_through_inverse() {
    use approx::assert_abs_diff_eq;
    use crate::transform::{ Transform, translation, rotation_y, shearing };

    let r = Ray::new(
                Point3::new(1.5, -2.0, 7.25),
                Vector3::new(0.3, -0.4, 0.5)
            );
    let t = Transform::new(
        translation(1.0, 2.0, 3.0)
            * rotation_y(0.7)
            * shearing(0.5, 0.0, 0.0, 1.0, 0.25, 0.0)
    ).unwrap();

    let back = r.transform(t.matrix()).transform(t.inverse());

    assert_abs_diff_eq!(back.origin, r.origin, epsilon = 1e-9);
    assert_abs_diff_eq!(back.direction, r.direction, epsilon = 1e-9);
}

#[test]
fn non_finite_rays_are_detected() {
    let r = Ray::new(
                Point3::new(0.0, 0.0, 0.0),
                Vector3::new(f64::NAN, 1.0, 0.0)
            );

    assert!(!r.is_finite());
}
