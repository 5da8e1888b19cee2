use nalgebra::{ Matrix4, Point3, Vector3 };
use thiserror::Error;

use crate::consts::FEQ_EPSILON;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("transformation matrix is not invertible (determinant {0})")]
    NotInvertible(f64),
}

/// An affine transformation together with its inverse.
///
/// Shapes, patterns and cameras all need the inverse far more often than the
/// forward matrix, so it is computed once here. Both matrices are private;
/// the only way to change a `Transform` is to build a new one, which keeps the
/// inverse in step with the matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl Default for Transform {
    fn default() -> Transform {
        Transform::identity()
    }
}

impl Transform {
    /// Wraps a matrix, failing if it has no usable inverse.
    ///
    /// The inverse must be finite and must undo the matrix.
    pub fn new(matrix: Matrix4<f64>) -> Result<Transform, TransformError> {
        let not_invertible = || {
            TransformError::NotInvertible(matrix.determinant())
        };

        let inverse = matrix.try_inverse().ok_or_else(not_invertible)?;
        if inverse.iter().any(|x| !x.is_finite())
            || !almost_equal(&(matrix * inverse), &Matrix4::identity()) {
            return Err(not_invertible());
        }

        Ok(Transform { matrix, inverse })
    }

    pub fn identity() -> Transform {
        Transform {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn inverse(&self) -> &Matrix4<f64> {
        &self.inverse
    }

    /// Brings a point from the outer (world or parent) space into this space.
    pub fn to_local(&self, point: &Point3<f64>) -> Point3<f64> {
        self.inverse.transform_point(point)
    }

    /// Brings a local normal back out to the outer space.
    ///
    /// Normals transform by the transpose of the inverse; only the upper 3x3
    /// block is used, which drops any translation. The result is normalized,
    /// and `None` when the normal has collapsed to zero length.
    pub fn normal_to_outer(&self, normal: &Vector3<f64>)
        -> Option<Vector3<f64>> {
        self.inverse.transpose()
            .transform_vector(normal)
            .try_normalize(f64::EPSILON)
    }
}

impl std::convert::TryFrom<Matrix4<f64>> for Transform {
    type Error = TransformError;

    fn try_from(matrix: Matrix4<f64>) -> Result<Transform, TransformError> {
        Transform::new(matrix)
    }
}

pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
}

/// Rotation around the X axis by `r` radians (left-handed, as seen looking
/// down the positive axis towards the origin).
pub fn rotation_x(r: f64) -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0,      0.0,     0.0,
        0.0, r.cos(), -r.sin(), 0.0,
        0.0, r.sin(),  r.cos(), 0.0,
        0.0, 0.0,      0.0,     1.0,
    )
}

pub fn rotation_y(r: f64) -> Matrix4<f64> {
    Matrix4::new(
         r.cos(), 0.0, r.sin(), 0.0,
         0.0,     1.0, 0.0,     0.0,
        -r.sin(), 0.0, r.cos(), 0.0,
         0.0,     0.0, 0.0,     1.0,
    )
}

pub fn rotation_z(r: f64) -> Matrix4<f64> {
    Matrix4::new(
        r.cos(), -r.sin(), 0.0, 0.0,
        r.sin(),  r.cos(), 0.0, 0.0,
        0.0,      0.0,     1.0, 0.0,
        0.0,      0.0,     0.0, 1.0,
    )
}

/// Shears each axis in proportion to the other two.
///
/// For example, `xy` moves `x` in proportion to `y`.
pub fn shearing(xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64)
    -> Matrix4<f64> {
    Matrix4::new(
        1.0, xy,  xz,  0.0,
        yx,  1.0, yz,  0.0,
        zx,  zy,  1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Orients the world relative to an eye at `from` looking at `to`.
///
/// The `up` vector only needs to point roughly upwards; the true up vector is
/// recomputed from the forward and left vectors.
pub fn view_transform(from: Point3<f64>, to: Point3<f64>, up: Vector3<f64>)
    -> Matrix4<f64> {
    let forward = (to - from).normalize();
    let left = forward.cross(&up.normalize());
    let true_up = left.cross(&forward);

    let orientation = Matrix4::new(
         left.x,     left.y,     left.z,    0.0,
         true_up.x,  true_up.y,  true_up.z, 0.0,
        -forward.x, -forward.y, -forward.z, 0.0,
         0.0,        0.0,        0.0,       1.0,
    );

    orientation * translation(-from.x, -from.y, -from.z)
}

/// True if two matrices agree element-wise within `FEQ_EPSILON`.
pub fn almost_equal(left: &Matrix4<f64>, right: &Matrix4<f64>) -> bool {
    left.iter().zip(right.iter()).all(|(l, r)| (l - r).abs() < FEQ_EPSILON)
}

#[test]
fn singular_matrix_is_rejected() {
    let singular = scaling(1.0, 0.0, 1.0);

    assert!(matches!(
        Transform::new(singular),
        Err(TransformError::NotInvertible(_))
    ));
}

#[test]
fn small_uniform_scaling_is_invertible() {
    use approx::assert_relative_eq;

    let t = Transform::new(scaling(1e-6, 1e-6, 1e-6)).unwrap();

    assert_relative_eq!(*t.inverse(), scaling(1e6, 1e6, 1e6),
        max_relative = 1e-9);
}

#[test]
fn non_finite_matrix_is_rejected() {
    let m = translation(f64::NAN, 0.0, 0.0);

    assert!(Transform::new(m).is_err());
}

#[test]
fn transform_caches_inverse() {
    let t = Transform::new(translation(5.0, -3.0, 2.0)).unwrap();

    assert!(almost_equal(t.inverse(), &translation(-5.0, 3.0, -2.0)));
    assert!(almost_equal(&(t.matrix() * t.inverse()), &Matrix4::identity()));
}

#[test]
fn multiply_by_translation() {
    let t = translation(5.0, -3.0, 2.0);
    let p = Point3::new(-3.0, 4.0, 5.0);

    assert_eq!(t.transform_point(&p), Point3::new(2.0, 1.0, 7.0));
}

#[test]
fn translation_does_not_affect_vectors() {
    let t = translation(5.0, -3.0, 2.0);
    let v = Vector3::new(-3.0, 4.0, 5.0);

    assert_eq!(t.transform_vector(&v), v);
}

#[test]
fn scaling_by_negative_value_reflects() {
    let t = scaling(-1.0, 1.0, 1.0);
    let p = Point3::new(2.0, 3.0, 4.0);

    assert_eq!(t.transform_point(&p), Point3::new(-2.0, 3.0, 4.0));
}

#[test]
fn rotate_around_each_axis() {
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    let px = rotation_x(FRAC_PI_2).transform_point(&Point3::new(0.0, 1.0, 0.0));
    let py = rotation_y(FRAC_PI_2).transform_point(&Point3::new(0.0, 0.0, 1.0));
    let pz = rotation_z(FRAC_PI_2).transform_point(&Point3::new(0.0, 1.0, 0.0));

    assert_abs_diff_eq!(px, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-9);
    assert_abs_diff_eq!(py, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-9);
    assert_abs_diff_eq!(pz, Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-9);
}

#[test]
fn shearing_moves_x_in_proportion_to_y() {
    let t = shearing(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let p = Point3::new(2.0, 3.0, 4.0);

    assert_eq!(t.transform_point(&p), Point3::new(5.0, 3.0, 4.0));
}

#[test]
fn view_transform_for_default_orientation() {
    let from = Point3::new(0.0, 0.0, 0.0);
    let to = Point3::new(0.0, 0.0, -1.0);
    let up = Vector3::new(0.0, 1.0, 0.0);

    assert!(almost_equal(&view_transform(from, to, up), &Matrix4::identity()));
}

#[test]
fn view_transform_looking_in_positive_z() {
    let from = Point3::new(0.0, 0.0, 0.0);
    let to = Point3::new(0.0, 0.0, 1.0);
    let up = Vector3::new(0.0, 1.0, 0.0);

    assert!(almost_equal(
        &view_transform(from, to, up),
        &scaling(-1.0, 1.0, -1.0)
    ));
}

#[test]
fn view_transform_moves_the_world() {
    let from = Point3::new(0.0, 0.0, 8.0);
    let to = Point3::new(0.0, 0.0, 0.0);
    let up = Vector3::new(0.0, 1.0, 0.0);

    assert!(almost_equal(
        &view_transform(from, to, up),
        &translation(0.0, 0.0, -8.0)
    ));
}

#[test]
fn arbitrary_view_transform() {
    let from = Point3::new(1.0, 3.0, 2.0);
    let to = Point3::new(4.0, -2.0, 8.0);
    let up = Vector3::new(1.0, 1.0, 0.0);

    let expected = Matrix4::new(
        -0.50709, 0.50709,  0.67612, -2.36643,
         0.76772, 0.60609,  0.12122, -2.82843,
        -0.35857, 0.59761, -0.71714,  0.00000,
         0.00000, 0.00000,  0.00000,  1.00000,
    );

    assert!(almost_equal(&view_transform(from, to, up), &expected));
}
