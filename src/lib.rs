pub mod consts;
pub mod transform;
pub mod ray;

pub mod color;
pub mod pattern;
pub mod light;

pub mod shape;
pub mod intersect;
pub mod world;
pub mod camera;

pub mod canvas;
pub mod parallel;
pub mod scene;

use crate::consts::FEQ_EPSILON;

/// Compares two floats, tolerating the error accumulated by ray arithmetic.
pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
