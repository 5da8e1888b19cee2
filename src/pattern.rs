use nalgebra::{ Matrix4, Point3 };
use serde::{ Serialize, Deserialize };

use crate::feq;
use crate::color::Color;
use crate::transform::{ Transform, TransformError };
use crate::shape::ShapeId;
use crate::world::World;

/// The ways two colors can be laid out across pattern space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Alternates along X: `primary` where `floor(x)` is even.
    Stripe,

    /// Blends linearly from `primary` to `secondary` along each unit of X.
    Gradient,

    /// Concentric rings in the XZ plane.
    Ring,

    /// Alternating unit cubes in all three dimensions.
    Checker,
}

/// A two-color pattern, replacing a material's flat color.
///
/// Patterns live in their own space. A world point is first brought into the
/// space of the object being shaded, then through the pattern's transform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub primary: Color,
    pub secondary: Color,
    transform: Transform,
}

impl Pattern {
    pub fn new(kind: PatternKind, primary: Color, secondary: Color)
        -> Pattern {
        Pattern { kind, primary, secondary, transform: Transform::identity() }
    }

    pub fn stripe(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Stripe, primary, secondary)
    }

    pub fn gradient(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Gradient, primary, secondary)
    }

    pub fn ring(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Ring, primary, secondary)
    }

    pub fn checker(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Checker, primary, secondary)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, m: Matrix4<f64>)
        -> Result<(), TransformError> {
        self.transform = Transform::new(m)?;
        Ok(())
    }

    pub fn with_transform(mut self, m: Matrix4<f64>)
        -> Result<Pattern, TransformError> {
        self.set_transform(m)?;
        Ok(self)
    }

    /// Evaluates the pattern at a point already in pattern space.
    pub fn pattern_at(&self, p: &Point3<f64>) -> Color {
        match self.kind {
            PatternKind::Stripe => self.alternate(p.x.floor()),
            PatternKind::Gradient => {
                self.primary.lerp(&self.secondary, p.x - p.x.floor())
            },
            PatternKind::Ring => {
                self.alternate((p.x.powi(2) + p.z.powi(2)).sqrt().floor())
            },
            PatternKind::Checker => {
                self.alternate(p.x.floor() + p.y.floor() + p.z.floor())
            },
        }
    }

    /// Evaluates the pattern at a world-space point on shape `object`.
    pub fn pattern_at_shape(&self, world: &World, object: ShapeId,
        world_point: &Point3<f64>) -> Color {
        let object_point = world.world_to_object(object, world_point);
        let pattern_point = self.transform.to_local(&object_point);

        self.pattern_at(&pattern_point)
    }

    fn alternate(&self, n: f64) -> Color {
        if feq(n.rem_euclid(2.0), 0.0) {
            self.primary
        } else {
            self.secondary
        }
    }
}

#[test]
fn stripe_pattern_is_constant_along_y_and_z() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    for p in &[
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, 2.0),
    ] {
        assert_eq!(pattern.pattern_at(p), Color::white());
    }
}

#[test]
fn stripe_pattern_alternates_along_x() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(&Point3::new( 0.9, 0.0, 0.0)),
        Color::white());
    assert_eq!(pattern.pattern_at(&Point3::new( 1.0, 0.0, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(&Point3::new(-0.1, 0.0, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(&Point3::new(-1.1, 0.0, 0.0)),
        Color::white());
}

#[test]
fn gradient_interpolates_between_colors() {
    let pattern = Pattern::gradient(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(&Point3::new(0.25, 0.0, 0.0)),
        Color::rgb(0.75, 0.75, 0.75));
    assert_eq!(pattern.pattern_at(&Point3::new(0.75, 0.0, 0.0)),
        Color::rgb(0.25, 0.25, 0.25));
}

#[test]
fn ring_extends_in_x_and_z() {
    let pattern = Pattern::ring(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(&Point3::new(0.0, 0.0, 0.0)),
        Color::white());
    assert_eq!(pattern.pattern_at(&Point3::new(1.0, 0.0, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(&Point3::new(0.708, 0.0, 0.708)),
        Color::black());
}

#[test]
fn checkers_repeat_in_every_dimension() {
    let pattern = Pattern::checker(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(&Point3::new(0.99, 0.0, 0.0)),
        Color::white());
    assert_eq!(pattern.pattern_at(&Point3::new(1.01, 0.0, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(&Point3::new(0.0, 1.01, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(&Point3::new(0.0, 0.0, 1.01)),
        Color::black());
}

#[test]
fn stripes_with_object_transformation() {
    use crate::shape::Shape;
    use crate::transform::scaling;
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere().with_transform(scaling(2.0, 2.0, 2.0))
        .unwrap());
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at_shape(&w, s, &Point3::new(1.5, 0.0, 0.0)),
        Color::white());
}

#[test]
fn stripes_with_object_and_pattern_transformation() {
    use crate::shape::Shape;
    use crate::transform::{ scaling, translation };
    use crate::world::WorldConfig;

    let mut w = World::new(WorldConfig::default());
    let s = w.add(Shape::sphere().with_transform(scaling(2.0, 2.0, 2.0))
        .unwrap());
    let pattern = Pattern::stripe(Color::white(), Color::black())
        .with_transform(translation(0.5, 0.0, 0.0))
        .unwrap();

    assert_eq!(pattern.pattern_at_shape(&w, s, &Point3::new(2.5, 0.0, 0.0)),
        Color::white());
}
