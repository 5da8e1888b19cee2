use std::ops::{ Add, Sub, Mul };

use crate::feq;

/// A color.
///
/// Represented conventionally with red-green-blue (RGB) values. Components are
/// nominally within 0.0 to 1.0, but lighting can push them past 1.0; they are
/// only clamped when written out to an image.
///
/// # Examples
///
/// Blend two colors:
///
/// ```
/// # use ray_tracer::color::Color;
/// let blend = Color::rgb(0.0, 1.0, 0.0) * 0.5 + Color::rgb(0.0, 0.0, 1.0) * 0.5;
/// assert_eq!(blend, Color::rgb(0.0, 0.5, 0.5));
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Colors are compared component-wise, accounting for floating point error.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

/// Takes up to three components from a slice; missing ones default to 0.0.
impl From<&[f64]> for Color {
    fn from(v: &[f64]) -> Color {
        match *v {
            [] => Default::default(),
            [r] => Color { r, ..Default::default() },
            [r, g] => Color { r, g, ..Default::default() },
            [r, g, b, ..] => Color { r, g, b },
        }
    }
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    /// Computes the Hadamard (component-wise) product of two colors.
    ///
    /// This is how a surface color filters the color of the light falling on
    /// it. The `*` operator between two colors is shorthand for this.
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        Color {
            r: c1.r * c2.r,
            g: c1.g * c2.g,
            b: c1.b * c2.b,
        }
    }

    /// Linear interpolation from `self` (at 0.0) to `other` (at 1.0).
    pub fn lerp(&self, other: &Color, fraction: f64) -> Color {
        *self + (*other - *self) * fraction
    }

    /// Scales each component to an integer in `[0, 255]`.
    pub fn to_bytes(&self) -> [u8; 3] {
        let scale = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        [scale(self.r), scale(self.g), scale(self.b)]
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Self::Output {
        Color {
            r: self.r - other.r,
            g: self.g - other.g,
            b: self.b - other.b,
        }
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Self::Output {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color::hadamard(&self, &other)
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn subtract_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 - c2, Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn multiply_color_by_scalar() {
    assert_eq!(Color::rgb(0.2, 0.3, 0.4) * 2.0, Color::rgb(0.4, 0.6, 0.8));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
}

#[test]
fn color_from_short_slice() {
    let c: Color = (&[0.5, 0.25][..]).into();

    assert_eq!(c, Color::rgb(0.5, 0.25, 0.0));
}

#[test]
fn bytes_are_clamped() {
    assert_eq!(Color::rgb(1.5, 0.0, -0.5).to_bytes(), [255, 0, 0]);
    assert_eq!(Color::rgb(0.5, 0.0, 0.0).to_bytes(), [128, 0, 0]);
}
