use nalgebra::{ Matrix4, Point3 };

use crate::ray::Ray;
use crate::world::World;
use crate::canvas::Canvas;
use crate::transform::{ Transform, TransformError };
use crate::parallel::{ self, RenderOptions, RenderError };

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world. The view plane sits one unit in
/// front of the eye; its size follows from the field of view and the aspect
/// ratio of the canvas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    /// The angle describing "how much" the camera can see.
    pub field_of_view: f64,

    half_width: f64,
    half_height: f64,
    pixel_size: f64,

    /// How the world is oriented relative to the camera (typically a view
    /// transformation).
    transform: Transform,
}

impl Camera {
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64,
        transform: Matrix4<f64>) -> Result<Camera, TransformError> {
        let half_view = (field_of_view / 2.0).tan();
        let aspect = (hsize as f64) / (vsize as f64);

        let (half_width, half_height) = if aspect >= 1.0 {
            (half_view, half_view / aspect)
        } else {
            (half_view * aspect, half_view)
        };

        Ok(Camera {
            hsize,
            vsize,
            field_of_view,
            half_width,
            half_height,
            pixel_size: half_width * 2.0 / (hsize as f64),
            transform: Transform::new(transform)?,
        })
    }

    /// World-space size of one pixel on the view plane.
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, m: Matrix4<f64>)
        -> Result<(), TransformError> {
        self.transform = Transform::new(m)?;
        Ok(())
    }

    /// Builds the normalized world-space ray through the center of pixel
    /// `(px, py)`.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The camera looks toward -z, so +x is to the left
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        let inverse = self.transform.inverse();
        let pixel = inverse
            .transform_point(&Point3::new(world_x, world_y, -1.0));
        let origin = inverse.transform_point(&Point3::origin());

        Ray::new(origin, (pixel - origin).normalize())
    }

    /// Renders the world in parallel row bands.
    pub fn render(&self, world: &World, options: &RenderOptions)
        -> Result<Canvas, RenderError> {
        parallel::render(self, world, options)
    }
}

#[test]
fn pixel_size_horizontal_canvas() {
    let c = Camera::new(200, 125, std::f64::consts::PI / 2.0,
        Matrix4::identity()).unwrap();

    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn pixel_size_vertical_canvas() {
    let c = Camera::new(125, 200, std::f64::consts::PI / 2.0,
        Matrix4::identity()).unwrap();

    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn singular_camera_transform_is_rejected() {
    let m = crate::transform::scaling(1.0, 0.0, 1.0);

    assert!(Camera::new(10, 10, 1.0, m).is_err());
}

#[test]
fn ray_through_center() {
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0,
        Matrix4::identity()).unwrap();
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Point3::origin());
    assert_abs_diff_eq!(r.direction, Vector3::new(0.0, 0.0, -1.0),
        epsilon = 1e-9);
}

#[test]
fn ray_through_corner() {
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0,
        Matrix4::identity()).unwrap();
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Point3::origin());
    assert_abs_diff_eq!(r.direction, Vector3::new(0.66519, 0.33259, -0.66851),
        epsilon = 1e-5);
}

#[test]
fn ray_when_camera_transformed() {
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use crate::transform::{ rotation_y, translation };

    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0,
        rotation_y(std::f64::consts::PI / 4.0)
            * translation(0.0, -2.0, 5.0)).unwrap();
    let r = c.ray_for_pixel(100, 50);

    let k = 2.0f64.sqrt() / 2.0;
    assert_abs_diff_eq!(r.origin, Point3::new(0.0, 2.0, -5.0), epsilon = 1e-9);
    assert_abs_diff_eq!(r.direction, Vector3::new(k, 0.0, -k), epsilon = 1e-9);
}

#[test]
fn render_world_with_camera() {
    use nalgebra::Vector3;
    use crate::color::Color;
    use crate::transform::view_transform;

    let w = crate::world::default_world();

    let from = Point3::new(0.0, 0.0, -5.0);
    let to = Point3::new(0.0, 0.0, 0.0);
    let up = Vector3::new(0.0, 1.0, 0.0);

    let c = Camera::new(11, 11, std::f64::consts::PI / 2.0,
        view_transform(from, to, up)).unwrap();

    let image = c.render(&w, &RenderOptions::default()).unwrap();
    assert_eq!(image.read_pixel(5, 5),
        Some(Color::rgb(0.38066, 0.47583, 0.2855)));
}
