use std::time::Instant;

use log::{ debug, info };
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;

use crate::world::World;
use crate::camera::Camera;
use crate::canvas::{ Band, Canvas };
use crate::consts::DEFAULT_RECURSION_DEPTH;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("a render needs at least one worker")]
    NoWorkers,

    #[error("could not start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Knobs for a single render pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Number of worker threads, and the number of full row bands.
    pub workers: usize,

    /// How many times reflected and refracted rays may recurse.
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        RenderOptions { workers, max_depth: DEFAULT_RECURSION_DEPTH }
    }
}

/// Rows per band when `height` rows are split between `workers`.
///
/// Leftover rows form one extra, shorter band.
pub fn band_height(height: usize, workers: usize) -> usize {
    (height / workers.max(1)).max(1)
}

/// Renders `world` through `camera`, one row band per task.
///
/// Bands are disjoint slices of the output canvas, so workers never share a
/// pixel; the world is only read. Rays that fail to trace come out black and
/// never abort the render.
pub fn render(camera: &Camera, world: &World, options: &RenderOptions)
    -> Result<Canvas, RenderError> {
    if options.workers == 0 {
        return Err(RenderError::NoWorkers);
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("render-{}", i))
        .build()?;

    let rows = band_height(camera.vsize, options.workers);
    let mut canvas = Canvas::new(camera.hsize, camera.vsize);
    let start = Instant::now();

    {
        let bands = canvas.bands_mut(rows);
        info!("rendering {}x{} with {} workers in {} bands",
            camera.hsize, camera.vsize, options.workers, bands.len());

        pool.install(|| {
            bands.into_par_iter()
                .for_each(|band| render_band(camera, world, band,
                    options.max_depth));
        });
    }

    info!("render finished in {:.2?}", start.elapsed());
    Ok(canvas)
}

fn render_band(camera: &Camera, world: &World, mut band: Band<'_>,
    max_depth: usize) {
    let rows = band.rows();

    for y in rows.clone() {
        for x in 0..band.width() {
            let ray = camera.ray_for_pixel(x, y);
            let color = world.color_at(&ray, max_depth);
            band.write_pixel(x, y, &color);
        }
    }

    debug!("rows {:?} done", rows);
}

#[cfg(test)]
fn test_camera(hsize: usize, vsize: usize) -> Camera {
    use nalgebra::{ Point3, Vector3 };
    use crate::transform::view_transform;

    let from = Point3::new(0.0, 0.0, -5.0);
    let to = Point3::new(0.0, 0.0, 0.0);
    let up = Vector3::new(0.0, 1.0, 0.0);

    Camera::new(hsize, vsize, std::f64::consts::PI / 2.0,
        view_transform(from, to, up)).unwrap()
}

#[test]
fn band_height_divides_rows_between_workers() {
    assert_eq!(band_height(12, 4), 3);
    assert_eq!(band_height(10, 3), 3);
}

#[test]
fn band_height_is_at_least_one_row() {
    assert_eq!(band_height(2, 8), 1);
    assert_eq!(band_height(0, 4), 1);
    assert_eq!(band_height(5, 0), 5);
}

#[test]
fn default_options() {
    let options = RenderOptions::default();

    assert!(options.workers >= 1);
    assert_eq!(options.max_depth, DEFAULT_RECURSION_DEPTH);
}

#[test]
fn render_rejects_zero_workers() {
    let w = crate::world::default_world();
    let c = test_camera(5, 5);
    let options = RenderOptions { workers: 0, ..Default::default() };

    assert!(matches!(render(&c, &w, &options), Err(RenderError::NoWorkers)));
}

#[test]
fn parallel_render_matches_serial_colors() {
    let w = crate::world::default_world();
    // 7 rows over 3 workers leaves a one-row remainder band.
    let c = test_camera(5, 7);
    let options = RenderOptions { workers: 3, ..Default::default() };

    let image = render(&c, &w, &options).unwrap();

    for y in 0..7 {
        for x in 0..5 {
            let expected = w.color_at(&c.ray_for_pixel(x, y),
                options.max_depth);
            assert_eq!(image.read_pixel(x, y), Some(expected));
        }
    }
}

#[test]
fn more_workers_than_rows() {
    let w = crate::world::default_world();
    let c = test_camera(3, 2);
    let options = RenderOptions { workers: 8, ..Default::default() };

    let image = render(&c, &w, &options).unwrap();
    assert_eq!((image.width, image.height), (3, 2));
}
