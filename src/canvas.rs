use std::io;
use std::io::{ BufWriter, Write };
use std::fs::File;
use std::ops::Range;
use std::path::Path;

use crate::color::Color;

/// Longest line allowed in a PPM file.
const PPM_LINE_WIDTH: usize = 70;

/// A canvas for drawing pixels.
///
/// The canvas stores the resultant colors for each pixel ray. Once rendering
/// finishes, the `Canvas` can be saved to an image file. Only plain PPM (P3)
/// images are supported.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored row by row.
    pixels: Vec<Color>,
}

/// A contiguous run of whole rows borrowed exclusively from a `Canvas`.
///
/// Bands handed out by `Canvas::bands_mut` never overlap, so each one can be
/// filled by a different thread.
#[derive(Debug)]
pub struct Band<'a> {
    first_row: usize,
    width: usize,
    pixels: &'a mut [Color],
}

impl<'a> Band<'a> {
    /// The canvas rows covered by this band.
    pub fn rows(&self) -> Range<usize> {
        let count = match self.width {
            0 => 0,
            width => self.pixels.len() / width,
        };

        self.first_row..self.first_row + count
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Writes a pixel using canvas coordinates. Pixels outside the band are
    /// ignored.
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || !self.rows().contains(&y) {
            return;
        }

        self.pixels[(y - self.first_row) * self.width + x] = *pixel;
    }
}

impl Canvas {
    /// Creates a new black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height],
        }
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `y` is the row of the pixel, and `x`
    /// is the column; both are zero-indexed.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use ray_tracer::color::Color;
    /// # use ray_tracer::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2), Some(purple));
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`, `None` if out of
    /// bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Splits the canvas into bands of `rows` rows each, top to bottom.
    ///
    /// If the height is not a multiple of `rows`, the last band holds the
    /// remaining rows. A `rows` of zero is treated as one.
    pub fn bands_mut(&mut self, rows: usize) -> Vec<Band<'_>> {
        let width = self.width;
        if width == 0 || self.height == 0 {
            return Vec::new();
        }

        let rows = rows.max(1);
        self.pixels.chunks_mut(width * rows)
            .enumerate()
            .map(|(i, pixels)| Band { first_row: i * rows, width, pixels })
            .collect()
    }

    /// Writes the canvas as a PPM (P3) image.
    ///
    /// Each row starts on a new line and no line exceeds 70 columns; longer
    /// rows wrap between color components.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?; // Maximum color value

        if self.width == 0 {
            return Ok(());
        }

        let mut line = String::with_capacity(PPM_LINE_WIDTH);
        for row in self.pixels.chunks(self.width) {
            for component in row.iter().flat_map(|p| p.to_bytes()) {
                let value = component.to_string();

                if !line.is_empty()
                    && line.len() + 1 + value.len() > PPM_LINE_WIDTH {
                    writeln!(out, "{}", line)?;
                    line.clear();
                }

                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&value);
            }

            writeln!(out, "{}", line)?;
            line.clear();
        }

        Ok(())
    }

    /// Saves a canvas to a PPM file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;
        out.flush()
    }
}

#[cfg(test)]
fn ppm_string(canvas: &Canvas) -> String {
    let mut buf = Vec::new();
    canvas.write_ppm(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn canvas_starts_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.width, 10);
    assert_eq!(c.height, 20);
    for y in 0..20 {
        for x in 0..10 {
            assert_eq!(c.read_pixel(x, y), Some(Color::black()));
        }
    }
}

#[test]
fn out_of_bounds_pixels_are_ignored() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(2, 0, &Color::white());
    c.write_pixel(0, 2, &Color::white());

    assert_eq!(c.read_pixel(2, 0), None);
    assert_eq!(c, Canvas::new(2, 2));
}

#[test]
fn ppm_header() {
    let c = Canvas::new(5, 3);
    let ppm = ppm_string(&c);
    let header: Vec<&str> = ppm.lines().take(3).collect();

    assert_eq!(header, vec!["P3", "5 3", "255"]);
}

#[test]
fn ppm_pixel_data_is_clamped() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let ppm = ppm_string(&c);
    let body: Vec<&str> = ppm.lines().skip(3).collect();

    assert_eq!(body, vec![
        "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
        "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0",
        "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255",
    ]);
}

#[test]
fn ppm_long_lines_are_split() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let ppm = ppm_string(&c);
    let body: Vec<&str> = ppm.lines().skip(3).collect();

    assert_eq!(body, vec![
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204",
        "153 255 204 153 255 204 153 255 204 153 255 204 153",
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204",
        "153 255 204 153 255 204 153 255 204 153 255 204 153",
    ]);
    assert!(body.iter().all(|line| line.len() <= PPM_LINE_WIDTH));
}

#[test]
fn ppm_ends_with_newline() {
    let c = Canvas::new(5, 3);

    assert!(ppm_string(&c).ends_with('\n'));
}

#[test]
fn bands_cover_rows_with_short_remainder() {
    let mut c = Canvas::new(4, 10);
    let rows: Vec<Range<usize>> = c.bands_mut(3).iter()
        .map(|band| band.rows())
        .collect();

    assert_eq!(rows, vec![0..3, 3..6, 6..9, 9..10]);
}

#[test]
fn band_writes_land_on_canvas() {
    let mut c = Canvas::new(3, 4);
    let red = Color::rgb(1.0, 0.0, 0.0);

    for mut band in c.bands_mut(2) {
        let first = band.rows().start;
        band.write_pixel(1, first, &red);
        // Outside this band's rows; ignored.
        band.write_pixel(0, first + 2, &red);
    }

    assert_eq!(c.read_pixel(1, 0), Some(red));
    assert_eq!(c.read_pixel(1, 2), Some(red));
    assert_eq!(c.read_pixel(0, 2), Some(Color::black()));
    assert_eq!(c.read_pixel(0, 0), Some(Color::black()));
}

#[test]
fn empty_canvas_has_no_bands() {
    let mut c = Canvas::new(0, 5);

    assert!(c.bands_mut(2).is_empty());
}
