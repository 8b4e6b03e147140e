use crate::error::ImageLoadError;
use crate::particle::{Particle, Rgb, DENSITY_RANGE};
use crate::settings::ImageOffset;
use rand::Rng;

/// Pixels with alpha above this become particle candidates
pub const ALPHA_THRESHOLD: u8 = 128;

/// Canvas pixels per particle footprint when no count is given
const AUTO_DENSITY_FACTOR: f32 = 6.0;

/// Hard ceiling for the automatic budget, bounds per-frame cost
pub const MAX_AUTO_PARTICLES: usize = 15_000;

/// Decoded image as a flat row-major RGBA buffer
#[derive(Debug, Clone)]
pub struct PixelData {
    pub width: u32,
    pub height: u32,
    rgba: Vec<u8>,
}

impl PixelData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ImageLoadError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ImageLoadError::BufferSize {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// RGBA quadruple at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        ]
    }
}

/// Canvas geometry and particle look for one sampling pass
#[derive(Debug, Clone, Copy)]
pub struct SampleParams {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub particle_size: f32,
    pub particle_count: Option<usize>,
    pub offset: ImageOffset,
}

pub fn count_opaque(pixels: &PixelData) -> usize {
    pixels
        .rgba
        .chunks_exact(4)
        .filter(|px| px[3] > ALPHA_THRESHOLD)
        .count()
}

/// Number of particles to aim for.
///
/// An explicit count is honored up to the opaque pixel count. Otherwise the
/// budget is one particle per `size² * 6` canvas pixels, capped by the opaque
/// pixel count and [`MAX_AUTO_PARTICLES`].
pub fn particle_budget(
    opaque: usize,
    canvas_width: f32,
    canvas_height: f32,
    particle_size: f32,
    explicit: Option<usize>,
) -> usize {
    match explicit {
        Some(count) => count.min(opaque),
        None => {
            let footprint = particle_size * particle_size * AUTO_DENSITY_FACTOR;
            let area_cap = ((canvas_width * canvas_height) / footprint).floor() as usize;
            opaque.min(area_cap).min(MAX_AUTO_PARTICLES)
        }
    }
}

/// Map a pixel coordinate on one axis onto the canvas, inset by `offset`
fn to_canvas(coord: u32, image_extent: u32, canvas_extent: f32, offset: f32) -> f32 {
    // f32 loses the exact product on ratios like 21/40 * 800 and floors one low
    let scaled = ((coord as f64 / image_extent as f64) * canvas_extent as f64).floor() as f32;
    canvas_extent * (offset / 2.0) + scaled * (1.0 - offset)
}

/// Turn opaque pixels into particles, in raster order.
///
/// When the budget is below the opaque pixel count each pixel is kept with
/// probability `budget / opaque` and the walk stops once the budget is
/// filled, so the result never exceeds the budget.
pub fn sample<R: Rng>(
    pixels: &PixelData,
    params: &SampleParams,
    rng: &mut R,
) -> Vec<Particle> {
    let opaque = count_opaque(pixels);
    let budget = particle_budget(
        opaque,
        params.canvas_width,
        params.canvas_height,
        params.particle_size,
        params.particle_count,
    );
    if budget == 0 {
        return Vec::new();
    }

    let downsample = budget < opaque;
    let keep_probability = budget as f64 / opaque as f64;
    let mut particles = Vec::with_capacity(budget);

    'raster: for y in 0..pixels.height {
        for x in 0..pixels.width {
            if particles.len() == budget {
                break 'raster;
            }
            let [r, g, b, a] = pixels.pixel(x, y);
            if a <= ALPHA_THRESHOLD {
                continue;
            }
            if downsample && !rng.gen_bool(keep_probability) {
                continue;
            }

            let pos_x = to_canvas(x, pixels.width, params.canvas_width, params.offset.x);
            let pos_y = to_canvas(y, pixels.height, params.canvas_height, params.offset.y);
            let density = rng.gen_range(DENSITY_RANGE);

            particles.push(Particle::new(
                pos_x,
                pos_y,
                Rgb::new(r, g, b),
                params.particle_size,
                density,
            ));
        }
    }

    particles
}
