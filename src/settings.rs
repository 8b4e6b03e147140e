use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Fraction of the canvas left empty around the image, split evenly between both edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageOffset {
    pub x: f32,
    pub y: f32,
}

impl Default for ImageOffset {
    fn default() -> Self {
        Self { x: 0.2, y: 0.2 }
    }
}

/// All particle system settings consolidated into one struct
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    // === Canvas ===
    /// Canvas width in simulation pixels
    pub width: f32,
    /// Canvas height in simulation pixels
    pub height: f32,

    // === Particles ===
    /// Drawn radius of every particle
    pub particle_size: f32,
    /// Explicit particle count; `None` derives a budget from canvas area
    pub particle_count: Option<usize>,
    /// Pointer reach and grid cell size; `None` uses (width + height) / 12
    pub interaction_radius: Option<f32>,
    /// Inset of the image from the canvas borders
    pub image_offset: ImageOffset,
    /// Decoded images are downscaled so their longer side fits this
    pub sample_max_side: u32,

    // === Physics ===
    /// Fraction (1 / divisor) of the remaining distance recovered each frame
    pub restore_divisor: f32,
    /// Seed for the sampling RNG, for reproducible particle selection
    pub seed: Option<u64>,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            particle_size: 2.0,
            particle_count: None,
            interaction_radius: None,
            image_offset: ImageOffset::default(),
            sample_max_side: 768,
            restore_divisor: 15.0,
            seed: None,
        }
    }
}

impl ParticleSettings {
    /// The radius actually used by the simulation
    pub fn effective_radius(&self) -> f32 {
        self.interaction_radius
            .unwrap_or((self.width + self.height) / 12.0)
    }

    /// Reject settings that would divide by zero or build an empty grid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !(positive(self.width) && positive(self.height)) {
            return Err(ConfigError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if !positive(self.particle_size) {
            return Err(ConfigError::InvalidParticleSize(self.particle_size));
        }
        let radius = self.effective_radius();
        if !positive(radius) {
            return Err(ConfigError::InvalidRadius(radius));
        }
        if !(self.restore_divisor.is_finite() && self.restore_divisor >= 1.0) {
            return Err(ConfigError::InvalidRestoreDivisor(self.restore_divisor));
        }
        let offset_ok = |v: f32| (0.0..1.0).contains(&v);
        if !(offset_ok(self.image_offset.x) && offset_ok(self.image_offset.y)) {
            return Err(ConfigError::InvalidOffset {
                x: self.image_offset.x,
                y: self.image_offset.y,
            });
        }
        if self.sample_max_side == 0 {
            return Err(ConfigError::InvalidSampleSide);
        }
        Ok(())
    }
}
