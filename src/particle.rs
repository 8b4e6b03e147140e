use serde::{Deserialize, Serialize};

/// Color sampled from the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Grid cell a particle is registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAddress {
    Inside { row: usize, col: usize },
    /// Off the canvas; the particle belongs to no cell
    Outside,
}

/// Range of the per-particle density draw
pub const DENSITY_RANGE: std::ops::Range<f32> = 1.0..31.0;

/// Strength of the pointer push at squared distance `dist_sq`.
///
/// 1.0 on top of the pointer, falling linearly in `dist_sq` to 0.0 at the
/// interaction radius. Slightly negative just past the radius, which the
/// `+ radius²` allowance in [`Particle::repel`] lets through.
pub fn repulsion_force(dist_sq: f32, max_distance_squared: f32) -> f32 {
    1.0 - dist_sq / max_distance_squared
}

fn pull_toward(value: f32, rest: f32, divisor: f32) -> f32 {
    let next = value - (value - rest) / divisor;
    if next == value {
        rest
    } else {
        next
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    x: f32,
    y: f32,
    base_x: f32,
    base_y: f32,
    pub color: Rgb,
    pub radius: f32,
    pub density: f32,
    cell: CellAddress,
}

impl Particle {
    /// Create a particle resting at `(x, y)`. The cell starts as `Outside`
    /// until the grid registers it.
    pub fn new(x: f32, y: f32, color: Rgb, radius: f32, density: f32) -> Self {
        Self {
            x,
            y,
            base_x: x,
            base_y: y,
            color,
            radius,
            density,
            cell: CellAddress::Outside,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Grid cell this particle is registered in
    pub fn cell(&self) -> CellAddress {
        self.cell
    }

    /// Record the grid cell. Only the owning system's grid bookkeeping calls
    /// this, right after moving the membership.
    pub(crate) fn set_cell(&mut self, cell: CellAddress) {
        self.cell = cell;
    }

    pub fn rest_position(&self) -> (f32, f32) {
        (self.base_x, self.base_y)
    }

    pub fn is_at_rest(&self) -> bool {
        (self.x, self.y) == self.rest_position()
    }

    /// Pull 1/`divisor` of the remaining distance back toward the rest position.
    /// Returns true if the position changed.
    ///
    /// An axis whose pull rounds away to nothing snaps onto its rest
    /// coordinate, so a released particle always comes fully to rest.
    pub fn restore(&mut self, divisor: f32) -> bool {
        let (old_x, old_y) = (self.x, self.y);
        self.x = pull_toward(self.x, self.base_x, divisor);
        self.y = pull_toward(self.y, self.base_y, divisor);
        self.x != old_x || self.y != old_y
    }

    /// Push away from the pointer if within range. Returns true if the particle
    /// was in range and got displaced.
    pub fn repel(
        &mut self,
        pointer_x: f32,
        pointer_y: f32,
        interaction_radius: f32,
        max_distance_squared: f32,
    ) -> bool {
        let dx = pointer_x - self.x;
        let dy = pointer_y - self.y;
        let dist_sq = dx * dx + dy * dy;

        if dist_sq >= max_distance_squared + self.radius * self.radius {
            return false;
        }

        let force = repulsion_force(dist_sq, max_distance_squared);
        self.x -= (dx / interaction_radius) * force * self.density;
        self.y -= (dy / interaction_radius) * force * self.density;
        true
    }

    /// Distance to the rest position
    pub fn displacement(&self) -> f32 {
        let dx = self.x - self.base_x;
        let dy = self.y - self.base_y;
        (dx * dx + dy * dy).sqrt()
    }
}
