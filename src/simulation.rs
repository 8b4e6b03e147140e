use crate::error::{ConfigError, SimulationError};
use crate::grid::SpatialGrid;
use crate::particle::{CellAddress, Particle, Rgb};
use crate::sampler::{self, PixelData, SampleParams};
use crate::settings::ParticleSettings;
use rand::Rng;

/// Latest pointer position reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
    /// Set by `set_pointer`, cleared at the end of every step
    pub moved: bool,
}

/// What the renderer needs for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    pub radius: f32,
}

/// Per-frame activity summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Particles pushed by the pointer this frame
    pub repelled: usize,
    /// Particles pulled back toward rest this frame
    pub restored: usize,
}

/// Image particle system state
pub struct ParticleSystem {
    pub width: f32,
    pub height: f32,
    pub particle_size: f32,
    pub interaction_radius: f32,
    max_distance_squared: f32,
    restore_divisor: f32,
    settings: ParticleSettings,
    grid: SpatialGrid,
    particles: Vec<Particle>,
    pointer: Pointer,
    populated: bool,
    pub frames: u64,
}

impl ParticleSystem {
    pub fn new(settings: &ParticleSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let radius = settings.effective_radius();
        let grid = SpatialGrid::new(settings.width, settings.height, radius);
        tracing::info!(
            width = settings.width,
            height = settings.height,
            radius,
            rows = grid.rows,
            cols = grid.cols,
            "created particle system"
        );

        Ok(Self {
            width: settings.width,
            height: settings.height,
            particle_size: settings.particle_size,
            interaction_radius: radius,
            max_distance_squared: radius * radius,
            restore_divisor: settings.restore_divisor,
            settings: settings.clone(),
            grid,
            particles: Vec::new(),
            pointer: Pointer::default(),
            populated: false,
            frames: 0,
        })
    }

    /// Sample `pixels` into the particle population. Only allowed once;
    /// build a new system to resample.
    pub fn populate<R: Rng>(
        &mut self,
        pixels: &PixelData,
        rng: &mut R,
    ) -> Result<usize, SimulationError> {
        if self.populated {
            return Err(SimulationError::AlreadyPopulated);
        }

        let params = SampleParams {
            canvas_width: self.width,
            canvas_height: self.height,
            particle_size: self.particle_size,
            particle_count: self.settings.particle_count,
            offset: self.settings.image_offset,
        };
        self.insert_population(sampler::sample(pixels, &params, rng));

        tracing::info!(
            image_width = pixels.width,
            image_height = pixels.height,
            opaque = sampler::count_opaque(pixels),
            particles = self.particles.len(),
            "populated particle system"
        );
        Ok(self.particles.len())
    }

    /// Take ownership of a sampled population and register it in the grid
    fn insert_population(&mut self, particles: Vec<Particle>) {
        self.particles = particles;
        for (index, particle) in self.particles.iter_mut().enumerate() {
            let (x, y) = particle.position();
            let address = self.grid.address_for(x, y);
            self.grid.add(address, index);
            particle.set_cell(address);
        }
        self.populated = true;
    }

    /// Record the pointer position for the next step. Last write wins.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Pointer { x, y, moved: true };
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    /// Advance one frame: repel particles near a moved pointer, pull every
    /// displaced particle back toward rest, then consume the pointer flag.
    pub fn step(&mut self) -> FrameStats {
        let mut stats = FrameStats::default();
        if !self.populated {
            return stats;
        }

        if self.pointer.moved {
            let (row, col) = self.grid.cell_for(self.pointer.x, self.pointer.y);
            // Snapshot of the 3x3 block: each particle is pushed at most once per
            // frame, even when the push carries it into a cell not yet visited
            let nearby = self.grid.particles_near(row, col);
            for index in nearby {
                let particle = &mut self.particles[index];
                if particle.repel(
                    self.pointer.x,
                    self.pointer.y,
                    self.interaction_radius,
                    self.max_distance_squared,
                ) {
                    stats.repelled += 1;
                    self.reindex(index);
                }
            }
        }

        for index in 0..self.particles.len() {
            let particle = &mut self.particles[index];
            if particle.is_at_rest() {
                continue;
            }
            if particle.restore(self.restore_divisor) {
                stats.restored += 1;
                self.reindex(index);
            }
        }

        self.pointer.moved = false;
        self.frames += 1;
        stats
    }

    /// Move particle `index` to the grid cell matching its current position
    fn reindex(&mut self, index: usize) {
        let particle = &mut self.particles[index];
        let (x, y) = particle.position();
        let address = self.grid.address_for(x, y);
        if address == particle.cell() {
            return;
        }
        self.grid.remove(particle.cell(), index);
        self.grid.add(address, index);
        particle.set_cell(address);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Draw commands in population order
    pub fn draw_commands(&self) -> impl Iterator<Item = DrawCommand> + '_ {
        self.particles.iter().map(|p| {
            let (x, y) = p.position();
            DrawCommand {
                x,
                y,
                color: p.color,
                radius: p.radius,
            }
        })
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Particles not sitting at their rest position
    pub fn displaced_count(&self) -> usize {
        self.particles.iter().filter(|p| !p.is_at_rest()).count()
    }

    /// Largest distance any particle currently is from its rest position
    pub fn max_displacement(&self) -> f32 {
        self.particles
            .iter()
            .map(Particle::displacement)
            .fold(0.0, f32::max)
    }

    /// Particles pushed off the canvas, invisible to pointer queries
    pub fn off_canvas_count(&self) -> usize {
        self.particles.len() - self.grid.len()
    }

    /// Check that every particle is registered in exactly the cell its position maps to
    #[cfg(test)]
    pub fn check_grid_consistency(&self) -> Result<(), String> {
        let mut members = 0;
        for (index, particle) in self.particles.iter().enumerate() {
            let (x, y) = particle.position();
            let expected = self.grid.address_for(x, y);
            if particle.cell() != expected {
                return Err(format!(
                    "particle {} at ({}, {}) stores {:?}, expected {:?}",
                    index,
                    x,
                    y,
                    particle.cell(),
                    expected
                ));
            }
            if let CellAddress::Inside { .. } = expected {
                if !self.grid.contains(expected, index) {
                    return Err(format!("particle {} missing from {:?}", index, expected));
                }
                members += 1;
            }
        }
        if self.grid.len() != members {
            return Err(format!(
                "grid holds {} memberships, expected {}",
                self.grid.len(),
                members
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ImageOffset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(width: f32, height: f32, radius: f32) -> ParticleSettings {
        ParticleSettings {
            width,
            height,
            interaction_radius: Some(radius),
            ..Default::default()
        }
    }

    fn opaque_pixels(width: u32, height: u32) -> PixelData {
        let mut buf = Vec::new();
        for i in 0..(width * height) {
            buf.extend_from_slice(&[(i % 256) as u8, 50, 100, 255]);
        }
        PixelData::new(width, height, buf).unwrap()
    }

    /// One opaque pixel at the top-left of a 10x10 image lands at (10, 10) on a
    /// 100x100 canvas with the default inset
    fn single_particle_system() -> ParticleSystem {
        let mut buf = vec![0u8; 10 * 10 * 4];
        buf[..4].copy_from_slice(&[255, 0, 0, 255]);
        let pixels = PixelData::new(10, 10, buf).unwrap();

        let mut system = ParticleSystem::new(&settings(100.0, 100.0, 50.0)).unwrap();
        system.populate(&pixels, &mut StdRng::seed_from_u64(5)).unwrap();
        system
    }

    #[test]
    fn test_rejects_degenerate_canvas() {
        assert!(ParticleSystem::new(&settings(0.0, 100.0, 50.0)).is_err());
        assert!(ParticleSystem::new(&settings(100.0, 100.0, 0.0)).is_err());
    }

    #[test]
    fn test_default_radius_from_canvas() {
        let system = ParticleSystem::new(&ParticleSettings {
            width: 800.0,
            height: 400.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(system.interaction_radius, 100.0);
        assert_eq!((system.grid().rows, system.grid().cols), (4, 8));
    }

    #[test]
    fn test_inert_before_population() {
        let mut system = ParticleSystem::new(&settings(100.0, 100.0, 50.0)).unwrap();
        system.set_pointer(10.0, 10.0);
        assert_eq!(system.step(), FrameStats::default());
        assert!(system.particles().is_empty());
        assert!(!system.is_populated());
        assert_eq!(system.frames, 0);
    }

    #[test]
    fn test_populate_only_once() {
        let mut system = ParticleSystem::new(&settings(800.0, 500.0, 50.0)).unwrap();
        let pixels = opaque_pixels(10, 10);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(system.populate(&pixels, &mut rng), Ok(100));
        assert_eq!(
            system.populate(&pixels, &mut rng),
            Err(SimulationError::AlreadyPopulated)
        );
        assert_eq!(system.particles().len(), 100);
        system.check_grid_consistency().unwrap();
    }

    #[test]
    fn test_single_particle_starts_in_first_cell() {
        let system = single_particle_system();
        assert_eq!((system.grid().rows, system.grid().cols), (2, 2));
        let p = &system.particles()[0];
        assert_eq!(p.position(), (10.0, 10.0));
        assert_eq!(p.cell(), CellAddress::Inside { row: 0, col: 0 });
    }

    #[test]
    fn test_pointer_flag_is_consumed() {
        let mut system = single_particle_system();
        system.set_pointer(30.0, 30.0);
        system.set_pointer(12.0, 10.0);
        assert_eq!(system.pointer(), Pointer { x: 12.0, y: 10.0, moved: true });
        system.step();
        assert!(!system.pointer().moved);
        assert_eq!(system.frames, 1);
    }

    #[test]
    fn test_pointer_push_and_recovery() {
        let mut system = single_particle_system();
        let density = system.particles()[0].density;

        system.set_pointer(20.0, 10.0);
        let stats = system.step();
        assert_eq!(stats.repelled, 1);
        assert_eq!(stats.restored, 1);

        // dx = 10, force = 1 - 100/2500; push left, then 1/15 back
        let pushed = 10.0 - (10.0 / 50.0) * (1.0 - 100.0 / 2500.0) * density;
        let restored = pushed - (pushed - 10.0) / 15.0;
        let (x, y) = system.particles()[0].position();
        assert!((x - restored).abs() < 1e-4, "x = {}, expected {}", x, restored);
        assert_eq!(y, 10.0);
        system.check_grid_consistency().unwrap();

        // Pointer still: only the restoring force acts
        for _ in 0..400 {
            let stats = system.step();
            assert_eq!(stats.repelled, 0);
            system.check_grid_consistency().unwrap();
        }
        let p = &system.particles()[0];
        assert!(p.displacement() < 1e-3);
        assert!(p.position().0 <= 10.0, "overshot rest position: {:?}", p.position());
    }

    #[test]
    fn test_particle_leaving_canvas_drops_out_of_grid() {
        let mut system = ParticleSystem::new(&settings(100.0, 100.0, 50.0)).unwrap();
        system.insert_population(vec![Particle::new(5.0, 10.0, Rgb::default(), 2.0, 30.0)]);
        assert_eq!(system.grid().len(), 1);

        // Strongest push sits at radius / sqrt(3): 0.385 * density to the left
        system.set_pointer(5.0 + 50.0 / 3.0_f32.sqrt(), 10.0);
        system.step();
        let p = &system.particles()[0];
        assert!(p.position().0 < 0.0, "particle still on canvas at {:?}", p.position());
        assert_eq!(p.cell(), CellAddress::Outside);
        assert_eq!(system.grid().len(), 0);
        system.check_grid_consistency().unwrap();

        // Out of reach of pointer queries, the restoring force brings it home
        for _ in 0..200 {
            system.step();
        }
        system.check_grid_consistency().unwrap();
        assert_eq!(
            system.particles()[0].cell(),
            CellAddress::Inside { row: 0, col: 0 }
        );
    }

    #[test]
    fn test_scattered_particles_come_fully_to_rest() {
        let mut system = ParticleSystem::new(&settings(400.0, 400.0, 50.0)).unwrap();
        system
            .populate(&opaque_pixels(8, 8), &mut StdRng::seed_from_u64(2))
            .unwrap();

        system.set_pointer(75.0, 75.0);
        system.step();
        assert!(system.displaced_count() > 0);

        for _ in 0..5000 {
            system.step();
        }
        assert_eq!(system.displaced_count(), 0);
        assert_eq!(system.max_displacement(), 0.0);
        assert_eq!(system.step(), FrameStats::default());
        system.check_grid_consistency().unwrap();
    }

    #[test]
    fn test_far_particles_are_not_repelled() {
        let mut system = ParticleSystem::new(&settings(400.0, 400.0, 50.0)).unwrap();
        system
            .populate(&opaque_pixels(8, 8), &mut StdRng::seed_from_u64(2))
            .unwrap();

        // Rest positions sit on a 40px lattice starting at (40, 40)
        system.set_pointer(45.0, 45.0);
        let stats = system.step();
        assert!(stats.repelled > 0);
        for p in system.particles() {
            let (rx, ry) = p.rest_position();
            if rx >= 100.0 || ry >= 100.0 {
                assert!(p.is_at_rest(), "far particle moved: {:?}", (rx, ry));
            }
        }
        system.check_grid_consistency().unwrap();
    }

    #[test]
    fn test_grid_stays_consistent_under_random_pointer() {
        let mut system = ParticleSystem::new(&ParticleSettings {
            width: 300.0,
            height: 200.0,
            interaction_radius: Some(40.0),
            image_offset: ImageOffset { x: 0.0, y: 0.0 },
            ..Default::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        system.populate(&opaque_pixels(30, 20), &mut rng).unwrap();

        for frame in 0..300 {
            if frame % 3 != 0 {
                let x = rng.gen_range(-20.0..320.0);
                let y = rng.gen_range(-20.0..220.0);
                system.set_pointer(x, y);
            }
            system.step();
            system.check_grid_consistency().unwrap();
        }
    }

    #[test]
    fn test_draw_commands_follow_population_order() {
        let mut system = ParticleSystem::new(&settings(800.0, 500.0, 50.0)).unwrap();
        system
            .populate(&opaque_pixels(4, 4), &mut StdRng::seed_from_u64(8))
            .unwrap();
        let reds: Vec<u8> = system.draw_commands().map(|c| c.color.r).collect();
        assert_eq!(reds, (0..16).collect::<Vec<u8>>());
        assert!(system.draw_commands().all(|c| c.radius == 2.0));
    }

    #[test]
    fn test_empty_population_still_steps() {
        let mut system = ParticleSystem::new(&settings(100.0, 100.0, 50.0)).unwrap();
        let pixels = PixelData::new(4, 4, vec![0; 64]).unwrap();
        assert_eq!(system.populate(&pixels, &mut StdRng::seed_from_u64(0)), Ok(0));
        system.set_pointer(50.0, 50.0);
        assert_eq!(system.step(), FrameStats::default());
        assert_eq!(system.frames, 1);
    }
}
