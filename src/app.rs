use crate::braille::DotScale;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::sampler::PixelData;
use crate::settings::ParticleSettings;
use crate::simulation::{FrameStats, ParticleSystem};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::layout::Rect;

const MIN_PARTICLE_SIZE: f32 = 0.5;
const MAX_PARTICLE_SIZE: f32 = 8.0;
const RADIUS_STEP: f32 = 10.0;

/// Main application state
pub struct App {
    pub system: ParticleSystem,
    pub settings: ParticleSettings,
    pixels: PixelData,
    rng: StdRng,
    pub paused: bool,
    pub fullscreen_mode: bool,
    pub show_pointer: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub last_stats: FrameStats,
    /// One-line feedback shown in the sidebar
    pub status: Option<String>,
}

impl App {
    pub fn new(config: &AppConfig, pixels: PixelData) -> Result<Self, AppError> {
        let settings = config.settings.clone();
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let system = Self::build_system(&settings, &pixels, &mut rng)?;

        Ok(Self {
            system,
            settings,
            pixels,
            rng,
            paused: false,
            fullscreen_mode: config.fullscreen,
            show_pointer: config.show_pointer,
            show_help: false,
            help_scroll: 0,
            last_stats: FrameStats::default(),
            status: None,
        })
    }

    fn build_system(
        settings: &ParticleSettings,
        pixels: &PixelData,
        rng: &mut StdRng,
    ) -> Result<ParticleSystem, AppError> {
        let mut system = ParticleSystem::new(settings)?;
        system.populate(pixels, rng)?;
        Ok(system)
    }

    /// Advance the simulation one frame
    pub fn tick(&mut self) {
        if !self.paused {
            self.last_stats = self.system.step();
        }
    }

    /// Forward a mouse position (terminal coordinates) if it lies on the canvas
    pub fn pointer_at(&mut self, column: u16, row: u16, canvas: Rect) {
        if column < canvas.x
            || row < canvas.y
            || column >= canvas.x + canvas.width
            || row >= canvas.y + canvas.height
        {
            return;
        }
        let scale = DotScale::new(
            canvas.width,
            canvas.height,
            self.system.width,
            self.system.height,
        );
        let (x, y) = scale.cell_to_canvas(column - canvas.x, row - canvas.y);
        self.system.set_pointer(x, y);
    }

    /// Resample the image into a fresh system with the current settings
    pub fn reset(&mut self) {
        match Self::build_system(&self.settings, &self.pixels, &mut self.rng) {
            Ok(system) => {
                self.status = Some(format!("{} particles", system.particles().len()));
                self.system = system;
                self.last_stats = FrameStats::default();
            }
            Err(err) => {
                tracing::warn!(%err, "resample failed, keeping current system");
                self.status = Some(err.to_string());
            }
        }
    }

    /// Change particle size and resample
    pub fn adjust_particle_size(&mut self, delta: f32) {
        let size = (self.settings.particle_size + delta).clamp(MIN_PARTICLE_SIZE, MAX_PARTICLE_SIZE);
        if size != self.settings.particle_size {
            self.settings.particle_size = size;
            self.reset();
        }
    }

    /// Grow or shrink the interaction radius and rebuild the grid
    pub fn adjust_radius(&mut self, steps: i32) {
        let current = self.settings.effective_radius();
        let radius = (current + steps as f32 * RADIUS_STEP).max(RADIUS_STEP);
        if radius != current {
            self.settings.interaction_radius = Some(radius);
            self.reset();
        }
    }

    /// Write the current settings to the default config location
    pub fn save_config(&mut self) {
        let config = AppConfig {
            settings: self.settings.clone(),
            fullscreen: self.fullscreen_mode,
            show_pointer: self.show_pointer,
            ..AppConfig::default()
        };
        self.status = Some(match AppConfig::default_path() {
            Some(path) => match config.save_to_file(&path) {
                Ok(()) => format!("saved {}", path.display()),
                Err(err) => err.to_string(),
            },
            None => "no config directory".to_string(),
        });
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_pointer_marker(&mut self) {
        self.show_pointer = !self.show_pointer;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }
}
