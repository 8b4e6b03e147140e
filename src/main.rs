mod app;
mod braille;
mod config;
mod error;
mod grid;
mod image_source;
mod particle;
mod sampler;
mod settings;
mod simulation;
mod ui;

use app::App;
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "particlify")]
#[command(about = "Scatter an image into particles with your mouse, in the terminal")]
struct Args {
    /// Image to particlify (any format the image crate can decode)
    image: PathBuf,

    // === Canvas ===
    /// Canvas width in simulation pixels
    #[arg(long)]
    width: Option<f32>,

    /// Canvas height in simulation pixels
    #[arg(long)]
    height: Option<f32>,

    /// Size the canvas to the terminal (one simulation pixel per braille dot)
    #[arg(long, conflicts_with_all = ["width", "height"])]
    fit: bool,

    // === Particles ===
    /// Particle radius in simulation pixels
    #[arg(short = 's', long)]
    size: Option<f32>,

    /// Explicit particle count (default: derived from canvas area, max 15000)
    #[arg(short = 'c', long)]
    count: Option<usize>,

    /// Pointer interaction radius (default: (width + height) / 12)
    #[arg(short = 'r', long)]
    radius: Option<f32>,

    /// Inset of the image from the canvas edges, as a fraction (0.0-0.99)
    #[arg(long)]
    offset: Option<f32>,

    /// Downscale the image so its longer side is at most this many pixels
    #[arg(long = "max-side")]
    max_side: Option<u32>,

    /// Seed for reproducible particle sampling
    #[arg(long)]
    seed: Option<u64>,

    // === App ===
    /// Config file to load (default: <config dir>/particlify/config.json if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to this path before starting
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Start without the sidebar
    #[arg(long)]
    fullscreen: bool,
}

/// Route tracing output to a file; the terminal is busy with the UI
fn init_logging(path: &Path) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Merge file config with CLI overrides
fn resolve_config(args: &Args) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_default()?,
    };

    let settings = &mut config.settings;
    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(height) = args.height {
        settings.height = height;
    }
    if let Some(size) = args.size {
        settings.particle_size = size;
    }
    if args.count.is_some() {
        settings.particle_count = args.count;
    }
    if args.radius.is_some() {
        settings.interaction_radius = args.radius;
    }
    if let Some(offset) = args.offset {
        settings.image_offset.x = offset;
        settings.image_offset.y = offset;
    }
    if let Some(max_side) = args.max_side {
        settings.sample_max_side = max_side;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if args.fullscreen {
        config.fullscreen = true;
    }

    if args.fit {
        let (cols, rows) = crossterm::terminal::size()?;
        let canvas = ui::canvas_area(Rect::new(0, 0, cols, rows), config.fullscreen);
        let (width, height) = braille::calculate_canvas_size(canvas.width, canvas.height);
        config.settings.width = width;
        config.settings.height = height;
    }

    config.settings.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = resolve_config(&args)?;
    if let Some(path) = &args.save_config {
        config.save_to_file(path)?;
    }

    // Decode and sample before touching the terminal so errors print normally
    let pixels = image_source::load_pixels(&args.image, config.settings.sample_max_side)?;
    let mut app = App::new(&config, pixels)?;
    tracing::info!(
        image = %args.image.display(),
        particles = app.system.particles().len(),
        "starting"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(%err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    let mut next_frame = Instant::now();
    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Drain every event that arrives before the next frame is due
        loop {
            let timeout = next_frame.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                break;
            }
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') => app.toggle_pointer_marker(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_config(),
                        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_particle_size(0.5),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_particle_size(-0.5),
                        KeyCode::Char(']') => app.adjust_radius(1),
                        KeyCode::Char('[') => app.adjust_radius(-1),
                        KeyCode::Char('j') | KeyCode::Char('J') | KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') | KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                        let size = terminal.size()?;
                        let canvas = ui::canvas_area(
                            Rect::new(0, 0, size.width, size.height),
                            app.fullscreen_mode,
                        );
                        app.pointer_at(mouse.column, mouse.row, canvas);
                    }
                }
                _ => {}
            }
        }

        // Run simulation tick
        app.tick();
        next_frame = Instant::now() + FRAME_DURATION;
    }
}
