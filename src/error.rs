use thiserror::Error;

/// Problems with the particle settings or the config file that holds them
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("canvas must be at least 1x1, got {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },
    #[error("particle size must be positive, got {0}")]
    InvalidParticleSize(f32),
    #[error("interaction radius must be positive, got {0}")]
    InvalidRadius(f32),
    #[error("restore divisor must be at least 1, got {0}")]
    InvalidRestoreDivisor(f32),
    #[error("image offset must be in [0, 1), got ({x}, {y})")]
    InvalidOffset { x: f32, y: f32 },
    #[error("sample max side must be at least 1")]
    InvalidSampleSide,
    #[error("failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures turning an image file into pixel data
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum SimulationError {
    #[error("particle system was already populated from an image")]
    AlreadyPopulated,
}

/// Anything that can stop the app from starting or resampling
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Image(#[from] ImageLoadError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
