use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The scene cannot render deterministically without a well-behaved noise field.
    #[error("noise source returned a non-finite sample at ({x}, {y}, {z})")]
    NonFiniteNoise { x: f64, y: f64, z: f64 },

    #[error("viewport {width}x{height} yields an empty grid")]
    EmptyGrid { width: u32, height: u32 },
}

pub type Result<T, E = SceneError> = std::result::Result<T, E>;
