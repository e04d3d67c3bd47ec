//! Content generators and their tick implementations.
//!
//! Each generator lives in its own module with its state and `Generate`
//! implementation side by side. A generator owns exactly one layer.

mod stars;
mod sun;

pub use stars::{Star, StarField, StarParams};
pub use sun::Sun;

use crate::error::Result;
use crate::layers::{LayerId, LayerStore};
use crate::noise::NoiseSource;

use super::Grid;

/// Everything a generator may read during one tick.
pub struct TickContext<'a> {
    pub grid: Grid,
    /// Accumulated simulation time.
    pub time: f64,
    pub noise: &'a dyn NoiseSource,
}

/// Advance a generator by one tick, writing its content into its layer.
pub trait Generate {
    fn layer(&self) -> LayerId;
    fn tick(&mut self, ctx: &TickContext<'_>, store: &mut LayerStore) -> Result<()>;
}
