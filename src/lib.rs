//! Layered ASCII scene compositor with incremental redraw.
//!
//! Content generators write sparse cells into z-ordered layers, the renderer
//! flattens the touched coordinates and diffs them against what is presented,
//! and a presenter applies only the resulting changes.

pub mod config;
pub mod engine;
pub mod error;
pub mod layers;
pub mod noise;
pub mod player;
pub mod renderer;
pub mod scheduler;
pub mod types;
