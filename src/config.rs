use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Longest accepted star animation delay, in seconds.
pub const MAX_STAR_DELAY_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunShading {
    /// Concentric glyph shells with noise-driven flares.
    #[default]
    Radial,
    /// A hollow glyph silhouette with a glow effect.
    Outline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Simulation time advanced per wall-clock second.
    pub game_speed: f64,
    /// Diameter of the sun's bounding box, in cells. Must be odd.
    pub sun_size: u16,
    pub sun_shading: SunShading,
    /// 2D noise level above which a grid cell gets a star.
    pub star_density: f64,
    /// 3D noise level above which a star shows its bright glyph.
    pub twinkle_threshold: f64,
    /// How many times per unit of simulation time the star field re-samples.
    pub noise_rate_hz: f64,
    /// Upper bound (exclusive) of a star's animation delay, in seconds.
    pub star_delay_max: f64,
    pub target_fps: u32,
    /// Viewport units per grid column.
    pub cell_width: u32,
    /// Viewport units per grid row.
    pub cell_height: u32,
    pub resize_debounce_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            game_speed: 0.025,
            sun_size: 15,
            sun_shading: SunShading::default(),
            star_density: 0.85,
            twinkle_threshold: 0.08,
            noise_rate_hz: 2.0,
            star_delay_max: 20.0,
            target_fps: 30,
            cell_width: 1,
            cell_height: 1,
            resize_debounce_ms: 250,
            seed: None,
        }
    }
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SceneConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let invalid = |msg: String| Err(SceneError::InvalidConfig(msg));

        if self.sun_size % 2 == 0 {
            return invalid(format!("sun_size must be odd, got {}", self.sun_size));
        }
        if self.target_fps == 0 {
            return invalid("target_fps must be positive".into());
        }
        if self.cell_width == 0 || self.cell_height == 0 {
            return invalid("cell_width and cell_height must be positive".into());
        }
        for (name, value) in [
            ("game_speed", self.game_speed),
            ("star_density", self.star_density),
            ("twinkle_threshold", self.twinkle_threshold),
        ] {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite"));
            }
        }
        if !(self.noise_rate_hz.is_finite() && self.noise_rate_hz > 0.0) {
            return invalid("noise_rate_hz must be positive".into());
        }
        if !(0.0..=MAX_STAR_DELAY_SECS).contains(&self.star_delay_max) {
            return invalid(format!(
                "star_delay_max must be between 0 and {MAX_STAR_DELAY_SECS}, got {}",
                self.star_delay_max
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}
