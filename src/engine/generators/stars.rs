use std::time::Duration;

use rand::Rng;

use crate::error::{Result, SceneError};
use crate::layers::{LayerId, LayerStore};
use crate::noise::{NoiseSource, checked_sample2, checked_sample3};
use crate::types::{Cell, Coord, Effects};

use super::super::Grid;
use super::{Generate, TickContext};

const DIM: char = '.';
const BRIGHT: char = '*';

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarParams {
    /// 2D noise level a grid cell must exceed to hold a star.
    pub density: f64,
    /// 3D noise level a star must exceed to show its bright glyph.
    pub twinkle: f64,
    /// Samples per unit of simulation time.
    pub rate_hz: f64,
    /// Exclusive upper bound of the per-star animation delay, in seconds.
    pub delay_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub coord: Coord,
    pub delay: Duration,
    /// Glyph last written to the layer.
    pub glyph: char,
}

impl Star {
    fn cell(&self) -> Cell {
        Cell::new(self.glyph)
            .with_effects(Effects::SLOW_FADING)
            .with_delay(self.delay)
    }
}

#[derive(Debug, Clone)]
pub struct StarField {
    params: StarParams,
    stars: Vec<Star>,
}

impl StarField {
    /// Scatter stars over the grid and write them, dim, into the stars layer.
    ///
    /// Placement depends only on the noise field and the grid; delays come
    /// from `rng`, so a seeded rng makes the whole field reproducible.
    pub fn generate(
        params: StarParams,
        grid: Grid,
        noise: &dyn NoiseSource,
        rng: &mut impl Rng,
        store: &mut LayerStore,
    ) -> Result<Self> {
        let mut stars = Vec::new();

        for x in 0..grid.width {
            for y in 0..grid.height {
                if checked_sample2(noise, f64::from(x), f64::from(y))? <= params.density {
                    continue;
                }
                let delay = if params.delay_max > 0.0 {
                    Duration::try_from_secs_f64(rng.gen_range(0.0..params.delay_max))
                        .map_err(|e| SceneError::InvalidConfig(format!("star delay: {e}")))?
                } else {
                    Duration::ZERO
                };
                let star = Star {
                    coord: Coord::new(x, y),
                    delay,
                    glyph: DIM,
                };
                store.set(LayerId::Stars, star.coord, star.cell());
                stars.push(star);
            }
        }

        Ok(StarField { params, stars })
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Simulation time snapped to the sampling rate.
    pub fn quantize(&self, time: f64) -> f64 {
        (time * self.params.rate_hz).floor() / self.params.rate_hz
    }
}

impl Generate for StarField {
    fn layer(&self) -> LayerId {
        LayerId::Stars
    }

    fn tick(&mut self, ctx: &TickContext<'_>, store: &mut LayerStore) -> Result<()> {
        let layer = self.layer();
        let t = self.quantize(ctx.time);

        for star in &mut self.stars {
            let x = f64::from(star.coord.x);
            let y = f64::from(star.coord.y);
            let glyph = if checked_sample3(ctx.noise, x, y, t)? > self.params.twinkle {
                BRIGHT
            } else {
                DIM
            };
            if glyph != star.glyph {
                star.glyph = glyph;
                store.set(layer, star.coord, star.cell());
            }
        }

        Ok(())
    }
}
