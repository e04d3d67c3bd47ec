use crate::config::SunShading;
use crate::error::Result;
use crate::layers::{LayerId, LayerStore};
use crate::noise::checked_sample3;
use crate::types::{Cell, Effects};

use super::{Generate, TickContext};

const FLARE: char = '~';
const FLARE_LEVEL: f64 = 0.7;
const FLARE_SCALE: f64 = 0.2;
const FLARE_SPEED: f64 = 0.1;

/// The sun, redrawn from scratch every tick at the grid's centre.
#[derive(Debug, Clone)]
pub struct Sun {
    size: u16,
    shading: SunShading,
}

impl Sun {
    pub fn new(size: u16, shading: SunShading) -> Self {
        Sun { size, shading }
    }

    fn radius(&self) -> f64 {
        f64::from(self.size) * 0.5
    }

    /// Concentric shells plus noise-driven flares.
    fn radial(&self, dx: i32, dy: i32, d: f64, ctx: &TickContext<'_>) -> Result<Cell> {
        let r_sq = self.radius().powi(2);
        let shell = d / r_sq;
        let mut ch = if shell <= 0.25 {
            'O'
        } else if shell <= 0.6 {
            '#'
        } else {
            '@'
        };

        let flare = checked_sample3(
            ctx.noise,
            f64::from(dx) * FLARE_SCALE,
            f64::from(dy) * FLARE_SCALE,
            ctx.time * FLARE_SPEED,
        )?;
        if flare > FLARE_LEVEL {
            ch = FLARE;
        }

        Ok(Cell::new(ch).with_effects(Effects::SLOW_FADING))
    }

    /// A hollow silhouette: edge glyphs on the rim, blank inside.
    fn outline(&self, dx: i32, dy: i32, d: f64) -> Cell {
        let r = self.radius();
        let inner = r - 1.5;
        if inner > 0.0 && d <= inner * inner {
            return Cell::blank();
        }

        let (ax, ay) = (dx.abs(), dy.abs());
        let half = i32::from(self.size / 2);
        let ch = if ax >= 2 * ay {
            if ax >= half { '|' } else { 'H' }
        } else if ay >= 2 * ax {
            if dy < 0 { '-' } else { '=' }
        } else if (dx > 0) == (dy < 0) {
            '/'
        } else {
            '\\'
        };

        Cell::new(ch).with_effects(Effects::GLOW)
    }
}

impl Generate for Sun {
    fn layer(&self) -> LayerId {
        LayerId::Sun
    }

    fn tick(&mut self, ctx: &TickContext<'_>, store: &mut LayerStore) -> Result<()> {
        let layer = self.layer();
        store.clear(layer);

        let half = i32::from(self.size / 2);
        let r_sq = self.radius().powi(2);
        let (cx, cy) = ctx.grid.center();

        for dy in -half..=half {
            for dx in -half..=half {
                let d = f64::from(dx * dx + dy * dy);
                if d > r_sq {
                    continue;
                }
                let Some(coord) = ctx.grid.coord(cx + dx, cy + dy) else {
                    continue;
                };
                let cell = match self.shading {
                    SunShading::Radial => self.radial(dx, dy, d, ctx)?,
                    SunShading::Outline => self.outline(dx, dy, d),
                };
                store.set(layer, coord, cell);
            }
        }

        Ok(())
    }
}
