//! Engine — the scene aggregate.
//!
//! Owns the grid, the layer store, the content generators, and the renderer's
//! presented-frame cache, and advances them one tick at a time. A tick runs
//! generators → compositor → diff and hands back the `ChangeSet` for the
//! presenter.
//!
//! The engine never deals with terminals or wall clocks; callers pass `dt`.

pub mod generators;

use std::time::Duration;

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::layers::LayerStore;
use crate::noise::{NoiseSource, ValueNoise};
use crate::renderer::Renderer;
use crate::types::{ChangeSet, Coord};
use generators::{Generate, StarField, StarParams, Sun, TickContext};

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub width: u16,
    pub height: u16,
}

impl Grid {
    /// Size the grid to cover a viewport: `ceil(viewport / cell)` per axis.
    pub fn from_viewport(viewport: (u32, u32), cell: (u32, u32)) -> Result<Self> {
        let (vw, vh) = viewport;
        let (cw, ch) = cell;
        if cw == 0 || ch == 0 {
            return Err(SceneError::InvalidConfig("cell size must be positive".into()));
        }
        let width = vw.div_ceil(cw).min(u32::from(u16::MAX)) as u16;
        let height = vh.div_ceil(ch).min(u32::from(u16::MAX)) as u16;
        if width == 0 || height == 0 {
            return Err(SceneError::EmptyGrid { width: vw, height: vh });
        }
        Ok(Grid { width, height })
    }

    pub fn center(&self) -> (i32, i32) {
        (i32::from(self.width / 2), i32::from(self.height / 2))
    }

    /// The coordinate at `(x, y)`, or `None` when it falls off the grid.
    pub fn coord(&self, x: i32, y: i32) -> Option<Coord> {
        let x = u16::try_from(x).ok()?;
        let y = u16::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some(Coord::new(x, y))
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

pub struct Scene {
    config: SceneConfig,
    seed: u64,
    viewport: (u32, u32),
    grid: Grid,
    noise: Box<dyn NoiseSource>,
    store: LayerStore,
    renderer: Renderer,
    stars: StarField,
    sun: Sun,
    time: f64,
    ticks: u64,
}

impl Scene {
    /// Build a scene over the stock value-noise field.
    pub fn new(config: SceneConfig, viewport: (u32, u32)) -> Result<Self> {
        Self::with_noise(config, viewport, Box::new(ValueNoise::new(0)))
    }

    /// Build a scene over a caller-supplied noise field. The field is seeded
    /// with the configured seed, or a random one when none is configured.
    pub fn with_noise(
        config: SceneConfig,
        viewport: (u32, u32),
        mut noise: Box<dyn NoiseSource>,
    ) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        noise.seed(seed);
        info!(seed, "Noise seeded");

        let grid = Grid::from_viewport(viewport, (config.cell_width, config.cell_height))?;
        let mut store = LayerStore::new();
        let stars = Self::scatter_stars(&config, seed, grid, noise.as_ref(), &mut store)?;
        let sun = Sun::new(config.sun_size, config.sun_shading);
        info!(
            width = grid.width,
            height = grid.height,
            stars = stars.stars().len(),
            "Scene initialised"
        );

        Ok(Scene {
            config,
            seed,
            viewport,
            grid,
            noise,
            store,
            renderer: Renderer::new(),
            stars,
            sun,
            time: 0.0,
            ticks: 0,
        })
    }

    fn scatter_stars(
        config: &SceneConfig,
        seed: u64,
        grid: Grid,
        noise: &dyn NoiseSource,
        store: &mut LayerStore,
    ) -> Result<StarField> {
        let params = StarParams {
            density: config.star_density,
            twinkle: config.twinkle_threshold,
            rate_hz: config.noise_rate_hz,
            delay_max: config.star_delay_max,
        };
        let mut rng = StdRng::seed_from_u64(seed);
        StarField::generate(params, grid, noise, &mut rng, store)
    }

    /// Rebuild everything for a new viewport. The noise seed and the
    /// accumulated simulation time carry over.
    pub fn resize(&mut self, viewport: (u32, u32)) -> Result<()> {
        let grid = Grid::from_viewport(viewport, (self.config.cell_width, self.config.cell_height))?;
        self.teardown(grid);
        self.viewport = viewport;
        self.stars = Self::scatter_stars(
            &self.config,
            self.seed,
            grid,
            self.noise.as_ref(),
            &mut self.store,
        )?;
        info!(
            width = grid.width,
            height = grid.height,
            stars = self.stars.stars().len(),
            "Scene rebuilt"
        );
        Ok(())
    }

    /// Drop all layer content and the presented-frame cache.
    pub(crate) fn teardown(&mut self, grid: Grid) {
        self.grid = grid;
        self.store.reset();
        self.renderer.reset();
    }

    /// Advance the simulation by `dt` of wall-clock time and return what the
    /// presenter has to change.
    pub fn tick(&mut self, dt: Duration) -> Result<ChangeSet> {
        self.time += self.config.game_speed * dt.as_secs_f64();
        self.ticks += 1;

        let ctx = TickContext {
            grid: self.grid,
            time: self.time,
            noise: self.noise.as_ref(),
        };
        let generators: [&mut dyn Generate; 2] = [&mut self.stars, &mut self.sun];
        for generator in generators {
            generator.tick(&ctx, &mut self.store)?;
        }

        let changes = self.renderer.render(&mut self.store);
        debug!(tick = self.ticks, time = self.time, changed = changes.len(), "Tick");
        Ok(changes)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerId;

    fn seeded(seed: u64) -> SceneConfig {
        SceneConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn grid_rounds_viewport_up() {
        let grid = Grid::from_viewport((801, 600), (5, 8)).unwrap();
        assert_eq!(grid, Grid { width: 161, height: 75 });
    }

    #[test]
    fn zero_viewport_is_an_error() {
        assert_eq!(
            Grid::from_viewport((0, 10), (1, 1)),
            Err(SceneError::EmptyGrid { width: 0, height: 10 })
        );
    }

    #[test]
    fn grid_coord_rejects_off_grid_positions() {
        let grid = Grid { width: 4, height: 3 };
        assert_eq!(grid.coord(3, 2), Some(Coord::new(3, 2)));
        assert_eq!(grid.coord(4, 0), None);
        assert_eq!(grid.coord(-1, 0), None);
        assert_eq!(grid.center(), (2, 1));
    }

    #[test]
    fn time_accumulates_game_speed_scaled_dt() {
        let mut scene = Scene::new(seeded(5), (40, 20)).unwrap();
        scene.tick(Duration::from_secs(2)).unwrap();
        scene.tick(Duration::from_secs(2)).unwrap();
        assert!((scene.time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn first_tick_paints_second_tick_is_quiet() {
        let mut scene = Scene::new(seeded(11), (60, 30)).unwrap();
        let first = scene.tick(Duration::ZERO).unwrap();
        assert!(!first.is_empty());
        assert!(scene.tick(Duration::ZERO).unwrap().is_empty());
    }

    #[test]
    fn teardown_leaves_store_and_cache_empty() {
        let mut scene = Scene::new(seeded(9), (60, 30)).unwrap();
        scene.tick(Duration::from_millis(33)).unwrap();
        assert!(!scene.store().is_empty());
        assert!(!scene.renderer().is_empty());

        scene.teardown(Grid { width: 20, height: 10 });
        assert!(scene.store().is_empty());
        assert!(scene.renderer().is_empty());
    }

    #[test]
    fn resize_regenerates_stars_for_new_grid() {
        let mut scene = Scene::new(seeded(9), (60, 30)).unwrap();
        scene.tick(Duration::from_millis(33)).unwrap();
        scene.resize((25, 12)).unwrap();

        assert_eq!(scene.grid(), Grid { width: 25, height: 12 });
        assert!(scene.stars().stars().iter().all(|s| scene.grid().contains(s.coord)));
        assert_eq!(scene.store().len(LayerId::Sun), 0);
        assert!(scene.renderer().is_empty());
    }

    #[test]
    fn very_fast_game_speed_keeps_ticking() {
        let config = SceneConfig {
            game_speed: 1e11,
            ..seeded(4)
        };
        let mut scene = Scene::new(config, (40, 20)).unwrap();
        scene.tick(Duration::from_millis(33)).unwrap();
        scene.tick(Duration::from_millis(33)).unwrap();
        assert!(scene.time() > f64::from(i32::MAX));
    }

    #[test]
    fn oversized_star_delay_is_rejected() {
        let config: SceneConfig =
            serde_json::from_str(r#"{"star_delay_max": 1e20, "seed": 1}"#).unwrap();
        assert!(matches!(
            Scene::new(config, (40, 20)),
            Err(SceneError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SceneConfig {
            sun_size: 4,
            ..Default::default()
        };
        assert!(matches!(
            Scene::new(config, (10, 10)),
            Err(SceneError::InvalidConfig(_))
        ));
    }
}
