//! Player — the runtime loop and the display side of the pipeline.
//!
//! Owns a `Scene` and a presenter, paces ticks with the scheduler,
//! coalesces resizes, and hands each tick's `ChangeSet` to the presenter.
//! The player never composites or diffs; it only applies what it is given.

pub mod surface;
pub mod terminal;

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::tty::IsTty;
use crossterm::{cursor, execute};
use tracing::{debug, error, info};

use crate::config::SceneConfig;
use crate::engine::Scene;
use crate::error::SceneError;
use crate::scheduler::{ResizeDebouncer, Scheduler};
use crate::types::ChangeSet;

pub use surface::BufferSurface;
pub use terminal::TerminalPresenter;

/// Counts of what a `present` call actually wrote, per attribute class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentReport {
    pub glyphs: usize,
    pub effects: usize,
    pub delays: usize,
    /// Changes with no display cell to land on.
    pub skipped: usize,
}

impl PresentReport {
    pub fn merge(&mut self, other: PresentReport) {
        self.glyphs += other.glyphs;
        self.effects += other.effects;
        self.delays += other.delays;
        self.skipped += other.skipped;
    }
}

/// A display surface that accepts change sets, never full frames.
///
/// Re-applying a change that is already shown must be a no-op.
pub trait Presenter {
    fn present(&mut self, changes: &ChangeSet) -> Result<PresentReport>;

    /// Replace the surface with a blank one of the given size.
    fn resize(&mut self, width: u16, height: u16) -> Result<()>;
}

pub struct Player<P: Presenter> {
    scene: Scene,
    presenter: P,
    scheduler: Scheduler,
    resize: ResizeDebouncer,
    /// Set while the viewport is too small to hold a grid.
    waiting_for_size: bool,
}

impl Player<TerminalPresenter<Stdout>> {
    /// Check the display preconditions and build the scene for the current
    /// terminal size.
    pub fn new(config: SceneConfig) -> Result<Self> {
        let stdout = io::stdout();
        if !stdout.is_tty() {
            error!("stdout is not a terminal, refusing to start");
            bail!("stdout is not a terminal");
        }

        let (w, h) = crossterm::terminal::size().context("Failed to query terminal size")?;
        let scene = Scene::new(config, (u32::from(w), u32::from(h)))?;
        let presenter = TerminalPresenter::new(stdout, w, h);
        Ok(Player::with_presenter(scene, presenter, (w, h), Instant::now()))
    }

    /// Run the animation until the user quits.
    ///
    /// Sets up the terminal, enters the loop, and restores the terminal on
    /// exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        crossterm::terminal::enable_raw_mode()?;
        execute!(
            stdout,
            crossterm::terminal::EnterAlternateScreen,
            crossterm::terminal::DisableLineWrap,
            cursor::Hide,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
        )?;

        info!(seed = self.scene.seed(), "Playing");
        let result = self.run_loop();

        // Always restore terminal state.
        let _ = execute!(
            stdout,
            crossterm::terminal::EnableLineWrap,
            cursor::Show,
            crossterm::terminal::LeaveAlternateScreen,
        );
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = stdout.flush();

        result
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self) -> Result<()> {
        loop {
            self.step(Instant::now())?;

            if !event::poll(self.time_until_next(Instant::now()))? {
                continue;
            }

            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    _ => {}
                },
                Event::Resize(w, h) => self.handle_resize(w, h, Instant::now())?,
                _ => {}
            }
        }

        Ok(())
    }
}

impl<P: Presenter> Player<P> {
    /// Drive `scene` into `presenter`, whose surface is currently `size`.
    pub fn with_presenter(scene: Scene, presenter: P, size: (u16, u16), now: Instant) -> Self {
        let config = scene.config();
        let scheduler = Scheduler::new(config.tick_interval(), now);
        let resize = ResizeDebouncer::new(config.resize_debounce(), size);
        Player {
            scene,
            presenter,
            scheduler,
            resize,
            waiting_for_size: false,
        }
    }

    /// One pass of the loop: apply a settled resize, then tick and present
    /// if a tick is due. Returns what the presenter wrote, if it ran.
    pub fn step(&mut self, now: Instant) -> Result<Option<PresentReport>> {
        if let Some((w, h)) = self.resize.tick_at(now) {
            self.rebuild(w, h)?;
        }
        let Some(dt) = self.scheduler.poll(now) else {
            return Ok(None);
        };
        if self.waiting_for_size {
            return Ok(None);
        }
        let changes = self.scene.tick(dt)?;
        Ok(Some(self.presenter.present(&changes)?))
    }

    /// Record a resize event. The surface is blanked at once; stale changes
    /// land nowhere until the debounced rebuild.
    pub fn handle_resize(&mut self, w: u16, h: u16, now: Instant) -> Result<()> {
        if self.resize.handle_resize_at(w, h, now) {
            self.presenter.resize(w, h)?;
        }
        Ok(())
    }

    /// How long the loop may block before the next tick or rebuild is due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        let wait = self.scheduler.time_until_tick(now);
        match self.resize.time_until_apply(now) {
            Some(until_resize) => wait.min(until_resize),
            None => wait,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    fn rebuild(&mut self, w: u16, h: u16) -> Result<()> {
        match self.scene.resize((u32::from(w), u32::from(h))) {
            Ok(()) => {}
            Err(SceneError::EmptyGrid { .. }) => {
                debug!(width = w, height = h, "Viewport holds no cells, waiting for a resize");
                self.waiting_for_size = true;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        self.waiting_for_size = false;
        self.presenter.resize(w, h)?;
        info!(width = w, height = h, "Resized");
        Ok(())
    }
}
