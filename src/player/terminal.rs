//! Presenter that drives a terminal through crossterm.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use crossterm::{cursor, queue, style, terminal};
use tracing::debug;

use crate::types::{Cell, ChangeSet, Effects};

use super::surface::Shadow;
use super::{PresentReport, Presenter};

/// One full slow-fade cycle; a star's delay picks its phase within it.
const FADE_CYCLE_SECS: f64 = 20.0;

pub struct TerminalPresenter<W: Write> {
    out: W,
    shadow: Shadow,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, width: u16, height: u16) -> Self {
        TerminalPresenter {
            out,
            shadow: Shadow::new(width, height),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, changes: &ChangeSet) -> Result<PresentReport> {
        let mut report = PresentReport::default();
        let mut began = false;

        for change in changes.iter() {
            let applied = self.shadow.apply(change);
            report.record(applied);

            match applied {
                None => {
                    debug!(x = change.x, y = change.y, "No display cell, skipping");
                }
                Some(a) if a.any() => {
                    if !began {
                        queue!(self.out, terminal::BeginSynchronizedUpdate)?;
                        began = true;
                    }
                    let cs = to_content_style(&change.cell);
                    queue!(
                        self.out,
                        cursor::MoveTo(change.x, change.y),
                        style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
                    )?;
                }
                Some(_) => {}
            }
        }

        if began {
            queue!(self.out, terminal::EndSynchronizedUpdate)?;
            self.out.flush()?;
        }
        Ok(report)
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.shadow = Shadow::new(width, height);
        queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Effect conversion
// ---------------------------------------------------------------------------

/// Map a cell's effects onto terminal attributes.
///
/// A terminal has no per-cell animation clock, so a slow fade is drawn as a
/// static grey whose shade comes from the animation delay's phase.
pub fn to_content_style(cell: &Cell) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if cell.effects.contains(Effects::SLOW_FADING) {
        let delay = cell.animation_delay.unwrap_or(Duration::ZERO);
        cs.foreground_color = Some(fade_shade(delay));
    }
    if cell.effects.contains(Effects::SPARKLING) {
        cs.attributes.set(style::Attribute::Bold);
    }
    if cell.effects.contains(Effects::FADE_BLINKING) {
        cs.attributes.set(style::Attribute::SlowBlink);
    }
    if cell.effects.contains(Effects::GLOW) {
        cs.foreground_color = Some(style::Color::Yellow);
        cs.attributes.set(style::Attribute::Bold);
    }
    cs
}

fn fade_shade(delay: Duration) -> style::Color {
    let phase = (delay.as_secs_f64() % FADE_CYCLE_SECS) / FADE_CYCLE_SECS;
    let level = 110 + (phase * 130.0) as u8;
    style::Color::Rgb {
        r: level,
        g: level,
        b: level,
    }
}
