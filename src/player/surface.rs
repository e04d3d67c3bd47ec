//! What the display currently shows, and an in-memory display built on it.

use anyhow::Result;

use crate::types::{Cell, CellChange, ChangeSet, Coord};

use super::{PresentReport, Presenter};

/// Which attribute classes of a display cell an applied change touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub glyph: bool,
    pub effects: bool,
    pub delay: bool,
}

impl Applied {
    pub fn any(&self) -> bool {
        self.glyph || self.effects || self.delay
    }
}

/// Mirror of the display, one cell per grid position.
#[derive(Debug, Clone)]
pub struct Shadow {
    width: u16,
    height: u16,
    grid: Vec<Vec<Cell>>,
}

impl Shadow {
    pub fn new(width: u16, height: u16) -> Self {
        Shadow {
            width,
            height,
            grid: vec![vec![Cell::blank(); width as usize]; height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.grid.get(coord.y as usize)?.get(coord.x as usize)
    }

    /// Bring one display cell in line with `change`, class by class.
    ///
    /// Returns `None` when the display has no cell at that coordinate.
    pub fn apply(&mut self, change: &CellChange) -> Option<Applied> {
        let shown = self
            .grid
            .get_mut(change.y as usize)?
            .get_mut(change.x as usize)?;
        let next = &change.cell;
        let mut applied = Applied::default();

        if shown.ch != next.ch {
            shown.ch = next.ch;
            applied.glyph = true;
        }
        if shown.effects != next.effects {
            shown.effects = next.effects;
            applied.effects = true;
        }
        if shown.animation_delay != next.animation_delay {
            shown.animation_delay = next.animation_delay;
            applied.delay = true;
        }
        Some(applied)
    }

    pub fn rows(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|c| c.ch).collect())
            .collect()
    }
}

impl PresentReport {
    pub(crate) fn record(&mut self, applied: Option<Applied>) {
        match applied {
            None => self.skipped += 1,
            Some(a) => {
                self.glyphs += usize::from(a.glyph);
                self.effects += usize::from(a.effects);
                self.delays += usize::from(a.delay);
            }
        }
    }

    pub fn writes(&self) -> usize {
        self.glyphs + self.effects + self.delays
    }
}

/// A display that lives in memory: used headless and in tests.
#[derive(Debug, Clone)]
pub struct BufferSurface {
    shadow: Shadow,
    totals: PresentReport,
}

impl BufferSurface {
    pub fn new(width: u16, height: u16) -> Self {
        BufferSurface {
            shadow: Shadow::new(width, height),
            totals: PresentReport::default(),
        }
    }

    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.shadow.get(coord)
    }

    pub fn rows(&self) -> Vec<String> {
        self.shadow.rows()
    }

    /// Writes accumulated over every `present` call.
    pub fn totals(&self) -> PresentReport {
        self.totals
    }
}

impl Presenter for BufferSurface {
    fn present(&mut self, changes: &ChangeSet) -> Result<PresentReport> {
        let mut report = PresentReport::default();
        for change in changes.iter() {
            report.record(self.shadow.apply(change));
        }
        self.totals.merge(report);
        Ok(report)
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.shadow = Shadow::new(width, height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::Effects;

    fn change(x: u16, y: u16, cell: Cell) -> CellChange {
        CellChange { x, y, cell }
    }

    #[test]
    fn attribute_classes_apply_independently() {
        let mut shadow = Shadow::new(3, 2);
        let star = Cell::new('*').with_effects(Effects::SLOW_FADING);

        let a = shadow.apply(&change(1, 1, star.clone())).unwrap();
        assert_eq!(a, Applied { glyph: true, effects: true, delay: false });

        let a = shadow
            .apply(&change(1, 1, star.clone().with_delay(Duration::from_secs(3))))
            .unwrap();
        assert_eq!(a, Applied { glyph: false, effects: false, delay: true });
    }

    #[test]
    fn reapplying_is_a_no_op() {
        let mut surface = BufferSurface::new(4, 4);
        let changes = ChangeSet {
            changes: vec![change(0, 0, Cell::new('O')), change(3, 3, Cell::new('.'))],
        };
        assert_eq!(surface.present(&changes).unwrap().writes(), 2);
        assert_eq!(surface.present(&changes).unwrap().writes(), 0);
        assert_eq!(surface.rows()[0], "O   ");
    }

    #[test]
    fn missing_targets_are_skipped() {
        let mut surface = BufferSurface::new(2, 2);
        let changes = ChangeSet {
            changes: vec![change(1, 0, Cell::new('*')), change(5, 0, Cell::new('*'))],
        };
        let report = surface.present(&changes).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.glyphs, 1);
        assert_eq!(surface.cell(Coord::new(1, 0)).map(|c| c.ch), Some('*'));
    }
}
