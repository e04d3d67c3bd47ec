//! Shared boundary types for the scene pipeline.
//!
//! This module defines the data contracts between the stages:
//! - Generators → Compositor (in-memory): `LayerEntry` values in the layer store
//! - Compositor → Diff Engine: `Frame`
//! - Diff Engine → Presenter: `ChangeSet` containing `CellChange`s

use std::collections::BTreeMap;
use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grid coordinates
// ---------------------------------------------------------------------------

/// A cell position on the grid.
///
/// Field order makes the derived ordering row-major, which is the order the
/// presenters write changes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub y: u16,
    pub x: u16,
}

impl Coord {
    pub const fn new(x: u16, y: u16) -> Self {
        Coord { y, x }
    }
}

// ---------------------------------------------------------------------------
// Cell content
// ---------------------------------------------------------------------------

bitflags! {
    /// Visual effects a presenter toggles independently of the glyph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Effects: u8 {
        const SLOW_FADING   = 1 << 0;
        const SPARKLING     = 1 << 1;
        const FADE_BLINKING = 1 << 2;
        const GLOW          = 1 << 3;
    }
}

fn no_effects(e: &Effects) -> bool {
    e.is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub ch: char,
    #[serde(default, skip_serializing_if = "no_effects")]
    pub effects: Effects,
    /// Phase offset of the cell's effect animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_delay: Option<Duration>,
}

impl Cell {
    pub const BLANK_CHAR: char = ' ';

    pub fn new(ch: char) -> Self {
        Cell {
            ch,
            effects: Effects::empty(),
            animation_delay: None,
        }
    }

    pub fn blank() -> Self {
        Cell::new(Cell::BLANK_CHAR)
    }

    pub fn with_effects(mut self, effects: Effects) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.animation_delay = Some(delay);
        self
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::blank()
    }
}

/// What a layer holds at a coordinate.
///
/// `Remove` asks the compositor to reveal whatever lies beneath this layer and
/// then drop the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerEntry {
    Paint(Cell),
    Remove,
}

impl LayerEntry {
    pub fn cell(&self) -> Option<&Cell> {
        match self {
            LayerEntry::Paint(cell) => Some(cell),
            LayerEntry::Remove => None,
        }
    }
}

impl From<Cell> for LayerEntry {
    fn from(cell: Cell) -> Self {
        LayerEntry::Paint(cell)
    }
}

// ---------------------------------------------------------------------------
// Compositor → Diff Engine → Presenter
// ---------------------------------------------------------------------------

/// The visible cell at every coordinate the compositor evaluated this tick.
pub type Frame = BTreeMap<Coord, Cell>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

impl CellChange {
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// The minimal set of cells a presenter must update for one tick, in
/// row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<CellChange>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellChange> {
        self.changes.iter()
    }

    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.changes
            .binary_search_by_key(&coord, CellChange::coord)
            .ok()
            .map(|i| &self.changes[i].cell)
    }
}
