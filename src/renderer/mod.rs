//! Renderer — the compositor and the diff engine.
//!
//! Flattens the layer store into a `Frame` for the coordinates touched this
//! tick, then diffs that frame against what is currently presented and emits
//! a `ChangeSet`.
//!
//! The renderer knows nothing about time, noise, or the display backend.

use std::collections::HashMap;

use crate::layers::{LayerId, LayerStore};
use crate::types::{Cell, CellChange, ChangeSet, Coord, Frame, LayerEntry};

#[derive(Debug, Default)]
pub struct Renderer {
    /// What the presenter currently shows, per coordinate.
    presented: HashMap<Coord, Cell>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite the touched coordinates and diff them against the cache.
    pub fn render(&mut self, store: &mut LayerStore) -> ChangeSet {
        let frame = Self::composite(store);
        self.diff(&frame)
    }

    /// Resolve the visible cell at every coordinate touched since the last call.
    ///
    /// The highest layer with a painted entry wins. A `Remove` entry that is
    /// not occluded resolves to the first painted entry beneath it (or a blank
    /// cell) and is dropped from its layer once resolved. Coordinates where no
    /// layer holds anything are left out of the frame.
    pub fn composite(store: &mut LayerStore) -> Frame {
        let mut frame = Frame::new();
        let mut resolved_removes = Vec::new();

        for coord in store.take_dirty() {
            let mut revealing = false;
            let mut visible = None;

            for layer in LayerId::ALL.into_iter().rev() {
                match store.get(layer, coord) {
                    Some(LayerEntry::Paint(cell)) => {
                        visible = Some(cell.clone());
                        break;
                    }
                    Some(LayerEntry::Remove) => {
                        revealing = true;
                        resolved_removes.push((layer, coord));
                    }
                    None => {}
                }
            }

            match visible {
                Some(cell) => {
                    frame.insert(coord, cell);
                }
                None if revealing => {
                    frame.insert(coord, Cell::blank());
                }
                None => {}
            }
        }

        // Removes are dropped only after every coordinate has been resolved.
        for (layer, coord) in resolved_removes {
            store.discard(layer, coord);
        }

        frame
    }

    /// Emit every frame cell whose glyph, effects, or delay differ from what is
    /// presented, and record it as presented.
    pub fn diff(&mut self, frame: &Frame) -> ChangeSet {
        let mut changes = Vec::new();

        for (coord, cell) in frame {
            if self.presented.get(coord) == Some(cell) {
                continue;
            }
            self.presented.insert(*coord, cell.clone());
            changes.push(CellChange {
                x: coord.x,
                y: coord.y,
                cell: cell.clone(),
            });
        }

        ChangeSet { changes }
    }

    pub fn presented(&self, coord: Coord) -> Option<&Cell> {
        self.presented.get(&coord)
    }

    pub fn is_empty(&self) -> bool {
        self.presented.is_empty()
    }

    /// Forget everything presented, e.g. after the display was rebuilt.
    pub fn reset(&mut self) {
        self.presented.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::Effects;

    fn at(x: u16, y: u16) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn highest_layer_wins() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(1, 1), Cell::new('.'));
        store.set(LayerId::Sun, at(1, 1), Cell::new('O'));
        store.set(LayerId::Stars, at(2, 1), Cell::new('*'));

        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.get(&at(1, 1)), Some(&Cell::new('O')));
        assert_eq!(frame.get(&at(2, 1)), Some(&Cell::new('*')));
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn remove_reveals_cell_beneath_and_is_dropped() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(0, 0), Cell::new('x'));
        store.set(LayerId::Sun, at(0, 0), LayerEntry::Remove);

        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.get(&at(0, 0)), Some(&Cell::new('x')));
        assert_eq!(store.get(LayerId::Sun, at(0, 0)), None);
        assert_eq!(store.get(LayerId::Stars, at(0, 0)), Some(&LayerEntry::Paint(Cell::new('x'))));
        assert!(!store.has_dirty());
    }

    #[test]
    fn remove_with_nothing_beneath_is_blank() {
        let mut store = LayerStore::new();
        store.set(LayerId::Orbits, at(4, 2), LayerEntry::Remove);

        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.get(&at(4, 2)), Some(&Cell::blank()));
        assert_eq!(store.len(LayerId::Orbits), 0);
    }

    #[test]
    fn occluded_remove_survives() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(0, 0), Cell::new('.'));
        store.set(LayerId::Sun, at(0, 0), LayerEntry::Remove);
        store.set(LayerId::Effects, at(0, 0), Cell::new('@'));

        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.get(&at(0, 0)), Some(&Cell::new('@')));
        assert_eq!(store.get(LayerId::Sun, at(0, 0)), Some(&LayerEntry::Remove));
    }

    #[test]
    fn stacked_removes_reveal_first_painted_cell_below() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(0, 0), Cell::new('.'));
        store.set(LayerId::Planets, at(0, 0), LayerEntry::Remove);
        store.set(LayerId::Effects, at(0, 0), LayerEntry::Remove);

        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.get(&at(0, 0)), Some(&Cell::new('.')));
        assert_eq!(store.get(LayerId::Planets, at(0, 0)), None);
        assert_eq!(store.get(LayerId::Effects, at(0, 0)), None);
    }

    #[test]
    fn untouched_coordinates_are_not_in_the_frame() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(0, 0), Cell::new('.'));
        Renderer::composite(&mut store);

        store.set(LayerId::Stars, at(5, 5), Cell::new('*'));
        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.keys().copied().collect::<Vec<_>>(), vec![at(5, 5)]);
    }

    #[test]
    fn deleting_top_cell_reveals_lower_layer() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(1, 0), Cell::new('.'));
        store.set(LayerId::Sun, at(1, 0), Cell::new('O'));
        Renderer::composite(&mut store);

        store.delete(LayerId::Sun, at(1, 0));
        let frame = Renderer::composite(&mut store);
        assert_eq!(frame.get(&at(1, 0)), Some(&Cell::new('.')));
    }

    #[test]
    fn emptied_coordinate_is_not_blanked() {
        let mut store = LayerStore::new();
        store.set(LayerId::Sun, at(1, 0), Cell::new('O'));
        Renderer::composite(&mut store);

        store.clear(LayerId::Sun);
        assert!(Renderer::composite(&mut store).is_empty());
    }

    #[test]
    fn identical_frame_yields_no_changes() {
        let mut renderer = Renderer::new();
        let mut frame = Frame::new();
        frame.insert(at(0, 0), Cell::new('*'));
        frame.insert(at(3, 1), Cell::new('.').with_effects(Effects::SLOW_FADING));

        assert_eq!(renderer.diff(&frame).len(), 2);
        assert!(renderer.diff(&frame).is_empty());
    }

    #[test]
    fn effect_or_delay_change_alone_is_emitted() {
        let mut renderer = Renderer::new();
        let base = Cell::new('.');
        let mut frame = Frame::new();
        frame.insert(at(0, 0), base.clone());
        frame.insert(at(1, 0), base.clone());
        renderer.diff(&frame);

        frame.insert(at(0, 0), base.clone().with_effects(Effects::GLOW));
        frame.insert(at(1, 0), base.clone().with_delay(Duration::from_millis(1500)));
        let changes = renderer.diff(&frame);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes.get(at(0, 0)).map(|c| c.effects), Some(Effects::GLOW));
        assert_eq!(
            changes.get(at(1, 0)).and_then(|c| c.animation_delay),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(renderer.presented(at(0, 0)).map(|c| c.effects), Some(Effects::GLOW));
    }

    #[test]
    fn render_chains_composite_and_diff() {
        let mut renderer = Renderer::new();
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, at(2, 2), Cell::new('.'));
        assert_eq!(renderer.render(&mut store).len(), 1);

        // Rewriting the same content is a no-op for the presenter.
        store.set(LayerId::Stars, at(2, 2), Cell::new('.'));
        assert!(renderer.render(&mut store).is_empty());

        renderer.reset();
        assert!(renderer.is_empty());
    }
}
