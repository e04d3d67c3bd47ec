//! The layer store: one sparse map per scene layer.
//!
//! Z-order is fixed by the declaration order of `LayerId`; index 0 is the
//! farthest back. Every mutation records the touched coordinate so the
//! compositor only has to re-resolve what changed since it last ran.

use std::collections::{BTreeSet, HashMap};

use crate::types::{Coord, LayerEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    Stars,
    Sun,
    Planets,
    Orbits,
    /// Comets, asteroids, particles.
    Effects,
}

impl LayerId {
    pub const COUNT: usize = 5;

    /// All layers, back to front.
    pub const ALL: [LayerId; LayerId::COUNT] = [
        LayerId::Stars,
        LayerId::Sun,
        LayerId::Planets,
        LayerId::Orbits,
        LayerId::Effects,
    ];

    pub fn z(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
pub struct LayerStore {
    layers: [HashMap<Coord, LayerEntry>; LayerId::COUNT],
    dirty: BTreeSet<Coord>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, layer: LayerId, coord: Coord) -> Option<&LayerEntry> {
        self.layers[layer.z()].get(&coord)
    }

    pub fn set(&mut self, layer: LayerId, coord: Coord, entry: impl Into<LayerEntry>) {
        self.layers[layer.z()].insert(coord, entry.into());
        self.dirty.insert(coord);
    }

    pub fn delete(&mut self, layer: LayerId, coord: Coord) -> Option<LayerEntry> {
        let removed = self.layers[layer.z()].remove(&coord);
        if removed.is_some() {
            self.dirty.insert(coord);
        }
        removed
    }

    pub fn clear(&mut self, layer: LayerId) {
        let map = &mut self.layers[layer.z()];
        self.dirty.extend(map.keys().copied());
        map.clear();
    }

    /// Remove an entry without scheduling its coordinate for re-compositing.
    pub(crate) fn discard(&mut self, layer: LayerId, coord: Coord) {
        self.layers[layer.z()].remove(&coord);
    }

    /// Drop every layer and all pending dirty marks.
    pub fn reset(&mut self) {
        for map in &mut self.layers {
            map.clear();
        }
        self.dirty.clear();
    }

    pub fn entries(&self, layer: LayerId) -> impl Iterator<Item = (Coord, &LayerEntry)> {
        self.layers[layer.z()].iter().map(|(c, e)| (*c, e))
    }

    pub fn len(&self, layer: LayerId) -> usize {
        self.layers[layer.z()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(HashMap::is_empty)
    }

    /// Coordinates touched since the last `take_dirty`, in row-major order.
    pub fn take_dirty(&mut self) -> BTreeSet<Coord> {
        std::mem::take(&mut self.dirty)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    #[test]
    fn z_order_follows_declaration() {
        let zs: Vec<usize> = LayerId::ALL.iter().map(|l| l.z()).collect();
        assert_eq!(zs, vec![0, 1, 2, 3, 4]);
        assert!(LayerId::Stars < LayerId::Effects);
    }

    #[test]
    fn one_entry_per_coordinate_per_layer() {
        let mut store = LayerStore::new();
        let c = Coord::new(1, 1);
        store.set(LayerId::Sun, c, Cell::new('O'));
        store.set(LayerId::Sun, c, Cell::new('#'));
        assert_eq!(store.len(LayerId::Sun), 1);
        assert_eq!(store.get(LayerId::Sun, c), Some(&LayerEntry::Paint(Cell::new('#'))));
        assert_eq!(store.get(LayerId::Stars, c), None);
    }

    #[test]
    fn mutations_mark_coordinates_dirty() {
        let mut store = LayerStore::new();
        let a = Coord::new(0, 0);
        let b = Coord::new(2, 0);
        store.set(LayerId::Stars, a, Cell::new('.'));
        store.set(LayerId::Sun, b, Cell::new('O'));
        assert_eq!(store.take_dirty().into_iter().collect::<Vec<_>>(), vec![a, b]);
        assert!(!store.has_dirty());

        store.clear(LayerId::Sun);
        assert_eq!(store.take_dirty().into_iter().collect::<Vec<_>>(), vec![b]);

        assert!(store.delete(LayerId::Sun, b).is_none());
        assert!(!store.has_dirty());
        assert!(store.delete(LayerId::Stars, a).is_some());
        assert!(store.has_dirty());
    }

    #[test]
    fn entries_lists_one_layer() {
        let mut store = LayerStore::new();
        store.set(LayerId::Stars, Coord::new(0, 0), Cell::new('.'));
        store.set(LayerId::Stars, Coord::new(1, 0), LayerEntry::Remove);
        store.set(LayerId::Sun, Coord::new(0, 0), Cell::new('O'));

        let mut coords: Vec<Coord> = store.entries(LayerId::Stars).map(|(c, _)| c).collect();
        coords.sort();
        assert_eq!(coords, vec![Coord::new(0, 0), Coord::new(1, 0)]);
    }

    #[test]
    fn reset_empties_everything() {
        let mut store = LayerStore::new();
        for layer in LayerId::ALL {
            store.set(layer, Coord::new(3, 3), Cell::new('x'));
        }
        store.reset();
        assert!(store.is_empty());
        assert!(!store.has_dirty());
    }
}
