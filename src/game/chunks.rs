//! Chunk index for collectables
//!
//! Buckets pickup-able objects into square cells so a bot only scans its own
//! cell and the 8 around it. Buckets keep insertion order and neighbours are
//! visited in a fixed offset order, so a query yields the same sequence on
//! every machine. The hash maps are only used for keyed lookup.

use crate::game::entity::EntityHandle;
use crate::util::fixed::Fp;
use crate::util::vec2::Vec2;
use hashbrown::HashMap;

/// Initial capacity for the cell map (number of expected non-empty cells)
const CHUNK_MAP_INITIAL_CAPACITY: usize = 64;

/// Initial capacity for entity vectors within cells
const CHUNK_CELL_INITIAL_CAPACITY: usize = 8;

/// Cell coordinates
pub type ChunkKey = (i32, i32);

/// Query window: self, W, NW, N, NE, E, SE, S, SW
pub const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (0, 0),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

pub struct CollectableChunks {
    chunk_size: Fp,
    cells: HashMap<ChunkKey, Vec<EntityHandle>>,
    /// Reverse lookup for O(1) removal and moves
    locations: HashMap<EntityHandle, ChunkKey>,
}

impl CollectableChunks {
    pub fn new(chunk_size: Fp) -> Self {
        Self {
            chunk_size: if chunk_size > Fp::ZERO { chunk_size } else { Fp::ONE },
            cells: HashMap::with_capacity(CHUNK_MAP_INITIAL_CAPACITY),
            locations: HashMap::with_capacity(CHUNK_MAP_INITIAL_CAPACITY),
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> Fp {
        self.chunk_size
    }

    /// Convert world position to cell key (floor division)
    #[inline]
    pub fn key_for(&self, position: Vec2) -> ChunkKey {
        let size = self.chunk_size.raw();
        (
            position.x.raw().div_euclid(size) as i32,
            position.y.raw().div_euclid(size) as i32,
        )
    }

    /// Insert or re-bucket an entity
    pub fn insert(&mut self, entity: EntityHandle, position: Vec2) {
        let key = self.key_for(position);
        if let Some(&previous) = self.locations.get(&entity) {
            if previous == key {
                return;
            }
            self.detach(entity, previous);
        }
        self.cells
            .entry(key)
            .or_insert_with(|| Vec::with_capacity(CHUNK_CELL_INITIAL_CAPACITY))
            .push(entity);
        self.locations.insert(entity, key);
    }

    pub fn remove(&mut self, entity: EntityHandle) -> bool {
        match self.locations.remove(&entity) {
            Some(key) => {
                self.detach(entity, key);
                true
            }
            None => false,
        }
    }

    fn detach(&mut self, entity: EntityHandle, key: ChunkKey) {
        if let Some(cell) = self.cells.get_mut(&key) {
            // Preserve insertion order of the survivors
            if let Some(pos) = cell.iter().position(|&e| e == entity) {
                cell.remove(pos);
            }
            if cell.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Entities in one cell, in insertion order
    pub fn cell(&self, key: ChunkKey) -> &[EntityHandle] {
        self.cells.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Entities in the 3x3 window around `position`
    pub fn query_neighborhood(&self, position: Vec2) -> impl Iterator<Item = EntityHandle> + '_ {
        let (cx, cy) = self.key_for(position);
        NEIGHBOR_OFFSETS
            .iter()
            .flat_map(move |&(dx, dy)| self.cell((cx + dx, cy + dy)).iter().copied())
    }

    pub fn contains(&self, entity: EntityHandle) -> bool {
        self.locations.contains_key(&entity)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityArena;

    fn chunks() -> CollectableChunks {
        CollectableChunks::new(Fp::from_int(16))
    }

    #[test]
    fn test_key_for_negative_positions() {
        let c = chunks();
        assert_eq!(c.key_for(Vec2::from_ints(0, 0)), (0, 0));
        assert_eq!(c.key_for(Vec2::from_ints(15, 16)), (0, 1));
        assert_eq!(c.key_for(Vec2::new(Fp::from_milli(-1), Fp::ZERO)), (-1, 0));
        assert_eq!(c.key_for(Vec2::from_ints(-16, -17)), (-1, -2));
    }

    #[test]
    fn test_query_neighborhood_order() {
        let mut arena = EntityArena::new();
        let mut c = chunks();
        let east = arena.create();
        let home = arena.create();
        let west = arena.create();
        let far = arena.create();
        c.insert(east, Vec2::from_ints(20, 4));
        c.insert(home, Vec2::from_ints(4, 4));
        c.insert(west, Vec2::from_ints(-4, 4));
        c.insert(far, Vec2::from_ints(40, 4));

        let seen: Vec<_> = c.query_neighborhood(Vec2::from_ints(5, 5)).collect();
        assert_eq!(seen, vec![home, west, east]);
    }

    #[test]
    fn test_reinsert_moves_between_cells() {
        let mut arena = EntityArena::new();
        let mut c = chunks();
        let e = arena.create();
        c.insert(e, Vec2::from_ints(1, 1));
        c.insert(e, Vec2::from_ints(100, 100));
        assert_eq!(c.len(), 1);
        assert_eq!(c.cell_count(), 1);
        assert!(c.cell((0, 0)).is_empty());
        assert_eq!(c.cell((6, 6)), &[e]);
    }

    #[test]
    fn test_remove() {
        let mut arena = EntityArena::new();
        let mut c = chunks();
        let a = arena.create();
        let b = arena.create();
        c.insert(a, Vec2::from_ints(1, 1));
        c.insert(b, Vec2::from_ints(2, 2));
        assert!(c.remove(a));
        assert!(!c.remove(a));
        assert_eq!(c.cell((0, 0)), &[b]);
        assert!(c.remove(b));
        assert!(c.is_empty());
        assert_eq!(c.cell_count(), 0);
    }
}
