//! Generational entity handles and dense component columns
//!
//! Entities are slots in an arena. A handle carries the slot index plus the
//! generation it was issued with, so a handle to a destroyed (and possibly
//! reused) slot is detected rather than dereferenced.
//!
//! Components live in `ComponentColumn<T>`: a dense `Vec<Option<T>>` indexed
//! by slot. Iteration is always by ascending index, which is the stable,
//! simulation-defined order every system relies on.

use bitvec::prelude::*;
use std::fmt;

/// Weak, generation-checked reference to a simulation entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}:{}", self.index, self.generation)
    }
}

/// Slot allocator issuing generational handles
#[derive(Debug, Default, Clone)]
pub struct EntityArena {
    generations: Vec<u32>,
    alive: BitVec,
    /// Freed slots, reused last-in first-out
    free: Vec<u32>,
    live: usize,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> EntityHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.alive.set(index as usize, true);
            return EntityHandle { index, generation: self.generations[index as usize] };
        }
        let index = self.generations.len() as u32;
        self.generations.push(1);
        self.alive.push(true);
        EntityHandle { index, generation: 1 }
    }

    /// Returns false if the handle was already stale
    pub fn destroy(&mut self, handle: EntityHandle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        let index = handle.index();
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.alive.set(index, false);
        self.free.push(handle.index);
        self.live -= 1;
        true
    }

    #[inline]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        let index = handle.index();
        index < self.generations.len() && self.alive[index] && self.generations[index] == handle.generation
    }

    /// Current handle for a live slot
    pub fn handle_at(&self, index: usize) -> Option<EntityHandle> {
        if index < self.generations.len() && self.alive[index] {
            Some(EntityHandle { index: index as u32, generation: self.generations[index] })
        } else {
            None
        }
    }

    /// Live handles in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.alive.iter_ones().map(move |index| EntityHandle {
            index: index as u32,
            generation: self.generations[index],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated (live or free)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}

/// Dense per-slot component storage
#[derive(Debug, Clone)]
pub struct ComponentColumn<T> {
    slots: Vec<Option<T>>,
    count: usize,
}

impl<T> Default for ComponentColumn<T> {
    fn default() -> Self {
        Self { slots: Vec::new(), count: 0 }
    }
}

impl<T> ComponentColumn<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, index: usize, value: T) -> Option<T> {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let previous = self.slots[index].replace(value);
        if previous.is_none() {
            self.count += 1;
        }
        previous
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        let removed = self.slots.get_mut(index).and_then(Option::take);
        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Occupied slots in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| slot.as_mut().map(|v| (i, v)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Highest slot index + 1 that was ever touched
    #[inline]
    pub fn span(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_destroy() {
        let mut arena = EntityArena::new();
        let a = arena.create();
        let b = arena.create();
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert!(arena.destroy(a));
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert!(!arena.destroy(a));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena = EntityArena::new();
        let a = arena.create();
        arena.destroy(a);
        let reused = arena.create();
        assert_eq!(reused.index(), a.index());
        assert_ne!(reused.generation(), a.generation());
        assert!(!arena.contains(a));
        assert!(arena.contains(reused));
    }

    #[test]
    fn test_iteration_is_ascending() {
        let mut arena = EntityArena::new();
        let handles: Vec<_> = (0..5).map(|_| arena.create()).collect();
        arena.destroy(handles[2]);
        let seen: Vec<_> = arena.iter().map(|h| h.index()).collect();
        assert_eq!(seen, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_handle_at() {
        let mut arena = EntityArena::new();
        let a = arena.create();
        assert_eq!(arena.handle_at(a.index()), Some(a));
        arena.destroy(a);
        assert_eq!(arena.handle_at(a.index()), None);
        assert_eq!(arena.handle_at(99), None);
    }

    #[test]
    fn test_column_insert_remove() {
        let mut column = ComponentColumn::new();
        assert!(column.insert(3, "c").is_none());
        assert!(column.insert(1, "a").is_none());
        assert_eq!(column.insert(1, "b"), Some("a"));
        assert_eq!(column.len(), 2);
        assert_eq!(column.iter().map(|(i, v)| (i, *v)).collect::<Vec<_>>(), vec![(1, "b"), (3, "c")]);
        assert_eq!(column.remove(3), Some("c"));
        assert_eq!(column.remove(3), None);
        assert_eq!(column.len(), 1);
    }
}
