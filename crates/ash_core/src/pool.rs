//! Fixed-capacity missile slot pools.
//!
//! Live missiles sit in a dense array for cache-friendly per-tick
//! iteration. Removal swaps the last occupant into the freed index, so
//! iteration order is **not** preserved: the tick loop re-reads the
//! occupant of an index after any call that might remove a missile
//! instead of assuming monotonic advancement.
//!
//! A sparse slot table with generation counters turns (slot, generation)
//! pairs into stable [`MissileHandle`]s that survive compaction and
//! detect reuse.

use crate::missile::{Missile, PoolKind};

/// Hard cap on concurrent world-visible missiles. Exceeding it is a
/// configuration error, not a backpressure signal.
pub const MAX_GLOBAL_MISSILES: usize = 1800;

/// Hard cap on concurrent local (cosmetic) missiles.
pub const MAX_LOCAL_MISSILES: usize = MAX_GLOBAL_MISSILES * 8;

/// Stable reference to a pooled missile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MissileHandle {
    /// Pool the missile lives in.
    pub pool: PoolKind,
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct SlotEntry {
    generation: u32,
    dense: u32,
}

/// One fixed-capacity pool of live missiles.
#[derive(Debug)]
pub struct MissilePool {
    kind: PoolKind,
    capacity: usize,
    dense: Vec<Missile>,
    slots: Vec<SlotEntry>,
    free_slots: Vec<u32>,
}

impl MissilePool {
    /// Create an empty pool.
    #[must_use]
    pub fn new(kind: PoolKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            dense: Vec::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    /// Which pool this is.
    #[must_use]
    pub const fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Number of live missiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the pool holds no missiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Maximum number of concurrent missiles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a missile, returning its stable handle.
    ///
    /// # Panics
    /// Panics when the pool is at capacity. The caps are hard limits on
    /// concurrent missiles; exhausting one is fatal.
    pub fn insert(&mut self, mut missile: Missile) -> MissileHandle {
        if self.dense.len() == self.capacity {
            tracing::error!(
                pool = ?self.kind,
                capacity = self.capacity,
                "missile pool exhausted"
            );
            panic!("missile pool exhausted: {:?}", self.kind);
        }
        let slot = self.free_slots.pop().unwrap_or_else(|| {
            self.slots.push(SlotEntry {
                generation: 0,
                dense: 0,
            });
            (self.slots.len() - 1) as u32
        });
        let dense_index = self.dense.len() as u32;
        self.slots[slot as usize].dense = dense_index;
        missile.slot = slot;
        missile.pool = self.kind;
        let generation = self.slots[slot as usize].generation;
        self.dense.push(missile);
        MissileHandle {
            pool: self.kind,
            slot,
            generation,
        }
    }

    /// Remove the missile at a dense index by swapping the last occupant
    /// into its place. Unit references must already be released.
    pub fn remove_at(&mut self, index: usize) -> Missile {
        let missile = self.dense.swap_remove(index);
        let slot = missile.slot as usize;
        debug_assert_eq!(
            self.slots[slot].dense as usize, index,
            "slot table out of sync with dense array"
        );
        self.slots[slot].generation = self.slots[slot].generation.wrapping_add(1);
        self.free_slots.push(missile.slot);
        if index < self.dense.len() {
            let moved_slot = self.dense[index].slot as usize;
            self.slots[moved_slot].dense = index as u32;
        }
        missile
    }

    /// Handle of the missile currently at a dense index.
    #[must_use]
    pub fn handle_at(&self, index: usize) -> MissileHandle {
        let slot = self.dense[index].slot;
        MissileHandle {
            pool: self.kind,
            slot,
            generation: self.slots[slot as usize].generation,
        }
    }

    /// Missile at a dense index.
    #[must_use]
    pub fn at(&self, index: usize) -> &Missile {
        &self.dense[index]
    }

    /// Mutable missile at a dense index.
    pub fn at_mut(&mut self, index: usize) -> &mut Missile {
        &mut self.dense[index]
    }

    /// Resolve a handle to its current dense index, if still live.
    #[must_use]
    pub fn index_of(&self, handle: MissileHandle) -> Option<usize> {
        if handle.pool != self.kind {
            return None;
        }
        let entry = self.slots.get(handle.slot as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        Some(entry.dense as usize)
    }

    /// Resolve a handle to the missile, if still live.
    #[must_use]
    pub fn get(&self, handle: MissileHandle) -> Option<&Missile> {
        self.index_of(handle).map(|i| &self.dense[i])
    }

    /// Resolve a handle to the missile mutably, if still live.
    pub fn get_mut(&mut self, handle: MissileHandle) -> Option<&mut Missile> {
        self.index_of(handle).map(|i| &mut self.dense[i])
    }

    /// Iterate live missiles in current slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Missile> {
        self.dense.iter()
    }
}
