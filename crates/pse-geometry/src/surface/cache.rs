//! Per-surface auxiliary cache.
//!
//! Evaluators check interchangeable scratch blocks out of a pool instead of
//! sharing one mutable field, so concurrent evaluations of the same surface never
//! observe each other's intermediate state. The pool is an arena of blocks plus a
//! list of idle keys; a checked-out block leaves an empty slot behind.
//!
//! Every structural edit of the owning surface calls [`AuxCache::reset`], which
//! bumps the generation counter. Idle blocks are cleared immediately; blocks that
//! are checked out notice the new generation on their next access and clear
//! themselves then.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use pse_math::{DMat3, DVec3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Checkout index of a scratch block in the pool arena.
    pub struct ScratchKey;
}

/// Number of vector slots in a scratch block.
pub const VECTOR_SLOTS: usize = 16;
/// Number of matrix slots in a scratch block.
pub const MATRIX_SLOTS: usize = 8;

/// Scratch storage reused across evaluations of one surface.
pub struct Scratch {
    generation: u64,
    key: Option<f64>,
    pub vectors: [DVec3; VECTOR_SLOTS],
    pub matrices: [DMat3; MATRIX_SLOTS],
    derived: Option<Box<dyn Any + Send + Sync>>,
}

impl Scratch {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            key: None,
            vectors: [DVec3::ZERO; VECTOR_SLOTS],
            matrices: [DMat3::ZERO; MATRIX_SLOTS],
            derived: None,
        }
    }

    fn clear(&mut self, generation: u64) {
        self.generation = generation;
        self.key = None;
        self.vectors = [DVec3::ZERO; VECTOR_SLOTS];
        self.matrices = [DMat3::ZERO; MATRIX_SLOTS];
        self.derived = None;
    }

    /// Whether the slots hold values computed for parameter `key`.
    pub fn holds(&self, key: f64) -> bool {
        self.key == Some(key)
    }

    /// Record that the slots now hold values for parameter `key`.
    pub fn set_key(&mut self, key: f64) {
        self.key = Some(key);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Derived object of type `T`, computed by `init` on first use after a reset.
    pub fn derived_or_insert_with<T, F>(&mut self, init: F) -> &T
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let fresh = !matches!(&self.derived, Some(d) if d.is::<T>());
        if fresh {
            self.derived = Some(Box::new(init()));
        }
        match self.derived.as_ref().and_then(|d| d.downcast_ref::<T>()) {
            Some(value) => value,
            None => unreachable!("derived slot was just filled with this type"),
        }
    }

    pub fn has_derived(&self) -> bool {
        self.derived.is_some()
    }
}

/// A block outside any pool, for one-off evaluations.
impl Default for Scratch {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for Scratch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scratch")
            .field("generation", &self.generation)
            .field("key", &self.key)
            .field("has_derived", &self.derived.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Pool {
    arena: SlotMap<ScratchKey, Option<Scratch>>,
    idle: Vec<ScratchKey>,
}

/// Pool of scratch blocks owned by one surface instance.
pub struct AuxCache {
    generation: AtomicU64,
    pool: Mutex<Pool>,
    max_idle: usize,
}

/// Snapshot of the pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub generation: u64,
    pub idle: usize,
    pub checked_out: usize,
}

impl AuxCache {
    pub const DEFAULT_MAX_IDLE: usize = 16;

    pub fn new(max_idle: usize) -> Self {
        Self {
            generation: AtomicU64::new(0),
            pool: Mutex::new(Pool::default()),
            max_idle,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Check out a scratch block; it returns to the pool when the guard drops.
    pub fn acquire(&self) -> ScratchGuard<'_> {
        let generation = self.generation();
        let mut pool = self.pool.lock();
        while let Some(key) = pool.idle.pop() {
            if let Some(block) = pool.arena.get_mut(key).and_then(Option::take) {
                return ScratchGuard {
                    cache: self,
                    key,
                    block: Some(block),
                };
            }
        }
        let key = pool.arena.insert(None);
        ScratchGuard {
            cache: self,
            key,
            block: Some(Scratch::new(generation)),
        }
    }

    /// Invalidate cached content.
    ///
    /// Idle blocks are cleared (dropped when `force`); checked-out blocks are left
    /// alone and revalidate lazily on their next access.
    pub fn reset(&self, force: bool) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut pool = self.pool.lock();
        if force {
            let idle = std::mem::take(&mut pool.idle);
            for key in idle {
                pool.arena.remove(key);
            }
        } else {
            let Pool { arena, idle } = &mut *pool;
            for key in idle.iter() {
                if let Some(Some(block)) = arena.get_mut(*key) {
                    block.clear(generation);
                }
            }
        }
        tracing::trace!(generation, force, "auxiliary cache reset");
    }

    pub fn stats(&self) -> CacheStats {
        let pool = self.pool.lock();
        CacheStats {
            generation: self.generation(),
            idle: pool.idle.len(),
            checked_out: pool.arena.len() - pool.idle.len(),
        }
    }

    fn release(&self, key: ScratchKey, block: Scratch) {
        let mut pool = self.pool.lock();
        if pool.idle.len() < self.max_idle {
            if let Some(slot) = pool.arena.get_mut(key) {
                *slot = Some(block);
                pool.idle.push(key);
                return;
            }
        }
        pool.arena.remove(key);
    }
}

impl Default for AuxCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_IDLE)
    }
}

/// A fresh, empty cache with the same pool bound.
impl Clone for AuxCache {
    fn clone(&self) -> Self {
        Self::new(self.max_idle)
    }
}

impl std::fmt::Debug for AuxCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuxCache").field("stats", &self.stats()).finish()
    }
}

/// A checked-out scratch block.
pub struct ScratchGuard<'a> {
    cache: &'a AuxCache,
    key: ScratchKey,
    block: Option<Scratch>,
}

impl ScratchGuard<'_> {
    /// The block, cleared first if the cache was reset since it was last used.
    pub fn block(&mut self) -> &mut Scratch {
        let generation = self.cache.generation();
        let block = self.block.get_or_insert_with(|| Scratch::new(generation));
        if block.generation != generation {
            block.clear(generation);
        }
        block
    }

    pub fn key(&self) -> ScratchKey {
        self.key
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.cache.release(self.key, block);
        }
    }
}
