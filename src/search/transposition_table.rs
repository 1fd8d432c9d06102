//! Fixed-size transposition table keyed by Zobrist fingerprint.
//!
//! Shared by the foreground search and the ponder thread through an `Arc`.
//! Every slot has its own lock, so two searches only contend when their
//! fingerprints map to the same slot, and a reader never sees a half-written
//! entry. Replacement is depth-preferred with generation aging to evict
//! stale entries from earlier moves of the game.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::move_generation::pawn_move::PawnMove;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Full window searched; the score is exact.
    Exact,
    /// Fail-high cutoff; the true score is at least `score`.
    Lower,
    /// Fail-low; the true score is at most `score`.
    Upper,
}

#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub key: u64,
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<PawnMove>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    entry: Option<TTEntry>,
    generation: u8,
}

#[derive(Debug)]
pub struct TranspositionTable {
    slots: Box<[Mutex<Slot>]>,
    current_generation: AtomicU8,
    probes: AtomicU64,
    hits: AtomicU64,
    stores: AtomicU64,
}

impl TranspositionTable {
    const AGE_REPLACE_THRESHOLD: u8 = 4;
    const DEPTH_REPLACE_MARGIN: u8 = 2;

    pub fn new_with_mb(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let slot_size = std::mem::size_of::<Mutex<Slot>>().max(1);
        Self::with_capacity(bytes / slot_size)
    }

    pub fn with_capacity(slot_count: usize) -> Self {
        let count = slot_count.max(1);
        let slots = (0..count)
            .map(|_| Mutex::new(Slot::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            current_generation: AtomicU8::new(0),
            probes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    /// Advance the generation (once per search call).
    #[inline]
    pub fn new_generation(&self) {
        self.current_generation.fetch_add(1, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for slot in self.slots.iter() {
            *slot.lock() = Slot::default();
        }
        self.current_generation.store(0, Ordering::Relaxed);
        self.probes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.stores.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots. Walks the whole table; diagnostics only.
    pub fn filled(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.lock().entry.is_some())
            .count()
    }

    pub fn stats(&self) -> TTStats {
        TTStats {
            probes: self.probes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }

    #[inline]
    fn slot(&self, key: u64) -> &Mutex<Slot> {
        &self.slots[(key % self.slots.len() as u64) as usize]
    }

    #[inline]
    fn generation(&self) -> u8 {
        self.current_generation.load(Ordering::Relaxed)
    }

    /// Entry for `key` regardless of its depth.
    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        let generation = self.generation();
        let mut slot = self.slot(key).lock();
        let hit = slot.entry.filter(|e| e.key == key);
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            slot.generation = generation;
        }
        hit
    }

    /// Entry for `key` only if it was searched at least `required_depth` deep.
    pub fn lookup(&self, key: u64, required_depth: u8) -> Option<TTEntry> {
        self.probe(key).filter(|e| e.depth >= required_depth)
    }

    /// Best move recorded for `key` at any depth; used for move ordering.
    pub fn best_move(&self, key: u64) -> Option<PawnMove> {
        self.slot(key)
            .lock()
            .entry
            .filter(|e| e.key == key)
            .and_then(|e| e.best_move)
    }

    pub fn store(
        &self,
        key: u64,
        depth: u8,
        score: i32,
        bound: Bound,
        best_move: Option<PawnMove>,
    ) {
        self.store_entry(TTEntry {
            key,
            depth,
            score,
            bound,
            best_move,
        });
    }

    pub fn store_entry(&self, entry: TTEntry) {
        self.stores.fetch_add(1, Ordering::Relaxed);
        let generation = self.generation();
        let mut slot = self.slot(entry.key).lock();

        let replace = match slot.entry {
            None => true,
            Some(existing) if existing.key == entry.key => entry.depth >= existing.depth,
            Some(existing) => {
                let age = generation.wrapping_sub(slot.generation);
                age >= Self::AGE_REPLACE_THRESHOLD
                    || entry.depth.saturating_add(Self::DEPTH_REPLACE_MARGIN) >= existing.depth
            }
        };

        if replace {
            let best_move = match (entry.best_move, slot.entry) {
                // Keep a known move for this position if the new result has none.
                (None, Some(existing)) if existing.key == entry.key => existing.best_move,
                (mv, _) => mv,
            };
            slot.entry = Some(TTEntry { best_move, ..entry });
            slot.generation = generation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bound, TTEntry, TranspositionTable};
    use crate::move_generation::pawn_move::PawnMove;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn store_and_lookup_respect_requested_depth() {
        let tt = TranspositionTable::new_with_mb(1);
        let mv = PawnMove::new(53, 37);
        tt.store(123, 5, 42, Bound::Exact, Some(mv));

        for depth in 0..=5 {
            let got = tt.lookup(123, depth).expect("entry should be usable");
            assert_eq!(got.score, 42);
            assert_eq!(got.best_move, Some(mv));
        }
        assert!(tt.lookup(123, 6).is_none());
        assert!(tt.lookup(124, 0).is_none());
        assert_eq!(tt.best_move(123), Some(mv));
    }

    #[test]
    fn depth_preferred_replacement() {
        let tt = TranspositionTable::new_with_mb(1);
        let key = 555;
        tt.store(key, 2, 1, Bound::Upper, None);
        tt.store(key, 1, 9, Bound::Exact, Some(PawnMove::new(8, 16)));
        assert_eq!(tt.probe(key).expect("exists").score, 1);

        tt.store(key, 6, 3, Bound::Lower, Some(PawnMove::new(9, 17)));
        let got = tt.probe(key).expect("exists");
        assert_eq!(got.depth, 6);
        assert_eq!(got.score, 3);
        assert_eq!(got.bound, Bound::Lower);

        tt.store(key, 6, 4, Bound::Exact, None);
        let got = tt.probe(key).expect("exists");
        assert_eq!(got.score, 4);
        assert_eq!(got.best_move, Some(PawnMove::new(9, 17)));
    }

    #[test]
    fn colliding_keys_prefer_deeper_entries() {
        let tt = TranspositionTable::with_capacity(1);
        tt.store(1, 8, 10, Bound::Exact, None);
        tt.store(2, 3, 20, Bound::Exact, None);
        assert!(tt.probe(2).is_none());
        assert_eq!(tt.probe(1).expect("deep entry survives").score, 10);

        for _ in 0..TranspositionTable::AGE_REPLACE_THRESHOLD {
            tt.new_generation();
        }
        tt.store(2, 3, 20, Bound::Exact, None);
        assert_eq!(tt.probe(2).expect("stale slot replaced").score, 20);
    }

    #[test]
    fn concurrent_stores_keep_the_deepest_entry() {
        let tt = Arc::new(TranspositionTable::with_capacity(64));
        let handles: Vec<_> = (0..4u8)
            .map(|worker| {
                let tt = Arc::clone(&tt);
                thread::spawn(move || {
                    for depth in 0..=20u8 {
                        let depth = if worker % 2 == 0 { depth } else { 20 - depth };
                        tt.store_entry(TTEntry {
                            key: 7,
                            depth,
                            score: i32::from(depth),
                            bound: Bound::Exact,
                            best_move: None,
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker should finish");
        }

        let got = tt.probe(7).expect("entry should exist");
        assert_eq!(got.depth, 20);
        assert_eq!(got.score, 20);
        assert_eq!(tt.stats().stores, 4 * 21);
    }

    #[test]
    fn clear_empties_table_and_stats() {
        let tt = TranspositionTable::with_capacity(16);
        tt.store(3, 1, 0, Bound::Exact, None);
        assert_eq!(tt.filled(), 1);
        tt.clear();
        assert_eq!(tt.filled(), 0);
        assert_eq!(tt.stats().stores, 0);
    }
}
