//! Shared control state between a running search and the thread that owns it.
//!
//! The foreground search and the ponder thread each get their own
//! `SearchControl`. The owner can stop a search at any node boundary, or move
//! its deadline while it runs (a ponder hit turns the open-ended ponder budget
//! into the real move budget).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

const UNLIMITED: u64 = u64::MAX;

#[derive(Debug)]
pub struct SearchControl {
    stop: AtomicBool,
    time_budget_ms: AtomicU64, // UNLIMITED means no deadline
    started_at: Mutex<Instant>,
}

impl SearchControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: AtomicBool::new(false),
            time_budget_ms: AtomicU64::new(UNLIMITED),
            started_at: Mutex::new(Instant::now()),
        })
    }

    pub fn with_time_budget_ms(budget_ms: Option<u64>) -> Arc<Self> {
        let control = Self::new();
        control.set_time_budget_ms(budget_ms);
        control
    }

    #[inline]
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Clear the stop flag and restart the clock.
    pub fn restart(&self) {
        self.stop.store(false, Ordering::Relaxed);
        *self.started_at.lock() = Instant::now();
    }

    #[inline]
    pub fn set_time_budget_ms(&self, budget_ms: Option<u64>) {
        self.time_budget_ms
            .store(budget_ms.map_or(UNLIMITED, |ms| ms.min(UNLIMITED - 1)), Ordering::Relaxed);
    }

    /// Allow `extra_ms` more from now, measured against the original start.
    pub fn extend_time_budget_ms(&self, extra_ms: u64) {
        let budget = self.elapsed_ms().saturating_add(extra_ms).min(UNLIMITED - 1);
        self.time_budget_ms.store(budget, Ordering::Relaxed);
    }

    #[inline]
    pub fn time_budget_ms(&self) -> Option<u64> {
        match self.time_budget_ms.load(Ordering::Relaxed) {
            UNLIMITED => None,
            ms => Some(ms),
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.lock().elapsed().as_millis() as u64
    }

    pub fn time_budget_exceeded(&self) -> bool {
        match self.time_budget_ms() {
            None => false,
            Some(budget_ms) => self.elapsed_ms() >= budget_ms,
        }
    }

    #[inline]
    pub fn should_abort(&self) -> bool {
        self.should_stop() || self.time_budget_exceeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn stop_flag_round_trip() {
        let control = SearchControl::new();
        assert!(!control.should_abort());
        control.request_stop();
        assert!(control.should_stop());
        assert!(control.should_abort());

        control.restart();
        assert!(!control.should_stop());
    }

    #[test]
    fn unlimited_budget_never_expires() {
        let control = SearchControl::with_time_budget_ms(None);
        assert_eq!(control.time_budget_ms(), None);
        assert!(!control.time_budget_exceeded());
    }

    #[test]
    fn budget_expires_and_can_be_extended() {
        let control = SearchControl::with_time_budget_ms(Some(1));
        thread::sleep(Duration::from_millis(5));
        assert!(control.time_budget_exceeded());

        control.extend_time_budget_ms(60_000);
        assert!(!control.time_budget_exceeded());
        assert!(control.time_budget_ms().expect("budget set") >= 60_000);
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let control = SearchControl::with_time_budget_ms(Some(0));
        assert_eq!(control.time_budget_ms(), Some(0));
        assert!(control.time_budget_exceeded());
        assert!(control.should_abort());

        control.set_time_budget_ms(None);
        assert!(!control.should_abort());
    }
}
