use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub cycles_started: Arc<AtomicU64>,
    pub snapshots_emitted: Arc<AtomicU64>,

    // trigger outcomes
    pub triggers_coalesced: Arc<AtomicU64>,
    pub triggers_suppressed: Arc<AtomicU64>,
    pub preflight_failures: Arc<AtomicU64>,

    // per-instrument outcomes
    pub instruments_ok: Arc<AtomicU64>,
    pub instruments_failed: Arc<AtomicU64>,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
