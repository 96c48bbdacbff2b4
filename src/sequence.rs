//! C3: the sequence source — a process-wide component producing strictly
//! monotonic per-lot 64-bit positive integers.

use std::sync::atomic::{AtomicI64, Ordering};

use crossbeam_utils::CachePadded;
use dashmap::DashMap;

use crate::ids::{EntityId, Sequence};

/// `next` is atomic; consecutive calls for the same lot produce strictly
/// increasing values, the first call returns 1, and different lots are
/// independent. Thread-safe under arbitrary parallelism.
///
/// Two implementations are contemplated by the spec: this trait is the
/// contract both the in-process counter below and a centralized
/// remote-increment implementation (keyed by `bid:seq:{lotId}`, for
/// multi-instance deployments) would satisfy. Only the centralized variant
/// preserves ordering across instances; this crate ships the in-process one.
pub trait SequenceSource: Send + Sync {
    fn next(&self, lot_id: EntityId) -> Sequence;

    /// Last issued value, `0` if never issued. Diagnostic only.
    fn current(&self, lot_id: EntityId) -> Sequence;
}

/// An atomic counter per lot in a concurrent map.
#[derive(Default)]
pub struct InProcessSequenceSource {
    counters: DashMap<EntityId, CachePadded<AtomicI64>>,
}

impl InProcessSequenceSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceSource for InProcessSequenceSource {
    fn next(&self, lot_id: EntityId) -> Sequence {
        self.counters
            .entry(lot_id)
            .or_insert_with(|| CachePadded::new(AtomicI64::new(0)))
            .fetch_add(1, Ordering::SeqCst)
            + 1
    }

    fn current(&self, lot_id: EntityId) -> Sequence {
        self.counters
            .get(&lot_id)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}
