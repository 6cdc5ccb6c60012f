//! Idempotency cache (§4.D): a bounded, insertion-ordered FIFO mapping
//! transaction ids to the response they produced the first time they
//! were executed.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::ids::TxId;

/// Default bound per §3 ("Bounded to a configured maximum (default
/// 10,000)").
pub const DEFAULT_BOUND: usize = 10_000;

/// A previously produced response, cached verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
}

/// Bounded FIFO cache: `record` appends and evicts the oldest entry
/// once the bound is exceeded; `lookup` never mutates ordering
/// (straight replay, not LRU).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdempotencyCache {
    bound: usize,
    order: VecDeque<TxId>,
    entries: HashMap<TxId, CachedResponse>,
}

impl IdempotencyCache {
    pub fn new(bound: usize) -> Self {
        Self {
            bound: bound.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn lookup(&self, tx_id: &TxId) -> Option<&CachedResponse> {
        self.entries.get(tx_id)
    }

    /// Records a response. If `tx_id` is already present the call is a
    /// no-op — the first recorded response always wins, including
    /// across replays of a transaction that failed transiently.
    pub fn record(&mut self, tx_id: TxId, status_code: u16, body: serde_json::Value) {
        if self.entries.contains_key(&tx_id) {
            return;
        }
        self.order.push_back(tx_id.clone());
        self.entries.insert(
            tx_id,
            CachedResponse {
                status_code,
                body,
            },
        );
        while self.order.len() > self.bound {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }
}

impl Default for IdempotencyCache {
    fn default() -> Self {
        Self::new(DEFAULT_BOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_returns_first_recorded_response() {
        let mut cache = IdempotencyCache::new(10);
        cache.record(TxId::from("a"), 200, serde_json::json!({"v": 1}));
        cache.record(TxId::from("a"), 500, serde_json::json!({"v": 2}));
        let cached = cache.lookup(&TxId::from("a")).unwrap();
        assert_eq!(cached.status_code, 200);
        assert_eq!(cached.body, serde_json::json!({"v": 1}));
    }

    #[test]
    fn bound_evicts_oldest_first() {
        let mut cache = IdempotencyCache::new(3);
        for id in ["A", "B", "C", "D"] {
            cache.record(TxId::from(id), 200, serde_json::json!(id));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.lookup(&TxId::from("A")).is_none());
        assert!(cache.lookup(&TxId::from("D")).is_some());
    }
}
