//! In-flight call accounting consumed by the least-active policy.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use dashmap::DashMap;
use faststr::FastStr;
use once_cell::sync::Lazy;

use crate::net::Address;

/// Read side of the active-call observable.
///
/// The balancer only reads through this trait; whoever drives the RPC is
/// responsible for keeping the counts current around each call.
pub trait ActiveCounter: Send + Sync + 'static {
    /// Number of in-flight calls to `address` for `method`.
    fn active(&self, address: &Address, method: &str) -> u32;
}

/// Bundled implementation of [`ActiveCounter`].
///
/// Callers bracket each RPC with [`begin`](Self::begin) /
/// [`end`](Self::end); fast responders drain their count quickly and
/// naturally attract load under the least-active policy.
#[derive(Debug, Default)]
pub struct ActiveTracker {
    counters: DashMap<(Address, FastStr), AtomicU32>,
}

static GLOBAL_TRACKER: Lazy<Arc<ActiveTracker>> = Lazy::new(|| Arc::new(ActiveTracker::new()));

impl ActiveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide tracker shared by callers that do not thread their own.
    pub fn global() -> Arc<ActiveTracker> {
        GLOBAL_TRACKER.clone()
    }

    pub fn begin(&self, address: &Address, method: &str) {
        self.counters
            .entry((address.clone(), FastStr::new(method)))
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Saturating decrement; an `end` without a matching `begin` stays at 0.
    pub fn end(&self, address: &Address, method: &str) {
        if let Some(counter) = self.counters.get(&(address.clone(), FastStr::new(method))) {
            let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(1))
            });
        }
    }
}

impl ActiveCounter for ActiveTracker {
    fn active(&self, address: &Address, method: &str) -> u32 {
        self.counters
            .get(&(address.clone(), FastStr::new(method)))
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}
