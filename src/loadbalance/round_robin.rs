use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;
use faststr::FastStr;

use super::{
    error::LoadBalanceError,
    weight::{now_ms, resolve_weight_at},
    LoadBalance,
};
use crate::{
    context::{method_key, Invocation, Target},
    discovery::Instance,
};

/// Deterministic weighted rotation: over one full cycle of `weight_sum`
/// calls, candidate `i` is picked exactly `weight[i]` times. With uniform
/// weights this degenerates to plain round-robin.
///
/// The per-method sequence counter persists across candidate-set changes;
/// weights are recomputed on every call, so a stale counter only shifts the
/// phase of the rotation. The deficit walk is O(max_weight × n) in the
/// worst case and can dwell on a heavily-weighted candidate late in the
/// cycle.
#[derive(Debug, Default)]
pub struct RoundRobinBalance {
    counters: DashMap<FastStr, AtomicU64>,
}

impl RoundRobinBalance {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(&self, key: FastStr) -> u64 {
        if let Some(counter) = self.counters.get(&key) {
            return counter.fetch_add(1, Ordering::Relaxed);
        }
        self.counters
            .entry(key)
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl LoadBalance for RoundRobinBalance {
    fn pick(
        &self,
        candidates: &[Arc<Instance>],
        target: &Target,
        invocation: &Invocation,
    ) -> Result<Arc<Instance>, LoadBalanceError> {
        if candidates.is_empty() {
            return Err(LoadBalanceError::EmptyCandidates);
        }

        let now = now_ms();
        let mut min_weight = u32::MAX;
        let mut max_weight = 0u32;
        let mut weight_sum: u64 = 0;
        // Insertion-ordered per-candidate quota, positive weights only.
        let mut quotas: Vec<(usize, u32)> = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let weight = resolve_weight_at(candidate, &invocation.method, now);
            min_weight = min_weight.min(weight);
            max_weight = max_weight.max(weight);
            weight_sum += u64::from(weight);
            if weight > 0 {
                quotas.push((index, weight));
            }
        }

        let sequence = self.next_sequence(method_key(target, invocation));

        if max_weight > 0 && min_weight < max_weight {
            let mut offset = sequence % weight_sum;
            for _ in 0..max_weight {
                for (index, remaining) in quotas.iter_mut() {
                    if offset == 0 && *remaining > 0 {
                        return Ok(candidates[*index].clone());
                    }
                    if *remaining > 0 {
                        *remaining -= 1;
                        offset -= 1;
                    }
                }
            }
        }

        Ok(candidates[(sequence % candidates.len() as u64) as usize].clone())
    }
}
