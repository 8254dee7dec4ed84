use std::sync::Arc;

use rand::Rng;

use super::{
    error::LoadBalanceError,
    weight::{now_ms, resolve_weight_at},
    LoadBalance,
};
use crate::{
    context::{Invocation, Target},
    discovery::Instance,
};

/// Inverse-CDF lookup: returns the first index whose cumulative weight
/// exceeds `offset`, scanning in input order.
#[inline]
pub(crate) fn pick_weighted(mut offset: i64, weights: &[u32]) -> Option<usize> {
    for (index, weight) in weights.iter().enumerate() {
        offset -= i64::from(*weight);
        if offset < 0 {
            return Some(index);
        }
    }
    None
}

/// Chooses a candidate with probability proportional to its effective
/// weight, with a uniform fast path when all weights are equal.
#[derive(Debug, Default)]
pub struct WeightedRandomBalance;

impl WeightedRandomBalance {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalance for WeightedRandomBalance {
    fn pick(
        &self,
        candidates: &[Arc<Instance>],
        _target: &Target,
        invocation: &Invocation,
    ) -> Result<Arc<Instance>, LoadBalanceError> {
        if candidates.is_empty() {
            return Err(LoadBalanceError::EmptyCandidates);
        }

        let now = now_ms();
        let mut weights = Vec::with_capacity(candidates.len());
        let mut total: i64 = 0;
        let mut all_equal = true;
        for candidate in candidates {
            let weight = resolve_weight_at(candidate, &invocation.method, now);
            if !weights.is_empty() && weight != weights[0] {
                all_equal = false;
            }
            total += i64::from(weight);
            weights.push(weight);
        }

        let mut rng = rand::rng();
        if total > 0 && !all_equal {
            let offset = rng.random_range(0..total);
            if let Some(index) = pick_weighted(offset, &weights) {
                return Ok(candidates[index].clone());
            }
        }
        Ok(candidates[rng.random_range(0..candidates.len())].clone())
    }
}
