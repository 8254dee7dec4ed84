use std::sync::Arc;

use rand::Rng;

use super::{
    error::LoadBalanceError,
    random::pick_weighted,
    weight::{now_ms, resolve_weight_at},
    LoadBalance,
};
use crate::{
    context::{Invocation, Target},
    discovery::Instance,
    status::ActiveCounter,
};

/// Picks among the candidates with the minimum observed in-flight count,
/// breaking ties by effective weight and equal weights uniformly.
pub struct LeastActiveBalance {
    counter: Arc<dyn ActiveCounter>,
}

impl LeastActiveBalance {
    pub fn new(counter: Arc<dyn ActiveCounter>) -> Self {
        Self { counter }
    }
}

impl LoadBalance for LeastActiveBalance {
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
        let mut least = u32::MAX;
        let mut ties: Vec<usize> = Vec::with_capacity(candidates.len());
        let mut tie_weights: Vec<u32> = Vec::with_capacity(candidates.len());
        let mut total_weight: i64 = 0;
        let mut first_weight = 0u32;
        let mut same_weight = true;

        for (index, candidate) in candidates.iter().enumerate() {
            let active = self.counter.active(&candidate.address, &invocation.method);
            let weight = resolve_weight_at(candidate, &invocation.method, now);
            if active < least {
                least = active;
                ties.clear();
                tie_weights.clear();
                ties.push(index);
                tie_weights.push(weight);
                total_weight = i64::from(weight);
                first_weight = weight;
                same_weight = true;
            } else if active == least {
                ties.push(index);
                tie_weights.push(weight);
                total_weight += i64::from(weight);
                if weight != first_weight {
                    same_weight = false;
                }
            }
        }

        if ties.len() == 1 {
            return Ok(candidates[ties[0]].clone());
        }

        let mut rng = rand::rng();
        if !same_weight && total_weight > 0 {
            let offset = rng.random_range(0..total_weight);
            if let Some(position) = pick_weighted(offset, &tie_weights) {
                return Ok(candidates[ties[position]].clone());
            }
        }
        Ok(candidates[ties[rng.random_range(0..ties.len())]].clone())
    }
}
