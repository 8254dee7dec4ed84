//! Endpoint selection behind a single dispatch contract.
//!
//! Each policy implements [`LoadBalance`]; the [`Balancer`] owns input
//! validation and the size-0/1 fast paths and delegates everything else to
//! the policy fixed at construction.

pub mod consistent_hash;
pub mod error;
pub mod least_active;
pub mod random;
pub mod round_robin;
pub mod weight;

use std::{fmt, sync::Arc};

pub use consistent_hash::ConsistentHashBalance;
pub use least_active::LeastActiveBalance;
pub use random::WeightedRandomBalance;
pub use round_robin::RoundRobinBalance;
pub use weight::resolve_weight;

use self::error::LoadBalanceError;
use crate::{
    context::{Invocation, Target},
    discovery::Instance,
    status::ActiveCounter,
};

/// [`LoadBalance`] promises the behavior of one selection policy.
///
/// `pick` must return a member of `candidates`, must be safe for concurrent
/// callers, and must not block or perform I/O. The [`Balancer`] never calls
/// it with fewer than two candidates, but implementations stay well-defined
/// on any input.
pub trait LoadBalance: Send + Sync + 'static {
    fn pick(
        &self,
        candidates: &[Arc<Instance>],
        target: &Target,
        invocation: &Invocation,
    ) -> Result<Arc<Instance>, LoadBalanceError>;
}

/// Policy selection, fixed per [`Balancer`] instance.
///
/// The string identifiers used for configuration routing are `"random"`,
/// `"roundrobin"`, `"leastactive"` and `"consistenthash"`.
#[derive(Clone)]
pub enum LoadBalanceStrategy {
    Random,
    RoundRobin,
    /// Carries the external observable the policy reads in-flight counts
    /// from: [`ActiveTracker::global()`](crate::status::ActiveTracker::global)
    /// or a counter of your own.
    LeastActive(Arc<dyn ActiveCounter>),
    ConsistentHash,
}

impl LoadBalanceStrategy {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::RoundRobin => "roundrobin",
            Self::LeastActive(_) => "leastactive",
            Self::ConsistentHash => "consistenthash",
        }
    }

    /// Resolves a configuration identifier; `counter` feeds the
    /// least-active variant and is ignored by the others.
    pub fn from_name(name: &str, counter: Arc<dyn ActiveCounter>) -> Option<Self> {
        match name {
            "random" => Some(Self::Random),
            "roundrobin" => Some(Self::RoundRobin),
            "leastactive" => Some(Self::LeastActive(counter)),
            "consistenthash" => Some(Self::ConsistentHash),
            _ => None,
        }
    }
}

impl fmt::Debug for LoadBalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct LoadBalanceFactory;

impl LoadBalanceFactory {
    pub fn create(strategy: LoadBalanceStrategy) -> Box<dyn LoadBalance> {
        match strategy {
            LoadBalanceStrategy::Random => Box::new(WeightedRandomBalance::new()),
            LoadBalanceStrategy::RoundRobin => Box::new(RoundRobinBalance::new()),
            LoadBalanceStrategy::LeastActive(counter) => {
                Box::new(LeastActiveBalance::new(counter))
            }
            LoadBalanceStrategy::ConsistentHash => Box::new(ConsistentHashBalance::new()),
        }
    }
}

/// The single entry point: validates the candidate set and routes to the
/// configured policy.
pub struct Balancer {
    policy: Box<dyn LoadBalance>,
}

impl Balancer {
    pub fn new(strategy: LoadBalanceStrategy) -> Self {
        Self {
            policy: LoadBalanceFactory::create(strategy),
        }
    }

    /// Wraps a custom policy implementation.
    pub fn with_policy(policy: Box<dyn LoadBalance>) -> Self {
        Self { policy }
    }

    /// Selects exactly one candidate for this invocation.
    ///
    /// An empty set fails with [`LoadBalanceError::EmptyCandidates`]; a
    /// single candidate is returned unconditionally without any policy
    /// work, weight resolution included.
    pub fn select(
        &self,
        candidates: &[Arc<Instance>],
        target: &Target,
        invocation: &Invocation,
    ) -> Result<Arc<Instance>, LoadBalanceError> {
        match candidates {
            [] => Err(LoadBalanceError::EmptyCandidates),
            [only] => Ok(only.clone()),
            _ => self.policy.pick(candidates, target, invocation),
        }
    }
}
