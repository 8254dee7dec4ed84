use std::{collections::BTreeMap, sync::Arc};

use dashmap::DashMap;
use faststr::FastStr;

use super::{error::LoadBalanceError, LoadBalance};
use crate::{
    context::{method_key, Invocation, Target},
    discovery::Instance,
};

const HASH_NODES_KEY: &str = "hash.nodes";
const HASH_ARGUMENTS_KEY: &str = "hash.arguments";

const DEFAULT_HASH_NODES: i64 = 160;
const DEFAULT_HASH_ARGUMENTS: &str = "0";

/// Maps invocations with identical hashable arguments to the same candidate,
/// stable under unrelated candidate churn.
///
/// Each method key owns an immutable [`Selector`] snapshot; a snapshot is
/// rebuilt whenever the fingerprint of the current candidate set differs
/// from the one it was built for, and the swap publishes atomically through
/// the shared map. Concurrent rebuilds may race; the last publish wins.
#[derive(Debug, Default)]
pub struct ConsistentHashBalance {
    selectors: DashMap<FastStr, Arc<Selector>>,
}

impl ConsistentHashBalance {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One 32-bit ring key per virtual node, widened to u64 for ordered lookup.
#[derive(Debug)]
struct Selector {
    ring: BTreeMap<u64, Arc<Instance>>,
    signature: u64,
    arg_indices: Vec<usize>,
}

impl Selector {
    fn build(
        candidates: &[Arc<Instance>],
        method: &str,
        signature: u64,
    ) -> Result<Self, LoadBalanceError> {
        let first = &candidates[0];
        let replicas = first.method_param_i64(method, HASH_NODES_KEY, DEFAULT_HASH_NODES);
        if replicas <= 0 || replicas % 4 != 0 {
            return Err(LoadBalanceError::MisconfiguredHashNodes(replicas));
        }
        let arg_indices = first
            .method_param(method, HASH_ARGUMENTS_KEY)
            .unwrap_or(DEFAULT_HASH_ARGUMENTS)
            .split(',')
            .filter_map(|part| part.trim().parse::<usize>().ok())
            .collect();

        // One MD5 digest seeds four ring points; colliding keys keep the
        // last candidate in construction order.
        let mut ring = BTreeMap::new();
        for candidate in candidates {
            let address = candidate.address.to_string();
            for group in 0..(replicas / 4) {
                let digest = md5::compute(format!("{address}{group}").as_bytes());
                for slot in 0..4 {
                    ring.insert(ring_key(&digest.0, slot), candidate.clone());
                }
            }
        }

        Ok(Self {
            ring,
            signature,
            arg_indices,
        })
    }

    fn search_key(&self, invocation: &Invocation) -> u64 {
        let mut buf = String::new();
        for &index in &self.arg_indices {
            if let Some(arg) = invocation.args.get(index) {
                buf.push_str(arg);
            }
        }
        let digest = md5::compute(buf.as_bytes());
        ring_key(&digest.0, 0)
    }

    /// First ring entry at or after `key`, wrapping to the ring head.
    fn locate(&self, key: u64) -> Option<Arc<Instance>> {
        self.ring
            .range(key..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, candidate)| candidate.clone())
    }
}

fn ring_key(digest: &[u8; 16], slot: usize) -> u64 {
    let base = slot * 4;
    u64::from(u32::from_le_bytes([
        digest[base],
        digest[base + 1],
        digest[base + 2],
        digest[base + 3],
    ]))
}

/// Content fingerprint of the ordered address sequence; equivalent sets
/// delivered as fresh collections do not force a rebuild.
fn signature_of(candidates: &[Arc<Instance>]) -> u64 {
    let mut buf = String::new();
    for candidate in candidates {
        buf.push_str(&candidate.address.to_string());
        buf.push('\n');
    }
    mur3::murmurhash3_x64_128(buf.as_bytes(), 0).0
}

impl LoadBalance for ConsistentHashBalance {
    fn pick(
        &self,
        candidates: &[Arc<Instance>],
        target: &Target,
        invocation: &Invocation,
    ) -> Result<Arc<Instance>, LoadBalanceError> {
        if candidates.is_empty() {
            return Err(LoadBalanceError::EmptyCandidates);
        }

        let key = method_key(target, invocation);
        let signature = signature_of(candidates);

        let mut cached = None;
        if let Some(existing) = self.selectors.get(&key) {
            if existing.signature == signature {
                cached = Some(existing.value().clone());
            }
        }
        let selector = match cached {
            Some(selector) => selector,
            None => {
                let built = Arc::new(Selector::build(candidates, &invocation.method, signature)?);
                tracing::debug!(
                    key = %key,
                    entries = built.ring.len(),
                    "rebuilt consistent-hash selector"
                );
                self.selectors.insert(key, built.clone());
                built
            }
        };

        let search = selector.search_key(invocation);
        selector
            .locate(search)
            .ok_or(LoadBalanceError::EmptyCandidates)
    }
}
