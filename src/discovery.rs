//! Candidate data handed over by service discovery.
//!
//! Discovery, health checking and connection management are external
//! collaborators: they produce the `Vec<Arc<Instance>>` snapshot that the
//! balancer selects from, and they own its lifecycle. This module only
//! defines the data contract.

use std::{borrow::Cow, collections::HashMap};

use crate::net::Address;

/// [`Instance`] is one provider instance of the target service.
///
/// Besides its address, an instance carries the URL-like attribute bag the
/// registry published for it. Balancing configuration (`weight`, `warmup`,
/// `hash.nodes`, `hash.arguments`) is read from the bag with per-method
/// override semantics: `"{method}.{key}"` shadows `"{key}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub address: Address,
    /// Epoch millis at which the instance registered; `0` means unknown and
    /// disables warm-up.
    pub start_at_ms: i64,
    pub tags: HashMap<Cow<'static, str>, Cow<'static, str>>,
}

impl Instance {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            start_at_ms: 0,
            tags: HashMap::new(),
        }
    }

    pub fn with_start_at_ms(mut self, start_at_ms: i64) -> Self {
        self.start_at_ms = start_at_ms;
        self
    }

    pub fn with_tag(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Raw attribute lookup.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|v| v.as_ref())
    }

    /// Attribute lookup with per-method override: `"{method}.{key}"` wins
    /// over `"{key}"`.
    pub fn method_param(&self, method: &str, key: &str) -> Option<&str> {
        let scoped = format!("{method}.{key}");
        self.tags
            .get(scoped.as_str())
            .or_else(|| self.tags.get(key))
            .map(|v| v.as_ref())
    }

    /// Typed lookup; unparsable values fall back to `default`.
    pub fn method_param_i64(&self, method: &str, key: &str, default: i64) -> i64 {
        self.method_param(method, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
