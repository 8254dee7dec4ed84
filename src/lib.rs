//! Eligo is the load-balancing core of an RPC client framework.
//!
//! Given a non-empty snapshot of candidate provider instances for one
//! invocation, a [`Balancer`] selects exactly one of them according to the
//! policy fixed at construction: weighted random, weighted round-robin,
//! least-active or consistent-hash. All policies share a uniform weight
//! model with linear warm-up and are safe for concurrent selection from
//! many caller threads per service method.
//!
//! Discovery, health checking, connection management, transport and timeout
//! enforcement are the surrounding framework's business; this crate only
//! defines the data contracts it consumes ([`Instance`], [`Invocation`],
//! [`ActiveCounter`]).
//!
//! ```
//! use std::sync::Arc;
//!
//! use eligo::{Address, Balancer, Instance, Invocation, LoadBalanceStrategy, Target};
//!
//! let balancer = Balancer::new(LoadBalanceStrategy::RoundRobin);
//! let candidates = vec![
//!     Arc::new(Instance::new(Address::from("10.0.0.1:20880"))),
//!     Arc::new(Instance::new(Address::from("10.0.0.2:20880"))),
//! ];
//! let picked = balancer
//!     .select(&candidates, &Target::new("svc"), &Invocation::new("echo"))
//!     .unwrap();
//! assert!(candidates.iter().any(|c| c.address == picked.address));
//! ```

pub mod context;
pub mod discovery;
pub mod loadbalance;
pub mod net;
pub mod status;

pub use faststr::FastStr;

pub use crate::{
    context::{Invocation, Target},
    discovery::Instance,
    loadbalance::{
        error::LoadBalanceError, resolve_weight, Balancer, LoadBalance, LoadBalanceStrategy,
    },
    net::Address,
    status::{ActiveCounter, ActiveTracker},
};
