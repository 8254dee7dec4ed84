use std::{collections::HashMap, sync::Arc, thread};

use eligo::{
    ActiveTracker, Address, Balancer, Instance, Invocation, LoadBalanceError, LoadBalanceStrategy,
    Target,
};

fn candidates(n: usize) -> Vec<Arc<Instance>> {
    (1..=n)
        .map(|i| Arc::new(Instance::new(Address::from(format!("10.1.0.{i}:20880").as_str()))))
        .collect()
}

fn all_strategies() -> Vec<LoadBalanceStrategy> {
    vec![
        LoadBalanceStrategy::Random,
        LoadBalanceStrategy::RoundRobin,
        LoadBalanceStrategy::LeastActive(Arc::new(ActiveTracker::new())),
        LoadBalanceStrategy::ConsistentHash,
    ]
}

#[test]
fn empty_set_surfaces_as_routing_failure() {
    let balancer = Balancer::new(LoadBalanceStrategy::Random);
    let err = balancer
        .select(&[], &Target::new("svc"), &Invocation::new("m"))
        .unwrap_err();
    assert!(matches!(err, LoadBalanceError::EmptyCandidates));
}

#[test]
fn single_candidate_short_circuits_every_policy() {
    let only = candidates(1);
    for strategy in all_strategies() {
        let balancer = Balancer::new(strategy);
        let picked = balancer
            .select(&only, &Target::new("svc"), &Invocation::new("m").with_args(["k"]))
            .unwrap();
        assert_eq!(picked.address, only[0].address);
    }
}

#[test]
fn weighted_random_follows_configured_weights() {
    let balancer = Balancer::new(LoadBalanceStrategy::Random);
    let weighted: Vec<Arc<Instance>> = [("10.1.0.1:20880", "6"), ("10.1.0.2:20880", "3"), ("10.1.0.3:20880", "1")]
        .into_iter()
        .map(|(addr, weight)| {
            Arc::new(Instance::new(Address::from(addr)).with_tag("weight", weight))
        })
        .collect();
    let target = Target::new("svc");
    let invocation = Invocation::new("m");

    let mut counts: HashMap<Address, usize> = HashMap::new();
    let rounds = 20_000;
    for _ in 0..rounds {
        let picked = balancer.select(&weighted, &target, &invocation).unwrap();
        *counts.entry(picked.address.clone()).or_insert(0) += 1;
    }
    for (candidate, share) in weighted.iter().zip([0.6, 0.3, 0.1]) {
        let observed = counts[&candidate.address] as f64 / rounds as f64;
        assert!((observed - share).abs() < 0.05, "{}: {observed}", candidate.address);
    }
}

#[test]
fn round_robin_cycle_is_exact() {
    let balancer = Balancer::new(LoadBalanceStrategy::RoundRobin);
    let uniform = candidates(4);
    let target = Target::new("svc");
    let invocation = Invocation::new("m");

    let mut counts: HashMap<Address, usize> = HashMap::new();
    for _ in 0..12 {
        let picked = balancer.select(&uniform, &target, &invocation).unwrap();
        *counts.entry(picked.address.clone()).or_insert(0) += 1;
    }
    for candidate in &uniform {
        assert_eq!(counts[&candidate.address], 3);
    }
}

#[test]
fn least_active_prefers_the_idle_candidate() {
    let tracker = Arc::new(ActiveTracker::new());
    let balancer = Balancer::new(LoadBalanceStrategy::LeastActive(tracker.clone()));
    let pool = candidates(3);
    let target = Target::new("svc");
    let invocation = Invocation::new("m");

    for _ in 0..3 {
        tracker.begin(&pool[0].address, "m");
        tracker.begin(&pool[2].address, "m");
    }
    for _ in 0..25 {
        let picked = balancer.select(&pool, &target, &invocation).unwrap();
        assert_eq!(picked.address, pool[1].address);
    }
}

#[test]
fn consistent_hash_sticks_and_redistributes() {
    let balancer = Balancer::new(LoadBalanceStrategy::ConsistentHash);
    let pool = candidates(4);
    let target = Target::new("svc");
    let call = |key: &str| Invocation::new("m").with_args([key.to_string()]);

    let chosen = balancer.select(&pool, &target, &call("user-42")).unwrap();
    for _ in 0..10 {
        let again = balancer.select(&pool, &target, &call("user-42")).unwrap();
        assert_eq!(again.address, chosen.address);
    }

    let mut before: HashMap<String, Address> = HashMap::new();
    for i in 0..1000 {
        let key = format!("key-{i}");
        let picked = balancer.select(&pool, &target, &call(&key)).unwrap();
        before.insert(key, picked.address.clone());
    }

    let survivors: Vec<Arc<Instance>> = pool
        .iter()
        .filter(|c| c.address != chosen.address)
        .cloned()
        .collect();
    let moved = balancer.select(&survivors, &target, &call("user-42")).unwrap();
    assert_ne!(moved.address, chosen.address);

    for (key, previous) in &before {
        if *previous == chosen.address {
            continue;
        }
        let now = balancer.select(&survivors, &target, &call(key)).unwrap();
        assert_eq!(now.address, *previous, "unrelated key {key} moved");
    }
}

#[test]
fn concurrent_selection_returns_members_only() {
    for strategy in all_strategies() {
        let balancer = Arc::new(Balancer::new(strategy));
        let pool = Arc::new(candidates(5));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let balancer = balancer.clone();
                let pool = pool.clone();
                thread::spawn(move || {
                    let target = Target::new("svc");
                    for i in 0..500 {
                        let invocation =
                            Invocation::new("m").with_args([format!("{worker}-{i}")]);
                        let picked = balancer.select(&pool, &target, &invocation).unwrap();
                        assert!(pool.iter().any(|c| c.address == picked.address));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}

#[test]
fn concurrent_round_robin_stays_balanced() {
    let balancer = Arc::new(Balancer::new(LoadBalanceStrategy::RoundRobin));
    let pool = Arc::new(candidates(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let balancer = balancer.clone();
            let pool = pool.clone();
            thread::spawn(move || {
                let target = Target::new("svc");
                let invocation = Invocation::new("m");
                let mut counts: HashMap<Address, usize> = HashMap::new();
                for _ in 0..1000 {
                    let picked = balancer.select(&pool, &target, &invocation).unwrap();
                    *counts.entry(picked.address.clone()).or_insert(0) += 1;
                }
                counts
            })
        })
        .collect();

    let mut totals: HashMap<Address, usize> = HashMap::new();
    for handle in handles {
        for (addr, count) in handle.join().unwrap() {
            *totals.entry(addr).or_insert(0) += count;
        }
    }
    // 4000 selections over 4 uniform candidates: exactly 1000 each, because
    // every sequence number is consumed by exactly one selection.
    for candidate in pool.iter() {
        assert_eq!(totals[&candidate.address], 1000);
    }
}
