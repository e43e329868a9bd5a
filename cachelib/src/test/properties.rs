use std::collections::HashSet;
use proptest::prelude::*;
use crate::cache::CacheTrait;
use crate::config::{CacheConfig, ReplacementPolicyConfig, WritePolicy};
use crate::simulator::{Operation, Simulator};

fn arb_config() -> impl Strategy<Value = CacheConfig> {
    (
        prop::sample::select(vec![1u64, 2, 4, 8, 16]),
        0u64..=4,
        1u64..=8,
        prop::sample::select(vec![
            ReplacementPolicyConfig::LeastRecentlyUsed,
            ReplacementPolicyConfig::FirstInFirstOut,
            ReplacementPolicyConfig::Random,
        ]),
        prop::sample::select(vec![WritePolicy::WriteThrough, WritePolicy::WriteBack]),
        any::<bool>(),
    )
        .prop_map(|(block_size, associativity, sets, replacement_policy, write_policy, write_allocate)| {
            // With associativity 0 the set count doubles as the number of ways
            let blocks = if associativity == 0 { sets } else { sets * associativity };
            CacheConfig {
                cache_size: blocks * block_size,
                block_size,
                associativity,
                replacement_policy,
                write_policy,
                write_allocate,
            }
        })
}

fn arb_trace() -> impl Strategy<Value = Vec<(Operation, u64)>> {
    prop::collection::vec(
        (prop::sample::select(vec![Operation::Load, Operation::Store]), 0u64..512),
        0..300,
    )
}

proptest! {
    /// Hits and misses partition the accesses, and miss kinds partition the misses.
    #[test]
    fn prop_counters_partition(config in arb_config(), trace in arb_trace(), seed in any::<u64>()) {
        let mut sim = Simulator::with_seed(&config, seed).unwrap();
        for (operation, address) in &trace {
            sim.access(*operation, *address);
        }
        let s = sim.statistics();
        prop_assert_eq!(s.load_hits + s.load_misses, s.total_loads);
        prop_assert_eq!(s.store_hits + s.store_misses, s.total_stores);
        prop_assert_eq!(s.total_accesses(), trace.len() as u64);
        prop_assert_eq!(s.compulsory_misses + s.capacity_misses + s.conflict_misses, s.total_misses());
        prop_assert_eq!(sim.clock(), trace.len() as u64);
    }

    /// Every distinct block misses compulsorily exactly once.
    #[test]
    fn prop_one_compulsory_miss_per_block(config in arb_config(), trace in arb_trace()) {
        let mut sim = Simulator::with_seed(&config, 1).unwrap();
        let mut blocks = HashSet::new();
        for (operation, address) in &trace {
            blocks.insert(address / config.block_size);
            sim.access(*operation, *address);
        }
        prop_assert_eq!(sim.statistics().compulsory_misses, blocks.len() as u64);
        prop_assert_eq!(sim.seen_block_count(), blocks.len());
    }

    /// Fully associative caches never conflict, set restricted caches never run out of capacity.
    #[test]
    fn prop_miss_kind_follows_structure(config in arb_config(), trace in arb_trace()) {
        let mut sim = Simulator::with_seed(&config, 2).unwrap();
        for (operation, address) in &trace {
            sim.access(*operation, *address);
        }
        if config.is_fully_associative() {
            prop_assert_eq!(sim.statistics().conflict_misses, 0);
        } else {
            prop_assert_eq!(sim.statistics().capacity_misses, 0);
        }
    }

    /// Write-through never leaves a dirty block behind, at any point of the run.
    #[test]
    fn prop_write_through_is_never_dirty(mut config in arb_config(), trace in arb_trace()) {
        config.write_policy = WritePolicy::WriteThrough;
        let mut sim = Simulator::with_seed(&config, 3).unwrap();
        for (operation, address) in &trace {
            sim.access(*operation, *address);
            prop_assert_eq!(sim.cache().dirty_block_count(), 0);
        }
        // Every store reaches memory exactly once
        prop_assert_eq!(sim.statistics().memory_writes, sim.statistics().total_stores);
    }

    /// A no-write-allocate store miss writes once, reads nothing and leaves the cache alone.
    #[test]
    fn prop_no_write_allocate_store_miss(mut config in arb_config(), trace in arb_trace()) {
        config.write_allocate = false;
        let mut sim = Simulator::with_seed(&config, 4).unwrap();
        for (operation, address) in &trace {
            let before = *sim.statistics();
            let invalid_before = sim.cache().invalid_block_count();
            sim.access(*operation, *address);
            let after = sim.statistics();
            if after.store_misses > before.store_misses {
                prop_assert_eq!(after.memory_reads, before.memory_reads);
                prop_assert_eq!(after.memory_writes, before.memory_writes + 1);
                prop_assert_eq!(sim.cache().invalid_block_count(), invalid_before);
            }
        }
    }

    /// Blocks are only fetched on misses which allocate.
    #[test]
    fn prop_reads_match_allocating_misses(config in arb_config(), trace in arb_trace()) {
        let mut sim = Simulator::with_seed(&config, 5).unwrap();
        for (operation, address) in &trace {
            sim.access(*operation, *address);
        }
        let s = sim.statistics();
        let allocating = if config.write_allocate { s.total_misses() } else { s.load_misses };
        prop_assert_eq!(s.memory_reads, allocating);
    }
}
