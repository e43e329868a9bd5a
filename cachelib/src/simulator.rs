use std::collections::HashSet;
use std::io::BufRead;
use std::time::{Duration, Instant};
use crate::address::DecomposedAddress;
use crate::cache::{Cache, CacheTrait, GenericCache};
use crate::config::{CacheConfig, ReplacementPolicyConfig, WritePolicy};
use crate::error::Result;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, Random};
use crate::stats::Statistics;
use crate::trace::{AccessRecord, TraceReader};

/// The kind of a memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A read, `R` in traces
    Load,
    /// A write, `W` in traces
    Store,
}

/// Why a miss happened
///
/// Every first touch of a block is compulsory. Later misses are capacity misses in a fully
/// associative cache, which can only run out of room, and conflict misses otherwise. This is a
/// structural stand in for the three Cs model, which would need a shadow fully associative cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissKind {
    Compulsory,
    Capacity,
    Conflict,
}

/// The simulator replays accesses against one cache and collects results.
///
/// It owns everything that persists between accesses: the cache, the logical clock, the ledger
/// of blocks seen so far and the statistics. Nothing is global, so independent simulators can run
/// side by side. It supports calling simulate multiple times, and will update the time taken to
/// simulate and the results accordingly
#[derive(Debug)]
pub struct Simulator {
    config: CacheConfig,
    cache: GenericCache,
    statistics: Statistics,
    seen_blocks: HashSet<u64>,
    clock: u64,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// Random replacement is seeded from the operating system, use [`Simulator::with_seed`] for
    /// reproducible runs
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually resulting from parsing a configuration file
    ///
    /// returns: Result<Simulator, SimError>, an error if the configuration doesn't describe a cache
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Creates a new simulator whose random replacement choices are fixed by `seed`
    ///
    /// The seed has no effect on LRU and FIFO caches
    pub fn with_seed(config: &CacheConfig, seed: u64) -> Result<Self> {
        Self::build(config, Some(seed))
    }

    fn build(config: &CacheConfig, seed: Option<u64>) -> Result<Self> {
        let cache = Self::config_to_cache(config, seed)?;
        let geometry = cache.geometry();
        tracing::debug!(
            sets = geometry.num_sets,
            ways = geometry.ways,
            block_size = geometry.block_size,
            replacement = %config.replacement_policy,
            write_policy = %config.write_policy,
            write_allocate = config.write_allocate,
            "built cache"
        );
        Ok(Self {
            config: config.clone(),
            cache,
            statistics: Statistics::default(),
            seen_blocks: HashSet::new(),
            clock: 0,
            simulation_time: Duration::ZERO,
        })
    }

    /// Creates a new cache from a cache configuration
    fn config_to_cache(config: &CacheConfig, seed: Option<u64>) -> Result<GenericCache> {
        let geometry = config.geometry()?;
        Ok(match config.replacement_policy {
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCache::from(Cache::new(geometry, LeastRecentlyUsed)?)
            }
            ReplacementPolicyConfig::FirstInFirstOut => {
                GenericCache::from(Cache::new(geometry, FirstInFirstOut)?)
            }
            ReplacementPolicyConfig::Random => {
                let policy = seed.map_or_else(Random::new, Random::with_seed);
                GenericCache::from(Cache::new(geometry, policy)?)
            }
        })
    }

    /// Processes one access to completion
    ///
    /// Advances the clock, decides hit or miss, and updates the cache and the statistics. The
    /// order of calls is the temporal order the replacement policies see
    ///
    /// # Arguments
    ///
    /// * `operation`: Load or store
    /// * `address`: The byte address accessed
    ///
    /// returns: (), internally the statistics are updated
    pub fn access(&mut self, operation: Operation, address: u64) {
        self.clock += 1;
        let now = self.clock;
        let DecomposedAddress { block_id, set_index, tag } = self.cache.geometry().decompose(address);
        let hit_way = self.cache.lookup(set_index, tag);

        let stats = &mut self.statistics;
        match operation {
            Operation::Load => {
                stats.total_loads += 1;
                if hit_way.is_some() { stats.load_hits += 1 } else { stats.load_misses += 1 }
            }
            Operation::Store => {
                stats.total_stores += 1;
                if hit_way.is_some() { stats.store_hits += 1 } else { stats.store_misses += 1 }
            }
        }

        match hit_way {
            Some(way) => {
                tracing::trace!(?operation, address, set = set_index, way, "hit");
                self.on_hit(operation, set_index, way, now);
            }
            None => self.on_miss(operation, address, block_id, set_index, tag, now),
        }
    }

    fn on_hit(&mut self, operation: Operation, set: usize, way: usize, now: u64) {
        // FIFO order is fixed at install time, only LRU moves on a hit
        if self.cache.refreshes_on_hit() {
            self.cache.touch(set, way, now);
        }
        if operation == Operation::Store {
            match self.config.write_policy {
                WritePolicy::WriteThrough => self.statistics.memory_writes += 1,
                WritePolicy::WriteBack => self.cache.mark_dirty(set, way),
            }
        }
    }

    fn on_miss(&mut self, operation: Operation, address: u64, block_id: u64, set: usize, tag: u64, now: u64) {
        let kind = self.classify_miss(block_id);
        match kind {
            MissKind::Compulsory => self.statistics.compulsory_misses += 1,
            MissKind::Capacity => self.statistics.capacity_misses += 1,
            MissKind::Conflict => self.statistics.conflict_misses += 1,
        }

        if operation == Operation::Store && !self.config.write_allocate {
            // No-write-allocate, the store goes straight to memory and the cache is untouched
            tracing::trace!(?operation, address, ?kind, "miss, written around the cache");
            self.statistics.memory_writes += 1;
            return;
        }
        self.statistics.memory_reads += 1;

        let way = match self.cache.find_empty_way(set) {
            Some(way) => way,
            None => {
                let way = self.cache.select_eviction_candidate(set);
                let victim = *self.cache.block(set, way);
                debug_assert!(
                    !(victim.dirty && self.config.write_policy == WritePolicy::WriteThrough),
                    "dirty block under write-through"
                );
                let write_back = victim.dirty && self.config.write_policy == WritePolicy::WriteBack;
                if write_back {
                    self.statistics.memory_writes += 1;
                }
                tracing::trace!(set, way, victim_tag = victim.tag, write_back, "evicted");
                way
            }
        };
        self.cache.install(set, way, tag, now);
        tracing::trace!(?operation, address, ?kind, set, way, "miss, installed");

        if operation == Operation::Store {
            match self.config.write_policy {
                WritePolicy::WriteThrough => self.statistics.memory_writes += 1,
                WritePolicy::WriteBack => self.cache.mark_dirty(set, way),
            }
        }
    }

    /// Classifies a miss, recording the block in the ledger on its first miss
    fn classify_miss(&mut self, block_id: u64) -> MissKind {
        if self.seen_blocks.insert(block_id) {
            MissKind::Compulsory
        } else if self.config.is_fully_associative() {
            MissKind::Capacity
        } else {
            MissKind::Conflict
        }
    }

    /// Replays a sequence of records in iteration order
    pub fn run<I: IntoIterator<Item = AccessRecord>>(&mut self, records: I) -> &Statistics {
        let start = Instant::now();
        for record in records {
            self.access(record.operation, record.address);
        }
        self.simulation_time += start.elapsed();
        &self.statistics
    }

    /// Simulates the cache over a textual trace, one `R|W <hex address>` record per line
    ///
    /// Records are applied as they are read, so on a malformed line every record before it has
    /// already been counted. Reads from the reader are strictly sequential
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace, usually from [`crate::io::get_reader`]
    ///
    /// returns: Result<&Statistics, SimError>
    pub fn simulate<R: BufRead>(&mut self, reader: R) -> Result<&Statistics> {
        let start = Instant::now();
        let mut outcome = Ok(());
        for record in TraceReader::new(reader) {
            match record {
                Ok(record) => self.access(record.operation, record.address),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.simulation_time += start.elapsed();
        outcome?;
        tracing::debug!(accesses = self.statistics.total_accesses(), "trace replayed");
        Ok(&self.statistics)
    }

    /// Gets the statistics collected so far
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Gets read access to the cache state
    pub fn cache(&self) -> &GenericCache {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Gets the number of distinct blocks requested so far
    pub fn seen_block_count(&self) -> usize {
        self.seen_blocks.len()
    }

    /// Gets the logical clock, which equals the number of accesses processed
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }
}
