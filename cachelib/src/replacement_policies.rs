use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use crate::cache::CacheBlock;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// Policies keep no per-block bookkeeping of their own, the cache stamps every block with its
/// insertion and last access times and the policy reads those stamps
pub trait ReplacementPolicy {
    /// Whether a hit should refresh the block's last access time
    ///
    /// Not applicable for most policies, a default which returns false is provided
    fn refreshes_on_hit(&self) -> bool {
        false
    }

    /// Used by the cache to pick a block to evict when a new block needs added to a full set
    ///
    /// Implementations may assume every block in the set is valid, and must return an index
    /// within the set
    ///
    /// # Arguments
    ///
    /// * `set`: The blocks of the set, in way order
    ///
    /// returns: usize, the way to evict
    fn select_victim(&mut self, set: &[CacheBlock]) -> usize;
}

/// Finds the first way holding the smallest key. Ties go to the lowest way
#[inline]
fn first_minimum(set: &[CacheBlock], key: impl Fn(&CacheBlock) -> u64) -> usize {
    let mut min_value = u64::MAX;
    let mut min_index = 0;
    let mut way = 0;
    while way < set.len() {
        let value = key(&set[way]);
        if value < min_value {
            min_value = value;
            min_index = way;
        }
        way += 1;
    }
    min_index
}

/// Least Recently Used replacement policy
///
/// Hits refresh the block's last access time, and the block with the oldest one is evicted
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn refreshes_on_hit(&self) -> bool {
        true
    }

    fn select_victim(&mut self, set: &[CacheBlock]) -> usize {
        first_minimum(set, |block| block.last_access_time)
    }
}

/// First In First Out replacement policy
///
/// The eviction order is fixed when a block is installed, hits do not change it
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstInFirstOut;

impl ReplacementPolicy for FirstInFirstOut {
    fn select_victim(&mut self, set: &[CacheBlock]) -> usize {
        first_minimum(set, |block| block.insertion_time)
    }
}

/// Uniformly random replacement policy
///
/// Uses its own generator so runs can be reproduced by seeding it
#[derive(Debug, Clone)]
pub struct Random {
    rng: SmallRng,
}

impl Random {
    /// Creates a random policy seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Creates a random policy which always makes the same choices for the same seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplacementPolicy for Random {
    fn select_victim(&mut self, set: &[CacheBlock]) -> usize {
        self.rng.gen_range(0..set.len())
    }
}
