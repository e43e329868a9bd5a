use std::ops::Range;
use crate::address::CacheGeometry;
use crate::error::{Result, SimError};
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, Random, ReplacementPolicy};

/// One way of a set
///
/// `dirty` is only ever set on a valid block, and only under write-back
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheBlock {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u64,
    /// Logical time of the last install or refreshing hit, read by LRU
    pub last_access_time: u64,
    /// Logical time of the install, read by FIFO
    pub insertion_time: u64,
}

/// A generic trait for the block storage of a cache
///
/// The access processor drives the hit/miss procedure through these operations, the cache itself
/// keeps no statistics. Every operation takes a set index produced by the cache's own geometry,
/// an index outside it is a broken invariant and panics
pub trait CacheTrait {
    /// The geometry the cache was built with
    fn geometry(&self) -> &CacheGeometry;

    /// Finds the way holding `tag` in the set, the first match in way order wins
    ///
    /// # Arguments
    ///
    /// * `set`: The set index
    /// * `tag`: The tag of the requested block
    ///
    /// returns: Option<usize>
    fn lookup(&self, set: usize, tag: u64) -> Option<usize>;

    /// Finds the first invalid way in the set, or none if the set is full
    fn find_empty_way(&self, set: usize) -> Option<usize>;

    /// Asks the replacement policy for a way to evict from a full set
    fn select_eviction_candidate(&mut self, set: usize) -> usize;

    /// Whether hits should refresh the block's last access time under the configured policy
    fn refreshes_on_hit(&self) -> bool;

    /// Places a clean block in a way, stamping both its insertion and last access time
    fn install(&mut self, set: usize, way: usize, tag: u64, time: u64);

    /// Marks a block as modified since it was fetched
    fn mark_dirty(&mut self, set: usize, way: usize);

    /// Updates the last access time of a block, leaving its insertion time alone
    fn touch(&mut self, set: usize, way: usize, time: u64);

    /// Reads one block
    fn block(&self, set: usize, way: usize) -> &CacheBlock;

    /// Gets the number of invalid blocks. Useful for analysing cache performance or debugging
    fn invalid_block_count(&self) -> usize;

    /// Gets the number of dirty blocks, the write-backs which never fired
    fn dirty_block_count(&self) -> usize;
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// The blocks of all sets are kept in one vector, set `s` owning the range
/// `s * ways .. (s + 1) * ways`. We rely on monomorphisation so the policy calls are inlined on
/// the lookup path, the [`GenericCache`] enum hides the parameter from callers
#[derive(Debug)]
pub struct Cache<R: ReplacementPolicy> {
    geometry: CacheGeometry,
    blocks: Vec<CacheBlock>,
    num_sets: usize,
    ways: usize,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    /// Creates an empty cache, every block invalid
    ///
    /// The geometry must already be validated, both the set count and the ways are non zero. Fails
    /// rather than aborting when the blocks can't be allocated
    pub fn new(geometry: CacheGeometry, policy: R) -> Result<Self> {
        let too_large = || {
            SimError::Geometry(format!(
                "{} sets of {} ways can't be allocated",
                geometry.num_sets, geometry.ways
            ))
        };
        let num_sets = usize::try_from(geometry.num_sets).map_err(|_| too_large())?;
        let ways = usize::try_from(geometry.ways).map_err(|_| too_large())?;
        let total = num_sets.checked_mul(ways).ok_or_else(too_large)?;
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(total).map_err(|_| too_large())?;
        blocks.resize(total, CacheBlock::default());
        Ok(Self {
            geometry,
            blocks,
            num_sets,
            ways,
            replacement_policy: policy,
        })
    }

    #[inline]
    fn set_range(&self, set: usize) -> Range<usize> {
        assert!(
            set < self.num_sets,
            "set index {set} out of range for a cache with {} sets",
            self.num_sets
        );
        let lower = set * self.ways;
        lower..lower + self.ways
    }

    #[inline]
    fn block_mut(&mut self, set: usize, way: usize) -> &mut CacheBlock {
        debug_assert!(way < self.ways);
        let index = self.set_range(set).start + way;
        &mut self.blocks[index]
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    fn lookup(&self, set: usize, tag: u64) -> Option<usize> {
        self.blocks[self.set_range(set)]
            .iter()
            .position(|block| block.valid && block.tag == tag)
    }

    fn find_empty_way(&self, set: usize) -> Option<usize> {
        self.blocks[self.set_range(set)]
            .iter()
            .position(|block| !block.valid)
    }

    fn select_eviction_candidate(&mut self, set: usize) -> usize {
        let range = self.set_range(set);
        let way = self.replacement_policy.select_victim(&self.blocks[range]);
        debug_assert!(way < self.ways);
        way
    }

    fn refreshes_on_hit(&self) -> bool {
        self.replacement_policy.refreshes_on_hit()
    }

    fn install(&mut self, set: usize, way: usize, tag: u64, time: u64) {
        *self.block_mut(set, way) = CacheBlock {
            valid: true,
            dirty: false,
            tag,
            last_access_time: time,
            insertion_time: time,
        };
    }

    fn mark_dirty(&mut self, set: usize, way: usize) {
        let block = self.block_mut(set, way);
        debug_assert!(block.valid, "marking an invalid block dirty");
        block.dirty = true;
    }

    fn touch(&mut self, set: usize, way: usize, time: u64) {
        self.block_mut(set, way).last_access_time = time;
    }

    fn block(&self, set: usize, way: usize) -> &CacheBlock {
        assert!(way < self.ways, "way {way} out of range for a {}-way cache", self.ways);
        &self.blocks[self.set_range(set).start + way]
    }

    fn invalid_block_count(&self) -> usize {
        self.blocks.iter().filter(|block| !block.valid).count()
    }

    fn dirty_block_count(&self) -> usize {
        self.blocks.iter().filter(|block| block.dirty).count()
    }
}

/// Enum for the three replacement policies provided by the library
///
/// Trait objects would cost a dynamic call on every access of every trace line, explicitly
/// branching lets the compiler see the concrete cache types and inline through them
#[derive(Debug)]
pub enum GenericCache {
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    FirstInFirstOut(Cache<FirstInFirstOut>),
    Random(Cache<Random>),
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<FirstInFirstOut>> for GenericCache {
    fn from(value: Cache<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<Cache<Random>> for GenericCache {
    fn from(value: Cache<Random>) -> Self {
        Self::Random(value)
    }
}

macro_rules! dispatch {
    ($self:ident, $c:ident => $call:expr) => {
        match $self {
            GenericCache::LeastRecentlyUsed($c) => $call,
            GenericCache::FirstInFirstOut($c) => $call,
            GenericCache::Random($c) => $call,
        }
    };
}

impl CacheTrait for GenericCache {
    fn geometry(&self) -> &CacheGeometry {
        dispatch!(self, c => c.geometry())
    }

    fn lookup(&self, set: usize, tag: u64) -> Option<usize> {
        dispatch!(self, c => c.lookup(set, tag))
    }

    fn find_empty_way(&self, set: usize) -> Option<usize> {
        dispatch!(self, c => c.find_empty_way(set))
    }

    fn select_eviction_candidate(&mut self, set: usize) -> usize {
        dispatch!(self, c => c.select_eviction_candidate(set))
    }

    fn refreshes_on_hit(&self) -> bool {
        dispatch!(self, c => c.refreshes_on_hit())
    }

    fn install(&mut self, set: usize, way: usize, tag: u64, time: u64) {
        dispatch!(self, c => c.install(set, way, tag, time))
    }

    fn mark_dirty(&mut self, set: usize, way: usize) {
        dispatch!(self, c => c.mark_dirty(set, way))
    }

    fn touch(&mut self, set: usize, way: usize, time: u64) {
        dispatch!(self, c => c.touch(set, way, time))
    }

    fn block(&self, set: usize, way: usize) -> &CacheBlock {
        dispatch!(self, c => c.block(set, way))
    }

    fn invalid_block_count(&self) -> usize {
        dispatch!(self, c => c.invalid_block_count())
    }

    fn dirty_block_count(&self) -> usize {
        dispatch!(self, c => c.dirty_block_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_way() -> Cache<LeastRecentlyUsed> {
        let geometry = CacheGeometry {
            block_size: 4,
            num_sets: 2,
            ways: 2,
            fully_associative: false,
        };
        Cache::new(geometry, LeastRecentlyUsed).unwrap()
    }

    #[test]
    fn starts_empty() {
        let cache = two_way();
        assert_eq!(cache.invalid_block_count(), 4);
        assert_eq!(cache.dirty_block_count(), 0);
        assert_eq!(cache.lookup(0, 0), None);
        assert_eq!(cache.find_empty_way(1), Some(0));
    }

    #[test]
    fn install_then_lookup() {
        let mut cache = two_way();
        cache.install(1, 0, 9, 3);
        assert_eq!(cache.lookup(1, 9), Some(0));
        assert_eq!(cache.lookup(0, 9), None);
        assert_eq!(cache.find_empty_way(1), Some(1));
        let block = cache.block(1, 0);
        assert!(block.valid && !block.dirty);
        assert_eq!((block.last_access_time, block.insertion_time), (3, 3));
    }

    #[test]
    fn install_clears_dirty() {
        let mut cache = two_way();
        cache.install(0, 1, 5, 1);
        cache.mark_dirty(0, 1);
        assert_eq!(cache.dirty_block_count(), 1);
        cache.install(0, 1, 6, 2);
        assert!(!cache.block(0, 1).dirty);
        assert_eq!(cache.dirty_block_count(), 0);
    }

    #[test]
    fn touch_only_moves_last_access() {
        let mut cache = two_way();
        cache.install(0, 0, 1, 1);
        cache.touch(0, 0, 10);
        let block = cache.block(0, 0);
        assert_eq!(block.last_access_time, 10);
        assert_eq!(block.insertion_time, 1);
    }

    #[test]
    fn full_set_has_no_empty_way() {
        let mut cache = two_way();
        cache.install(0, 0, 1, 1);
        cache.install(0, 1, 2, 2);
        assert_eq!(cache.find_empty_way(0), None);
        assert_eq!(cache.select_eviction_candidate(0), 0);
        cache.touch(0, 0, 3);
        assert_eq!(cache.select_eviction_candidate(0), 1);
    }

    #[test]
    fn generic_cache_dispatches_to_policy() {
        let geometry = CacheGeometry {
            block_size: 4,
            num_sets: 1,
            ways: 2,
            fully_associative: true,
        };
        let mut cache = GenericCache::from(Cache::new(geometry, FirstInFirstOut).unwrap());
        cache.install(0, 0, 1, 1);
        cache.install(0, 1, 2, 2);
        assert!(!cache.refreshes_on_hit());
        cache.touch(0, 0, 5);
        assert_eq!(cache.select_eviction_candidate(0), 0);
        assert_eq!(cache.geometry().ways, 2);
    }

    #[test]
    fn unallocatable_geometry_is_an_error() {
        let geometry = CacheGeometry {
            block_size: 1,
            num_sets: 1,
            ways: 1 << 62,
            fully_associative: true,
        };
        let cache = Cache::new(geometry, LeastRecentlyUsed);
        assert!(matches!(cache, Err(SimError::Geometry(_))));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_set_panics() {
        let cache = two_way();
        let _ = cache.lookup(2, 0);
    }
}
