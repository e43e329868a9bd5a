/// The shape of a cache, derived from a validated configuration
///
/// Decomposition uses plain integer division and remainder, so neither the block size nor the
/// number of sets has to be a power of two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    pub block_size: u64,
    pub num_sets: u64,
    pub ways: u64,
    pub fully_associative: bool,
}

/// An address split into the parts the cache uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposedAddress {
    /// The block the address falls in, `address / block_size`
    pub block_id: u64,
    /// The set the block must be placed in
    pub set_index: usize,
    /// Identifies the block among those sharing the set
    pub tag: u64,
}

impl CacheGeometry {
    /// Splits a byte address into its block id, set index and tag
    ///
    /// A fully associative cache has one set, so the whole block id is the tag
    ///
    /// # Arguments
    ///
    /// * `address`: Any byte address
    ///
    /// returns: DecomposedAddress
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::address::CacheGeometry;
    /// let geometry = CacheGeometry {
    ///     block_size: 4,
    ///     num_sets: 4,
    ///     ways: 1,
    ///     fully_associative: false,
    /// };
    /// let decomposed = geometry.decompose(0x24);
    /// assert_eq!((decomposed.block_id, decomposed.set_index, decomposed.tag), (9, 1, 2));
    /// ```
    #[inline]
    pub fn decompose(&self, address: u64) -> DecomposedAddress {
        let block_id = address / self.block_size;
        if self.fully_associative {
            DecomposedAddress {
                block_id,
                set_index: 0,
                tag: block_id,
            }
        } else {
            DecomposedAddress {
                block_id,
                set_index: (block_id % self.num_sets) as usize,
                tag: block_id / self.num_sets,
            }
        }
    }

    /// Total number of block slots across all sets
    pub fn total_blocks(&self) -> u64 {
        self.num_sets * self.ways
    }

    /// Capacity in bytes, `sets × ways × block_size`
    pub fn capacity(&self) -> u64 {
        self.total_blocks() * self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_associative(block_size: u64, num_sets: u64, ways: u64) -> CacheGeometry {
        CacheGeometry {
            block_size,
            num_sets,
            ways,
            fully_associative: false,
        }
    }

    #[test]
    fn offset_within_block_is_discarded() {
        let geometry = set_associative(16, 8, 2);
        let first = geometry.decompose(0x100);
        for offset in 1..16 {
            assert_eq!(geometry.decompose(0x100 + offset), first);
        }
        assert_ne!(geometry.decompose(0x110), first);
    }

    #[test]
    fn set_index_wraps_and_tag_counts_wraps() {
        let geometry = set_associative(4, 4, 1);
        let d = geometry.decompose(4 * 13);
        assert_eq!(d.block_id, 13);
        assert_eq!(d.set_index, 1);
        assert_eq!(d.tag, 3);
    }

    #[test]
    fn fully_associative_uses_block_id_as_tag() {
        let geometry = CacheGeometry {
            block_size: 8,
            num_sets: 1,
            ways: 16,
            fully_associative: true,
        };
        let d = geometry.decompose(0xFFF8);
        assert_eq!(d.set_index, 0);
        assert_eq!(d.tag, d.block_id);
        assert_eq!(d.block_id, 0xFFF8 / 8);
    }

    #[test]
    fn non_power_of_two_geometry() {
        let geometry = set_associative(12, 3, 2);
        assert_eq!(geometry.capacity(), 72);
        let d = geometry.decompose(100);
        assert_eq!(d.block_id, 8);
        assert_eq!(d.set_index, 2);
        assert_eq!(d.tag, 2);
    }

    #[test]
    fn top_of_address_space_decomposes() {
        let geometry = set_associative(64, 128, 4);
        let d = geometry.decompose(u64::MAX);
        assert_eq!(d.block_id, u64::MAX / 64);
        assert!(d.set_index < 128);
    }
}
