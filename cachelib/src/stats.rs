use serde::{Deserialize, Serialize};

/// Counters collected over a run. Counters only ever go up
///
/// Serialises to the format of the expected outputs under `samples/outputs`
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct Statistics {
    pub total_loads: u64,
    pub total_stores: u64,
    pub load_hits: u64,
    pub load_misses: u64,
    pub store_hits: u64,
    pub store_misses: u64,
    pub compulsory_misses: u64,
    pub capacity_misses: u64,
    pub conflict_misses: u64,
    pub memory_reads: u64,
    pub memory_writes: u64,
}

impl Statistics {
    pub fn total_accesses(&self) -> u64 {
        self.total_loads + self.total_stores
    }

    pub fn total_hits(&self) -> u64 {
        self.load_hits + self.store_hits
    }

    pub fn total_misses(&self) -> u64 {
        self.load_misses + self.store_misses
    }

    /// Hit rate as a percentage, 0 when nothing was accessed
    pub fn hit_rate(&self) -> f64 {
        let accesses = self.total_accesses();
        if accesses == 0 {
            0.0
        } else {
            self.total_hits() as f64 / accesses as f64 * 100.0
        }
    }

    /// Miss rate as a fraction, `1 - hit_rate / 100`
    ///
    /// With no accesses the hit rate is 0, so this is 1
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate() / 100.0
    }

    /// Illustrative average memory access time in cycles, `1 + miss_rate * 100`
    ///
    /// Not calibrated against any real hierarchy, kept as is so reports stay comparable
    pub fn amat(&self) -> f64 {
        1.0 + self.miss_rate() * 100.0
    }
}
