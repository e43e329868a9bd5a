use std::fmt;
use serde::Serialize;
use crate::stats::Statistics;

/// The final report, the raw counters plus the rates derived from them
///
/// `Display` gives the plain text layout, serialising gives the same content as JSON
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Report {
    #[serde(flatten)]
    pub statistics: Statistics,
    /// Percentage
    pub hit_rate: f64,
    /// Fraction
    pub miss_rate: f64,
    /// Cycles
    pub amat: f64,
}

impl From<&Statistics> for Report {
    fn from(statistics: &Statistics) -> Self {
        Self {
            statistics: *statistics,
            hit_rate: statistics.hit_rate(),
            miss_rate: statistics.miss_rate(),
            amat: statistics.amat(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.statistics;
        writeln!(f, "Total loads: {}", s.total_loads)?;
        writeln!(f, "Total stores: {}", s.total_stores)?;
        writeln!(f, "Load hits: {}", s.load_hits)?;
        writeln!(f, "Load misses: {}", s.load_misses)?;
        writeln!(f, "Store hits: {}", s.store_hits)?;
        writeln!(f, "Store misses: {}", s.store_misses)?;
        writeln!(f, "Total hit rate: {:.2}%", self.hit_rate)?;
        writeln!(f, "Compulsory misses: {}", s.compulsory_misses)?;
        writeln!(f, "Capacity misses: {}", s.capacity_misses)?;
        writeln!(f, "Conflict misses: {}", s.conflict_misses)?;
        writeln!(f, "Memory reads: {}", s.memory_reads)?;
        writeln!(f, "Memory writes: {}", s.memory_writes)?;
        write!(f, "AMAT: {:.2} cycles", self.amat)
    }
}
