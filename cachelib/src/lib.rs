//! # CacheLib
//!
//! Cachelib is a library for simulating a single set-associative cache over a trace of loads and
//! stores
//!
//! It models the block storage of the cache, picks victims with LRU, FIFO or random replacement,
//! accounts for write-through or write-back traffic with or without write allocation, and
//! classifies every miss as compulsory, capacity or conflict. It is an accounting model, not a
//! timing one: the AMAT it reports is an illustrative estimate

/// Splits addresses into block id, set index and tag
pub mod address;

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains the configuration, parsed from `KEY=VALUE` text or JSON
pub mod config;

pub mod error;

/// Opens trace files for reading
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Formats the final statistics
pub mod report;

/// Contains the simulator which replays accesses against a cache
pub mod simulator;

pub mod stats;

/// Parses access records from trace text
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
