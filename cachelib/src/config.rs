use std::fmt;
use std::mem;
use std::path::Path;
use std::str::FromStr;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use crate::address::CacheGeometry;
use crate::cache::CacheBlock;
use crate::error::{Result, SimError};

const CACHE_SIZE: &str = "CACHE_SIZE";
const BLOCK_SIZE: &str = "BLOCK_SIZE";
const ASSOCIATIVITY: &str = "ASSOCIATIVITY";
const REPLACEMENT_POLICY: &str = "REPLACEMENT_POLICY";
const WRITE_POLICY: &str = "WRITE_POLICY";
const WRITE_ALLOCATE: &str = "WRITE_ALLOCATE";

lazy_static! {
    static ref KEY_VALUE_LINE: Regex = Regex::new(r"^\s*(?P<key>[A-Za-z_]+)\s*=\s*(?P<value>.*?)\s*$").unwrap();
}

/// A configuration for a single cache, immutable for the whole run
///
/// Either read from `KEY=VALUE` lines or from a JSON object with the same keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CacheConfig {
    pub cache_size: u64,
    pub block_size: u64,
    /// Ways per set, 0 means fully associative
    pub associativity: u64,
    pub replacement_policy: ReplacementPolicyConfig,
    pub write_policy: WritePolicy,
    /// On a store miss, whether the block is fetched before being written
    #[serde(deserialize_with = "deserialize_flag")]
    pub write_allocate: bool,
}

/// The replacement policy used once a set is full - lru, fifo, or random
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[serde(rename = "LRU", alias = "lru")]
    LeastRecentlyUsed,
    #[serde(rename = "FIFO", alias = "fifo")]
    FirstInFirstOut,
    #[serde(rename = "RANDOM", alias = "random")]
    Random,
}

/// When stores reach memory - immediately, or when the dirty block is evicted
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePolicy {
    #[serde(rename = "WRITE_THROUGH", alias = "write_through")]
    WriteThrough,
    #[serde(rename = "WRITE_BACK", alias = "write_back")]
    WriteBack,
}

impl FromStr for ReplacementPolicyConfig {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LRU" => Ok(Self::LeastRecentlyUsed),
            "FIFO" => Ok(Self::FirstInFirstOut),
            "RANDOM" => Ok(Self::Random),
            _ => Err(SimError::InvalidValue { key: REPLACEMENT_POLICY, value: s.to_string() }),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WRITE_THROUGH" => Ok(Self::WriteThrough),
            "WRITE_BACK" => Ok(Self::WriteBack),
            _ => Err(SimError::InvalidValue { key: WRITE_POLICY, value: s.to_string() }),
        }
    }
}

impl fmt::Display for ReplacementPolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LeastRecentlyUsed => "LRU",
            Self::FirstInFirstOut => "FIFO",
            Self::Random => "RANDOM",
        })
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WriteThrough => "WRITE_THROUGH",
            Self::WriteBack => "WRITE_BACK",
        })
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(SimError::InvalidValue { key, value: value.to_string() }),
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| SimError::InvalidValue { key, value: value.to_string() })
}

/// `WRITE_ALLOCATE` is 0/1 in the text format, JSON may use either that or a bool
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(u64),
    }
    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Number(0) => Ok(false),
        Flag::Number(1) => Ok(true),
        Flag::Number(n) => Err(serde::de::Error::custom(format!("expected 0 or 1, found {n}"))),
    }
}

impl CacheConfig {
    /// Parses the `KEY=VALUE` configuration format
    ///
    /// Blank lines, `#` comments and lines without `=` are skipped, unknown keys are skipped with
    /// a warning. All six keys must be present, a repeated key keeps its last value
    ///
    /// # Arguments
    ///
    /// * `text`: The whole configuration file
    ///
    /// returns: Result<CacheConfig, SimError>
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::config::{CacheConfig, WritePolicy};
    /// let config = CacheConfig::from_key_value(
    ///     "CACHE_SIZE=1024\nBLOCK_SIZE=16\nASSOCIATIVITY=2\nREPLACEMENT_POLICY=LRU\nWRITE_POLICY=WRITE_BACK\nWRITE_ALLOCATE=1\n",
    /// ).unwrap();
    /// assert_eq!(config.write_policy, WritePolicy::WriteBack);
    /// assert!(config.write_allocate);
    /// ```
    pub fn from_key_value(text: &str) -> Result<Self> {
        let mut cache_size = None;
        let mut block_size = None;
        let mut associativity = None;
        let mut replacement_policy = None;
        let mut write_policy = None;
        let mut write_allocate = None;
        for line in text.lines() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            let Some(captures) = KEY_VALUE_LINE.captures(line) else {
                continue;
            };
            let value = &captures["value"];
            match &captures["key"] {
                CACHE_SIZE => cache_size = Some(parse_number(CACHE_SIZE, value)?),
                BLOCK_SIZE => block_size = Some(parse_number(BLOCK_SIZE, value)?),
                ASSOCIATIVITY => associativity = Some(parse_number(ASSOCIATIVITY, value)?),
                REPLACEMENT_POLICY => replacement_policy = Some(value.parse()?),
                WRITE_POLICY => write_policy = Some(value.parse()?),
                WRITE_ALLOCATE => write_allocate = Some(parse_flag(WRITE_ALLOCATE, value)?),
                other => tracing::warn!(key = other, "ignoring unknown configuration key"),
            }
        }
        Ok(Self {
            cache_size: cache_size.ok_or(SimError::MissingKey(CACHE_SIZE))?,
            block_size: block_size.ok_or(SimError::MissingKey(BLOCK_SIZE))?,
            associativity: associativity.ok_or(SimError::MissingKey(ASSOCIATIVITY))?,
            replacement_policy: replacement_policy.ok_or(SimError::MissingKey(REPLACEMENT_POLICY))?,
            write_policy: write_policy.ok_or(SimError::MissingKey(WRITE_POLICY))?,
            write_allocate: write_allocate.ok_or(SimError::MissingKey(WRITE_ALLOCATE))?,
        })
    }

    /// Parses the JSON configuration format
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a configuration file, JSON when the extension is `.json` and `KEY=VALUE` otherwise
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map_or(false, |extension| extension.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_key_value(&text)
        }
    }

    /// Whether the cache has a single set holding every block
    pub fn is_fully_associative(&self) -> bool {
        self.associativity == 0
    }

    /// Validates the sizes and derives the set count and ways
    ///
    /// Rejects anything that would leave a cache with no sets or no ways, and sizes which don't
    /// divide into whole sets, so these never surface half way through a trace
    pub fn geometry(&self) -> Result<CacheGeometry> {
        if self.cache_size == 0 {
            return Err(SimError::Geometry("cache size must be positive".to_string()));
        }
        if self.block_size == 0 {
            return Err(SimError::Geometry("block size must be positive".to_string()));
        }
        let (num_sets, ways) = if self.is_fully_associative() {
            (1, self.cache_size / self.block_size)
        } else {
            let set_bytes = self.block_size.checked_mul(self.associativity).ok_or_else(|| {
                SimError::Geometry(format!("{} ways of {} bytes overflows", self.associativity, self.block_size))
            })?;
            (self.cache_size / set_bytes, self.associativity)
        };
        if ways == 0 || num_sets == 0 {
            return Err(SimError::Geometry(format!(
                "a {} byte cache with {} byte blocks and associativity {} has {num_sets} sets of {ways} ways",
                self.cache_size, self.block_size, self.associativity
            )));
        }
        let geometry = CacheGeometry {
            block_size: self.block_size,
            num_sets,
            ways,
            fully_associative: self.is_fully_associative(),
        };
        if geometry.capacity() != self.cache_size {
            return Err(SimError::Geometry(format!(
                "{num_sets} sets of {ways} ways of {} byte blocks hold {} bytes, not {}",
                self.block_size,
                geometry.capacity(),
                self.cache_size
            )));
        }
        let block_bytes = usize::try_from(num_sets)
            .ok()
            .zip(usize::try_from(ways).ok())
            .and_then(|(sets, ways)| sets.checked_mul(ways))
            .and_then(|blocks| blocks.checked_mul(mem::size_of::<CacheBlock>()));
        if !matches!(block_bytes, Some(bytes) if bytes <= isize::MAX as usize) {
            return Err(SimError::Geometry(format!(
                "{num_sets} sets of {ways} ways is more blocks than can be held in memory"
            )));
        }
        Ok(geometry)
    }
}
