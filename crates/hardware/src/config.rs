//! Configuration system for the flexible cache simulator.
//!
//! This module defines the configuration structures and enums used to
//! parameterize a run. It provides:
//! 1. **Defaults:** Baseline cache geometry and run lengths.
//! 2. **Structures:** A flat `SimConfig` covering the cache, the predictor and
//!    the report.
//! 3. **Enums:** Access mode and report format.
//!
//! Configuration is supplied as JSON (from a file or the Python API) or built
//! from command-line flags on top of `SimConfig::default()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{ConfigError, HINT_TAG_ALLOWANCE, Result, WORD_SIZE};

/// Default configuration constants for the simulator.
mod defaults {
    use crate::common::{REGION_SIZE, SIM_COUNT, WARM_INS};

    /// Number of sets.
    pub const SET_COUNT: u32 = 4;

    /// Capacity of each set in bytes.
    pub const SET_SIZE: u64 = 4096;

    /// Maximum block size in bytes; also the aligned line size.
    pub const MAX_GRAN: u64 = 64;

    /// Instructions treated as warm-up before statistics are reset.
    pub const WARMUP: u64 = WARM_INS;

    /// Instructions to simulate (0 = whole trace).
    pub const SIM_INSTRUCTIONS: u64 = SIM_COUNT;

    /// Region size used to bin hints.
    pub const BIN_SIZE: u64 = REGION_SIZE;
}

/// How fetch ranges are formed and how much tag space each block costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum AccessMode {
    /// Traditional fixed-line cache: every fetch is a `max_gran` aligned
    /// chunk and blocks carry no tag overhead.
    #[serde(alias = "aligned")]
    Aligned,
    /// Variable-size blocks: fetches are exact or hint-sized and every block
    /// pays one word of tag overhead.
    #[default]
    #[serde(alias = "flexible")]
    Flexible,
}

/// Output format of the final statistics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReportFormat {
    /// Human-readable, one statistic per line.
    #[default]
    Verbose,
    /// A single comma-separated line.
    #[serde(alias = "CSV")]
    Csv,
    /// The serialized `Report`.
    #[serde(alias = "JSON")]
    Json,
}

/// Complete configuration of one simulation run.
///
/// # Examples
///
/// ```
/// use flexcache::config::{AccessMode, SimConfig};
///
/// let json = r#"{ "set_count": 8, "mode": "Aligned" }"#;
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.set_count, 8);
/// assert_eq!(config.mode, AccessMode::Aligned);
/// assert_eq!(config.max_gran_bytes, 64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimConfig {
    /// Number of sets (power of two)
    #[serde(default = "SimConfig::default_set_count")]
    pub set_count: u32,

    /// Capacity of each set in bytes
    #[serde(default = "SimConfig::default_set_size")]
    pub set_size_bytes: u64,

    /// Maximum block granularity in bytes (power of two)
    #[serde(default = "SimConfig::default_max_gran")]
    pub max_gran_bytes: u64,

    /// Aligned or flexible access
    #[serde(default)]
    pub mode: AccessMode,

    /// Instructions of warm-up before the one-shot statistics reset
    #[serde(default = "SimConfig::default_warmup")]
    pub warmup_instructions: u64,

    /// Instruction budget; 0 simulates the whole trace
    #[serde(default = "SimConfig::default_sim_instructions")]
    pub sim_instructions: u64,

    /// Directory holding hint files, read in flexible mode and written in aligned mode
    #[serde(default)]
    pub hint_dir: Option<PathBuf>,

    /// Region size used to bin hints (power of two)
    #[serde(default = "SimConfig::default_bin_size")]
    pub bin_size_bytes: u64,

    /// Report format
    #[serde(default)]
    pub report: ReportFormat,
}

impl SimConfig {
    fn default_set_count() -> u32 {
        defaults::SET_COUNT
    }

    fn default_set_size() -> u64 {
        defaults::SET_SIZE
    }

    fn default_max_gran() -> u64 {
        defaults::MAX_GRAN
    }

    fn default_warmup() -> u64 {
        defaults::WARMUP
    }

    fn default_sim_instructions() -> u64 {
        defaults::SIM_INSTRUCTIONS
    }

    fn default_bin_size() -> u64 {
        defaults::BIN_SIZE
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks the geometry constraints the index function relies on.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.set_count == 0 || !self.set_count.is_power_of_two() {
            return Err(ConfigError::SetCount(self.set_count));
        }
        if self.max_gran_bytes < WORD_SIZE || !self.max_gran_bytes.is_power_of_two() {
            return Err(ConfigError::Granularity {
                got: self.max_gran_bytes,
                min: WORD_SIZE,
            });
        }
        if self.set_size_bytes % WORD_SIZE != 0 || self.set_size_bytes < self.max_gran_bytes {
            return Err(ConfigError::SetSize {
                got: self.set_size_bytes,
                gran: self.max_gran_bytes,
            });
        }
        if self.bin_size_bytes < WORD_SIZE || !self.bin_size_bytes.is_power_of_two() {
            return Err(ConfigError::BinSize(self.bin_size_bytes));
        }
        Ok(())
    }

    /// Capacity of each set in words.
    pub fn set_size_words(&self) -> u64 {
        self.set_size_bytes / WORD_SIZE
    }

    /// Tag overhead in words charged per resident block.
    pub fn tag_overhead(&self) -> u64 {
        match self.mode {
            AccessMode::Aligned => 0,
            AccessMode::Flexible => 1,
        }
    }

    /// Total cache capacity in KiB.
    pub fn cache_size_kb(&self) -> u64 {
        self.set_size_bytes * self.set_count as u64 / 1024
    }

    /// Returns `true` if the run writes a hint file when it finishes: an
    /// aligned run with a hint directory.
    pub fn dumps_hints(&self) -> bool {
        self.mode == AccessMode::Aligned && self.hint_dir.is_some()
    }

    /// Path an aligned run dumps its hints to.
    pub fn hint_dump_path(&self, dir: &Path) -> PathBuf {
        dir.join(hint_file_name(self.set_count, self.cache_size_kb()))
    }

    /// Path a flexible run reads its hints from.
    ///
    /// The flexible run is configured with [`HINT_TAG_ALLOWANCE`] extra bytes
    /// per set, so it replays the aligned run of the smaller size.
    pub fn hint_load_path(&self, dir: &Path) -> PathBuf {
        let aligned_set = self.set_size_bytes.saturating_sub(HINT_TAG_ALLOWANCE);
        let kb = aligned_set * self.set_count as u64 / 1024;
        dir.join(hint_file_name(self.set_count, kb))
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            set_count: defaults::SET_COUNT,
            set_size_bytes: defaults::SET_SIZE,
            max_gran_bytes: defaults::MAX_GRAN,
            mode: AccessMode::default(),
            warmup_instructions: defaults::WARMUP,
            sim_instructions: defaults::SIM_INSTRUCTIONS,
            hint_dir: None,
            bin_size_bytes: defaults::BIN_SIZE,
            report: ReportFormat::default(),
        }
    }
}

/// File name of a hint dump: `hint_<set_count>_<cache_kb>.bin`.
pub fn hint_file_name(set_count: u32, cache_kb: u64) -> String {
    format!("hint_{}_{}.bin", set_count, cache_kb)
}
