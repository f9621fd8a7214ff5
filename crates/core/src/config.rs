//! Configuration system for the topology builder.
//!
//! This module defines the inputs of one build-and-run. It provides:
//! 1. **Defaults:** Baseline parameters (single issue, 512 MiB, 3 GHz, no predictor).
//! 2. **Parameters:** The validated [`ParameterSet`] the builder consumes.
//! 3. **Enums:** Processor model, memory kind and branch predictor choices.
//! 4. **File config:** A hierarchical [`Config`] (parameters, sizing table, port
//!    candidate overrides, engine dialect, outputs) read from JSON.
//!
//! Configuration is supplied as JSON via `--config`, or use `Config::default()` for the CLI.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{Error, MemorySize, Result};
use crate::engine::{ParamValue, PortDialect};
use crate::sizing::SizingTable;
use crate::soc::ports::{ConnectionRole, PortCandidate};

/// Default configuration constants.
///
/// These values apply whenever a field is omitted from the configuration file and
/// no command-line flag overrides it.
mod defaults {
    use crate::common::MemorySize;

    /// Single-issue pipeline.
    pub const ISSUE_WIDTH: u32 = 1;

    /// Main memory size (512 MiB).
    pub const MEMORY_SIZE: MemorySize = MemorySize::mib(512);

    /// System clock.
    pub const CLOCK_RATE: &str = "3GHz";

    /// Program run when no workload binary is given.
    pub const FALLBACK_BINARY: &str = "/bin/ls";

    /// Statistics output file.
    pub const STATS_FILE: &str = "stats.txt";
}

/// Program run when no workload binary is given.
pub const FALLBACK_BINARY: &str = defaults::FALLBACK_BINARY;

/// Branch predictor attached to the processor.
///
/// The mapping to engine classes is closed; unknown names are rejected rather than
/// silently replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BranchPredictor {
    /// No predictor object; the engine model's built-in behavior applies.
    None,
    /// Static predictor that always predicts taken.
    StaticAlwaysTaken,
    /// Local-history predictor.
    Local,
    /// Tournament (local/global) predictor.
    Tournament,
    /// Bi-mode predictor.
    BiMode,
}

impl BranchPredictor {
    /// Every accepted value, in `--help` order.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::StaticAlwaysTaken,
        Self::Local,
        Self::Tournament,
        Self::BiMode,
    ];

    /// Canonical kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StaticAlwaysTaken => "static-always-taken",
            Self::Local => "local",
            Self::Tournament => "tournament",
            Self::BiMode => "bimodal",
        }
    }

    /// Engine class constructed for this predictor, or `None` when no object is
    /// attached.
    pub const fn engine_class(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::StaticAlwaysTaken => Some("StaticBP"),
            Self::Local => Some("LocalBP"),
            Self::Tournament => Some("TournamentBP"),
            Self::BiMode => Some("BiModeBP"),
        }
    }

    /// Construction parameters for the predictor object.
    pub fn engine_params(self) -> Vec<(String, ParamValue)> {
        match self {
            Self::StaticAlwaysTaken => {
                vec![("always_taken".to_string(), ParamValue::Bool(true))]
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for BranchPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchPredictor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let predictor = match s {
            "none" => Self::None,
            "static-always-taken" | "StaticBP" => Self::StaticAlwaysTaken,
            "local" | "LocalBP" => Self::Local,
            "tournament" | "TournamentBP" => Self::Tournament,
            "bimodal" | "BiModeBP" => Self::BiMode,
            _ => {
                let accepted: Vec<_> = Self::ALL.iter().map(|p| p.as_str()).collect();
                return Err(Error::invalid(
                    "branch_predictor",
                    format!(
                        "unsupported predictor `{s}` (expected one of: {})",
                        accepted.join(", ")
                    ),
                ));
            }
        };
        Ok(predictor)
    }
}

impl TryFrom<String> for BranchPredictor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BranchPredictor> for String {
    fn from(value: BranchPredictor) -> Self {
        value.as_str().to_string()
    }
}

/// Processor timing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuModel {
    /// Out-of-order superscalar core (`DerivO3CPU`).
    #[default]
    OutOfOrder,
    /// Pipelined in-order core (`MinorCPU`).
    InOrder,
    /// Single-cycle timing core (`TimingSimpleCPU`).
    TimingSimple,
}

impl CpuModel {
    /// Engine class for this model.
    pub const fn engine_class(self) -> &'static str {
        match self {
            Self::OutOfOrder => "DerivO3CPU",
            Self::InOrder => "MinorCPU",
            Self::TimingSimple => "TimingSimpleCPU",
        }
    }

    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfOrder => "out-of-order",
            Self::InOrder => "in-order",
            Self::TimingSimple => "timing-simple",
        }
    }
}

impl FromStr for CpuModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "out-of-order" | "o3" | "DerivO3CPU" => Ok(Self::OutOfOrder),
            "in-order" | "minor" | "MinorCPU" => Ok(Self::InOrder),
            "timing-simple" | "timing" | "TimingSimpleCPU" => Ok(Self::TimingSimple),
            _ => Err(Error::invalid("cpu_model", format!("unknown processor model `{s}`"))),
        }
    }
}

/// Main memory implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryKind {
    /// Memory controller driving a DDR3-1600 device.
    #[default]
    Ddr3,
    /// Fixed-latency memory.
    Simple,
}

impl MemoryKind {
    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ddr3 => "ddr3",
            Self::Simple => "simple",
        }
    }
}

impl FromStr for MemoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ddr3" | "DDR3_1600_8x8" => Ok(Self::Ddr3),
            "simple" | "SimpleMemory" => Ok(Self::Simple),
            _ => Err(Error::invalid("memory_kind", format!("unknown memory kind `{s}`"))),
        }
    }
}

/// Scalar inputs of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Operations per cycle for every named pipeline stage.
    #[serde(default = "ParameterSet::default_issue_width")]
    pub issue_width: u32,

    /// Main memory size.
    #[serde(default = "ParameterSet::default_memory_size")]
    pub memory_size: MemorySize,

    /// Branch predictor; `none` unless set explicitly.
    #[serde(default = "ParameterSet::default_branch_predictor")]
    pub branch_predictor: BranchPredictor,

    /// Workload executable.
    #[serde(default = "ParameterSet::default_binary_path")]
    pub binary_path: PathBuf,

    /// System clock as a frequency string (`"3GHz"`); validated by the engine.
    #[serde(default = "ParameterSet::default_clock_rate")]
    pub clock_rate: String,

    /// Processor timing model.
    #[serde(default)]
    pub cpu_model: CpuModel,

    /// Main memory implementation.
    #[serde(default)]
    pub memory_kind: MemoryKind,
}

impl ParameterSet {
    fn default_issue_width() -> u32 {
        defaults::ISSUE_WIDTH
    }

    fn default_memory_size() -> MemorySize {
        defaults::MEMORY_SIZE
    }

    fn default_branch_predictor() -> BranchPredictor {
        BranchPredictor::None
    }

    fn default_binary_path() -> PathBuf {
        PathBuf::from(defaults::FALLBACK_BINARY)
    }

    fn default_clock_rate() -> String {
        defaults::CLOCK_RATE.to_string()
    }

    /// Parameters for running `binary_path` with every other field at its default.
    pub fn for_binary(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            ..Self::default()
        }
    }

    /// Checks the scalar invariants that do not need the filesystem or the engine.
    pub fn validate(&self) -> Result<()> {
        if self.issue_width < 1 {
            return Err(Error::invalid("issue_width", "must be at least 1"));
        }
        if self.memory_size.bytes() == 0 {
            return Err(Error::invalid("memory_size", "must be non-zero"));
        }
        if self.clock_rate.trim().is_empty() {
            return Err(Error::invalid("clock_rate", "must not be empty"));
        }
        if self.binary_path.as_os_str().is_empty() {
            return Err(Error::invalid("binary_path", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            issue_width: Self::default_issue_width(),
            memory_size: Self::default_memory_size(),
            branch_predictor: Self::default_branch_predictor(),
            binary_path: Self::default_binary_path(),
            clock_rate: Self::default_clock_rate(),
            cpu_model: CpuModel::default(),
            memory_kind: MemoryKind::default(),
        }
    }
}

/// Engine selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Port-naming dialect of the reference engine.
    #[serde(default)]
    pub dialect: PortDialect,
}

/// Where results go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Statistics dump destination.
    #[serde(default = "OutputConfig::default_stats_file")]
    pub stats_file: PathBuf,

    /// Optional JSON dump of the built topology.
    #[serde(default)]
    pub dump_topology: Option<PathBuf>,

    /// Stop the run after this many ticks.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl OutputConfig {
    fn default_stats_file() -> PathBuf {
        PathBuf::from(defaults::STATS_FILE)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stats_file: Self::default_stats_file(),
            dump_topology: None,
            max_ticks: None,
        }
    }
}

/// Complete configuration of one build-and-run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Scalar build parameters.
    #[serde(default)]
    pub parameters: ParameterSet,

    /// Backend sizing rules.
    #[serde(default)]
    pub sizing: SizingTable,

    /// Per-role replacements of the built-in port candidate lists.
    #[serde(default)]
    pub ports: BTreeMap<ConnectionRole, Vec<PortCandidate>>,

    /// Engine selection.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Output destinations.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::ConfigFile {
            path: PathBuf::from("<inline>"),
            detail: e.to_string(),
        })
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the JSON file.
    ///
    /// # Returns
    ///
    /// The parsed configuration, or [`Error::ConfigFile`] naming the file when it
    /// cannot be read or does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}
