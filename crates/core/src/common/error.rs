//! Error taxonomy for configuration and run failures.
//!
//! This module defines the failures a build or run can end in. It provides:
//! 1. **Engine errors:** `EngineError`, the engine's own diagnostic carried verbatim.
//! 2. **Top-level errors:** `Error`, one variant per failure category.
//! 3. **Exit statuses:** `FailureCategory`, a distinct process exit code per category so
//!    experiment harnesses can tell a bad configuration apart from a failed run.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::soc::negotiator::UnresolvedConnection;

/// A request the engine refused, with the engine's message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    /// Wraps an engine diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the engine's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every failure a configuration build or simulation run can end in.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A supplied scalar is outside its valid domain.
    #[error("invalid parameter `{name}`: {detail}")]
    InvalidParameter {
        /// Parameter name as it appears on the parameter surface.
        name: String,
        /// What is wrong with it.
        detail: String,
    },

    /// The workload binary does not exist.
    #[error("workload binary not found: {}", path.display())]
    WorkloadNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The workload binary exists but cannot be executed.
    #[error("workload binary is not executable: {}", path.display())]
    WorkloadNotExecutable {
        /// The offending path.
        path: PathBuf,
    },

    /// The engine rejected a construction request.
    #[error("engine rejected construction of `{component}`: {source}")]
    EngineConstruction {
        /// Name of the component being constructed.
        component: String,
        /// The engine's diagnostic.
        source: EngineError,
    },

    /// One or more mandatory connection roles could not be wired.
    #[error(
        "topology incomplete; no known port convention realized mandatory role(s): {}",
        describe_unresolved(.unresolved)
    )]
    TopologyIncomplete {
        /// Every unresolved mandatory connection, in build order.
        unresolved: Vec<UnresolvedConnection>,
    },

    /// The engine failed to instantiate the finished topology.
    #[error("engine instantiation failed: {0}")]
    EngineInstantiation(#[source] EngineError),

    /// The engine failed while running the instantiated topology.
    #[error("engine run failed: {0}")]
    EngineRuntime(#[source] EngineError),

    /// The configuration file could not be read or parsed.
    #[error("configuration file {}: {detail}", path.display())]
    ConfigFile {
        /// Path of the configuration file.
        path: PathBuf,
        /// Reader or parser diagnostic.
        detail: String,
    },

    /// An output (statistics sink, topology dump) could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An output document could not be serialized.
    #[error("cannot serialize {what}: {source}")]
    Serialize {
        /// The document being produced.
        what: &'static str,
        /// Serializer diagnostic.
        source: serde_json::Error,
    },
}

/// Result type for build and run operations.
pub type Result<T> = std::result::Result<T, Error>;

fn describe_unresolved(unresolved: &[UnresolvedConnection]) -> String {
    let mut out = String::new();
    for (i, conn) in unresolved.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(
            out,
            "{} ({} -> {})",
            conn.role, conn.source.name, conn.destination.name
        );
    }
    out
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Returns the failure category of this error.
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::InvalidParameter { .. } | Self::ConfigFile { .. } => {
                FailureCategory::InvalidParameter
            }
            Self::WorkloadNotFound { .. } => FailureCategory::WorkloadNotFound,
            Self::WorkloadNotExecutable { .. } => FailureCategory::WorkloadNotExecutable,
            Self::EngineConstruction { .. } => FailureCategory::EngineConstruction,
            Self::TopologyIncomplete { .. } => FailureCategory::TopologyIncomplete,
            Self::EngineInstantiation(_) => FailureCategory::EngineInstantiation,
            Self::EngineRuntime(_) => FailureCategory::EngineRuntime,
            Self::Io(_) | Self::Serialize { .. } => FailureCategory::Io,
        }
    }

    /// Returns the process exit status for this error.
    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}

/// Failure categories, each with a distinct non-zero exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Bad scalar parameter or unreadable configuration file.
    InvalidParameter,
    /// Workload path does not exist.
    WorkloadNotFound,
    /// Workload path is not executable.
    WorkloadNotExecutable,
    /// Engine refused to construct an object.
    EngineConstruction,
    /// A mandatory connection role could not be wired.
    TopologyIncomplete,
    /// Engine refused to instantiate the topology.
    EngineInstantiation,
    /// Engine failed during the run.
    EngineRuntime,
    /// Producing or writing an output failed.
    Io,
}

impl FailureCategory {
    /// Process exit status for this category.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InvalidParameter => 2,
            Self::WorkloadNotFound => 3,
            Self::WorkloadNotExecutable => 4,
            Self::EngineConstruction => 5,
            Self::TopologyIncomplete => 6,
            Self::EngineInstantiation => 7,
            Self::EngineRuntime => 8,
            Self::Io => 9,
        }
    }

    /// True for failures detected before any engine run is attempted.
    pub const fn is_configuration(self) -> bool {
        matches!(
            self,
            Self::InvalidParameter
                | Self::WorkloadNotFound
                | Self::WorkloadNotExecutable
                | Self::EngineConstruction
                | Self::TopologyIncomplete
        )
    }
}
