//! Connection roles and the port-name candidate table.
//!
//! The engine has renamed its port attributes across versions (producer/consumer
//! `cpu_side_ports`/`mem_side_ports` versus the older `slave`/`master`, `int_requestor`
//! versus `int_master`). Instead of scattering fallbacks through the builder, every
//! logical link is a [`ConnectionRole`] and each role owns an ordered list of
//! [`PortCandidate`]s, tried first to last by the negotiator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::Error;

/// Logical purpose of a link between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionRole {
    /// Processor instruction fetch path to the interconnect.
    InstructionFetch,
    /// Processor load/store path to the interconnect.
    DataAccess,
    /// Memory controller to the interconnect.
    MemoryControl,
    /// Interrupt controller programmed-I/O port to the interconnect.
    InterruptPio,
    /// Interrupt controller request port to the interconnect.
    InterruptRequest,
    /// Interrupt controller response port to the interconnect.
    InterruptResponse,
    /// System functional-access (backdoor) port to the interconnect.
    SystemBackdoor,
}

impl ConnectionRole {
    /// Every role, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::InstructionFetch,
        Self::DataAccess,
        Self::MemoryControl,
        Self::InterruptPio,
        Self::InterruptRequest,
        Self::InterruptResponse,
        Self::SystemBackdoor,
    ];

    /// Kebab-case name used in configuration files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstructionFetch => "instruction-fetch",
            Self::DataAccess => "data-access",
            Self::MemoryControl => "memory-control",
            Self::InterruptPio => "interrupt-pio",
            Self::InterruptRequest => "interrupt-request",
            Self::InterruptResponse => "interrupt-response",
            Self::SystemBackdoor => "system-backdoor",
        }
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::invalid("connection_role", format!("unknown role `{s}`")))
    }
}

/// One naming convention for a role: bind `source.source_port` to
/// `destination.destination_port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortCandidate {
    /// Port attribute on the source component.
    pub source_port: String,
    /// Port attribute on the destination component.
    pub destination_port: String,
    /// Label of the naming convention, for diagnostics.
    #[serde(default = "PortCandidate::default_convention")]
    pub convention: String,
}

impl PortCandidate {
    /// Creates a candidate.
    pub fn new(
        source_port: impl Into<String>,
        destination_port: impl Into<String>,
        convention: impl Into<String>,
    ) -> Self {
        Self {
            source_port: source_port.into(),
            destination_port: destination_port.into(),
            convention: convention.into(),
        }
    }

    fn default_convention() -> String {
        "custom".to_string()
    }
}

impl fmt::Display for PortCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]",
            self.source_port, self.destination_port, self.convention
        )
    }
}

const MODERN: &str = "requestor/responder";
const TRANSITIONAL: &str = "transitional";
const LEGACY: &str = "master/slave";

/// Built-in candidates, newest convention first.
const DEFAULT_CANDIDATES: [(ConnectionRole, &[(&str, &str, &str)]); 7] = [
    (
        ConnectionRole::InstructionFetch,
        &[("icache_port", "cpu_side_ports", MODERN), ("icache_port", "slave", LEGACY)],
    ),
    (
        ConnectionRole::DataAccess,
        &[("dcache_port", "cpu_side_ports", MODERN), ("dcache_port", "slave", LEGACY)],
    ),
    (
        ConnectionRole::MemoryControl,
        &[("port", "mem_side_ports", MODERN), ("port", "master", LEGACY)],
    ),
    (
        ConnectionRole::InterruptPio,
        &[("pio", "mem_side_ports", MODERN), ("pio", "master", LEGACY)],
    ),
    (
        ConnectionRole::InterruptRequest,
        &[
            ("int_requestor", "cpu_side_ports", MODERN),
            ("int_master", "cpu_side_ports", TRANSITIONAL),
            ("int_master", "slave", LEGACY),
        ],
    ),
    (
        ConnectionRole::InterruptResponse,
        &[
            ("int_responder", "mem_side_ports", MODERN),
            ("int_slave", "mem_side_ports", TRANSITIONAL),
            ("int_slave", "master", LEGACY),
        ],
    ),
    (
        ConnectionRole::SystemBackdoor,
        &[("system_port", "cpu_side_ports", MODERN), ("system_port", "slave", LEGACY)],
    ),
];

/// Ordered candidate lists per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTable {
    entries: BTreeMap<ConnectionRole, Vec<PortCandidate>>,
}

impl CandidateTable {
    /// A table with no candidates for any role.
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Candidates for `role`, in the order they are tried.
    pub fn candidates(&self, role: ConnectionRole) -> &[PortCandidate] {
        self.entries.get(&role).map_or(&[], Vec::as_slice)
    }

    /// Replaces the candidate list for `role`.
    pub fn set(&mut self, role: ConnectionRole, candidates: Vec<PortCandidate>) {
        let _ = self.entries.insert(role, candidates);
    }

    /// Adds `candidate` ahead of the existing candidates for `role`.
    pub fn prepend(&mut self, role: ConnectionRole, candidate: PortCandidate) {
        self.entries.entry(role).or_default().insert(0, candidate);
    }

    /// Adds `candidate` after the existing candidates for `role`.
    pub fn append(&mut self, role: ConnectionRole, candidate: PortCandidate) {
        self.entries.entry(role).or_default().push(candidate);
    }

    /// Replaces the lists of every role named in `overrides`.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<ConnectionRole, Vec<PortCandidate>>) {
        for (role, candidates) in overrides {
            self.set(*role, candidates.clone());
        }
    }
}

impl Default for CandidateTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (role, candidates) in DEFAULT_CANDIDATES {
            table.set(
                role,
                candidates
                    .iter()
                    .map(|&(src, dst, conv)| PortCandidate::new(src, dst, conv))
                    .collect(),
            );
        }
        table
    }
}
