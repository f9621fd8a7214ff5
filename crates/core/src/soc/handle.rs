//! Handles to constructed components.

use std::fmt;

use serde::Serialize;

use crate::engine::ObjectId;

/// What a component is for in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentRole {
    /// Top-level system container.
    System,
    /// Clock (and voltage) domain of the system.
    ClockDomain,
    /// System interconnect.
    Interconnect,
    /// Main memory controller.
    MemoryController,
    /// Processor core.
    Processor,
    /// Branch predictor attached to the processor.
    BranchPredictor,
    /// Processor interrupt controller.
    InterruptController,
    /// Syscall-emulation workload and process.
    Workload,
    /// Simulation root.
    Root,
}

impl ComponentRole {
    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::ClockDomain => "clock-domain",
            Self::Interconnect => "interconnect",
            Self::MemoryController => "memory-controller",
            Self::Processor => "processor",
            Self::BranchPredictor => "branch-predictor",
            Self::InterruptController => "interrupt-controller",
            Self::Workload => "workload",
            Self::Root => "root",
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructed component: its engine id plus what the builder knows about it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ComponentHandle {
    /// Engine object id.
    pub id: ObjectId,
    /// Purpose in the topology.
    pub role: ComponentRole,
    /// Hierarchical name (`system.cpu`).
    pub name: String,
    /// Engine class name.
    pub class: String,
}

impl ComponentHandle {
    /// Creates a handle.
    pub fn new(
        id: ObjectId,
        role: ComponentRole,
        name: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            id,
            role,
            name: name.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.class)
    }
}
