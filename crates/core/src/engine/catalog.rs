//! Class and port catalog of the reference engine.
//!
//! Each engine release exposes a fixed set of object classes and, per class, a set of
//! named ports. Port names are where releases differ: the crossbar's `slave`/`master`
//! vector ports became `cpu_side_ports`/`mem_side_ports`, and the interrupt
//! controller's `int_master`/`int_slave` became `int_requestor`/`int_responder`. A
//! [`PortDialect`] selects which names a given engine instance understands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::Error;

/// Port-naming convention understood by an engine release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortDialect {
    /// Producer/consumer names only (`cpu_side_ports`, `int_requestor`).
    #[default]
    Modern,
    /// Releases that accept both the new crossbar names and `int_master`/`int_slave`.
    Transitional,
    /// Master/slave names only.
    Legacy,
}

impl PortDialect {
    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Transitional => "transitional",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for PortDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(Self::Modern),
            "transitional" => Ok(Self::Transitional),
            "legacy" => Ok(Self::Legacy),
            _ => Err(Error::invalid(
                "engine_dialect",
                format!("unknown dialect `{s}` (expected modern, transitional or legacy)"),
            )),
        }
    }
}

/// What kind of object a class constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Simulation root.
    Root,
    /// Top-level system container.
    System,
    /// Voltage domain.
    VoltageDomain,
    /// Source clock domain.
    ClockDomain,
    /// System crossbar.
    Crossbar,
    /// Memory controller or simple memory.
    MemoryController,
    /// DRAM device attached to a memory controller.
    DramDevice,
    /// Out-of-order processor.
    OutOfOrderCpu,
    /// In-order or timing-simple processor.
    SimpleCpu,
    /// Branch predictor.
    BranchPredictor,
    /// Per-processor interrupt controller.
    InterruptController,
    /// Syscall-emulation process.
    Process,
    /// Syscall-emulation workload.
    Workload,
}

impl ClassKind {
    /// True for processor classes.
    pub const fn is_cpu(self) -> bool {
        matches!(self, Self::OutOfOrderCpu | Self::SimpleCpu)
    }
}

/// Resolves a class name to its kind.
pub fn class_kind(class: &str) -> Option<ClassKind> {
    let kind = match class {
        "Root" => ClassKind::Root,
        "System" => ClassKind::System,
        "VoltageDomain" => ClassKind::VoltageDomain,
        "SrcClockDomain" => ClassKind::ClockDomain,
        "SystemXBar" => ClassKind::Crossbar,
        "MemCtrl" | "SimpleMemory" => ClassKind::MemoryController,
        "DDR3_1600_8x8" => ClassKind::DramDevice,
        "DerivO3CPU" | "O3CPU" | "X86O3CPU" => ClassKind::OutOfOrderCpu,
        "MinorCPU" | "TimingSimpleCPU" => ClassKind::SimpleCpu,
        "LocalBP" | "TournamentBP" | "BiModeBP" | "StaticBP" => ClassKind::BranchPredictor,
        "X86LocalApic" => ClassKind::InterruptController,
        "Process" => ClassKind::Process,
        "SEWorkload" => ClassKind::Workload,
        _ => return None,
    };
    Some(kind)
}

/// Direction of a port: requests flow from `Request` ports to `Response` ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Issues requests.
    Request,
    /// Services requests.
    Response,
}

/// One named port on a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortInfo {
    /// Attribute name.
    pub name: &'static str,
    /// Request or response side.
    pub direction: PortDirection,
    /// Vector ports accept any number of peers.
    pub vector: bool,
    /// Instantiation fails while a required port is unbound.
    pub required: bool,
}

const fn port(name: &'static str, direction: PortDirection) -> PortInfo {
    PortInfo {
        name,
        direction,
        vector: false,
        required: false,
    }
}

const fn vector_port(name: &'static str, direction: PortDirection) -> PortInfo {
    PortInfo {
        name,
        direction,
        vector: true,
        required: false,
    }
}

const fn required_port(name: &'static str, direction: PortDirection) -> PortInfo {
    PortInfo {
        name,
        direction,
        vector: false,
        required: true,
    }
}

use PortDirection::{Request, Response};

const XBAR_MODERN: &[PortInfo] = &[
    vector_port("cpu_side_ports", Response),
    vector_port("mem_side_ports", Request),
];
const XBAR_LEGACY: &[PortInfo] = &[vector_port("slave", Response), vector_port("master", Request)];
const XBAR_TRANSITIONAL: &[PortInfo] = &[
    vector_port("cpu_side_ports", Response),
    vector_port("mem_side_ports", Request),
    vector_port("slave", Response),
    vector_port("master", Request),
];

const CPU_PORTS: &[PortInfo] = &[
    required_port("icache_port", Request),
    required_port("dcache_port", Request),
];
const SYSTEM_PORTS: &[PortInfo] = &[port("system_port", Request)];
const MEMORY_PORTS: &[PortInfo] = &[required_port("port", Response)];

const INTC_MODERN: &[PortInfo] = &[
    port("pio", Response),
    port("int_requestor", Request),
    port("int_responder", Response),
];
const INTC_LEGACY: &[PortInfo] = &[
    port("pio", Response),
    port("int_master", Request),
    port("int_slave", Response),
];

/// Ports of `kind` under `dialect`.
pub const fn ports(kind: ClassKind, dialect: PortDialect) -> &'static [PortInfo] {
    match (kind, dialect) {
        (ClassKind::Crossbar, PortDialect::Modern) => XBAR_MODERN,
        (ClassKind::Crossbar, PortDialect::Transitional) => XBAR_TRANSITIONAL,
        (ClassKind::Crossbar, PortDialect::Legacy) => XBAR_LEGACY,
        (ClassKind::OutOfOrderCpu | ClassKind::SimpleCpu, _) => CPU_PORTS,
        (ClassKind::System, _) => SYSTEM_PORTS,
        (ClassKind::MemoryController, _) => MEMORY_PORTS,
        (ClassKind::InterruptController, PortDialect::Modern) => INTC_MODERN,
        (ClassKind::InterruptController, PortDialect::Transitional | PortDialect::Legacy) => {
            INTC_LEGACY
        }
        _ => &[],
    }
}

/// Looks up one port of `kind` by name.
pub fn find_port(kind: ClassKind, dialect: PortDialect, name: &str) -> Option<PortInfo> {
    ports(kind, dialect).iter().copied().find(|p| p.name == name)
}
