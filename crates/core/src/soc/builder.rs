//! Topology construction.
//!
//! This module assembles the complete simulated system from a [`ParameterSet`]. It
//! performs:
//! 1. **Validation:** Scalar parameters, the sizing table and the workload binary are
//!    checked before the engine is asked to construct anything.
//! 2. **Construction:** System and clock, interconnect, memory, processor (sized, with
//!    its predictor), interrupt controller, workload and root, in that order.
//! 3. **Wiring:** Each planned [`ConnectionRole`] is negotiated as soon as both ends
//!    exist. Unresolved mandatory roles fail the build together; unresolved optional
//!    roles become warnings on the topology.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::{Error, Result};
use crate::config::{Config, CpuModel, MemoryKind, ParameterSet};
use crate::engine::{Engine, ParamValue};
use crate::sim::workload::check_workload;
use crate::sizing::{ResourceSizes, SizingTable};
use crate::soc::factory::ComponentFactory;
use crate::soc::handle::{ComponentHandle, ComponentRole};
use crate::soc::negotiator::{
    ConnectionResult, PortNegotiator, RealizedConnection, UnresolvedConnection,
};
use crate::soc::ports::{CandidateTable, ConnectionRole};

const OUT_OF_ORDER_ROLES: &[ConnectionRole] = &[
    ConnectionRole::InstructionFetch,
    ConnectionRole::DataAccess,
    ConnectionRole::MemoryControl,
    ConnectionRole::InterruptRequest,
    ConnectionRole::InterruptResponse,
];

const SIMPLE_ROLES: &[ConnectionRole] = &[
    ConnectionRole::InstructionFetch,
    ConnectionRole::DataAccess,
    ConnectionRole::MemoryControl,
];

/// Roles whose absence makes a topology unusable for `cpu` with `memory`.
///
/// The out-of-order model cannot run without its interrupt request and response paths;
/// the simpler models only need fetch, data and memory. Every other planned role is
/// optional.
pub const fn mandatory_roles(cpu: CpuModel, memory: MemoryKind) -> &'static [ConnectionRole] {
    match (cpu, memory) {
        (CpuModel::OutOfOrder, MemoryKind::Ddr3 | MemoryKind::Simple) => OUT_OF_ORDER_ROLES,
        (CpuModel::InOrder | CpuModel::TimingSimple, _) => SIMPLE_ROLES,
    }
}

/// A fully constructed and connected component graph.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    /// Simulation root.
    pub root: ComponentHandle,
    /// Every constructed component, in construction order.
    pub components: Vec<ComponentHandle>,
    /// Realized connections, in wiring order.
    pub connections: Vec<RealizedConnection>,
    /// Optional roles no candidate could realize.
    pub warnings: Vec<UnresolvedConnection>,
    /// Backend sizes applied to an out-of-order processor.
    pub resources: Option<ResourceSizes>,
    /// Parameters the topology was built from.
    pub parameters: ParameterSet,
}

impl Topology {
    /// First component with `role`.
    pub fn component(&self, role: ComponentRole) -> Option<&ComponentHandle> {
        self.components.iter().find(|c| c.role == role)
    }

    /// Realized connection for `role`.
    pub fn connection(&self, role: ConnectionRole) -> Option<&RealizedConnection> {
        self.connections.iter().find(|c| c.role == role)
    }

    /// True when `role` was realized.
    pub fn is_realized(&self, role: ConnectionRole) -> bool {
        self.connection(role).is_some()
    }

    /// Pretty-printed JSON description of the topology.
    ///
    /// Serializer failures surface as [`Error::Serialize`].
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| Error::Serialize {
            what: "topology",
            source,
        })
    }

    /// Writes [`Topology::to_json`] to `path`; write failures surface as [`Error::Io`].
    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builds a [`Topology`] on a borrowed engine.
#[derive(Debug)]
pub struct TopologyBuilder<'e, E: Engine + ?Sized> {
    engine: &'e mut E,
    sizing: SizingTable,
    negotiator: PortNegotiator,
}

impl<'e, E: Engine + ?Sized> TopologyBuilder<'e, E> {
    /// Creates a builder with the default sizing table and candidate table.
    pub fn new(engine: &'e mut E) -> Self {
        Self {
            engine,
            sizing: SizingTable::default(),
            negotiator: PortNegotiator::default(),
        }
    }

    /// Creates a builder using the sizing table and port overrides of `config`.
    pub fn from_config(engine: &'e mut E, config: &Config) -> Self {
        let mut table = CandidateTable::default();
        table.apply_overrides(&config.ports);
        Self::new(engine)
            .with_sizing(config.sizing.clone())
            .with_candidates(table)
    }

    /// Replaces the sizing table.
    #[must_use]
    pub fn with_sizing(mut self, sizing: SizingTable) -> Self {
        self.sizing = sizing;
        self
    }

    /// Replaces the candidate table.
    #[must_use]
    pub fn with_candidates(mut self, table: CandidateTable) -> Self {
        self.negotiator = PortNegotiator::new(table);
        self
    }

    /// Constructs and wires the topology described by `params`.
    ///
    /// # Arguments
    ///
    /// * `params` - Validated scalar inputs.
    ///
    /// # Returns
    ///
    /// The topology, or the first failure: [`Error::InvalidParameter`],
    /// [`Error::WorkloadNotFound`] and [`Error::WorkloadNotExecutable`] before any engine
    /// call, [`Error::EngineConstruction`] when the engine rejects an object, and
    /// [`Error::TopologyIncomplete`] listing every mandatory role left unresolved.
    pub fn build(mut self, params: &ParameterSet) -> Result<Topology> {
        params.validate()?;
        self.sizing.validate()?;
        let resources = match params.cpu_model {
            CpuModel::OutOfOrder => Some(self.sizing.size_for(params.issue_width)?),
            CpuModel::InOrder | CpuModel::TimingSimple => None,
        };
        check_workload(&params.binary_path)?;

        info!(
            width = params.issue_width,
            memory = %params.memory_size,
            predictor = %params.branch_predictor,
            cpu = params.cpu_model.as_str(),
            engine = %self.engine.version(),
            "building topology"
        );

        let mut results = Vec::new();
        let negotiator = &mut self.negotiator;
        let mut factory = ComponentFactory::new(&mut *self.engine);

        let system = factory.make_system(&params.clock_rate, params.memory_size)?;
        let membus = factory.make_interconnect(&system)?;

        let memory =
            factory.make_memory_controller(&system, params.memory_size, params.memory_kind)?;
        results.push(negotiator.connect(
            factory.engine_mut(),
            ConnectionRole::MemoryControl,
            &memory,
            &membus,
        ));
        results.push(negotiator.connect(
            factory.engine_mut(),
            ConnectionRole::SystemBackdoor,
            &system,
            &membus,
        ));

        let cpu = factory.make_processor(
            &system,
            params.cpu_model,
            resources.as_ref(),
            params.issue_width,
            params.branch_predictor,
        )?;
        for role in [ConnectionRole::InstructionFetch, ConnectionRole::DataAccess] {
            results.push(negotiator.connect(factory.engine_mut(), role, &cpu, &membus));
        }

        let interrupts = factory.make_interrupt_controller(&cpu)?;
        for role in [
            ConnectionRole::InterruptPio,
            ConnectionRole::InterruptRequest,
            ConnectionRole::InterruptResponse,
        ] {
            results.push(negotiator.connect(factory.engine_mut(), role, &interrupts, &membus));
        }

        let mandatory = mandatory_roles(params.cpu_model, params.memory_kind);
        let (connections, warnings) = resolve(results, mandatory)?;

        let process = factory.make_workload(&system, &params.binary_path)?;
        factory.assign(&cpu, "workload", ParamValue::Object(process.id))?;
        factory.create_threads(&cpu)?;
        let root = factory.make_root(&system)?;

        let components = factory.into_components();
        info!(
            components = components.len(),
            connections = connections.len(),
            warnings = warnings.len(),
            "topology built"
        );
        Ok(Topology {
            root,
            components,
            connections,
            warnings,
            resources,
            parameters: params.clone(),
        })
    }
}

/// Splits negotiation results into realized connections and optional-role warnings,
/// failing when any mandatory role is unresolved.
fn resolve(
    results: Vec<ConnectionResult>,
    mandatory: &[ConnectionRole],
) -> Result<(Vec<RealizedConnection>, Vec<UnresolvedConnection>)> {
    let mut connections = Vec::new();
    let mut warnings = Vec::new();
    let mut missing = Vec::new();
    for result in results {
        match result {
            ConnectionResult::Realized(conn) => connections.push(conn),
            ConnectionResult::Unresolved(conn) if mandatory.contains(&conn.role) => {
                missing.push(conn);
            }
            ConnectionResult::Unresolved(conn) => {
                warn!(
                    role = %conn.role,
                    source = %conn.source.name,
                    destination = %conn.destination.name,
                    attempts = conn.attempts.len(),
                    "optional connection left unresolved"
                );
                warnings.push(conn);
            }
        }
    }
    if missing.is_empty() {
        Ok((connections, warnings))
    } else {
        Err(Error::TopologyIncomplete { unresolved: missing })
    }
}
