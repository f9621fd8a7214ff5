//! The simulation engine seam.
//!
//! The engine (object model, event loop, timing models, statistics) is an external
//! collaborator. This module defines the surface the topology builder and driver use:
//! 1. **Construction:** `create` an object from an [`ObjectSpec`], `set_param` on it.
//! 2. **Wiring:** `connect` one named port to another; the engine accepts or refuses.
//! 3. **Lifecycle:** `instantiate` once, `simulate` to completion, read `cur_tick`,
//!    `dump_stats`.
//!
//! [`reference::ReferenceEngine`] implements the surface in process.

use serde::Serialize;

use crate::common::EngineError;

/// Port catalog of the reference engine, per naming dialect.
pub mod catalog;

/// Workload image inspection.
pub mod image;

/// In-process reference engine.
pub mod reference;

/// Run statistics kept by the reference engine.
pub mod stats;

pub use catalog::PortDialect;
pub use reference::ReferenceEngine;

/// Exit cause the engine reports when the workload's last thread exits.
pub const EXIT_CAUSE_LAST_THREAD: &str = "exiting with last active thread context";

/// Exit cause the engine reports when a tick limit ends the run.
pub const EXIT_CAUSE_TICK_LIMIT: &str = "simulate() limit reached";

/// Identifier of an engine-constructed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(pub u32);

/// Value of an object parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Boolean parameter.
    Bool(bool),
    /// Integer parameter.
    Int(u64),
    /// String parameter (also used for suffixed sizes and clocks).
    Str(String),
    /// List of strings (command lines).
    StrList(Vec<String>),
    /// Reference to another object.
    Object(ObjectId),
}

impl ParamValue {
    /// Returns the integer value, if this is one.
    pub const fn as_int(&self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the referenced object, if this is a reference.
    pub const fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }
}

/// Construction request for one engine object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpec {
    /// Engine class name (e.g. `"SystemXBar"`).
    pub class: String,
    /// Hierarchical name (e.g. `"system.membus"`).
    pub name: String,
    /// Parent object, if any.
    pub parent: Option<ObjectId>,
    /// Construction parameters, in the order they are applied.
    pub params: Vec<(String, ParamValue)>,
}

impl ObjectSpec {
    /// Creates a spec with no parent and no parameters.
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            parent: None,
            params: Vec::new(),
        }
    }

    /// Sets the parent object.
    #[must_use]
    pub const fn child_of(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a construction parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// Looks up a construction parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// The event that ended a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitEvent {
    /// Engine-reported cause text.
    pub cause: String,
    /// Exit status attached to the event (the workload's, for a normal exit).
    pub code: i64,
}

/// Construction, wiring, and lifecycle surface of a simulation engine.
///
/// An engine holds at most one live topology: objects are created and connected,
/// then `instantiate` freezes the graph, `simulate` runs it, and `dump_stats` reports.
pub trait Engine {
    /// Engine version string, for diagnostics.
    fn version(&self) -> String;

    /// Constructs one object.
    fn create(&mut self, spec: ObjectSpec) -> Result<ObjectId, EngineError>;

    /// Assigns a parameter on an existing object.
    fn set_param(
        &mut self,
        object: ObjectId,
        name: &str,
        value: ParamValue,
    ) -> Result<(), EngineError>;

    /// Binds `source.source_port` to `destination.destination_port`.
    ///
    /// Fails without side effects if either port name is unknown to this engine.
    fn connect(
        &mut self,
        source: ObjectId,
        source_port: &str,
        destination: ObjectId,
        destination_port: &str,
    ) -> Result<(), EngineError>;

    /// Creates the interrupt controller of `processor` and returns it.
    fn create_interrupt_controller(&mut self, processor: ObjectId)
    -> Result<ObjectId, EngineError>;

    /// Creates the thread contexts of `processor` for its bound workload.
    fn create_threads(&mut self, processor: ObjectId) -> Result<(), EngineError>;

    /// Freezes and elaborates the graph rooted at `root`.
    fn instantiate(&mut self, root: ObjectId) -> Result<(), EngineError>;

    /// Runs to completion, or until `max_ticks` ticks have elapsed.
    fn simulate(&mut self, max_ticks: Option<u64>) -> Result<ExitEvent, EngineError>;

    /// Current logical time in ticks.
    fn cur_tick(&self) -> u64;

    /// Renders the engine's statistics report.
    fn dump_stats(&mut self) -> Result<String, EngineError>;
}
