//! Superscalar topology builder.
//!
//! This crate assembles a simulated out-of-order system from a handful of parameters and
//! runs it on a simulation engine. It provides the following:
//! 1. **Config:** Parameter set, sizing table, port overrides and output options.
//! 2. **Sizing:** Backend capacities derived from a single issue-width knob.
//! 3. **SoC:** Component factory, port negotiation across engine naming conventions, and
//!    the topology builder.
//! 4. **Engine:** The engine trait and an in-process reference engine.
//! 5. **Simulation:** Workload preconditions and the run driver.

/// Common types (errors, units).
pub mod common;
/// Build configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Engine seam and the reference engine.
pub mod engine;
/// Workload checks and the simulation driver.
pub mod sim;
/// Pipeline-resource sizing policy.
pub mod sizing;
/// Topology construction (factory, negotiator, builder).
pub mod soc;

/// Error taxonomy; every failure maps to a distinct exit status.
pub use crate::common::{Error, Result};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::{Config, ParameterSet};
/// Engine trait and the in-process engine.
pub use crate::engine::{Engine, ReferenceEngine};
/// Run driver and its outcome.
pub use crate::sim::{RunResult, SimulationDriver};
/// Builder entry point and its product.
pub use crate::soc::{Topology, TopologyBuilder};
