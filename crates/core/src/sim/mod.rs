//! Simulation preconditions and the run driver.
//!
//! Provides the workload binary checks performed before construction and the driver
//! that instantiates, runs and reports a built topology.

/// Instantiate / run / report.
pub mod driver;

/// Workload binary preconditions.
pub mod workload;

pub use driver::{RunResult, SimulationDriver, TerminationCause};
pub use workload::check_workload;
