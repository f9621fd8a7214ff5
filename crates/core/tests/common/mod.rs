//! Shared test infrastructure.

/// Temporary workloads and tracing setup.
pub mod harness;
