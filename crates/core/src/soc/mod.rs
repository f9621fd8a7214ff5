//! Topology construction components.
//!
//! This module organizes everything that turns parameters into a connected component
//! graph: handles to constructed objects, the component factory, the port candidate
//! table and negotiator, and the builder that orchestrates them.

/// Topology builder and the built topology.
pub mod builder;

/// One constructor per component kind.
pub mod factory;

/// Handles to constructed components.
pub mod handle;

/// Ordered port-candidate negotiation.
pub mod negotiator;

/// Connection roles and the port-name candidate table.
pub mod ports;

pub use builder::{Topology, TopologyBuilder, mandatory_roles};
pub use factory::ComponentFactory;
pub use handle::{ComponentHandle, ComponentRole};
pub use negotiator::{ConnectionResult, PortNegotiator, RealizedConnection, UnresolvedConnection};
pub use ports::{CandidateTable, ConnectionRole, PortCandidate};
