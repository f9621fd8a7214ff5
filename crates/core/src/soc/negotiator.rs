//! Port negotiation.
//!
//! The negotiator realizes one [`ConnectionRole`] between two components by walking the
//! role's candidate list in order. It provides:
//! 1. **First match wins:** The first binding the engine accepts is kept; later
//!    candidates are never tried.
//! 2. **Values, not errors:** When every candidate is refused the result is
//!    [`ConnectionResult::Unresolved`] with each attempt's engine message. Whether that
//!    is fatal is the builder's decision.
//! 3. **Idempotence:** A role already realized between the same pair is answered from
//!    the cache without touching the engine.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{Engine, ObjectId};
use crate::soc::handle::ComponentHandle;
use crate::soc::ports::{CandidateTable, ConnectionRole, PortCandidate};

/// A role bound by one of its candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealizedConnection {
    /// Logical purpose of the link.
    pub role: ConnectionRole,
    /// Component owning the source port.
    pub source: ComponentHandle,
    /// Component owning the destination port.
    pub destination: ComponentHandle,
    /// Position of the winning candidate in the role's list.
    pub candidate_index: usize,
    /// The winning candidate.
    pub candidate: PortCandidate,
}

/// One candidate the engine refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAttempt {
    /// The refused candidate.
    pub candidate: PortCandidate,
    /// The engine's diagnostic.
    pub message: String,
}

/// A role no candidate could bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedConnection {
    /// Logical purpose of the link.
    pub role: ConnectionRole,
    /// Component owning the source port.
    pub source: ComponentHandle,
    /// Component owning the destination port.
    pub destination: ComponentHandle,
    /// Every attempt, in the order tried.
    pub attempts: Vec<FailedAttempt>,
}

/// Outcome of negotiating one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ConnectionResult {
    /// Bound by a candidate.
    Realized(RealizedConnection),
    /// No candidate was accepted.
    Unresolved(UnresolvedConnection),
}

impl ConnectionResult {
    /// True for [`ConnectionResult::Realized`].
    pub const fn is_realized(&self) -> bool {
        matches!(self, Self::Realized(_))
    }

    /// Role this result is for.
    pub const fn role(&self) -> ConnectionRole {
        match self {
            Self::Realized(c) => c.role,
            Self::Unresolved(c) => c.role,
        }
    }
}

type CacheKey = (ConnectionRole, ObjectId, ObjectId);

/// Realizes connection roles against an engine using a [`CandidateTable`].
#[derive(Debug, Clone, Default)]
pub struct PortNegotiator {
    table: CandidateTable,
    realized: BTreeMap<CacheKey, RealizedConnection>,
}

impl PortNegotiator {
    /// Creates a negotiator over `table`.
    pub fn new(table: CandidateTable) -> Self {
        Self {
            table,
            realized: BTreeMap::new(),
        }
    }

    /// The candidate table in use.
    pub const fn table(&self) -> &CandidateTable {
        &self.table
    }

    /// Mutable access to the candidate table, to prepend or append conventions.
    pub fn table_mut(&mut self) -> &mut CandidateTable {
        &mut self.table
    }

    /// Binds `role` from `source` to `destination`.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine that accepts or refuses each candidate binding.
    /// * `role` - Logical link to realize.
    /// * `source` - Component owning the candidates' source ports.
    /// * `destination` - Component owning the candidates' destination ports.
    ///
    /// # Returns
    ///
    /// The realized connection with the winning candidate, or the unresolved role with
    /// every attempt's engine message. Never an error.
    pub fn connect<E: Engine + ?Sized>(
        &mut self,
        engine: &mut E,
        role: ConnectionRole,
        source: &ComponentHandle,
        destination: &ComponentHandle,
    ) -> ConnectionResult {
        let key = (role, source.id, destination.id);
        if let Some(done) = self.realized.get(&key) {
            debug!(%role, "connection already realized");
            return ConnectionResult::Realized(done.clone());
        }

        let mut attempts = Vec::new();
        for (index, candidate) in self.table.candidates(role).iter().enumerate() {
            match engine.connect(
                source.id,
                &candidate.source_port,
                destination.id,
                &candidate.destination_port,
            ) {
                Ok(()) => {
                    info!(
                        %role,
                        source = %source.name,
                        destination = %destination.name,
                        candidate = %candidate,
                        "connected"
                    );
                    let realized = RealizedConnection {
                        role,
                        source: source.clone(),
                        destination: destination.clone(),
                        candidate_index: index,
                        candidate: candidate.clone(),
                    };
                    let _ = self.realized.insert(key, realized.clone());
                    return ConnectionResult::Realized(realized);
                }
                Err(err) => {
                    debug!(%role, candidate = %candidate, error = %err, "candidate refused");
                    attempts.push(FailedAttempt {
                        candidate: candidate.clone(),
                        message: err.message().to_string(),
                    });
                }
            }
        }

        ConnectionResult::Unresolved(UnresolvedConnection {
            role,
            source: source.clone(),
            destination: destination.clone(),
            attempts,
        })
    }
}
