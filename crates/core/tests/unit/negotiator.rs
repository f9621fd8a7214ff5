//! # Port Negotiator Tests
//!
//! First-match-wins ordering, attempt counting, unresolved results, caching and
//! candidate overrides.

use std::collections::BTreeMap;

use o3wire_core::engine::ObjectId;
use o3wire_core::soc::{
    CandidateTable, ComponentHandle, ComponentRole, ConnectionResult, ConnectionRole,
    PortCandidate, PortNegotiator,
};
use pretty_assertions::assert_eq;

use crate::common::mocks::engine::StubEngine;

fn memory() -> ComponentHandle {
    ComponentHandle::new(ObjectId(1), ComponentRole::MemoryController, "system.mem_ctrl", "MemCtrl")
}

fn membus() -> ComponentHandle {
    ComponentHandle::new(ObjectId(2), ComponentRole::Interconnect, "system.membus", "SystemXBar")
}

// ══════════════════════════════════════════════════════════
// 1. Ordering
// ══════════════════════════════════════════════════════════

#[test]
fn first_candidate_wins_with_one_attempt() {
    let mut engine = StubEngine::modern();
    let mut negotiator = PortNegotiator::default();
    let result =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());

    let ConnectionResult::Realized(conn) = result else {
        panic!("expected realized connection");
    };
    assert_eq!(conn.candidate_index, 0);
    assert_eq!(conn.candidate.destination_port, "mem_side_ports");
    assert_eq!(engine.connect_attempts.len(), 1);
}

#[test]
fn kth_candidate_costs_exactly_k_attempts() {
    let mut table = CandidateTable::empty();
    table.set(
        ConnectionRole::MemoryControl,
        vec![
            PortCandidate::new("port", "mem_side_ports", "a"),
            PortCandidate::new("port", "downstream", "b"),
            PortCandidate::new("port", "master", "c"),
            PortCandidate::new("port", "also_master", "d"),
        ],
    );
    let mut engine = StubEngine::accepting(&[("port", "master"), ("port", "also_master")]);
    let mut negotiator = PortNegotiator::new(table);

    let result =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());

    let ConnectionResult::Realized(conn) = result else {
        panic!("expected realized connection");
    };
    assert_eq!(conn.candidate_index, 2);
    assert_eq!(conn.candidate.convention, "c");
    assert_eq!(
        engine.connect_attempts,
        vec![
            ("port".to_string(), "mem_side_ports".to_string()),
            ("port".to_string(), "downstream".to_string()),
            ("port".to_string(), "master".to_string()),
        ]
    );
}

#[test]
fn legacy_only_engine_uses_second_candidate() {
    let mut engine = StubEngine::accepting(&[("port", "master")]);
    let mut negotiator = PortNegotiator::default();
    let result =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());
    match result {
        ConnectionResult::Realized(conn) => {
            assert_eq!(conn.candidate_index, 1);
            assert_eq!(conn.candidate.convention, "master/slave");
        }
        ConnectionResult::Unresolved(u) => panic!("unexpected unresolved: {u:?}"),
    }
}

// ══════════════════════════════════════════════════════════
// 2. Unresolved
// ══════════════════════════════════════════════════════════

#[test]
fn exhausted_candidates_are_a_value_not_an_error() {
    let mut engine = StubEngine::accepting(&[]);
    let mut negotiator = PortNegotiator::default();
    let result =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());

    let ConnectionResult::Unresolved(unresolved) = result else {
        panic!("expected unresolved");
    };
    assert_eq!(unresolved.role, ConnectionRole::MemoryControl);
    assert_eq!(unresolved.source.name, "system.mem_ctrl");
    assert_eq!(unresolved.attempts.len(), 2);
    assert!(unresolved.attempts[0].message.contains("mem_side_ports"));
    assert!(unresolved.attempts[1].message.contains("master"));
}

#[test]
fn role_without_candidates_is_unresolved_without_engine_calls() {
    let mut engine = StubEngine::modern();
    let mut negotiator = PortNegotiator::new(CandidateTable::empty());
    let result = negotiator.connect(&mut engine, ConnectionRole::DataAccess, &memory(), &membus());
    assert!(!result.is_realized());
    assert!(engine.connect_attempts.is_empty());
}

// ══════════════════════════════════════════════════════════
// 3. Idempotence and overrides
// ══════════════════════════════════════════════════════════

#[test]
fn repeated_connect_is_served_from_cache() {
    let mut engine = StubEngine::accepting(&[("port", "master")]);
    let mut negotiator = PortNegotiator::default();
    let first =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());
    let attempts = engine.connect_attempts.len();
    let second =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());

    assert_eq!(first, second);
    assert_eq!(engine.connect_attempts.len(), attempts);
}

#[test]
fn unresolved_results_are_not_cached() {
    let mut engine = StubEngine::accepting(&[]);
    let mut negotiator = PortNegotiator::default();
    let _ =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());
    let _ =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());
    assert_eq!(engine.connect_attempts.len(), 4);
}

#[test]
fn overrides_replace_only_named_roles() {
    let mut overrides = BTreeMap::new();
    let _ = overrides.insert(
        ConnectionRole::MemoryControl,
        vec![PortCandidate::new("port", "downstream", "vendor")],
    );
    let mut table = CandidateTable::default();
    table.apply_overrides(&overrides);

    assert_eq!(table.candidates(ConnectionRole::MemoryControl).len(), 1);
    assert_eq!(table.candidates(ConnectionRole::DataAccess).len(), 2);

    let mut engine = StubEngine::accepting(&[("port", "downstream")]);
    let mut negotiator = PortNegotiator::new(table);
    let result =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());
    assert!(result.is_realized());
}

#[test]
fn prepended_candidate_is_tried_first() {
    let mut negotiator = PortNegotiator::default();
    negotiator.table_mut().prepend(
        ConnectionRole::MemoryControl,
        PortCandidate::new("port", "downstream", "vendor"),
    );
    let mut engine = StubEngine::modern();
    let _ =
        negotiator.connect(&mut engine, ConnectionRole::MemoryControl, &memory(), &membus());
    assert_eq!(engine.connect_attempts[0].1, "downstream");
    assert_eq!(engine.connect_attempts.len(), 2);
}
