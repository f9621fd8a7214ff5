//! # Topology Builder Tests
//!
//! Validation order, required-role enforcement, optional-role warnings and
//! determinism, observed through the recording stub engine.

use std::path::PathBuf;

use o3wire_core::common::{Error, FailureCategory, MemorySize};
use o3wire_core::config::{BranchPredictor, CpuModel, ParameterSet};
use o3wire_core::sizing::{ScalingRule, SizingTable};
use o3wire_core::soc::{ComponentRole, ConnectionRole, TopologyBuilder};
use pretty_assertions::assert_eq;

use crate::common::harness::{Workload, init_tracing};
use crate::common::mocks::engine::StubEngine;

fn unresolved_roles(err: &Error) -> Vec<ConnectionRole> {
    match err {
        Error::TopologyIncomplete { unresolved } => unresolved.iter().map(|u| u.role).collect(),
        other => panic!("expected TopologyIncomplete, got {other}"),
    }
}

// ══════════════════════════════════════════════════════════
// 1. Validation before construction
// ══════════════════════════════════════════════════════════

#[test]
fn missing_workload_fails_before_any_engine_call() {
    let mut engine = StubEngine::modern();
    let params = ParameterSet::for_binary(PathBuf::from("/nonexistent/o3wire/bench"));
    let err = TopologyBuilder::new(&mut engine).build(&params).unwrap_err();

    assert!(matches!(err, Error::WorkloadNotFound { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(engine.create_calls(), 0);
    assert!(engine.connect_attempts.is_empty());
}

#[test]
fn non_executable_workload_fails_before_any_engine_call() {
    let workload = Workload::not_executable();
    let mut engine = StubEngine::modern();
    let err = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap_err();

    assert!(matches!(err, Error::WorkloadNotExecutable { .. }));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(engine.create_calls(), 0);
}

#[test]
fn invalid_width_fails_before_any_engine_call() {
    let workload = Workload::executable(64);
    let params = ParameterSet {
        issue_width: 0,
        ..workload.params()
    };
    let mut engine = StubEngine::modern();
    let err = TopologyBuilder::new(&mut engine).build(&params).unwrap_err();
    assert_eq!(err.category(), FailureCategory::InvalidParameter);
    assert_eq!(engine.create_calls(), 0);
}

#[test]
fn zero_memory_fails_before_any_engine_call() {
    let workload = Workload::executable(64);
    let params = ParameterSet {
        memory_size: MemorySize::mib(0),
        ..workload.params()
    };
    let mut engine = StubEngine::modern();
    let err = TopologyBuilder::new(&mut engine).build(&params).unwrap_err();

    assert!(matches!(&err, Error::InvalidParameter { name, .. } if name == "memory_size"));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(engine.create_calls(), 0);
}

#[test]
fn zero_sizing_rule_fails_before_any_engine_call() {
    let workload = Workload::executable(64);
    let sizing = SizingTable {
        issue_queue: ScalingRule::new(0, 0),
        ..SizingTable::default()
    };
    let mut engine = StubEngine::modern();
    let err = TopologyBuilder::new(&mut engine)
        .with_sizing(sizing)
        .build(&workload.params())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { name, .. } if name == "sizing.issue_queue"));
    assert_eq!(engine.create_calls(), 0);
}

#[test]
fn engine_rejection_is_a_construction_error() {
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern();
    let _ = engine.refused_classes.insert("SystemXBar".to_string());
    let err = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap_err();
    assert!(matches!(
        &err,
        Error::EngineConstruction { component, .. } if component == "system.membus"
    ));
    assert_eq!(err.exit_code(), 5);
    assert!(err.category().is_configuration());
}

// ══════════════════════════════════════════════════════════
// 2. Required and optional roles
// ══════════════════════════════════════════════════════════

#[test]
fn every_unresolved_mandatory_role_is_listed() {
    init_tracing();
    let workload = Workload::executable(64);
    let mut engine = StubEngine::accepting(&[]);
    let err = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap_err();

    assert_eq!(
        unresolved_roles(&err),
        vec![
            ConnectionRole::MemoryControl,
            ConnectionRole::InstructionFetch,
            ConnectionRole::DataAccess,
            ConnectionRole::InterruptRequest,
            ConnectionRole::InterruptResponse,
        ]
    );
    assert_eq!(err.exit_code(), 6);
    let text = err.to_string();
    assert!(text.contains("memory-control"));
    assert!(text.contains("interrupt-response"));
}

#[test]
fn out_of_order_requires_interrupt_request() {
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern_without(&["int_requestor"]);
    let err = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap_err();
    assert_eq!(unresolved_roles(&err), vec![ConnectionRole::InterruptRequest]);
}

#[test]
fn optional_roles_become_warnings() {
    init_tracing();
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern_without(&["pio", "system_port"]);
    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();

    let warned: Vec<_> = topology.warnings.iter().map(|w| w.role).collect();
    assert_eq!(
        warned,
        vec![ConnectionRole::SystemBackdoor, ConnectionRole::InterruptPio]
    );
    assert!(topology.is_realized(ConnectionRole::InterruptRequest));
    assert!(!topology.is_realized(ConnectionRole::InterruptPio));
    assert_eq!(topology.connections.len(), 5);
}

#[test]
fn simple_models_tolerate_missing_interrupt_ports() {
    let workload = Workload::executable(64);
    let params = ParameterSet {
        cpu_model: CpuModel::TimingSimple,
        ..workload.params()
    };
    let mut engine = StubEngine::modern_without(&["pio", "int_requestor", "int_responder"]);
    let topology = TopologyBuilder::new(&mut engine).build(&params).unwrap();
    assert_eq!(topology.warnings.len(), 3);
    assert_eq!(topology.resources, None);
}

// ══════════════════════════════════════════════════════════
// 3. Shape and determinism
// ══════════════════════════════════════════════════════════

#[test]
fn topology_records_components_and_parameters() {
    let workload = Workload::executable(64);
    let params = ParameterSet {
        issue_width: 4,
        branch_predictor: BranchPredictor::Tournament,
        ..workload.params()
    };
    let mut engine = StubEngine::modern();
    let topology = TopologyBuilder::new(&mut engine).build(&params).unwrap();

    assert_eq!(topology.root.role, ComponentRole::Root);
    assert_eq!(topology.parameters, params);
    assert_eq!(
        topology.component(ComponentRole::BranchPredictor).map(|h| h.class.as_str()),
        Some("TournamentBP")
    );
    assert_eq!(
        topology.resources.map(|r| r.reorder_buffer_entries),
        Some(192)
    );
    assert!(topology.warnings.is_empty());
    assert_eq!(topology.connections.len(), ConnectionRole::ALL.len());
    assert!(topology.connections.iter().all(|c| c.candidate_index == 0));
}

#[test]
fn no_predictor_means_no_predictor_object() {
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern();
    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    assert!(topology.component(ComponentRole::BranchPredictor).is_none());
    assert!(engine.created.iter().all(|s| !s.class.ends_with("BP")));
}

#[test]
fn builds_are_deterministic() {
    let workload = Workload::executable(64);
    let params = workload.params();

    let pairs = [("port", "master"), ("icache_port", "cpu_side_ports")];
    let mut first_engine = StubEngine::accepting(&pairs);
    let first = TopologyBuilder::new(&mut first_engine).build(&params);
    let mut second_engine = StubEngine::accepting(&pairs);
    let second = TopologyBuilder::new(&mut second_engine).build(&params);

    assert_eq!(first_engine.connect_attempts, second_engine.connect_attempts);
    assert_eq!(
        first.map_err(|e| e.to_string()).map(|t| t.to_json().unwrap()),
        second.map_err(|e| e.to_string()).map(|t| t.to_json().unwrap())
    );
}

#[test]
fn topology_serializes_roles_and_candidates() {
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern();
    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&topology.to_json().unwrap()).unwrap();

    let connections = json["connections"].as_array().unwrap();
    assert_eq!(connections[0]["role"], "memory-control");
    assert_eq!(connections[0]["candidate"]["convention"], "requestor/responder");
    assert_eq!(json["parameters"]["branch_predictor"], "none");
    assert_eq!(json["root"]["role"], "root");
}
