//! # Simulation Driver Tests
//!
//! Lifecycle ordering, error surfacing and statistics flushing.

use mockall::Sequence;
use mockall::predicate::eq;
use o3wire_core::common::{EngineError, Error};
use o3wire_core::engine::{EXIT_CAUSE_LAST_THREAD, ExitEvent, ObjectId, ReferenceEngine};
use o3wire_core::sim::{SimulationDriver, TerminationCause};
use o3wire_core::soc::TopologyBuilder;
use pretty_assertions::assert_eq;

use crate::common::harness::Workload;
use crate::common::mocks::engine::{MockSimEngine, StubEngine};

/// A mock that accepts every construction and connection.
fn permissive_mock() -> MockSimEngine {
    let mut engine = MockSimEngine::new();
    let mut next = 0u32;
    engine.expect_version().return_const("mock".to_string());
    engine.expect_create().returning(move |_| {
        next += 1;
        Ok(ObjectId(next))
    });
    engine.expect_set_param().returning(|_, _, _| Ok(()));
    engine.expect_connect().returning(|_, _, _, _| Ok(()));
    engine
        .expect_create_interrupt_controller()
        .returning(|_| Ok(ObjectId(1000)));
    engine.expect_create_threads().returning(|_| Ok(()));
    engine
}

// ══════════════════════════════════════════════════════════
// 1. Engine failures
// ══════════════════════════════════════════════════════════

#[test]
fn instantiation_failure_carries_engine_message() {
    let workload = Workload::executable(64);
    let mut engine = permissive_mock();
    engine
        .expect_instantiate()
        .times(1)
        .returning(|_| Err(EngineError::new("fatal: system.cpu.dcache_port not connected")));
    engine.expect_simulate().times(0);
    engine.expect_dump_stats().times(0);

    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let mut sink = Vec::new();
    let err = SimulationDriver::new(&mut engine, &mut sink)
        .run(&topology)
        .unwrap_err();

    assert!(matches!(&err, Error::EngineInstantiation(e) if e.message().contains("dcache_port")));
    assert_eq!(err.exit_code(), 7);
    assert!(!err.category().is_configuration());
    assert!(sink.is_empty());
}

#[test]
fn runtime_failure_is_engine_runtime() {
    let workload = Workload::executable(64);
    let mut engine = permissive_mock();
    engine.expect_instantiate().returning(|_| Ok(()));
    engine
        .expect_simulate()
        .returning(|_| Err(EngineError::new("panic: unimplemented syscall 435")));
    engine
        .expect_dump_stats()
        .times(1)
        .returning(|| Ok("simTicks 17\n".to_string()));

    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let mut sink = Vec::new();
    let err = SimulationDriver::new(&mut engine, &mut sink)
        .run(&topology)
        .unwrap_err();
    assert!(matches!(err, Error::EngineRuntime(_)));
    assert_eq!(err.exit_code(), 8);
    assert_eq!(String::from_utf8(sink).unwrap(), "simTicks 17\n");
}

#[test]
fn runtime_failure_survives_missing_stats() {
    let workload = Workload::executable(64);
    let mut engine = permissive_mock();
    engine.expect_instantiate().returning(|_| Ok(()));
    engine
        .expect_simulate()
        .returning(|_| Err(EngineError::new("fatal: out of memory")));
    engine
        .expect_dump_stats()
        .returning(|| Err(EngineError::new("statistics unavailable")));

    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let mut sink = Vec::new();
    let err = SimulationDriver::new(&mut engine, &mut sink)
        .run(&topology)
        .unwrap_err();
    assert!(matches!(&err, Error::EngineRuntime(e) if e.message() == "fatal: out of memory"));
    assert!(sink.is_empty());
}

// ══════════════════════════════════════════════════════════
// 2. Lifecycle and reporting
// ══════════════════════════════════════════════════════════

#[test]
fn lifecycle_runs_in_order_and_flushes_stats() {
    let workload = Workload::executable(64);
    let mut engine = permissive_mock();
    let mut seq = Sequence::new();
    engine
        .expect_instantiate()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_simulate()
        .with(eq(Some(5000)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(ExitEvent {
                cause: EXIT_CAUSE_LAST_THREAD.to_string(),
                code: 0,
            })
        });
    engine
        .expect_cur_tick()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(4321u64);
    engine
        .expect_dump_stats()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok("simTicks 4321\n".to_string()));

    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let mut driver = SimulationDriver::new(&mut engine, Vec::new()).with_max_ticks(Some(5000));
    let result = driver.run(&topology).unwrap();

    assert_eq!(result.end_tick, 4321);
    assert_eq!(result.termination_cause, TerminationCause::ExitedNormally);
    assert_eq!(driver.into_sink(), b"simTicks 4321\n".to_vec());
}

#[test]
fn stub_engine_round_trip() {
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern();
    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let mut sink = Vec::new();
    let result = SimulationDriver::new(&mut engine, &mut sink)
        .run(&topology)
        .unwrap();
    assert_eq!(result.end_tick, 1000);
    assert_eq!(
        result.report_line(),
        "Exiting @ tick 1000 because exiting with last active thread context"
    );
    assert_eq!(String::from_utf8(sink).unwrap(), "stub statistics\n");
}

#[test]
fn tick_limit_stops_reference_run() {
    let workload = Workload::executable(4096);
    let mut engine = ReferenceEngine::default();
    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let result = SimulationDriver::new(&mut engine, Vec::new())
        .with_max_ticks(Some(1000))
        .run(&topology)
        .unwrap();
    assert_eq!(result.end_tick, 1000);
    assert_eq!(result.termination_cause, TerminationCause::TickLimitReached);
    assert_eq!(
        result.report_line(),
        "Exiting @ tick 1000 because simulate() limit reached"
    );
}

#[test]
fn second_run_on_same_engine_is_refused() {
    let workload = Workload::executable(64);
    let mut engine = ReferenceEngine::default();
    let topology = TopologyBuilder::new(&mut engine)
        .build(&workload.params())
        .unwrap();
    let _ = SimulationDriver::new(&mut engine, Vec::new())
        .run(&topology)
        .unwrap();
    let err = SimulationDriver::new(&mut engine, Vec::new())
        .run(&topology)
        .unwrap_err();
    assert!(matches!(err, Error::EngineInstantiation(_)));
}
