//! # Component Factory Tests
//!
//! Constructors allocate and parameterize objects without wiring them.

use std::path::Path;

use o3wire_core::common::{Error, MemorySize};
use o3wire_core::config::{BranchPredictor, CpuModel, MemoryKind};
use o3wire_core::engine::ParamValue;
use o3wire_core::sizing::size_for;
use o3wire_core::soc::{ComponentFactory, ComponentRole};
use pretty_assertions::assert_eq;

use crate::common::harness::Workload;
use crate::common::mocks::engine::StubEngine;

#[test]
fn system_gets_clock_and_memory_range() {
    let mut engine = StubEngine::modern();
    let mut factory = ComponentFactory::new(&mut engine);
    let system = factory.make_system("2GHz", MemorySize::mib(256)).unwrap();
    assert_eq!(system.role, ComponentRole::System);
    assert_eq!(factory.components().len(), 3);
    drop(factory);

    let spec = engine.created_class("System").unwrap();
    assert_eq!(spec.param("mem_mode"), Some(&ParamValue::Str("timing".into())));
    assert_eq!(
        spec.param("mem_ranges"),
        Some(&ParamValue::StrList(vec!["256MiB".into()]))
    );
    let clock = engine.created_class("SrcClockDomain").unwrap();
    assert_eq!(clock.param("clock"), Some(&ParamValue::Str("2GHz".into())));
    assert!(engine.connect_attempts.is_empty());
}

#[test]
fn refused_class_names_the_component() {
    let mut engine = StubEngine::modern();
    let _ = engine.refused_classes.insert("SrcClockDomain".to_string());
    let err = ComponentFactory::new(&mut engine)
        .make_system("3GHz", MemorySize::mib(512))
        .unwrap_err();
    match err {
        Error::EngineConstruction { component, source } => {
            assert_eq!(component, "system.clk_domain");
            assert!(source.message().contains("SrcClockDomain"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn out_of_order_processor_is_sized_and_widened() {
    let mut engine = StubEngine::modern();
    let sizes = size_for(4).unwrap();
    {
        let mut factory = ComponentFactory::new(&mut engine);
        let system = factory.make_system("3GHz", MemorySize::mib(512)).unwrap();
        let cpu = factory
            .make_processor(&system, CpuModel::OutOfOrder, Some(&sizes), 4, BranchPredictor::None)
            .unwrap();
        assert_eq!(cpu.class, "DerivO3CPU");
        assert_eq!(cpu.name, "system.cpu");
    }
    let spec = engine.created_class("DerivO3CPU").unwrap();
    for width in ["fetchWidth", "decodeWidth", "renameWidth", "issueWidth", "commitWidth"] {
        assert_eq!(spec.param(width), Some(&ParamValue::Int(4)), "{width}");
    }
    assert_eq!(
        spec.param("numROBEntries"),
        Some(&ParamValue::Int(u64::from(sizes.reorder_buffer_entries)))
    );
    assert!(engine.created.iter().all(|s| !s.class.ends_with("BP")));
}

#[test]
fn predictor_is_attached_as_child() {
    let mut engine = StubEngine::modern();
    {
        let mut factory = ComponentFactory::new(&mut engine);
        let system = factory.make_system("3GHz", MemorySize::mib(512)).unwrap();
        let _ = factory
            .make_processor(
                &system,
                CpuModel::TimingSimple,
                None,
                1,
                BranchPredictor::StaticAlwaysTaken,
            )
            .unwrap();
        assert!(factory.components().iter().any(|h| h.role == ComponentRole::BranchPredictor));
    }
    let bp = engine.created_class("StaticBP").unwrap();
    assert_eq!(bp.param("always_taken"), Some(&ParamValue::Bool(true)));
    assert!(engine.assigned.iter().any(|(_, name, _)| name == "branchPred"));
    assert!(engine.created_class("TimingSimpleCPU").unwrap().param("issueWidth").is_none());
}

#[test]
fn memory_kinds_construct_different_classes() {
    let mut engine = StubEngine::modern();
    {
        let mut factory = ComponentFactory::new(&mut engine);
        let system = factory.make_system("3GHz", MemorySize::mib(512)).unwrap();
        let ddr = factory
            .make_memory_controller(&system, MemorySize::mib(512), MemoryKind::Ddr3)
            .unwrap();
        assert_eq!(ddr.class, "MemCtrl");
    }
    assert!(engine.created_class("DDR3_1600_8x8").is_some());

    let mut engine = StubEngine::modern();
    let mut factory = ComponentFactory::new(&mut engine);
    let system = factory.make_system("3GHz", MemorySize::mib(512)).unwrap();
    let simple = factory
        .make_memory_controller(&system, MemorySize::mib(512), MemoryKind::Simple)
        .unwrap();
    assert_eq!(simple.class, "SimpleMemory");
}

#[test]
fn workload_checks_precede_construction() {
    let mut engine = StubEngine::modern();
    let mut factory = ComponentFactory::new(&mut engine);
    let system = factory.make_system("3GHz", MemorySize::mib(512)).unwrap();
    let before = factory.components().len();

    let err = factory
        .make_workload(&system, Path::new("/nonexistent/o3wire/bench"))
        .unwrap_err();
    assert!(matches!(err, Error::WorkloadNotFound { .. }));

    let workload = Workload::not_executable();
    let err = factory.make_workload(&system, workload.path()).unwrap_err();
    assert!(matches!(err, Error::WorkloadNotExecutable { .. }));
    assert_eq!(factory.components().len(), before);
}

#[test]
fn workload_binds_process_command_line() {
    let workload = Workload::executable(64);
    let mut engine = StubEngine::modern();
    {
        let mut factory = ComponentFactory::new(&mut engine);
        let system = factory.make_system("3GHz", MemorySize::mib(512)).unwrap();
        let process = factory.make_workload(&system, workload.path()).unwrap();
        assert_eq!(process.role, ComponentRole::Workload);
        assert_eq!(process.class, "Process");
    }
    let process = engine.created_class("Process").unwrap();
    let expected = workload.path().to_string_lossy().into_owned();
    assert_eq!(process.param("cmd"), Some(&ParamValue::StrList(vec![expected])));
    assert!(engine.assigned.iter().any(|(_, name, _)| name == "workload"));
}
