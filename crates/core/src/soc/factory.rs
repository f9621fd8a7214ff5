//! Component construction.
//!
//! One constructor per component kind. Constructors only allocate engine objects and set
//! their parameters; wiring ports is the negotiator's job. Every handle produced is also
//! recorded so the builder can hand the full component list to the topology.

use std::path::Path;

use tracing::debug;

use crate::common::{EngineError, Error, MemorySize, Result};
use crate::config::{BranchPredictor, CpuModel, MemoryKind};
use crate::engine::{Engine, ObjectSpec, ParamValue};
use crate::sim::workload::check_workload;
use crate::sizing::ResourceSizes;
use crate::soc::handle::{ComponentHandle, ComponentRole};

/// Class the engine uses for per-processor interrupt controllers.
pub const INTERRUPT_CONTROLLER_CLASS: &str = "X86LocalApic";

/// Stage widths of the out-of-order model, all set to the issue width.
const STAGE_WIDTHS: [&str; 5] = [
    "fetchWidth",
    "decodeWidth",
    "renameWidth",
    "issueWidth",
    "commitWidth",
];

/// Constructs components on a borrowed engine.
#[derive(Debug)]
pub struct ComponentFactory<'e, E: Engine + ?Sized> {
    engine: &'e mut E,
    created: Vec<ComponentHandle>,
}

impl<'e, E: Engine + ?Sized> ComponentFactory<'e, E> {
    /// Creates a factory over `engine`.
    pub fn new(engine: &'e mut E) -> Self {
        Self {
            engine,
            created: Vec::new(),
        }
    }

    /// The underlying engine, for wiring between constructions.
    pub fn engine_mut(&mut self) -> &mut E {
        self.engine
    }

    /// Every handle constructed so far, in construction order.
    pub fn components(&self) -> &[ComponentHandle] {
        &self.created
    }

    /// Consumes the factory and returns the constructed handles.
    pub fn into_components(self) -> Vec<ComponentHandle> {
        self.created
    }

    fn construct(&mut self, role: ComponentRole, spec: ObjectSpec) -> Result<ComponentHandle> {
        let name = spec.name.clone();
        let class = spec.class.clone();
        let id = self
            .engine
            .create(spec)
            .map_err(|source| construction_error(&name, source))?;
        debug!(%name, %class, %role, "constructed component");
        let handle = ComponentHandle::new(id, role, name, class);
        self.created.push(handle.clone());
        Ok(handle)
    }

    fn set(&mut self, target: &ComponentHandle, param: &str, value: ParamValue) -> Result<()> {
        self.engine
            .set_param(target.id, param, value)
            .map_err(|source| construction_error(&target.name, source))
    }

    /// Constructs the system with its voltage and clock domains, timing memory mode and
    /// one memory range covering `memory_size`.
    ///
    /// # Arguments
    ///
    /// * `clock_rate` - Frequency string; the engine decides whether it is valid.
    /// * `memory_size` - Size of the single physical memory range.
    ///
    /// # Returns
    ///
    /// The system handle, or [`Error::EngineConstruction`] when the engine rejects the
    /// system or its clock.
    pub fn make_system(
        &mut self,
        clock_rate: &str,
        memory_size: MemorySize,
    ) -> Result<ComponentHandle> {
        let system = self.construct(
            ComponentRole::System,
            ObjectSpec::new("System", "system")
                .with("mem_mode", ParamValue::Str("timing".to_string()))
                .with("mem_ranges", ParamValue::StrList(vec![memory_size.to_string()])),
        )?;
        let voltage = self.construct(
            ComponentRole::ClockDomain,
            ObjectSpec::new("VoltageDomain", "system.voltage_domain").child_of(system.id),
        )?;
        let clock = self.construct(
            ComponentRole::ClockDomain,
            ObjectSpec::new("SrcClockDomain", "system.clk_domain")
                .child_of(system.id)
                .with("clock", ParamValue::Str(clock_rate.to_string()))
                .with("voltage_domain", ParamValue::Object(voltage.id)),
        )?;
        self.set(&system, "clk_domain", ParamValue::Object(clock.id))?;
        Ok(system)
    }

    /// Constructs the system crossbar.
    pub fn make_interconnect(&mut self, system: &ComponentHandle) -> Result<ComponentHandle> {
        self.construct(
            ComponentRole::Interconnect,
            ObjectSpec::new("SystemXBar", format!("{}.membus", system.name)).child_of(system.id),
        )
    }

    /// Constructs main memory covering `memory_size`.
    pub fn make_memory_controller(
        &mut self,
        system: &ComponentHandle,
        memory_size: MemorySize,
        kind: MemoryKind,
    ) -> Result<ComponentHandle> {
        let name = format!("{}.mem_ctrl", system.name);
        let range = ParamValue::Str(memory_size.to_string());
        match kind {
            MemoryKind::Ddr3 => {
                let ctrl = self.construct(
                    ComponentRole::MemoryController,
                    ObjectSpec::new("MemCtrl", name.clone()).child_of(system.id),
                )?;
                let dram = self.construct(
                    ComponentRole::MemoryController,
                    ObjectSpec::new("DDR3_1600_8x8", format!("{name}.dram"))
                        .child_of(ctrl.id)
                        .with("range", range),
                )?;
                self.set(&ctrl, "dram", ParamValue::Object(dram.id))?;
                Ok(ctrl)
            }
            MemoryKind::Simple => self.construct(
                ComponentRole::MemoryController,
                ObjectSpec::new("SimpleMemory", name)
                    .child_of(system.id)
                    .with("range", range),
            ),
        }
    }

    /// Constructs the processor and, unless `predictor` is `none`, its branch predictor.
    ///
    /// For the out-of-order model every stage width is set to `issue_width` and the
    /// sized backend structures in `sizes` are applied.
    pub fn make_processor(
        &mut self,
        system: &ComponentHandle,
        model: CpuModel,
        sizes: Option<&ResourceSizes>,
        issue_width: u32,
        predictor: BranchPredictor,
    ) -> Result<ComponentHandle> {
        let name = format!("{}.cpu", system.name);
        let mut spec = ObjectSpec::new(model.engine_class(), name.clone()).child_of(system.id);
        if model == CpuModel::OutOfOrder {
            for width in STAGE_WIDTHS {
                spec = spec.with(width, ParamValue::Int(u64::from(issue_width)));
            }
            if let Some(sizes) = sizes {
                for (param, entries) in sizes.fields() {
                    spec = spec.with(param, ParamValue::Int(u64::from(entries)));
                }
            }
        }
        let cpu = self.construct(ComponentRole::Processor, spec)?;

        if let Some(class) = predictor.engine_class() {
            let mut bp = ObjectSpec::new(class, format!("{name}.branchPred")).child_of(cpu.id);
            for (param, value) in predictor.engine_params() {
                bp = bp.with(param, value);
            }
            let bp = self.construct(ComponentRole::BranchPredictor, bp)?;
            self.set(&cpu, "branchPred", ParamValue::Object(bp.id))?;
        }
        Ok(cpu)
    }

    /// Asks the engine for the interrupt controller of `processor`.
    pub fn make_interrupt_controller(
        &mut self,
        processor: &ComponentHandle,
    ) -> Result<ComponentHandle> {
        let name = format!("{}.interrupts", processor.name);
        let id = self
            .engine
            .create_interrupt_controller(processor.id)
            .map_err(|source| construction_error(&name, source))?;
        let handle = ComponentHandle::new(
            id,
            ComponentRole::InterruptController,
            name,
            INTERRUPT_CONTROLLER_CLASS,
        );
        self.created.push(handle.clone());
        Ok(handle)
    }

    /// Constructs the syscall-emulation workload for `binary` and the process that
    /// runs it, and binds the workload to the system.
    ///
    /// # Returns
    ///
    /// The process handle. Fails with [`Error::WorkloadNotFound`] or
    /// [`Error::WorkloadNotExecutable`] before any engine object is constructed.
    pub fn make_workload(
        &mut self,
        system: &ComponentHandle,
        binary: &Path,
    ) -> Result<ComponentHandle> {
        check_workload(binary)?;
        let binary = binary.to_string_lossy().into_owned();
        let se = self.construct(
            ComponentRole::Workload,
            ObjectSpec::new("SEWorkload", format!("{}.workload", system.name))
                .child_of(system.id)
                .with("binary", ParamValue::Str(binary.clone())),
        )?;
        self.set(system, "workload", ParamValue::Object(se.id))?;
        self.construct(
            ComponentRole::Workload,
            ObjectSpec::new("Process", format!("{}.process", system.name))
                .child_of(system.id)
                .with("cmd", ParamValue::StrList(vec![binary])),
        )
    }

    /// Constructs the simulation root over `system`.
    pub fn make_root(&mut self, system: &ComponentHandle) -> Result<ComponentHandle> {
        self.construct(
            ComponentRole::Root,
            ObjectSpec::new("Root", "root")
                .with("full_system", ParamValue::Bool(false))
                .with("system", ParamValue::Object(system.id)),
        )
    }

    /// Sets a parameter on an already constructed component.
    pub fn assign(
        &mut self,
        target: &ComponentHandle,
        param: &str,
        value: ParamValue,
    ) -> Result<()> {
        self.set(target, param, value)
    }

    /// Creates the thread contexts of `processor`.
    pub fn create_threads(&mut self, processor: &ComponentHandle) -> Result<()> {
        self.engine
            .create_threads(processor.id)
            .map_err(|source| construction_error(&processor.name, source))
    }
}

fn construction_error(component: &str, source: EngineError) -> Error {
    Error::EngineConstruction {
        component: component.to_string(),
        source,
    }
}
