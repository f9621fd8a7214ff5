//! In-process reference engine.
//!
//! `ReferenceEngine` implements [`Engine`] against the class and port catalog of one
//! [`PortDialect`]. It models the object surface a real engine exposes to a configuration
//! script:
//! 1. **Construction:** Known classes only; clock domains validate their frequency.
//! 2. **Wiring:** Port names must exist under the dialect, directions must be opposite,
//!    and a single (non-vector) port binds at most one peer.
//! 3. **Lifecycle:** Build, then one `instantiate`, then `simulate` until the last thread
//!    exits. Construction after instantiation is refused.
//!
//! The run phase is a deterministic estimate, not a timing model: instructions are the
//! workload's text bytes divided by four, cycles are instructions over issue width plus
//! a pipeline fill, and ticks are cycles times the clock period.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::catalog::{self, ClassKind, PortDialect};
use super::image::{ImageFormat, WorkloadImage};
use super::stats::SimStats;
use super::{
    EXIT_CAUSE_LAST_THREAD, EXIT_CAUSE_TICK_LIMIT, Engine, ExitEvent, ObjectId, ObjectSpec,
    ParamValue,
};
use crate::common::{EngineError, Frequency, MemorySize};

/// Widest stage width the out-of-order model supports.
pub const MAX_WIDTH: u64 = 12;

/// Per-stage width parameters of the out-of-order model.
const STAGE_WIDTHS: [&str; 5] = [
    "fetchWidth",
    "decodeWidth",
    "renameWidth",
    "issueWidth",
    "commitWidth",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Building,
    Instantiated,
    Finished,
}

#[derive(Debug)]
struct Object {
    class: String,
    kind: ClassKind,
    name: String,
    parent: Option<ObjectId>,
    params: BTreeMap<String, ParamValue>,
    peers: BTreeMap<&'static str, Vec<(ObjectId, &'static str)>>,
    has_threads: bool,
}

impl Object {
    fn int_param(&self, name: &str) -> Option<u64> {
        self.params.get(name).and_then(ParamValue::as_int)
    }
}

/// Estimated length of the run, fixed at the first `simulate` call.
#[derive(Debug, Clone, Copy)]
struct RunPlan {
    total_ticks: u64,
    insts: u64,
    period: u64,
}

/// An engine that keeps the object graph in memory and estimates the run.
#[derive(Debug)]
pub struct ReferenceEngine {
    dialect: PortDialect,
    objects: Vec<Object>,
    phase: Phase,
    tick: u64,
    plan: Option<RunPlan>,
    stats: SimStats,
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new(PortDialect::default())
    }
}

impl ReferenceEngine {
    /// Creates an empty engine that understands `dialect` port names.
    pub fn new(dialect: PortDialect) -> Self {
        Self {
            dialect,
            objects: Vec::new(),
            phase: Phase::Building,
            tick: 0,
            plan: None,
            stats: SimStats::default(),
        }
    }

    /// Port-naming dialect of this engine.
    pub const fn dialect(&self) -> PortDialect {
        self.dialect
    }

    /// Number of constructed objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Finds an object by hierarchical name.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(|i| ObjectId(i as u32))
    }

    /// Class name of `id`.
    pub fn class_of(&self, id: ObjectId) -> Option<&str> {
        self.get(id).ok().map(|o| o.class.as_str())
    }

    /// Current value of a parameter.
    pub fn param(&self, id: ObjectId, name: &str) -> Option<&ParamValue> {
        self.get(id).ok().and_then(|o| o.params.get(name))
    }

    /// Objects bound to `port` of `id`, as `(peer, peer_port)`.
    pub fn peers(&self, id: ObjectId, port: &str) -> Vec<(ObjectId, &'static str)> {
        self.get(id)
            .ok()
            .and_then(|o| o.peers.get(port))
            .cloned()
            .unwrap_or_default()
    }

    /// Parent of `id`, if it was created as a child.
    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.get(id).ok().and_then(|o| o.parent)
    }

    /// True once `instantiate` has succeeded.
    pub fn is_instantiated(&self) -> bool {
        self.phase != Phase::Building
    }

    fn get(&self, id: ObjectId) -> Result<&Object, EngineError> {
        self.objects
            .get(id.0 as usize)
            .ok_or_else(|| EngineError::new(format!("no such object #{}", id.0)))
    }

    fn get_mut(&mut self, id: ObjectId) -> Result<&mut Object, EngineError> {
        self.objects
            .get_mut(id.0 as usize)
            .ok_or_else(|| EngineError::new(format!("no such object #{}", id.0)))
    }

    fn ensure_building(&self, what: &str) -> Result<(), EngineError> {
        if self.phase == Phase::Building {
            Ok(())
        } else {
            Err(EngineError::new(format!(
                "cannot {what} after the simulation has been instantiated"
            )))
        }
    }

    fn check_construction(spec: &ObjectSpec, kind: ClassKind) -> Result<(), EngineError> {
        match kind {
            ClassKind::ClockDomain => {
                let clock = spec
                    .param("clock")
                    .and_then(ParamValue::as_str)
                    .ok_or_else(|| EngineError::new(format!("`{}` requires a clock", spec.name)))?;
                let _ = clock.parse::<Frequency>().map_err(|e| {
                    EngineError::new(format!("`{}`: invalid clock: {e}", spec.name))
                })?;
            }
            ClassKind::System => {
                if let Some(ParamValue::StrList(ranges)) = spec.param("mem_ranges") {
                    for range in ranges {
                        let _ = range.parse::<MemorySize>().map_err(|e| {
                            EngineError::new(format!("`{}`: invalid memory range: {e}", spec.name))
                        })?;
                    }
                }
            }
            ClassKind::MemoryController => {
                if let Some(range) = spec.param("range").and_then(ParamValue::as_str) {
                    let _ = range.parse::<MemorySize>().map_err(|e| {
                        EngineError::new(format!("`{}`: invalid range: {e}", spec.name))
                    })?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn port_of(
        &self,
        id: ObjectId,
        port: &str,
    ) -> Result<(&'static str, catalog::PortInfo), EngineError> {
        let obj = self.get(id)?;
        let info = catalog::find_port(obj.kind, self.dialect, port).ok_or_else(|| {
            EngineError::new(format!(
                "object `{}` of class {} has no port named `{port}`",
                obj.name, obj.class
            ))
        })?;
        if !info.vector && obj.peers.get(info.name).is_some_and(|p| !p.is_empty()) {
            return Err(EngineError::new(format!(
                "port `{}.{port}` is already connected",
                obj.name
            )));
        }
        Ok((info.name, info))
    }

    fn validate_graph(&self, root: ObjectId) -> Result<(), EngineError> {
        let root_obj = self.get(root)?;
        if root_obj.kind != ClassKind::Root {
            return Err(EngineError::new(format!(
                "`{}` is a {}, not a Root",
                root_obj.name, root_obj.class
            )));
        }

        let mut problems = Vec::new();
        for obj in &self.objects {
            for info in catalog::ports(obj.kind, self.dialect) {
                let bound = obj.peers.get(info.name).is_some_and(|p| !p.is_empty());
                if bound {
                    continue;
                }
                if info.required {
                    problems.push(format!("port `{}.{}` is not connected", obj.name, info.name));
                } else if obj.kind == ClassKind::InterruptController {
                    warn!(
                        port = %format!("{}.{}", obj.name, info.name),
                        "interrupt port left unconnected"
                    );
                }
            }

            match obj.kind {
                ClassKind::System if !obj.params.contains_key("workload") => {
                    problems.push(format!("`{}` has no workload", obj.name));
                }
                kind if kind.is_cpu() && !obj.has_threads => {
                    problems.push(format!("`{}` has no thread contexts", obj.name));
                }
                ClassKind::OutOfOrderCpu => {
                    for width in STAGE_WIDTHS {
                        let value = obj.int_param(width).unwrap_or(1);
                        if value == 0 || value > MAX_WIDTH {
                            problems.push(format!(
                                "`{}.{width}` = {value} is outside 1..={MAX_WIDTH}",
                                obj.name
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::new(problems.join("; ")))
        }
    }

    fn first_cpu(&self) -> Result<&Object, EngineError> {
        self.objects
            .iter()
            .find(|o| o.kind.is_cpu())
            .ok_or_else(|| EngineError::new("no processor in the instantiated graph"))
    }

    fn workload_path(&self, cpu: &Object) -> Result<PathBuf, EngineError> {
        let process = cpu
            .params
            .get("workload")
            .and_then(ParamValue::as_object)
            .ok_or_else(|| EngineError::new(format!("`{}` has no workload", cpu.name)))?;
        match self.get(process)?.params.get("cmd") {
            Some(ParamValue::StrList(cmd)) if !cmd.is_empty() => Ok(PathBuf::from(&cmd[0])),
            _ => Err(EngineError::new("process has an empty command line")),
        }
    }

    fn clock_period(&self) -> Result<u64, EngineError> {
        let domain = self
            .objects
            .iter()
            .find(|o| o.kind == ClassKind::ClockDomain)
            .ok_or_else(|| EngineError::new("no clock domain"))?;
        let clock = domain
            .params
            .get("clock")
            .and_then(ParamValue::as_str)
            .ok_or_else(|| EngineError::new(format!("`{}` has no clock", domain.name)))?;
        clock
            .parse::<Frequency>()
            .map(Frequency::period_ticks)
            .map_err(|e| EngineError::new(e.to_string()))
    }

    fn plan_run(&mut self) -> Result<RunPlan, EngineError> {
        if let Some(plan) = self.plan {
            return Ok(plan);
        }
        let period = self.clock_period()?;
        let cpu = self.first_cpu()?;
        let path = self.workload_path(cpu)?;
        let image = WorkloadImage::inspect(&path).map_err(|e| {
            EngineError::new(format!("cannot load workload `{}`: {e}", path.display()))
        })?;
        if image.format == ImageFormat::Raw {
            warn!(
                path = %path.display(),
                "workload is not an object file; using a generic SE workload"
            );
        }

        let (width, fill) = match (cpu.kind, cpu.class.as_str()) {
            (ClassKind::OutOfOrderCpu, _) => (cpu.int_param("issueWidth").unwrap_or(1), 8),
            (_, "MinorCPU") => (1, 4),
            _ => (1, 1),
        };
        let cpu_name = cpu.name.clone();
        let backend = cpu
            .params
            .iter()
            .filter(|(name, _)| name.ends_with("Entries") || name.starts_with("numPhys"))
            .filter_map(|(name, value)| value.as_int().map(|v| (name.clone(), v)))
            .collect();

        let insts = (image.text_bytes / 4).max(1);
        let cycles = insts.div_ceil(width.max(1)) + fill;
        let plan = RunPlan {
            total_ticks: cycles.saturating_mul(period),
            insts,
            period,
        };

        self.stats.cpu_name = cpu_name;
        self.stats.issue_width = width;
        self.stats.clock_period = period;
        self.stats.backend = backend;

        debug!(
            insts,
            cycles,
            period,
            format = ?image.format,
            arch = image.architecture.as_deref().unwrap_or("unknown"),
            "planned run"
        );
        self.plan = Some(plan);
        Ok(plan)
    }
}

impl Engine for ReferenceEngine {
    fn version(&self) -> String {
        format!(
            "o3wire reference engine {} ({} ports)",
            env!("CARGO_PKG_VERSION"),
            self.dialect
        )
    }

    fn create(&mut self, spec: ObjectSpec) -> Result<ObjectId, EngineError> {
        self.ensure_building(&format!("construct `{}`", spec.name))?;
        let kind = catalog::class_kind(&spec.class)
            .ok_or_else(|| EngineError::new(format!("unknown SimObject class `{}`", spec.class)))?;
        if let Some(parent) = spec.parent {
            let _ = self.get(parent)?;
        }
        if self.lookup(&spec.name).is_some() {
            return Err(EngineError::new(format!(
                "an object named `{}` already exists",
                spec.name
            )));
        }
        Self::check_construction(&spec, kind)?;

        let id = ObjectId(self.objects.len() as u32);
        debug!(class = %spec.class, name = %spec.name, id = id.0, "created object");
        self.objects.push(Object {
            class: spec.class,
            kind,
            name: spec.name,
            parent: spec.parent,
            params: spec.params.into_iter().collect(),
            peers: BTreeMap::new(),
            has_threads: false,
        });
        Ok(id)
    }

    fn set_param(
        &mut self,
        object: ObjectId,
        name: &str,
        value: ParamValue,
    ) -> Result<(), EngineError> {
        self.ensure_building(&format!("set `{name}`"))?;
        if let ParamValue::Object(target) = value {
            let _ = self.get(target)?;
        }
        let _ = self.get_mut(object)?.params.insert(name.to_string(), value);
        Ok(())
    }

    fn connect(
        &mut self,
        source: ObjectId,
        source_port: &str,
        destination: ObjectId,
        destination_port: &str,
    ) -> Result<(), EngineError> {
        self.ensure_building("connect ports")?;
        let (src_name, src_info) = self.port_of(source, source_port)?;
        let (dst_name, dst_info) = self.port_of(destination, destination_port)?;
        if src_info.direction == dst_info.direction {
            return Err(EngineError::new(format!(
                "cannot bind `{source_port}` to `{destination_port}`: both are {:?} ports",
                src_info.direction
            )));
        }
        self.get_mut(source)?
            .peers
            .entry(src_name)
            .or_default()
            .push((destination, dst_name));
        self.get_mut(destination)?
            .peers
            .entry(dst_name)
            .or_default()
            .push((source, src_name));
        Ok(())
    }

    fn create_interrupt_controller(
        &mut self,
        processor: ObjectId,
    ) -> Result<ObjectId, EngineError> {
        let cpu = self.get(processor)?;
        if !cpu.kind.is_cpu() {
            return Err(EngineError::new(format!("`{}` is not a processor", cpu.name)));
        }
        let name = format!("{}.interrupts", cpu.name);
        self.create(ObjectSpec::new("X86LocalApic", name).child_of(processor))
    }

    fn create_threads(&mut self, processor: ObjectId) -> Result<(), EngineError> {
        self.ensure_building("create threads")?;
        let cpu = self.get(processor)?;
        if !cpu.kind.is_cpu() {
            return Err(EngineError::new(format!("`{}` is not a processor", cpu.name)));
        }
        if !cpu.params.contains_key("workload") {
            return Err(EngineError::new(format!(
                "`{}` has no workload; assign one before creating threads",
                cpu.name
            )));
        }
        self.get_mut(processor)?.has_threads = true;
        Ok(())
    }

    fn instantiate(&mut self, root: ObjectId) -> Result<(), EngineError> {
        if self.phase != Phase::Building {
            return Err(EngineError::new("instantiate() may only be called once"));
        }
        self.validate_graph(root)?;
        self.phase = Phase::Instantiated;
        info!(objects = self.objects.len(), dialect = %self.dialect, "instantiated");
        Ok(())
    }

    fn simulate(&mut self, max_ticks: Option<u64>) -> Result<ExitEvent, EngineError> {
        match self.phase {
            Phase::Building => {
                return Err(EngineError::new("simulate() called before instantiate()"));
            }
            Phase::Finished => return Err(EngineError::new("simulation has already exited")),
            Phase::Instantiated => {}
        }
        if self.tick == 0 {
            self.stats.start();
        }
        let plan = self.plan_run()?;
        let target = match max_ticks {
            Some(limit) => self.tick.saturating_add(limit).min(plan.total_ticks),
            None => plan.total_ticks,
        };
        self.tick = target;
        self.stats.sim_ticks = target;
        self.stats.num_cycles = target / plan.period;
        self.stats.sim_insts = if plan.total_ticks == 0 {
            plan.insts
        } else {
            ((u128::from(plan.insts) * u128::from(target)) / u128::from(plan.total_ticks)) as u64
        };

        if target >= plan.total_ticks {
            self.phase = Phase::Finished;
            self.stats.finish();
            Ok(ExitEvent {
                cause: EXIT_CAUSE_LAST_THREAD.to_string(),
                code: 0,
            })
        } else {
            Ok(ExitEvent {
                cause: EXIT_CAUSE_TICK_LIMIT.to_string(),
                code: 0,
            })
        }
    }

    fn cur_tick(&self) -> u64 {
        self.tick
    }

    fn dump_stats(&mut self) -> Result<String, EngineError> {
        if self.phase == Phase::Building {
            return Err(EngineError::new("no statistics before instantiate()"));
        }
        Ok(self.stats.render())
    }
}
