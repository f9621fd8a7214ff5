//! Simulation driver.
//!
//! Takes a built [`Topology`] through the engine lifecycle: instantiate, simulate until
//! an exit event, then dump and flush statistics to the configured sink before
//! returning, on both the success and the run-failure path. Nothing is retried; engine
//! failures surface with the engine's message.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::{Error, Result};
use crate::engine::{EXIT_CAUSE_LAST_THREAD, EXIT_CAUSE_TICK_LIMIT, Engine, ExitEvent};
use crate::soc::Topology;

/// Exit cause some engine releases report for an explicit `exit()` in the workload.
const EXIT_CAUSE_TARGET_EXIT: &str = "target called exit()";

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationCause {
    /// The workload's last thread exited with status zero.
    ExitedNormally,
    /// The workload exited with a non-zero status.
    ExitedWithStatus(i64),
    /// The configured tick limit was reached first.
    TickLimitReached,
    /// Any other engine exit event, with the engine's text verbatim.
    Other(String),
}

impl TerminationCause {
    /// Classifies an engine exit event.
    pub fn from_event(event: &ExitEvent) -> Self {
        match event.cause.as_str() {
            EXIT_CAUSE_LAST_THREAD | EXIT_CAUSE_TARGET_EXIT if event.code == 0 => {
                Self::ExitedNormally
            }
            EXIT_CAUSE_LAST_THREAD | EXIT_CAUSE_TARGET_EXIT => Self::ExitedWithStatus(event.code),
            EXIT_CAUSE_TICK_LIMIT => Self::TickLimitReached,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitedNormally => f.write_str("exited normally"),
            Self::ExitedWithStatus(code) => write!(f, "exited with status {code}"),
            Self::TickLimitReached => f.write_str("tick limit reached"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Tick at which the run ended.
    pub end_tick: u64,
    /// Classified reason the run ended.
    pub termination_cause: TerminationCause,
    /// Exit cause exactly as the engine reported it.
    pub engine_cause: String,
    /// Status code attached to the exit event.
    pub exit_code: i64,
}

impl RunResult {
    /// The one-line run report, `Exiting @ tick <n> because <cause>`.
    pub fn report_line(&self) -> String {
        format!("Exiting @ tick {} because {}", self.end_tick, self.engine_cause)
    }
}

/// Runs a topology on a borrowed engine and writes statistics to `W`.
#[derive(Debug)]
pub struct SimulationDriver<'e, E: Engine + ?Sized, W: Write> {
    engine: &'e mut E,
    sink: W,
    max_ticks: Option<u64>,
}

impl<'e, E: Engine + ?Sized, W: Write> SimulationDriver<'e, E, W> {
    /// Creates a driver that runs to completion.
    pub fn new(engine: &'e mut E, sink: W) -> Self {
        Self {
            engine,
            sink,
            max_ticks: None,
        }
    }

    /// Stops the run after `max_ticks` ticks when set.
    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Instantiates, runs and reports `topology`.
    ///
    /// # Arguments
    ///
    /// * `topology` - A topology built on the same engine.
    ///
    /// # Returns
    ///
    /// The end tick and termination cause. Fails with [`Error::EngineInstantiation`] or
    /// [`Error::EngineRuntime`] carrying the engine's message, or [`Error::Io`] when the
    /// statistics cannot be written. When the run itself fails, whatever statistics the
    /// engine still reports are written to the sink before the error is returned.
    pub fn run(&mut self, topology: &Topology) -> Result<RunResult> {
        self.engine
            .instantiate(topology.root.id)
            .map_err(Error::EngineInstantiation)?;
        info!(max_ticks = ?self.max_ticks, "starting simulation");

        let event = match self.engine.simulate(self.max_ticks) {
            Ok(event) => event,
            Err(err) => {
                self.salvage_stats();
                return Err(Error::EngineRuntime(err));
            }
        };
        let end_tick = self.engine.cur_tick();

        let stats = self.engine.dump_stats().map_err(Error::EngineRuntime)?;
        self.sink.write_all(stats.as_bytes())?;
        self.sink.flush()?;

        let result = RunResult {
            end_tick,
            termination_cause: TerminationCause::from_event(&event),
            engine_cause: event.cause,
            exit_code: event.code,
        };
        info!(
            tick = result.end_tick,
            cause = %result.termination_cause,
            "simulation finished"
        );
        Ok(result)
    }

    /// Consumes the driver and returns the statistics sink.
    /// Writes whatever statistics the engine still reports after a failed run.
    /// Failures here are logged; the run error takes precedence.
    fn salvage_stats(&mut self) {
        let written = self
            .engine
            .dump_stats()
            .map_err(|e| e.to_string())
            .and_then(|stats| {
                self.sink
                    .write_all(stats.as_bytes())
                    .and_then(|()| self.sink.flush())
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = written {
            warn!(%error, "no statistics written for the failed run");
        }
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}
