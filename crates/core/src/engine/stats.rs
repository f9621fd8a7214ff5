//! Run statistics of the reference engine.
//!
//! This module tracks what a finished run reports. It provides:
//! 1. **Time:** Simulated ticks and seconds, host seconds.
//! 2. **Core:** Committed instructions, cycles, IPC/CPI, configured width.
//! 3. **Backend:** The sized structures the processor was built with.
//!
//! Output uses the engine's `stats.txt` layout: one `name value # description` line
//! per statistic between begin/end banners.

use std::fmt::Write as _;
use std::time::Instant;

use crate::common::TICKS_PER_SECOND;

/// Section names accepted by [`SimStats::render_sections`].
pub const STATS_SECTIONS: &[&str] = &["summary", "core", "backend"];

/// Statistics for one run.
#[derive(Debug, Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Ticks simulated.
    pub sim_ticks: u64,
    /// Instructions committed.
    pub sim_insts: u64,
    /// Processor cycles.
    pub num_cycles: u64,
    /// Processor clock period in ticks.
    pub clock_period: u64,
    /// Configured issue width.
    pub issue_width: u64,
    /// Hierarchical name of the processor.
    pub cpu_name: String,
    /// Sized backend structures as `(parameter, entries)`.
    pub backend: Vec<(String, u64)>,
    host_seconds: Option<f64>,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            sim_ticks: 0,
            sim_insts: 0,
            num_cycles: 0,
            clock_period: 0,
            issue_width: 1,
            cpu_name: String::from("system.cpu"),
            backend: Vec::new(),
            host_seconds: None,
        }
    }
}

fn line(out: &mut String, name: &str, value: impl std::fmt::Display, desc: &str) {
    let _ = writeln!(out, "{name:<44} {value:<28} # {desc}");
}

impl SimStats {
    /// Restarts the host timer.
    pub fn start(&mut self) {
        self.start_time = Instant::now();
        self.host_seconds = None;
    }

    /// Stops the host timer.
    pub fn finish(&mut self) {
        self.host_seconds = Some(self.start_time.elapsed().as_secs_f64());
    }

    /// Simulated seconds.
    pub fn sim_seconds(&self) -> f64 {
        self.sim_ticks as f64 / TICKS_PER_SECOND as f64
    }

    /// Renders only the requested sections; an empty slice renders all of them.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let host = self
            .host_seconds
            .unwrap_or_else(|| self.start_time.elapsed().as_secs_f64());
        let cyc = self.num_cycles.max(1);
        let insts = self.sim_insts.max(1);

        let mut out = String::new();
        out.push_str("\n---------- Begin Simulation Statistics ----------\n");
        if want("summary") {
            line(
                &mut out,
                "simSeconds",
                format!("{:.6}", self.sim_seconds()),
                "Number of seconds simulated (Second)",
            );
            line(&mut out, "simTicks", self.sim_ticks, "Number of ticks simulated (Tick)");
            line(
                &mut out,
                "finalTick",
                self.sim_ticks,
                "Number of ticks from beginning of simulation (Tick)",
            );
            line(
                &mut out,
                "simFreq",
                TICKS_PER_SECOND,
                "The number of ticks per simulated second ((Tick/Second))",
            );
            line(
                &mut out,
                "hostSeconds",
                format!("{host:.2}"),
                "Real time elapsed on the host (Second)",
            );
            line(&mut out, "simInsts", self.sim_insts, "Number of instructions simulated (Count)");
        }
        if want("core") {
            let cpu = &self.cpu_name;
            line(
                &mut out,
                &format!("{cpu}.numCycles"),
                self.num_cycles,
                "Number of cpu cycles simulated (Cycle)",
            );
            line(&mut out, &format!("{cpu}.clockPeriod"), self.clock_period, "Clock period (Tick)");
            line(
                &mut out,
                &format!("{cpu}.issueWidth"),
                self.issue_width,
                "Configured issue width (Count)",
            );
            line(
                &mut out,
                &format!("{cpu}.ipc"),
                format!("{:.6}", self.sim_insts as f64 / cyc as f64),
                "IPC: instructions per cycle ((Count/Cycle))",
            );
            line(
                &mut out,
                &format!("{cpu}.cpi"),
                format!("{:.6}", cyc as f64 / insts as f64),
                "CPI: cycles per instruction ((Cycle/Count))",
            );
        }
        if want("backend") {
            for (name, entries) in &self.backend {
                line(
                    &mut out,
                    &format!("{}.{name}", self.cpu_name),
                    entries,
                    "Configured entries (Count)",
                );
            }
        }
        out.push_str("\n---------- End Simulation Statistics   ----------\n");
        out
    }

    /// Renders every section.
    pub fn render(&self) -> String {
        self.render_sections(&[])
    }
}
