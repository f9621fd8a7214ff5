//! Superscalar topology builder CLI.
//!
//! This binary builds one topology and runs it to completion. It performs:
//! 1. **Configuration:** Built-in defaults, then an optional JSON file (`--config`),
//!    then command-line flags, each layer overriding the previous one.
//! 2. **Build:** Constructs and wires the topology on the reference engine.
//! 3. **Run:** Instantiates, simulates, prints `Exiting @ tick <n> because <cause>` and
//!    writes the statistics file.
//!
//! Every failure category exits with its own status so sweep scripts can tell a bad
//! configuration (2-6) from a failed run (7-8) or an output error (9).

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use o3wire_core::common::MemorySize;
use o3wire_core::config::{BranchPredictor, CpuModel, FALLBACK_BINARY, MemoryKind};
use o3wire_core::engine::PortDialect;
use o3wire_core::{
    Config, Error, ReferenceEngine, Result, RunResult, SimulationDriver, TopologyBuilder,
};

#[derive(Parser, Debug)]
#[command(
    name = "o3wire",
    author,
    version,
    about = "Build and run a superscalar syscall-emulation topology",
    long_about = "Build a processor/memory/interconnect topology from a few parameters, wire it \
                  with whatever port names the engine understands, and run a workload binary.\n\n\
                  Examples:\n  o3wire --bench ./qsort --width 4 --branch-predictor tournament\n  \
                  o3wire --config sweep.json --width 8 --stats-file w8.txt"
)]
struct Cli {
    /// Workload binary to run [default: /bin/ls].
    #[arg(long, value_name = "PATH")]
    bench: Option<PathBuf>,

    /// Issue width of every pipeline stage [default: 1].
    #[arg(long, value_name = "N")]
    width: Option<u32>,

    /// Main memory size, e.g. 512MB or 2GiB [default: 512MB].
    #[arg(long, value_name = "SIZE")]
    memsize: Option<String>,

    /// Branch predictor: none, static-always-taken, local, tournament, bimodal [default: none].
    #[arg(long, value_name = "NAME")]
    branch_predictor: Option<String>,

    /// System clock, e.g. 3GHz [default: 3GHz].
    #[arg(long, value_name = "FREQ")]
    clock: Option<String>,

    /// Processor model: out-of-order, in-order, timing-simple [default: out-of-order].
    #[arg(long, value_name = "MODEL")]
    cpu_model: Option<String>,

    /// Memory kind: ddr3, simple [default: ddr3].
    #[arg(long, value_name = "KIND")]
    memory_kind: Option<String>,

    /// Port naming of the engine: modern, transitional, legacy [default: modern].
    #[arg(long, value_name = "DIALECT")]
    engine_dialect: Option<String>,

    /// JSON configuration file; flags override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Statistics output file [default: stats.txt].
    #[arg(long, value_name = "PATH")]
    stats_file: Option<PathBuf>,

    /// Also write the built topology as JSON.
    #[arg(long, value_name = "PATH")]
    dump_topology: Option<PathBuf>,

    /// Stop the run after this many ticks.
    #[arg(long, value_name = "TICKS")]
    max_ticks: Option<u64>,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(result) => println!("{}", result.report_line()),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(err.exit_code());
        }
    }
}

/// Installs the stderr log subscriber.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Layers the configuration file and flags over the defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let params = &mut config.parameters;

    if let Some(bench) = &cli.bench {
        params.binary_path.clone_from(bench);
    }
    if let Some(width) = cli.width {
        params.issue_width = width;
    }
    if let Some(size) = &cli.memsize {
        params.memory_size = size
            .parse::<MemorySize>()
            .map_err(|e| Error::invalid("memsize", e.to_string()))?;
    }
    if let Some(name) = &cli.branch_predictor {
        params.branch_predictor = name.parse::<BranchPredictor>()?;
    }
    if let Some(clock) = &cli.clock {
        params.clock_rate.clone_from(clock);
    }
    if let Some(model) = &cli.cpu_model {
        params.cpu_model = model.parse::<CpuModel>()?;
    }
    if let Some(kind) = &cli.memory_kind {
        params.memory_kind = kind.parse::<MemoryKind>()?;
    }
    if let Some(dialect) = &cli.engine_dialect {
        config.engine.dialect = dialect.parse::<PortDialect>()?;
    }
    if let Some(path) = &cli.stats_file {
        config.output.stats_file.clone_from(path);
    }
    if cli.dump_topology.is_some() {
        config.output.dump_topology.clone_from(&cli.dump_topology);
    }
    if cli.max_ticks.is_some() {
        config.output.max_ticks = cli.max_ticks;
    }

    if cli.bench.is_none() && config.parameters.binary_path.as_os_str() == FALLBACK_BINARY {
        warn!(binary = FALLBACK_BINARY, "no workload given; running the fallback binary");
    }
    Ok(config)
}

/// Builds and runs one topology.
fn run(cli: &Cli) -> Result<RunResult> {
    let config = load_config(cli)?;
    let mut engine = ReferenceEngine::new(config.engine.dialect);

    let topology = TopologyBuilder::from_config(&mut engine, &config).build(&config.parameters)?;
    if let Some(path) = &config.output.dump_topology {
        topology.write_json(path)?;
    }

    if let Some(dir) = config.output.stats_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let sink = BufWriter::new(File::create(&config.output.stats_file)?);
    SimulationDriver::new(&mut engine, sink)
        .with_max_ticks(config.output.max_ticks)
        .run(&topology)
}
