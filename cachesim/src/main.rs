use std::fs::File;
use std::time::Instant;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use cachelib::cache::CacheTrait;
use cachelib::config::CacheConfig;
use cachelib::io::get_reader;
use cachelib::report::Report;
use cachelib::simulator::Simulator;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache simulator, replays a trace of loads and stores"))]
struct Args {
    /// KEY=VALUE configuration file, or JSON with a .json extension
    config: String,
    /// Trace file, one `R|W <hex address>` per line
    trace: String,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,

    /// Print the report as JSON
    #[arg(short, long)]
    json: bool,

    /// Seed for RANDOM replacement, seeded from the OS when absent
    #[arg(short, long)]
    seed: Option<u64>,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    init_logging(args.debug);
    let config = CacheConfig::from_path(&args.config).map_err(|e| format!("Couldn't read the config file at path {}: {e}", args.config))?;
    let mut simulator = match args.seed {
        Some(seed) => Simulator::with_seed(&config, seed),
        None => Simulator::new(&config),
    }
    .map_err(|e| format!("Couldn't build the cache: {e}"))?;
    let trace_file = File::open(&args.trace).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let trace_reader = get_reader(trace_file).map_err(|e| format!("Couldn't read the trace file: {e}"))?;
    let result = simulator.simulate(trace_reader).map_err(|e| format!("Couldn't simulate the trace {}: {e}", args.trace))?;
    let report = Report::from(result);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    } else {
        println!("{report}");
    }
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        let cache = simulator.cache();
        let geometry = cache.geometry();
        println!("Geometry: {} sets of {} ways, {} byte blocks", geometry.num_sets, geometry.ways, geometry.block_size);
        println!("Distinct blocks accessed: {}", simulator.seen_block_count());
        println!("Uninitialised cache blocks: {}", cache.invalid_block_count());
        println!("Dirty blocks never written back: {}", cache.dirty_block_count());
    }
    Ok(())
}
