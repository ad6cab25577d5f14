//! virtmem - demand-paged virtual memory simulator
//!
//! Usage: virtmem [OPTIONS] <NPAGES> <NFRAMES> <POLICY> <PROGRAM>
//!
//! Runs PROGRAM over NPAGES of virtual memory backed by NFRAMES physical
//! frames and prints the program's checksum followed by
//! `<faults> <reads> <writes>`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use virtmem::{DEFAULT_DISK_FILE, ReplacementPolicy, SimConfig, VmManager, VmResult, Workload, logging};

#[derive(Parser)]
#[command(name = "virtmem")]
#[command(about = "Demand-paged virtual memory simulator")]
#[command(version)]
struct Cli {
    /// Number of virtual pages
    npages: usize,

    /// Number of physical frames
    nframes: usize,

    /// Replacement policy: rand, fifo or custom
    policy: String,

    /// Program to run: sort, scan or focus
    program: String,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Random seed for the rand policy
    #[arg(long)]
    seed: Option<u64>,

    /// Keep pages in this file instead of in memory (--disk=PATH, or bare
    /// --disk for ./myvirtualdisk)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = DEFAULT_DISK_FILE)]
    disk: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("run failed: {e:?}");
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn run(cli: &Cli) -> VmResult<()> {
    let policy: ReplacementPolicy = cli.policy.parse()?;
    let workload: Workload = cli.program.parse()?;

    let mut config = SimConfig::new(cli.npages, cli.nframes, policy, workload);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(path) = &cli.disk {
        config = config.with_disk_path(path);
    }

    let report = VmManager::new(&config)?.run()?;
    println!("{} result is {}", report.workload, report.result);
    println!("{}", report.stats);
    Ok(())
}
