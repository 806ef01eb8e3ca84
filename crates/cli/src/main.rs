//! Flexible cache simulator CLI.

use clap::{Args, Parser, Subcommand};
use log::info;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use flexcache::core::predict::RegionHistogram;
use flexcache::sim::loader;
use flexcache::{AccessMode, ReportFormat, SimConfig, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "flexsim",
    author,
    version,
    about = "Trace-driven flexible-granularity cache simulator",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a memory access trace.
    Run(RunArgs),

    /// Print every record of a hint file.
    Dump {
        /// Hint file.
        #[arg(short = 'f', long)]
        file: PathBuf,
    },

    /// Per-region run-length statistics of a hint file.
    Bins {
        /// Hint file.
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Region size in bytes.
        #[arg(short = 'b', long, default_value_t = 4096)]
        bin_size: u64,

        /// Regions to show, as a percentage of all regions and an upper bound.
        #[arg(short = 't', long, default_value_t = 10)]
        top: usize,

        /// CSV output.
        #[arg(short = 'x', long)]
        csv: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Trace file, plain or gzip-compressed.
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// JSON configuration; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of sets.
    #[arg(short = 's', long)]
    sets: Option<u32>,

    /// Capacity of each set in bytes.
    #[arg(short = 'c', long)]
    set_size: Option<u64>,

    /// Maximum block granularity in bytes.
    #[arg(short = 'g', long)]
    gran: Option<u64>,

    /// Aligned access mode (fixed lines of the maximum granularity).
    #[arg(short = 'a', long)]
    aligned: bool,

    /// Warm-up instructions.
    #[arg(short = 'w', long)]
    warmup: Option<u64>,

    /// Instructions to simulate, 0 for the whole trace.
    #[arg(short = 'e', long)]
    sim_count: Option<u64>,

    /// Hint directory.
    #[arg(short = 'd', long)]
    hint_dir: Option<PathBuf>,

    /// Region size used to bin hints, in bytes.
    #[arg(short = 'b', long)]
    bin_size: Option<u64>,

    /// CSV output.
    #[arg(short = 'x', long, conflicts_with = "json")]
    csv: bool,

    /// JSON output.
    #[arg(long)]
    json: bool,

    /// Also print the statistics of every set.
    #[arg(long)]
    per_set: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Dump { file } => cmd_dump(&file),
        Command::Bins {
            file,
            bin_size,
            top,
            csv,
        } => cmd_bins(&file, bin_size, top, csv),
    }
}

fn fatal(e: impl Display) -> ! {
    eprintln!("\n\x1b[1;31merror:\x1b[0m {}", e);
    process::exit(1);
}

fn build_config(args: &RunArgs) -> SimConfig {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path).unwrap_or_else(|e| fatal(e)),
        None => SimConfig::default(),
    };

    if let Some(v) = args.sets {
        config.set_count = v;
    }
    if let Some(v) = args.set_size {
        config.set_size_bytes = v;
    }
    if let Some(v) = args.gran {
        config.max_gran_bytes = v;
    }
    if args.aligned {
        config.mode = AccessMode::Aligned;
    }
    if let Some(v) = args.warmup {
        config.warmup_instructions = v;
    }
    if let Some(v) = args.sim_count {
        config.sim_instructions = v;
    }
    if let Some(v) = &args.hint_dir {
        config.hint_dir = Some(v.clone());
    }
    if let Some(v) = args.bin_size {
        config.bin_size_bytes = v;
    }
    if args.csv {
        config.report = ReportFormat::Csv;
    } else if args.json {
        config.report = ReportFormat::Json;
    }
    config
}

fn cmd_run(args: RunArgs) {
    let config = build_config(&args);
    let format = config.report;

    let mut sim = Simulator::new(config).unwrap_or_else(|e| fatal(e));
    sim.run_trace(&args.file).unwrap_or_else(|e| fatal(e));
    let report = sim.finish().unwrap_or_else(|e| fatal(e));
    info!(
        "Simulated {} accesses with the {} predictor",
        sim.records(),
        sim.predictor_name()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report.write(format, &mut out).unwrap_or_else(|e| fatal(e));

    if args.per_set {
        for (i, set) in sim.controller().report_per_set().iter().enumerate() {
            if format == ReportFormat::Verbose {
                writeln!(out, "\n-- Set {}", i).unwrap_or_else(|e| fatal(e));
            }
            set.write(format, &mut out).unwrap_or_else(|e| fatal(e));
        }
    }
    out.flush().ok();
}

fn cmd_dump(file: &Path) {
    let records = loader::read_hints(file).unwrap_or_else(|e| fatal(e));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        record.describe(&mut out).unwrap_or_else(|e| fatal(e));
    }
}

fn cmd_bins(file: &Path, bin_size: u64, top: usize, csv: bool) {
    if bin_size == 0 || !bin_size.is_power_of_two() {
        fatal(format!("bin size must be a power of two, got {}", bin_size));
    }
    let records = loader::read_hints(file).unwrap_or_else(|e| fatal(e));
    let histogram = RegionHistogram::from_records(&records, bin_size);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for region in histogram.top_regions(top) {
        let Some(summary) = histogram.summary(region) else {
            continue;
        };
        let bins = histogram.region_histogram(region);
        let opt = |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |v| v.to_string());

        let written = if csv {
            let mut line = format!(
                "{},{},{},{},{},",
                region,
                summary.samples,
                opt(summary.variance),
                opt(summary.std_dev),
                summary.mean
            );
            for len in 1..=8u32 {
                let n = bins.and_then(|b| b.get(&len)).copied().unwrap_or(0);
                line.push_str(&format!("{},{},", len, n));
            }
            writeln!(out, "{}", line)
        } else {
            let mut text = format!(
                "-- Bin[{}]\nCount: {}\nVariance: {}\nStandard Deviation: {}\nMean: {}\n",
                region,
                summary.samples,
                opt(summary.variance),
                opt(summary.std_dev),
                summary.mean
            );
            for (len, n) in bins.into_iter().flatten() {
                text.push_str(&format!("{} words accessed {} times\n", len, n));
            }
            writeln!(out, "{}", text)
        };
        written.unwrap_or_else(|e| fatal(e));
    }
}
