#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use bigdata_bench::bench::{BenchConfig, DemoOptions, load_bench_config};
use bigdata_bench::{
    BenchResult, EngineKind, SizeLabel, analyze_cmd, compare_cmd, guided_cmd, probe_cmd, report, worker_cmd,
};

#[derive(Parser, Debug)]
#[command(name = "bigdata-bench")]
#[command(about = "Full-load versus streaming aggregation over growing CSV datasets", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set BIGDATA_BENCH_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    /// TOML file with [run] settings and [[dataset]] overrides
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct DemoArgs {
    /// Dataset to run (small, medium, large); repeatable, default all
    #[arg(long = "dataset")]
    datasets: Vec<String>,
    /// Do not check dataset connectivity before running
    #[arg(long)]
    skip_probe: bool,
    /// Run engines in this process instead of a worker subprocess
    #[arg(long)]
    in_process: bool,
    /// Memory the full-load engine may use, in bytes
    #[arg(long)]
    memory_budget: Option<u64>,
    /// Wall-clock guard for the full-load engine in seconds; 0 disables it
    #[arg(long)]
    full_load_timeout: Option<u64>,
}

impl DemoArgs {
    /// Flags win over the config file.
    fn apply(&self, config: &mut BenchConfig) -> BenchResult<DemoOptions> {
        if let Some(budget) = self.memory_budget {
            config.run.memory_budget_bytes = Some(budget);
        }
        if let Some(secs) = self.full_load_timeout {
            config.run.full_load_timeout_secs = secs;
        }
        Ok(DemoOptions { datasets: parse_labels(&self.datasets)?, skip_probe: self.skip_probe, in_process: self.in_process })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run both engines over every dataset and print a comparison (default)
    Compare(DemoArgs),

    /// Run the full-load engine over every dataset
    FullLoad(DemoArgs),

    /// Run the streaming engine over every dataset
    Streaming(DemoArgs),

    /// Check that every dataset location is reachable
    Probe {
        #[arg(long = "dataset")]
        datasets: Vec<String>,
    },

    /// List the configured datasets
    Datasets,

    /// Interactive menu for presenting the demos
    Guided(DemoArgs),

    /// Run one engine on one dataset and print the measurement as JSON
    #[command(hide = true)]
    Worker {
        #[arg(long, value_enum)]
        engine: EngineKind,
        #[arg(long, value_enum)]
        dataset: SizeLabel,
        #[arg(long)]
        memory_budget: Option<u64>,
    },
}

/// Labels are checked here rather than by clap so an unknown one is a setup failure.
fn parse_labels(labels: &[String]) -> BenchResult<Vec<SizeLabel>> {
    labels.iter().map(|l| l.parse()).collect()
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("BIGDATA_BENCH_LOG").unwrap_or_else(|_| {
        if verbose { "bigdata_bench=debug".to_string() } else { "bigdata_bench=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn print_datasets(config: &BenchConfig) {
    println!("{:<8} {:<10} {:>14} {:>12}  {}", "Label", "Name", "Records", "Size", "Location");
    for d in config.registry.iter() {
        println!(
            "{:<8} {:<10} {:>14} {:>12}  {}",
            d.label.as_str(),
            d.name,
            report::format_count(d.approx_records),
            report::format_memory(d.approx_bytes),
            d.location
        );
    }
}

fn dispatch(cli: Cli) -> BenchResult<()> {
    let mut config = load_bench_config(cli.config.as_deref())?;
    match cli.command.unwrap_or_else(|| Commands::Compare(DemoArgs::default())) {
        Commands::Compare(args) => {
            let opts = args.apply(&mut config)?;
            compare_cmd::run(config, &opts)
        }
        Commands::FullLoad(args) => {
            let opts = args.apply(&mut config)?;
            analyze_cmd::run(EngineKind::FullLoad, config, &opts)
        }
        Commands::Streaming(args) => {
            let opts = args.apply(&mut config)?;
            analyze_cmd::run(EngineKind::Streaming, config, &opts)
        }
        Commands::Probe { datasets } => probe_cmd::run(&config, &parse_labels(&datasets)?),
        Commands::Datasets => {
            print_datasets(&config);
            Ok(())
        }
        Commands::Guided(args) => {
            let opts = args.apply(&mut config)?;
            guided_cmd::run(config, &opts)
        }
        Commands::Worker { engine, dataset, memory_budget } => worker_cmd::run(config, engine, dataset, memory_budget),
    }
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dispatch(cli) {
        match probe_cmd::abort_message(&e) {
            Some(msg) => eprintln!("{msg}"),
            None => eprintln!("{:#}", e),
        }
        std::process::exit(1);
    }
}
