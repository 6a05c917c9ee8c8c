//! Side-by-side comparison of the full-load and streaming engines.
//!
//! Runs both engines over every selected dataset in ascending size order and
//! renders one summary row per dataset, whether or not the engines succeeded.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use tracing::{info, warn};

use crate::bench::{BenchConfig, DemoOptions, MeasurementSource, Runner};
use crate::core::dataset::{DatasetDescriptor, SizeLabel};
use crate::core::schema::EngineKind;
use crate::report::{self, ComparisonRow};
use crate::{BenchResult, collect_system_info, probe_cmd};

/// Progress of a comparison session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Probing,
    Running(SizeLabel),
    Done,
    Aborted,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::NotStarted => f.write_str("not started"),
            RunPhase::Probing => f.write_str("probing connectivity"),
            RunPhase::Running(label) => write!(f, "running {label}"),
            RunPhase::Done => f.write_str("done"),
            RunPhase::Aborted => f.write_str("aborted"),
        }
    }
}

pub const KEY_INSIGHTS: &str = "\
💡 KEY INSIGHTS:
   • Full load: traditional in-memory processing
     - Fast for small datasets that fit in RAM
     - Memory usage grows linearly with data size
     - Fails when the dataset exceeds available memory
   • Streaming: modern analytical engine
     - Consistent performance regardless of data size
     - Low memory footprint through streaming execution
     - Scales from KB to TB datasets
   • Business impact:
     - Cost: lower infrastructure requirements
     - Speed: faster insights on large datasets
     - Reliability: no out-of-memory crashes
";

/// Drives one comparison session over a measurement source.
pub struct Comparison<'a, M: MeasurementSource + ?Sized> {
    source: &'a M,
    pause: Duration,
    phase: RunPhase,
}

impl<'a, M: MeasurementSource + ?Sized> Comparison<'a, M> {
    pub fn new(source: &'a M, pause: Duration) -> Self {
        Comparison { source, pause, phase: RunPhase::NotStarted }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn advance(&mut self, next: RunPhase) {
        info!(from = %self.phase, to = %next, "phase");
        self.phase = next;
    }

    /// Run the pre-flight check; a failure aborts the session.
    pub fn probe_with(&mut self, check: impl FnOnce() -> BenchResult<()>) -> BenchResult<()> {
        self.advance(RunPhase::Probing);
        check().inspect_err(|e| {
            warn!(error = %e, "pre-flight check failed");
            self.advance(RunPhase::Aborted);
        })
    }

    fn settle(&self) {
        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
    }

    /// Measure both engines for every dataset, smallest first. Every dataset
    /// produces a row; engine failures are recorded, never propagated.
    pub fn run<W: Write>(&mut self, datasets: &[DatasetDescriptor], out: &mut W) -> BenchResult<Vec<ComparisonRow>> {
        let mut ordered = datasets.to_vec();
        ordered.sort_by_key(|d| d.label);

        let mut rows = Vec::with_capacity(ordered.len());
        for dataset in ordered {
            self.advance(RunPhase::Running(dataset.label));
            writeln!(out, "\n📊 Testing {}", dataset.description())?;
            writeln!(out, "{}", "-".repeat(40))?;

            writeln!(out, "  🧱 Testing {}...", EngineKind::FullLoad)?;
            out.flush()?;
            let full_load = self.source.measure(EngineKind::FullLoad, &dataset);
            self.settle();

            writeln!(out, "  🦆 Testing {}...", EngineKind::Streaming)?;
            out.flush()?;
            let streaming = self.source.measure(EngineKind::Streaming, &dataset);
            self.settle();

            let row = ComparisonRow { dataset, full_load, streaming };
            write!(out, "{}", report::render_comparison_line(&row))?;
            rows.push(row);
        }
        self.advance(RunPhase::Done);
        Ok(rows)
    }
}

/// Render the closing summary for a finished comparison.
pub fn render_summary(rows: &[ComparisonRow]) -> String {
    let mut out = format!("\n{}\n📊 PERFORMANCE SUMMARY\n{}\n", "=".repeat(80), "=".repeat(80));
    out.push_str(&report::render_comparison_table(rows));
    out.push('\n');
    out.push_str(KEY_INSIGHTS);
    out
}

pub fn run(config: BenchConfig, opts: &DemoOptions) -> BenchResult<()> {
    println!("⚡ FULL LOAD vs STREAMING PERFORMANCE COMPARISON");
    println!("{}", "=".repeat(60));
    print!("{}", report::render_system_banner(&collect_system_info()));

    let datasets = config.datasets(&opts.datasets)?;
    let probe_timeout = config.run.probe_timeout();
    let pause = config.run.pause();
    let runner = Runner::new(config, opts.isolation()?);
    let mut comparison = Comparison::new(&runner, pause);

    if !opts.skip_probe {
        comparison.probe_with(|| probe_cmd::preflight(&datasets, probe_timeout).map(|_| ()))?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let rows = comparison.run(&datasets, &mut out)?;
    write!(out, "{}", render_summary(&rows))?;
    out.flush()?;
    Ok(())
}
