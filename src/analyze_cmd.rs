//! Single-engine walkthrough: one engine across every dataset size.

use std::io::Write;

use crate::bench::{BenchConfig, DemoOptions, MeasurementSource, Runner};
use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, Measurement};
use crate::report::{self, format_count, format_memory, format_secs};
use crate::{BenchResult, collect_system_info, probe_cmd};

fn intro(engine: EngineKind) -> (&'static str, &'static str) {
    match engine {
        EngineKind::FullLoad => ("🧱 FULL-LOAD BIG DATA DEMO", "Demonstrating memory limitations with large datasets"),
        EngineKind::Streaming => ("🦆 STREAMING BIG DATA DEMO", "Demonstrating efficient processing of large datasets"),
    }
}

fn observations(engine: EngineKind) -> &'static str {
    match engine {
        EngineKind::FullLoad => "\
💡 Key Observations:
   • The full dataset is loaded into memory before any processing
   • Memory usage grows linearly with data size
   • Large datasets may cause out-of-memory errors
   • Processing time increases significantly with size
   • The system becomes less responsive during processing
",
        EngineKind::Streaming => "\
💡 Key Advantages of Streaming:
   • Processes data without loading it entirely into memory
   • Near-constant memory usage regardless of dataset size
   • Built-in CSV reading with parallel processing
   • SQL interface for complex analytics
   • Columnar execution for efficient aggregations
   • No separate database server required
",
    }
}

/// Describe one measured run the way the walkthrough prints it.
pub fn render_run(dataset: &DatasetDescriptor, m: &Measurement) -> String {
    let mut out = format!("\n{}\n", "=".repeat(60));
    out.push_str(&format!("{} ANALYSIS: {}\n", m.engine.title().to_uppercase(), dataset.description()));
    out.push_str(&format!("Location: {}\n", dataset.location));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    if !m.success {
        let (label, message) = match &m.failure {
            Some(f) => (f.kind.cell(), f.message.as_str()),
            None => ("FAILED", "unknown error"),
        };
        out.push_str(&format!("❌ {label}: {message}\n"));
        out.push_str(&format!("Memory usage when failed: +{}\n", format_memory(m.peak_memory_bytes)));
        if m.engine == EngineKind::FullLoad {
            out.push_str("💡 This demonstrates the limit of loading everything into memory\n");
        }
        return out;
    }

    if let Some(load) = m.load_secs {
        out.push_str(&format!("✓ Data loaded in {}\n", format_secs(load)));
        out.push_str(&format!("✓ Aggregation completed in {}\n", format_secs((m.elapsed_secs - load).max(0.0))));
    }
    out.push_str(&format!("✓ Processing completed in {}\n", format_secs(m.elapsed_secs)));
    if let Some(before) = m.baseline_memory_bytes {
        out.push_str(&format!("Memory before: {}\n", format_memory(before)));
        out.push_str(&format!("Memory after: {}\n", format_memory(before + m.peak_memory_bytes)));
    }
    out.push_str(&format!("Peak memory increase: +{}\n", format_memory(m.peak_memory_bytes)));
    if let Some(records) = m.records {
        out.push_str(&format!("Total records processed: {}\n", format_count(records)));
    }
    out.push_str(&report::render_stations(&m.top_stations, m.stations.unwrap_or(m.top_stations.len())));
    out
}

/// Run one engine over the datasets, writing the walkthrough to `out`.
pub fn walkthrough<M: MeasurementSource + ?Sized, W: Write>(
    source: &M,
    engine: EngineKind,
    datasets: &[DatasetDescriptor],
    pause: std::time::Duration,
    out: &mut W,
) -> BenchResult<Vec<(DatasetDescriptor, Measurement)>> {
    let mut ordered = datasets.to_vec();
    ordered.sort_by_key(|d| d.label);
    let mut results = Vec::with_capacity(ordered.len());
    for dataset in ordered {
        writeln!(out, "\n⏳ Processing {} with {}...", dataset.description(), engine)?;
        out.flush()?;
        let m = source.measure(engine, &dataset);
        write!(out, "{}", render_run(&dataset, &m))?;
        results.push((dataset, m));
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    writeln!(out, "\n{}", "=".repeat(60))?;
    writeln!(out, "📊 {} PERFORMANCE SUMMARY", engine.title().to_uppercase())?;
    writeln!(out, "{}", "=".repeat(60))?;
    write!(out, "{}", report::render_engine_summary(&results))?;
    write!(out, "\n{}", observations(engine))?;
    Ok(results)
}

pub fn run(engine: EngineKind, config: BenchConfig, opts: &DemoOptions) -> BenchResult<()> {
    let (title, subtitle) = intro(engine);
    println!("{title}");
    println!("{subtitle}");
    print!("{}", report::render_system_banner(&collect_system_info()));

    let datasets = config.datasets(&opts.datasets)?;
    if !opts.skip_probe {
        probe_cmd::preflight(&datasets, config.run.probe_timeout())?;
    }
    let pause = config.run.pause();
    let runner = Runner::new(config, opts.isolation()?);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    walkthrough(&runner, engine, &datasets, pause, &mut out)?;
    out.flush()?;
    Ok(())
}
