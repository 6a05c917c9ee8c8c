use std::io::Write;

use anyhow::Context;
use tracing::debug;

use crate::bench::{BenchConfig, measure_in_process};
use crate::core::dataset::SizeLabel;
use crate::core::schema::EngineKind;
use crate::{BenchResult, engine};

/// Worker entry point: run one engine on one dataset and print the
/// Measurement as a single JSON line on stdout.
///
/// The wall-clock guard belongs to the parent, which kills the worker when it
/// expires, so the run here is unguarded.
pub fn run(mut config: BenchConfig, engine_kind: EngineKind, label: SizeLabel, memory_budget: Option<u64>) -> BenchResult<()> {
    if memory_budget.is_some() {
        config.run.memory_budget_bytes = memory_budget;
    }
    let dataset = config.registry.get(label)?.clone();
    debug!(engine = %engine_kind, dataset = %dataset.label, location = %dataset.location, "worker starting");

    let engine = engine::build(engine_kind, &config.run);
    let m = measure_in_process(engine, &dataset, None);
    let line = serde_json::to_string(&m).context("serializing measurement")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}
