use std::time::Duration;

use tracing::{info, warn};

use crate::bench::BenchConfig;
use crate::core::dataset::{DatasetDescriptor, SizeLabel};
use crate::report::format_memory;
use crate::source::{self, ProbeOutcome};
use crate::{BenchError, BenchResult};

/// Pre-flight gate: probe every dataset and stop at the first unusable one.
pub fn preflight(datasets: &[DatasetDescriptor], timeout: Duration) -> BenchResult<Vec<ProbeOutcome>> {
    let mut outcomes = Vec::with_capacity(datasets.len());
    for d in datasets {
        let outcome = source::probe(&d.location, timeout);
        info!(dataset = %d.label, status = %outcome.status, latency_ms = outcome.latency_ms as u64, "probed");
        if !outcome.status.is_reachable() {
            warn!(dataset = %d.label, hint = outcome.status.hint(), "dataset unreachable");
        }
        outcomes.push(outcome.into_result()?);
    }
    Ok(outcomes)
}

/// Human-readable abort message for a failed pre-flight.
pub fn abort_message(err: &BenchError) -> Option<String> {
    match err {
        BenchError::Connectivity { location, status } => Some(format!(
            "❌ Cannot reach {location}: {status}\n💡 {}\n   (use --skip-probe to run anyway)",
            status.hint()
        )),
        _ => None,
    }
}

fn outcome_line(d: &DatasetDescriptor, o: &ProbeOutcome) -> String {
    let mark = if o.status.is_reachable() { "✓" } else { "✗" };
    let http = o.http_status.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
    let size = o.size_bytes.map(format_memory).unwrap_or_else(|| "-".to_string());
    format!(
        "{mark} {:<8} {:<28} {:<6} {:<12} {:>6}ms  {}",
        d.name,
        o.status.to_string(),
        http,
        size,
        o.latency_ms,
        o.location
    )
}

pub fn run(config: &BenchConfig, labels: &[SizeLabel]) -> BenchResult<()> {
    let datasets = config.datasets(labels)?;
    let timeout = config.run.probe_timeout();
    println!("🔎 Checking dataset locations (timeout {}s)", timeout.as_secs());
    let mut first_failure: Option<ProbeOutcome> = None;
    for d in &datasets {
        let outcome = source::probe(&d.location, timeout);
        println!("{}", outcome_line(d, &outcome));
        if !outcome.status.is_reachable() {
            println!("    💡 {}", outcome.status.hint());
            first_failure.get_or_insert(outcome);
        }
    }
    match first_failure {
        Some(o) => Err(BenchError::Connectivity { location: o.location, status: o.status }),
        None => {
            println!("✅ All datasets reachable");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ProbeStatus;

    #[test]
    fn test_abort_message_only_for_connectivity() {
        let err = BenchError::Connectivity { location: "https://x/y.csv".into(), status: ProbeStatus::NotFound };
        let msg = abort_message(&err).unwrap();
        assert!(msg.contains("https://x/y.csv"));
        assert!(msg.contains("not found"));
        assert!(abort_message(&BenchError::Message("x".into())).is_none());
    }

    #[test]
    fn test_preflight_stops_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("small.csv");
        std::fs::write(&present, "a;1\n").unwrap();
        let mk = |label, path: &std::path::Path| DatasetDescriptor {
            label,
            name: label.to_string(),
            location: path.to_string_lossy().to_string(),
            approx_records: 1,
            approx_bytes: 4,
        };
        let ok = preflight(&[mk(SizeLabel::Small, &present)], Duration::from_secs(1)).unwrap();
        assert_eq!(ok.len(), 1);
        let err = preflight(
            &[mk(SizeLabel::Small, &present), mk(SizeLabel::Medium, &dir.path().join("medium.csv"))],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::Connectivity { status: ProbeStatus::NotFound, .. }));
    }
}
