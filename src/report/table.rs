//! Fixed-width text tables.

use crate::SystemInfo;
use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, Measurement, StationStats};

use super::{format_count, format_memory, format_secs};

/// Both measurements for one dataset.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    pub dataset: DatasetDescriptor,
    pub full_load: Measurement,
    pub streaming: Measurement,
}

fn time_cell(m: &Measurement) -> String {
    if m.success {
        format_secs(m.elapsed_secs)
    } else {
        m.failure_kind().map(|k| k.cell()).unwrap_or("FAILED").to_string()
    }
}

/// Summary table with exactly one line per row, failed engines included.
pub fn render_comparison_table(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<20} {:<15} {:<15} {:<15} {:<15}\n",
        "Dataset",
        format!("{} Time", EngineKind::FullLoad.title()),
        format!("{} Time", EngineKind::Streaming.title()),
        format!("{} Mem", EngineKind::FullLoad.title()),
        format!("{} Mem", EngineKind::Streaming.title()),
    ));
    out.push_str(&"-".repeat(80));
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{:<20} {:<15} {:<15} {:<15} {:<15}\n",
            row.dataset.name,
            time_cell(&row.full_load),
            time_cell(&row.streaming),
            format_memory(row.full_load.peak_memory_bytes),
            format_memory(row.streaming.peak_memory_bytes),
        ));
    }
    out
}

fn outcome_line(m: &Measurement) -> String {
    let mem = format_memory(m.peak_memory_bytes);
    if m.success {
        format!("    {:<11}{}, {} memory\n", format!("{}:", m.engine.title()), format_secs(m.elapsed_secs), mem)
    } else {
        let reason = m.failure.as_ref().map(|f| f.message.as_str()).unwrap_or("failed");
        format!("    {:<11}❌ {} ({} memory)\n", format!("{}:", m.engine.title()), reason, mem)
    }
}

/// Per-dataset result lines printed right after both engines ran.
pub fn render_comparison_line(row: &ComparisonRow) -> String {
    let mut out = format!("\n  📈 Results for {}:\n", row.dataset.description());
    out.push_str(&outcome_line(&row.full_load));
    out.push_str(&outcome_line(&row.streaming));
    if row.full_load.success && row.streaming.success {
        let speedup = row.full_load.elapsed_secs / row.streaming.elapsed_secs.max(0.001);
        let one_mb = 1024 * 1024;
        let mem_ratio = row.full_load.peak_memory_bytes as f64 / row.streaming.peak_memory_bytes.max(one_mb) as f64;
        out.push_str(&format!(
            "    {} is {:.1}x faster and uses {:.1}x less memory\n",
            EngineKind::Streaming.title(),
            speedup,
            mem_ratio
        ));
    }
    out
}

/// Summary of one engine across datasets.
pub fn render_engine_summary(rows: &[(DatasetDescriptor, Measurement)]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<30} {:<12} {:<12} {:<12} {:<15}\n",
        "Dataset", "Records", "Load Time", "Total Time", "Peak Memory"
    ));
    out.push_str(&"-".repeat(85));
    out.push('\n');
    for (dataset, m) in rows {
        let records = m.records.map(format_count).unwrap_or_else(|| "-".to_string());
        let load = m.load_secs.map(format_secs).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<30} {:<12} {:<12} {:<12} {:<15}\n",
            dataset.name,
            records,
            load,
            time_cell(m),
            format_memory(m.peak_memory_bytes),
        ));
    }
    out
}

/// Aggregation rows; `total` is the full station count of the result.
pub fn render_stations(stations: &[StationStats], total: usize) -> String {
    let mut out = format!("\n📈 Results ({total} stations):\n");
    out.push_str(&format!("{:<20} {:<8} {:<8} {:<8} {:<10}\n", "Station", "Min", "Mean", "Max", "Count"));
    out.push_str(&"-".repeat(60));
    out.push('\n');
    for s in stations {
        out.push_str(&format!(
            "{:<20} {:<8.1} {:<8.1} {:<8.1} {:<10}\n",
            s.station,
            s.min,
            s.mean,
            s.max,
            format_count(s.count)
        ));
    }
    if total > stations.len() {
        out.push_str(&format!("... (showing first {} stations)\n", stations.len()));
    }
    out
}

pub fn render_system_banner(info: &SystemInfo) -> String {
    let mem = |v: Option<u64>| v.map(format_memory).unwrap_or_else(|| "unknown".to_string());
    let mut out = String::from("System Info:\n");
    out.push_str(&format!("  Total Memory: {}\n", mem(info.total_ram_bytes)));
    out.push_str(&format!("  Available Memory: {}\n", mem(info.available_ram_bytes)));
    out.push_str(&format!(
        "  CPU Cores: {}\n",
        info.cpu_cores_logical.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())
    ));
    if let Some(model) = &info.cpu_model {
        out.push_str(&format!("  CPU: {model}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{Registry, SizeLabel};
    use crate::core::schema::{Failure, FailureKind};

    fn ok(dataset: SizeLabel, engine: EngineKind, secs: f64, mem: u64) -> Measurement {
        Measurement {
            dataset,
            engine,
            timestamp: String::new(),
            elapsed_secs: secs,
            load_secs: None,
            baseline_memory_bytes: None,
            peak_memory_bytes: mem,
            success: true,
            failure: None,
            records: Some(1000),
            stations: Some(3),
            top_stations: Vec::new(),
        }
    }

    fn rows() -> Vec<ComparisonRow> {
        let reg = Registry::default();
        let mb = 1024 * 1024;
        reg.iter()
            .map(|d| {
                let full_load = if d.label == SizeLabel::Large {
                    Measurement::failed(
                        d.label,
                        EngineKind::FullLoad,
                        12.0,
                        900 * mb,
                        Failure::new(FailureKind::OutOfMemory, "out of memory"),
                    )
                } else if d.label == SizeLabel::Medium {
                    Measurement::failed(d.label, EngineKind::FullLoad, 1.0, 0, Failure::new(FailureKind::Timeout, "slow"))
                } else {
                    ok(d.label, EngineKind::FullLoad, 2.0, 40 * mb)
                };
                ComparisonRow { dataset: d.clone(), full_load, streaming: ok(d.label, EngineKind::Streaming, 0.5, 10 * mb) }
            })
            .collect()
    }

    #[test]
    fn test_one_line_per_dataset_even_on_failure() {
        let table = render_comparison_table(&rows());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2 + 3);
        assert!(lines[0].starts_with("Dataset"));
        assert!(lines[2].starts_with("Small"));
        assert!(lines[2].contains("2.00s"));
        assert!(lines[3].starts_with("Medium"));
        assert!(lines[3].contains("FAILED"));
        assert!(lines[4].starts_with("Large"));
        assert!(lines[4].contains("OUT OF MEMORY"));
        assert!(lines[4].contains("900.0 MB"));
    }

    #[test]
    fn test_comparison_line_ratio_only_when_both_succeed() {
        let rows = rows();
        let small = render_comparison_line(&rows[0]);
        assert!(small.contains("Streaming is 4.0x faster and uses 4.0x less memory"));
        let large = render_comparison_line(&rows[2]);
        assert!(large.contains("❌ out of memory"));
        assert!(!large.contains("faster"));
    }

    #[test]
    fn test_engine_summary() {
        let rows: Vec<(DatasetDescriptor, Measurement)> =
            rows().into_iter().map(|r| (r.dataset, r.full_load)).collect();
        let table = render_engine_summary(&rows);
        assert_eq!(table.lines().count(), 5);
        assert!(table.contains("1,000"));
        assert!(table.lines().last().unwrap().contains("OUT OF MEMORY"));
    }

    #[test]
    fn test_stations_truncation_note() {
        let s = vec![StationStats { station: "Perth".into(), min: 10.0, mean: 20.25, max: 30.0, count: 1234 }];
        let out = render_stations(&s, 1);
        assert!(out.contains("Perth"));
        assert!(out.contains("1,234"));
        assert!(!out.contains("showing first"));
        assert!(render_stations(&s, 400).contains("showing first 1 stations"));
    }

    #[test]
    fn test_system_banner_handles_unknowns() {
        let out = render_system_banner(&SystemInfo::default());
        assert!(out.contains("Total Memory: unknown"));
        assert!(out.contains("CPU Cores: unknown"));
    }
}
