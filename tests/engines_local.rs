use std::sync::Arc;

use bigdata_bench::bench::measure_in_process;
use bigdata_bench::engine::{Engine, FullLoadEngine, StreamingEngine};
use bigdata_bench::{BenchError, DatasetDescriptor, EngineKind, FailureKind, SizeLabel};
use tempfile::tempdir;

fn write_measurements(path: &std::path::Path, rows: usize) {
    let stations = ["Abha", "Bulawayo", "Hamburg", "Oslo", "Tunis"];
    let mut body = String::new();
    for i in 0..rows {
        let station = stations[i % stations.len()];
        let temp = (i % 40) as f64 - 10.0 + 0.5;
        body.push_str(&format!("{station};{temp:.1}\n"));
    }
    std::fs::write(path, body).unwrap();
}

fn dataset(path: &std::path::Path, label: SizeLabel) -> DatasetDescriptor {
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    DatasetDescriptor {
        label,
        name: label.to_string(),
        location: path.to_string_lossy().to_string(),
        approx_records: 0,
        approx_bytes: bytes,
    }
}

#[test]
fn engines_agree_on_local_csv() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("small.csv");
    write_measurements(&csv, 1000);
    let ds = dataset(&csv, SizeLabel::Small);

    let full = FullLoadEngine::new(None).run(&ds).unwrap();
    let streaming = StreamingEngine::new(None).run(&ds).unwrap();

    assert_eq!(full.records, 1000);
    assert_eq!(streaming.records, 1000);
    assert_eq!(full.stations.len(), 5);
    assert!(full.load_time.is_some());
    assert!(streaming.load_time.is_none());

    let names: Vec<&str> = streaming.stations.iter().map(|s| s.station.as_str()).collect();
    assert_eq!(names, vec!["Abha", "Bulawayo", "Hamburg", "Oslo", "Tunis"]);
    for (a, b) in full.stations.iter().zip(&streaming.stations) {
        assert_eq!(a.station, b.station);
        assert_eq!(a.count, b.count);
        assert!((a.min - b.min).abs() < 1e-9);
        assert!((a.max - b.max).abs() < 1e-9);
        assert!((a.mean - b.mean).abs() < 1e-6);
    }
}

#[test]
fn streaming_respects_memory_limit_setting() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("medium.csv");
    write_measurements(&csv, 5000);
    let ds = dataset(&csv, SizeLabel::Medium);
    let out = StreamingEngine::new(Some("256MB".into())).run(&ds).unwrap();
    assert_eq!(out.records, 5000);
}

#[test]
fn full_load_over_budget_is_recorded_as_out_of_memory() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("large.csv");
    write_measurements(&csv, 20_000);
    let ds = dataset(&csv, SizeLabel::Large);

    let engine = FullLoadEngine::new(Some(4096));
    assert!(matches!(engine.run(&ds), Err(BenchError::OutOfMemory { .. })));

    let m = measure_in_process(Arc::new(FullLoadEngine::new(Some(4096))), &ds, None);
    assert!(!m.success);
    assert_eq!(m.engine, EngineKind::FullLoad);
    assert_eq!(m.failure_kind(), Some(FailureKind::OutOfMemory));
    assert!(m.elapsed_secs >= 0.0);
}

#[test]
fn malformed_rows_fail_both_engines() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("broken.csv");
    std::fs::write(&csv, "Oslo;1.5\nOslo;warm\n").unwrap();
    let ds = dataset(&csv, SizeLabel::Small);

    let full = measure_in_process(Arc::new(FullLoadEngine::new(None)), &ds, None);
    assert_eq!(full.failure_kind(), Some(FailureKind::Execution));
    let streaming = measure_in_process(Arc::new(StreamingEngine::new(None)), &ds, None);
    assert_eq!(streaming.failure_kind(), Some(FailureKind::Execution));
}

#[test]
fn engines_agree_on_rows_without_a_station() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("blank.csv");
    std::fs::write(&csv, "Oslo;1.0\n;2.0\nOslo;3.0\n;6.0\n").unwrap();
    let ds = dataset(&csv, SizeLabel::Small);

    let full = FullLoadEngine::new(None).run(&ds).unwrap();
    let streaming = StreamingEngine::new(None).run(&ds).unwrap();

    assert_eq!(full.stations, streaming.stations);
    assert_eq!(full.stations.len(), 2);
    assert_eq!(full.stations[0].station, "");
    assert_eq!(full.stations[0].count, 2);
    assert!((full.stations[0].mean - 4.0).abs() < 1e-9);
    assert_eq!(streaming.records, 4);
}

/// Streaming memory stays well under the file size; a full load does not.
#[cfg(feature = "mem")]
#[test]
fn streaming_peak_memory_stays_below_full_load() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("large.csv");
    let lines: Vec<String> = (0..400)
        .map(|i| format!("Station{:03};{:.1}\n", i % 97, (i % 80) as f64 - 20.0 + 0.3))
        .collect();
    let target = 50 * 1024 * 1024;
    let mut body = String::with_capacity(target + 64);
    let mut i = 0;
    while body.len() < target {
        body.push_str(&lines[i % lines.len()]);
        i += 1;
    }
    std::fs::write(&csv, body.as_bytes()).unwrap();
    drop(body);
    let bytes = std::fs::metadata(&csv).unwrap().len();
    let ds = dataset(&csv, SizeLabel::Large);

    let full = measure_in_process(Arc::new(FullLoadEngine::new(None)), &ds, None);
    assert!(full.success, "{:?}", full.failure);
    let streaming = measure_in_process(Arc::new(StreamingEngine::new(Some("256MB".into()))), &ds, None);
    assert!(streaming.success, "{:?}", streaming.failure);

    assert_eq!(full.records, streaming.records);
    assert!(
        streaming.peak_memory_bytes < bytes / 2,
        "streaming peak {} vs file {bytes}",
        streaming.peak_memory_bytes
    );
    assert!(full.peak_memory_bytes >= bytes / 2, "full-load peak {} vs file {bytes}", full.peak_memory_bytes);
}
