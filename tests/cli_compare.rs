use std::path::Path;
use std::process::Command;

use tempfile::tempdir;

fn write_csv(path: &Path, rows: usize) {
    let stations = ["Accra", "Hamburg", "Lima", "Tunis"];
    let mut body = String::new();
    for i in 0..rows {
        body.push_str(&format!("{};{:.1}\n", stations[i % stations.len()], (i % 50) as f64 - 15.0));
    }
    std::fs::write(path, body).unwrap();
}

/// Config pointing all three sizes at local files; the large one does not fit the budget.
fn setup(dir: &Path) -> std::path::PathBuf {
    write_csv(&dir.join("small.csv"), 100);
    write_csv(&dir.join("medium.csv"), 400);
    write_csv(&dir.join("large.csv"), 40_000);
    let config = dir.join("bench.toml");
    std::fs::write(
        &config,
        r#"
[run]
pause_between_runs_ms = 0
full_load_timeout_secs = 120
probe_timeout_secs = 2
memory_budget_bytes = 65536

[[dataset]]
label = "small"
location = "small.csv"

[[dataset]]
label = "medium"
location = "medium.csv"

[[dataset]]
label = "large"
location = "large.csv"
"#,
    )
    .unwrap();
    config
}

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bigdata-bench"));
    cmd.env("BIGDATA_BENCH_LOG", "off");
    cmd
}

fn summary_rows(stdout: &str) -> Vec<String> {
    let summary = stdout.split("PERFORMANCE SUMMARY").nth(1).unwrap_or_default();
    summary
        .lines()
        .filter(|l| l.starts_with("Small") || l.starts_with("Medium") || l.starts_with("Large"))
        .map(str::to_string)
        .collect()
}

#[test]
fn compare_reports_every_dataset_through_workers() {
    let dir = tempdir().unwrap();
    let config = setup(dir.path());

    let output = bin().arg("--config").arg(&config).arg("compare").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout:\n{stdout}\nstderr:\n{}", String::from_utf8_lossy(&output.stderr));

    let rows = summary_rows(&stdout);
    assert_eq!(rows.len(), 3, "{stdout}");
    assert!(rows[0].starts_with("Small"));
    assert!(rows[1].starts_with("Medium"));
    assert!(rows[2].starts_with("Large"));
    assert!(rows[2].contains("OUT OF MEMORY"), "{}", rows[2]);
    assert!(!rows[0].contains("FAILED") && !rows[0].contains("OUT OF MEMORY"));
    assert!(stdout.contains("KEY INSIGHTS"));
}

#[test]
fn no_subcommand_runs_the_comparison_in_process() {
    let dir = tempdir().unwrap();
    let config = setup(dir.path());

    // Global flags come before the subcommand; with none given the comparison runs.
    let output = bin().arg("--config").arg(&config).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(summary_rows(&stdout).len(), 3);

    let output = bin()
        .arg("--config")
        .arg(&config)
        .args(["compare", "--in-process", "--dataset", "small"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows = summary_rows(&stdout);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("Small"));
}

#[test]
fn single_engine_demo_prints_stations() {
    let dir = tempdir().unwrap();
    let config = setup(dir.path());
    let output = bin()
        .arg("--config")
        .arg(&config)
        .args(["streaming", "--dataset", "small", "--dataset", "medium"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("STREAMING ANALYSIS: Small"));
    assert!(stdout.contains("STREAMING ANALYSIS: Medium"));
    assert!(stdout.contains("Hamburg"));
    assert!(stdout.contains("(4 stations)"));
    assert!(!stdout.contains("Large"));
}

#[test]
fn missing_dataset_aborts_before_running() {
    let dir = tempdir().unwrap();
    let config = setup(dir.path());
    std::fs::remove_file(dir.path().join("medium.csv")).unwrap();

    let output = bin().arg("--config").arg(&config).arg("compare").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "{stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("PERFORMANCE SUMMARY"));

    let output = bin().arg("--config").arg(&config).args(["probe"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn unknown_label_and_bad_config_exit_with_one() {
    let dir = tempdir().unwrap();
    let config = setup(dir.path());
    let output = bin().arg("--config").arg(&config).args(["compare", "--dataset", "huge"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown dataset label 'huge'"));

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[run]\nnot_a_setting = 1\n").unwrap();
    let output = bin().arg("--config").arg(&bad).arg("datasets").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

#[test]
fn datasets_lists_registry_with_overrides() {
    let dir = tempdir().unwrap();
    let config = setup(dir.path());
    let output = bin().arg("--config").arg(&config).arg("datasets").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.contains("large.csv"));

    let output = bin().arg("datasets").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("https://storage.googleapis.com/bigdata2025/duckdb/small_dataset.csv"));
    assert!(stdout.contains("100,000,000"));
}
