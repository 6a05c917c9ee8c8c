use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::dataset::{DatasetDescriptor, Registry, SizeLabel};
use crate::core::schema::EngineKind;
use crate::source::DataLocation;
use crate::{BenchError, BenchResult};

/// `[run]` table: guards and pacing for a demo session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Wall-clock guard for the full-load engine; 0 disables it
    pub full_load_timeout_secs: u64,
    /// Wall-clock guard for the streaming engine; 0 disables it
    pub streaming_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// Pause after every engine run so the system can settle
    pub pause_between_runs_ms: u64,
    /// Memory the full-load engine may use; defaults to available RAM at start
    pub memory_budget_bytes: Option<u64>,
    /// Passed to DuckDB as `SET memory_limit`, e.g. "1GB"
    pub streaming_memory_limit: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            full_load_timeout_secs: 600,
            streaming_timeout_secs: 0,
            probe_timeout_secs: 10,
            pause_between_runs_ms: 1000,
            memory_budget_bytes: None,
            streaming_memory_limit: None,
        }
    }
}

impl RunSettings {
    pub fn timeout_for(&self, engine: EngineKind) -> Option<Duration> {
        let secs = match engine {
            EngineKind::FullLoad => self.full_load_timeout_secs,
            EngineKind::Streaming => self.streaming_timeout_secs,
        };
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_between_runs_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataset {
    label: String,
    name: Option<String>,
    #[serde(alias = "url")]
    location: Option<String>,
    records: Option<u64>,
    bytes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    run: RunSettings,
    #[serde(default, rename = "dataset")]
    datasets: Vec<RawDataset>,
}

/// Resolved configuration: dataset registry plus run settings.
#[derive(Debug, Clone, Default)]
pub struct BenchConfig {
    pub registry: Registry,
    pub run: RunSettings,
    /// File the config was read from, forwarded to worker processes
    pub path: Option<PathBuf>,
}

impl BenchConfig {
    pub fn datasets(&self, labels: &[SizeLabel]) -> BenchResult<Vec<DatasetDescriptor>> {
        self.registry.select(labels)
    }
}

/// Parse a TOML config. Relative local dataset paths resolve against `base_dir`.
pub fn parse_bench_config(s: &str, base_dir: Option<&Path>) -> BenchResult<BenchConfig> {
    let raw: RawConfig = toml::from_str(s).map_err(|e| BenchError::Config(e.to_string()))?;
    let mut registry = Registry::default();
    for d in raw.datasets {
        let label: SizeLabel = d.label.parse()?;
        let mut descriptor = registry.get(label)?.clone();
        if let Some(name) = d.name {
            descriptor.name = name;
        }
        if let Some(location) = d.location {
            descriptor.location = match (DataLocation::parse(&location), base_dir) {
                (DataLocation::Local(p), Some(base)) if p.is_relative() => base.join(p).to_string_lossy().to_string(),
                _ => location,
            };
        }
        if let Some(records) = d.records {
            descriptor.approx_records = records;
        }
        if let Some(bytes) = d.bytes {
            descriptor.approx_bytes = bytes;
        }
        registry.upsert(descriptor);
    }
    if let Some(limit) = raw.run.streaming_memory_limit.as_deref() {
        if limit.trim().is_empty() || limit.contains('\'') {
            return Err(BenchError::Config(format!("invalid streaming_memory_limit '{limit}'")));
        }
    }
    Ok(BenchConfig { registry, run: raw.run, path: None })
}

/// Load the config file, or defaults when none is given.
pub fn load_bench_config(path: Option<&Path>) -> BenchResult<BenchConfig> {
    let Some(path) = path else {
        return Ok(BenchConfig::default());
    };
    let s = std::fs::read_to_string(path)
        .map_err(|e| BenchError::Config(format!("{}: {e}", path.display())))?;
    let mut cfg = parse_bench_config(&s, path.parent())?;
    cfg.path = Some(path.to_path_buf());
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = load_bench_config(None).unwrap();
        assert_eq!(cfg.registry, Registry::default());
        assert_eq!(cfg.run.timeout_for(EngineKind::FullLoad), Some(Duration::from_secs(600)));
        assert_eq!(cfg.run.timeout_for(EngineKind::Streaming), None);
        assert!(cfg.path.is_none());
    }

    #[test]
    fn test_dataset_override_and_relative_paths() {
        let s = r#"
[run]
pause_between_runs_ms = 0
memory_budget_bytes = 1048576

[[dataset]]
label = "small"
location = "data/small.csv"
records = 3

[[dataset]]
label = "large"
url = "https://mirror.example.com/large.csv"
"#;
        let cfg = parse_bench_config(s, Some(Path::new("/srv/demo"))).unwrap();
        let small = cfg.registry.get(SizeLabel::Small).unwrap();
        assert_eq!(small.location, "/srv/demo/data/small.csv");
        assert_eq!(small.approx_records, 3);
        assert_eq!(small.name, "Small");
        let large = cfg.registry.get(SizeLabel::Large).unwrap();
        assert_eq!(large.location, "https://mirror.example.com/large.csv");
        assert_eq!(cfg.run.pause(), Duration::ZERO);
        assert_eq!(cfg.run.memory_budget_bytes, Some(1_048_576));
        // untouched fields keep defaults
        assert_eq!(cfg.run.full_load_timeout_secs, 600);
    }

    #[test]
    fn test_unknown_label_in_config() {
        let s = "[[dataset]]\nlabel = \"gigantic\"\n";
        assert!(matches!(parse_bench_config(s, None), Err(BenchError::UnknownDataset(_))));
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_limits() {
        assert!(matches!(parse_bench_config("[run]\nretries = 3\n", None), Err(BenchError::Config(_))));
        let s = "[run]\nstreaming_memory_limit = \"1GB'; DROP\"\n";
        assert!(matches!(parse_bench_config(s, None), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_load_from_file_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "[run]\nprobe_timeout_secs = 2\n").unwrap();
        let cfg = load_bench_config(Some(&path)).unwrap();
        assert_eq!(cfg.run.probe_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.path.as_deref(), Some(path.as_path()));
        assert!(load_bench_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
