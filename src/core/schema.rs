//! Measurement schema - the outcome of one (dataset, engine) run.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dataset::SizeLabel;
use crate::BenchError;

/// Number of result rows kept on a Measurement for display.
pub const TOP_STATIONS: usize = 10;

/// Processing strategy under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Load the full dataset into memory, then aggregate
    FullLoad,
    /// Aggregate with an out-of-core SQL scan
    Streaming,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::FullLoad => "full-load",
            EngineKind::Streaming => "streaming",
        }
    }

    /// Column heading used in tables
    pub fn title(&self) -> &'static str {
        match self {
            EngineKind::FullLoad => "Full-load",
            EngineKind::Streaming => "Streaming",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated temperatures for one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStats {
    pub station: String,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    OutOfMemory,
    Timeout,
    Crashed,
    Execution,
}

impl FailureKind {
    /// Text substituted for a failed time cell.
    pub fn cell(&self) -> &'static str {
        match self {
            FailureKind::OutOfMemory => "OUT OF MEMORY",
            _ => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Failure { kind, message: message.into() }
    }
}

impl From<&BenchError> for Failure {
    fn from(e: &BenchError) -> Self {
        let kind = match e {
            BenchError::OutOfMemory { .. } => FailureKind::OutOfMemory,
            BenchError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Execution,
        };
        Failure::new(kind, e.to_string())
    }
}

/// Recorded outcome of one engine run against one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub dataset: SizeLabel,
    pub engine: EngineKind,
    pub timestamp: String,
    /// Wall-clock seconds for the whole run
    pub elapsed_secs: f64,
    /// Seconds spent materializing the data (full load only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_secs: Option<f64>,
    /// Resident memory when the run started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_memory_bytes: Option<u64>,
    /// Peak resident memory above the run's baseline
    pub peak_memory_bytes: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stations: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_stations: Vec<StationStats>,
}

impl Measurement {
    pub fn failed(
        dataset: SizeLabel,
        engine: EngineKind,
        elapsed_secs: f64,
        peak_memory_bytes: u64,
        failure: Failure,
    ) -> Self {
        Measurement {
            dataset,
            engine,
            timestamp: crate::now_string(),
            elapsed_secs: elapsed_secs.max(0.0),
            load_secs: None,
            baseline_memory_bytes: None,
            peak_memory_bytes,
            success: false,
            failure: Some(failure),
            records: None,
            stations: None,
            top_stations: Vec::new(),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}
