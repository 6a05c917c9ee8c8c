pub mod analyze_cmd;
pub mod bench;
pub mod compare_cmd;
pub mod core;
pub mod engine;
pub mod guided_cmd;
pub mod probe_cmd;
pub mod report;
pub mod source;
pub mod worker_cmd;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export key types
pub use crate::core::dataset::{DatasetDescriptor, Registry, SizeLabel};
pub use crate::core::schema::{EngineKind, Failure, FailureKind, Measurement, StationStats};
pub use crate::source::{ProbeOutcome, ProbeStatus};

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("{0}")]
    Message(String),
    #[error("unknown dataset label '{0}' (expected one of: small, medium, large)")]
    UnknownDataset(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{location} is not usable: {status}")]
    Connectivity { location: String, status: ProbeStatus },
    #[error("out of memory: need about {needed_bytes} bytes but the budget is {budget_bytes} bytes")]
    OutOfMemory { needed_bytes: u64, budget_bytes: u64 },
    #[error("run exceeded the {0:?} wall-clock guard")]
    Timeout(Duration),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("execution failed: {0}")]
    Execution(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

impl From<reqwest::Error> for BenchError {
    fn from(e: reqwest::Error) -> Self {
        BenchError::Fetch(e.to_string())
    }
}

impl From<polars::prelude::PolarsError> for BenchError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        BenchError::Execution(format!("polars: {e}"))
    }
}

impl From<duckdb::Error> for BenchError {
    fn from(e: duckdb::Error) -> Self {
        BenchError::Execution(format!("duckdb: {e}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemInfo {
    pub cpu_model: Option<String>,
    pub cpu_cores_logical: Option<usize>,
    pub cpu_cores_physical: Option<usize>,
    pub total_ram_bytes: Option<u64>,
    pub available_ram_bytes: Option<u64>,
    pub os: Option<String>,
}

// Shared helpers
pub fn collect_system_info() -> SystemInfo {
    use sysinfo::System;
    let mut sys = System::new_all();
    sys.refresh_all();
    let cpu_model = sys.cpus().first().map(|c| c.brand().to_string());
    let cpu_cores_logical = Some(sys.cpus().len());
    let cpu_cores_physical = sys.physical_core_count();
    let total_ram_bytes = Some(sys.total_memory());
    let available_ram_bytes = Some(sys.available_memory());
    let os = System::name();
    SystemInfo { cpu_model, cpu_cores_logical, cpu_cores_physical, total_ram_bytes, available_ram_bytes, os }
}

/// Available system memory right now, in bytes.
pub fn available_memory_bytes() -> u64 {
    use sysinfo::{MemoryRefreshKind, RefreshKind, System};
    let mut sys = System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()));
    sys.refresh_memory();
    sys.available_memory()
}

pub fn now_string() -> String {
    time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".to_string())
}
