//! Engine trait and output type.

use std::time::Duration;

use crate::BenchResult;
use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, StationStats};

/// Output from one aggregation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// Aggregated rows ordered by station
    pub stations: Vec<StationStats>,
    /// Input records processed
    pub records: u64,
    /// Time spent materializing the input, if the engine has a separate load phase
    pub load_time: Option<Duration>,
}

impl EngineOutput {
    pub fn new(stations: Vec<StationStats>) -> Self {
        let records = stations.iter().map(|s| s.count).sum();
        EngineOutput { stations, records, load_time: None }
    }
}

/// An aggregation strategy.
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Short description of the implementation (e.g., "duckdb").
    fn name(&self) -> &str;

    /// Run the station aggregation against a dataset.
    ///
    /// # Errors
    /// `BenchError::OutOfMemory` when the memory budget would be exceeded,
    /// `BenchError::Fetch` / `BenchError::Execution` for I/O and engine failures.
    fn run(&self, dataset: &DatasetDescriptor) -> BenchResult<EngineOutput>;
}
