//! Full-load engine: download everything, parse it into a polars DataFrame,
//! then aggregate.

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use tracing::{debug, info};

use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, StationStats};
use crate::source::{self, DataLocation};
use crate::{BenchError, BenchResult};

use super::traits::{Engine, EngineOutput};

/// Rough ratio of resident bytes to raw CSV bytes while the raw body and the
/// parsed table are both alive.
pub const ESTIMATED_EXPANSION: u64 = 3;

fn measurement_schema() -> Schema {
    let mut schema = Schema::default();
    schema.with_column("station".into(), DataType::String);
    schema.with_column("temperature".into(), DataType::Float64);
    schema
}

/// Parse headerless `station;temperature` lines into a two-column table.
pub fn load_table(body: Vec<u8>) -> BenchResult<DataFrame> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(DataFrame::empty_with_schema(&measurement_schema()));
    }
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(Arc::new(measurement_schema())))
        .map_parse_options(|opts| opts.with_separator(b';'))
        .into_reader_with_file_handle(Cursor::new(body))
        .finish()?;
    let missing = df.column("temperature")?.null_count();
    if missing > 0 {
        return Err(BenchError::Execution(format!("{missing} rows without a temperature")));
    }
    Ok(df)
}

/// Group by station: min, mean, max and count, ordered by station. A missing
/// station name groups under the empty string.
pub fn aggregate(df: DataFrame) -> BenchResult<Vec<StationStats>> {
    let out = df
        .lazy()
        .with_column(col("station").fill_null(lit("")))
        .group_by([col("station")])
        .agg([
            col("temperature").min().alias("min"),
            col("temperature").mean().alias("mean"),
            col("temperature").max().alias("max"),
            len().cast(DataType::UInt64).alias("count"),
        ])
        .sort(["station"], SortMultipleOptions::default())
        .collect()?;

    let stations = out.column("station")?.str()?;
    let min = out.column("min")?.f64()?;
    let mean = out.column("mean")?.f64()?;
    let max = out.column("max")?.f64()?;
    let count = out.column("count")?.u64()?;
    let rows = stations
        .into_iter()
        .zip(min)
        .zip(mean)
        .zip(max)
        .zip(count)
        .map(|((((station, min), mean), max), count)| StationStats {
            station: station.unwrap_or_default().to_string(),
            min: min.unwrap_or(f64::NAN),
            mean: mean.unwrap_or(f64::NAN),
            max: max.unwrap_or(f64::NAN),
            count: count.unwrap_or(0),
        })
        .collect();
    Ok(rows)
}

pub struct FullLoadEngine {
    budget_bytes: Option<u64>,
}

impl FullLoadEngine {
    /// `budget_bytes` of `None` disables the best-effort memory checks.
    pub fn new(budget_bytes: Option<u64>) -> Self {
        FullLoadEngine { budget_bytes }
    }

    fn precheck(&self, declared_bytes: Option<u64>) -> BenchResult<()> {
        if let (Some(declared), Some(budget)) = (declared_bytes, self.budget_bytes) {
            let needed = declared.saturating_mul(ESTIMATED_EXPANSION);
            if needed > budget {
                return Err(BenchError::OutOfMemory { needed_bytes: needed, budget_bytes: budget });
            }
        }
        Ok(())
    }

    /// Read the whole resource into one buffer.
    fn fetch(&self, location: &DataLocation) -> BenchResult<Vec<u8>> {
        let (mut reader, declared): (Box<dyn Read>, Option<u64>) = match location {
            DataLocation::Remote(url) => {
                let (resp, declared) = source::open_remote(url)?;
                (Box::new(resp), declared)
            }
            DataLocation::Local(path) => {
                let file = std::fs::File::open(path)
                    .map_err(|e| BenchError::Fetch(format!("{}: {e}", path.display())))?;
                let len = file.metadata().ok().map(|m| m.len());
                (Box::new(file), len)
            }
        };
        debug!(declared_bytes = ?declared, budget_bytes = ?self.budget_bytes, "fetching full dataset");
        self.precheck(declared)?;
        let mut body = Vec::with_capacity(declared.unwrap_or(0).min(usize::MAX as u64) as usize);
        reader
            .read_to_end(&mut body)
            .map_err(|e| BenchError::Fetch(format!("{location}: {e}")))?;
        if let Some(budget) = self.budget_bytes {
            if body.len() as u64 > budget {
                return Err(BenchError::OutOfMemory { needed_bytes: body.len() as u64, budget_bytes: budget });
            }
        }
        Ok(body)
    }
}

impl Engine for FullLoadEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::FullLoad
    }

    fn name(&self) -> &str {
        "polars"
    }

    fn run(&self, dataset: &DatasetDescriptor) -> BenchResult<EngineOutput> {
        let location = DataLocation::parse(&dataset.location);
        let load_start = Instant::now();
        let body = self.fetch(&location)?;
        let remaining = self.budget_bytes.map(|b| b.saturating_sub(body.len() as u64));
        let df = load_table(body)?;
        let table_bytes = df.estimated_size() as u64;
        if let Some(budget) = remaining {
            if table_bytes > budget {
                return Err(BenchError::OutOfMemory { needed_bytes: table_bytes, budget_bytes: budget });
            }
        }
        let load_time = load_start.elapsed();
        let records = df.height() as u64;
        info!(rows = records, table_bytes, ?load_time, "dataset loaded");

        let agg_start = Instant::now();
        let stations = aggregate(df)?;
        debug!(stations = stations.len(), agg_time = ?agg_start.elapsed(), "aggregation finished");

        Ok(EngineOutput { stations, records, load_time: Some(load_time) })
    }
}
