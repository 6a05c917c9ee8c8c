//! Streaming engine: one DuckDB SQL query over the CSV, scanned out-of-core.

use duckdb::Connection;
use tracing::{debug, info};

use crate::BenchResult;
use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, StationStats};
use crate::source::DataLocation;

use super::traits::{Engine, EngineOutput};

pub struct StreamingEngine {
    memory_limit: Option<String>,
}

/// Quote a value as a SQL string literal.
fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// The aggregation query for a scan target (URL or file path).
pub fn aggregation_query(target: &str) -> String {
    format!(
        "SELECT station, \
                MIN(temperature) AS min_temp, \
                AVG(temperature) AS mean_temp, \
                MAX(temperature) AS max_temp, \
                COUNT(*) AS record_count \
         FROM (SELECT COALESCE(station, '') AS station, temperature \
               FROM read_csv({}, header = false, \
                             columns = {{'station': 'VARCHAR', 'temperature': 'DOUBLE'}}, \
                             delim = ';')) \
         GROUP BY station \
         ORDER BY station",
        sql_literal(target)
    )
}

impl StreamingEngine {
    pub fn new(memory_limit: Option<String>) -> Self {
        StreamingEngine { memory_limit }
    }

    fn connect(&self, location: &DataLocation) -> BenchResult<Connection> {
        let conn = Connection::open_in_memory()?;
        if location.is_remote() {
            debug!("loading httpfs");
            conn.execute_batch("INSTALL httpfs; LOAD httpfs;")?;
        }
        if let Some(limit) = &self.memory_limit {
            conn.execute_batch(&format!("SET memory_limit = {};", sql_literal(limit)))?;
        }
        Ok(conn)
    }
}

impl Engine for StreamingEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Streaming
    }

    fn name(&self) -> &str {
        "duckdb"
    }

    fn run(&self, dataset: &DatasetDescriptor) -> BenchResult<EngineOutput> {
        let location = DataLocation::parse(&dataset.location);
        let conn = self.connect(&location)?;
        let query = aggregation_query(&location.as_scan_target());
        debug!(%query, "executing");

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok(StationStats {
                station: row.get(0)?,
                min: row.get(1)?,
                mean: row.get(2)?,
                max: row.get(3)?,
                count: row.get::<_, i64>(4)?.max(0) as u64,
            })
        })?;
        let stations = rows.collect::<Result<Vec<_>, _>>()?;
        let output = EngineOutput::new(stations);
        info!(records = output.records, stations = output.stations.len(), "query finished");
        Ok(output)
    }
}
