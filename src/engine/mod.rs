//! Engine module: the two aggregation strategies under comparison.
//!
//! # Architecture
//!
//! - **Engine**: runs the fixed aggregation (min / mean / max / count of
//!   temperature per station, ordered by station) against one dataset.
//!   Implementations: `FullLoadEngine` (whole dataset materialized as an in-memory
//!   table) and `StreamingEngine` (DuckDB SQL scan), plus `MockEngine` for tests.
//!
//! - Timing, memory sampling and failure capture live in `crate::bench`, not here:
//!   an engine only returns `EngineOutput` or an error.

pub mod full_load;
pub mod mock;
pub mod streaming;
pub mod traits;

use std::sync::Arc;

use crate::bench::config::RunSettings;
use crate::core::schema::EngineKind;

// Re-export key types
pub use full_load::FullLoadEngine;
pub use mock::{MockConfig, MockEngine};
pub use streaming::StreamingEngine;
pub use traits::{Engine, EngineOutput};

/// Build the real engine for `kind` from run settings.
pub fn build(kind: EngineKind, settings: &RunSettings) -> Arc<dyn Engine> {
    match kind {
        EngineKind::FullLoad => {
            let budget = settings.memory_budget_bytes.unwrap_or_else(crate::available_memory_bytes);
            Arc::new(FullLoadEngine::new(Some(budget)))
        }
        EngineKind::Streaming => Arc::new(StreamingEngine::new(settings.streaming_memory_limit.clone())),
    }
}
