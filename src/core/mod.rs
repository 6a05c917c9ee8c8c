//! Core types for bigdata-bench.
//!
//! This module contains the dataset registry and the `Measurement` schema shared by
//! every engine, the orchestrator and the worker protocol.

pub mod dataset;
pub mod schema;

// Re-export key types for convenience
pub use dataset::{DatasetDescriptor, Registry, SizeLabel};
pub use schema::{EngineKind, Failure, FailureKind, Measurement, StationStats};
