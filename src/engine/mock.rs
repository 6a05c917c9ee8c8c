//! Mock engine for testing.

use std::time::Duration;

use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, StationStats};
use crate::{BenchError, BenchResult};

use super::traits::{Engine, EngineOutput};

/// How the mock should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    OutOfMemory,
    Execution,
}

/// Configuration for mock engine responses.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub kind: EngineKind,
    /// Rows to return
    pub stations: Vec<StationStats>,
    /// Sleep before answering
    pub delay: Duration,
    /// Fail on these dataset names
    pub fail_on: Vec<String>,
    pub failure: MockFailure,
}

impl MockConfig {
    pub fn new(kind: EngineKind) -> Self {
        MockConfig {
            kind,
            stations: vec![
                StationStats { station: "Hamburg".into(), min: -3.0, mean: 9.5, max: 22.0, count: 60 },
                StationStats { station: "Tunis".into(), min: 8.0, mean: 19.0, max: 35.0, count: 40 },
            ],
            delay: Duration::ZERO,
            fail_on: Vec::new(),
            failure: MockFailure::Execution,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make runs against `dataset_name` fail.
    pub fn fails_on(mut self, dataset_name: impl Into<String>, failure: MockFailure) -> Self {
        self.fail_on.push(dataset_name.into());
        self.failure = failure;
        self
    }
}

/// Mock engine returning configurable results without reading any data.
pub struct MockEngine {
    config: MockConfig,
}

impl MockEngine {
    pub fn new(config: MockConfig) -> Self {
        MockEngine { config }
    }
}

impl Engine for MockEngine {
    fn kind(&self) -> EngineKind {
        self.config.kind
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn run(&self, dataset: &DatasetDescriptor) -> BenchResult<EngineOutput> {
        if !self.config.delay.is_zero() {
            std::thread::sleep(self.config.delay);
        }
        if self.config.fail_on.contains(&dataset.name) {
            return Err(match self.config.failure {
                MockFailure::OutOfMemory => BenchError::OutOfMemory {
                    needed_bytes: dataset.approx_bytes,
                    budget_bytes: 0,
                },
                MockFailure::Execution => BenchError::Execution("mock run failed".into()),
            });
        }
        Ok(EngineOutput::new(self.config.stations.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{Registry, SizeLabel};

    #[test]
    fn test_mock_engine_success_and_failure() {
        let reg = Registry::default();
        let engine = MockEngine::new(MockConfig::new(EngineKind::FullLoad).fails_on("Large", MockFailure::OutOfMemory));
        let out = engine.run(reg.get(SizeLabel::Small).unwrap()).unwrap();
        assert_eq!(out.records, 100);
        let err = engine.run(reg.get(SizeLabel::Large).unwrap()).unwrap_err();
        assert!(matches!(err, BenchError::OutOfMemory { .. }));
    }
}
