//! Measurement harness shared by every demo command.
//!
//! - `config`: dataset overrides and run settings loaded from TOML
//! - `measure`: wall-clock timing, RSS sampling, in-process failure capture
//! - `runner`: in-process or subprocess-isolated execution of one engine run

pub mod config;
pub mod measure;
pub mod runner;

pub use config::{BenchConfig, RunSettings, load_bench_config, parse_bench_config};
pub use measure::{MemorySampler, MemoryUsage, measure_in_process};
pub use runner::{Isolation, MeasurementSource, Runner};

use crate::core::dataset::SizeLabel;

/// Command-line options shared by the demo commands.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    /// Datasets to run; empty selects all
    pub datasets: Vec<SizeLabel>,
    pub skip_probe: bool,
    pub in_process: bool,
}

impl DemoOptions {
    pub fn isolation(&self) -> crate::BenchResult<Isolation> {
        if self.in_process { Ok(Isolation::InProcess) } else { Isolation::current_exe() }
    }
}
