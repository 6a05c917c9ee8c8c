//! Dataset registry: the fixed small / medium / large CSV datasets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BenchError, BenchResult};

/// Size label of a dataset. Ordering follows dataset size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SizeLabel {
    Small,
    Medium,
    Large,
}

impl SizeLabel {
    pub const ALL: [SizeLabel; 3] = [SizeLabel::Small, SizeLabel::Medium, SizeLabel::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeLabel::Small => "small",
            SizeLabel::Medium => "medium",
            SizeLabel::Large => "large",
        }
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeLabel {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(SizeLabel::Small),
            "medium" => Ok(SizeLabel::Medium),
            "large" => Ok(SizeLabel::Large),
            _ => Err(BenchError::UnknownDataset(s.to_string())),
        }
    }
}

/// Static description of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub label: SizeLabel,
    /// Display name used in tables
    pub name: String,
    /// `http(s)://` URL or a local path
    pub location: String,
    pub approx_records: u64,
    pub approx_bytes: u64,
}

impl DatasetDescriptor {
    /// Heading used by the demos, e.g. `Small (100K records)`.
    pub fn description(&self) -> String {
        format!("{} ({} records)", self.name, short_count(self.approx_records))
    }
}

fn short_count(n: u64) -> String {
    if n >= 1_000_000 && n % 1_000_000 == 0 {
        format!("{}M", n / 1_000_000)
    } else if n >= 1_000 && n % 1_000 == 0 {
        format!("{}K", n / 1_000)
    } else {
        n.to_string()
    }
}

const BASE_URL: &str = "https://storage.googleapis.com/bigdata2025/duckdb";

/// Lookup from size label to descriptor. Iteration is always small, medium, large.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    datasets: Vec<DatasetDescriptor>,
}

impl Default for Registry {
    fn default() -> Self {
        let entry = |label: SizeLabel, name: &str, records: u64, bytes: u64| DatasetDescriptor {
            label,
            name: name.to_string(),
            location: format!("{BASE_URL}/{}_dataset.csv", label.as_str()),
            approx_records: records,
            approx_bytes: bytes,
        };
        Registry {
            datasets: vec![
                entry(SizeLabel::Small, "Small", 100_000, 2_000_000),
                entry(SizeLabel::Medium, "Medium", 10_000_000, 200_000_000),
                entry(SizeLabel::Large, "Large", 100_000_000, 2_000_000_000),
            ],
        }
    }
}

impl Registry {
    pub fn get(&self, label: SizeLabel) -> BenchResult<&DatasetDescriptor> {
        self.datasets
            .iter()
            .find(|d| d.label == label)
            .ok_or_else(|| BenchError::UnknownDataset(label.to_string()))
    }

    /// Resolve a user-supplied label string.
    pub fn lookup(&self, label: &str) -> BenchResult<&DatasetDescriptor> {
        self.get(label.parse()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.datasets.iter()
    }

    /// Descriptors for the requested labels in ascending size order; empty selects all.
    pub fn select(&self, labels: &[SizeLabel]) -> BenchResult<Vec<DatasetDescriptor>> {
        if labels.is_empty() {
            return Ok(self.datasets.clone());
        }
        let mut wanted = labels.to_vec();
        wanted.sort();
        wanted.dedup();
        wanted.into_iter().map(|l| self.get(l).cloned()).collect()
    }

    /// Replace the descriptor with the same label.
    pub fn upsert(&mut self, descriptor: DatasetDescriptor) {
        match self.datasets.iter_mut().find(|d| d.label == descriptor.label) {
            Some(slot) => *slot = descriptor,
            None => {
                self.datasets.push(descriptor);
                self.datasets.sort_by_key(|d| d.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_is_ordered() {
        let reg = Registry::default();
        let labels: Vec<SizeLabel> = reg.iter().map(|d| d.label).collect();
        assert_eq!(labels, SizeLabel::ALL.to_vec());
        assert_eq!(
            reg.get(SizeLabel::Medium).unwrap().location,
            "https://storage.googleapis.com/bigdata2025/duckdb/medium_dataset.csv"
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let reg = Registry::default();
        assert_eq!(reg.lookup("LARGE").unwrap().approx_records, 100_000_000);
        assert_eq!(reg.lookup(" small ").unwrap().name, "Small");
    }

    #[test]
    fn test_unknown_label_fails_fast() {
        let reg = Registry::default();
        let err = reg.lookup("huge").unwrap_err();
        assert!(matches!(err, BenchError::UnknownDataset(ref l) if l == "huge"));
        assert!(err.to_string().contains("small, medium, large"));
    }

    #[test]
    fn test_select_sorts_and_dedups() {
        let reg = Registry::default();
        let picked = reg.select(&[SizeLabel::Large, SizeLabel::Small, SizeLabel::Large]).unwrap();
        let labels: Vec<SizeLabel> = picked.iter().map(|d| d.label).collect();
        assert_eq!(labels, vec![SizeLabel::Small, SizeLabel::Large]);
        assert_eq!(reg.select(&[]).unwrap().len(), 3);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut reg = Registry::default();
        let mut d = reg.get(SizeLabel::Medium).unwrap().clone();
        d.location = "data/medium.csv".into();
        reg.upsert(d);
        assert_eq!(reg.iter().count(), 3);
        assert_eq!(reg.get(SizeLabel::Medium).unwrap().location, "data/medium.csv");
        let labels: Vec<SizeLabel> = reg.iter().map(|d| d.label).collect();
        assert_eq!(labels, SizeLabel::ALL.to_vec());
    }

    #[test]
    fn test_description() {
        let reg = Registry::default();
        assert_eq!(reg.get(SizeLabel::Small).unwrap().description(), "Small (100K records)");
        assert_eq!(reg.get(SizeLabel::Large).unwrap().description(), "Large (100M records)");
    }
}
