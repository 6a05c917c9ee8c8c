//! Access to dataset locations: remote `http(s)://` objects or local files.
//!
//! Provides the connectivity probe used as a pre-flight gate and the full-body
//! fetch used by the full-load engine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BenchError, BenchResult};

/// Where a dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Remote(String),
    Local(PathBuf),
}

impl DataLocation {
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataLocation::Remote(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            DataLocation::Local(PathBuf::from(path))
        } else {
            DataLocation::Local(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, DataLocation::Remote(_))
    }

    /// String form understood by DuckDB's `read_csv`.
    pub fn as_scan_target(&self) -> String {
        match self {
            DataLocation::Remote(url) => url.clone(),
            DataLocation::Local(p) => p.to_string_lossy().to_string(),
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLocation::Remote(url) => f.write_str(url),
            DataLocation::Local(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Result classification of a reachability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    Reachable,
    NetworkFailure { reason: String },
    AccessDenied { code: Option<u16> },
    NotFound,
    UnexpectedStatus { code: u16 },
}

impl ProbeStatus {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeStatus::Reachable)
    }

    pub fn from_http(code: StatusCode) -> Self {
        match code.as_u16() {
            200..=299 => ProbeStatus::Reachable,
            401 | 403 => ProbeStatus::AccessDenied { code: Some(code.as_u16()) },
            404 => ProbeStatus::NotFound,
            other => ProbeStatus::UnexpectedStatus { code: other },
        }
    }

    /// Advice shown when the probe aborts a demo.
    pub fn hint(&self) -> &'static str {
        match self {
            ProbeStatus::Reachable => "",
            ProbeStatus::NetworkFailure { .. } => "check the network connection, proxy settings and DNS",
            ProbeStatus::AccessDenied { .. } => "the object is not public; check bucket permissions",
            ProbeStatus::NotFound => "the dataset does not exist at this location; check the configured URL or path",
            ProbeStatus::UnexpectedStatus { .. } => "the storage endpoint returned an unexpected response; retry later",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Reachable => f.write_str("reachable"),
            ProbeStatus::NetworkFailure { reason } => write!(f, "network failure ({reason})"),
            ProbeStatus::AccessDenied { code: Some(c) } => write!(f, "access denied (HTTP {c})"),
            ProbeStatus::AccessDenied { code: None } => f.write_str("access denied"),
            ProbeStatus::NotFound => f.write_str("not found"),
            ProbeStatus::UnexpectedStatus { code } => write!(f, "unexpected status (HTTP {code})"),
        }
    }
}

/// Outcome of probing one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub location: String,
    pub status: ProbeStatus,
    pub http_status: Option<u16>,
    /// Full object size, if the endpoint told us
    pub size_bytes: Option<u64>,
    pub latency_ms: u128,
}

impl ProbeOutcome {
    /// Turn a failed probe into the fatal connectivity error.
    pub fn into_result(self) -> BenchResult<ProbeOutcome> {
        if self.status.is_reachable() {
            Ok(self)
        } else {
            Err(BenchError::Connectivity { location: self.location, status: self.status })
        }
    }
}

fn client(timeout: Option<Duration>) -> BenchResult<Client> {
    let mut builder = Client::builder().user_agent(concat!("bigdata-bench/", env!("CARGO_PKG_VERSION")));
    if let Some(t) = timeout {
        builder = builder.timeout(t).connect_timeout(t);
    }
    builder.build().map_err(|e| BenchError::Fetch(e.to_string()))
}

fn network_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

/// `bytes 0-0/12345` -> 12345
fn total_from_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next().and_then(|t| t.trim().parse().ok())
}

/// Lightweight reachability check: a one-byte ranged GET with a bounded timeout.
pub fn probe(location: &str, timeout: Duration) -> ProbeOutcome {
    let start = Instant::now();
    match DataLocation::parse(location) {
        DataLocation::Local(path) => {
            let (status, size_bytes) = probe_local(&path);
            ProbeOutcome {
                location: location.to_string(),
                status,
                http_status: None,
                size_bytes,
                latency_ms: start.elapsed().as_millis(),
            }
        }
        DataLocation::Remote(url) => {
            let response = client(Some(timeout)).and_then(|c| {
                c.get(&url).header(RANGE, "bytes=0-0").send().map_err(|e| BenchError::Fetch(network_reason(&e)))
            });
            let outcome = match response {
                Ok(resp) => {
                    let code = resp.status();
                    let size_bytes = resp
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(total_from_content_range)
                        .or_else(|| {
                            if code == StatusCode::OK { resp.content_length() } else { None }
                        });
                    (ProbeStatus::from_http(code), Some(code.as_u16()), size_bytes)
                }
                Err(BenchError::Fetch(reason)) => (ProbeStatus::NetworkFailure { reason }, None, None),
                Err(e) => (ProbeStatus::NetworkFailure { reason: e.to_string() }, None, None),
            };
            debug!(%url, status = %outcome.0, "probe finished");
            ProbeOutcome {
                location: location.to_string(),
                status: outcome.0,
                http_status: outcome.1,
                size_bytes: outcome.2,
                latency_ms: start.elapsed().as_millis(),
            }
        }
    }
}

fn probe_local(path: &Path) -> (ProbeStatus, Option<u64>) {
    match std::fs::File::open(path).and_then(|f| f.metadata()) {
        Ok(meta) if meta.is_file() => (ProbeStatus::Reachable, Some(meta.len())),
        Ok(_) => (ProbeStatus::NotFound, None),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => (ProbeStatus::NotFound, None),
            std::io::ErrorKind::PermissionDenied => (ProbeStatus::AccessDenied { code: None }, None),
            _ => (ProbeStatus::NetworkFailure { reason: e.to_string() }, None),
        },
    }
}

/// Open a remote location for a full download; returns the response and its declared length.
pub fn open_remote(url: &str) -> BenchResult<(reqwest::blocking::Response, Option<u64>)> {
    let resp = client(None)?.get(url).send().map_err(|e| BenchError::Fetch(network_reason(&e)))?;
    let code = resp.status();
    if !code.is_success() {
        return Err(BenchError::Fetch(format!("{url}: {}", ProbeStatus::from_http(code))));
    }
    let declared = resp
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    Ok((resp, declared))
}
