//! Timing and resident-memory measurement around a single engine run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{info, info_span, warn};

use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, Failure, FailureKind, Measurement, TOP_STATIONS};
use crate::engine::{Engine, EngineOutput};
use crate::BenchError;

/// Interval between RSS samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(20);

#[cfg(feature = "mem")]
mod rss {
    use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

    pub struct RssProbe {
        sys: System,
        pid: Pid,
    }

    impl RssProbe {
        pub fn new(pid: u32) -> Self {
            let sys = System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new().with_memory()));
            RssProbe { sys, pid: Pid::from_u32(pid) }
        }

        /// Current resident set size in bytes, if the process is still visible.
        pub fn sample(&mut self) -> Option<u64> {
            if !self.sys.refresh_process_specifics(self.pid, ProcessRefreshKind::new().with_memory()) {
                return None;
            }
            self.sys.process(self.pid).map(|p| p.memory())
        }
    }
}

#[cfg(not(feature = "mem"))]
mod rss {
    pub struct RssProbe;

    impl RssProbe {
        pub fn new(_pid: u32) -> Self { RssProbe }
        pub fn sample(&mut self) -> Option<u64> { None }
    }
}

pub use rss::RssProbe;

/// Baseline and peak resident memory of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub baseline_bytes: u64,
    pub peak_bytes: u64,
}

impl MemoryUsage {
    /// Peak growth over the baseline.
    pub fn increase(&self) -> u64 {
        self.peak_bytes.saturating_sub(self.baseline_bytes)
    }
}

/// Background thread polling a process's RSS and keeping the maximum.
pub struct MemorySampler {
    stop: Arc<AtomicBool>,
    peak: Arc<AtomicU64>,
    baseline: u64,
    handle: Option<JoinHandle<()>>,
}

impl MemorySampler {
    pub fn start(pid: u32) -> Self {
        let mut probe = RssProbe::new(pid);
        let baseline = probe.sample().unwrap_or(0);
        let stop = Arc::new(AtomicBool::new(false));
        let peak = Arc::new(AtomicU64::new(baseline));
        let handle = {
            let stop = stop.clone();
            let peak = peak.clone();
            std::thread::Builder::new()
                .name("rss-sampler".into())
                .spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        if let Some(rss) = probe.sample() {
                            peak.fetch_max(rss, Ordering::Relaxed);
                        }
                        std::thread::sleep(SAMPLE_INTERVAL);
                    }
                    if let Some(rss) = probe.sample() {
                        peak.fetch_max(rss, Ordering::Relaxed);
                    }
                })
                .ok()
        };
        MemorySampler { stop, peak, baseline, handle }
    }

    pub fn start_current() -> Self {
        Self::start(std::process::id())
    }

    pub fn peak_bytes(&self) -> u64 {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn finish(mut self) -> MemoryUsage {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
        MemoryUsage { baseline_bytes: self.baseline, peak_bytes: self.peak_bytes() }
    }
}

impl Drop for MemorySampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "engine panicked".to_string())
}

fn run_caught(engine: &dyn Engine, dataset: &DatasetDescriptor) -> Result<EngineOutput, Failure> {
    match catch_unwind(AssertUnwindSafe(|| engine.run(dataset))) {
        Ok(Ok(out)) => Ok(out),
        Ok(Err(e)) => Err(Failure::from(&e)),
        Err(payload) => Err(Failure::new(FailureKind::Crashed, panic_message(payload))),
    }
}

/// Run on a helper thread and stop waiting after `limit`. The thread is
/// abandoned on timeout; it cannot be cancelled.
fn run_with_deadline(engine: Arc<dyn Engine>, dataset: &DatasetDescriptor, limit: Duration) -> Result<EngineOutput, Failure> {
    let (tx, rx) = mpsc::channel();
    let ds = dataset.clone();
    std::thread::Builder::new()
        .name(format!("{}-run", engine.kind()))
        .spawn(move || {
            let _ = tx.send(run_caught(engine.as_ref(), &ds));
        })
        .map_err(|e| Failure::new(FailureKind::Execution, format!("failed to spawn engine thread: {e}")))?;
    match rx.recv_timeout(limit) {
        Ok(res) => res,
        Err(RecvTimeoutError::Timeout) => {
            warn!(?limit, "engine run exceeded its wall-clock guard; abandoning it");
            Err(Failure::from(&BenchError::Timeout(limit)))
        }
        Err(RecvTimeoutError::Disconnected) => Err(Failure::new(FailureKind::Crashed, "engine thread exited without a result")),
    }
}

/// Build the Measurement for a finished run.
pub fn to_measurement(
    dataset: &DatasetDescriptor,
    engine: EngineKind,
    result: Result<EngineOutput, Failure>,
    elapsed: Duration,
    usage: MemoryUsage,
) -> Measurement {
    let peak_memory_bytes = usage.increase();
    let baseline = (usage.baseline_bytes > 0).then_some(usage.baseline_bytes);
    let mut m = match result {
        Ok(out) => Measurement {
            dataset: dataset.label,
            engine,
            timestamp: crate::now_string(),
            elapsed_secs: elapsed.as_secs_f64(),
            load_secs: out.load_time.map(|d| d.as_secs_f64()),
            baseline_memory_bytes: None,
            peak_memory_bytes,
            success: true,
            failure: None,
            records: Some(out.records),
            stations: Some(out.stations.len()),
            top_stations: out.stations.into_iter().take(TOP_STATIONS).collect(),
        },
        Err(failure) => Measurement::failed(dataset.label, engine, elapsed.as_secs_f64(), peak_memory_bytes, failure),
    };
    m.baseline_memory_bytes = baseline;
    m
}

/// Measure one run inside the current process.
///
/// Failures of any kind (errors, panics, the optional wall-clock guard) are
/// recorded on the returned Measurement rather than propagated.
pub fn measure_in_process(engine: Arc<dyn Engine>, dataset: &DatasetDescriptor, timeout: Option<Duration>) -> Measurement {
    let kind = engine.kind();
    let span = info_span!("engine_run", engine = %kind, name = engine.name(), dataset = %dataset.label);
    let _enter = span.enter();

    let sampler = MemorySampler::start_current();
    let start = Instant::now();
    let result = match timeout {
        Some(limit) => run_with_deadline(engine, dataset, limit),
        None => run_caught(engine.as_ref(), dataset),
    };
    let elapsed = start.elapsed();
    let usage = sampler.finish();

    let m = to_measurement(dataset, kind, result, elapsed, usage);
    info!(success = m.success, elapsed_secs = m.elapsed_secs, peak_memory_bytes = m.peak_memory_bytes, "run measured");
    m
}
