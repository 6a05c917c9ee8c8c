//! Executes engine runs, either in-process or isolated in a worker subprocess.
//!
//! Isolation is what makes out-of-memory survivable: when the operating system
//! kills the worker, or the allocator aborts it, the orchestrator classifies the
//! exit and records a failed Measurement instead of dying with it.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn};

use super::config::BenchConfig;
use super::measure::{self, RssProbe};
use crate::core::dataset::DatasetDescriptor;
use crate::core::schema::{EngineKind, Failure, FailureKind, Measurement};
use crate::engine;
use crate::{BenchError, BenchResult};

/// Anything that can produce a Measurement for a (dataset, engine) pair.
pub trait MeasurementSource {
    fn measure(&self, engine: EngineKind, dataset: &DatasetDescriptor) -> Measurement;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Isolation {
    /// Run engines on a thread of this process
    InProcess,
    /// Run each engine in `exe worker ...`
    Subprocess { exe: PathBuf },
}

impl Isolation {
    /// Subprocess isolation re-invoking the current executable.
    pub fn current_exe() -> BenchResult<Self> {
        Ok(Isolation::Subprocess { exe: std::env::current_exe()? })
    }
}

/// Default measurement source for the demos.
pub struct Runner {
    config: BenchConfig,
    isolation: Isolation,
}

impl Runner {
    pub fn new(config: BenchConfig, isolation: Isolation) -> Self {
        Runner { config, isolation }
    }

    fn worker_command(&self, exe: &Path, engine: EngineKind, dataset: &DatasetDescriptor) -> Command {
        let mut cmd = Command::new(exe);
        if let Some(cfg) = &self.config.path {
            cmd.arg("--config").arg(cfg);
        }
        cmd.arg("worker")
            .arg("--engine")
            .arg(engine.as_str())
            .arg("--dataset")
            .arg(dataset.label.as_str());
        if let Some(budget) = self.config.run.memory_budget_bytes {
            cmd.arg("--memory-budget").arg(budget.to_string());
        }
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::inherit());
        cmd
    }
}

impl MeasurementSource for Runner {
    fn measure(&self, engine: EngineKind, dataset: &DatasetDescriptor) -> Measurement {
        let timeout = self.config.run.timeout_for(engine);
        match &self.isolation {
            Isolation::InProcess => {
                let e = engine::build(engine, &self.config.run);
                measure::measure_in_process(e, dataset, timeout)
            }
            Isolation::Subprocess { exe } => {
                let span = info_span!("worker", engine = %engine, dataset = %dataset.label);
                let _enter = span.enter();
                let cmd = self.worker_command(exe, engine, dataset);
                run_worker(cmd, engine, dataset, timeout)
            }
        }
    }
}

/// What became of a worker process.
#[derive(Debug)]
enum WorkerExit {
    Exited(ExitStatus),
    TimedOut(Duration),
}

/// Spawn a worker, sample its RSS, enforce the wall-clock guard and turn
/// whatever happens into a Measurement.
pub fn run_worker(mut cmd: Command, engine: EngineKind, dataset: &DatasetDescriptor, timeout: Option<Duration>) -> Measurement {
    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            return Measurement::failed(
                dataset.label,
                engine,
                0.0,
                0,
                Failure::new(FailureKind::Crashed, format!("failed to start worker: {e}")),
            );
        }
    };
    debug!(pid = child.id(), "worker started");

    // Drain stdout on a thread so a chatty worker can never block on a full pipe.
    let reader = child.stdout.take().map(|mut out| {
        std::thread::spawn(move || {
            let mut s = String::new();
            let _ = out.read_to_string(&mut s);
            s
        })
    });

    let mut probe = RssProbe::new(child.id());
    let mut first_rss: Option<u64> = None;
    let mut peak_rss: u64 = 0;
    let exit = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Ok(WorkerExit::Exited(status)),
            Ok(None) => {}
            Err(e) => break Err(e),
        }
        if let Some(limit) = timeout {
            if start.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                break Ok(WorkerExit::TimedOut(limit));
            }
        }
        if let Some(rss) = probe.sample() {
            first_rss.get_or_insert(rss);
            peak_rss = peak_rss.max(rss);
        }
        std::thread::sleep(measure::SAMPLE_INTERVAL);
    };
    let elapsed = start.elapsed();
    let stdout = reader.and_then(|h| h.join().ok()).unwrap_or_default();
    let observed = peak_rss.saturating_sub(first_rss.unwrap_or(0));

    let failed = |failure: Failure| {
        warn!(kind = ?failure.kind, message = %failure.message, "worker run failed");
        let mut m = Measurement::failed(dataset.label, engine, elapsed.as_secs_f64(), observed, failure);
        m.baseline_memory_bytes = first_rss;
        m
    };

    match exit {
        Err(e) => failed(Failure::new(FailureKind::Crashed, format!("lost track of worker: {e}"))),
        Ok(WorkerExit::TimedOut(limit)) => failed(Failure::from(&BenchError::Timeout(limit))),
        Ok(WorkerExit::Exited(status)) if status.success() => match parse_worker_output(&stdout) {
            Ok(m) => {
                info!(success = m.success, elapsed_secs = m.elapsed_secs, "worker finished");
                m
            }
            Err(e) => failed(Failure::new(FailureKind::Crashed, e.to_string())),
        },
        Ok(WorkerExit::Exited(status)) => failed(classify_exit(status)),
    }
}

/// The worker prints exactly one JSON Measurement; take the last non-empty line.
pub fn parse_worker_output(stdout: &str) -> BenchResult<Measurement> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| BenchError::Message("worker produced no output".into()))?;
    serde_json::from_str(line).map_err(|e| BenchError::Message(format!("unreadable worker output: {e}")))
}

/// Map an abnormal worker exit to a failure.
pub fn classify_exit(status: ExitStatus) -> Failure {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        // SIGKILL: typically the kernel OOM killer. SIGABRT: Rust's allocation-failure handler.
        match status.signal() {
            Some(9) => {
                return Failure::new(
                    FailureKind::OutOfMemory,
                    "worker was killed by the operating system (SIGKILL), most likely out of memory",
                );
            }
            Some(6) => {
                return Failure::new(FailureKind::OutOfMemory, "worker aborted (SIGABRT), most likely a failed allocation");
            }
            Some(sig) => return Failure::new(FailureKind::Crashed, format!("worker terminated by signal {sig}")),
            None => {}
        }
    }
    match status.code() {
        Some(code) => Failure::new(FailureKind::Crashed, format!("worker exited with code {code}")),
        None => Failure::new(FailureKind::Crashed, "worker terminated abnormally"),
    }
}
