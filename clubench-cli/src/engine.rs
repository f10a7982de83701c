//! Serial reference execution engine.
//!
//! Runs each submitted job to completion in the calling thread: spawns the
//! process in its working directory with stdout/stderr redirected to the
//! requested files, enforces the per-job timeout by polling, and dispatches
//! the job's completion hooks on success.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use clubench_core::{EngineError, ExecEngine, JobSpec};

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Synchronous engine that executes every job inline.
#[derive(Debug, Default)]
pub struct SerialEngine {
    completed: usize,
    failures: usize,
}

impl SerialEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs that ran to successful completion.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of jobs that timed out or exited non-zero.
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn redirect(name: &str, path: &Path) -> Result<File, EngineError> {
        File::create(path).map_err(|source| EngineError::Redirect {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ExecEngine for SerialEngine {
    fn submit(&mut self, job: JobSpec) -> Result<(), EngineError> {
        debug!(name = %job.name, category = %job.category, size = job.size, "executing job");

        let mut cmd = Command::new(&job.args[0]);
        cmd.args(&job.args[1..])
            .current_dir(&job.workdir)
            .stdin(Stdio::null());
        match &job.stdout {
            Some(path) => cmd.stdout(Self::redirect(&job.name, path)?),
            None => cmd.stdout(Stdio::null()),
        };
        match &job.stderr {
            Some(path) => cmd.stderr(Self::redirect(&job.name, path)?),
            None => cmd.stderr(Stdio::null()),
        };

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            name: job.name.clone(),
            source,
        })?;

        let deadline = (!job.timeout.is_zero()).then(|| Instant::now() + job.timeout);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!(name = %job.name, timeout = ?job.timeout, "job timed out, killed");
                        self.failures += 1;
                        return Ok(());
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    warn!(name = %job.name, error = %err, "failed to poll job");
                    let _ = child.kill();
                    let _ = child.wait();
                    self.failures += 1;
                    return Ok(());
                }
            }
        };

        if !status.success() {
            warn!(name = %job.name, %status, "job failed");
            self.failures += 1;
            return Ok(());
        }

        // Completion hooks run only after a successful exit; a failed hook
        // degrades the result but never aborts the benchmark.
        for action in &job.on_done {
            if let Err(err) = action.run() {
                warn!(name = %job.name, error = %err, "completion hook failed");
            }
        }
        self.completed += 1;
        Ok(())
    }
}

/// Engine that records submitted jobs without executing them.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    pub jobs: Vec<JobSpec>,
}

#[cfg(test)]
impl ExecEngine for RecordingEngine {
    fn submit(&mut self, job: JobSpec) -> Result<(), EngineError> {
        self.jobs.push(job);
        Ok(())
    }
}
