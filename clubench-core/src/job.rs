//! Job model and the execution-engine contract.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Errors surfaced by an execution engine on job submission or execution.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The job's process could not be spawned.
    #[error("failed to spawn job '{name}': {source}")]
    Spawn {
        /// Job name.
        name: String,
        /// Underlying OS error.
        source: io::Error,
    },

    /// An output redirection target could not be opened.
    #[error("failed to open output '{}' for job '{name}': {source}", path.display())]
    Redirect {
        /// Job name.
        name: String,
        /// Redirection target.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The job ran longer than its timeout and was killed.
    #[error("job '{name}' timed out after {timeout:?}")]
    Timeout {
        /// Job name.
        name: String,
        /// Configured timeout.
        timeout: Duration,
    },
}

/// A fully resolved description of one external algorithm invocation.
///
/// Built once by an algorithm builder, handed to the execution engine by
/// value and never reused.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Job name, `<alg>/<task>`.
    pub name: String,
    /// Working directory of the spawned process.
    pub workdir: PathBuf,
    /// Argument vector; `args[0]` is the program to run.
    pub args: Vec<String>,
    /// Execution timeout; zero means unlimited.
    pub timeout: Duration,
    /// Scheduling/grouping key, typically the algorithm name optionally
    /// refined by the swept parameter.
    pub category: String,
    /// Opaque payload of the swept parameter point, carried for diagnostics
    /// and never interpreted by the engine.
    pub params: Option<String>,
    /// Input size estimate in bytes, a proxy for the relative job cost.
    pub size: u64,
    /// Redirection target of the process stdout; `None` discards it.
    pub stdout: Option<PathBuf>,
    /// Redirection target of the process stderr; `None` discards it.
    pub stderr: Option<PathBuf>,
    /// Completion hooks, run by the engine exactly once after the job
    /// finishes successfully.
    pub on_done: Vec<PostAction>,
}

/// A post-processing step attached to a job, interpreted generically by the
/// execution engine after the job's process has terminated successfully.
///
/// Actions are idempotent with respect to filesystem state: absent inputs
/// are a silent no-op, so a retried run never fails on cleanup that has
/// already happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    /// Relocate auxiliary output a binary produced outside the canonical
    /// task directory: every entry of `src_dir` whose name starts with
    /// `prefix` is moved into `dest`; when `extras_dest` is set, the
    /// remaining source directory is moved there wholesale.
    MoveFiles {
        /// Directory the binary wrote its raw output into.
        src_dir: PathBuf,
        /// File-name prefix selecting the entries to relocate.
        prefix: String,
        /// Canonical task output directory.
        dest: PathBuf,
        /// Where to park the rest of `src_dir`, replacing any previous copy.
        extras_dest: Option<PathBuf>,
    },
    /// Delete a known transient file or directory a binary leaves in its
    /// working directory.
    RemoveTransient {
        /// The transient path (file or directory).
        path: PathBuf,
    },
}

impl PostAction {
    /// Apply the action. Failures are reported by the caller and never
    /// retried; a missing input means the work is already done.
    pub fn run(&self) -> io::Result<()> {
        match self {
            PostAction::MoveFiles {
                src_dir,
                prefix,
                dest,
                extras_dest,
            } => {
                if !src_dir.is_dir() {
                    return Ok(()); // already relocated
                }
                for entry in fs::read_dir(src_dir)? {
                    let entry = entry?;
                    let fname = entry.file_name();
                    if fname.to_string_lossy().starts_with(prefix.as_str()) {
                        fs::rename(entry.path(), dest.join(&fname))?;
                    }
                }
                if let Some(extras) = extras_dest {
                    if extras.exists() {
                        remove_any(extras)?;
                    }
                    fs::rename(src_dir, extras)?;
                }
                Ok(())
            }
            PostAction::RemoveTransient { path } => {
                if path.exists() {
                    debug!(path = %path.display(), "removing transient output");
                    remove_any(path)?;
                }
                Ok(())
            }
        }
    }
}

fn remove_any(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// The sole contract toward the job scheduler: builders hand over fully
/// resolved jobs and never observe execution directly. The engine owns
/// scheduling, parallelism, timeout enforcement and completion hooks.
pub trait ExecEngine {
    /// Submit a job for execution. Returns once the job is accepted;
    /// completion is asynchronous from the builder's point of view.
    fn submit(&mut self, job: JobSpec) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn move_files_relocates_by_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("net.nse_oslo_files");
        let dest = tmp.path().join("task");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        for name in ["tp1", "tp2", "info.dat"] {
            File::create(src.join(name))
                .unwrap()
                .write_all(b"x")
                .unwrap();
        }

        let extras = dest.join("extra");
        let action = PostAction::MoveFiles {
            src_dir: src.clone(),
            prefix: "tp".into(),
            dest: dest.clone(),
            extras_dest: Some(extras.clone()),
        };
        action.run().unwrap();

        assert!(dest.join("tp1").exists() && dest.join("tp2").exists());
        assert!(!src.exists(), "source dir moved to extras");
        assert!(extras.join("info.dat").exists());
    }

    #[test]
    fn move_files_noop_when_source_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let action = PostAction::MoveFiles {
            src_dir: tmp.path().join("missing"),
            prefix: "tp".into(),
            dest: tmp.path().to_path_buf(),
            extras_dest: None,
        };
        action.run().unwrap();
    }

    #[test]
    fn remove_transient_handles_files_and_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("tp");
        File::create(&file).unwrap();
        let dir = tmp.path().join("output");
        fs::create_dir_all(dir.join("nested")).unwrap();

        PostAction::RemoveTransient { path: file.clone() }
            .run()
            .unwrap();
        PostAction::RemoveTransient { path: dir.clone() }
            .run()
            .unwrap();
        assert!(!file.exists() && !dir.exists());

        // Running again is a no-op
        PostAction::RemoveTransient { path: file }.run().unwrap();
    }
}
