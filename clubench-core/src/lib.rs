#![warn(missing_docs)]
//! Clubench Core
//!
//! This crate provides the building blocks shared by the clubench benchmark:
//! - `JobSpec` and the `ExecEngine` submission contract
//! - `PostAction` completion hooks interpreted by the engine
//! - Output-path staging with backup-before-overwrite semantics
//! - The task-name grammar (parameter / instance / path-id suffixes)
//! - Python runtime probing for script-based algorithms

mod job;
mod naming;
mod paths;
mod runtime;

pub use job::{EngineError, ExecEngine, JobSpec, PostAction};
pub use naming::{TaskName, embed_param, strip_suffixes, SEP_INST, SEP_NAMEPART, SEP_PARS, SEP_PATHID};
pub use paths::{backup_path, dir_empty, prepare_path, prepare_path_with, PrepareError};
pub use runtime::PyRuntimes;

/// Extension of the canonical cluster (community) node-list output file.
pub const EXT_CLNODES: &str = ".cnl";
/// Extension of the per-task stdout log.
pub const EXT_LOG: &str = ".log";
/// Extension of the unbuffered (error) log.
pub const EXT_ELOG: &str = ".elog";
/// Extension of the per-algorithm resource-consumption log.
pub const EXT_EXECTIME: &str = ".rcp";
/// Extension of the compact aggregated report.
pub const EXT_AGGRES: &str = ".res";
/// Extension of the extended aggregated report.
pub const EXT_AGGRESEXT: &str = ".resx";

/// Subdirectory of an algorithm's results holding the clustering output.
pub const CLS_DIR: &str = "clusters";
/// Subdirectory holding backups of stale results.
pub const BACKUP_DIR: &str = "backup";
/// Name of the timing-wrapper binary under the utils directory.
pub const XTIME_BIN: &str = "exectime";
