//! Output-path staging.
//!
//! Every task directory is prepared exactly once before any job writes into
//! it: missing paths are created, stale non-empty paths are relocated to a
//! timestamped backup first. Backups work at the *base* granularity (the
//! path with instance/path-id suffixes stripped) so that processing any one
//! sibling leaf of the same logical task triggers a single backup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::naming::strip_suffixes;
use crate::BACKUP_DIR;

/// Errors of output-path preparation. All of them are fatal to the builder
/// invocation: an algorithm cannot produce output without its directory.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// A directory could not be created.
    #[error("failed to create task directory '{}': {source}", path.display())]
    Create {
        /// The directory being created.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Stale results could not be moved to the backup location.
    #[error("failed to back up stale results of '{}': {source}", path.display())]
    Backup {
        /// The base path being backed up.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
}

/// Whether a directory has no entries. Unreadable paths are reported empty.
pub fn dir_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

/// Prepare a task output directory with the default base predicate
/// (instance/path-id suffixes stripped from the final path component).
pub fn prepare_path(path: &Path) -> Result<(), PrepareError> {
    prepare_path_with(path, default_base)
}

/// Prepare a task output directory, deciding "what counts as the same
/// logical task" for backup purposes via `base_of`.
///
/// - missing path: created together with all missing ancestors;
/// - existing empty path: left untouched (idempotent);
/// - existing non-empty path: the whole base subtree is moved to a
///   timestamped backup, then the path is recreated empty.
pub fn prepare_path_with<F>(path: &Path, base_of: F) -> Result<(), PrepareError>
where
    F: Fn(&Path) -> PathBuf,
{
    if !path.exists() {
        fs::create_dir_all(path).map_err(|source| PrepareError::Create {
            path: path.to_path_buf(),
            source,
        })?;
    } else if !dir_empty(path) {
        // Old results cannot be reused in the forming ones, move them away.
        let base = base_of(path);
        backup_path(&base).map_err(|source| PrepareError::Backup {
            path: base.clone(),
            source,
        })?;
        fs::create_dir_all(path).map_err(|source| PrepareError::Create {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn default_base(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(strip_suffixes(&name, false).to_owned())
}

/// Move every sibling of `base` whose name starts with the base name (the
/// base itself included) into a fresh timestamped directory under the
/// sibling `backup/` dir. Returns the backup location, or `None` when there
/// was nothing to back up.
pub fn backup_path(base: &Path) -> io::Result<Option<PathBuf>> {
    let parent = match base.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let stem = match base.file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => return Ok(None),
    };

    let mut victims = Vec::new();
    if parent.is_dir() {
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&stem) && name != BACKUP_DIR {
                victims.push(entry.path());
            }
        }
    }
    if victims.is_empty() {
        return Ok(None);
    }

    let bdir = parent.join(BACKUP_DIR);
    fs::create_dir_all(&bdir)?;
    let ts = Utc::now().format("%Y%m%d_%H%M%S");
    let mut dest = bdir.join(format!("{stem}_{ts}"));
    let mut seq = 0u32;
    while dest.exists() {
        seq += 1;
        dest = bdir.join(format!("{stem}_{ts}-{seq}"));
    }
    fs::create_dir(&dest)?;

    for victim in &victims {
        let name = victim.file_name().expect("read_dir entries have names");
        fs::rename(victim, dest.join(name))?;
    }
    info!(
        base = %base.display(),
        backup = %dest.display(),
        items = victims.len(),
        "stale results backed up"
    );
    Ok(Some(dest))
}
