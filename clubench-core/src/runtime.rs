//! Python runtime probing for script-based algorithms.
//!
//! The capability set is constructed explicitly once at startup and passed
//! down to the builders; selection is a pure function of the probed set and
//! the caller's preferences.

use std::process::{Command, Stdio};

/// Optional Python runtimes discovered on the host. Absence of a runtime is
/// not an error, it merely disables that preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PyRuntimes {
    /// `pypy3` is installed.
    pub pypy3: bool,
    /// `pypy` (v2) is installed.
    pub pypy: bool,
    /// `python3` is installed.
    pub python3: bool,
}

impl PyRuntimes {
    /// Probe the installed runtimes, best-effort.
    ///
    /// `-h` is used instead of `-V` because version output is unreliable
    /// across Python 2 interpreters when redirected.
    pub fn probe() -> Self {
        PyRuntimes {
            pypy3: probe_bin("pypy3"),
            pypy: probe_bin("pypy"),
            python3: probe_bin("python3"),
        }
    }

    /// Most preferred available interpreter for the given preferences:
    /// JIT+v3 over JIT over v3 over the generic default.
    ///
    /// `jit` prioritizes PyPy over CPython; `v3` prioritizes Python 3.
    pub fn best_of(&self, jit: bool, v3: bool) -> &'static str {
        if jit && v3 && self.pypy3 {
            "pypy3"
        } else if jit && self.pypy {
            "pypy"
        } else if v3 && self.python3 {
            "python3"
        } else {
            "python"
        }
    }
}

fn probe_bin(name: &str) -> bool {
    Command::new(name)
        .arg("-h")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
