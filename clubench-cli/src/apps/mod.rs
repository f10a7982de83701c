//! Algorithm job builders.
//!
//! Each clustering algorithm is registered here as a plain function that
//! turns one input network into one or more fully resolved [`JobSpec`]s and
//! hands them to the execution engine. The registry is a static table; the
//! driver iterates it, optionally filtered by a name regex.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use clubench_core::{
    prepare_path, ExecEngine, EngineError, PrepareError, PyRuntimes, TaskName, CLS_DIR,
    EXT_EXECTIME, SEP_NAMEPART, XTIME_BIN,
};

pub mod standard;
pub mod sweeps;

/// Errors an algorithm builder can surface to the driver.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Output-path staging failed.
    #[error(transparent)]
    Prepare(#[from] PrepareError),
    /// The engine rejected a job.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The input network could not be inspected.
    #[error("failed to stat network '{}': {source}", path.display())]
    NetStat {
        /// The input network file.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },
}

/// Immutable per-invocation context shared by every builder.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// The input network file.
    pub net_file: PathBuf,
    /// Directedness: `Some(true)` = directed (arcs), `Some(false)` =
    /// undirected (edges), `None` = unknown.
    pub asym: Option<bool>,
    /// Group shuffle instances under a per-network subdirectory.
    pub instance_subdir: bool,
    /// Job timeout; zero means unlimited.
    pub timeout: Duration,
    /// Path-id suffix (with its leading `#`), empty if none.
    pub path_id: String,
    /// Seed forwarded to stochastic algorithms.
    pub seed: Option<u64>,
    /// Directory holding the algorithm installations.
    pub algs_dir: PathBuf,
    /// Root directory for per-algorithm results.
    pub res_dir: PathBuf,
    /// Directory holding the timing-wrapper binary.
    pub utils_dir: PathBuf,
    /// Available Python interpreters.
    pub runtimes: PyRuntimes,
}

/// Builder signature: submit the jobs for one algorithm over one network
/// and report how many were submitted.
pub type BuildFn = fn(&mut dyn ExecEngine, &AppContext) -> Result<usize, BuildError>;

/// One registered algorithm.
pub struct AppEntry {
    /// Registry name, used for filtering and as the results subdirectory.
    pub name: &'static str,
    /// The builder.
    pub build: BuildFn,
}

/// The algorithm registry, in registration order.
pub static APPS: &[AppEntry] = &[
    AppEntry { name: "louvain_ig", build: standard::louvain_ig },
    AppEntry { name: "scp", build: sweeps::scp },
    AppEntry { name: "randcommuns", build: standard::randcommuns },
    AppEntry { name: "daoc", build: standard::daoc },
    AppEntry { name: "daoc_a", build: standard::daoc_a },
    AppEntry { name: "ganxis", build: standard::ganxis },
    AppEntry { name: "oslom2", build: standard::oslom2 },
    AppEntry { name: "cggc_rg", build: standard::cggc_rg },
    AppEntry { name: "cggci_rg", build: standard::cggci_rg },
    AppEntry { name: "pscan", build: sweeps::pscan },
    AppEntry { name: "scd", build: standard::scd },
];

/// Look up a registered algorithm by name.
pub fn find_app(name: &str) -> Option<&'static AppEntry> {
    APPS.iter().find(|a| a.name == name)
}

/// Derive the task identifier from the network file name (the final
/// component without its extension). The network must exist and be named.
pub(crate) fn task_of(ctx: &AppContext) -> String {
    assert!(
        ctx.net_file.is_file(),
        "the input network '{}' must exist",
        ctx.net_file.display()
    );
    let stem = ctx
        .net_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    assert!(
        !stem.is_empty(),
        "the network name must be present in '{}'",
        ctx.net_file.display()
    );
    stem
}

/// Input size estimate in bytes. Undirected inputs are weighted double,
/// since each edge stands for two arcs.
pub(crate) fn net_size(ctx: &AppContext) -> Result<u64, BuildError> {
    let meta = fs::metadata(&ctx.net_file).map_err(|source| BuildError::NetStat {
        path: ctx.net_file.clone(),
        source,
    })?;
    let size = meta.len();
    assert!(
        size > 0,
        "the input network '{}' must not be empty",
        ctx.net_file.display()
    );
    Ok(if ctx.asym == Some(true) { size } else { size * 2 })
}

/// Stage the clustering output directory for one task of one algorithm:
/// `<res>/<alg>/clusters/[<base><inst>/]<task><pathid>`, backing up any
/// stale content first.
pub(crate) fn prepare_task_dir(
    ctx: &AppContext,
    alg: &str,
    task: &str,
) -> Result<PathBuf, BuildError> {
    let mut taskdir = task.to_string();
    if ctx.instance_subdir {
        let tn = TaskName::parse(task);
        taskdir = format!("{}{}{}{}", tn.base, tn.inst, SEP_NAMEPART, task);
    }
    let taskpath = ctx
        .res_dir
        .join(alg)
        .join(CLS_DIR)
        .join(format!("{}{}", taskdir, ctx.path_id));
    prepare_path(&taskpath)?;
    Ok(taskpath)
}

/// Argument-vector prefix invoking the timing wrapper, with its paths made
/// relative to the job working directory.
pub(crate) fn xtime_args(ctx: &AppContext, alg: &str, task: &str, workdir: &Path) -> Vec<String> {
    let xtimebin = relpath(&ctx.utils_dir.join(XTIME_BIN), workdir);
    let xtimeres = relpath(
        &ctx.res_dir.join(alg).join(format!("{}{}", alg, EXT_EXECTIME)),
        workdir,
    );
    vec![
        xtimebin.display().to_string(),
        format!("-o={}", xtimeres.display()),
        format!("-n={}{}", task, ctx.path_id),
        format!("-s=/etime_{}", alg),
    ]
}

/// Job name for one task of one algorithm.
pub(crate) fn job_name(alg: &str, task: &str) -> String {
    format!("{}{}{}", alg, SEP_NAMEPART, task)
}

/// Append an extension to a path as-is (the path may name a directory).
pub(crate) fn with_ext(path: &Path, ext: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", path.display(), ext))
}

/// Lexical relative path from `base` to `path`, both resolved against the
/// same working directory. Falls back to `path` when the two do not share
/// a root.
pub(crate) fn relpath(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() != base.is_absolute() {
        return path.to_path_buf();
    }
    let pc: Vec<Component> = path.components().collect();
    let bc: Vec<Component> = base.components().collect();
    let common = pc
        .iter()
        .zip(bc.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut rel = PathBuf::new();
    for _ in common..bc.len() {
        rel.push("..");
    }
    for c in &pc[common..] {
        rel.push(c.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    /// Benchmark directory layout with one network file, for builder tests.
    pub(crate) fn fixture(net_name: &str) -> (TempDir, AppContext) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for dir in ["algorithms", "results", "utils"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        let net_file = root.join(net_name);
        File::create(&net_file)
            .unwrap()
            .write_all(b"0 1\n1 2\n2 0\n")
            .unwrap();
        let ctx = AppContext {
            net_file,
            asym: None,
            instance_subdir: false,
            timeout: Duration::from_secs(60),
            path_id: String::new(),
            seed: None,
            algs_dir: root.join("algorithms"),
            res_dir: root.join("results"),
            utils_dir: root.join("utils"),
            runtimes: PyRuntimes {
                pypy3: false,
                pypy: false,
                python3: true,
            },
        };
        (tmp, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::fixture;
    use super::*;

    #[test]
    fn registry_names_are_unique() {
        for (i, a) in APPS.iter().enumerate() {
            assert!(
                APPS[i + 1..].iter().all(|b| b.name != a.name),
                "duplicate registry entry '{}'",
                a.name
            );
        }
        assert!(find_app("oslom2").is_some());
        assert!(find_app("nonesuch").is_none());
    }

    #[test]
    fn size_doubles_unless_directed() {
        let (_tmp, mut ctx) = fixture("net.nse");
        let raw = fs::metadata(&ctx.net_file).unwrap().len();
        assert_eq!(net_size(&ctx).unwrap(), raw * 2);
        ctx.asym = Some(true);
        assert_eq!(net_size(&ctx).unwrap(), raw);
        ctx.asym = Some(false);
        assert_eq!(net_size(&ctx).unwrap(), raw * 2);
    }

    #[test]
    #[should_panic(expected = "must exist")]
    fn missing_network_is_a_fatal_precondition() {
        let (_tmp, mut ctx) = fixture("net.nse");
        ctx.net_file = ctx.net_file.with_file_name("absent.nse");
        let _ = task_of(&ctx);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_network_is_a_fatal_precondition() {
        let (_tmp, ctx) = fixture("net.nse");
        fs::write(&ctx.net_file, b"").unwrap();
        let _ = net_size(&ctx);
    }

    #[test]
    fn dotfile_network_keeps_its_full_name_as_task() {
        // An extension-only name has no extension to strip, the whole
        // name is the task, same as the original splitext behavior.
        let (_tmp, mut ctx) = fixture("net.nse");
        let dotted = ctx.net_file.with_file_name(".nse");
        fs::rename(&ctx.net_file, &dotted).unwrap();
        ctx.net_file = dotted;
        assert_eq!(task_of(&ctx), ".nse");
    }

    #[test]
    fn task_dir_without_instance_grouping() {
        let (tmp, ctx) = fixture("net.nse");
        let dir = prepare_task_dir(&ctx, "scd", "net").unwrap();
        assert_eq!(dir, tmp.path().join("results/scd/clusters/net"));
        assert!(dir.is_dir());
    }

    #[test]
    fn task_dir_groups_instances_and_appends_path_id() {
        let (tmp, mut ctx) = fixture("net^2.nse");
        ctx.instance_subdir = true;
        ctx.path_id = "#1".to_string();
        let dir = prepare_task_dir(&ctx, "scd", "net!k4^2").unwrap();
        assert_eq!(
            dir,
            tmp.path().join("results/scd/clusters/net^2/net!k4^2#1")
        );
        assert!(dir.is_dir());
    }

    #[test]
    fn xtime_prefix_is_workdir_relative() {
        let (tmp, ctx) = fixture("net.nse");
        let args = xtime_args(&ctx, "scd", "net", &ctx.algs_dir);
        assert_eq!(args[0], "../utils/exectime");
        assert_eq!(args[1], "-o=../results/scd/scd.rcp");
        assert_eq!(args[2], "-n=net");
        assert_eq!(args[3], "-s=/etime_scd");
        let _ = tmp;
    }

    #[test]
    fn relpath_walks_up_and_down() {
        assert_eq!(
            relpath(Path::new("/a/b/c"), Path::new("/a/d")),
            PathBuf::from("../b/c")
        );
        assert_eq!(relpath(Path::new("/a/b"), Path::new("/a/b")), PathBuf::from("."));
        assert_eq!(
            relpath(Path::new("x/y"), Path::new("x")),
            PathBuf::from("y")
        );
        // Mixed absolute/relative stays untouched
        assert_eq!(
            relpath(Path::new("/a/b"), Path::new("c")),
            PathBuf::from("/a/b")
        );
    }
}
