//! Builders for the fixed (non-swept) clustering algorithms.
//!
//! Every builder follows the same shape: derive the task from the network
//! file name, stage the output directory, prefix the argument vector with
//! the timing wrapper, and submit a single job with its logs placed next
//! to the task directory.

use std::path::Path;

use clubench_core::{ExecEngine, JobSpec, PostAction, EXT_CLNODES, EXT_ELOG, EXT_LOG};

use super::{
    job_name, net_size, prepare_task_dir, relpath, task_of, with_ext, AppContext, BuildError,
};

/// Louvain community detection (igraph implementation, CPython script).
pub fn louvain_ig(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "louvain_ig";
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, ALG, &task)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);
    let taskrel = relpath(&taskpath, &workdir);

    let mut args = super::xtime_args(ctx, ALG, &task, &workdir);
    let py = ctx.runtimes.best_of(false, true);
    args.extend([
        py.to_string(),
        "./louvain_igraph.py".to_string(),
        format!("-i{}", if ctx.asym == Some(true) { "nsa" } else { "nse" }),
        "-lo".to_string(),
        format!("{}/{}{}", taskrel.display(), task, EXT_CLNODES),
        netrel.display().to_string(),
    ]);

    pool.submit(JobSpec {
        name: job_name(ALG, &task),
        workdir,
        args,
        timeout: ctx.timeout,
        category: ALG.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        on_done: Vec::new(),
    })?;
    Ok(1)
}

/// Random communities baseline: reproduces the ground-truth cluster-size
/// distribution with randomly drawn members (5 variants per network).
pub fn randcommuns(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "randcommuns";
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, ALG, &task)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);
    let taskrel = relpath(&taskpath, &workdir);
    // Ground-truth clustering shares the network's base name; with the
    // instance layout the instances live in a directory named after the
    // base, and the ground truth sits next to that directory.
    let gt_base = if ctx.instance_subdir {
        ctx.net_file
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf()
    } else {
        ctx.net_file.with_extension("")
    };
    let gtrel = relpath(&with_ext(&gt_base, EXT_CLNODES), &workdir);

    let mut args = super::xtime_args(ctx, ALG, &task, &workdir);
    let py = ctx.runtimes.best_of(true, true);
    args.extend([
        py.to_string(),
        "./randcommuns.py".to_string(),
        format!("-g={}", gtrel.display()),
        format!("-i={}", netrel.display()),
        format!("-o={}", taskrel.display()),
        "-n=5".to_string(),
    ]);
    if let Some(seed) = ctx.seed {
        args.push(format!("-r={}", seed));
    }

    pool.submit(JobSpec {
        name: job_name(ALG, &task),
        workdir,
        args,
        timeout: ctx.timeout,
        category: ALG.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        on_done: Vec::new(),
    })?;
    Ok(1)
}

/// Ratio of the least significant cluster levels output by DAOC.
const DAOC_RLEVOUT: f64 = 0.8;

fn daoc_gamma(
    pool: &mut dyn ExecEngine,
    ctx: &AppContext,
    alg: &'static str,
    gamma: i32,
) -> Result<usize, BuildError> {
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, alg, &task)?;
    let workdir = ctx.algs_dir.join("daoc");
    let netrel = relpath(&ctx.net_file, &workdir);
    let taskrel = relpath(&taskpath, &workdir);

    let mut args = super::xtime_args(ctx, alg, &task, &workdir);
    args.extend([
        "./daoc".to_string(),
        "-w".to_string(),
        format!("-g={}", gamma),
        format!("-t{}", if ctx.asym == Some(true) { "a" } else { "e" }),
        format!(
            "-cxl[:/{}]s={}{}",
            DAOC_RLEVOUT,
            taskrel.display(),
            EXT_CLNODES
        ),
        netrel.display().to_string(),
    ]);

    pool.submit(JobSpec {
        name: job_name(alg, &task),
        workdir,
        args,
        timeout: ctx.timeout,
        category: alg.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        on_done: Vec::new(),
    })?;
    Ok(1)
}

/// DAOC, deterministic agglomerative clustering with the static gamma.
pub fn daoc(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    daoc_gamma(pool, ctx, "daoc", 1)
}

/// DAOC with automatic (adaptive) gamma.
pub fn daoc_a(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    daoc_gamma(pool, ctx, "daoc_a", -1)
}

/// GANXiS / SLPA speaker-listener label propagation (Java).
pub fn ganxis(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "ganxis";
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, ALG, &task)?;
    let workdir = ctx.algs_dir.join("ganxis");
    let netrel = relpath(&ctx.net_file, &workdir);
    let taskrel = relpath(&taskpath, &workdir);

    let mut args = super::xtime_args(ctx, ALG, &task, &workdir);
    args.extend([
        "java".to_string(),
        "-jar".to_string(),
        "./GANXiSw.jar".to_string(),
        "-i".to_string(),
        netrel.display().to_string(),
        "-d".to_string(),
        taskrel.display().to_string(),
    ]);
    if ctx.asym != Some(true) {
        args.extend(["-Sym".to_string(), "1".to_string()]);
    }
    if let Some(seed) = ctx.seed {
        args.extend(["-seed".to_string(), seed.to_string()]);
    }

    pool.submit(JobSpec {
        name: job_name(ALG, &task),
        workdir: workdir.clone(),
        args,
        timeout: ctx.timeout,
        category: ALG.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        // GANXiS also dumps into ./output regardless of -d
        on_done: vec![PostAction::RemoveTransient {
            path: workdir.join("output"),
        }],
    })?;
    Ok(1)
}

/// OSLOM2 statistical-significance clustering.
pub fn oslom2(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "oslom2";
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, ALG, &task)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);

    let mut args = super::xtime_args(ctx, ALG, &task, &workdir);
    let binary = if ctx.asym == Some(true) {
        "./oslom_dir"
    } else {
        "./oslom_undir"
    };
    args.extend([
        binary.to_string(),
        "-f".to_string(),
        netrel.display().to_string(),
        "-w".to_string(),
    ]);
    if let Some(seed) = ctx.seed {
        args.extend(["-seed".to_string(), seed.to_string()]);
    }

    // OSLOM writes next to the input network and leaves a `tp` file in the
    // working directory; relocate the partitions, park the rest.
    let net_name = ctx
        .net_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let raw_dir = ctx
        .net_file
        .with_file_name(format!("{}_oslo_files", net_name));

    pool.submit(JobSpec {
        name: job_name(ALG, &task),
        workdir: workdir.clone(),
        args,
        timeout: ctx.timeout,
        category: ALG.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        on_done: vec![
            PostAction::MoveFiles {
                src_dir: raw_dir,
                prefix: "tp".to_string(),
                dest: taskpath.clone(),
                extras_dest: Some(taskpath.join("extra")),
            },
            PostAction::RemoveTransient {
                path: workdir.join("tp"),
            },
        ],
    })?;
    Ok(1)
}

fn rgmc(
    pool: &mut dyn ExecEngine,
    ctx: &AppContext,
    alg: &'static str,
    variant: u32,
) -> Result<usize, BuildError> {
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, alg, &task)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);
    let taskrel = relpath(&taskpath, &workdir);

    let mut args = super::xtime_args(ctx, alg, &task, &workdir);
    args.extend([
        "./rgmc".to_string(),
        "-a".to_string(),
        variant.to_string(),
        "-c".to_string(),
        format!("{}/{}{}", taskrel.display(), task, EXT_CLNODES),
        "-i".to_string(),
        (if ctx.asym == Some(true) { "a" } else { "e" }).to_string(),
        netrel.display().to_string(),
    ]);

    pool.submit(JobSpec {
        name: job_name(alg, &task),
        workdir,
        args,
        timeout: ctx.timeout,
        category: alg.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        on_done: Vec::new(),
    })?;
    Ok(1)
}

/// CGGC ensemble clustering, randomized greedy base.
pub fn cggc_rg(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    rgmc(pool, ctx, "cggc_rg", 2)
}

/// CGGCi iterated ensemble clustering, randomized greedy base.
pub fn cggci_rg(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    rgmc(pool, ctx, "cggci_rg", 3)
}

/// SCD, high-performance disjoint community detection.
pub fn scd(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "scd";
    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let taskpath = prepare_task_dir(ctx, ALG, &task)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);
    let taskrel = relpath(&taskpath, &workdir);

    let mut args = super::xtime_args(ctx, ALG, &task, &workdir);
    args.extend([
        "./scd".to_string(),
        "-n".to_string(),
        "1".to_string(),
        "-o".to_string(),
        format!("{}/{}{}", taskrel.display(), task, EXT_CLNODES),
        "-f".to_string(),
        netrel.display().to_string(),
    ]);

    pool.submit(JobSpec {
        name: job_name(ALG, &task),
        workdir,
        args,
        timeout: ctx.timeout,
        category: ALG.to_string(),
        params: None,
        size,
        stdout: Some(with_ext(&taskpath, EXT_LOG)),
        stderr: Some(with_ext(&taskpath, EXT_ELOG)),
        on_done: Vec::new(),
    })?;
    Ok(1)
}
