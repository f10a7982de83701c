//! Builders sweeping an algorithm parameter over a fixed range.
//!
//! Each sweep point gets its own task identifier (the parameter embedded
//! via the `!` suffix), its own staged output directory and its own
//! category, so the scheduler and the reports keep the points apart.

use clubench_core::{embed_param, ExecEngine, JobSpec, EXT_CLNODES, EXT_ELOG, EXT_LOG};

use super::{
    job_name, net_size, prepare_task_dir, relpath, task_of, with_ext, AppContext, BuildError,
};

/// SCP clique percolation, swept over the clique size k.
pub fn scp(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "scp";
    const K_MIN: u32 = 3;
    const K_MAX: u32 = 8;

    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);
    // SCP does not run under Python 3
    let py = ctx.runtimes.best_of(true, false);

    let mut count = 0;
    for k in K_MIN..=K_MAX {
        let prm = format!("k{}", k);
        let ktask = embed_param(&task, &prm);
        let taskpath = prepare_task_dir(ctx, ALG, &ktask)?;
        let taskrel = relpath(&taskpath, &workdir);

        let mut args = super::xtime_args(ctx, ALG, &ktask, &workdir);
        args.extend([
            py.to_string(),
            "./scp.py".to_string(),
            netrel.display().to_string(),
            k.to_string(),
            // scale levels to process
            "10".to_string(),
            format!("{}/{}{}", taskrel.display(), ktask, EXT_CLNODES),
        ]);

        pool.submit(JobSpec {
            name: job_name(ALG, &ktask),
            workdir: workdir.clone(),
            args,
            timeout: ctx.timeout,
            category: format!("{}_{}", ALG, prm),
            params: Some(prm),
            size,
            stdout: Some(with_ext(&taskpath, EXT_LOG)),
            stderr: Some(with_ext(&taskpath, EXT_ELOG)),
            on_done: Vec::new(),
        })?;
        count += 1;
    }
    Ok(count)
}

/// pSCAN structural clustering, swept over the similarity threshold eps.
pub fn pscan(pool: &mut dyn ExecEngine, ctx: &AppContext) -> Result<usize, BuildError> {
    const ALG: &str = "pscan";
    const EPS_MIN: f64 = 0.05;
    const EPS_MAX: f64 = 0.9;
    const STEPS: u32 = 10;

    let task = task_of(ctx);
    let size = net_size(ctx)?;
    let workdir = ctx.algs_dir.clone();
    let netrel = relpath(&ctx.net_file, &workdir);
    let delta = (EPS_MAX - EPS_MIN) / STEPS as f64;

    let mut count = 0;
    // Driven by the integer step index; the bounds are inclusive.
    for step in 0..=STEPS {
        let eps = EPS_MIN + step as f64 * delta;
        let prm = format!("e{:.2}", eps);
        let etask = embed_param(&task, &prm);
        let taskpath = prepare_task_dir(ctx, ALG, &etask)?;
        let taskrel = relpath(&taskpath, &workdir);

        let mut args = super::xtime_args(ctx, ALG, &etask, &workdir);
        args.extend([
            "./pscan".to_string(),
            "-e".to_string(),
            format!("{:.2}", eps),
            "-o".to_string(),
            format!("{}/{}{}", taskrel.display(), etask, EXT_CLNODES),
            "-f".to_string(),
            (if ctx.asym == Some(true) { "NSA" } else { "NSE" }).to_string(),
            netrel.display().to_string(),
        ]);

        pool.submit(JobSpec {
            name: job_name(ALG, &etask),
            workdir: workdir.clone(),
            args,
            timeout: ctx.timeout,
            category: format!("{}_{}", ALG, prm),
            params: Some(prm),
            size,
            // stdout is noise here, one file per sweep point is not worth it
            stdout: None,
            stderr: Some(with_ext(&taskpath, EXT_ELOG)),
            on_done: Vec::new(),
        })?;
        count += 1;
    }
    Ok(count)
}
