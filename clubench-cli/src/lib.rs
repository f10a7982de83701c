#![warn(missing_docs)]
//! Clubench CLI
//!
//! Command-line driver of the clustering benchmark: parses the arguments,
//! loads `clubench.toml`, probes the Python runtimes once, iterates the
//! algorithm registry over the input networks through the execution engine,
//! and aggregates the accumulated resource logs into reports.

mod config;
mod engine;

pub mod apps;

pub use config::*;
pub use engine::SerialEngine;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use regex::Regex;
use tracing::info;

use apps::{AppContext, AppEntry, APPS};
use clubench_core::{PyRuntimes, SEP_PATHID};
use clubench_report::Aggregator;

/// Clubench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "clubench")]
#[command(author, version, about = "Clubench - benchmarking of graph clustering algorithms")]
pub struct Cli {
    /// Optional subcommand (List, Run, Aggregate); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input network files
    pub networks: Vec<PathBuf>,

    /// Filter algorithms by regex pattern
    #[arg(long, default_value = ".*")]
    pub filter: String,

    /// Treat the input networks as directed (arcs)
    #[arg(long)]
    pub asym: bool,

    /// Treat the input networks as undirected (edges)
    #[arg(long, conflicts_with = "asym")]
    pub sym: bool,

    /// Timeout for a single job, e.g. "90s", "5m", "1.5h" (overrides clubench.toml)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Seed forwarded to stochastic algorithms
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path id disambiguating same-named networks from different directories
    #[arg(long, default_value = "")]
    pub path_id: String,

    /// Group shuffle instances of a network under a per-network subdirectory
    #[arg(long)]
    pub instance_subdir: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the registered algorithms
    List,
    /// Run the selected algorithms over the input networks (default)
    Run,
    /// Aggregate the accumulated resource logs into reports, without running
    Aggregate,
}

/// Run the Clubench CLI. This is the entry point of the `clubench` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Clubench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("clubench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("clubench=info")
            .init();
    }

    // Discover clubench.toml configuration (CLI flags override)
    let config = BenchConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::List) => list_apps(&cli),
        Some(Commands::Aggregate) => aggregate_results(&cli, &config),
        Some(Commands::Run) | None => run_benchmarks(&cli, &config),
    }
}

/// Filter the algorithm registry by the CLI regex, keeping registration order.
fn filter_apps(cli: &Cli) -> anyhow::Result<Vec<&'static AppEntry>> {
    let re = Regex::new(&cli.filter)
        .with_context(|| format!("invalid filter pattern '{}'", cli.filter))?;
    Ok(APPS.iter().filter(|a| re.is_match(a.name)).collect())
}

fn list_apps(cli: &Cli) -> anyhow::Result<()> {
    let apps = filter_apps(cli)?;
    println!("Registered algorithms:");
    for app in &apps {
        println!("  {}", app.name);
    }
    println!("{} algorithms found.", apps.len());
    Ok(())
}

/// Directedness of one input: explicit CLI flags win, otherwise it is
/// inferred from the network extension (`.nsa` arcs, `.nse` edges).
fn directedness(cli: &Cli, net: &Path) -> Option<bool> {
    if cli.asym {
        return Some(true);
    }
    if cli.sym {
        return Some(false);
    }
    match net.extension().and_then(|e| e.to_str()) {
        Some("nsa") => Some(true),
        Some("nse") => Some(false),
        _ => None,
    }
}

/// Prefix the path id with its separator unless already present or empty.
fn normalize_path_id(id: &str) -> String {
    if id.is_empty() || id.starts_with(SEP_PATHID) {
        id.to_string()
    } else {
        format!("{}{}", SEP_PATHID, id)
    }
}

fn run_benchmarks(cli: &Cli, config: &BenchConfig) -> anyhow::Result<()> {
    let apps = filter_apps(cli)?;
    if apps.is_empty() {
        println!("No algorithms matched '{}'.", cli.filter);
        return Ok(());
    }
    anyhow::ensure!(!cli.networks.is_empty(), "no input networks specified");

    let timeout_str = cli.timeout.as_deref().unwrap_or(&config.runner.timeout);
    let timeout = BenchConfig::parse_duration(timeout_str)
        .with_context(|| format!("invalid timeout '{}'", timeout_str))?;
    let seed = cli.seed.or(config.runner.seed);
    let path_id = normalize_path_id(&cli.path_id);
    let runtimes = PyRuntimes::probe();

    let mut engine = SerialEngine::new();
    let mut submitted = 0usize;
    for net in &cli.networks {
        anyhow::ensure!(net.is_file(), "input network not found: {}", net.display());
        let ctx = AppContext {
            net_file: net.clone(),
            asym: directedness(cli, net),
            instance_subdir: cli.instance_subdir || config.runner.instance_subdir,
            timeout,
            path_id: path_id.clone(),
            seed,
            algs_dir: PathBuf::from(&config.paths.algorithms_dir),
            res_dir: PathBuf::from(&config.paths.results_dir),
            utils_dir: PathBuf::from(&config.paths.utils_dir),
            runtimes,
        };
        for app in &apps {
            submitted += (app.build)(&mut engine, &ctx).with_context(|| {
                format!("building {} jobs for '{}'", app.name, net.display())
            })?;
        }
    }
    info!(
        submitted,
        completed = engine.completed(),
        failures = engine.failures(),
        "benchmark finished"
    );

    let names: Vec<&str> = apps.iter().map(|a| a.name).collect();
    Aggregator::new(Path::new(&config.paths.results_dir)).aggregate(&names)?;

    if engine.failures() > 0 {
        eprintln!("{} job(s) failed or timed out", engine.failures());
        std::process::exit(1);
    }
    Ok(())
}

fn aggregate_results(cli: &Cli, config: &BenchConfig) -> anyhow::Result<()> {
    let apps = filter_apps(cli)?;
    let names: Vec<&str> = apps.iter().map(|a| a.name).collect();
    Aggregator::new(Path::new(&config.paths.results_dir)).aggregate(&names)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_to_run_over_all_algorithms() {
        let cli = parse(&["clubench", "nets/karate.nse"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.filter, ".*");
        assert_eq!(filter_apps(&cli).unwrap().len(), APPS.len());
    }

    #[test]
    fn filter_narrows_the_registry_in_order() {
        let mut cli = parse(&["clubench"]);
        cli.filter = "^(daoc|scd)".to_string();
        let names: Vec<&str> = filter_apps(&cli).unwrap().iter().map(|a| a.name).collect();
        assert_eq!(names, ["daoc", "daoc_a", "scd"]);
    }

    #[test]
    fn invalid_filter_is_an_error() {
        let mut cli = parse(&["clubench"]);
        cli.filter = "(".to_string();
        assert!(filter_apps(&cli).is_err());
    }

    #[test]
    fn directedness_flags_override_extension() {
        let cli = parse(&["clubench", "x.nse"]);
        assert_eq!(directedness(&cli, Path::new("x.nsa")), Some(true));
        assert_eq!(directedness(&cli, Path::new("x.nse")), Some(false));
        assert_eq!(directedness(&cli, Path::new("x.net")), None);

        let cli = parse(&["clubench", "--asym", "x.nse"]);
        assert_eq!(directedness(&cli, Path::new("x.nse")), Some(true));
        let cli = parse(&["clubench", "--sym", "x.nsa"]);
        assert_eq!(directedness(&cli, Path::new("x.nsa")), Some(false));
    }

    #[test]
    fn sym_and_asym_conflict() {
        assert!(Cli::try_parse_from(["clubench", "--sym", "--asym"]).is_err());
    }

    #[test]
    fn path_id_gains_its_separator() {
        assert_eq!(normalize_path_id(""), "");
        assert_eq!(normalize_path_id("1"), "#1");
        assert_eq!(normalize_path_id("#2"), "#2");
    }
}
