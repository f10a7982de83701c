//! Configuration loading from clubench.toml
//!
//! Benchmark configuration can be specified in a `clubench.toml` file in the
//! project root. The configuration is automatically discovered by walking up
//! from the current directory.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Clubench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchConfig {
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Directory layout for algorithms, results and helper binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the clustering algorithm installations
    #[serde(default = "default_algorithms_dir")]
    pub algorithms_dir: String,
    /// Root directory for per-algorithm results
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    /// Directory holding helper binaries (the timing wrapper)
    #[serde(default = "default_utils_dir")]
    pub utils_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            algorithms_dir: default_algorithms_dir(),
            results_dir: default_results_dir(),
            utils_dir: default_utils_dir(),
        }
    }
}

fn default_algorithms_dir() -> String {
    "algorithms".to_string()
}
fn default_results_dir() -> String {
    "results".to_string()
}
fn default_utils_dir() -> String {
    "utils".to_string()
}

/// Runner configuration for algorithm execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout for a single clustering job (e.g., "90s", "5m", "1.5h"; "0" = unlimited)
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Seed forwarded to stochastic algorithms
    #[serde(default)]
    pub seed: Option<u64>,
    /// Group shuffle instances of a network under a per-network subdirectory
    #[serde(default)]
    pub instance_subdir: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            seed: None,
            instance_subdir: false,
        }
    }
}

fn default_timeout() -> String {
    "1h".to_string()
}

impl BenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("clubench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Clubench Configuration

[paths]
# Clustering algorithm installations
algorithms_dir = "algorithms"
# Per-algorithm results root
results_dir = "results"
# Helper binaries (the timing wrapper)
utils_dir = "utils"

[runner]
# Timeout for a single clustering job ("0" = unlimited)
timeout = "1h"
# Seed for stochastic algorithms (uncomment to enable)
# seed = 42
# Group shuffle instances under a per-network subdirectory
instance_subdir = false
"#
        .to_string()
    }

    /// Parse duration string (e.g., "90", "90s", "5m", "1.5h"); "0" means unlimited
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if value < 0.0 {
            return Err(anyhow::anyhow!("Negative duration: {}", s));
        }

        let multiplier: f64 = match unit_part.to_lowercase().as_str() {
            "s" | "" => 1.0,
            "m" | "min" => 60.0,
            "h" => 3600.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_secs_f64(value * multiplier))
    }
}
