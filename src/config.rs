//! Configuration types for registry-audit
//!
//! Every ambient constant of the pipeline (registry base address, expected
//! artifact media type, chunk size, histogram bin edges) lives here as an
//! explicit configuration value handed to the components that need it, rather
//! than as a global scattered through the code.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Registry endpoints and listing behavior
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry API (default: "https://crates.io/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Query string for the first listing page (default: "?sort=new&include_yanked=no")
    ///
    /// Newest-first ordering with withdrawn crates excluded at the source.
    /// The withdrawn flag is still re-checked per item downstream.
    #[serde(default = "default_initial_query")]
    pub initial_query: String,

    /// User-Agent header sent with every request
    ///
    /// The registry rejects anonymous clients, so this must stay non-empty.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Media type an artifact download must declare before its body is read
    /// (default: "application/gzip")
    #[serde(default = "default_artifact_content_type")]
    pub artifact_content_type: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            initial_query: default_initial_query(),
            user_agent: default_user_agent(),
            artifact_content_type: default_artifact_content_type(),
        }
    }
}

/// External checker invocation settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Path to the checker binary (auto-detected from PATH if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for the checker binary when no explicit path is
    /// set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Arguments passed to the checker binary (default: ["deny", "check"])
    #[serde(default = "default_checker_args")]
    pub args: Vec<String>,

    /// Policy configuration file copied next to each unpacked crate before
    /// the checker runs (default: "deny.toml")
    #[serde(default = "default_policy_config")]
    pub policy_config: PathBuf,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
            args: default_checker_args(),
            policy_config: default_policy_config(),
        }
    }
}

/// Pipeline behavior (concurrency, scratch space, output)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum fetch+extract+check units in flight within a page (default: 8)
    ///
    /// Bounds simultaneous subprocess launches and open file descriptors;
    /// the remainder of a page's items queue behind the limit.
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,

    /// Chunk size in bytes for streaming artifact downloads to disk
    /// (default: 4096)
    ///
    /// Peak memory per download is bounded by this regardless of artifact size.
    #[serde(default = "default_download_chunk_size")]
    pub download_chunk_size: usize,

    /// Parent directory for per-item working areas (default: system temp dir)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Output dataset path (default: "crates_info.csv")
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: default_max_concurrent_checks(),
            download_chunk_size: default_download_chunk_size(),
            scratch_dir: None,
            dataset_path: default_dataset_path(),
        }
    }
}

/// Offline report settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Finite edges of the download-count histogram; a final open-ended bin
    /// covers everything above the last edge
    /// (default: [0, 100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000])
    #[serde(default = "default_download_bin_edges")]
    pub download_bin_edges: Vec<u64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            download_bin_edges: default_download_bin_edges(),
        }
    }
}

/// Main configuration for the auditor
///
/// Fields are organized into logical sub-configs:
/// - [`registry`](RegistryConfig) — endpoints, listing query, media type
/// - [`checker`](CheckerConfig) — external binary and policy file
/// - [`pipeline`](PipelineConfig) — concurrency, scratch space, output path
/// - [`report`](ReportConfig) — offline analysis settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry endpoints and listing behavior
    #[serde(default)]
    pub registry: RegistryConfig,

    /// External checker invocation settings
    #[serde(default)]
    pub checker: CheckerConfig,

    /// Pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Offline report settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to their defaults, so a partial file overriding
    /// only a handful of settings is valid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config {
            message: format!("invalid configuration file '{}': {}", path.display(), e),
            key: None,
        })
    }

    /// Validate the configuration before a run
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key if any setting is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.registry.base_url).map_err(|e| Error::Config {
            message: format!("invalid registry base URL '{}': {}", self.registry.base_url, e),
            key: Some("registry.base_url".to_string()),
        })?;

        if self.registry.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user agent must not be empty".to_string(),
                key: Some("registry.user_agent".to_string()),
            });
        }

        if self.pipeline.max_concurrent_checks == 0 {
            return Err(Error::Config {
                message: "concurrency limit must be at least 1".to_string(),
                key: Some("pipeline.max_concurrent_checks".to_string()),
            });
        }

        if self.pipeline.download_chunk_size == 0 {
            return Err(Error::Config {
                message: "download chunk size must be at least 1 byte".to_string(),
                key: Some("pipeline.download_chunk_size".to_string()),
            });
        }

        if self.report.download_bin_edges.len() < 2
            || !self
                .report
                .download_bin_edges
                .windows(2)
                .all(|pair| pair[0] < pair[1])
        {
            return Err(Error::Config {
                message: "histogram bin edges must be strictly increasing, with at least two edges"
                    .to_string(),
                key: Some("report.download_bin_edges".to_string()),
            });
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "https://crates.io/api".to_string()
}

fn default_initial_query() -> String {
    "?sort=new&include_yanked=no".to_string()
}

fn default_user_agent() -> String {
    concat!("registry-audit/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_artifact_content_type() -> String {
    "application/gzip".to_string()
}

fn default_checker_args() -> Vec<String> {
    vec!["deny".to_string(), "check".to_string()]
}

fn default_policy_config() -> PathBuf {
    PathBuf::from("deny.toml")
}

fn default_max_concurrent_checks() -> usize {
    8
}

fn default_download_chunk_size() -> usize {
    4096
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("crates_info.csv")
}

fn default_download_bin_edges() -> Vec<u64> {
    vec![0, 100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000]
}

fn default_true() -> bool {
    true
}
