//! # registry-audit
//!
//! Concurrent crates.io policy-compliance crawler.
//!
//! The pipeline paginates the registry newest-first, and for every listed
//! crate downloads its release artifact into an isolated scratch directory,
//! unpacks it, runs an external policy checker (`cargo deny check`) against
//! the sources, and streams one CSV row per successfully verdicted crate.
//! Items that cannot be verdicted are skipped and counted — never recorded
//! as failing verdicts. A separate report mode aggregates produced datasets
//! into per-category failure rates and download histograms.
//!
//! ## Quick Start
//!
//! ```no_run
//! use registry_audit::{Config, RegistryAuditor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let auditor = RegistryAuditor::new(config)?;
//!
//!     let summary = auditor.run().await?;
//!     println!(
//!         "{} crates discovered, {} rows written",
//!         summary.discovered, summary.rows_written
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Artifact download, extraction, and scratch-directory handling
pub mod artifact;
/// External policy checker invocation and output parsing
pub mod checker;
/// Configuration types
pub mod config;
/// Streaming dataset persistence
pub mod dataset;
/// Error types
pub mod error;
/// Crawl pipeline (driver and per-page orchestration)
pub mod pipeline;
/// Offline dataset analysis
pub mod report;
/// Registry listing client
pub mod registry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use checker::{CliPolicyChecker, PolicyChecker};
pub use config::{CheckerConfig, Config, PipelineConfig, RegistryConfig, ReportConfig};
pub use error::{Error, Result};
pub use pipeline::RegistryAuditor;
pub use registry::RegistryClient;
pub use types::{CrateSummary, DatasetRow, Outcome, RunSummary, SkipReason, Verdict};
