//! Crawl pipeline: the driver and per-page orchestration
//!
//! The driver walks the registry one page at a time — fetch listing,
//! orchestrate the page's concurrent fetch+extract+check units, append the
//! resulting rows, advance the cursor. A page is always fully processed
//! before the next page's fetch begins, which is also the pipeline's only
//! backpressure: in-flight work never exceeds one page's worth of items.

mod page;

use crate::checker::{CliPolicyChecker, PolicyChecker};
use crate::config::Config;
use crate::dataset::DatasetWriter;
use crate::error::Result;
use crate::registry::RegistryClient;
use crate::types::RunSummary;
use std::sync::Arc;

/// The crawl driver
///
/// Owns the shared HTTP client, the policy checker, and the configuration;
/// [`run`](RegistryAuditor::run) executes one complete crawl.
pub struct RegistryAuditor {
    config: Config,
    client: RegistryClient,
    checker: Arc<dyn PolicyChecker>,
}

impl RegistryAuditor {
    /// Build an auditor with the CLI policy checker from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation, or an
    /// external-tool error if the checker binary cannot be located.
    pub fn new(config: Config) -> Result<Self> {
        let checker = Arc::new(CliPolicyChecker::from_config(&config.checker)?);
        Self::with_checker(config, checker)
    }

    /// Build an auditor around a caller-provided checker implementation
    ///
    /// This is the seam tests use to substitute scripted checkers.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn with_checker(config: Config, checker: Arc<dyn PolicyChecker>) -> Result<Self> {
        config.validate()?;
        let client = RegistryClient::new(&config.registry)?;
        Ok(Self {
            config,
            client,
            checker,
        })
    }

    /// Crawl the registry until the listing cursor is exhausted
    ///
    /// Streams rows to the configured dataset path page by page and reports
    /// progress after each page. Re-running restarts pagination from the
    /// beginning; there is no persisted resume cursor.
    ///
    /// # Errors
    ///
    /// A listing fetch or dataset write failure aborts the run. Per-item
    /// failures never do; they are counted in the returned summary instead.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut writer = DatasetWriter::create(&self.config.pipeline.dataset_path).await?;
        let mut summary = RunSummary::default();
        let mut query = self.config.registry.initial_query.clone();

        loop {
            let listing = self.client.fetch_page(&query).await?;
            summary.reported_total = listing.meta.total;
            summary.discovered += listing.crates.len() as u64;

            let outcome = page::process_page(
                &self.client,
                self.checker.as_ref(),
                &self.config.pipeline,
                listing.crates,
            )
            .await;

            writer.append_rows(&outcome.rows).await?;
            summary.rows_written += outcome.rows.len() as u64;
            summary.skipped += outcome.skipped;
            summary.yanked += outcome.yanked;

            let percent = if summary.reported_total == 0 {
                100.0
            } else {
                summary.discovered as f64 / summary.reported_total as f64 * 100.0
            };
            tracing::info!(
                processed = summary.discovered,
                total = summary.reported_total,
                rows_written = summary.rows_written,
                progress = format!("{percent:.2}%"),
                "page complete"
            );

            match listing.meta.next_page {
                Some(next) => query = next,
                None => break,
            }
        }

        tracing::info!(
            discovered = summary.discovered,
            rows_written = summary.rows_written,
            skipped = summary.skipped,
            yanked = summary.yanked,
            "crawl finished"
        );

        Ok(summary)
    }
}
