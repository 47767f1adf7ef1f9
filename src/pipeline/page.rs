//! Per-page orchestration
//!
//! Fans out the fetch → extract → check composition for every surviving item
//! of a page, bounded by the configured concurrency limit, then recombines
//! outcomes with their originating metadata strictly by positional index —
//! completion order plays no part in attribution.

use crate::artifact::{WorkingArea, fetch_artifact, unpack_artifact};
use crate::checker::PolicyChecker;
use crate::config::PipelineConfig;
use crate::registry::RegistryClient;
use crate::types::{CrateSummary, DatasetRow, Outcome, SkipReason};
use futures::StreamExt;
use futures::stream;

/// Everything a page produced: ordered rows plus drop counters
pub(crate) struct PageOutcome {
    /// Rows for successfully verdicted items, in the page's filtered order
    pub rows: Vec<DatasetRow>,
    /// Items dropped up front because the registry marked them withdrawn
    pub yanked: u64,
    /// Items that could not be verdicted
    pub skipped: u64,
}

/// Process one page of listing results into dataset rows
pub(crate) async fn process_page(
    client: &RegistryClient,
    checker: &dyn PolicyChecker,
    config: &PipelineConfig,
    crates: Vec<CrateSummary>,
) -> PageOutcome {
    let listed = crates.len();
    let survivors: Vec<CrateSummary> = crates.into_iter().filter(|c| !c.yanked).collect();
    let yanked = (listed - survivors.len()) as u64;

    // Each unit carries its original index; completions arrive in any order.
    let indexed: Vec<(usize, Outcome)> = stream::iter(survivors.iter().enumerate())
        .map(|(index, summary)| async move {
            (index, audit_crate(client, checker, config, summary).await)
        })
        .buffer_unordered(config.max_concurrent_checks)
        .collect()
        .await;

    // Recombine by position, not completion order.
    let mut outcomes: Vec<Option<Outcome>> = vec![None; survivors.len()];
    for (index, outcome) in indexed {
        outcomes[index] = Some(outcome);
    }

    let mut rows = Vec::new();
    let mut skipped = 0u64;
    for (summary, outcome) in survivors.iter().zip(outcomes) {
        match outcome {
            Some(Outcome::Verdict(verdict)) => {
                rows.push(DatasetRow::from_summary(summary, verdict));
            }
            Some(Outcome::Skipped(reason)) => {
                skipped += 1;
                tracing::debug!(
                    crate_name = %summary.name,
                    version = %summary.version,
                    %reason,
                    "crate skipped"
                );
            }
            None => {
                // unreachable: every dispatched unit yields exactly one outcome
                skipped += 1;
                tracing::warn!(
                    crate_name = %summary.name,
                    version = %summary.version,
                    "unit produced no outcome"
                );
            }
        }
    }

    PageOutcome {
        rows,
        yanked,
        skipped,
    }
}

/// One item's fetch → extract → check cycle
///
/// The working area is created at the top and released when this function
/// returns — the same destructor runs on the verdict path, every skip path,
/// and any early return.
async fn audit_crate(
    client: &RegistryClient,
    checker: &dyn PolicyChecker,
    config: &PipelineConfig,
    summary: &CrateSummary,
) -> Outcome {
    let work = match WorkingArea::create(
        config.scratch_dir.as_deref(),
        &summary.name,
        &summary.version,
    ) {
        Ok(work) => work,
        Err(e) => {
            return Outcome::Skipped(SkipReason::WorkingAreaFailed {
                message: e.to_string(),
            });
        }
    };

    let archive = match fetch_artifact(client, summary, &work, config.download_chunk_size).await {
        Ok(path) => path,
        Err(reason) => return Outcome::Skipped(reason),
    };

    if let Err(reason) = unpack_artifact(&archive, work.path()).await {
        return Outcome::Skipped(reason);
    }

    checker.check(work.path()).await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use async_trait::async_trait;
    use std::path::Path;

    struct NeverChecker;

    #[async_trait]
    impl PolicyChecker for NeverChecker {
        async fn check(&self, _package_dir: &Path) -> Outcome {
            panic!("no surviving item should reach the checker");
        }

        fn name(&self) -> &'static str {
            "never"
        }
    }

    fn yanked_summary(name: &str) -> CrateSummary {
        CrateSummary {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            upload_time: chrono::Utc::now(),
            downloads: 0,
            recent_downloads: 0,
            yanked: true,
        }
    }

    #[tokio::test]
    async fn withdrawn_items_are_dropped_before_any_work_is_dispatched() {
        // no mock server mounted: a dispatched unit would fail loudly
        let client = RegistryClient::new(&RegistryConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..RegistryConfig::default()
        })
        .unwrap();
        let config = PipelineConfig::default();

        let outcome = process_page(
            &client,
            &NeverChecker,
            &config,
            vec![yanked_summary("a"), yanked_summary("b")],
        )
        .await;

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.yanked, 2);
        assert_eq!(outcome.skipped, 0);
    }
}
