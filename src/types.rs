//! Core types for registry-audit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Summary of one crate as listed by the registry
///
/// Deserialized straight from one entry of the registry's listing response.
/// Immutable once read; it is either turned into a [`DatasetRow`] or dropped
/// when its item is skipped.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CrateSummary {
    /// Crate name, unique within a crawl
    pub name: String,

    /// Newest published version, the one whose artifact is audited
    #[serde(rename = "newest_version")]
    pub version: String,

    /// Upload timestamp of the newest version
    #[serde(rename = "updated_at")]
    pub upload_time: DateTime<Utc>,

    /// All-time download count
    #[serde(default)]
    pub downloads: u64,

    /// Downloads over the registry's recent window (null for very new crates)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub recent_downloads: u64,

    /// Whether the crate has been withdrawn from the registry
    ///
    /// The initial listing query already excludes yanked crates, but the flag
    /// is re-checked before dispatching work for an item.
    #[serde(default)]
    pub yanked: bool,
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Per-category result of one successful checker invocation
///
/// Field order matches the checker's output protocol: advisories, bans,
/// licenses, sources. A `Verdict` only exists when the checker actually ran
/// and produced parseable output — "could not determine" is represented by
/// [`Outcome::Skipped`], never by `false` fields here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Security advisories check passed
    pub advisories: bool,
    /// Banned-dependency check passed
    pub bans: bool,
    /// License check passed
    pub licenses: bool,
    /// Source-allowlist check passed
    pub sources: bool,
}

impl Verdict {
    /// Whether every category passed
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.advisories && self.bans && self.licenses && self.sources
    }
}

/// Why an item produced no dataset row
///
/// Skips are counted and logged but never abort the run, and the reason is
/// retained so skip causes stay observable in logs and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The scratch directory for the item could not be created
    WorkingAreaFailed {
        /// Underlying I/O failure
        message: String,
    },
    /// The artifact download declared a media type other than the expected one
    UnexpectedContentType {
        /// The media type the server actually declared
        found: String,
    },
    /// Network or filesystem failure while downloading the artifact
    TransferFailed {
        /// Underlying failure
        message: String,
    },
    /// The downloaded archive could not be opened or walked
    ExtractionFailed {
        /// Underlying failure
        message: String,
    },
    /// The checker process could not be started or awaited
    CheckerFailed {
        /// Underlying failure
        message: String,
    },
    /// The checker ran but produced no stdout
    EmptyCheckerOutput,
    /// The checker's stdout did not match the four-field protocol
    MalformedCheckerOutput {
        /// The offending stdout, kept verbatim for diagnostics
        output: String,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkingAreaFailed { message } => {
                write!(f, "working area unavailable: {message}")
            }
            Self::UnexpectedContentType { found } => {
                write!(f, "unexpected content type: {found}")
            }
            Self::TransferFailed { message } => write!(f, "transfer failed: {message}"),
            Self::ExtractionFailed { message } => write!(f, "extraction failed: {message}"),
            Self::CheckerFailed { message } => write!(f, "checker failed: {message}"),
            Self::EmptyCheckerOutput => write!(f, "no checker output"),
            Self::MalformedCheckerOutput { output } => {
                write!(f, "unparseable checker output: {output:?}")
            }
        }
    }
}

/// Result of one item's fetch → extract → check cycle
///
/// A two-variant sum rather than `Option<Verdict>` so that "determined to be
/// non-compliant" (a `Verdict` with `false` fields) and "could not determine"
/// (`Skipped`) remain distinguishable all the way through the pipeline.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// The checker ran to completion and reported per-category results
    Verdict(Verdict),
    /// No verdict could be obtained; the item produces no row
    Skipped(SkipReason),
}

/// One line of the output dataset
///
/// Crate metadata concatenated with the verdict fields — nine columns, schema
/// fixed for the lifetime of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetRow {
    /// Crate name
    pub name: String,
    /// Audited version
    pub version: String,
    /// Upload timestamp of the audited version
    pub upload_time: DateTime<Utc>,
    /// All-time download count
    pub downloads: u64,
    /// Recent-window download count
    pub recent_downloads: u64,
    /// The parsed checker verdict
    pub verdict: Verdict,
}

impl DatasetRow {
    /// Combine a crate's listing metadata with its checker verdict
    #[must_use]
    pub fn from_summary(summary: &CrateSummary, verdict: Verdict) -> Self {
        Self {
            name: summary.name.clone(),
            version: summary.version.clone(),
            upload_time: summary.upload_time,
            downloads: summary.downloads,
            recent_downloads: summary.recent_downloads,
            verdict,
        }
    }
}

/// Counters accumulated over a whole crawl
///
/// `rows_written` is the authoritative success count; the gap between
/// `discovered` and `rows_written` is the sum of yanked and skipped items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items listed by the registry across all pages
    pub discovered: u64,
    /// Items dropped because the registry marked them withdrawn
    pub yanked: u64,
    /// Items that could not be verdicted
    pub skipped: u64,
    /// Rows appended to the dataset
    pub rows_written: u64,
    /// Total item count the registry reported for the query
    pub reported_total: u64,
}
