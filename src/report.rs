//! Offline dataset analysis
//!
//! Report mode re-reads one or more dataset files produced by earlier crawls,
//! concatenates them, applies conservative name de-duplication, and renders
//! per-category failure rates plus a download-count histogram over the
//! failing rows of each category.
//!
//! De-duplication is deliberately conservative: any crate name appearing more
//! than once across the combined input is excluded entirely — ambiguous names
//! are never resolved by "first" or "latest".

use crate::config::ReportConfig;
use crate::dataset;
use crate::error::Result;
use crate::types::{DatasetRow, Verdict};
use std::collections::HashMap;
use std::path::PathBuf;

/// Policy categories in dataset column order
pub const POLICY_CATEGORIES: [&str; 4] = ["advisories", "bans", "licenses", "sources"];

/// Failure statistics for one policy category
#[derive(Clone, Debug)]
pub struct CategoryReport {
    /// Category name
    pub category: &'static str,
    /// Rows whose verdict failed this category
    pub failures: u64,
    /// Download-count histogram over the failing rows: (bin label, count)
    pub histogram: Vec<(String, u64)>,
}

impl CategoryReport {
    /// Failure rate over the de-duplicated row set, in percent
    #[must_use]
    pub fn failure_rate(&self, total_rows: u64) -> f64 {
        if total_rows == 0 {
            0.0
        } else {
            self.failures as f64 / total_rows as f64 * 100.0
        }
    }
}

/// The complete offline report
#[derive(Clone, Debug)]
pub struct Report {
    /// Rows surviving de-duplication
    pub total_rows: u64,
    /// Rows dropped because their crate name appeared more than once
    pub dropped_duplicates: u64,
    /// Per-category statistics, in dataset column order
    pub categories: Vec<CategoryReport>,
}

/// Build a report from one or more dataset files
///
/// # Errors
///
/// Returns an error if any input file cannot be read or fails dataset
/// validation.
pub fn build_report(files: &[PathBuf], config: &ReportConfig) -> Result<Report> {
    let mut rows = Vec::new();
    for file in files {
        rows.extend(dataset::read_rows(file)?);
    }

    let mut name_counts: HashMap<&str, u64> = HashMap::new();
    for row in &rows {
        *name_counts.entry(row.name.as_str()).or_insert(0) += 1;
    }
    let unique: Vec<&DatasetRow> = rows
        .iter()
        .filter(|row| name_counts.get(row.name.as_str()).copied() == Some(1))
        .collect();
    let dropped_duplicates = (rows.len() - unique.len()) as u64;

    let categories = POLICY_CATEGORIES
        .iter()
        .map(|&category| {
            let failing: Vec<&&DatasetRow> = unique
                .iter()
                .filter(|row| !category_passed(&row.verdict, category))
                .collect();
            CategoryReport {
                category,
                failures: failing.len() as u64,
                histogram: histogram(
                    failing.iter().map(|row| row.downloads),
                    &config.download_bin_edges,
                ),
            }
        })
        .collect();

    Ok(Report {
        total_rows: unique.len() as u64,
        dropped_duplicates,
        categories,
    })
}

fn category_passed(verdict: &Verdict, category: &str) -> bool {
    match category {
        "advisories" => verdict.advisories,
        "bans" => verdict.bans,
        "licenses" => verdict.licenses,
        "sources" => verdict.sources,
        other => unreachable!("unknown policy category {other:?}"),
    }
}

/// Bin values into right-closed intervals over `edges`, plus one open bin
///
/// An edge list `[0, 100, 1000]` produces bins `(0, 100]`, `(100, 1000]`,
/// and `(1000, inf)`. Values at or below the first edge fall outside every
/// bin and are not counted.
#[must_use]
pub fn histogram(values: impl Iterator<Item = u64>, edges: &[u64]) -> Vec<(String, u64)> {
    let mut counts = vec![0u64; edges.len()];
    for value in values {
        if value <= edges[0] {
            continue;
        }
        let bin = edges[1..]
            .iter()
            .position(|&upper| value <= upper)
            .unwrap_or(edges.len() - 1);
        counts[bin] += 1;
    }

    let mut bins = Vec::with_capacity(edges.len());
    for pair in edges.windows(2) {
        bins.push(format!("({}, {}]", pair[0], pair[1]));
    }
    bins.push(format!("({}, inf)", edges[edges.len() - 1]));

    bins.into_iter().zip(counts).collect()
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total crates amount: {}", self.total_rows)?;
        if self.dropped_duplicates > 0 {
            writeln!(
                f,
                "Dropped {} rows with duplicated names",
                self.dropped_duplicates
            )?;
        }
        for category in &self.categories {
            writeln!(
                f,
                "{} failure: {}/{} = {:.2}%",
                capitalize(category.category),
                category.failures,
                self.total_rows,
                category.failure_rate(self.total_rows)
            )?;
        }
        for category in &self.categories {
            writeln!(f)?;
            writeln!(
                f,
                "Downloads distribution ({} = false):",
                category.category
            )?;
            for (label, count) in &category.histogram {
                writeln!(f, "  {label:<22} {count}")?;
            }
        }
        Ok(())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DATASET_HEADER;
    use std::path::Path;

    fn write_dataset(path: &Path, rows: &[(&str, u64, [bool; 4])]) {
        let mut contents = DATASET_HEADER.join(",");
        contents.push('\n');
        for (name, downloads, verdict) in rows {
            contents.push_str(&format!(
                "{name},1.0.0,2024-06-01T12:00:00+00:00,{downloads},{},{},{},{},{}\n",
                downloads / 10,
                verdict[0],
                verdict[1],
                verdict[2],
                verdict[3],
            ));
        }
        std::fs::write(path, contents).unwrap();
    }

    const ALL_OK: [bool; 4] = [true, true, true, true];

    #[test]
    fn duplicate_names_across_files_are_dropped_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        // "foo" appears once per file — both copies must go
        write_dataset(&first, &[("foo", 100, ALL_OK), ("bar", 10, ALL_OK)]);
        write_dataset(&second, &[("foo", 100, ALL_OK), ("baz", 10, ALL_OK)]);

        let report = build_report(&[first, second], &ReportConfig::default()).unwrap();

        assert_eq!(report.total_rows, 2, "only bar and baz survive");
        assert_eq!(report.dropped_duplicates, 2);
    }

    #[test]
    fn failure_counts_and_rates_are_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        write_dataset(
            &path,
            &[
                ("a", 500, [true, false, true, true]),
                ("b", 5_000, [true, false, false, true]),
                ("c", 50, ALL_OK),
                ("d", 50, ALL_OK),
            ],
        );

        let report = build_report(&[path], &ReportConfig::default()).unwrap();

        assert_eq!(report.total_rows, 4);
        let bans = &report.categories[1];
        assert_eq!(bans.category, "bans");
        assert_eq!(bans.failures, 2);
        assert!((bans.failure_rate(report.total_rows) - 50.0).abs() < f64::EPSILON);
        let licenses = &report.categories[2];
        assert_eq!(licenses.failures, 1);
        assert_eq!(report.categories[0].failures, 0);
    }

    #[test]
    fn histogram_uses_right_closed_bins_with_an_open_tail() {
        let edges = [0u64, 100, 1_000];
        let values = [0u64, 1, 100, 101, 1_000, 1_001, 50_000];

        let bins = histogram(values.into_iter(), &edges);

        assert_eq!(bins[0], ("(0, 100]".to_string(), 2)); // 1 and 100; 0 is uncounted
        assert_eq!(bins[1], ("(100, 1000]".to_string(), 2)); // 101 and 1000
        assert_eq!(bins[2], ("(1000, inf)".to_string(), 2)); // 1001 and 50000
    }

    #[test]
    fn histogram_only_covers_failing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        write_dataset(
            &path,
            &[
                ("a", 500, [false, true, true, true]),
                ("b", 5_000, ALL_OK),
            ],
        );

        let report = build_report(&[path], &ReportConfig::default()).unwrap();

        let advisories = &report.categories[0];
        let counted: u64 = advisories.histogram.iter().map(|(_, count)| count).sum();
        assert_eq!(counted, 1, "only the failing row is binned");
    }

    #[test]
    fn empty_input_reports_zero_rates_without_dividing_by_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_dataset(&path, &[]);

        let report = build_report(&[path], &ReportConfig::default()).unwrap();

        assert_eq!(report.total_rows, 0);
        assert!(report.categories[0].failure_rate(0).abs() < f64::EPSILON);
        // rendering must not panic
        let _ = report.to_string();
    }

    #[test]
    fn display_includes_rates_and_histograms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        write_dataset(&path, &[("a", 500, [true, false, true, true])]);

        let report = build_report(&[path], &ReportConfig::default()).unwrap();
        let rendered = report.to_string();

        assert!(rendered.contains("Total crates amount: 1"));
        assert!(rendered.contains("Bans failure: 1/1 = 100.00%"));
        assert!(rendered.contains("Downloads distribution (bans = false):"));
        assert!(rendered.contains("(100, 1000]"));
    }
}
