//! Streaming dataset persistence
//!
//! Rows are appended one page at a time and flushed immediately, so the file
//! on disk is a valid, readable dataset prefix at any point the process is
//! interrupted between pages. Previously written rows are never rewritten or
//! reordered. The same module owns the reader used by report mode.

use crate::error::{Error, Result};
use crate::types::{DatasetRow, Verdict};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Column header of the dataset, fixed for the lifetime of a run
pub const DATASET_HEADER: [&str; 9] = [
    "name",
    "version",
    "upload_time",
    "downloads",
    "recent_downloads",
    "advisories",
    "bans",
    "licenses",
    "sources",
];

/// Append-only CSV writer for dataset rows
pub struct DatasetWriter {
    file: File,
    path: PathBuf,
}

impl DatasetWriter {
    /// Create (truncating) the dataset file and write its header
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).await?;
        let mut writer = Self {
            file,
            path: path.to_path_buf(),
        };
        writer.write_line(&DATASET_HEADER.join(",")).await?;
        writer.file.flush().await?;

        tracing::debug!(path = %writer.path.display(), "dataset created");
        Ok(writer)
    }

    /// Append one page's rows and flush
    ///
    /// Called once per page, immediately after that page's orchestration
    /// settles; the flush keeps the interruption guarantee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure; dataset writes are fatal to
    /// the run.
    pub async fn append_rows(&mut self, rows: &[DatasetRow]) -> Result<()> {
        for row in rows {
            self.write_line(&render_row(row)).await?;
        }
        self.file.flush().await?;
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.file.write_all(line.as_bytes()).await?;
        self.file.write_all(b"\n").await?;
        Ok(())
    }
}

fn render_row(row: &DatasetRow) -> String {
    [
        escape_field(&row.name),
        escape_field(&row.version),
        escape_field(&row.upload_time.to_rfc3339()),
        row.downloads.to_string(),
        row.recent_downloads.to_string(),
        row.verdict.advisories.to_string(),
        row.verdict.bans.to_string(),
        row.verdict.licenses.to_string(),
        row.verdict.sources.to_string(),
    ]
    .join(",")
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Read a dataset file produced by [`DatasetWriter`]
///
/// # Errors
///
/// Returns [`Error::Dataset`] if the header does not match the fixed schema
/// or any row fails to parse; [`Error::Io`] if the file cannot be read.
pub fn read_rows(path: &Path) -> Result<Vec<DatasetRow>> {
    let raw = std::fs::read_to_string(path)?;
    let mut lines = raw.lines();

    let header = lines.next().ok_or_else(|| {
        Error::Dataset(format!("'{}' is empty", path.display()))
    })?;
    if header != DATASET_HEADER.join(",") {
        return Err(Error::Dataset(format!(
            "'{}' has an unexpected header: {header:?}",
            path.display()
        )));
    }

    let mut rows = Vec::new();
    for (number, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        rows.push(parse_row(line).map_err(|message| {
            Error::Dataset(format!(
                "'{}' line {}: {}",
                path.display(),
                number + 2,
                message
            ))
        })?);
    }
    Ok(rows)
}

fn parse_row(line: &str) -> std::result::Result<DatasetRow, String> {
    let fields = split_csv_line(line);
    if fields.len() != DATASET_HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            DATASET_HEADER.len(),
            fields.len()
        ));
    }

    let upload_time = DateTime::parse_from_rfc3339(&fields[2])
        .map_err(|e| format!("bad upload_time {:?}: {e}", fields[2]))?
        .with_timezone(&Utc);

    Ok(DatasetRow {
        name: fields[0].clone(),
        version: fields[1].clone(),
        upload_time,
        downloads: parse_count(&fields[3], "downloads")?,
        recent_downloads: parse_count(&fields[4], "recent_downloads")?,
        verdict: Verdict {
            advisories: parse_bool(&fields[5], "advisories")?,
            bans: parse_bool(&fields[6], "bans")?,
            licenses: parse_bool(&fields[7], "licenses")?,
            sources: parse_bool(&fields[8], "sources")?,
        },
    })
}

fn parse_count(field: &str, column: &str) -> std::result::Result<u64, String> {
    field
        .parse()
        .map_err(|e| format!("bad {column} {field:?}: {e}"))
}

fn parse_bool(field: &str, column: &str) -> std::result::Result<bool, String> {
    match field {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("bad {column} {other:?}: expected true or false")),
    }
}

/// Split one CSV line into fields, honoring double-quote escaping
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_row(name: &str, downloads: u64, bans: bool) -> DatasetRow {
        DatasetRow {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            upload_time: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            downloads,
            recent_downloads: downloads / 10,
            verdict: Verdict {
                advisories: true,
                bans,
                licenses: true,
                sources: true,
            },
        }
    }

    #[tokio::test]
    async fn create_writes_the_fixed_header_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let _writer = DatasetWriter::create(&path).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "name,version,upload_time,downloads,recent_downloads,advisories,bans,licenses,sources\n"
        );
    }

    #[tokio::test]
    async fn file_is_a_valid_prefix_between_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = DatasetWriter::create(&path).await.unwrap();
        writer
            .append_rows(&[sample_row("alpha", 1000, true)])
            .await
            .unwrap();

        // read back while the writer is still alive, as a crashed run would
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "alpha");

        writer
            .append_rows(&[sample_row("beta", 50, false)])
            .await
            .unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "beta");
        assert!(!rows[1].verdict.bans);
    }

    #[tokio::test]
    async fn booleans_render_as_canonical_true_false_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = DatasetWriter::create(&path).await.unwrap();
        writer
            .append_rows(&[sample_row("alpha", 1000, false)])
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row_line = contents.lines().nth(1).unwrap();
        assert!(row_line.ends_with("true,false,true,true"));
    }

    #[tokio::test]
    async fn fields_with_commas_and_quotes_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut row = sample_row("alpha", 10, true);
        row.version = "1.0.0+weird,\"build\"".to_string();

        let mut writer = DatasetWriter::create(&path).await.unwrap();
        writer.append_rows(std::slice::from_ref(&row)).await.unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0].version, row.version);
    }

    #[test]
    fn read_rows_rejects_a_foreign_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();

        assert!(matches!(read_rows(&path), Err(Error::Dataset(_))));
    }

    #[test]
    fn read_rows_reports_the_offending_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(
            &path,
            format!(
                "{}\nalpha,1.0.0,2024-06-01T12:00:00+00:00,not-a-number,0,true,true,true,true\n",
                DATASET_HEADER.join(",")
            ),
        )
        .unwrap();

        let err = read_rows(&path).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("line 2"), "got: {rendered}");
    }
}
