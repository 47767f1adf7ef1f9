//! Per-item scratch directories

use std::path::Path;
use tempfile::TempDir;

/// Isolated scratch directory for one item's download, extraction, and check
///
/// Each item owns a uniquely named directory, so concurrent items never
/// contend on paths. The directory and everything under it is removed when
/// the value is dropped — success, skip, and early-return paths all release
/// through the same destructor.
#[derive(Debug)]
pub struct WorkingArea {
    dir: TempDir,
}

impl WorkingArea {
    /// Create a working area for one (name, version) item
    ///
    /// # Arguments
    ///
    /// * `scratch_dir` - Parent directory; the system temp dir when `None`
    /// * `name` - Crate name, used in the directory prefix for debuggability
    /// * `version` - Crate version, likewise
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the directory cannot be created.
    pub fn create(
        scratch_dir: Option<&Path>,
        name: &str,
        version: &str,
    ) -> std::io::Result<Self> {
        let prefix = format!("{name}-{version}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match scratch_dir {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        Ok(Self { dir })
    }

    /// Path of the scratch directory
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_places_directory_under_scratch_root() {
        let root = tempfile::tempdir().unwrap();
        let work = WorkingArea::create(Some(root.path()), "serde", "1.0.0").unwrap();

        assert!(work.path().starts_with(root.path()));
        assert!(work.path().is_dir());
    }

    #[test]
    fn drop_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let work = WorkingArea::create(Some(root.path()), "serde", "1.0.0").unwrap();
            std::fs::write(work.path().join("artifact.crate"), b"payload").unwrap();
            work.path().to_path_buf()
        };

        assert!(!path.exists(), "working area must not outlive its item");
    }

    #[test]
    fn two_items_with_same_name_get_distinct_directories() {
        let root = tempfile::tempdir().unwrap();
        let a = WorkingArea::create(Some(root.path()), "serde", "1.0.0").unwrap();
        let b = WorkingArea::create(Some(root.path()), "serde", "1.0.0").unwrap();

        assert_ne!(a.path(), b.path());
    }
}
