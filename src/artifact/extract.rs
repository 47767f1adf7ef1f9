//! Archive extraction for downloaded artifacts
//!
//! Release artifacts are gzipped tarballs whose contents sit under a synthetic
//! `<name>-<version>/` wrapper directory; extraction strips exactly that one
//! leading component so the package root lands directly in the working area.

use crate::types::SkipReason;
use flate2::read::GzDecoder;
use std::path::{Component, Path, PathBuf};

/// Unpack a downloaded artifact into the working area
///
/// Decompression and tar walking are blocking, so the work runs on the
/// blocking thread pool. Failure to open or walk the archive converts to a
/// [`SkipReason`] here; archives that unpack fine but contain garbage are not
/// detected at this layer — they surface as empty or unparseable checker
/// output downstream.
pub async fn unpack_artifact(
    archive_path: &Path,
    dest: &Path,
) -> std::result::Result<(), SkipReason> {
    let archive_path = archive_path.to_path_buf();
    let dest = dest.to_path_buf();

    let unpacked = tokio::task::spawn_blocking(move || unpack_blocking(&archive_path, &dest)).await;

    match unpacked {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SkipReason::ExtractionFailed {
            message: e.to_string(),
        }),
        Err(e) => Err(SkipReason::ExtractionFailed {
            message: format!("unpack task failed: {e}"),
        }),
    }
}

fn unpack_blocking(archive_path: &Path, dest: &Path) -> std::io::Result<()> {
    let file = std::fs::File::open(archive_path)?;
    let decoder = GzDecoder::new(std::io::BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?;

        // Drop the synthetic top-level wrapper directory.
        let stripped: PathBuf = path.components().skip(1).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        // Reject entries that would land outside the working area.
        if stripped
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            continue;
        }

        let target = dest.join(&stripped);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }

    Ok(())
}
