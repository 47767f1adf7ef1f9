//! Streamed artifact downloads

use crate::artifact::WorkingArea;
use crate::registry::RegistryClient;
use crate::types::{CrateSummary, SkipReason};
use futures::TryStreamExt;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// Download one crate's release artifact into its working area
///
/// The declared `Content-Type` is checked against the expected compressed
/// archive type before a single body byte is consumed; on mismatch the item
/// is skipped without reading further. On match the body is streamed to disk
/// in `chunk_size` pieces, so peak memory is bounded regardless of artifact
/// size.
///
/// # Returns
///
/// The path of the downloaded archive inside `work`, or the [`SkipReason`]
/// that disqualified the item.
pub async fn fetch_artifact(
    client: &RegistryClient,
    summary: &CrateSummary,
    work: &WorkingArea,
    chunk_size: usize,
) -> std::result::Result<PathBuf, SkipReason> {
    let url = client.artifact_url(&summary.name, &summary.version);

    let response = client
        .http()
        .get(&url)
        .send()
        .await
        .map_err(transfer_failed)?
        .error_for_status()
        .map_err(transfer_failed)?;

    let declared = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    if declared != client.expected_artifact_content_type() {
        return Err(SkipReason::UnexpectedContentType { found: declared });
    }

    let archive_path = work
        .path()
        .join(format!("{}-{}.crate", summary.name, summary.version));

    let mut reader = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));
    let mut file = tokio::fs::File::create(&archive_path)
        .await
        .map_err(transfer_failed)?;

    // Fixed-size copy loop; the buffer is the only body-sized allocation.
    let mut buf = vec![0u8; chunk_size];
    loop {
        let read = reader.read(&mut buf).await.map_err(transfer_failed)?;
        if read == 0 {
            break;
        }
        file.write_all(&buf[..read]).await.map_err(transfer_failed)?;
    }
    file.flush().await.map_err(transfer_failed)?;

    Ok(archive_path)
}

fn transfer_failed(error: impl std::fmt::Display) -> SkipReason {
    SkipReason::TransferFailed {
        message: error.to_string(),
    }
}
