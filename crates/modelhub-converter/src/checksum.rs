//! Upload staging with a single-pass content hash.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::error::ConversionError;

const CHUNK_SIZE: usize = 64 * 1024;

/// An upload written to a scratch file, with its checksum.
///
/// The scratch file is deleted when this value is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    /// Base64-encoded SHA-256 of the uploaded bytes.
    pub checksum: String,
    /// Upload size in bytes.
    pub size: u64,
    /// File name declared by the uploader.
    pub file_name: String,
}

impl StagedUpload {
    /// Location of the scratch copy.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Stream `reader` into a scratch file under `staging_dir`, hashing as it goes.
pub async fn stage_upload<R>(
    mut reader: R,
    file_name: &str,
    staging_dir: &Path,
) -> Result<StagedUpload, ConversionError>
where
    R: AsyncRead + Unpin,
{
    tokio::fs::create_dir_all(staging_dir).await?;
    let (file, path) = tempfile::Builder::new()
        .prefix(".upload-")
        .suffix(".zip")
        .tempfile_in(staging_dir)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut hasher = Sha256::new();
    let mut size = 0u64;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        file.write_all(&buffer[..n]).await?;
        size += n as u64;
    }
    file.flush().await?;
    file.sync_all().await?;

    let checksum = STANDARD.encode(hasher.finalize());
    debug!(file_name, size, checksum = %checksum, "Upload staged");

    Ok(StagedUpload {
        path,
        checksum,
        size,
        file_name: file_name.to_string(),
    })
}
