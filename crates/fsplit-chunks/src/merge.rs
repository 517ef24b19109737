//! Merge: reassemble a split directory and verify it
//!
//! Entries are appended in ascending file-name order, which the chunk
//! naming scheme makes equal to chunk order. Only the checksum file is
//! skipped. On failure the partially written output is left in place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use fsplit_core::{FsplitError, FsplitResult, MergeRequest};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::checksum::verify_checksum;
use crate::engine::ChunkEngine;

/// Result of a successful, verified merge
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub output_path: PathBuf,
    pub chunks: u64,
    pub bytes: u64,
    /// SHA-256 of the reassembled file (equal to the stored checksum)
    pub digest: Vec<u8>,
}

/// Output file name for a split directory: its last path segment without `prefix`.
pub fn derive_output_name(dir: &Path, prefix: &str) -> FsplitResult<String> {
    let invalid = || FsplitError::InvalidDirectoryName {
        path: dir.to_path_buf(),
        prefix: prefix.to_string(),
    };

    let dir_name = dir.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    match dir_name.strip_prefix(prefix) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(invalid()),
    }
}

impl ChunkEngine {
    /// Reassemble `request.dir` into `<output_root>/<name>` and verify its checksum.
    pub async fn merge(&self, request: &MergeRequest) -> FsplitResult<MergeReport> {
        let cipher = self.cipher_for(request.encrypted, FsplitError::Decryption)?;

        match tokio::fs::metadata(&request.dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(FsplitError::DirectoryNotFound(request.dir.clone())),
        }

        let name = match &request.output_name {
            Some(name) => name.clone(),
            None => derive_output_name(&request.dir, &self.layout.output_dir_prefix)?,
        };

        let entries = self.list_chunks(&request.dir).await?;
        let total = entries.len() as u64;
        let output_path = self.layout.output_root.join(&name);

        info!(
            dir = %request.dir.display(),
            output = %output_path.display(),
            chunks = total,
            encrypted = request.encrypted,
            "merging"
        );

        let mut output = tokio::fs::File::create(&output_path)
            .await
            .map_err(|e| FsplitError::write(&output_path, e))?;

        let mut bytes = 0u64;
        for (i, entry) in entries.iter().enumerate() {
            let data = tokio::fs::read(entry)
                .await
                .map_err(|e| FsplitError::read(entry, e))?;

            let data = match &cipher {
                Some(cipher) => cipher.decrypt(&data).map_err(|e| {
                    FsplitError::Decryption(format!("{}: {e:#}", entry.display()))
                })?,
                None => data,
            };

            output
                .write_all(&data)
                .await
                .map_err(|e| FsplitError::write(&output_path, e))?;
            bytes += data.len() as u64;

            debug!(chunk = %entry.display(), bytes = data.len(), "chunk appended");
            let chunk_name = entry
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.report(i as u64 + 1, total, &chunk_name);
        }

        output
            .flush()
            .await
            .map_err(|e| FsplitError::write(&output_path, e))?;
        drop(output);

        let checksum_path = request.dir.join(&self.layout.checksum_file_name);
        let verification = verify_checksum(&output_path, &checksum_path, cipher.as_ref()).await?;
        if !verification.matches() {
            return Err(FsplitError::ChecksumMismatch(output_path));
        }

        info!(
            output = %output_path.display(),
            chunks = total,
            bytes,
            sha256 = %hex::encode(&verification.actual),
            "merge verified"
        );

        Ok(MergeReport {
            output_path,
            chunks: total,
            bytes,
            digest: verification.actual,
        })
    }

    /// Every entry of `dir` except the checksum file, sorted by name.
    async fn list_chunks(&self, dir: &Path) -> FsplitResult<Vec<PathBuf>> {
        let mut reader = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| FsplitError::read(dir, e))?;

        let checksum = OsString::from(&self.layout.checksum_file_name);
        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsplitError::read(dir, e))?
        {
            let name = entry.file_name();
            if name != checksum {
                names.push(name);
            }
        }
        names.sort();

        Ok(names.into_iter().map(|n| dir.join(n)).collect())
    }
}
