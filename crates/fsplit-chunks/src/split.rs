//! Split: chunk writer and checksum producer, run concurrently
//!
//! Both tasks open the source file on their own handle and only read it.
//! They write disjoint names in the output directory (chunk files vs. the
//! checksum file). A failure in one task does not stop the other; the split
//! reports the first error observed once both have finished. Nothing is
//! rolled back: a failed split leaves whatever it wrote in place.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fsplit_core::{ChunkConfig, FsplitError, FsplitResult, SplitRequest};
use fsplit_crypto::ChunkCipher;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::checksum::produce_checksum;
use crate::engine::ChunkEngine;
use crate::plan::{create_output_dir, SplitPlan};

/// Result of a successful split
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub output_dir: PathBuf,
    /// Chunk files actually written
    pub chunks: u64,
    /// Planned upper bound (sets the name width)
    pub planned_chunks: u64,
    pub bytes: u64,
    /// Plaintext SHA-256 of the source
    pub digest: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkStats {
    chunks: u64,
    bytes: u64,
}

enum TaskOutcome {
    Chunks(FsplitResult<ChunkStats>),
    Checksum(FsplitResult<Vec<u8>>),
}

impl ChunkEngine {
    /// Split `request`'s source file into chunks of `config` size.
    ///
    /// Fails before touching the filesystem on an unknown unit or a missing
    /// key, and with `DirectoryExists` if the split directory is present.
    pub async fn split(
        &self,
        request: &SplitRequest,
        config: &ChunkConfig,
    ) -> FsplitResult<SplitReport> {
        let source = request.source_path();
        let cipher = self.cipher_for(request.encrypted, FsplitError::Encryption)?;

        let meta = tokio::fs::metadata(&source)
            .await
            .map_err(|e| FsplitError::read(&source, e))?;
        if !meta.is_file() {
            return Err(FsplitError::read(
                &source,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let plan = SplitPlan::new(
            meta.len(),
            config,
            self.layout.output_dir_for(&request.file_name),
        )?;
        create_output_dir(&plan.output_dir).await?;

        info!(
            source = %source.display(),
            output = %plan.output_dir.display(),
            bytes = plan.total_size,
            chunk_bytes = plan.bytes_per_chunk,
            planned_chunks = plan.chunk_count,
            encrypted = request.encrypted,
            "splitting"
        );

        let plan = Arc::new(plan);
        let checksum_path = plan.output_dir.join(&self.layout.checksum_file_name);
        let (tx, mut rx) = mpsc::channel(2);

        let chunk_task = {
            let engine = self.clone();
            let plan = Arc::clone(&plan);
            let source = source.clone();
            let cipher = cipher.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = engine.write_chunks(&source, &plan, cipher.as_ref()).await;
                let _ = tx.send(TaskOutcome::Chunks(result)).await;
            })
        };

        let checksum_task = {
            let source = source.clone();
            let checksum_path = checksum_path.clone();
            tokio::spawn(async move {
                let result = produce_checksum(&source, &checksum_path, cipher.as_ref()).await;
                let _ = tx.send(TaskOutcome::Checksum(result)).await;
            })
        };

        let mut first_error: Option<FsplitError> = None;
        let mut stats = None;
        let mut digest = None;

        while let Some(outcome) = rx.recv().await {
            let failure = match outcome {
                TaskOutcome::Chunks(Ok(s)) => {
                    stats = Some(s);
                    None
                }
                TaskOutcome::Checksum(Ok(d)) => {
                    digest = Some(d);
                    None
                }
                TaskOutcome::Chunks(Err(e)) => Some(("chunk writer", e)),
                TaskOutcome::Checksum(Err(e)) => Some(("checksum", e)),
            };
            if let Some((task, err)) = failure {
                warn!(task, error = %err, "split task failed");
                first_error.get_or_insert(err);
            }
        }

        // A task that panicked never sent its outcome; surface that here.
        for (task, handle) in [("chunk writer", chunk_task), ("checksum", checksum_task)] {
            if let Err(e) = handle.await {
                warn!(task, error = %e, "split task aborted");
                first_error.get_or_insert(FsplitError::Task(format!("{task}: {e}")));
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        match (stats, digest) {
            (Some(stats), Some(digest)) => {
                info!(
                    output = %plan.output_dir.display(),
                    chunks = stats.chunks,
                    bytes = stats.bytes,
                    "split complete"
                );
                Ok(SplitReport {
                    output_dir: plan.output_dir.clone(),
                    chunks: stats.chunks,
                    planned_chunks: plan.chunk_count,
                    bytes: stats.bytes,
                    digest,
                })
            }
            _ => Err(FsplitError::Task("split task finished without a result".into())),
        }
    }

    /// Sequentially read `plan.bytes_per_chunk`-sized pieces of `source` and
    /// write each to its numbered chunk file.
    ///
    /// Stops at the first empty read, so an exact-multiple source gets no
    /// trailing empty chunk.
    async fn write_chunks(
        &self,
        source: &Path,
        plan: &SplitPlan,
        cipher: Option<&Arc<dyn ChunkCipher>>,
    ) -> FsplitResult<ChunkStats> {
        let mut file = tokio::fs::File::open(source)
            .await
            .map_err(|e| FsplitError::read(source, e))?;

        let mut buf = vec![0u8; plan.buffer_len()];
        let mut stats = ChunkStats { chunks: 0, bytes: 0 };

        for index in 0..plan.chunk_count {
            let n = read_full(&mut file, &mut buf)
                .await
                .map_err(|e| FsplitError::read(source, e))?;
            if n == 0 {
                break;
            }

            let payload = match cipher {
                Some(cipher) => Cow::Owned(cipher.encrypt(&buf[..n]).map_err(|e| {
                    FsplitError::Encryption(format!("chunk {index}: {e:#}"))
                })?),
                None => Cow::Borrowed(&buf[..n]),
            };

            let path = plan.chunk_path(&self.layout.chunk_file_prefix, index);
            tokio::fs::write(&path, &*payload)
                .await
                .map_err(|e| FsplitError::write(&path, e))?;

            stats.chunks += 1;
            stats.bytes += n as u64;
            debug!(chunk = %path.display(), bytes = n, "chunk written");

            let name = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.report(index + 1, plan.chunk_count, &name);
        }

        Ok(stats)
    }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
