//! SHA-256 checksum of the plaintext source
//!
//! The digest is always taken over plaintext: the source file at split time,
//! the reassembled file at merge time. With encryption on, only the 32
//! digest bytes are encrypted before they are stored.

use std::path::Path;
use std::sync::Arc;

use fsplit_core::{FsplitError, FsplitResult};
use fsplit_crypto::ChunkCipher;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Length of a raw SHA-256 digest
pub const DIGEST_SIZE: usize = 32;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Stream a file through SHA-256.
///
/// Failing to open the file is a read error; failing mid-stream is a hash error.
pub async fn digest_file(path: &Path) -> FsplitResult<Vec<u8>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| FsplitError::read(path, e))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| FsplitError::hash(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_vec())
}

/// Hash `source` and write the (optionally encrypted) digest to `checksum_path`.
///
/// Returns the plaintext digest.
pub(crate) async fn produce_checksum(
    source: &Path,
    checksum_path: &Path,
    cipher: Option<&Arc<dyn ChunkCipher>>,
) -> FsplitResult<Vec<u8>> {
    let digest = digest_file(source).await?;

    let stored = match cipher {
        Some(cipher) => cipher
            .encrypt(&digest)
            .map_err(|e| FsplitError::Encryption(format!("checksum: {e:#}")))?,
        None => digest.clone(),
    };

    tokio::fs::write(checksum_path, &stored)
        .await
        .map_err(|e| FsplitError::write(checksum_path, e))?;

    debug!(
        source = %source.display(),
        sha256 = %hex::encode(&digest),
        "checksum written"
    );
    Ok(digest)
}

/// Outcome of comparing a reassembled file against its stored checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Digest stored at split time (decrypted if needed)
    pub expected: Vec<u8>,
    /// Digest of the reassembled file
    pub actual: Vec<u8>,
}

impl Verification {
    /// Raw byte comparison of the two digests.
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

/// Recompute the digest of `output` and compare it with the stored checksum.
pub async fn verify_checksum(
    output: &Path,
    checksum_path: &Path,
    cipher: Option<&Arc<dyn ChunkCipher>>,
) -> FsplitResult<Verification> {
    let actual = digest_file(output).await?;

    let stored = tokio::fs::read(checksum_path)
        .await
        .map_err(|e| FsplitError::read(checksum_path, e))?;

    let expected = match cipher {
        Some(cipher) => cipher
            .decrypt(&stored)
            .map_err(|e| FsplitError::Decryption(format!("checksum: {e:#}")))?,
        None => stored,
    };

    Ok(Verification { expected, actual })
}
