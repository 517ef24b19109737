//! Chunk key generation and key file persistence
//!
//! Key file format: the 32 key bytes, standard base64, one line.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use std::io::Write;
use std::path::Path;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// A 256-bit chunk encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct ChunkKey {
    bytes: [u8; KEY_SIZE],
}

impl ChunkKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ChunkKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit chunk key.
pub fn generate_key() -> ChunkKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    ChunkKey::from_bytes(bytes)
}

/// Write `key` to a new key file. Refuses to overwrite an existing file.
pub fn save_key_file(path: &Path, key: &ChunkKey) -> anyhow::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| anyhow::anyhow!("creating key file {}: {e}", path.display()))?;

    let mut encoded = STANDARD.encode(key.as_bytes());
    encoded.push('\n');
    let written = file.write_all(encoded.as_bytes());
    encoded.zeroize();
    written.map_err(|e| anyhow::anyhow!("writing key file {}: {e}", path.display()))?;

    tracing::debug!(path = %path.display(), "key file written");
    Ok(())
}

/// Read a key file produced by [`save_key_file`].
pub fn load_key_file(path: &Path) -> anyhow::Result<ChunkKey> {
    let mut content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading key file {}: {e}", path.display()))?;

    let decoded = STANDARD.decode(content.trim());
    content.zeroize();
    let mut decoded =
        decoded.map_err(|e| anyhow::anyhow!("key file {} is not base64: {e}", path.display()))?;

    if decoded.len() != KEY_SIZE {
        let len = decoded.len();
        decoded.zeroize();
        anyhow::bail!(
            "key file {} holds {} bytes (expected {})",
            path.display(),
            len,
            KEY_SIZE
        );
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&decoded);
    decoded.zeroize();

    Ok(ChunkKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_generation() {
        let k1 = generate_key();
        let k2 = generate_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_key_file_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fsplit.key");
        let key = generate_key();

        save_key_file(&path, &key).unwrap();
        let loaded = load_key_file(&path).unwrap();

        assert_eq!(key.as_bytes(), loaded.as_bytes());
    }

    #[test]
    fn test_key_file_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fsplit.key");
        let first = generate_key();

        save_key_file(&path, &first).unwrap();
        assert!(save_key_file(&path, &generate_key()).is_err());
        assert_eq!(load_key_file(&path).unwrap().as_bytes(), first.as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fsplit.key");
        save_key_file(&path, &generate_key()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_rejects_wrong_length() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("short.key");
        std::fs::write(&path, STANDARD.encode([1u8; 16])).unwrap();

        let err = load_key_file(&path).unwrap_err();
        assert!(err.to_string().contains("expected 32"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("garbage.key");
        std::fs::write(&path, "not base64 at all!").unwrap();

        assert!(load_key_file(&path).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ChunkKey::from_bytes([9u8; KEY_SIZE]);
        assert!(format!("{key:?}").contains("REDACTED"));
    }
}
