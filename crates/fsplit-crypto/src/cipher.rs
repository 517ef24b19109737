//! Per-invocation XChaCha20-Poly1305 encryption/decryption
//!
//! Encrypted payload format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! No AAD and no state carried between calls: a chunk file (or the checksum
//! file) can be decrypted on its own with nothing but the key.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::keys::ChunkKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Opaque byte transform applied to chunk payloads and the checksum digest.
pub trait ChunkCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> anyhow::Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// [`ChunkCipher`] backed by XChaCha20-Poly1305.
pub struct XChaChaCipher {
    cipher: XChaCha20Poly1305,
}

impl XChaChaCipher {
    pub fn new(key: &ChunkKey) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }
}

impl std::fmt::Debug for XChaChaCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XChaChaCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl ChunkCipher for XChaChaCipher {
    /// Returns: `[24-byte nonce][ciphertext][16-byte tag]`
    fn encrypt(&self, plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| anyhow::anyhow!("chunk encryption failed: {e}"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(&self, encrypted: &[u8]) -> anyhow::Result<Vec<u8>> {
        if encrypted.len() < NONCE_SIZE + TAG_SIZE {
            anyhow::bail!(
                "encrypted payload too short: {} bytes (minimum {})",
                encrypted.len(),
                NONCE_SIZE + TAG_SIZE
            );
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let nonce = XNonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("chunk decryption failed: invalid key or corrupted data"))
    }
}
