//! Key derivation: Argon2id passphrase → chunk key

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::keys::ChunkKey;
use crate::{KEY_SIZE, SALT_SIZE};

/// Argon2id parameters for KDF
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Fixed-size salt from a configured salt string (first 16 bytes of its SHA-256).
///
/// Split directories carry no key material, so the salt has to be
/// reproducible from configuration alone for a later merge.
pub fn salt_from_str(salt: &str) -> [u8; SALT_SIZE] {
    let digest = Sha256::digest(salt.as_bytes());
    let mut out = [0u8; SALT_SIZE];
    out.copy_from_slice(&digest[..SALT_SIZE]);
    out
}

/// Derive a 256-bit chunk key from a passphrase and salt using Argon2id.
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> anyhow::Result<ChunkKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;

    Ok(ChunkKey::from_bytes(key))
}
