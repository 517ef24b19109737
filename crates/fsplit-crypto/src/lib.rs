//! fsplit-crypto: the encryption capability behind `fsplit --encrypt`
//!
//! Every chunk payload and the checksum digest are encrypted independently:
//! ```text
//! Chunk key (256-bit, random key file or Argon2id from passphrase)
//!   └── XChaCha20-Poly1305 per invocation (nonce = random 192-bit)
//!       output = [24-byte nonce][ciphertext][16-byte tag]
//! ```
//!
//! The split/merge engine only sees the [`ChunkCipher`] trait.

pub mod cipher;
pub mod kdf;
pub mod keys;

pub use cipher::{ChunkCipher, XChaChaCipher};
pub use kdf::{derive_key, salt_from_str, KdfParams};
pub use keys::{generate_key, load_key_file, save_key_file, ChunkKey};

/// Size of a chunk key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of an Argon2id salt
pub const SALT_SIZE: usize = 16;
