use std::path::PathBuf;
use thiserror::Error;

pub type FsplitResult<T> = Result<T, FsplitError>;

#[derive(Debug, Error)]
pub enum FsplitError {
    #[error("invalid size format '{0}' (expected one of B, KB, MB, GB)")]
    InvalidFormat(String),

    #[error("invalid chunk size: {magnitude} x {unit} does not yield a positive byte count")]
    InvalidChunkSize { magnitude: u64, unit: String },

    #[error("output directory already exists: {}", .0.display())]
    DirectoryExists(PathBuf),

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("cannot derive output name from '{}': missing prefix '{prefix}'", .path.display())]
    InvalidDirectoryName { path: PathBuf, prefix: String },

    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hashing {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("checksum mismatch for {}", .0.display())]
    ChecksumMismatch(PathBuf),

    #[error("config error: {0}")]
    Config(String),

    #[error("split task failed: {0}")]
    Task(String),
}

impl FsplitError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn hash(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Hash {
            path: path.into(),
            source,
        }
    }
}
