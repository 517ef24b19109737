use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FsplitError, FsplitResult};

const KILO: u64 = 1024;

/// Unit token for a chunk size (`B`, `KB`, `MB`, `GB`), base 1024
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeUnit {
    #[serde(rename = "B")]
    Bytes,
    #[serde(rename = "KB")]
    Kilobytes,
    #[serde(rename = "MB")]
    Megabytes,
    #[serde(rename = "GB")]
    Gigabytes,
}

impl SizeUnit {
    /// Byte multiplier for this unit.
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::Kilobytes => KILO,
            SizeUnit::Megabytes => KILO * KILO,
            SizeUnit::Gigabytes => KILO * KILO * KILO,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeUnit::Bytes => "B",
            SizeUnit::Kilobytes => "KB",
            SizeUnit::Megabytes => "MB",
            SizeUnit::Gigabytes => "GB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = FsplitError;

    /// Tokens are matched exactly; `kb` or `TB` are rejected.
    fn from_str(token: &str) -> FsplitResult<Self> {
        match token {
            "B" => Ok(SizeUnit::Bytes),
            "KB" => Ok(SizeUnit::Kilobytes),
            "MB" => Ok(SizeUnit::Megabytes),
            "GB" => Ok(SizeUnit::Gigabytes),
            other => Err(FsplitError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a unit token to its byte multiplier.
pub fn unit_multiplier(token: &str) -> FsplitResult<u64> {
    token.parse::<SizeUnit>().map(SizeUnit::multiplier)
}

/// Requested chunk size: `magnitude` units of `unit` (e.g. 10 x "MB").
///
/// The unit is kept as the raw token so an unknown unit is reported at
/// planning time, before anything touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    pub magnitude: u64,
    pub unit: String,
}

impl ChunkConfig {
    pub fn new(magnitude: u64, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: unit.into(),
        }
    }

    /// Bytes per chunk. Fails on an unknown unit, a zero magnitude, or overflow.
    pub fn bytes_per_chunk(&self) -> FsplitResult<u64> {
        let multiplier = unit_multiplier(&self.unit)?;
        match self.magnitude.checked_mul(multiplier) {
            Some(bytes) if bytes > 0 => Ok(bytes),
            _ => Err(FsplitError::InvalidChunkSize {
                magnitude: self.magnitude,
                unit: self.unit.clone(),
            }),
        }
    }
}

/// Input to a split: which file, where it lives, and whether to encrypt.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub file_name: String,
    pub source_dir: PathBuf,
    pub encrypted: bool,
}

impl SplitRequest {
    pub fn new(source_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            source_dir: source_dir.into(),
            encrypted: false,
        }
    }

    /// Build a request from a full path to the source file.
    pub fn from_path(path: &Path) -> FsplitResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FsplitError::Config(format!("not a file path: {}", path.display()))
            })?;
        let source_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::new(source_dir, file_name))
    }

    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.file_name)
    }
}

/// Input to a merge: the split directory and, optionally, the output name.
///
/// Without an explicit name, the output name is the directory name with the
/// output-directory prefix stripped.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub dir: PathBuf,
    pub encrypted: bool,
    pub output_name: Option<String>,
}

impl MergeRequest {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            encrypted: false,
            output_name: None,
        }
    }

    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_multipliers() {
        assert_eq!(unit_multiplier("B").unwrap(), 1);
        assert_eq!(unit_multiplier("KB").unwrap(), 1024);
        assert_eq!(unit_multiplier("MB").unwrap(), 1024 * 1024);
        assert_eq!(unit_multiplier("GB").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_unknown_units_rejected() {
        for token in ["TB", "test", "kb", "", " MB"] {
            match unit_multiplier(token) {
                Err(FsplitError::InvalidFormat(t)) => assert_eq!(t, token),
                other => panic!("expected InvalidFormat for {token:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bytes_per_chunk() {
        assert_eq!(ChunkConfig::new(1, "KB").bytes_per_chunk().unwrap(), 1024);
        assert_eq!(
            ChunkConfig::new(10, "MB").bytes_per_chunk().unwrap(),
            10 * 1024 * 1024
        );
    }

    #[test]
    fn test_zero_and_overflowing_chunk_size() {
        assert!(matches!(
            ChunkConfig::new(0, "MB").bytes_per_chunk(),
            Err(FsplitError::InvalidChunkSize { .. })
        ));
        assert!(matches!(
            ChunkConfig::new(u64::MAX, "GB").bytes_per_chunk(),
            Err(FsplitError::InvalidChunkSize { .. })
        ));
    }

    #[test]
    fn test_split_request_from_path() {
        let req = SplitRequest::from_path(Path::new("/data/in/video.mkv")).unwrap();
        assert_eq!(req.file_name, "video.mkv");
        assert_eq!(req.source_dir, PathBuf::from("/data/in"));
        assert!(!req.encrypted);

        let bare = SplitRequest::from_path(Path::new("notes.txt")).unwrap();
        assert_eq!(bare.source_dir, PathBuf::from("."));
        assert_eq!(bare.source_path(), PathBuf::from("./notes.txt"));
    }

    #[test]
    fn test_unit_display_roundtrip() {
        for unit in [
            SizeUnit::Bytes,
            SizeUnit::Kilobytes,
            SizeUnit::Megabytes,
            SizeUnit::Gigabytes,
        ] {
            assert_eq!(unit.to_string().parse::<SizeUnit>().unwrap(), unit);
        }
    }
}
