use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FsplitError, FsplitResult};
use crate::types::SizeUnit;

/// Top-level configuration (loaded from fsplit.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FsplitConfig {
    pub layout: LayoutConfig,
    pub split: SplitConfig,
    pub crypto: CryptoConfig,
    pub logging: LoggingConfig,
}

impl FsplitConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> FsplitResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| FsplitError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| FsplitError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> FsplitResult<Self> {
        toml::from_str(content).map_err(|e| FsplitError::Config(format!("parsing config: {e}")))
    }
}

/// On-disk naming conventions for split directories.
///
/// Both ends of a split/merge must agree on these values; they are the
/// only format contract between the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Directory where split directories and merged files are created (default: .)
    pub output_root: PathBuf,
    /// Prefix of each split directory name (default: file-data_)
    pub output_dir_prefix: String,
    /// Prefix of each chunk file name (default: data_)
    pub chunk_file_prefix: String,
    /// Name of the checksum file inside a split directory (default: checksum)
    pub checksum_file_name: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            output_dir_prefix: "file-data_".into(),
            chunk_file_prefix: "data_".into(),
            checksum_file_name: "checksum".into(),
        }
    }
}

impl LayoutConfig {
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Path of the split directory for a source file named `file_name`.
    pub fn output_dir_for(&self, file_name: &str) -> PathBuf {
        self.output_root
            .join(format!("{}{}", self.output_dir_prefix, file_name))
    }
}

/// Default chunk size used when the CLI does not override it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Chunk size magnitude (default: 10)
    pub chunk_size: u64,
    /// Chunk size unit (default: MB)
    pub unit: SizeUnit,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            unit: SizeUnit::Megabytes,
        }
    }
}

/// Chunk encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Key file written on split and read on merge (default: fsplit.key)
    pub key_file: PathBuf,
    /// Salt string for passphrase-derived keys
    pub salt: String,
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("fsplit.key"),
            salt: "fsplit-passphrase-v1".into(),
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[layout]
output_root = "/srv/splits"
output_dir_prefix = "parts_"
chunk_file_prefix = "part_"
checksum_file_name = "SHA256"

[split]
chunk_size = 64
unit = "KB"

[crypto]
key_file = "/etc/fsplit/key"
salt = "team-salt"
argon2_mem_cost_kib = 131072
argon2_time_cost = 4
argon2_parallelism = 8

[logging]
level = "debug"
format = "json"
"#;
        let config = FsplitConfig::from_toml(toml_str).unwrap();

        assert_eq!(config.layout.output_root, PathBuf::from("/srv/splits"));
        assert_eq!(config.layout.output_dir_prefix, "parts_");
        assert_eq!(config.layout.chunk_file_prefix, "part_");
        assert_eq!(config.layout.checksum_file_name, "SHA256");
        assert_eq!(config.split.chunk_size, 64);
        assert_eq!(config.split.unit, SizeUnit::Kilobytes);
        assert_eq!(config.crypto.key_file, PathBuf::from("/etc/fsplit/key"));
        assert_eq!(config.crypto.argon2_mem_cost_kib, 131072);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config = FsplitConfig::from_toml("").unwrap();

        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.layout.output_dir_prefix, "file-data_");
        assert_eq!(config.layout.checksum_file_name, "checksum");
        assert_eq!(config.split.chunk_size, 10);
        assert_eq!(config.split.unit, SizeUnit::Megabytes);
        assert_eq!(config.crypto.key_file, PathBuf::from("fsplit.key"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[layout]
output_dir_prefix = "chunks-"
"#;
        let config = FsplitConfig::from_toml(toml_str).unwrap();

        // Overridden
        assert_eq!(config.layout.output_dir_prefix, "chunks-");
        // Defaults
        assert_eq!(config.layout.chunk_file_prefix, "data_");
        assert_eq!(config.split.unit, SizeUnit::Megabytes);
    }

    #[test]
    fn test_unknown_unit_in_config_rejected() {
        let err = FsplitConfig::from_toml("[split]\nunit = \"TB\"\n").unwrap_err();
        assert!(matches!(err, FsplitError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = FsplitConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = FsplitConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.layout, parsed.layout);
        assert_eq!(config.split.unit, parsed.split.unit);
        assert_eq!(config.crypto.salt, parsed.crypto.salt);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = FsplitConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fsplit.toml");
        std::fs::write(&path, "[split]\nchunk_size = 3\nunit = \"B\"\n").unwrap();

        let config = FsplitConfig::load(&path).unwrap();
        assert_eq!(config.split.chunk_size, 3);
        assert_eq!(config.split.unit, SizeUnit::Bytes);
    }

    #[test]
    fn test_output_dir_for() {
        let layout = LayoutConfig::default().with_output_root("/tmp/out");
        assert_eq!(
            layout.output_dir_for("movie.mp4"),
            PathBuf::from("/tmp/out/file-data_movie.mp4")
        );
    }
}
