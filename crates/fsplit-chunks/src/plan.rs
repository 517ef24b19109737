//! Chunk planning and chunk file naming
//!
//! The chunk-count upper bound is `total / bytes_per_chunk + 1`. When the
//! source size is an exact multiple of the chunk size the last planned chunk
//! reads zero bytes and is never written, so the true count is one lower.
//! The bound also sets the zero-padding width of chunk names, which keeps the
//! names compatible with split directories produced by earlier versions.

use std::path::{Path, PathBuf};

use fsplit_core::{ChunkConfig, FsplitError, FsplitResult};

/// Derived parameters of one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub total_size: u64,
    pub bytes_per_chunk: u64,
    /// Upper bound on chunk files written (may be one more than the true count)
    pub chunk_count: u64,
    pub output_dir: PathBuf,
}

impl SplitPlan {
    /// Plan a split of a `total_size`-byte file. Touches nothing on disk.
    pub fn new(total_size: u64, config: &ChunkConfig, output_dir: PathBuf) -> FsplitResult<Self> {
        let bytes_per_chunk = config.bytes_per_chunk()?;
        Ok(Self {
            total_size,
            bytes_per_chunk,
            chunk_count: total_size / bytes_per_chunk + 1,
            output_dir,
        })
    }

    /// Zero-padding width of chunk indices.
    pub fn name_width(&self) -> usize {
        num_digits(self.chunk_count)
    }

    /// Read buffer size: one chunk, but never more than the whole file.
    pub fn buffer_len(&self) -> usize {
        let len = self.bytes_per_chunk.min(self.total_size).max(1);
        usize::try_from(len).unwrap_or(usize::MAX)
    }

    /// Path of the chunk file at `index`.
    pub fn chunk_path(&self, prefix: &str, index: u64) -> PathBuf {
        self.output_dir
            .join(chunk_file_name(prefix, index, self.name_width()))
    }
}

/// Decimal digit count of `n` (1 for 0..=9).
pub fn num_digits(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// `data_` + index zero-padded to `width`, e.g. `data_007`.
pub fn chunk_file_name(prefix: &str, index: u64, width: usize) -> String {
    format!("{prefix}{index:0width$}")
}

/// Create the split directory. An existing directory is never reused.
pub async fn create_output_dir(path: &Path) -> FsplitResult<()> {
    match tokio::fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(FsplitError::DirectoryExists(path.to_path_buf()))
        }
        Err(e) => Err(FsplitError::write(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(total: u64, magnitude: u64, unit: &str) -> SplitPlan {
        SplitPlan::new(total, &ChunkConfig::new(magnitude, unit), PathBuf::from("out")).unwrap()
    }

    #[test]
    fn test_num_digits() {
        assert_eq!(num_digits(0), 1);
        assert_eq!(num_digits(9), 1);
        assert_eq!(num_digits(10), 2);
        assert_eq!(num_digits(12345), 5);
        assert_eq!(num_digits(1_234_567_890), 10);
        assert_eq!(num_digits(999_999_999_999_999_999), 18);
        assert_eq!(num_digits(u64::MAX), 20);
    }

    #[test]
    fn test_upper_bound_truncates_then_adds_one() {
        assert_eq!(plan(15, 7, "B").chunk_count, 3);
        assert_eq!(plan(0, 1, "KB").chunk_count, 1);
        assert_eq!(plan(1023, 1, "KB").chunk_count, 1);
    }

    #[test]
    fn test_2500_bytes_in_1kb_chunks() {
        let p = plan(2500, 1, "KB");
        assert_eq!(p.bytes_per_chunk, 1024);
        assert_eq!(p.chunk_count, 3);
        assert_eq!(p.name_width(), 1);
        assert_eq!(p.chunk_path("data_", 2), PathBuf::from("out/data_2"));
    }

    #[test]
    fn test_exact_multiple_plans_one_extra() {
        let p = plan(4096, 1, "KB");
        assert_eq!(p.chunk_count, 5);
    }

    #[test]
    fn test_width_from_upper_bound() {
        // 9 chunks needed exactly -> bound 10 -> width 2
        let p = plan(90, 10, "B");
        assert_eq!(p.chunk_count, 10);
        assert_eq!(p.name_width(), 2);
        assert_eq!(chunk_file_name("data_", 0, p.name_width()), "data_00");
    }

    #[test]
    fn test_chunk_names_sort_numerically() {
        let width = num_digits(120);
        let names: Vec<String> = (0..120).map(|i| chunk_file_name("data_", i, width)).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[9], "data_009");
        assert_eq!(names[10], "data_010");
    }

    #[test]
    fn test_buffer_len_capped_by_file_size() {
        assert_eq!(plan(100, 1, "GB").buffer_len(), 100);
        assert_eq!(plan(0, 1, "MB").buffer_len(), 1);
        assert_eq!(plan(10_000, 1, "KB").buffer_len(), 1024);
    }

    #[test]
    fn test_invalid_unit_fails_planning() {
        let err = SplitPlan::new(10, &ChunkConfig::new(1, "TB"), PathBuf::from("out")).unwrap_err();
        assert!(matches!(err, FsplitError::InvalidFormat(t) if t == "TB"));
    }

    #[tokio::test]
    async fn test_create_output_dir_refuses_existing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("file-data_x");

        create_output_dir(&dir).await.unwrap();
        assert!(dir.is_dir());

        let err = create_output_dir(&dir).await.unwrap_err();
        assert!(matches!(err, FsplitError::DirectoryExists(p) if p == dir));
    }
}
