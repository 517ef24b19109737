//! fsplit-chunks: split a file into fixed-size chunk files and merge them back
//!
//! # Overview
//! - `plan`: chunk size, chunk-count upper bound, file naming, output directory
//! - `split`: chunk writer and checksum producer, run as two concurrent tasks
//! - `merge`: ordered reassembly of a split directory
//! - `checksum`: SHA-256 digest of the plaintext, produced at split time and
//!   verified after every merge
//!
//! Split directory layout (defaults shown):
//! ```text
//! file-data_<name>/
//!   data_0 .. data_N   zero-padded index, width = digits(chunk-count upper bound)
//!   checksum           raw SHA-256 digest bytes, encrypted when --encrypt
//! ```
//! Lexicographic order of the chunk file names is chunk order; no manifest
//! is written.

pub mod checksum;
pub mod engine;
pub mod merge;
pub mod plan;
pub mod split;

pub use checksum::{digest_file, Verification, DIGEST_SIZE};
pub use engine::{ChunkEngine, ProgressFn};
pub use merge::{derive_output_name, MergeReport};
pub use plan::{chunk_file_name, num_digits, SplitPlan};
pub use split::SplitReport;
