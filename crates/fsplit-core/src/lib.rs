pub mod config;
pub mod error;
pub mod types;

pub use config::{FsplitConfig, LayoutConfig};
pub use error::{FsplitError, FsplitResult};
pub use types::{ChunkConfig, MergeRequest, SizeUnit, SplitRequest};
