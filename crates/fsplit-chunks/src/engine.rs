use std::sync::Arc;

use fsplit_core::{FsplitError, FsplitResult, LayoutConfig};
use fsplit_crypto::ChunkCipher;

/// Progress callback type (chunks_done, chunks_total, message)
pub type ProgressFn = Arc<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Entry point for split and merge.
///
/// Holds the directory layout both sides agree on and, when encryption is
/// used, the cipher. Several engines with different layouts can run side by
/// side; nothing here is process-global.
#[derive(Clone)]
pub struct ChunkEngine {
    pub(crate) layout: LayoutConfig,
    pub(crate) cipher: Option<Arc<dyn ChunkCipher>>,
    pub(crate) progress: Option<ProgressFn>,
}

impl ChunkEngine {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            cipher: None,
            progress: None,
        }
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn ChunkCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// The cipher to use when `encrypted` is set; an error if none is loaded.
    pub(crate) fn cipher_for(
        &self,
        encrypted: bool,
        missing: fn(String) -> FsplitError,
    ) -> FsplitResult<Option<Arc<dyn ChunkCipher>>> {
        if !encrypted {
            return Ok(None);
        }
        match &self.cipher {
            Some(c) => Ok(Some(Arc::clone(c))),
            None => Err(missing("encryption enabled but no key is loaded".into())),
        }
    }

    pub(crate) fn report(&self, done: u64, total: u64, msg: &str) {
        if let Some(progress) = &self.progress {
            progress(done, total, msg);
        }
    }
}

impl std::fmt::Debug for ChunkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkEngine")
            .field("layout", &self.layout)
            .field("cipher", &self.cipher.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
