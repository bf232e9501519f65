use std::{fs::OpenOptions, os::windows::fs::OpenOptionsExt, path::Path};

use tracing::debug;

use crate::{CacheFlush, CacheFlushError};

const FILE_FLAG_NO_BUFFERING: u32 = 0x2000_0000;

/// Opening a file with `FILE_FLAG_NO_BUFFERING` discards its cached data as
/// a side effect; the handle is closed right away.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBufferingCacheFlush;

impl CacheFlush for NoBufferingCacheFlush {
    fn flush(&self, path: &Path) -> Result<(), CacheFlushError> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(FILE_FLAG_NO_BUFFERING)
            .open(path)
            .map_err(|source| CacheFlushError::Io {
                op: "open",
                path: path.to_owned(),
                source,
            })?;
        drop(file);
        debug!(?path, "reopened without buffering");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "FILE_FLAG_NO_BUFFERING"
    }
}
