use std::{fs::File, os::fd::AsRawFd, path::Path};

use tracing::debug;

use crate::{CacheFlush, CacheFlushError};

/// `fsync` followed by `posix_fadvise(POSIX_FADV_DONTNEED)` over the whole
/// file. Dirty pages can't be dropped, hence the sync.
#[derive(Debug, Default, Clone, Copy)]
pub struct FadviseCacheFlush;

impl CacheFlush for FadviseCacheFlush {
    fn flush(&self, path: &Path) -> Result<(), CacheFlushError> {
        let io_err = |op, source| CacheFlushError::Io {
            op,
            path: path.to_owned(),
            source,
        };
        let file = File::open(path).map_err(|e| io_err("open", e))?;
        file.sync_all().map_err(|e| io_err("fsync", e))?;
        // SAFETY: the fd is valid for the lifetime of `file`; offset 0 and
        // len 0 mean "to the end of the file".
        let ret =
            unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
        if ret != 0 {
            // posix_fadvise returns the error number instead of setting errno
            return Err(io_err("posix_fadvise", std::io::Error::from_raw_os_error(ret)));
        }
        debug!(?path, "dropped cached pages");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "posix_fadvise"
    }
}
