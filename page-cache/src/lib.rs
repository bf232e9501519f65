//! Evicting a file's pages from the operating system's buffer cache.
//!
//! Cold-read measurements need the data to come from the device, not from
//! memory. [`CacheFlush`] is the one capability the benchmarks need for that;
//! [`platform()`] returns the implementation for the compile target.
//!
//! Eviction is best-effort. Depending on the platform it may evict more than
//! the given file (macOS purges the whole cache), and it may need elevated
//! privileges.

use std::path::{Path, PathBuf};

#[cfg(any(target_os = "linux", target_os = "android"))]
mod fadvise;
#[cfg(target_os = "macos")]
mod purge;
#[cfg(windows)]
mod no_buffering;

#[derive(Debug, thiserror::Error)]
pub enum CacheFlushError {
    #[error("couldn't {op} {path:?}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({status}): {output}")]
    Command {
        command: &'static str,
        status: String,
        output: String,
    },
    #[error("evicting cached file data is not supported on this platform")]
    Unsupported,
}

/// Drops cached pages of a file so the next reads hit the device.
pub trait CacheFlush {
    /// Idempotent; may evict more than `path`.
    fn flush(&self, path: &Path) -> Result<(), CacheFlushError>;

    /// Short name for log messages.
    fn name(&self) -> &'static str;
}

impl<T: CacheFlush + ?Sized> CacheFlush for &T {
    fn flush(&self, path: &Path) -> Result<(), CacheFlushError> {
        (**self).flush(path)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: CacheFlush + ?Sized> CacheFlush for Box<T> {
    fn flush(&self, path: &Path) -> Result<(), CacheFlushError> {
        (**self).flush(path)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Does nothing. For tests and for runs that want warm-cache numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheFlush;

impl CacheFlush for NoopCacheFlush {
    fn flush(&self, _path: &Path) -> Result<(), CacheFlushError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use fadvise::FadviseCacheFlush as PlatformCacheFlush;
#[cfg(target_os = "macos")]
pub use purge::PurgeCacheFlush as PlatformCacheFlush;
#[cfg(windows)]
pub use no_buffering::NoBufferingCacheFlush as PlatformCacheFlush;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    windows
)))]
pub use self::UnsupportedCacheFlush as PlatformCacheFlush;

/// Always fails with [`CacheFlushError::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedCacheFlush;

impl CacheFlush for UnsupportedCacheFlush {
    fn flush(&self, _path: &Path) -> Result<(), CacheFlushError> {
        Err(CacheFlushError::Unsupported)
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}

/// The cache flush implementation for the current target.
pub fn platform() -> PlatformCacheFlush {
    PlatformCacheFlush::default()
}
