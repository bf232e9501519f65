use std::{path::Path, process::Command};

use tracing::debug;

use crate::{CacheFlush, CacheFlushError};

/// Runs `purge`, which flushes the entire disk cache; there is no per-file
/// eviction on macOS. Usually needs to run as root.
#[derive(Debug, Default, Clone, Copy)]
pub struct PurgeCacheFlush;

impl CacheFlush for PurgeCacheFlush {
    fn flush(&self, path: &Path) -> Result<(), CacheFlushError> {
        let output = Command::new("purge")
            .output()
            .map_err(|source| CacheFlushError::Io {
                op: "run purge for",
                path: path.to_owned(),
                source,
            })?;
        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            text.push_str("(you might need to run as admin with sudo)");
            return Err(CacheFlushError::Command {
                command: "purge",
                status: output.status.to_string(),
                output: text,
            });
        }
        debug!(?path, "purged disk cache");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "purge"
    }
}
