//! Scratch files for the disk benchmarks.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

use rand::RngCore;
use tracing::{debug, info};

use crate::error::{Error, IoOp, Result};

/// Size of each write while filling a scratch file.
pub const WRITE_CHUNK: usize = 1 << 20;

/// Progress is reported each time this many more bytes are written.
pub const PROGRESS_STEP: u64 = 256 << 20;

/// Creates (or truncates) `path` and fills it with exactly `len` bytes of
/// pseudo-random data, then syncs it to disk.
///
/// `on_progress` is called with the total written so far every
/// [`PROGRESS_STEP`] bytes.
pub fn create_scratch_file(path: &Path, len: u64, on_progress: impl FnMut(u64)) -> Result<()> {
    write_scratch_file(path, len, PROGRESS_STEP, on_progress)
}

fn write_scratch_file(
    path: &Path,
    len: u64,
    progress_step: u64,
    mut on_progress: impl FnMut(u64),
) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::io(IoOp::Create, path, e))?;
    let mut chunk = vec![0u8; WRITE_CHUNK];
    let mut rng = rand::thread_rng();
    let mut written: u64 = 0;
    let mut since_progress: u64 = 0;
    while written < len {
        let this_write = (len - written).min(WRITE_CHUNK as u64) as usize;
        let buf = &mut chunk[..this_write];
        rng.fill_bytes(buf);
        let wrote = loop {
            match file.write(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io(IoOp::Write, path, e)),
            }
        };
        if wrote != this_write {
            return Err(Error::ShortWrite {
                path: path.to_owned(),
                expected: this_write,
                actual: wrote,
            });
        }
        written += wrote as u64;
        since_progress += wrote as u64;
        if since_progress >= progress_step {
            since_progress -= progress_step;
            on_progress(written);
        }
    }
    file.sync_all().map_err(|e| Error::io(IoOp::Sync, path, e))?;
    debug!(?path, len, "scratch file written");
    Ok(())
}

/// Whether `path` is an existing file of at least `len` bytes.
pub fn scratch_file_is_reusable(path: &Path, len: u64) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(md) if md.is_file() && md.len() >= len => {
            info!(?path, existing = md.len(), "reusing scratch file");
            Ok(true)
        }
        Ok(md) => {
            info!(?path, existing = md.len(), len, "scratch file too small");
            Ok(false)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(IoOp::Metadata, path, e)),
    }
}

pub fn remove_scratch_file(path: &Path) -> Result<()> {
    std::fs::remove_file(path).map_err(|e| Error::io(IoOp::Remove, path, e))
}

/// Opens an existing scratch file read-only.
pub fn open_scratch_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| Error::io(IoOp::Open, path, e))
}
