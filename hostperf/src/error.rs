use std::{fmt, io, path::PathBuf};

/// The I/O operation that failed, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Create,
    Open,
    Seek,
    Read,
    Write,
    Sync,
    Metadata,
    Remove,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoOp::Create => "create",
            IoOp::Open => "open",
            IoOp::Seek => "seek",
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::Sync => "sync",
            IoOp::Metadata => "stat",
            IoOp::Remove => "remove",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("couldn't {op} {path:?}: {source}")]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("short read of {path:?}: got {actual} of {expected} bytes")]
    ShortRead {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("short write to {path:?}: wrote {actual} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("sample space of {total_blocks} blocks exhausted")]
    SampleSpaceExhausted { total_blocks: u64 },
    #[error("clock did not advance during a batch of {ops} operations")]
    ClockStalled { ops: u64 },
}

impl Error {
    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
