//! Disk work units: sequential wrap-around reads and random unique-block reads.

use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, Rng};
use tracing::trace;

use crate::{
    calibrate::WorkUnit,
    error::{Error, IoOp, Result},
    sampler::BlockSampler,
};

/// Reads `chunk_size` bytes per call, starting over from the beginning of
/// the data when the end is reached.
///
/// A read that comes up short at the end of the data is replaced by exactly
/// one read from the start, so every call still reads one full chunk.
pub struct WrappingReader<R> {
    inner: R,
    path: PathBuf,
    buf: Vec<u8>,
    wraps: u64,
}

impl<R: Read + Seek> WrappingReader<R> {
    /// Positions `inner` at the start of the data.
    pub fn new(inner: R, path: impl Into<PathBuf>, chunk_size: usize) -> Result<Self> {
        let mut reader = WrappingReader {
            inner,
            path: path.into(),
            buf: vec![0; chunk_size],
            wraps: 0,
        };
        reader.rewind()?;
        Ok(reader)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(IoOp::Seek, &self.path, e))?;
        Ok(())
    }

    pub fn chunk_size(&self) -> usize {
        self.buf.len()
    }

    /// How many times the end of the data was hit.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_once(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io(IoOp::Read, &self.path, e)),
            }
        }
    }
}

impl<R: Read + Seek> WorkUnit for WrappingReader<R> {
    fn perform(&mut self) -> Result<()> {
        if self.read_once()? == self.buf.len() {
            return Ok(());
        }
        self.rewind()?;
        self.wraps += 1;
        trace!(wraps = self.wraps, "wrapped to start of data");
        let n = self.read_once()?;
        if n != self.buf.len() {
            return Err(Error::ShortRead {
                path: self.path.clone(),
                expected: self.buf.len(),
                actual: n,
            });
        }
        Ok(())
    }
}

/// Reads one chunk per call at a block offset never read before in this pass.
pub struct RandomBlockReader<R, G = StdRng> {
    inner: R,
    path: PathBuf,
    sampler: BlockSampler<G>,
    buf: Vec<u8>,
}

impl RandomBlockReader<File, StdRng> {
    /// Opens `path` and samples over all whole `chunk_size` blocks in it.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(IoOp::Open, path, e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::io(IoOp::Metadata, path, e))?
            .len();
        let total_blocks = len / chunk_size as u64;
        if total_blocks == 0 {
            return Err(Error::ShortRead {
                path: path.to_owned(),
                expected: chunk_size,
                actual: len as usize,
            });
        }
        Ok(Self::new(
            file,
            path,
            chunk_size,
            BlockSampler::new(total_blocks),
        ))
    }
}

impl<R: Read + Seek, G: Rng> RandomBlockReader<R, G> {
    pub fn new(
        inner: R,
        path: impl Into<PathBuf>,
        chunk_size: usize,
        sampler: BlockSampler<G>,
    ) -> Self {
        RandomBlockReader {
            inner,
            path: path.into(),
            sampler,
            buf: vec![0; chunk_size],
        }
    }

    pub fn sampler(&self) -> &BlockSampler<G> {
        &self.sampler
    }

    pub fn total_blocks(&self) -> u64 {
        self.sampler.space().total_blocks()
    }
}

impl<R: Read + Seek, G: Rng> WorkUnit for RandomBlockReader<R, G> {
    fn perform(&mut self) -> Result<()> {
        let block = self.sampler.next_block()?;
        let offset = block * self.buf.len() as u64;
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(IoOp::Seek, &self.path, e))?;
        self.inner
            .read_exact(&mut self.buf)
            .map_err(|e| Error::io(IoOp::Read, &self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::HashSet,
        io::{Cursor, Write},
        rc::Rc,
    };

    use rand::SeedableRng;

    use super::*;
    use crate::sampler::SampleSpace;

    /// Records every `read` call and the offset it started at.
    struct Recorder<R> {
        inner: R,
        reads: Rc<Cell<u64>>,
        offsets: Rc<RefCell<Vec<u64>>>,
    }

    impl<R: Read + Seek> Read for Recorder<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads.set(self.reads.get() + 1);
            let pos = self.inner.stream_position()?;
            self.offsets.borrow_mut().push(pos);
            self.inner.read(buf)
        }
    }

    impl<R: Seek> Seek for Recorder<R> {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    type Recorded = (
        Recorder<Cursor<Vec<u8>>>,
        Rc<Cell<u64>>,
        Rc<RefCell<Vec<u64>>>,
    );

    fn recorder(data: Vec<u8>) -> Recorded {
        let reads = Rc::new(Cell::new(0));
        let offsets = Rc::new(RefCell::new(Vec::new()));
        let r = Recorder {
            inner: Cursor::new(data),
            reads: Rc::clone(&reads),
            offsets: Rc::clone(&offsets),
        };
        (r, reads, offsets)
    }

    #[test]
    fn wrap_issues_exactly_one_extra_read() {
        let (inner, reads, _) = recorder(vec![7; 4 * 1024]);
        let mut reader = WrappingReader::new(inner, "mem", 1024).unwrap();
        for _ in 0..10 {
            reader.perform().unwrap();
        }
        // chunks 1-4 read, 5th hits EOF and restarts, 9th likewise
        assert_eq!(reader.wraps(), 2);
        assert_eq!(reads.get(), 10 + reader.wraps());
    }

    #[test]
    fn partial_tail_chunk_is_replaced() {
        let (inner, reads, offsets) = recorder(vec![1; 2500]);
        let mut reader = WrappingReader::new(inner, "mem", 1000).unwrap();
        for _ in 0..3 {
            reader.perform().unwrap();
        }
        assert_eq!(reader.wraps(), 1);
        assert_eq!(reads.get(), 4);
        assert_eq!(*offsets.borrow(), vec![0, 1000, 2000, 0]);
    }

    #[test]
    fn data_smaller_than_chunk_is_short_read() {
        let (inner, _, _) = recorder(vec![1; 100]);
        let mut reader = WrappingReader::new(inner, "mem", 1000).unwrap();
        let err = reader.perform().unwrap_err();
        assert!(
            matches!(
                err,
                Error::ShortRead {
                    expected: 1000,
                    actual: 100,
                    ..
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn wrapping_reader_over_file() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&vec![3; 8192]).unwrap();
        let mut reader = WrappingReader::new(file, "tmp", 4096).unwrap();
        for _ in 0..7 {
            reader.perform().unwrap();
        }
        assert_eq!(reader.wraps(), 3);
    }

    #[test]
    fn random_reads_never_repeat_a_block() {
        let chunk = 512;
        let blocks = 64u64;
        let (inner, reads, offsets) = recorder(vec![0; chunk * blocks as usize]);
        let sampler =
            BlockSampler::with_rng(SampleSpace::new(blocks), StdRng::seed_from_u64(42));
        let mut reader = RandomBlockReader::new(inner, "mem", chunk, sampler);
        for _ in 0..blocks {
            reader.perform().unwrap();
        }
        assert_eq!(reads.get(), blocks);
        let distinct: HashSet<u64> = offsets.borrow().iter().copied().collect();
        assert_eq!(distinct.len() as u64, blocks);
        assert!(distinct.iter().all(|o| o % chunk as u64 == 0));

        let err = reader.perform().unwrap_err();
        assert!(matches!(err, Error::SampleSpaceExhausted { total_blocks: 64 }));
    }

    #[test]
    fn open_sizes_sample_space_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![9; 10 * 4096 + 100]).unwrap();
        file.flush().unwrap();
        let reader = RandomBlockReader::open(file.path(), 4096).unwrap();
        assert_eq!(reader.total_blocks(), 10);

        let err = RandomBlockReader::open(file.path(), 1 << 20).err().unwrap();
        assert!(matches!(err, Error::ShortRead { .. }), "{err}");
    }
}
