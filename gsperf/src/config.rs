use std::{path::PathBuf, time::Duration};

use crate::args::Args;

/// Name of the large file read by the physical disk test. Left on disk for
/// later runs because it takes a long time to write.
pub(crate) const LARGE_FILE_NAME: &str = "templargetestfile";

/// Name of the small file read by the disk cache test.
pub(crate) const SMALL_FILE_NAME: &str = "temptestfile";

const SMALL_FILE_LEN: u64 = 4 << 20;

const PHYSICAL_CHUNK_SIZES: [usize; 7] = [
    1024,
    4096,
    16384,
    65536,
    4 * 65536,
    1024 * 1024,
    4 * 1024 * 1024,
];

const CACHE_CHUNK_SIZES: [usize; 5] = [1024, 4096, 16384, 65536, 4 * 65536];

/// Everything the suites need to know, resolved once from the command line.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub cpu_target: Duration,
    pub physical_target: Duration,
    pub cache_target: Duration,
    pub large_file: PathBuf,
    pub large_file_len: u64,
    pub small_file: PathBuf,
    pub small_file_len: u64,
    pub physical_chunk_sizes: Vec<usize>,
    pub cache_chunk_sizes: Vec<usize>,
    pub output_json: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Config {
            cpu_target: args.cpu_duration,
            physical_target: args.physical_duration,
            cache_target: args.cache_duration,
            large_file: args.scratch_dir.join(LARGE_FILE_NAME),
            large_file_len: args.large_file_mib.saturating_mul(1024 * 1024),
            small_file: args.scratch_dir.join(SMALL_FILE_NAME),
            small_file_len: SMALL_FILE_LEN,
            physical_chunk_sizes: PHYSICAL_CHUNK_SIZES.to_vec(),
            cache_chunk_sizes: CACHE_CHUNK_SIZES.to_vec(),
            output_json: args.output_json.clone(),
        }
    }
}
