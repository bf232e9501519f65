use std::{io::ErrorKind, num::NonZeroU64, path::PathBuf, time::Instant};

use hostperf::{
    scratch::{create_scratch_file, open_scratch_file, remove_scratch_file},
    Calibrator, WorkUnit, WrappingReader,
};
use scopeguard::ScopeGuard;
use tracing::{debug, warn};

use super::{
    print_table, start_status, PassResult, RunContext, RunError, Suite, SuiteKind, SuiteReport,
};

const WARMUP_OPS: NonZeroU64 = match NonZeroU64::new(128) {
    Some(n) => n,
    None => unreachable!(),
};

const PRIME_CHUNK: usize = 1 << 20;

/// Best-effort removal of `path` on drop. A file that was never created is
/// not an error.
fn remove_on_drop(path: PathBuf) -> ScopeGuard<PathBuf, impl FnOnce(PathBuf)> {
    scopeguard::guard(path, |path| match std::fs::remove_file(&path) {
        Ok(()) => debug!(?path, "removed scratch file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(?path, "couldn't remove scratch file: {e}"),
    })
}

/// Repeated sequential reads of a small file that stays in the page cache.
pub(crate) struct SuiteDiskCache {}

impl Suite for SuiteDiskCache {
    fn run(self: Box<Self>, ctx: &mut RunContext<'_>) -> Result<SuiteReport, RunError> {
        writeln!(ctx.out, "Testing disk cache performance")?;
        let config = ctx.config;

        // armed before creation so a partially written file is removed too
        let cleanup = remove_on_drop(config.small_file.clone());
        let path = cleanup.as_path();
        create_scratch_file(path, config.small_file_len, |_| {})?;
        let mut file = open_scratch_file(path)?;

        // read the whole file once so it is in the cache
        let prime_chunk = PRIME_CHUNK.min(config.small_file_len as usize).max(1);
        let mut primer = WrappingReader::new(&mut file, path, prime_chunk)?;
        for _ in 0..config.small_file_len / prime_chunk as u64 {
            primer.perform()?;
        }

        let mut passes = Vec::new();
        for &chunk_size in &config.cache_chunk_sizes {
            let begin = Instant::now();
            start_status(ctx.out, chunk_size)?;

            let mut reader = WrappingReader::new(&mut file, path, chunk_size)?;
            let calibration = Calibrator::new(config.cache_target)
                .with_warmup_ops(WARMUP_OPS)
                .calibrate(&mut reader)?;

            writeln!(
                ctx.out,
                "{} in {:.2} sec",
                calibration.operations,
                begin.elapsed().as_secs_f64()
            )?;
            debug!(chunk_size, wraps = reader.wraps(), "cached read pass done");
            passes.push(PassResult::new(chunk_size, calibration));
        }

        drop(file);
        let path = ScopeGuard::into_inner(cleanup);
        remove_scratch_file(&path)?;

        print_table(ctx.out, &passes)?;
        Ok(SuiteReport {
            suite: SuiteKind::DiskCache,
            passes,
        })
    }
}

#[cfg(test)]
mod tests {
    use page_cache::NoopCacheFlush;

    use super::*;
    use crate::{args::Args, config::Config};

    fn config_in(dir: &std::path::Path) -> Config {
        let args = <Args as clap::Parser>::parse_from([
            "gsperf",
            "--disk-cache",
            "--cache-duration",
            "20ms",
            "--scratch-dir",
            dir.to_str().unwrap(),
        ]);
        Config::from_args(&args)
    }

    fn run(config: &Config) -> (Result<SuiteReport, RunError>, String) {
        let mut out = Vec::new();
        let mut ctx = RunContext {
            config,
            out: &mut out,
            cache_flush: &NoopCacheFlush,
        };
        let res = Box::new(SuiteDiskCache {}).run(&mut ctx);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn file_is_removed_after_a_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.small_file_len = 256 * 1024;
        config.cache_chunk_sizes = vec![4096, 65536];

        let (res, out) = run(&config);
        let report = res.unwrap();
        assert_eq!(report.passes.len(), 2);
        assert!(out.contains("4K reads: "), "{out}");
        assert!(!config.small_file.exists());
    }

    #[test]
    fn file_is_removed_when_a_pass_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        // every read of an empty file comes up short
        config.small_file_len = 0;

        let (res, _) = run(&config);
        assert!(
            matches!(res, Err(RunError::Bench(hostperf::Error::ShortRead { .. }))),
            "{res:?}"
        );
        assert!(!config.small_file.exists());
    }

    #[test]
    fn creation_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.small_file = dir.path().join("missing-dir").join("temptestfile");

        let (res, _) = run(&config);
        assert!(
            matches!(
                res,
                Err(RunError::Bench(hostperf::Error::Io {
                    op: hostperf::IoOp::Create,
                    ..
                }))
            ),
            "{res:?}"
        );
        assert!(!config.small_file.exists());
    }

    #[test]
    fn guard_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created");
        drop(remove_on_drop(path.clone()));
        assert!(!path.exists());

        std::fs::write(&path, b"x").unwrap();
        drop(remove_on_drop(path.clone()));
        assert!(!path.exists());
    }
}
