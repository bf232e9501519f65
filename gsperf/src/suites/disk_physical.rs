use std::num::NonZeroU64;

use hostperf::{
    scratch::{create_scratch_file, scratch_file_is_reusable},
    Calibrator, IoOp, RandomBlockReader,
};
use tracing::{debug, info, warn};

use super::{
    print_table, start_status, warn_cache_flush_failed, PassResult, RunContext, RunError, Suite,
    SuiteKind, SuiteReport,
};

/// Random reads of blocks that are never read twice, from a file whose pages
/// are evicted from the cache before each chunk size.
pub(crate) struct SuiteDiskPhysical {}

impl Suite for SuiteDiskPhysical {
    fn run(self: Box<Self>, ctx: &mut RunContext<'_>) -> Result<SuiteReport, RunError> {
        writeln!(ctx.out, "Testing physical disk performance")?;
        let config = ctx.config;
        let path = config.large_file.as_path();

        // Too big to recreate on every run, so it is left behind.
        if !scratch_file_is_reusable(path, config.large_file_len)? {
            eprint!("Creating large file (will not be deleted)...");
            create_scratch_file(path, config.large_file_len, |_| eprint!("."))?;
            eprintln!();
        }
        let file_len = std::fs::metadata(path)
            .map_err(|e| hostperf::Error::Io {
                op: IoOp::Metadata,
                path: path.to_owned(),
                source: e,
            })?
            .len();

        let mut passes = Vec::new();
        for &chunk_size in &config.physical_chunk_sizes {
            if chunk_size as u64 > file_len {
                warn!(chunk_size, file_len, "chunk size exceeds file, skipping");
                continue;
            }
            start_status(ctx.out, chunk_size)?;

            debug!(?path, "flushing");
            if let Err(e) = ctx.cache_flush.flush(path) {
                warn_cache_flush_failed(ctx, path, &e);
            }

            debug!(?path, "reading");
            let mut reader = RandomBlockReader::open(path, chunk_size)?;
            let mut calibrator = Calibrator::new(config.physical_target);
            if let Some(budget) = NonZeroU64::new(reader.total_blocks()) {
                calibrator = calibrator.with_max_ops(budget);
            }
            let calibration = calibrator.calibrate(&mut reader)?;

            writeln!(
                ctx.out,
                "{} in {:.2} sec ({} probes)",
                calibration.operations,
                calibration.elapsed.as_secs_f64(),
                reader.sampler().probes()
            )?;
            info!(
                chunk_size,
                issued = reader.sampler().space().issued(),
                total_blocks = reader.total_blocks(),
                "physical read pass done"
            );
            passes.push(PassResult::new(chunk_size, calibration));
        }

        print_table(ctx.out, &passes)?;
        Ok(SuiteReport {
            suite: SuiteKind::DiskPhysical,
            passes,
        })
    }
}
