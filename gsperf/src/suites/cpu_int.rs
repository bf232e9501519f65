use hostperf::{format_throughput, Calibrator, Crc16Workload};
use tracing::info;

use super::{PassResult, RunContext, RunError, Suite, SuiteKind, SuiteReport};

pub(crate) struct SuiteCpuInt {}

impl Suite for SuiteCpuInt {
    fn run(self: Box<Self>, ctx: &mut RunContext<'_>) -> Result<SuiteReport, RunError> {
        writeln!(ctx.out, "Testing CPU integer performance")?;

        let mut work = Crc16Workload::new(Crc16Workload::DEFAULT_LEN);
        let calibration = Calibrator::new(ctx.config.cpu_target).calibrate(&mut work)?;
        info!(
            operations = calibration.operations,
            elapsed = ?calibration.elapsed,
            "cpu integer pass done"
        );

        writeln!(
            ctx.out,
            "ccitt_crc16 {:04X}: {}",
            work.checksum(),
            format_throughput(&calibration, None)
        )?;
        Ok(SuiteReport {
            suite: SuiteKind::CpuInt,
            passes: vec![PassResult::new(work.buffer_len(), calibration)],
        })
    }
}
