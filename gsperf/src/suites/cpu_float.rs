use hostperf::{format_throughput, Calibrator, HornerWorkload};
use tracing::info;

use super::{PassResult, RunContext, RunError, Suite, SuiteKind, SuiteReport};

pub(crate) struct SuiteCpuFloat {}

impl Suite for SuiteCpuFloat {
    fn run(self: Box<Self>, ctx: &mut RunContext<'_>) -> Result<SuiteReport, RunError> {
        writeln!(ctx.out, "Testing CPU float performance")?;

        let mut work = HornerWorkload::new(HornerWorkload::DEFAULT_LEN);
        let calibration = Calibrator::new(ctx.config.cpu_target).calibrate(&mut work)?;
        info!(
            operations = calibration.operations,
            elapsed = ?calibration.elapsed,
            "cpu float pass done"
        );

        writeln!(
            ctx.out,
            "horner_f64 {:.6e}: {}",
            work.sum(),
            format_throughput(&calibration, None)
        )?;
        let bytes = work.buffer_len() * std::mem::size_of::<f64>();
        Ok(SuiteReport {
            suite: SuiteKind::CpuFloat,
            passes: vec![PassResult::new(bytes, calibration)],
        })
    }
}
