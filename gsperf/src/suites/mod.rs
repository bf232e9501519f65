use std::io::Write;

use hostperf::{render_table, BenchmarkResult, CalibrationResult};
use page_cache::CacheFlush;

use crate::config::Config;

pub(crate) mod cpu_float;
pub(crate) mod cpu_int;
pub(crate) mod disk_cache;
pub(crate) mod disk_physical;

use self::{
    cpu_float::SuiteCpuFloat, cpu_int::SuiteCpuInt, disk_cache::SuiteDiskCache,
    disk_physical::SuiteDiskPhysical,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SuiteKind {
    CpuInt,
    CpuFloat,
    DiskPhysical,
    DiskCache,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Bench(#[from] hostperf::Error),
    #[error("couldn't write report: {0}")]
    Console(#[from] std::io::Error),
    #[error("couldn't encode results: {0}")]
    JsonEncode(#[from] serde_json::Error),
    #[error("couldn't write results to {path:?}: {source}")]
    JsonWrite {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a suite gets to work with. Only the report stream is mutable.
pub(crate) struct RunContext<'a> {
    pub config: &'a Config,
    pub out: &'a mut dyn Write,
    pub cache_flush: &'a dyn CacheFlush,
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct PassResult {
    #[serde(flatten)]
    pub result: BenchmarkResult,
    pub calibration: CalibrationResult,
}

impl PassResult {
    pub fn new(chunk_size: usize, calibration: CalibrationResult) -> Self {
        PassResult {
            result: BenchmarkResult::new(chunk_size as u64, &calibration),
            calibration,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct SuiteReport {
    pub suite: SuiteKind,
    pub passes: Vec<PassResult>,
}

pub(crate) trait Suite {
    fn run(self: Box<Self>, ctx: &mut RunContext<'_>) -> Result<SuiteReport, RunError>;
}

pub(crate) fn setup_suite(kind: SuiteKind) -> Box<dyn Suite> {
    match kind {
        SuiteKind::CpuInt => Box::new(SuiteCpuInt {}),
        SuiteKind::CpuFloat => Box::new(SuiteCpuFloat {}),
        SuiteKind::DiskPhysical => Box::new(SuiteDiskPhysical {}),
        SuiteKind::DiskCache => Box::new(SuiteDiskCache {}),
    }
}

/// Status line prefix, flushed so it shows while the pass runs.
fn start_status(out: &mut dyn Write, chunk_size: usize) -> std::io::Result<()> {
    write!(out, "Doing {} reads...", hostperf::chunk_label(chunk_size as u64))?;
    out.flush()
}

fn print_table(out: &mut dyn Write, passes: &[PassResult]) -> std::io::Result<()> {
    let results: Vec<BenchmarkResult> = passes.iter().map(|p| p.result.clone()).collect();
    out.write_all(render_table(&results).as_bytes())
}

fn warn_cache_flush_failed(
    ctx: &RunContext<'_>,
    path: &std::path::Path,
    err: &dyn std::error::Error,
) {
    tracing::warn!(
        method = ctx.cache_flush.name(),
        ?path,
        "couldn't evict cached pages, reads may be served from memory: {err}"
    );
}
