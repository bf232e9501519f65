use std::path::Path;

use tracing::info;

use crate::{
    args::Args,
    suites::{RunError, SuiteReport},
};

#[derive(serde::Serialize)]
struct BenchmarkOutput<'a> {
    args: &'a Args,
    suites: &'a [SuiteReport],
}

/// Dumps the arguments and every pass of every suite that ran as JSON.
pub(crate) fn write_json(path: &Path, args: &Args, suites: &[SuiteReport]) -> Result<(), RunError> {
    let output = BenchmarkOutput { args, suites };
    info!("writing results to {:?}", path);
    let json = serde_json::to_string_pretty(&output)?;
    std::fs::write(path, json).map_err(|source| RunError::JsonWrite {
        path: path.to_owned(),
        source,
    })
}
