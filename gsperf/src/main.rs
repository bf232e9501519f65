use std::{io::Write, process::ExitCode};

use itertools::Itertools;
use page_cache::CacheFlush;
use tracing::{debug, info};

use args::{Invocation, USAGE};
use config::Config;
use suites::{setup_suite, RunContext, RunError, SuiteReport};

mod args;
mod config;
mod output;
mod suites;

fn main() -> ExitCode {
    let (args, selection) = match args::parse(std::env::args_os()) {
        Ok(Invocation::Run { args, selection }) => (args, selection),
        Ok(Invocation::Help) => {
            print!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("gsperf: {}", e.kind());
            print!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(args.verbose);

    let suites = selection.suites();
    if suites.is_empty() {
        println!("No tests selected");
        print!("{USAGE}");
        return ExitCode::FAILURE;
    }
    info!(
        "running {}",
        suites.iter().map(|kind| format!("{kind:?}")).join(", ")
    );

    let config = Config::from_args(&args);
    debug!(?config, "resolved configuration");

    match run(&args, &config, suites) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gsperf: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .init();
}

fn run(args: &args::Args, config: &Config, suites: Vec<suites::SuiteKind>) -> Result<(), RunError> {
    let cache_flush = page_cache::platform();
    debug!(method = cache_flush.name(), "cache flush");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut reports: Vec<SuiteReport> = Vec::with_capacity(suites.len());
    for kind in suites {
        let mut ctx = RunContext {
            config,
            out: &mut out,
            cache_flush: &cache_flush,
        };
        reports.push(setup_suite(kind).run(&mut ctx)?);
        out.flush()?;
    }

    if let Some(path) = &config.output_json {
        output::write_json(path, args, &reports)?;
    }
    Ok(())
}
