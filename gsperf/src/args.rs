use std::{ffi::OsString, path::PathBuf, time::Duration};

use serde_with::serde_as;

pub(crate) const USAGE: &str = "\
Usage: gsperf [--cpu] [--cpu-int] [--cpu-float]
              [--disk] [--disk-physical] [--disk-cache]
              [--all] [-v|--verbose] [-h|--help]
              [--cpu-duration <dur>] [--physical-duration <dur>] [--cache-duration <dur>]
              [--large-file-mib <n>] [--scratch-dir <path>] [--output-json <path>]
";

#[serde_as]
#[derive(Debug, Clone, clap::Parser, serde::Serialize)]
#[command(name = "gsperf", disable_help_flag = true)]
pub(crate) struct Args {
    #[arg(long)]
    pub cpu_int: bool,
    #[arg(long)]
    pub cpu_float: bool,
    /// Shorthand for all cpu tests.
    #[arg(long)]
    pub cpu: bool,
    #[arg(long)]
    pub disk_physical: bool,
    #[arg(long)]
    pub disk_cache: bool,
    /// Shorthand for all disk tests.
    #[arg(long)]
    pub disk: bool,
    /// Shorthand for all tests.
    #[arg(long)]
    pub all: bool,
    #[arg(short, long)]
    pub verbose: bool,
    #[arg(short, long)]
    pub help: bool,
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    #[serde_as(as = "serde_with::DurationSecondsWithFrac<f64>")]
    pub cpu_duration: Duration,
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    #[serde_as(as = "serde_with::DurationSecondsWithFrac<f64>")]
    pub physical_duration: Duration,
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    #[serde_as(as = "serde_with::DurationSecondsWithFrac<f64>")]
    pub cache_duration: Duration,
    #[arg(long, default_value_t = 8192, value_parser = clap::value_parser!(u64).range(1..))]
    pub large_file_mib: u64,
    #[arg(long, default_value = ".")]
    pub scratch_dir: PathBuf,
    #[arg(long)]
    pub output_json: Option<PathBuf>,
}

/// Which benchmarks run, after expanding the shorthand flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Selection {
    pub cpu_int: bool,
    pub cpu_float: bool,
    pub disk_physical: bool,
    pub disk_cache: bool,
}

impl Selection {
    pub fn from_args(args: &Args) -> Self {
        let cpu = args.cpu || args.all;
        let disk = args.disk || args.all;
        Selection {
            cpu_int: args.cpu_int || cpu,
            cpu_float: args.cpu_float || cpu,
            disk_physical: args.disk_physical || disk,
            disk_cache: args.disk_cache || disk,
        }
    }

    pub fn suites(&self) -> Vec<crate::suites::SuiteKind> {
        use crate::suites::SuiteKind;
        [
            (self.cpu_int, SuiteKind::CpuInt),
            (self.cpu_float, SuiteKind::CpuFloat),
            (self.disk_physical, SuiteKind::DiskPhysical),
            (self.disk_cache, SuiteKind::DiskCache),
        ]
        .into_iter()
        .filter_map(|(selected, kind)| selected.then_some(kind))
        .collect()
    }
}

pub(crate) enum Invocation {
    Help,
    Run { args: Args, selection: Selection },
}

/// Parses the command line. `Err` means the arguments were not understood.
pub(crate) fn parse<I, T>(argv: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = <Args as clap::Parser>::try_parse_from(argv)?;
    if args.help {
        return Ok(Invocation::Help);
    }
    let selection = Selection::from_args(&args);
    Ok(Invocation::Run { args, selection })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::SuiteKind;

    fn selection(argv: &[&str]) -> Selection {
        let argv = std::iter::once("gsperf").chain(argv.iter().copied());
        match parse(argv).unwrap() {
            Invocation::Run { selection, .. } => selection,
            Invocation::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn nothing_selected_by_default() {
        let s = selection(&[]);
        assert_eq!(s, Selection::default());
        assert_eq!(s.suites().len(), 0);
        assert!(selection(&["-v"]).suites().is_empty());
    }

    #[test]
    fn shorthands_expand() {
        assert_eq!(
            selection(&["--cpu"]).suites(),
            vec![SuiteKind::CpuInt, SuiteKind::CpuFloat]
        );
        assert_eq!(
            selection(&["--disk"]).suites(),
            vec![SuiteKind::DiskPhysical, SuiteKind::DiskCache]
        );
        assert_eq!(selection(&["--all"]).suites().len(), 4);
        assert_eq!(
            selection(&["--disk-cache", "--cpu-int"]).suites(),
            vec![SuiteKind::CpuInt, SuiteKind::DiskCache]
        );
        // repeated flags are harmless
        assert_eq!(selection(&["--cpu-int", "--cpu"]).suites().len(), 2);
    }

    #[test]
    fn help_flags() {
        for flag in ["-h", "--help"] {
            assert!(matches!(
                parse(["gsperf", flag]).unwrap(),
                Invocation::Help
            ));
        }
        assert!(matches!(
            parse(["gsperf", "--all", "--help"]).unwrap(),
            Invocation::Help
        ));
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        for bad in ["--bogus", "cpu", "-x", "--cpu-int=1"] {
            assert!(parse(["gsperf", bad]).is_err(), "{bad}");
        }
    }

    #[test]
    fn value_options() {
        let argv = [
            "gsperf",
            "--disk-cache",
            "--cache-duration",
            "250ms",
            "--large-file-mib",
            "64",
            "--scratch-dir",
            "/tmp/x",
        ];
        let Invocation::Run { args, .. } = parse(argv).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(args.cache_duration, Duration::from_millis(250));
        assert_eq!(args.cpu_duration, Duration::from_secs(5));
        assert_eq!(args.physical_duration, Duration::from_secs(5));
        assert_eq!(args.large_file_mib, 64);
        assert_eq!(args.scratch_dir, PathBuf::from("/tmp/x"));
        assert!(args.output_json.is_none());

        assert!(parse(["gsperf", "--cpu-duration", "soon"]).is_err());
        assert!(parse(["gsperf", "--large-file-mib", "0"]).is_err());
    }
}
