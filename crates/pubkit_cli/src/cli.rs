use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pubkit_collect::{ReportCollect, SpecCollectOptions, check, collect};
use pubkit_io_fs::EnumCopySymlinkStrategy;
use pubkit_log::{EnumLogLevel, init_logging};
use pubkit_manifest::resolve_manifest;

use crate::error::{CliError, ExitStatus};
use crate::output::{OutputFormat, emit, format_check, format_collect};

#[derive(Parser, Debug)]
#[command(name = "pubkit", version, about = "Assemble an allow-listed publish directory")]
struct Cli {
    /// Source root to collect from
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    source: PathBuf,

    /// Manifest file (default: <source>/pubkit.toml, else the built-in allow-list)
    #[arg(long, global = true, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v per pass, -vv per entry)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy the allow-listed files into the publish directory
    Collect(CollectArgs),
    /// Show what would be published and what the allow-list does not cover
    Check {
        /// Exit non-zero when an allow-list entry is missing
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective manifest as TOML
    Manifest,
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// Publish directory (default: <source>/<output_dir>). An existing
    /// directory there is removed first unless --no-clean is given.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Keep an existing publish directory instead of recreating it
    #[arg(long)]
    no_clean: bool,

    /// Report what would be copied without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Maximum copy worker threads (1 = serial)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(usize))]
    workers: Option<usize>,

    /// Exit non-zero when an allow-list entry is missing
    #[arg(long)]
    strict: bool,

    /// How symlinked source files are published
    #[arg(long, value_enum, default_value_t = SymlinkArg::Follow)]
    symlinks: SymlinkArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SymlinkArg {
    /// Copy the link target's bytes
    Follow,
    /// Recreate the link
    Copy,
    /// Leave symlinks out
    Skip,
}

impl From<SymlinkArg> for EnumCopySymlinkStrategy {
    fn from(value: SymlinkArg) -> Self {
        match value {
            SymlinkArg::Follow => EnumCopySymlinkStrategy::Dereference,
            SymlinkArg::Copy => EnumCopySymlinkStrategy::CopySymlinks,
            SymlinkArg::Skip => EnumCopySymlinkStrategy::SkipSymlinks,
        }
    }
}

pub fn run() -> ExitCode {
    match run_cli(std::env::args_os()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parse arguments, install logging, dispatch. Returns a `sysexits` code.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    init_logging(EnumLogLevel::from_flags(cli.quiet, cli.verbose));

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let if_verbose = cli.verbose > 0;

    if !cli.source.is_dir() {
        return Err(CliError::new(
            format!("Source root is not a directory: {}", cli.source.display()),
            ExitStatus::NoInput,
        ));
    }
    let (manifest, origin) = resolve_manifest(cli.manifest.as_deref(), &cli.source)?;
    tracing::debug!(source = %cli.source.display(), %origin, "resolved manifest");

    match cli.command {
        Command::Collect(args) => {
            let spec_collect_options = SpecCollectOptions {
                path_output: args.output,
                if_clean: !args.no_clean,
                if_dry_run: args.dry_run,
                num_workers_max: args.workers,
                rule_symlink: args.symlinks.into(),
                ..SpecCollectOptions::default()
            };
            let report = collect(&cli.source, &manifest, origin, &spec_collect_options)?;
            emit(&report, || format_collect(&report, if_verbose), format)?;
            Ok(derive_exit_status(&report, args.strict).into())
        }
        Command::Check { strict } => {
            let report = check(&cli.source, &manifest, origin)?;
            emit(&report, || format_check(&report), format)?;
            Ok(derive_exit_status(&report.plan, strict).into())
        }
        Command::Manifest => {
            manifest.validate()?;
            match format {
                OutputFormat::Json => emit(&manifest, Vec::new, format)?,
                OutputFormat::Text => {
                    println!("# origin: {origin}");
                    print!("{}", manifest.to_toml_string()?);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Failed entries outrank missing ones; missing only counts under `strict`.
fn derive_exit_status(report: &ReportCollect, if_strict: bool) -> ExitStatus {
    if report.error_count() > 0 {
        ExitStatus::Io
    } else if if_strict && report.cnt_missing() > 0 {
        tracing::error!(missing = ?report.missing_entries(), "allow-list entries missing");
        ExitStatus::Data
    } else {
        ExitStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, SymlinkArg};

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pubkit", "collect", "--source", "repo", "--json", "-vv", "--workers", "2",
            "--symlinks", "skip",
        ])
        .expect("parses");
        assert_eq!(cli.source.to_str(), Some("repo"));
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Collect(args) => {
                assert_eq!(args.workers, Some(2));
                assert!(matches!(args.symlinks, SymlinkArg::Skip));
                assert!(!args.no_clean);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pubkit", "-q", "-v", "check"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["pubkit"]).is_err());
    }
}
