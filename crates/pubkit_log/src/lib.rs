//! `pubkit_log`:
//! logging setup shared by pubkit binaries.
//!
//! Library crates only emit `tracing` events; installing a subscriber is the
//! binary's job.

use std::io;

use tracing_subscriber::EnvFilter;

/// Crates whose events the verbosity flags control.
const TUP_PUBKIT_TARGETS: [&str; 4] = [
    "pubkit_io_fs",
    "pubkit_manifest",
    "pubkit_collect",
    "pubkit_cli",
];

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLogLevel {
    /// Errors only.
    Quiet,
    /// Warnings and errors.
    #[default]
    Normal,
    /// Per-pass progress.
    Verbose,
    /// Per-entry detail.
    Debug,
}

impl EnumLogLevel {
    /// Map `-q` / repeated `-v` flags to a level. `quiet` wins.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Debug,
        }
    }

    fn as_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Build the filter: `RUST_LOG` when set, else pubkit crates at `level`.
pub fn derive_env_filter(level: EnumLogLevel) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = level.as_directive();
    let spec_filter = std::iter::once("warn".to_string())
        .chain(TUP_PUBKIT_TARGETS.iter().map(|t| format!("{t}={directive}")))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(spec_filter)
}

/// Install the global stderr subscriber. A second call is a no-op.
pub fn init_logging(level: EnumLogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(derive_env_filter(level))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
