use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use pubkit_collect::CollectError;
use pubkit_io_fs::CopySelectionError;
use pubkit_manifest::ManifestError;
use thiserror::Error;

const EX_OK: u8 = 0;
const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_NOINPUT: u8 = 66;
const EX_SOFTWARE: u8 = 70;
const EX_IOERR: u8 = 74;
const EX_CONFIG: u8 = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    Usage,
    Data,
    NoInput,
    Io,
    Config,
    Software,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Ok => EX_OK,
            ExitStatus::Usage => EX_USAGE,
            ExitStatus::Data => EX_DATAERR,
            ExitStatus::NoInput => EX_NOINPUT,
            ExitStatus::Io => EX_IOERR,
            ExitStatus::Config => EX_CONFIG,
            ExitStatus::Software => EX_SOFTWARE,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(value: ExitStatus) -> Self {
        ExitCode::from(value.code())
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    message: String,
    status: ExitStatus,
}

impl CliError {
    pub fn new(message: impl Into<String>, status: ExitStatus) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn exit_code(&self) -> ExitCode {
        self.status.into()
    }

    pub fn print(&self) {
        if !self.message.is_empty() {
            eprintln!("error: {}", self.message);
        }
    }
}

fn status_for_manifest(err: &ManifestError) -> ExitStatus {
    match err {
        ManifestError::NotFound(_) => ExitStatus::NoInput,
        ManifestError::Io { .. } | ManifestError::Toml { .. } => ExitStatus::Config,
        ManifestError::Validation(_) => ExitStatus::Data,
        ManifestError::Render(_) => ExitStatus::Software,
    }
}

fn status_for_copy(err: &CopySelectionError) -> ExitStatus {
    match err {
        CopySelectionError::InvalidPattern { .. } => ExitStatus::Data,
        CopySelectionError::SourceNotDirectory(_) => ExitStatus::NoInput,
        CopySelectionError::DestinationContainsSource { .. } => ExitStatus::Usage,
        CopySelectionError::DestinationInitFailed { .. }
        | CopySelectionError::SourceReadFailed { .. } => ExitStatus::Io,
    }
}

impl From<ManifestError> for CliError {
    fn from(err: ManifestError) -> Self {
        CliError::new(err.to_string(), status_for_manifest(&err))
    }
}

impl From<CollectError> for CliError {
    fn from(err: CollectError) -> Self {
        let status = match &err {
            CollectError::SourceNotDirectory(_) => ExitStatus::NoInput,
            CollectError::Manifest(inner) => status_for_manifest(inner),
            CollectError::OutputContainsSource { .. }
            | CollectError::OutputOverlapsSource { .. } => ExitStatus::Usage,
            CollectError::OutputInit { .. } | CollectError::SourceRead { .. } => ExitStatus::Io,
            CollectError::Copy(inner) => status_for_copy(inner),
        };
        CliError::new(err.to_string(), status)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> Self {
        let status = match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitStatus::Ok,
            _ => ExitStatus::Usage,
        };
        if status == ExitStatus::Ok {
            let _ = err.print();
            CliError::new(String::new(), status)
        } else {
            CliError::new(err.to_string(), status)
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::new(err.to_string(), ExitStatus::Software)
    }
}
