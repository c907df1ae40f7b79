//! Selection-copy specification models and top-level error types.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy for matched source entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link and copy the target bytes.
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumCopyFileConflictStrategy {
    /// Keep destination file and skip current source file.
    Skip,
    /// Replace destination file with source file.
    Overwrite,
    /// Record an error and skip this file.
    Error,
}

/// How one selector pattern is interpreted against a basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumSelectorMode {
    /// Basename must equal the pattern.
    Exact,
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
}

/// Final state of one allow-list entry after a selection-copy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumCopyOutcome {
    /// Source file found and committed to the destination.
    Copied,
    /// Selector matched nothing in the source directory.
    Missing,
    /// Matched but left alone (conflict, symlink policy, special file).
    Skipped,
    /// Matched and would be copied; dry-run did not touch the filesystem.
    Planned,
    /// Matched but the copy itself failed.
    Failed,
}

impl EnumCopyOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copied => "copied",
            Self::Missing => "missing",
            Self::Skipped => "skipped",
            Self::Planned => "planned",
            Self::Failed => "failed",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One allow-list item: a pattern and how to match it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecSelector {
    /// Raw pattern text.
    pub pattern: String,
    /// Pattern interpretation mode.
    pub rule_selector: EnumSelectorMode,
}

impl SpecSelector {
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            pattern: name.into(),
            rule_selector: EnumSelectorMode::Exact,
        }
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            rule_selector: EnumSelectorMode::Glob,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            rule_selector: EnumSelectorMode::Regex,
        }
    }
}

/// Input options for `copy_selection`.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Conflict behavior for destination files.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Symlink handling behavior.
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Maximum worker threads for file-copy stage.
    pub num_workers_max: Option<usize>,
    /// Carry permissions, timestamps and extended attributes over.
    pub if_preserve_metadata: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            rule_conflict_file: EnumCopyFileConflictStrategy::Overwrite,
            rule_symlink: EnumCopySymlinkStrategy::Dereference,
            num_workers_max: None,
            if_preserve_metadata: true,
            if_dry_run: false,
        }
    }
}

/// One copy failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecCopyError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// "Top-level call failed" errors (input validation / setup stage).
#[derive(Debug, Error)]
pub enum CopySelectionError {
    /// Invalid selector pattern.
    #[error("Invalid selector pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Pattern as written in the allow-list.
        pattern: String,
        /// Compiler error text.
        message: String,
    },
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Destination is the source itself or one of its ancestors.
    #[error(
        "Destination must not contain the source directory: {} <-> {}",
        .source_dir.display(),
        .destination.display()
    )]
    DestinationContainsSource {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Destination directory initialization failed.
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// Source directory could not be listed.
    #[error("Failed to read source directory {}: {message}", .path.display())]
    SourceReadFailed {
        /// Source directory path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
