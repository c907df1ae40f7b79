//! Collector options and top-level error types.

use std::path::PathBuf;

use pubkit_io_fs::{CopySelectionError, EnumCopySymlinkStrategy};
use pubkit_manifest::ManifestError;
use thiserror::Error;

/// Input options for `collect`.
#[derive(Debug, Clone)]
pub struct SpecCollectOptions {
    /// Publish directory; `None` means `<source_root>/<manifest.output_dir>`.
    pub path_output: Option<PathBuf>,
    /// Remove a previous publish directory before copying.
    pub if_clean: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
    /// Maximum worker threads per copy pass.
    pub num_workers_max: Option<usize>,
    /// Symlink handling behavior.
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Carry permissions and timestamps over.
    pub if_preserve_metadata: bool,
}

impl Default for SpecCollectOptions {
    fn default() -> Self {
        Self {
            path_output: None,
            if_clean: true,
            if_dry_run: false,
            num_workers_max: None,
            rule_symlink: EnumCopySymlinkStrategy::Dereference,
            if_preserve_metadata: true,
        }
    }
}

/// Errors that abort a collector run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Source root is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(
        "Publish directory {} must not be the source root or one of its parents",
        .path_output.display()
    )]
    OutputContainsSource { path_output: PathBuf },
    #[error(
        "Publish directory {} overlaps source content {}",
        .path_output.display(),
        .path_source.display()
    )]
    OutputOverlapsSource {
        path_output: PathBuf,
        path_source: PathBuf,
    },
    #[error("Failed to prepare publish directory {}: {source}", .path.display())]
    OutputInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read source directory {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Copy(#[from] CopySelectionError),
}
