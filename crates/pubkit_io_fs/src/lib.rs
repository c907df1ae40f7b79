//! `pubkit_io_fs`:
//! allow-list selection-copy engine.
//!
//! - `copy`   : directory scan, selector matching and copy orchestration
//! - `spec`   : enums/options/errors
//! - `report` : per-entry results and run counters
//! - `util`   : pattern compilation, path safety and metadata helpers

pub mod copy;
pub mod report;
pub mod spec;
mod util;

pub use copy::{copy_selection, find_matching_selector, validate_selectors};
pub use report::{ReportCopy, ReportCopyBuilder, SpecCopyEntry};
pub use spec::{
    CopySelectionError, EnumCopyFileConflictStrategy, EnumCopyOutcome, EnumCopySymlinkStrategy,
    EnumSelectorMode, SpecCopyError, SpecCopyOptions, SpecSelector,
};
pub use util::{is_destination_containing_source, is_path_within};
