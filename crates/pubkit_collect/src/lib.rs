//! `pubkit_collect`:
//! the selective collector that assembles a publish directory.
//!
//! - `collect` : `collect` and `check` orchestration
//! - `spec`    : options/errors
//! - `report`  : run summary models
pub mod collect;
pub mod report;
pub mod spec;

pub use collect::{check, collect, derive_output_path};
pub use report::{EnumDirPassOutcome, ReportCheck, ReportCollect, ReportDirPass};
pub use spec::{CollectError, SpecCollectOptions};
