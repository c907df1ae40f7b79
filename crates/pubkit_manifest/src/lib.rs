//! `pubkit_manifest`:
//! the publish allow-list.
//!
//! - `conf` : constants and the built-in allow-list
//! - `spec` : manifest models, validation and errors
//! - `load` : TOML parsing and manifest resolution
pub mod conf;
pub mod load;
pub mod spec;

pub use conf::{C_MANIFEST_FILE_NAME, C_OUTPUT_DIR_DEFAULT, derive_default_publish_manifest};
pub use load::{EnumManifestOrigin, load_manifest, parse_manifest, resolve_manifest};
pub use spec::{EnumPatternMode, ManifestError, SpecDirRule, SpecPublishManifest};
