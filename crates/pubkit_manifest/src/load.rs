//! Manifest loading and resolution.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::conf::{C_MANIFEST_FILE_NAME, derive_default_publish_manifest};
use crate::spec::{ManifestError, SpecPublishManifest};

/// Where the effective manifest came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum EnumManifestOrigin {
    /// Loaded from a TOML file.
    File(PathBuf),
    /// Compiled-in default allow-list.
    BuiltIn,
}

impl fmt::Display for EnumManifestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::BuiltIn => write!(f, "built-in"),
        }
    }
}

/// Parse and validate manifest text. `origin` labels parse errors.
pub fn parse_manifest(text: &str, origin: &str) -> Result<SpecPublishManifest, ManifestError> {
    let manifest: SpecPublishManifest =
        toml::from_str(text).map_err(|source| ManifestError::Toml {
            origin: origin.to_string(),
            source,
        })?;
    manifest.validate()?;
    Ok(manifest)
}

/// Read, parse and validate a manifest file.
pub fn load_manifest(path: &Path) -> Result<SpecPublishManifest, ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ManifestError::NotFound(path.to_path_buf())
        } else {
            ManifestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    parse_manifest(&text, &path.display().to_string())
}

/// Pick the effective manifest.
///
/// An explicit path must exist. Without one, `<source_root>/pubkit.toml` is
/// used when present, else the built-in allow-list.
pub fn resolve_manifest(
    path_manifest: Option<&Path>,
    dir_source_root: &Path,
) -> Result<(SpecPublishManifest, EnumManifestOrigin), ManifestError> {
    if let Some(path) = path_manifest {
        let manifest = load_manifest(path)?;
        tracing::debug!(path = %path.display(), "loaded explicit manifest");
        return Ok((manifest, EnumManifestOrigin::File(path.to_path_buf())));
    }

    let path_default = dir_source_root.join(C_MANIFEST_FILE_NAME);
    if path_default.is_file() {
        let manifest = load_manifest(&path_default)?;
        tracing::debug!(path = %path_default.display(), "loaded manifest from source root");
        return Ok((manifest, EnumManifestOrigin::File(path_default)));
    }

    tracing::debug!("no manifest file found; using built-in allow-list");
    Ok((derive_default_publish_manifest(), EnumManifestOrigin::BuiltIn))
}
