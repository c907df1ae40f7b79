//! Publish manifest models and error types.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use pubkit_io_fs::{EnumSelectorMode, SpecSelector, find_matching_selector, validate_selectors};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::{C_OUTPUT_DIR_DEFAULT, derive_default_publish_manifest};

/// Errors raised while loading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Manifest not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("TOML parse error in {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to render manifest: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("Manifest validation error: {0}")]
    Validation(String),
}

/// How entries of a `patterns` list are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumPatternMode {
    /// Shell-like wildcards.
    #[default]
    Glob,
    /// Regular expressions.
    Regex,
}

impl From<EnumPatternMode> for EnumSelectorMode {
    fn from(value: EnumPatternMode) -> Self {
        match value {
            EnumPatternMode::Glob => EnumSelectorMode::Glob,
            EnumPatternMode::Regex => EnumSelectorMode::Regex,
        }
    }
}

/// One named subdirectory and the files it contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecDirRule {
    /// Subdirectory name, relative to the source root.
    pub name: String,
    /// Exact file names.
    #[serde(default)]
    pub files: Vec<String>,
    /// Basename patterns, interpreted per [`SpecPublishManifest::pattern_mode`].
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SpecDirRule {
    /// Exact names first, then patterns.
    pub fn selectors(&self, pattern_mode: EnumPatternMode) -> Vec<SpecSelector> {
        derive_selectors(&self.files, &self.patterns, pattern_mode)
    }
}

/// The allow-list: everything eligible for publishing.
///
/// A manifest file is the complete allow-list; omitted lists are empty, not
/// inherited from the built-in default.
///
/// ```toml
/// output_dir = "public"
/// pattern_mode = "glob"
/// files = ["password_generator.py", "README.md"]
///
/// [[dirs]]
/// name = "image_resolution_checker"
/// files = ["image_info.py"]
/// patterns = ["*.png", "*.jpg"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecPublishManifest {
    /// Publish directory, relative to the source root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Interpretation of every `patterns` list.
    #[serde(default)]
    pub pattern_mode: EnumPatternMode,
    /// Root-level exact file names.
    #[serde(default)]
    pub files: Vec<String>,
    /// Root-level basename patterns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    /// Named subdirectories.
    #[serde(default)]
    pub dirs: Vec<SpecDirRule>,
}

fn default_output_dir() -> String {
    C_OUTPUT_DIR_DEFAULT.to_string()
}

impl Default for SpecPublishManifest {
    fn default() -> Self {
        derive_default_publish_manifest()
    }
}

impl SpecPublishManifest {
    /// Selectors for the root pass.
    pub fn root_selectors(&self) -> Vec<SpecSelector> {
        derive_selectors(&self.files, &self.patterns, self.pattern_mode)
    }

    /// Look up a directory rule by name.
    pub fn dir_rule(&self, name: &str) -> Option<&SpecDirRule> {
        self.dirs.iter().find(|d| d.name == name)
    }

    /// Check structural rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ManifestError> {
        validate_single_component("output_dir", &self.output_dir)?;
        if self.files.is_empty() && self.patterns.is_empty() && self.dirs.is_empty() {
            return Err(ManifestError::Validation(
                "manifest selects nothing: `files`, `patterns` and `dirs` are all empty".into(),
            ));
        }

        for name in &self.files {
            validate_single_component("files", name)?;
        }
        let l_root_selectors = self.root_selectors();
        validate_patterns(&l_root_selectors)?;
        if let Some(selector) = find_matching_selector(&l_root_selectors, &self.output_dir)
            .map_err(|e| ManifestError::Validation(e.to_string()))?
        {
            return Err(ManifestError::Validation(format!(
                "output_dir `{}` is selected by root entry `{}`",
                self.output_dir, selector.pattern
            )));
        }

        let mut set_dir_names = HashSet::new();
        for rule in &self.dirs {
            validate_single_component("dirs.name", &rule.name)?;
            if rule.name == self.output_dir {
                return Err(ManifestError::Validation(format!(
                    "dirs.name `{}` collides with output_dir",
                    rule.name
                )));
            }
            if !set_dir_names.insert(rule.name.as_str()) {
                return Err(ManifestError::Validation(format!(
                    "dirs.name `{}` is listed twice",
                    rule.name
                )));
            }
            if rule.files.is_empty() && rule.patterns.is_empty() {
                return Err(ManifestError::Validation(format!(
                    "dirs `{}` selects nothing",
                    rule.name
                )));
            }
            for name in &rule.files {
                validate_single_component("dirs.files", name)?;
            }
            validate_patterns(&rule.selectors(self.pattern_mode))?;
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn derive_selectors(
    files: &[String],
    patterns: &[String],
    pattern_mode: EnumPatternMode,
) -> Vec<SpecSelector> {
    files
        .iter()
        .map(SpecSelector::exact)
        .chain(patterns.iter().map(|p| SpecSelector {
            pattern: p.clone(),
            rule_selector: pattern_mode.into(),
        }))
        .collect()
}

fn validate_patterns(selectors: &[SpecSelector]) -> Result<(), ManifestError> {
    validate_selectors(selectors).map_err(|e| ManifestError::Validation(e.to_string()))
}

/// Accept exactly one normal path component: no separators, no `.`/`..`.
fn validate_single_component(field: &str, value: &str) -> Result<(), ManifestError> {
    let mut components = Path::new(value).components();
    let b_is_single_normal =
        matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
    if value.is_empty() || !b_is_single_normal || value.contains(['/', '\\']) {
        return Err(ManifestError::Validation(format!(
            "{field} entry `{value}` must be a plain name without path separators"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pubkit_io_fs::EnumSelectorMode;

    use super::{EnumPatternMode, ManifestError, SpecDirRule, SpecPublishManifest};

    fn minimal() -> SpecPublishManifest {
        SpecPublishManifest {
            output_dir: "public".to_string(),
            pattern_mode: EnumPatternMode::Glob,
            files: vec!["README.md".to_string()],
            patterns: Vec::new(),
            dirs: Vec::new(),
        }
    }

    #[test]
    fn default_manifest_is_valid() {
        let manifest = SpecPublishManifest::default();
        manifest.validate().expect("default manifest validates");
        assert_eq!(manifest.output_dir, "public");
        assert!(manifest.files.iter().any(|f| f == "password_generator.py"));
        assert_eq!(manifest.dirs.len(), 2);
        assert_eq!(
            manifest
                .dir_rule("leetcode_analyzer")
                .expect("leetcode rule")
                .files
                .len(),
            3
        );
    }

    #[test]
    fn dir_rule_selectors_put_exact_names_first() {
        let manifest = SpecPublishManifest::default();
        let rule = manifest
            .dir_rule("image_resolution_checker")
            .expect("image rule");
        let l_selectors = rule.selectors(manifest.pattern_mode);
        assert_eq!(l_selectors[0].pattern, "image_info.py");
        assert_eq!(l_selectors[0].rule_selector, EnumSelectorMode::Exact);
        assert!(
            l_selectors[1..]
                .iter()
                .all(|s| s.rule_selector == EnumSelectorMode::Glob)
        );
    }

    #[test]
    fn validate_rejects_path_like_names() {
        for bad in ["", ".", "..", "a/b", "../x", "/abs", "a\\b"] {
            let manifest = SpecPublishManifest {
                output_dir: bad.to_string(),
                ..minimal()
            };
            assert!(
                matches!(manifest.validate(), Err(ManifestError::Validation(_))),
                "output_dir `{bad}` should be rejected"
            );
        }

        let manifest = SpecPublishManifest {
            files: vec!["scripts/run.py".to_string()],
            ..minimal()
        };
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_and_colliding_rules() {
        let manifest = SpecPublishManifest {
            files: Vec::new(),
            ..minimal()
        };
        assert!(manifest.validate().is_err());

        let rule = SpecDirRule {
            name: "public".to_string(),
            files: vec!["a.py".to_string()],
            patterns: Vec::new(),
        };
        let manifest = SpecPublishManifest {
            dirs: vec![rule],
            ..minimal()
        };
        assert!(manifest.validate().is_err());

        let rule = SpecDirRule {
            name: "docs".to_string(),
            files: Vec::new(),
            patterns: Vec::new(),
        };
        let manifest = SpecPublishManifest {
            dirs: vec![rule.clone()],
            ..minimal()
        };
        assert!(manifest.validate().is_err());

        let rule = SpecDirRule {
            files: vec!["index.md".to_string()],
            ..rule
        };
        let manifest = SpecPublishManifest {
            dirs: vec![rule.clone(), rule],
            ..minimal()
        };
        assert!(manifest.validate().is_err());

        let manifest = SpecPublishManifest {
            output_dir: "snake_game.py".to_string(),
            files: vec!["snake_game.py".to_string()],
            ..minimal()
        };
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::Validation(msg)) if msg.contains("snake_game.py")
        ));

        let manifest = SpecPublishManifest {
            output_dir: "site.md".to_string(),
            patterns: vec!["*.md".to_string()],
            ..minimal()
        };
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn validate_compiles_patterns_in_manifest_mode() {
        let manifest = SpecPublishManifest {
            pattern_mode: EnumPatternMode::Regex,
            patterns: vec!["(".to_string()],
            ..minimal()
        };
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::Validation(msg)) if msg.contains('(')
        ));
    }
}
