//! Manifest constants and the built-in allow-list.

use crate::spec::{EnumPatternMode, SpecDirRule, SpecPublishManifest};

/// File name looked up in the source root when no manifest path is given.
pub const C_MANIFEST_FILE_NAME: &str = "pubkit.toml";
/// Default publish directory, relative to the source root.
pub const C_OUTPUT_DIR_DEFAULT: &str = "public";

/// Root-level scripts and docs published by default.
pub const TUP_ROOT_FILES_DEFAULT: [&str; 6] = [
    "interactive_quiz_game.py",
    "leetcode_stats_analyzer.py",
    "password_generator.py",
    "rock_paper_scissors_game.py",
    "snake_game.py",
    "README.md",
];

/// Image extensions the resolution checker understands.
pub const TUP_IMAGE_PATTERNS_DEFAULT: [&str; 5] = ["*.png", "*.jpg", "*.jpeg", "*.gif", "*.bmp"];

/// Build the built-in publish manifest.
///
/// Used when neither `--manifest` nor a `pubkit.toml` in the source root is
/// available.
pub fn derive_default_publish_manifest() -> SpecPublishManifest {
    let to_vec = |items: &[&str]| items.iter().map(|v| v.to_string()).collect::<Vec<_>>();

    SpecPublishManifest {
        output_dir: C_OUTPUT_DIR_DEFAULT.to_string(),
        pattern_mode: EnumPatternMode::Glob,
        files: to_vec(&TUP_ROOT_FILES_DEFAULT),
        patterns: Vec::new(),
        dirs: vec![
            SpecDirRule {
                name: "image_resolution_checker".to_string(),
                files: to_vec(&["image_info.py"]),
                patterns: to_vec(&TUP_IMAGE_PATTERNS_DEFAULT),
            },
            SpecDirRule {
                name: "leetcode_analyzer".to_string(),
                files: to_vec(&["leetcode_stats_analyzer.py", "requirements.txt", "README.md"]),
                patterns: Vec::new(),
            },
        ],
    }
}
