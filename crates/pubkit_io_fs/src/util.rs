use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{
    CopySelectionError, EnumCopyFileConflictStrategy, EnumSelectorMode, SpecSelector,
};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeSelectorMatcher {
    Exact(String),
    Glob(GlobMatcher),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub(crate) struct SpecCompiledSelector {
    pub(crate) pattern: String,
    matcher: TypeSelectorMatcher,
}

impl SpecCompiledSelector {
    pub(crate) fn is_match(&self, name: &str) -> bool {
        match &self.matcher {
            TypeSelectorMatcher::Exact(v) => v == name,
            TypeSelectorMatcher::Glob(v) => v.is_match(name),
            TypeSelectorMatcher::Regex(v) => v.is_match(name),
        }
    }
}

pub(crate) fn compile_selectors(
    selectors: &[SpecSelector],
) -> Result<Vec<SpecCompiledSelector>, CopySelectionError> {
    selectors.iter().map(_compile).collect()
}

fn _compile(selector: &SpecSelector) -> Result<SpecCompiledSelector, CopySelectionError> {
    let invalid = |message: String| CopySelectionError::InvalidPattern {
        pattern: selector.pattern.clone(),
        message,
    };
    if selector.pattern.is_empty() {
        return Err(invalid("pattern is empty".to_string()));
    }

    let matcher = match selector.rule_selector {
        EnumSelectorMode::Exact => TypeSelectorMatcher::Exact(selector.pattern.clone()),
        EnumSelectorMode::Glob => TypeSelectorMatcher::Glob(
            Glob::new(&selector.pattern)
                .map_err(|e| invalid(e.to_string()))?
                .compile_matcher(),
        ),
        EnumSelectorMode::Regex => {
            TypeSelectorMatcher::Regex(Regex::new(&selector.pattern).map_err(|e| invalid(e.to_string()))?)
        }
    };
    Ok(SpecCompiledSelector {
        pattern: selector.pattern.clone(),
        matcher,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Canonicalize the longest existing ancestor and append the rest lexically,
/// so paths that do not exist yet compare like their eventual location.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    let path_abs = absolutize_path(path);
    let l_components: Vec<Component<'_>> = path_abs.components().collect();
    let mut n_resolved = l_components.len();
    let mut path_out = PathBuf::new();
    while n_resolved > 0 {
        let path_prefix: PathBuf = l_components[..n_resolved].iter().collect();
        if let Ok(resolved) = fs::canonicalize(&path_prefix) {
            path_out = resolved;
            break;
        }
        n_resolved -= 1;
    }

    for component in &l_components[n_resolved..] {
        match component {
            Component::ParentDir => {
                path_out.pop();
            }
            Component::CurDir => {}
            other => path_out.push(other.as_os_str()),
        }
    }
    path_out
}

fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// `true` when `path` is `base` or lies somewhere beneath it. Symlinks in the
/// existing part of either path are resolved first.
pub fn is_path_within(path: &Path, base: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(base))
}

/// `true` when `dst` is `src` or an ancestor of it.
///
/// A destination nested inside the source is fine: selection never recurses.
pub fn is_destination_containing_source(src: &Path, dst: &Path) -> bool {
    is_path_within(src, dst)
}

pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), String> {
    let path_dir_dst_root_abs = absolutize_path(path_dir_dst_root);
    let path_dst_item_abs = absolutize_path(path_dst_item);

    let path_parent_dst = path_dst_item_abs.parent().ok_or_else(|| {
        format!(
            "Failed to derive parent directory: {}",
            path_dst_item.display()
        )
    })?;
    if path_parent_dst != path_dir_dst_root_abs {
        return Err(format!(
            "Unsafe destination path escapes destination root: {} (root={})",
            path_dst_item.display(),
            path_dir_dst_root.display()
        ));
    }

    match fs::symlink_metadata(&path_dst_item_abs) {
        Ok(meta_dst_item) => {
            if meta_dst_item.file_type().is_symlink() {
                return Err(format!(
                    "Unsafe destination path is an existing symlink: {}",
                    path_dst_item.display()
                ));
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(format!(
                "Failed to inspect destination path {} ({e})",
                path_dst_item.display()
            ));
        }
    }

    Ok(())
}

/// Conflict verdict for one destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EnumConflictVerdict {
    /// Destination free or policy allows replacing it.
    Proceed,
    /// Leave destination alone; carries the reason.
    Skip(String),
    /// Record an error; carries the reason.
    Error(String),
}

pub(crate) fn check_file_conflict(
    path_dst: &Path,
    rule_conflict: EnumCopyFileConflictStrategy,
) -> EnumConflictVerdict {
    if !path_dst.exists() {
        return EnumConflictVerdict::Proceed;
    }
    if path_dst.is_dir() {
        return EnumConflictVerdict::Error(format!(
            "Destination is a directory: {}",
            path_dst.display()
        ));
    }

    match rule_conflict {
        EnumCopyFileConflictStrategy::Skip => {
            EnumConflictVerdict::Skip(format!("Destination exists: {}", path_dst.display()))
        }
        EnumCopyFileConflictStrategy::Error => {
            EnumConflictVerdict::Error(format!("Destination exists: {}", path_dst.display()))
        }
        EnumCopyFileConflictStrategy::Overwrite => EnumConflictVerdict::Proceed,
    }
}

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let target = fs::read_link(path_src)?;
    if path_dst.symlink_metadata().is_ok() {
        fs::remove_file(path_dst)?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(&target, path_dst)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = target;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst)?;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{EnumConflictVerdict, check_file_conflict, compile_selectors, is_path_within};
    use crate::spec::{CopySelectionError, EnumCopyFileConflictStrategy, SpecSelector};

    #[test]
    fn exact_selector_does_not_match_substrings() {
        let l_selectors = compile_selectors(&[SpecSelector::exact("README.md")]).expect("compile");
        assert!(l_selectors[0].is_match("README.md"));
        assert!(!l_selectors[0].is_match("README.md.bak"));
        assert!(!l_selectors[0].is_match("readme.md"));
    }

    #[test]
    fn glob_selector_matches_extension_set() {
        let l_selectors =
            compile_selectors(&[SpecSelector::glob("*.png"), SpecSelector::glob("img[0-9].jpg")])
                .expect("compile");
        assert!(l_selectors[0].is_match("img1.png"));
        assert!(!l_selectors[0].is_match("img1.png.txt"));
        assert!(l_selectors[1].is_match("img7.jpg"));
        assert!(!l_selectors[1].is_match("imgA.jpg"));
    }

    #[test]
    fn invalid_patterns_are_rejected_with_pattern_text() {
        let err = compile_selectors(&[SpecSelector::regex("(")]).expect_err("invalid regex");
        assert!(matches!(
            err,
            CopySelectionError::InvalidPattern { ref pattern, .. } if pattern == "("
        ));

        let err = compile_selectors(&[SpecSelector::glob("[")]).expect_err("invalid glob");
        assert!(matches!(err, CopySelectionError::InvalidPattern { .. }));

        let err = compile_selectors(&[SpecSelector::exact("")]).expect_err("empty");
        assert!(matches!(err, CopySelectionError::InvalidPattern { .. }));
    }

    #[test]
    fn path_within_handles_missing_tails_and_dot_dot() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("repo");
        std::fs::create_dir_all(root.join("images")).expect("mkdir");

        assert!(is_path_within(&root.join("images"), &root.join("images")));
        assert!(is_path_within(&root.join("images/out/nested"), &root.join("images")));
        assert!(is_path_within(&root.join("public/../images/x"), &root.join("images")));
        assert!(!is_path_within(&root.join("public"), &root.join("images")));
        assert!(!is_path_within(&root.join("images_extra"), &root.join("images")));
    }

    #[test]
    fn conflict_verdict_follows_strategy() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_free = tmp.path().join("free.txt");
        let path_taken = tmp.path().join("taken.txt");
        std::fs::write(&path_taken, "x").expect("write");

        assert_eq!(
            check_file_conflict(&path_free, EnumCopyFileConflictStrategy::Error),
            EnumConflictVerdict::Proceed
        );
        assert_eq!(
            check_file_conflict(&path_taken, EnumCopyFileConflictStrategy::Overwrite),
            EnumConflictVerdict::Proceed
        );
        assert!(matches!(
            check_file_conflict(&path_taken, EnumCopyFileConflictStrategy::Skip),
            EnumConflictVerdict::Skip(_)
        ));
        assert!(matches!(
            check_file_conflict(&path_taken, EnumCopyFileConflictStrategy::Error),
            EnumConflictVerdict::Error(_)
        ));
        assert!(matches!(
            check_file_conflict(tmp.path(), EnumCopyFileConflictStrategy::Overwrite),
            EnumConflictVerdict::Error(_)
        ));
    }
}
