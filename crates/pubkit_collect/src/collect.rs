//! The selective collector: fresh publish directory, root pass, directory passes.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pubkit_io_fs::{
    EnumCopyFileConflictStrategy, ReportCopy, SpecCopyOptions, copy_selection,
    is_destination_containing_source, is_path_within,
};
use pubkit_manifest::{C_MANIFEST_FILE_NAME, EnumManifestOrigin, SpecPublishManifest};

use crate::report::{EnumDirPassOutcome, ReportCheck, ReportCollect, ReportDirPass};
use crate::spec::{CollectError, SpecCollectOptions};

/// Materialize the allow-listed subset of `dir_source_root` into the publish directory.
///
/// Missing allow-list entries and absent subdirectories are recorded in the
/// returned report, never raised. Setup failures (invalid manifest, unusable
/// publish directory, unreadable source directory) abort the run.
pub fn collect(
    dir_source_root: &Path,
    manifest: &SpecPublishManifest,
    origin: EnumManifestOrigin,
    spec_collect_options: &SpecCollectOptions,
) -> Result<ReportCollect, CollectError> {
    if !dir_source_root.is_dir() {
        return Err(CollectError::SourceNotDirectory(
            dir_source_root.to_path_buf(),
        ));
    }
    manifest.validate()?;

    let path_output = spec_collect_options
        .path_output
        .clone()
        .unwrap_or_else(|| derive_output_path(dir_source_root, manifest));
    validate_output_placement(dir_source_root, manifest, &path_output)?;

    if !spec_collect_options.if_dry_run {
        let if_default_output = path_output == derive_output_path(dir_source_root, manifest);
        prepare_output_dir(&path_output, spec_collect_options.if_clean, if_default_output)?;
    }

    let spec_cp_options = SpecCopyOptions {
        rule_conflict_file: EnumCopyFileConflictStrategy::Overwrite,
        rule_symlink: spec_collect_options.rule_symlink,
        num_workers_max: spec_collect_options.num_workers_max,
        if_preserve_metadata: spec_collect_options.if_preserve_metadata,
        if_dry_run: spec_collect_options.if_dry_run,
    };

    let l_root_selectors = manifest.root_selectors();
    let report_root = if l_root_selectors.is_empty() {
        ReportCopy::default()
    } else {
        copy_selection(
            dir_source_root,
            &path_output,
            &l_root_selectors,
            spec_cp_options.clone(),
        )?
    };
    tracing::info!("{}", report_root.format("[ROOT]"));

    let mut l_dir_passes = Vec::with_capacity(manifest.dirs.len());
    for rule in &manifest.dirs {
        let path_dir_src = dir_source_root.join(&rule.name);
        let outcome = if path_dir_src.is_dir() {
            let report_dir = copy_selection(
                &path_dir_src,
                path_output.join(&rule.name),
                &rule.selectors(manifest.pattern_mode),
                spec_cp_options.clone(),
            )?;
            tracing::info!("{}", report_dir.format(&format!("[DIR {}]", rule.name)));
            EnumDirPassOutcome::Present(report_dir)
        } else {
            tracing::info!(dir = %rule.name, "source directory absent; skipped");
            EnumDirPassOutcome::Absent
        };
        l_dir_passes.push(ReportDirPass {
            name: rule.name.clone(),
            outcome,
        });
    }

    Ok(ReportCollect {
        path_source: dir_source_root.to_path_buf(),
        path_output,
        origin,
        if_dry_run: spec_collect_options.if_dry_run,
        root: report_root,
        dirs: l_dir_passes,
    })
}

/// Dry-run the collector and list source entries the allow-list does not cover.
///
/// Dotfiles, the publish directory and the manifest file itself are never
/// reported as unlisted.
pub fn check(
    dir_source_root: &Path,
    manifest: &SpecPublishManifest,
    origin: EnumManifestOrigin,
) -> Result<ReportCheck, CollectError> {
    let spec_collect_options = SpecCollectOptions {
        if_dry_run: true,
        ..SpecCollectOptions::default()
    };
    let plan = collect(dir_source_root, manifest, origin, &spec_collect_options)?;

    let mut set_ignored: HashSet<String> = manifest.dirs.iter().map(|d| d.name.clone()).collect();
    set_ignored.insert(manifest.output_dir.clone());
    set_ignored.insert(C_MANIFEST_FILE_NAME.to_string());

    let mut warnings = Vec::new();
    let mut unlisted =
        derive_unlisted(dir_source_root, &plan.root, &set_ignored, None, &mut warnings)?;
    for pass in &plan.dirs {
        if let Some(report_dir) = pass.report() {
            unlisted.extend(derive_unlisted(
                &dir_source_root.join(&pass.name),
                report_dir,
                &HashSet::new(),
                Some(&pass.name),
                &mut warnings,
            )?);
        }
    }

    Ok(ReportCheck {
        plan,
        unlisted,
        warnings,
    })
}

/// Refuse publish paths whose cleaning or filling would touch source content.
///
/// The output must not be the source root or one of its ancestors, must not
/// sit in (or be) a rule directory, and must not replace an existing
/// non-directory source entry.
fn validate_output_placement(
    dir_source_root: &Path,
    manifest: &SpecPublishManifest,
    path_output: &Path,
) -> Result<(), CollectError> {
    if is_destination_containing_source(dir_source_root, path_output) {
        return Err(CollectError::OutputContainsSource {
            path_output: path_output.to_path_buf(),
        });
    }
    for rule in &manifest.dirs {
        let path_dir_src = dir_source_root.join(&rule.name);
        if is_path_within(path_output, &path_dir_src) {
            return Err(CollectError::OutputOverlapsSource {
                path_output: path_output.to_path_buf(),
                path_source: path_dir_src,
            });
        }
    }
    if let Ok(meta) = fs::symlink_metadata(path_output)
        && !meta.is_dir()
    {
        return Err(CollectError::OutputOverlapsSource {
            path_output: path_output.to_path_buf(),
            path_source: path_output.to_path_buf(),
        });
    }
    Ok(())
}

fn derive_unlisted(
    path_dir: &Path,
    report: &ReportCopy,
    set_ignored: &HashSet<String>,
    prefix: Option<&str>,
    l_warnings: &mut Vec<String>,
) -> Result<Vec<String>, CollectError> {
    let set_selected: HashSet<&std::ffi::OsStr> = report
        .entries
        .iter()
        .filter_map(|e| e.path_src.as_deref())
        .filter_map(Path::file_name)
        .collect();

    let iter_entries = fs::read_dir(path_dir).map_err(|source| CollectError::SourceRead {
        path: path_dir.to_path_buf(),
        source,
    })?;
    let mut l_unlisted = Vec::new();
    for entry_res in iter_entries {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                let message = format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir.display()
                );
                tracing::warn!("{message}");
                l_warnings.push(message);
                continue;
            }
        };
        let name_os = entry.file_name();
        let name = name_os.to_string_lossy().to_string();
        if name.starts_with('.')
            || set_ignored.contains(&name)
            || set_selected.contains(name_os.as_os_str())
        {
            continue;
        }
        let suffix = if entry.path().is_dir() { "/" } else { "" };
        l_unlisted.push(match prefix {
            Some(prefix) => format!("{prefix}/{name}{suffix}"),
            None => format!("{name}{suffix}"),
        });
    }
    l_unlisted.sort();
    Ok(l_unlisted)
}

fn prepare_output_dir(
    path_output: &Path,
    if_clean: bool,
    if_default_output: bool,
) -> Result<(), CollectError> {
    let err_init = |source: io::Error| CollectError::OutputInit {
        path: path_output.to_path_buf(),
        source,
    };

    if if_clean {
        match fs::symlink_metadata(path_output) {
            Ok(meta) if meta.is_dir() => {
                if if_default_output {
                    tracing::debug!(path = %path_output.display(), "removing previous publish directory");
                } else {
                    tracing::warn!(path = %path_output.display(), "removing existing directory at overridden output path");
                }
                fs::remove_dir_all(path_output).map_err(err_init)?;
            }
            Ok(_) => {
                return Err(err_init(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "publish path exists and is not a directory",
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(err_init(e)),
        }
    }
    fs::create_dir_all(path_output).map_err(err_init)
}

/// Publish directory a manifest resolves to under `dir_source_root`.
pub fn derive_output_path(dir_source_root: &Path, manifest: &SpecPublishManifest) -> PathBuf {
    dir_source_root.join(&manifest.output_dir)
}
