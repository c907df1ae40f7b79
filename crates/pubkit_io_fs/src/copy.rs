//! Allow-list selection and copy orchestration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{
    CopySelectionError, EnumCopyOutcome, EnumCopySymlinkStrategy, SpecCopyOptions, SpecSelector,
};
use crate::util::{
    EnumConflictVerdict, SpecCompiledSelector, calculate_worker_limit, check_file_conflict,
    compile_selectors, copy_file_with_metadata, create_symbolic_link,
    is_destination_containing_source, validate_destination_path_safety,
};

#[derive(Debug, Clone)]
struct SpecSourceEntry {
    path_src: PathBuf,
    name: String,
    if_is_dir: bool,
    if_is_symlink: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumCopyTaskKind {
    File,
    Symlink,
}

#[derive(Debug, Clone)]
struct SpecCopyTaskFile {
    idx_slot: usize,
    path_file_src: PathBuf,
    path_file_dst: PathBuf,
    kind: EnumCopyTaskKind,
}

/// One planned allow-list entry; outcome filled in before or after the copy stage.
#[derive(Debug, Clone)]
struct SpecPlanSlot {
    selector: String,
    path_src: Option<PathBuf>,
    path_dst: Option<PathBuf>,
    outcome: EnumCopyOutcome,
    message: Option<String>,
}

#[derive(Debug)]
struct SpecCopyContext {
    path_dir_dst: PathBuf,
    spec_cp_options: SpecCopyOptions,
    n_workers_max: usize,
    builder_cp_report: ReportCopyBuilder,
    l_slots: Vec<SpecPlanSlot>,
    l_tasks_file_copy: Vec<SpecCopyTaskFile>,
}

/// Check that every selector compiles, without touching the filesystem.
pub fn validate_selectors(selectors: &[SpecSelector]) -> Result<(), CopySelectionError> {
    compile_selectors(selectors).map(|_| ())
}

/// First selector whose pattern matches the basename `name`, if any.
pub fn find_matching_selector<'a>(
    selectors: &'a [SpecSelector],
    name: &str,
) -> Result<Option<&'a SpecSelector>, CopySelectionError> {
    let l_selectors = compile_selectors(selectors)?;
    Ok(l_selectors
        .iter()
        .position(|selector| selector.is_match(name))
        .map(|idx| &selectors[idx]))
}

/// Copy the allow-listed files of `dir_source` into `dir_destination`.
///
/// Only direct children of `dir_source` are considered; directories are never
/// matched. Selectors are applied in order against each file basename, and a
/// file claimed by an earlier selector is not copied again. A selector that
/// matches nothing is recorded as [`EnumCopyOutcome::Missing`] instead of
/// failing the run.
///
/// Returns [`ReportCopy`] when the run completes (with possible per-entry errors
/// stored in the report). Returns [`CopySelectionError`] only for top-level setup
/// and validation failures.
pub fn copy_selection<P, Q>(
    dir_source: P,
    dir_destination: Q,
    selectors: &[SpecSelector],
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopySelectionError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let l_selectors = compile_selectors(selectors)?;

    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(CopySelectionError::SourceNotDirectory(path_dir_src));
    }
    if is_destination_containing_source(&path_dir_src, &path_dir_dst) {
        return Err(CopySelectionError::DestinationContainsSource {
            source_dir: path_dir_src,
            destination: path_dir_dst,
        });
    }
    init_destination(&path_dir_dst, spec_cp_options.if_dry_run)?;

    let n_workers_max = calculate_worker_limit(spec_cp_options.num_workers_max);
    let mut spec_cp_ctx = SpecCopyContext {
        path_dir_dst,
        spec_cp_options,
        n_workers_max,
        builder_cp_report: ReportCopyBuilder::default(),
        l_slots: Vec::new(),
        l_tasks_file_copy: Vec::new(),
    };

    let l_entries = scan_directory(&path_dir_src, &mut spec_cp_ctx.builder_cp_report)?;
    plan_selection(&l_selectors, &l_entries, &mut spec_cp_ctx);
    flush_file_copy_tasks(&mut spec_cp_ctx);
    for slot in std::mem::take(&mut spec_cp_ctx.l_slots) {
        match (slot.path_src, slot.path_dst) {
            (Some(path_src), Some(path_dst)) => spec_cp_ctx.builder_cp_report.add_entry(
                &slot.selector,
                path_src,
                path_dst,
                slot.outcome,
                slot.message,
            ),
            _ => spec_cp_ctx.builder_cp_report.add_missing(&slot.selector),
        }
    }
    Ok(spec_cp_ctx.builder_cp_report.build())
}

fn init_destination(path_dir_dst: &Path, if_dry_run: bool) -> Result<(), CopySelectionError> {
    let err_init = |message: String| CopySelectionError::DestinationInitFailed {
        path: path_dir_dst.to_path_buf(),
        message,
    };

    if !if_dry_run {
        fs::create_dir_all(path_dir_dst).map_err(|e| err_init(e.to_string()))?;
    }
    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta_dir_dst) if meta_dir_dst.file_type().is_symlink() => Err(err_init(
            "Destination root path must not be a symbolic link.".to_string(),
        )),
        Ok(meta_dir_dst) if !meta_dir_dst.is_dir() => {
            Err(err_init("Destination root path is not a directory.".to_string()))
        }
        Ok(_) => Ok(()),
        Err(_) if if_dry_run => Ok(()),
        Err(e) => Err(err_init(e.to_string())),
    }
}

fn scan_directory(
    path_root: &Path,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<Vec<SpecSourceEntry>, CopySelectionError> {
    let iter_entries = fs::read_dir(path_root).map_err(|e| CopySelectionError::SourceReadFailed {
        path: path_root.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut l_entries = Vec::new();
    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                builder_cp_report.add_warning(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_root.display()
                ));
                continue;
            }
        };

        let path_entry = entry.path();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                builder_cp_report
                    .add_warning(format!("Failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };
        let b_is_symlink = cfg_file_type.is_symlink();
        l_entries.push(SpecSourceEntry {
            if_is_dir: cfg_file_type.is_dir() || (b_is_symlink && path_entry.is_dir()),
            if_is_symlink: b_is_symlink,
            name: entry.file_name().to_string_lossy().to_string(),
            path_src: path_entry,
        });
    }

    l_entries.sort_by(|a, b| a.name.cmp(&b.name));
    builder_cp_report.add_scanned(l_entries.len() as u64);
    Ok(l_entries)
}

fn plan_selection(
    l_selectors: &[SpecCompiledSelector],
    l_entries: &[SpecSourceEntry],
    spec_cp_ctx: &mut SpecCopyContext,
) {
    let mut set_claimed: HashSet<&str> = HashSet::new();

    for selector in l_selectors {
        let mut b_any_file = false;
        let mut b_any_dir = false;
        for entry in l_entries.iter().filter(|e| selector.is_match(&e.name)) {
            if entry.if_is_dir {
                b_any_dir = true;
                continue;
            }
            b_any_file = true;
            if !set_claimed.insert(entry.name.as_str()) {
                continue;
            }
            spec_cp_ctx.builder_cp_report.add_matched();
            plan_file_entry(&selector.pattern, entry, spec_cp_ctx);
        }

        if !b_any_file {
            if b_any_dir {
                spec_cp_ctx.builder_cp_report.add_warning(format!(
                    "Selector `{}` matches only directories, which are not copied",
                    selector.pattern
                ));
            }
            spec_cp_ctx.l_slots.push(SpecPlanSlot {
                selector: selector.pattern.clone(),
                path_src: None,
                path_dst: None,
                outcome: EnumCopyOutcome::Missing,
                message: None,
            });
        }
    }
}

/// Verdict for one matched file before the copy stage.
#[derive(Debug, Clone)]
enum EnumPlanVerdict {
    Resolved(EnumCopyOutcome, Option<String>),
    Task(EnumCopyTaskKind),
}

fn plan_file_entry(selector: &str, entry: &SpecSourceEntry, spec_cp_ctx: &mut SpecCopyContext) {
    let path_file_dst = spec_cp_ctx.path_dir_dst.join(&entry.name);
    let verdict = resolve_file_entry(entry, &path_file_dst, spec_cp_ctx);

    let idx_slot = spec_cp_ctx.l_slots.len();
    let (outcome, message) = match &verdict {
        EnumPlanVerdict::Resolved(outcome, message) => (*outcome, message.clone()),
        EnumPlanVerdict::Task(_) => (EnumCopyOutcome::Planned, None),
    };
    spec_cp_ctx.l_slots.push(SpecPlanSlot {
        selector: selector.to_string(),
        path_src: Some(entry.path_src.clone()),
        path_dst: Some(path_file_dst.clone()),
        outcome,
        message,
    });
    if let EnumPlanVerdict::Task(kind) = verdict {
        spec_cp_ctx.l_tasks_file_copy.push(SpecCopyTaskFile {
            idx_slot,
            path_file_src: entry.path_src.clone(),
            path_file_dst,
            kind,
        });
    }
}

fn resolve_file_entry(
    entry: &SpecSourceEntry,
    path_file_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> EnumPlanVerdict {
    let enum_rule_symlink = spec_cp_ctx.spec_cp_options.rule_symlink;
    if entry.if_is_symlink {
        if enum_rule_symlink == EnumCopySymlinkStrategy::SkipSymlinks {
            return EnumPlanVerdict::Resolved(
                EnumCopyOutcome::Skipped,
                Some("Symlink skipped".to_string()),
            );
        }
        if enum_rule_symlink == EnumCopySymlinkStrategy::Dereference {
            match fs::metadata(&entry.path_src) {
                Err(_) => {
                    return EnumPlanVerdict::Resolved(
                        EnumCopyOutcome::Failed,
                        Some(format!("Broken symlink: {}", entry.path_src.display())),
                    );
                }
                Ok(meta) if !meta.file_type().is_file() => {
                    spec_cp_ctx.builder_cp_report.add_warning(format!(
                        "Special file target skipped: {}",
                        entry.path_src.display()
                    ));
                    return EnumPlanVerdict::Resolved(
                        EnumCopyOutcome::Skipped,
                        Some("Special file target".to_string()),
                    );
                }
                Ok(_) => {}
            }
        }
    } else {
        match fs::symlink_metadata(&entry.path_src) {
            Err(e) => return EnumPlanVerdict::Resolved(EnumCopyOutcome::Failed, Some(e.to_string())),
            Ok(meta) if !meta.file_type().is_file() => {
                spec_cp_ctx.builder_cp_report.add_warning(format!(
                    "Special file skipped: {}",
                    entry.path_src.display()
                ));
                return EnumPlanVerdict::Resolved(
                    EnumCopyOutcome::Skipped,
                    Some("Special file".to_string()),
                );
            }
            Ok(_) => {}
        }
    }

    let if_dry_run = spec_cp_ctx.spec_cp_options.if_dry_run;
    if !if_dry_run
        && let Err(message) = validate_destination_path_safety(path_file_dst, &spec_cp_ctx.path_dir_dst)
    {
        return EnumPlanVerdict::Resolved(EnumCopyOutcome::Failed, Some(message));
    }

    match check_file_conflict(path_file_dst, spec_cp_ctx.spec_cp_options.rule_conflict_file) {
        EnumConflictVerdict::Proceed => {}
        EnumConflictVerdict::Skip(message) => {
            return EnumPlanVerdict::Resolved(EnumCopyOutcome::Skipped, Some(message));
        }
        EnumConflictVerdict::Error(message) => {
            return EnumPlanVerdict::Resolved(EnumCopyOutcome::Failed, Some(message));
        }
    }

    if if_dry_run {
        return EnumPlanVerdict::Resolved(EnumCopyOutcome::Planned, None);
    }
    if entry.if_is_symlink && enum_rule_symlink == EnumCopySymlinkStrategy::CopySymlinks {
        EnumPlanVerdict::Task(EnumCopyTaskKind::Symlink)
    } else {
        EnumPlanVerdict::Task(EnumCopyTaskKind::File)
    }
}

fn run_copy_task(spec_task: &SpecCopyTaskFile, if_preserve_metadata: bool) -> Result<(), String> {
    let res_copy = match spec_task.kind {
        EnumCopyTaskKind::File => copy_file_with_metadata(
            &spec_task.path_file_src,
            &spec_task.path_file_dst,
            if_preserve_metadata,
        ),
        EnumCopyTaskKind::Symlink => {
            create_symbolic_link(&spec_task.path_file_src, &spec_task.path_file_dst)
        }
    };
    res_copy.map_err(|e| e.to_string())
}

fn flush_file_copy_tasks(spec_cp_ctx: &mut SpecCopyContext) {
    let l_tasks_file_copy = std::mem::take(&mut spec_cp_ctx.l_tasks_file_copy);
    if l_tasks_file_copy.is_empty() {
        return;
    }
    let if_preserve_metadata = spec_cp_ctx.spec_cp_options.if_preserve_metadata;

    let run_serial = |l_tasks: &[SpecCopyTaskFile]| {
        l_tasks
            .iter()
            .map(|spec_task| (spec_task.idx_slot, run_copy_task(spec_task, if_preserve_metadata)))
            .collect::<Vec<_>>()
    };

    let l_results = if spec_cp_ctx.n_workers_max <= 1 || l_tasks_file_copy.len() == 1 {
        run_serial(&l_tasks_file_copy)
    } else {
        match ThreadPoolBuilder::new()
            .num_threads(spec_cp_ctx.n_workers_max)
            .build()
        {
            Ok(thread_pool) => thread_pool.install(|| {
                l_tasks_file_copy
                    .par_iter()
                    .map(|spec_task| {
                        (spec_task.idx_slot, run_copy_task(spec_task, if_preserve_metadata))
                    })
                    .collect::<Vec<_>>()
            }),
            Err(_) => {
                spec_cp_ctx.builder_cp_report.add_warning(format!(
                    "Failed to initialize thread pool (workers={}); fallback to serial copy.",
                    spec_cp_ctx.n_workers_max
                ));
                run_serial(&l_tasks_file_copy)
            }
        }
    };

    for (idx_slot, res_copy) in l_results {
        let slot = &mut spec_cp_ctx.l_slots[idx_slot];
        match res_copy {
            Ok(()) => slot.outcome = EnumCopyOutcome::Copied,
            Err(msg) => {
                slot.outcome = EnumCopyOutcome::Failed;
                slot.message = Some(msg);
            }
        }
    }
}
