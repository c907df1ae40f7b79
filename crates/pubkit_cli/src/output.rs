//! Text and JSON rendering of collector results.
//!
//! `format_*` functions return `Vec<String>` and do no I/O; `emit` writes to
//! stdout.
//!
//! ```text
//! manifest: built-in
//!   copied   password_generator.py
//!   missing  snake_game.py
//!   absent   leetcode_analyzer/
//! [COLLECT] output=public copied=4 missing=6 skipped=0 dirs_absent=1 errors=0 warnings=0
//! ```

use pubkit_collect::{EnumDirPassOutcome, ReportCheck, ReportCollect};
use pubkit_io_fs::{EnumCopyOutcome, ReportCopy};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn emit<T: Serialize>(
    value: &T,
    lines: impl FnOnce() -> Vec<String>,
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => {
            for line in lines() {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn entry_lines(
    report: &ReportCopy,
    prefix: Option<&str>,
    if_show_copied: bool,
    out: &mut Vec<String>,
) {
    for entry in &report.entries {
        if entry.outcome == EnumCopyOutcome::Copied && !if_show_copied {
            continue;
        }
        let name = match (&entry.path_src, entry.outcome) {
            (_, EnumCopyOutcome::Missing) | (None, _) => entry.selector.clone(),
            (Some(path_src), _) => path_src
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| entry.selector.clone()),
        };
        let path_rel = match prefix {
            Some(prefix) => format!("{prefix}/{name}"),
            None => name,
        };
        let mut line = format!("  {:<8} {path_rel}", entry.outcome.as_str());
        if let Some(message) = &entry.message {
            line.push_str(&format!(" ({message})"));
        }
        out.push(line);
    }
}

/// Per-entry lines plus the summary. Copied entries only when `if_verbose`.
pub fn format_collect(report: &ReportCollect, if_verbose: bool) -> Vec<String> {
    let mut out = vec![format!("manifest: {}", report.origin)];
    entry_lines(&report.root, None, if_verbose, &mut out);
    for pass in &report.dirs {
        match &pass.outcome {
            EnumDirPassOutcome::Present(report_dir) => {
                entry_lines(report_dir, Some(&pass.name), if_verbose, &mut out)
            }
            EnumDirPassOutcome::Absent => out.push(format!("  {:<8} {}/", "absent", pass.name)),
        }
    }
    out.push(report.to_string());
    out
}

/// Every allow-list entry with its state, then unlisted source entries.
pub fn format_check(report: &ReportCheck) -> Vec<String> {
    let mut out = format_collect(&report.plan, true);
    let summary = out.pop();
    if !report.unlisted.is_empty() {
        out.push("unlisted:".to_string());
        out.extend(report.unlisted.iter().map(|p| format!("  {p}")));
    }
    out.extend(report.warnings.iter().map(|w| format!("warning: {w}")));
    out.extend(summary);
    out
}
