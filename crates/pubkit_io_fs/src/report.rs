//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::spec::{EnumCopyOutcome, SpecCopyError};

/// Result of one allow-list entry (one matched file, or one unmatched selector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecCopyEntry {
    /// Selector pattern that produced this entry.
    pub selector: String,
    /// Matched source file; `None` when the selector matched nothing.
    pub path_src: Option<PathBuf>,
    /// Destination path; `None` when the selector matched nothing.
    pub path_dst: Option<PathBuf>,
    /// What happened to the entry.
    pub outcome: EnumCopyOutcome,
    /// Reason text for `Skipped` and `Failed` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate counters and per-entry results for one `copy_selection` run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReportCopy {
    /// Number of source entries that matched a selector.
    pub cnt_matched: u64,
    /// Total scanned source directory entries.
    pub cnt_scanned: u64,
    /// Number of files successfully committed.
    pub cnt_copied: u64,
    /// Number of selectors that matched nothing.
    pub cnt_missing: u64,
    /// Number of matched entries skipped by strategy or dry-run.
    pub cnt_skipped: u64,
    /// Per-entry results, in allow-list order.
    pub entries: Vec<SpecCopyEntry>,
    /// Non-fatal warnings collected during scan/copy.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecCopyError>,
}

impl ReportCopy {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Entries with the given outcome.
    pub fn entries_with(&self, outcome: EnumCopyOutcome) -> impl Iterator<Item = &SpecCopyEntry> {
        self.entries.iter().filter(move |e| e.outcome == outcome)
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_missing".to_string(), self.cnt_missing);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} matched={} scanned={} copied={} missing={} skipped={} errors={} warnings={}",
            dict_counts["cnt_matched"],
            dict_counts["cnt_scanned"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_missing"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    /// See [`ReportCopy::cnt_matched`].
    pub cnt_matched: u64,
    /// See [`ReportCopy::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportCopy::cnt_copied`].
    pub cnt_copied: u64,
    /// See [`ReportCopy::cnt_missing`].
    pub cnt_missing: u64,
    /// See [`ReportCopy::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportCopy::entries`].
    pub entries: Vec<SpecCopyEntry>,
    /// See [`ReportCopy::errors`].
    pub errors: Vec<SpecCopyError>,
    /// See [`ReportCopy::warnings`].
    pub warnings: Vec<String>,
}

impl ReportCopyBuilder {
    /// Increment scanned count by `value`.
    pub fn add_scanned(&mut self, value: u64) {
        self.cnt_scanned += value;
    }

    /// Increment matched count by one.
    pub fn add_matched(&mut self) {
        self.cnt_matched += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.errors.push(SpecCopyError { path, exception });
    }

    /// Record a selector that matched nothing.
    pub fn add_missing(&mut self, selector: &str) {
        tracing::debug!(selector, "allow-list entry not found; skipped");
        self.cnt_missing += 1;
        self.entries.push(SpecCopyEntry {
            selector: selector.to_string(),
            path_src: None,
            path_dst: None,
            outcome: EnumCopyOutcome::Missing,
            message: None,
        });
    }

    /// Record a matched entry and bump the counter that belongs to `outcome`.
    ///
    /// `Failed` outcomes also land in [`ReportCopy::errors`] under the
    /// destination path.
    pub fn add_entry(
        &mut self,
        selector: &str,
        path_src: PathBuf,
        path_dst: PathBuf,
        outcome: EnumCopyOutcome,
        message: Option<String>,
    ) {
        match outcome {
            EnumCopyOutcome::Copied => self.cnt_copied += 1,
            EnumCopyOutcome::Skipped | EnumCopyOutcome::Planned => self.cnt_skipped += 1,
            EnumCopyOutcome::Missing => self.cnt_missing += 1,
            EnumCopyOutcome::Failed => self.add_error(
                path_dst.clone(),
                message.clone().unwrap_or_else(|| "copy failed".to_string()),
            ),
        }
        tracing::debug!(
            selector,
            src = %path_src.display(),
            dst = %path_dst.display(),
            outcome = outcome.as_str(),
            "allow-list entry processed"
        );
        self.entries.push(SpecCopyEntry {
            selector: selector.to_string(),
            path_src: Some(path_src),
            path_dst: Some(path_dst),
            outcome,
            message,
        });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_matched: self.cnt_matched,
            cnt_scanned: self.cnt_scanned,
            cnt_copied: self.cnt_copied,
            cnt_missing: self.cnt_missing,
            cnt_skipped: self.cnt_skipped,
            entries: self.entries,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportCopy, ReportCopyBuilder};
    use crate::spec::EnumCopyOutcome;

    #[test]
    fn report_copy_to_dict_and_format_line() {
        let report = ReportCopy {
            cnt_matched: 5,
            cnt_scanned: 8,
            cnt_copied: 3,
            cnt_missing: 1,
            cnt_skipped: 2,
            warnings: vec!["w".to_string()],
            ..ReportCopy::default()
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_matched"], 5);
        assert_eq!(dict_counts["cnt_scanned"], 8);
        assert_eq!(dict_counts["cnt_copied"], 3);
        assert_eq!(dict_counts["cnt_missing"], 1);
        assert_eq!(dict_counts["cnt_skipped"], 2);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[COPY]");
        assert_eq!(
            txt,
            "[COPY] matched=5 scanned=8 copied=3 missing=1 skipped=2 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_routes_outcomes_to_counters() {
        let mut builder = ReportCopyBuilder::default();
        builder.add_missing("gone.py");
        builder.add_entry(
            "a.py",
            PathBuf::from("src/a.py"),
            PathBuf::from("dst/a.py"),
            EnumCopyOutcome::Copied,
            None,
        );
        builder.add_entry(
            "b.py",
            PathBuf::from("src/b.py"),
            PathBuf::from("dst/b.py"),
            EnumCopyOutcome::Failed,
            Some("permission denied".to_string()),
        );

        let report = builder.build();
        assert_eq!(report.cnt_missing, 1);
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, PathBuf::from("dst/b.py"));
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries_with(EnumCopyOutcome::Missing).count(), 1);
    }
}
