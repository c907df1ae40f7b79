//! Collector run summary models.

use std::fmt;
use std::path::PathBuf;

use pubkit_io_fs::{EnumCopyOutcome, ReportCopy};
use pubkit_manifest::EnumManifestOrigin;
use serde::Serialize;

/// What happened to one directory rule.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "report", rename_all = "snake_case")]
pub enum EnumDirPassOutcome {
    /// Source subdirectory existed; destination created and copied into.
    Present(ReportCopy),
    /// Source subdirectory missing; nothing created.
    Absent,
}

/// One directory rule pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDirPass {
    /// Directory rule name.
    pub name: String,
    /// Pass result.
    pub outcome: EnumDirPassOutcome,
}

impl ReportDirPass {
    pub fn report(&self) -> Option<&ReportCopy> {
        match &self.outcome {
            EnumDirPassOutcome::Present(report) => Some(report),
            EnumDirPassOutcome::Absent => None,
        }
    }
}

/// Summary of one collector run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportCollect {
    /// Source root.
    pub path_source: PathBuf,
    /// Publish directory.
    pub path_output: PathBuf,
    /// Where the allow-list came from.
    pub origin: EnumManifestOrigin,
    /// Whether the run was a dry run.
    pub if_dry_run: bool,
    /// Root-level pass.
    pub root: ReportCopy,
    /// Directory passes, in manifest order.
    pub dirs: Vec<ReportDirPass>,
}

impl ReportCollect {
    fn iter_reports(&self) -> impl Iterator<Item = (Option<&str>, &ReportCopy)> {
        std::iter::once((None, &self.root))
            .chain(self.dirs.iter().filter_map(|d| d.report().map(|r| (Some(d.name.as_str()), r))))
    }

    pub fn cnt_copied(&self) -> u64 {
        self.iter_reports().map(|(_, r)| r.cnt_copied).sum()
    }

    pub fn cnt_missing(&self) -> u64 {
        self.iter_reports().map(|(_, r)| r.cnt_missing).sum()
    }

    pub fn cnt_skipped(&self) -> u64 {
        self.iter_reports().map(|(_, r)| r.cnt_skipped).sum()
    }

    pub fn error_count(&self) -> usize {
        self.iter_reports().map(|(_, r)| r.error_count()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.iter_reports().map(|(_, r)| r.warning_count()).sum()
    }

    /// Names of directory rules whose source subdirectory was absent.
    pub fn dirs_absent(&self) -> Vec<&str> {
        self.dirs
            .iter()
            .filter(|d| matches!(d.outcome, EnumDirPassOutcome::Absent))
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Root-relative allow-list entries with the given outcome (`dir/selector`).
    pub fn selectors_with(&self, outcome: EnumCopyOutcome) -> Vec<String> {
        self.iter_reports()
            .flat_map(|(dir, r)| {
                r.entries_with(outcome).map(move |e| match dir {
                    Some(dir) => format!("{dir}/{}", e.selector),
                    None => e.selector.clone(),
                })
            })
            .collect()
    }

    /// Allow-list entries that matched nothing.
    pub fn missing_entries(&self) -> Vec<String> {
        self.selectors_with(EnumCopyOutcome::Missing)
    }
}

impl fmt::Display for ReportCollect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.if_dry_run { "[DRY-RUN]" } else { "[COLLECT]" };
        write!(
            f,
            "{prefix} output={} copied={} missing={} skipped={} dirs_absent={} errors={} warnings={}",
            self.path_output.display(),
            self.cnt_copied(),
            self.cnt_missing(),
            self.cnt_skipped(),
            self.dirs_absent().len(),
            self.error_count(),
            self.warning_count()
        )
    }
}

/// Result of `check`: the dry-run plan plus what the allow-list does not cover.
#[derive(Debug, Clone, Serialize)]
pub struct ReportCheck {
    /// Dry-run plan.
    pub plan: ReportCollect,
    /// Root-relative paths present in the source but not selected (directories end in `/`).
    pub unlisted: Vec<String>,
    /// Entries that could not be read while listing unlisted paths.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pubkit_io_fs::{EnumCopyOutcome, ReportCopyBuilder};
    use pubkit_manifest::EnumManifestOrigin;

    use super::{EnumDirPassOutcome, ReportCollect, ReportDirPass};

    #[test]
    fn totals_and_missing_entries_span_all_passes() {
        let mut builder_root = ReportCopyBuilder::default();
        builder_root.add_entry(
            "README.md",
            PathBuf::from("README.md"),
            PathBuf::from("public/README.md"),
            EnumCopyOutcome::Copied,
            None,
        );
        builder_root.add_missing("snake_game.py");

        let mut builder_dir = ReportCopyBuilder::default();
        builder_dir.add_missing("*.gif");

        let report = ReportCollect {
            path_source: PathBuf::from("."),
            path_output: PathBuf::from("public"),
            origin: EnumManifestOrigin::BuiltIn,
            if_dry_run: false,
            root: builder_root.build(),
            dirs: vec![
                ReportDirPass {
                    name: "image_resolution_checker".to_string(),
                    outcome: EnumDirPassOutcome::Present(builder_dir.build()),
                },
                ReportDirPass {
                    name: "leetcode_analyzer".to_string(),
                    outcome: EnumDirPassOutcome::Absent,
                },
            ],
        };

        assert_eq!(report.cnt_copied(), 1);
        assert_eq!(report.cnt_missing(), 2);
        assert_eq!(report.dirs_absent(), ["leetcode_analyzer"]);
        assert_eq!(
            report.missing_entries(),
            ["snake_game.py", "image_resolution_checker/*.gif"]
        );
        assert_eq!(
            report.to_string(),
            "[COLLECT] output=public copied=1 missing=2 skipped=0 dirs_absent=1 errors=0 warnings=0"
        );
    }
}
