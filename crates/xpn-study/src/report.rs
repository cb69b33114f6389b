use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;
use xpn_core::FormatVersion;

use crate::patcher::BatchSummary;

/// Per-candidate line of a batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate: String,
    pub status: String,
    pub error_kind: Option<String>,
    pub error: Option<String>,
    pub lines_updated: usize,
    pub lines_appended: usize,
    pub linkdata: Option<String>,
}

/// JSON summary of one `patch_all` run.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchReport {
    pub created_at: DateTime<Utc>,
    pub study: String,
    pub format: FormatVersion,
    pub num_candidates: usize,
    pub success: usize,
    pub failure: usize,
    pub candidates: Vec<CandidateRecord>,
}

impl BatchReport {
    pub fn from_summary(study: &Path, format: FormatVersion, summary: &BatchSummary) -> Self {
        let mut candidates: Vec<CandidateRecord> = summary
            .updated
            .iter()
            .map(|patch| CandidateRecord {
                candidate: patch.candidate.clone(),
                status: "ok".to_string(),
                error_kind: None,
                error: None,
                lines_updated: patch.lines_updated,
                lines_appended: patch.lines_appended,
                linkdata: Some(patch.path.display().to_string()),
            })
            .collect();
        candidates.extend(summary.failures.iter().map(|failure| CandidateRecord {
            candidate: failure.candidate.clone(),
            status: "error".to_string(),
            error_kind: Some(failure.error.kind().to_string()),
            error: Some(failure.error.to_string()),
            lines_updated: 0,
            lines_appended: 0,
            linkdata: None,
        }));
        candidates.sort_by(|a, b| a.candidate.cmp(&b.candidate));

        Self {
            created_at: Utc::now(),
            study: study.display().to_string(),
            format,
            num_candidates: candidates.len(),
            success: summary.success_count(),
            failure: summary.failure_count(),
            candidates,
        }
    }
}

pub fn write_batch_report(path: &Path, report: &BatchReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serializing batch report to JSON")?;
    fs::write(path, json).with_context(|| format!("writing batch report '{}'", path.display()))?;
    info!("batch report written to {}", path.display());
    Ok(())
}

pub fn load_batch_report(path: &Path) -> Result<BatchReport> {
    let file =
        File::open(path).with_context(|| format!("opening batch report '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing batch report '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::{CandidateFailure, PatchReport};
    use std::path::PathBuf;
    use tempfile::tempdir;
    use xpn_core::XpnError;

    fn summary() -> BatchSummary {
        BatchSummary {
            updated: vec![PatchReport {
                candidate: "semibase".into(),
                path: PathBuf::from("input/links/area1/semibase.txt"),
                lines_updated: 8760,
                lines_appended: 0,
            }],
            failures: vec![CandidateFailure {
                candidate: "peak".into(),
                error: XpnError::InvalidInvestment(-3.0),
            }],
        }
    }

    #[test]
    fn report_lists_every_candidate() {
        let report = BatchReport::from_summary(Path::new("study"), FormatVersion::Modern, &summary());
        assert_eq!(report.num_candidates, 2);
        assert_eq!(report.success, 1);
        assert_eq!(report.failure, 1);
        assert_eq!(report.candidates[0].candidate, "peak");
        assert_eq!(
            report.candidates[0].error_kind.as_deref(),
            Some("invalid-investment")
        );
        assert_eq!(report.candidates[1].lines_updated, 8760);
    }

    #[test]
    fn report_writes_and_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = BatchReport::from_summary(Path::new("study"), FormatVersion::Legacy, &summary());
        write_batch_report(&path, &report).unwrap();

        let parsed = load_batch_report(&path).unwrap();
        assert_eq!(parsed.format, FormatVersion::Legacy);
        assert_eq!(parsed.candidates, report.candidates);
    }
}
