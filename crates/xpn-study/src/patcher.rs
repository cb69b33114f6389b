//! Rewrites link-data files after an investment run.
//!
//! For each candidate the patcher reads the whole link-data file, recomputes
//! the two capacity columns of the addressed lines and commits the new file
//! with a temp file + rename, so a failed patch leaves the original in place.
//! Batches are best effort: a failing candidate is recorded and the next one
//! is attempted.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use xpn_core::{
    check_investment, compute_capacities, Candidate, CapacityRecord, FormatVersion, XpnError,
    XpnResult,
};

use crate::config::{MissingInvestment, PatcherConfig, MAX_EXTENDED_LINES};
use crate::layout::StudyLayout;
use crate::metadata::StudyMetadata;
use crate::report::{write_batch_report, BatchReport};
use crate::solution::{InvestmentSolution, Investments};

/// A successfully patched link-data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub candidate: String,
    pub path: PathBuf,
    pub lines_updated: usize,
    /// Blank records added to reach the addressed horizon.
    pub lines_appended: usize,
}

/// A candidate that could not be patched, with the reason.
#[derive(Debug)]
pub struct CandidateFailure {
    pub candidate: String,
    pub error: XpnError,
}

pub type PatchOutcome = XpnResult<PatchReport>;

/// Result of a batch: successes and failures, in candidate order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub updated: Vec<PatchReport>,
    pub failures: Vec<CandidateFailure>,
}

impl BatchSummary {
    /// Number of candidates that could not be updated (0 on full success).
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn success_count(&self) -> usize {
        self.updated.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn push(&mut self, candidate: &Candidate, outcome: PatchOutcome) {
        match outcome {
            Ok(report) => self.updated.push(report),
            Err(error) => {
                warn!("candidate {} not updated: {error}", candidate.name());
                self.failures.push(CandidateFailure {
                    candidate: candidate.name().to_string(),
                    error,
                });
            }
        }
    }
}

/// Updates the link-data files of one study.
///
/// The record layout is fixed when the patcher is built and never changes.
#[derive(Debug, Clone)]
pub struct StudyPatcher {
    layout: StudyLayout,
    format: FormatVersion,
    config: PatcherConfig,
}

impl StudyPatcher {
    /// Patcher for the study at `study_root`, layout taken from `study.antares`.
    pub fn open(study_root: impl AsRef<Path>, config: PatcherConfig) -> XpnResult<Self> {
        let metadata = StudyMetadata::load(study_root.as_ref())?;
        let format = metadata.format();
        info!(
            "study {} (version {}) uses the {format} link-data layout",
            study_root.as_ref().display(),
            metadata.version
        );
        Ok(Self::new(study_root, format, config))
    }

    pub fn new(study_root: impl AsRef<Path>, format: FormatVersion, config: PatcherConfig) -> Self {
        Self {
            layout: StudyLayout::new(study_root),
            format,
            config,
        }
    }

    pub fn format(&self) -> FormatVersion {
        self.format
    }

    pub fn layout(&self) -> &StudyLayout {
        &self.layout
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.config
    }

    pub fn linkdata_path(&self, candidate: &Candidate) -> PathBuf {
        self.layout.candidate_linkdata_path(candidate)
    }

    /// Rewrite the link-data file of `candidate` for `investment`.
    ///
    /// **Algorithm:**
    /// 1. Read the file into lines, keeping each line terminator.
    /// 2. Resolve the addressed time points against the lines before any
    ///    trailing blank lines; pad with blank records when the horizon may be
    ///    extended, fail otherwise.
    /// 3. Decode each addressed line, recompute its capacities, re-encode it.
    /// 4. Write everything to a sibling temp file and rename it over the original.
    pub fn patch_one(&self, candidate: &Candidate, investment: f64) -> PatchOutcome {
        let investment = check_investment(investment)?;
        let path = self.linkdata_path(candidate);
        debug!(
            "patching {} ({}) with investment {investment}",
            candidate.name(),
            path.display()
        );

        let text = fs::read_to_string(&path).map_err(|source| XpnError::FileUnreadable {
            path: path.clone(),
            source,
        })?;
        let mut lines = split_lines(&text);
        let len = addressable_len(&lines);

        let selection = &self.config.timepoints;
        selection.validate()?;
        let mut lines_appended = 0;
        if let Some(last) = selection.last(len) {
            if last >= len {
                if !self.config.extend_horizon || last >= MAX_EXTENDED_LINES {
                    return Err(XpnError::TimepointOutOfRange {
                        path,
                        timepoint: last,
                        len,
                    });
                }
                lines.truncate(len);
                lines_appended = extend_lines(&mut lines, last + 1, self.format);
            }
        }
        let timepoints = selection.resolve(len);

        for &timepoint in &timepoints {
            let line = &mut lines[timepoint];
            let record = CapacityRecord::decode(&line.body, self.format)?;
            let (direct, indirect) = compute_capacities(investment, candidate, timepoint)?;
            line.body = record.update_capacities(direct, indirect).encode();
        }

        write_atomically(&path, &join_lines(&lines))?;

        Ok(PatchReport {
            candidate: candidate.name().to_string(),
            path,
            lines_updated: timepoints.len(),
            lines_appended,
        })
    }

    /// Patch every candidate with its investment from `investments`.
    ///
    /// Never stops early; see [`BatchSummary::failure_count`].
    pub fn patch_all(&self, candidates: &[Candidate], investments: &Investments) -> BatchSummary {
        let run = |candidate: &Candidate| -> PatchOutcome {
            let investment = self.investment_for(candidate, investments)?;
            self.patch_one(candidate, investment)
        };

        let outcomes = if self.config.parallel {
            self.run_parallel(candidates, &run)
        } else {
            candidates.iter().map(run).collect()
        };

        let mut summary = BatchSummary::default();
        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            summary.push(candidate, outcome);
        }
        info!(
            "updated {} of {} candidate(s), {} failure(s)",
            summary.success_count(),
            candidates.len(),
            summary.failure_count()
        );

        if let Err(err) = self.write_report(&summary) {
            warn!("batch report not written: {err:#}");
        }
        summary
    }

    /// Same as [`patch_all`](Self::patch_all) with investments read from a
    /// solution JSON file. An unreadable solution fails every candidate.
    pub fn patch_all_from_json(&self, candidates: &[Candidate], json_path: &Path) -> BatchSummary {
        match InvestmentSolution::load(json_path) {
            Ok(solution) => self.patch_all(candidates, &solution.investments),
            Err(err) => {
                error!("cannot use investment solution: {err}");
                let mut summary = BatchSummary::default();
                for candidate in candidates {
                    summary.push(candidate, Err(XpnError::Solution(err.to_string())));
                }
                if let Err(err) = self.write_report(&summary) {
                    warn!("batch report not written: {err:#}");
                }
                summary
            }
        }
    }

    /// Write the JSON report when `report_path` is configured. Relative paths
    /// are taken from the study root.
    pub fn write_report(&self, summary: &BatchSummary) -> anyhow::Result<Option<PathBuf>> {
        let Some(report_path) = &self.config.report_path else {
            return Ok(None);
        };
        let path = self.layout.root().join(report_path);
        let report = BatchReport::from_summary(self.layout.root(), self.format, summary);
        write_batch_report(&path, &report)?;
        Ok(Some(path))
    }

    fn investment_for(&self, candidate: &Candidate, investments: &Investments) -> XpnResult<f64> {
        match investments.get(candidate.name()) {
            Some(&investment) => Ok(investment),
            None => match self.config.missing_investment {
                MissingInvestment::Fail => {
                    Err(XpnError::MissingInvestment(candidate.name().to_string()))
                }
                MissingInvestment::Zero => Ok(0.0),
            },
        }
    }

    /// Candidates sharing a link-data file run one after the other inside the
    /// same task; distinct files run concurrently.
    fn run_parallel<F>(&self, candidates: &[Candidate], run: &F) -> Vec<PatchOutcome>
    where
        F: Fn(&Candidate) -> PatchOutcome + Sync,
    {
        let mut groups: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            groups
                .entry(self.linkdata_path(candidate))
                .or_default()
                .push(index);
        }
        let groups: Vec<Vec<usize>> = groups.into_values().collect();

        let run_groups = || -> Vec<(usize, PatchOutcome)> {
            groups
                .par_iter()
                .flat_map_iter(|group| {
                    group
                        .iter()
                        .map(|&index| (index, run(&candidates[index])))
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        let mut indexed = match ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads())
            .build()
        {
            Ok(pool) => pool.install(run_groups),
            Err(err) => {
                warn!("building worker pool failed ({err}); patching sequentially");
                candidates
                    .iter()
                    .enumerate()
                    .map(|(index, candidate)| (index, run(candidate)))
                    .collect()
            }
        };
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// One line of a link-data file and the terminator that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawLine {
    body: String,
    terminator: &'static str,
}

fn split_lines(text: &str) -> Vec<RawLine> {
    text.split_inclusive('\n')
        .map(|chunk| {
            if let Some(body) = chunk.strip_suffix("\r\n") {
                RawLine {
                    body: body.to_string(),
                    terminator: "\r\n",
                }
            } else if let Some(body) = chunk.strip_suffix('\n') {
                RawLine {
                    body: body.to_string(),
                    terminator: "\n",
                }
            } else {
                RawLine {
                    body: chunk.to_string(),
                    terminator: "",
                }
            }
        })
        .collect()
}

fn join_lines(lines: &[RawLine]) -> String {
    let mut text = String::with_capacity(lines.iter().map(|l| l.body.len() + 2).sum());
    for line in lines {
        text.push_str(&line.body);
        text.push_str(line.terminator);
    }
    text
}

/// Pad `lines` with blank records up to `len`; returns the number added.
/// Number of lines left once trailing blank lines are ignored.
fn addressable_len(lines: &[RawLine]) -> usize {
    lines
        .iter()
        .rposition(|line| !line.body.trim().is_empty())
        .map_or(0, |last| last + 1)
}

fn extend_lines(lines: &mut Vec<RawLine>, len: usize, format: FormatVersion) -> usize {
    let terminator = lines
        .iter()
        .map(|line| line.terminator)
        .find(|t| !t.is_empty())
        .unwrap_or("\n");
    if let Some(last) = lines.last_mut() {
        if last.terminator.is_empty() {
            last.terminator = terminator;
        }
    }
    let blank = CapacityRecord::empty(format).encode();
    let missing = len.saturating_sub(lines.len());
    lines.extend((0..missing).map(|_| RawLine {
        body: blank.clone(),
        terminator,
    }));
    missing
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` next to `path`, then rename over it.
fn write_atomically(path: &Path, contents: &str) -> XpnResult<()> {
    let temp = temp_path(path);
    let commit = fs::write(&temp, contents).and_then(|()| fs::rename(&temp, path));
    if let Err(source) = commit {
        if temp.exists() {
            if let Err(err) = fs::remove_file(&temp) {
                warn!("leaving stale temp file {}: {err}", temp.display());
            }
        }
        return Err(XpnError::WriteFailed {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
