//! Patcher configuration.
//!
//! Stored as TOML; every key is optional and falls back to the defaults below.
//!
//! ```toml
//! extend_horizon = false
//! missing_investment = "fail"
//! parallel = true
//! threads = 0
//! report_path = "output/update_report.json"
//!
//! [timepoints]
//! mode = "range"
//! start = 0
//! end = 168
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xpn_core::{XpnError, XpnResult};

/// Largest horizon, in lines, a file may be extended to.
pub const MAX_EXTENDED_LINES: usize = 1 << 20;

/// Time points (0-based line indices) an investment is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Timepoints {
    /// Every line of the file.
    #[default]
    All,
    /// Lines `start..end`.
    Range { start: usize, end: usize },
    /// An explicit list of lines.
    Points { points: Vec<usize> },
}

impl Timepoints {
    /// Rejects selections that address nothing: empty or inverted ranges and
    /// empty point lists.
    pub fn validate(&self) -> XpnResult<()> {
        match self {
            Timepoints::All => Ok(()),
            Timepoints::Range { start, end } if start >= end => Err(XpnError::Config(format!(
                "time point range {start}..{end} is empty"
            ))),
            Timepoints::Points { points } if points.is_empty() => Err(XpnError::Config(
                "time point list is empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Highest addressed index for a file of `len` lines, without building
    /// the index list.
    pub fn last(&self, len: usize) -> Option<usize> {
        match self {
            Timepoints::All => len.checked_sub(1),
            Timepoints::Range { start, end } if start < end => Some(end - 1),
            Timepoints::Range { .. } => None,
            Timepoints::Points { points } => points.iter().copied().max(),
        }
    }

    /// Sorted, de-duplicated indices for a file of `len` lines.
    ///
    /// Indices may exceed `len`; check [`last`](Self::last) first, a `Range`
    /// is materialised in full.
    pub fn resolve(&self, len: usize) -> Vec<usize> {
        match self {
            Timepoints::All => (0..len).collect(),
            Timepoints::Range { start, end } => (*start..*end).collect(),
            Timepoints::Points { points } => {
                let mut points = points.clone();
                points.sort_unstable();
                points.dedup();
                points
            }
        }
    }
}

/// What to do with a candidate that has no entry in the investment mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingInvestment {
    /// Count the candidate as failed.
    #[default]
    Fail,
    /// Patch the candidate with a zero investment.
    Zero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Pad short files with blank records instead of failing, up to
    /// [`MAX_EXTENDED_LINES`].
    pub extend_horizon: bool,

    pub missing_investment: MissingInvestment,

    /// Patch candidates on a worker pool.
    pub parallel: bool,

    /// Number of worker threads (0 = auto-detect).
    pub threads: usize,

    /// Where to write the JSON batch report, if anywhere.
    pub report_path: Option<PathBuf>,

    /// Lines rewritten for each candidate. Must stay the last field: TOML
    /// tables come after plain keys.
    pub timepoints: Timepoints,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            extend_horizon: false,
            missing_investment: MissingInvestment::Fail,
            parallel: false,
            threads: 0,
            report_path: None,
            timepoints: Timepoints::All,
        }
    }
}

impl PatcherConfig {
    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading patcher config '{}'", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing patcher config '{}'", path.display()))?;
        config
            .timepoints
            .validate()
            .with_context(|| format!("checking patcher config '{}'", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("serializing patcher config")?;
        fs::write(path, contents)
            .with_context(|| format!("writing patcher config '{}'", path.display()))
    }

    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let config: PatcherConfig = toml::from_str("").unwrap();
        assert_eq!(config, PatcherConfig::default());
    }

    #[test]
    fn parses_partial_config() {
        let text = r#"
            parallel = true
            missing_investment = "zero"

            [timepoints]
            mode = "range"
            start = 2
            end = 5
        "#;
        let config: PatcherConfig = toml::from_str(text).unwrap();
        assert!(config.parallel);
        assert!(!config.extend_horizon);
        assert_eq!(config.missing_investment, MissingInvestment::Zero);
        assert_eq!(config.timepoints.resolve(100), vec![2, 3, 4]);
    }

    #[test]
    fn points_are_sorted_and_unique() {
        let timepoints = Timepoints::Points {
            points: vec![7, 1, 7, 3],
        };
        assert_eq!(timepoints.resolve(2), vec![1, 3, 7]);
        assert_eq!(Timepoints::All.resolve(3), vec![0, 1, 2]);
    }

    #[test]
    fn last_does_not_materialise_ranges() {
        let huge = Timepoints::Range {
            start: 0,
            end: usize::MAX,
        };
        assert_eq!(huge.last(1), Some(usize::MAX - 1));
        assert_eq!(Timepoints::All.last(0), None);
        assert_eq!(Timepoints::All.last(24), Some(23));
        let points = Timepoints::Points {
            points: vec![4, 9, 2],
        };
        assert_eq!(points.last(3), Some(9));
    }

    #[test]
    fn empty_selections_are_rejected() {
        assert!(Timepoints::All.validate().is_ok());
        assert!(Timepoints::Range { start: 0, end: 1 }.validate().is_ok());
        for timepoints in [
            Timepoints::Range { start: 5, end: 2 },
            Timepoints::Range { start: 3, end: 3 },
            Timepoints::Points { points: Vec::new() },
        ] {
            assert!(matches!(timepoints.validate(), Err(XpnError::Config(_))));
        }
    }

    #[test]
    fn load_rejects_inverted_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("patcher.toml");
        fs::write(&path, "[timepoints]\nmode = \"range\"\nstart = 5\nend = 2\n").unwrap();
        let err = PatcherConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("5..2"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("patcher.toml");
        let config = PatcherConfig {
            timepoints: Timepoints::Points { points: vec![0, 10] },
            threads: 4,
            report_path: Some(PathBuf::from("report.json")),
            ..PatcherConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(PatcherConfig::load_from(&path).unwrap(), config);
        assert_eq!(config.worker_threads(), 4);
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempdir().unwrap();
        let err = PatcherConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }
}
