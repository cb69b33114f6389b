//! Study metadata (`study.antares`).
//!
//! Only the `version` key matters here: it fixes the link-data layout for the
//! whole study.

use std::fs;
use std::path::Path;

use tracing::debug;
use xpn_core::{FormatVersion, XpnError, XpnResult};

/// Name of the metadata file at the root of a study.
pub const STUDY_METADATA_FILE: &str = "study.antares";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyMetadata {
    pub version: u32,
    pub caption: Option<String>,
}

impl StudyMetadata {
    /// Read `<study_root>/study.antares`.
    pub fn load(study_root: &Path) -> XpnResult<Self> {
        let path = study_root.join(STUDY_METADATA_FILE);
        let text = fs::read_to_string(&path).map_err(|err| {
            XpnError::StudyMetadata(format!("reading '{}': {err}", path.display()))
        })?;
        let metadata = Self::parse(&text).map_err(|err| match err {
            XpnError::StudyMetadata(msg) => {
                XpnError::StudyMetadata(format!("{msg} in '{}'", path.display()))
            }
            other => other,
        })?;
        debug!(
            "study '{}' has version {}",
            study_root.display(),
            metadata.version
        );
        Ok(metadata)
    }

    /// Parse INI-style `key = value` lines; sections and comments are skipped.
    pub fn parse(text: &str) -> XpnResult<Self> {
        let mut version = None;
        let mut caption = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(&['[', ';', '#'][..]) {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "version" => {
                    let value = value.trim();
                    let parsed = value.parse::<u32>().map_err(|_| {
                        XpnError::StudyMetadata(format!("version {value:?} is not an integer"))
                    })?;
                    version = Some(parsed);
                }
                "caption" => caption = Some(value.trim().to_string()),
                _ => {}
            }
        }
        let version =
            version.ok_or_else(|| XpnError::StudyMetadata("no version marker".to_string()))?;
        Ok(Self { version, caption })
    }

    pub fn format(&self) -> FormatVersion {
        FormatVersion::from_study_version(self.version)
    }
}
