use serde::{Deserialize, Serialize};
use std::fmt;

/// First study version whose link-data files carry the 8-column layout.
pub const MODERN_STUDY_VERSION: u32 = 700;

/// Link-data record layout selected by the study version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    /// 5 columns: direct, indirect, field3..field5.
    Legacy,
    /// 8 columns: direct, indirect, field3..field8.
    Modern,
}

impl FormatVersion {
    pub fn from_study_version(version: u32) -> Self {
        if version >= MODERN_STUDY_VERSION {
            FormatVersion::Modern
        } else {
            FormatVersion::Legacy
        }
    }

    pub fn is_modern(self) -> bool {
        matches!(self, FormatVersion::Modern)
    }

    /// Number of columns written for this layout.
    pub fn column_count(self) -> usize {
        match self {
            FormatVersion::Legacy => 5,
            FormatVersion::Modern => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatVersion::Legacy => "legacy",
            FormatVersion::Modern => "modern",
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
