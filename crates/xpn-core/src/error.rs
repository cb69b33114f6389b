//! Error taxonomy shared by the record codec and the study patcher
//!
//! [`XpnError`] covers record decoding, investment validation and the file
//! boundary. The patcher turns each of these into a per-candidate failure, so
//! nothing here is expected to cross a batch.
//!
//! # Example
//!
//! ```ignore
//! use xpn_core::{XpnError, XpnResult};
//!
//! fn first_direct_capacity(line: &str) -> XpnResult<f64> {
//!     let record = decode(line, FormatVersion::Modern)?;
//!     Ok(record.direct_capacity())
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for link-data patching.
#[derive(Error, Debug)]
pub enum XpnError {
    /// A link-data line has the wrong column count or a non-numeric column.
    #[error("Malformed record: {reason} (line {line:?})")]
    MalformedRecord { line: String, reason: String },

    /// Negative or non-finite investment handed to a capacity law.
    #[error("Invalid investment: {0}")]
    InvalidInvestment(f64),

    /// The link-data file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rewritten link-data file could not be committed.
    #[error("Cannot write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A requested time point lies past the last line of the file.
    #[error("Time point {timepoint} is out of range for {} ({len} lines)", path.display())]
    TimepointOutOfRange {
        path: PathBuf,
        timepoint: usize,
        len: usize,
    },

    /// The investment mapping has no entry for the candidate.
    #[error("No investment found for candidate {0}")]
    MissingInvestment(String),

    /// Study metadata is missing or has no usable version marker.
    #[error("Study metadata error: {0}")]
    StudyMetadata(String),

    /// The investment solution could not be decoded.
    #[error("Solution error: {0}")]
    Solution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors outside the link-data read/write boundary
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl XpnError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        XpnError::MalformedRecord {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Short, stable label used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            XpnError::MalformedRecord { .. } => "malformed-record",
            XpnError::InvalidInvestment(_) => "invalid-investment",
            XpnError::FileUnreadable { .. } => "file-unreadable",
            XpnError::WriteFailed { .. } => "write-failed",
            XpnError::TimepointOutOfRange { .. } => "timepoint-out-of-range",
            XpnError::MissingInvestment(_) => "missing-investment",
            XpnError::StudyMetadata(_) => "study-metadata",
            XpnError::Solution(_) => "solution",
            XpnError::Config(_) => "config",
            XpnError::Io(_) => "io",
            XpnError::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Results using XpnError.
pub type XpnResult<T> = Result<T, XpnError>;

impl From<anyhow::Error> for XpnError {
    fn from(err: anyhow::Error) -> Self {
        XpnError::Other(format!("{err:#}"))
    }
}

// Solution files are JSON
impl From<serde_json::Error> for XpnError {
    fn from(err: serde_json::Error) -> Self {
        XpnError::Solution(err.to_string())
    }
}
