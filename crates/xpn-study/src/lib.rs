//! Study-side patching of link-data files.
//!
//! [`StudyPatcher`] reads the study's format version once, then rewrites the
//! link-data file of each candidate from an investment mapping or solution
//! file. Failures are collected per candidate in a [`BatchSummary`].

pub mod config;
pub mod layout;
pub mod metadata;
pub mod patcher;
pub mod report;
pub mod solution;

pub use config::{MissingInvestment, PatcherConfig, Timepoints};
pub use layout::{StudyLayout, LINKS_SUBFOLDER};
pub use metadata::{StudyMetadata, STUDY_METADATA_FILE};
pub use patcher::{BatchSummary, CandidateFailure, PatchOutcome, PatchReport, StudyPatcher};
pub use report::{load_batch_report, write_batch_report, BatchReport, CandidateRecord};
pub use solution::{InvestmentSolution, Investments};
