//! Core types for patching study link-data files: the record codec, the
//! format version and the candidates whose capacity laws drive the update.

pub mod candidate;
pub mod error;
pub mod linkdata;
pub mod version;

pub use candidate::{
    check_investment, compute_capacities, CapacityLaw, Candidate, LinkRef, Profile, ProfileLaw,
};
pub use error::{XpnError, XpnResult};
pub use linkdata::{CapacityRecord, RecordTail, CAPACITY_DECIMALS, LINKDATA_SEPARATOR};
pub use version::{FormatVersion, MODERN_STUDY_VERSION};
