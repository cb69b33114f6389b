//! Expansion candidates and the laws that turn an investment into capacities.
//!
//! Candidates come from an external catalog; this module only describes what
//! the patcher needs from them: the link they extend and a [`CapacityLaw`].
//! [`ProfileLaw`] is the usual law, an already-installed capacity plus the
//! investment, each scaled by a per-direction availability profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{XpnError, XpnResult};

/// The study link a candidate extends, `origin - extremity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkRef {
    pub origin: String,
    pub extremity: String,
}

impl LinkRef {
    pub fn new(origin: impl Into<String>, extremity: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            extremity: extremity.into(),
        }
    }
}

impl FromStr for LinkRef {
    type Err = XpnError;

    /// Parses the catalog notation `"area1 - area2"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (origin, extremity) = s
            .split_once(" - ")
            .ok_or_else(|| XpnError::Config(format!("link {s:?} is not 'origin - extremity'")))?;
        let (origin, extremity) = (origin.trim(), extremity.trim());
        if origin.is_empty() || extremity.is_empty() {
            return Err(XpnError::Config(format!("link {s:?} has an empty area")));
        }
        Ok(Self::new(origin, extremity))
    }
}

impl fmt::Display for LinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.origin, self.extremity)
    }
}

/// Maps an investment at a time point to `(direct, indirect)` capacities.
///
/// Laws are only evaluated for finite, non-negative investments.
pub trait CapacityLaw: Send + Sync {
    fn capacities(&self, investment: f64, timepoint: usize) -> (f64, f64);
}

impl<F> CapacityLaw for F
where
    F: Fn(f64, usize) -> (f64, f64) + Send + Sync,
{
    fn capacities(&self, investment: f64, timepoint: usize) -> (f64, f64) {
        self(investment, timepoint)
    }
}

/// Availability factor of a link direction over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Profile {
    Constant(f64),
    /// Hourly values; time points past the end wrap around.
    Series(Vec<f64>),
}

impl Profile {
    pub fn value_at(&self, timepoint: usize) -> f64 {
        match self {
            Profile::Constant(value) => *value,
            Profile::Series(values) if values.is_empty() => 0.0,
            Profile::Series(values) => values[timepoint % values.len()],
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Constant(1.0)
    }
}

/// `installed * installed_profile(t) + investment * profile(t)`, per direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLaw {
    pub already_installed_capacity: f64,
    pub direct_profile: Profile,
    pub indirect_profile: Profile,
    pub already_installed_direct_profile: Profile,
    pub already_installed_indirect_profile: Profile,
}

impl ProfileLaw {
    /// Law with the same profile in both directions and nothing installed.
    pub fn symmetric(profile: Profile) -> Self {
        Self {
            direct_profile: profile.clone(),
            indirect_profile: profile,
            ..Self::default()
        }
    }
}

impl CapacityLaw for ProfileLaw {
    fn capacities(&self, investment: f64, timepoint: usize) -> (f64, f64) {
        let installed = self.already_installed_capacity;
        let direct = installed * self.already_installed_direct_profile.value_at(timepoint)
            + investment * self.direct_profile.value_at(timepoint);
        let indirect = installed * self.already_installed_indirect_profile.value_at(timepoint)
            + investment * self.indirect_profile.value_at(timepoint);
        (direct, indirect)
    }
}

/// A transmission expansion option, as handed over by the catalog.
#[derive(Clone)]
pub struct Candidate {
    name: String,
    link: LinkRef,
    law: Arc<dyn CapacityLaw>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, link: LinkRef, law: impl CapacityLaw + 'static) -> Self {
        Self {
            name: name.into(),
            link,
            law: Arc::new(law),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &LinkRef {
        &self.link
    }

    pub fn law(&self) -> &dyn CapacityLaw {
        self.law.as_ref()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

/// Rejects negative and non-finite investments.
pub fn check_investment(investment: f64) -> XpnResult<f64> {
    if !investment.is_finite() || investment < 0.0 {
        return Err(XpnError::InvalidInvestment(investment));
    }
    Ok(investment)
}

/// New capacities of `candidate` at `timepoint` for `investment`.
///
/// The law's output is returned untouched. Invalid investments are rejected
/// before the law is called.
pub fn compute_capacities(
    investment: f64,
    candidate: &Candidate,
    timepoint: usize,
) -> XpnResult<(f64, f64)> {
    let investment = check_investment(investment)?;
    Ok(candidate.law().capacities(investment, timepoint))
}
