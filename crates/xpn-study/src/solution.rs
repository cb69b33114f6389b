//! Investment solutions produced by the optimisation step.
//!
//! Two JSON shapes are accepted, both mapping a candidate name to its
//! investment:
//!
//! ```json
//! {"solution": {"values": {"transmission_line": 150.0}}}
//! {"transmission_line": 150.0}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use xpn_core::{XpnError, XpnResult};

/// Candidate name to investment.
pub type Investments = BTreeMap<String, f64>;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SolutionDocument {
    Nested { solution: SolutionValues },
    Flat(Investments),
}

#[derive(Debug, Deserialize)]
struct SolutionValues {
    values: Investments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSolution {
    pub investments: Investments,
}

impl InvestmentSolution {
    pub fn from_json_str(text: &str) -> XpnResult<Self> {
        let document: SolutionDocument = serde_json::from_str(text)?;
        Ok(Self::from_document(document))
    }

    pub fn load(path: &Path) -> XpnResult<Self> {
        let file = File::open(path).map_err(|err| {
            XpnError::Solution(format!("opening solution '{}': {err}", path.display()))
        })?;
        let document: SolutionDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| {
                XpnError::Solution(format!("parsing solution '{}': {err}", path.display()))
            })?;
        Ok(Self::from_document(document))
    }

    fn from_document(document: SolutionDocument) -> Self {
        let investments = match document {
            SolutionDocument::Nested { solution } => solution.values,
            SolutionDocument::Flat(investments) => investments,
        };
        Self { investments }
    }

    pub fn get(&self, candidate: &str) -> Option<f64> {
        self.investments.get(candidate).copied()
    }
}

impl From<Investments> for InvestmentSolution {
    fn from(investments: Investments) -> Self {
        Self { investments }
    }
}
