use std::path::{Path, PathBuf};

use xpn_core::{Candidate, LinkRef};

/// Link folder relative to the study root.
pub const LINKS_SUBFOLDER: &str = "input/links";

/// Where a study keeps its link-data files:
/// `<root>/input/links/<origin>/<extremity>.txt`.
#[derive(Debug, Clone)]
pub struct StudyLayout {
    root: PathBuf,
}

impl StudyLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn links_dir(&self) -> PathBuf {
        self.root.join(LINKS_SUBFOLDER)
    }

    pub fn linkdata_path(&self, link: &LinkRef) -> PathBuf {
        self.links_dir()
            .join(&link.origin)
            .join(format!("{}.txt", link.extremity))
    }

    pub fn candidate_linkdata_path(&self, candidate: &Candidate) -> PathBuf {
        self.linkdata_path(candidate.link())
    }
}
