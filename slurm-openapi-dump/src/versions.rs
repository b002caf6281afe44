use anyhow::{anyhow, Result};
use std::collections::BTreeSet as Set;

use crate::{
    error::ExtractError,
    models::{ReleaseId, VersionSpec},
};

/// Releases known to this tool, in the order they are reported.
///
/// 23.11 has no recipe of its own: the 24.05 slurmrestd still generates the
/// v0.0.40 document.
const BUILTIN_VERSIONS: &[(&str, &str, &str)] = &[
    ("24.05", "0.0.41", "24.05"),
    ("23.11", "0.0.40", "24.05"),
];

/// Immutable mapping from release identifiers to build parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionTable {
    entries: Vec<(ReleaseId, VersionSpec)>,
}

impl VersionTable {
    pub fn builtin() -> VersionTable {
        let entries = BUILTIN_VERSIONS
            .iter()
            .map(|(release, api_version, build_tag)| {
                (
                    ReleaseId((*release).into()),
                    VersionSpec::new(*api_version, *build_tag),
                )
            })
            .collect();

        VersionTable { entries }
    }

    pub fn from_entries(entries: Vec<(ReleaseId, VersionSpec)>) -> Result<VersionTable> {
        if entries.is_empty() {
            return Err(anyhow!("the version table has no entries"));
        }

        let mut seen = Set::new();
        for (release, spec) in entries.iter() {
            if release.0.is_empty() || spec.api_version.is_empty() || spec.build_tag.0.is_empty()
            {
                return Err(anyhow!("incomplete version entry for release {:?}", release.0));
            }

            if !seen.insert(release) {
                return Err(anyhow!("release {:?} is listed more than once", release.0));
            }
        }

        Ok(VersionTable { entries })
    }

    pub fn resolve(&self, release: &str) -> Result<&VersionSpec, ExtractError> {
        self.entries
            .iter()
            .find(|(id, _)| id.0 == release)
            .map(|(_, spec)| spec)
            .ok_or_else(|| ExtractError::UnsupportedVersion {
                requested: release.into(),
                supported: self.supported(),
            })
    }

    pub fn supported(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.0.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ReleaseId, VersionSpec)> {
        self.entries.iter()
    }
}
