use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    models::{ReleaseId, VersionSpec},
    services::VersionFrontend,
    versions::VersionTable,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionsDocument {
    pub versions: Vec<VersionEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionEntry {
    pub release: String,
    pub api_version: String,
    pub build_tag: String,
}

fn parse_versions<R: Read>(reader: R) -> Result<VersionTable> {
    let document: VersionsDocument = serde_yaml::from_reader(reader)?;

    let entries = document
        .versions
        .into_iter()
        .map(|entry| {
            (
                ReleaseId(entry.release),
                VersionSpec::new(entry.api_version, entry.build_tag),
            )
        })
        .collect();

    VersionTable::from_entries(entries)
}

/// The releases compiled into the binary.
pub struct BuiltinVersions;

impl VersionFrontend for BuiltinVersions {
    fn version_table(&mut self) -> Result<VersionTable> {
        Ok(VersionTable::builtin())
    }
}

/// Reads the release mapping from a YAML document.
pub struct VersionsFile {
    path: PathBuf,
}

impl VersionsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> VersionsFile {
        VersionsFile {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl VersionFrontend for VersionsFile {
    fn version_table(&mut self) -> Result<VersionTable> {
        let file = File::open(&self.path)
            .with_context(|| format!("couldn't open versions file {:?}", self.path))?;

        parse_versions(file).with_context(|| format!("invalid versions file {:?}", self.path))
    }
}
