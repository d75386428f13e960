//! `Pipfile.lock` data model.
//!
//! Pipenv writes the lock as JSON with a `_meta` section and two package maps,
//! `default` (from `[packages]`) and `develop` (from `[dev-packages]`). Only
//! the fields needed to pin installs are modelled; everything else is ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum LockfileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to parse `{}`", path.display())]
    Json {
        path: PathBuf,
        #[source]
        err: serde_json::Error,
    },
}

/// A parsed `Pipfile.lock`.
#[derive(Debug, Default, Deserialize)]
pub struct PipfileLock {
    #[serde(rename = "_meta", default)]
    pub meta: PipfileLockMeta,
    /// Pins for `[packages]`.
    #[serde(default)]
    pub default: BTreeMap<String, LockedPackage>,
    /// Pins for `[dev-packages]`; never exported.
    #[serde(default)]
    pub develop: BTreeMap<String, LockedPackage>,
}

impl PipfileLock {
    /// Read and parse the lock at `path`.
    pub fn from_path(path: &Path) -> Result<Self, LockfileError> {
        let content = fs_err::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|err| LockfileError::Json {
            path: path.to_path_buf(),
            err,
        })
    }

    /// The Python version the lock was resolved for, preferring
    /// `python_full_version` over `python_version`.
    pub fn python_version(&self) -> Option<&str> {
        let requires = &self.meta.requires;
        requires
            .python_full_version
            .as_deref()
            .or(requires.python_version.as_deref())
            .filter(|version| !version.is_empty())
    }
}

/// The `_meta` section of `Pipfile.lock`.
#[derive(Debug, Default, Deserialize)]
pub struct PipfileLockMeta {
    /// Digest of the `Pipfile` the lock was resolved from.
    #[serde(default)]
    pub hash: Option<PipfileLockHash>,
    /// Lock format version, `6` for current Pipenv releases.
    #[serde(rename = "pipfile-spec", default)]
    pub pipfile_spec: Option<u32>,
    #[serde(default)]
    pub requires: PipfileLockRequires,
    /// Indexes copied from the `Pipfile` `[[source]]` tables.
    #[serde(default)]
    pub sources: Vec<PipfileLockSource>,
}

#[derive(Debug, Deserialize)]
pub struct PipfileLockHash {
    pub sha256: String,
}

/// The `_meta.requires` section.
#[derive(Debug, Default, Deserialize)]
pub struct PipfileLockRequires {
    pub python_version: Option<String>,
    pub python_full_version: Option<String>,
}

/// An index recorded in `_meta.sources`.
#[derive(Debug, Deserialize)]
pub struct PipfileLockSource {
    pub name: String,
    pub url: String,
    #[serde(default = "verify_ssl_default")]
    pub verify_ssl: bool,
}

/// One pinned package. Registry packages carry `version`; path, file and VCS
/// packages carry the matching location field instead.
#[derive(Debug, Default, Deserialize)]
pub struct LockedPackage {
    /// `==<version>` for registry packages.
    pub version: Option<String>,
    /// Distribution hashes (`sha256:<hex>`).
    #[serde(default)]
    pub hashes: Vec<String>,
    pub index: Option<String>,
    /// PEP 508 environment markers.
    pub markers: Option<String>,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(default)]
    pub editable: bool,
    pub path: Option<String>,
    /// Archive URL or local file.
    pub file: Option<String>,
    pub git: Option<String>,
    /// Branch, tag or commit.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub subdirectory: Option<String>,
}

fn verify_ssl_default() -> bool {
    true
}
