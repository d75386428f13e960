//! The `Pipfile` manifest.
//!
//! Detection only needs the interpreter the app asks for, so only
//! `[requires]` is modelled. Every other section is ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum PipfileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to parse `{}`", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        err: Box<toml::de::Error>,
    },
}

/// A parsed `Pipfile`.
#[derive(Debug, Default, Deserialize)]
pub struct Pipfile {
    pub requires: Option<PipfileRequires>,
}

impl Pipfile {
    /// Read and parse the manifest at `path`.
    pub fn from_path(path: &Path) -> Result<Self, PipfileError> {
        let content = fs_err::read_to_string(path)?;
        toml::from_str(&content).map_err(|err| PipfileError::Toml {
            path: path.to_path_buf(),
            err: Box::new(err),
        })
    }

    /// The Python version from `[requires]`, preferring `python_full_version`.
    pub fn python_version(&self) -> Option<&str> {
        let requires = self.requires.as_ref()?;
        requires
            .python_full_version
            .as_deref()
            .or(requires.python_version.as_deref())
            .filter(|version| !version.is_empty())
    }
}

/// `[requires]`: the interpreter the app expects.
#[derive(Debug, Deserialize)]
pub struct PipfileRequires {
    pub python_version: Option<String>,
    pub python_full_version: Option<String>,
}
