//! Detection of Pipenv applications.
//!
//! The buildpack participates when the app ships a `Pipfile` and no
//! `requirements.txt` (which the pip buildpack would install instead). The
//! plan provides `pipenv` and requires `pip`, `cpython` and `pipenv` at build
//! time, carrying the versions the user or the lock asked for.

use std::path::Path;

use libcnb::data::build_plan::{BuildPlan, BuildPlanBuilder, Require};
use serde::Serialize;

use crate::config::{BP_PIPENV_VERSION, Config};
use crate::errors::PipenvBuildpackError;
use crate::pipfile::{PIPFILE, PIPFILE_LOCK, Pipfile, PipfileLock, REQUIREMENTS_TXT};
use crate::printer::Printer;
use crate::{CPYTHON, PIP, PIPENV};

/// Metadata attached to a build plan requirement.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildPlanMetadata {
    /// Where `version` came from, e.g. an environment variable.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version_source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub build: bool,
    pub launch: bool,
}

/// A build plan requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub metadata: BuildPlanMetadata,
}

impl Requirement {
    fn build(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            metadata: BuildPlanMetadata {
                build: true,
                ..BuildPlanMetadata::default()
            },
        }
    }

    #[must_use]
    fn version(mut self, version: &str, source: &str) -> Self {
        self.metadata.version = version.to_owned();
        self.metadata.version_source = source.to_owned();
        self
    }
}

/// The plan contributed by a passing detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectPlan {
    pub provides: Vec<String>,
    pub requires: Vec<Requirement>,
}

impl DetectPlan {
    pub fn into_build_plan(self) -> Result<BuildPlan, PipenvBuildpackError> {
        let mut builder = BuildPlanBuilder::new();
        for name in &self.provides {
            builder = builder.provides(name);
        }
        for requirement in self.requires {
            let mut require = Require::new(&requirement.name);
            require
                .metadata(requirement.metadata)
                .map_err(|err| PipenvBuildpackError::BuildPlan {
                    name: requirement.name.clone(),
                    message: err.to_string(),
                })?;
            builder = builder.requires(require);
        }
        Ok(builder.build())
    }
}

/// Decide whether the app at `app_dir` is a Pipenv app.
///
/// Returns `None` when detection fails.
pub fn detect(
    app_dir: &Path,
    config: &Config,
    printer: &Printer,
) -> Result<Option<DetectPlan>, PipenvBuildpackError> {
    let pipfile = app_dir.join(PIPFILE);
    if !exists(&pipfile)? {
        printer.debug("no Pipfile found");
        return Ok(None);
    }

    if exists(&app_dir.join(REQUIREMENTS_TXT))? {
        printer.info("found Pipfile + requirements.txt");
        return Ok(None);
    }

    let mut pipenv = Requirement::build(PIPENV);
    if let Some(version) = &config.pipenv_version {
        pipenv = pipenv.version(version, BP_PIPENV_VERSION);
    }

    let mut cpython = Requirement::build(CPYTHON);
    let lock = app_dir.join(PIPFILE_LOCK);
    if exists(&lock)? {
        let lock = PipfileLock::from_path(&lock)?;
        if let Some(version) = lock.python_version() {
            if let Some(requested) = &config.cpython_version {
                if requested != version {
                    printer.warn(&format!(
                        "There is a mismatch of your Python version between BP_CPYTHON_VERSION ({requested}) and Pipfile.lock ({version})"
                    ));
                }
            }
            cpython = cpython.version(version, PIPFILE_LOCK);
        }
    } else if let Some(version) = Pipfile::from_path(&pipfile)?.python_version() {
        cpython = cpython.version(version, PIPFILE);
    }

    Ok(Some(DetectPlan {
        provides: vec![PIPENV.to_owned()],
        requires: vec![Requirement::build(PIP), cpython, pipenv],
    }))
}

fn exists(path: &Path) -> Result<bool, PipenvBuildpackError> {
    path.try_exists()
        .map_err(|err| PipenvBuildpackError::FileCheck {
            path: path.to_path_buf(),
            err,
        })
}
