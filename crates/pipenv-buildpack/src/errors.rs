use std::path::PathBuf;

use crate::config::LogLevel;
use crate::dependency::DependencyError;
use crate::install::InstallError;
use crate::pipfile::{LockfileError, PipfileError};
use crate::printer::Printer;
use crate::requirements::RequirementsError;
use crate::site::SiteError;

/// Errors raised by the detect and build phases.
#[derive(Debug, thiserror::Error)]
pub enum PipenvBuildpackError {
    #[error("failed to check for `{}`", path.display())]
    FileCheck {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error(transparent)]
    Pipfile(#[from] PipfileError),
    #[error(transparent)]
    Lockfile(#[from] LockfileError),
    #[error("failed to add `{name}` to the build plan: {message}")]
    BuildPlan { name: String, message: String },
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error("failed to create a temporary directory")]
    TempDir(#[source] std::io::Error),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error(transparent)]
    SitePackages(#[from] SiteError),
    #[error("pipenv installation failed: site packages are missing from the pipenv layer")]
    MissingSitePackages,
    #[error("failed to generate the SBOM")]
    Sbom(#[source] cyclonedx_bom::errors::JsonWriteError),
    #[error(transparent)]
    Requirements(#[from] RequirementsError),
}

impl From<PipenvBuildpackError> for libcnb::Error<PipenvBuildpackError> {
    fn from(error: PipenvBuildpackError) -> Self {
        Self::BuildpackError(error)
    }
}

/// Report a failed phase on stderr.
pub fn on_error(error: libcnb::Error<PipenvBuildpackError>) {
    let printer = Printer::stderr(LogLevel::Info);
    match error {
        libcnb::Error::BuildpackError(error) => printer.error_chain(&error),
        error => printer.error(&error.to_string()),
    }
}
