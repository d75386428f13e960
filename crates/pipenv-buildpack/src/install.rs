//! Installation of the Pipenv release into the layer.

use std::ffi::OsString;
use std::path::Path;

use crate::executable::{Executable, Execution, ExecutionError};

/// Installs Pipenv from a directory holding the release artifact.
pub trait InstallProcess {
    fn execute(&self, src_path: &Path, layer_path: &Path) -> Result<(), InstallError>;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to configure pipenv:\n{}", .0.output().trim_end())]
pub struct InstallError(#[source] pub ExecutionError);

/// Runs `pip install pipenv --user --find-links=<src_path>` with the user
/// base pointed at the layer, so nothing is fetched from an index.
pub struct PipenvInstallProcess<E> {
    executable: E,
}

impl<E: Executable> PipenvInstallProcess<E> {
    pub fn new(executable: E) -> Self {
        Self { executable }
    }
}

impl<E: Executable> InstallProcess for PipenvInstallProcess<E> {
    fn execute(&self, src_path: &Path, layer_path: &Path) -> Result<(), InstallError> {
        let mut find_links = OsString::from("--find-links=");
        find_links.push(src_path);

        let execution = Execution::new([
            "install".into(),
            "pipenv".into(),
            "--user".into(),
            find_links,
        ])
        .env("PYTHONUSERBASE", layer_path);

        self.executable.execute(&execution).map_err(InstallError)?;
        Ok(())
    }
}
