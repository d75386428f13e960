//! Discovery of the user site-packages directory inside the layer.

use std::path::Path;

use crate::executable::{Executable, Execution, ExecutionError};

/// Finds the site-packages directory for a user base.
pub trait SitePackageProcess {
    fn execute(&self, layer_path: &Path) -> Result<String, SiteError>;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to locate site packages:\n{}", .0.output().trim_end())]
pub struct SiteError(#[source] pub ExecutionError);

/// Runs `python -m site --user-site` with `PYTHONUSERBASE` set to the layer.
pub struct SiteProcess<E> {
    executable: E,
}

impl<E: Executable> SiteProcess<E> {
    pub fn new(executable: E) -> Self {
        Self { executable }
    }
}

impl<E: Executable> SitePackageProcess for SiteProcess<E> {
    fn execute(&self, layer_path: &Path) -> Result<String, SiteError> {
        let execution =
            Execution::new(["-m", "site", "--user-site"]).env("PYTHONUSERBASE", layer_path);

        let output = self.executable.execute(&execution).map_err(SiteError)?;
        Ok(output.stdout.trim_end().to_owned())
    }
}
