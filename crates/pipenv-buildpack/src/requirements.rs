//! `requirements.txt` generation from `Pipfile.lock`.
//!
//! Later buildpacks (pip-install) only understand requirements files, so the
//! locked `default` packages are rendered as pinned requirement lines. Apps
//! without a lock are locked first with the Pipenv installed in the layer.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::executable::{Executable, Execution, ExecutionError};
use crate::pipfile::lockfile::LockedPackage;
use crate::pipfile::{LockfileError, PIPFILE_LOCK, PipfileLock, REQUIREMENTS_TXT};
use crate::printer::Printer;

#[derive(Debug, thiserror::Error)]
pub enum RequirementsError {
    #[error("failed to lock the Pipfile:\n{}", .0.output().trim_end())]
    Lock(#[source] ExecutionError),
    #[error(transparent)]
    Lockfile(#[from] LockfileError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Produces a `Pipfile.lock` for an app that does not ship one.
pub trait LockProcess {
    fn execute(
        &self,
        app_dir: &Path,
        layer_path: &Path,
        site_packages: &Path,
    ) -> Result<(), ExecutionError>;
}

/// Runs `python -m pipenv lock` with the Pipenv from the layer.
pub struct PipenvLockProcess<E> {
    executable: E,
}

impl<E: Executable> PipenvLockProcess<E> {
    pub fn new(executable: E) -> Self {
        Self { executable }
    }
}

impl<E: Executable> LockProcess for PipenvLockProcess<E> {
    fn execute(
        &self,
        app_dir: &Path,
        layer_path: &Path,
        site_packages: &Path,
    ) -> Result<(), ExecutionError> {
        let execution = Execution::new(["-m", "pipenv", "lock"])
            .env("PYTHONUSERBASE", layer_path)
            .env("PYTHONPATH", site_packages)
            .dir(app_dir);

        self.executable.execute(&execution)?;
        Ok(())
    }
}

/// Render the `default` packages of `lock` as a pip requirements file.
///
/// Development packages are left out.
pub fn to_requirements_txt(lock: &PipfileLock) -> String {
    let mut output = String::new();

    for (index, source) in lock.meta.sources.iter().enumerate() {
        let flag = if index == 0 { "-i" } else { "--extra-index-url" };
        let _ = writeln!(output, "{flag} {}", source.url);
        if !source.verify_ssl {
            if let Some(host) = url_host(&source.url) {
                let _ = writeln!(output, "--trusted-host {host}");
            }
        }
    }

    for (name, package) in &lock.default {
        let _ = writeln!(output, "{}", requirement_line(name, package));
    }

    output
}

fn requirement_line(name: &str, package: &LockedPackage) -> String {
    let mut line = requirement(name, package);
    if let Some(markers) = &package.markers {
        let _ = write!(line, "; {markers}");
    }
    line
}

fn requirement(name: &str, package: &LockedPackage) -> String {
    let editable = if package.editable { "-e " } else { "" };
    let extras = if package.extras.is_empty() {
        String::new()
    } else {
        format!("[{}]", package.extras.join(","))
    };

    if let Some(git) = &package.git {
        let scheme = if git.starts_with("git+") { "" } else { "git+" };
        let mut line = format!("{editable}{scheme}{git}");
        if let Some(git_ref) = &package.git_ref {
            let _ = write!(line, "@{git_ref}");
        }
        let _ = write!(line, "#egg={name}");
        if let Some(subdirectory) = &package.subdirectory {
            let _ = write!(line, "&subdirectory={subdirectory}");
        }
        return line;
    }

    if let Some(path) = &package.path {
        return format!("{editable}{path}{extras}");
    }

    if let Some(file) = &package.file {
        format!("{name}{extras} @ {file}")
    } else {
        format!("{name}{extras}{}", package.version.as_deref().unwrap_or_default())
    }
}

/// Host (and port) of an index URL, as expected by `--trusted-host`.
fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    (!host.is_empty()).then_some(host)
}

/// Generate the requirements for the app at `app_dir`, locking it first when
/// no `Pipfile.lock` exists.
pub fn requirements_for_app(
    app_dir: &Path,
    layer_path: &Path,
    site_packages: &Path,
    lock_process: &dyn LockProcess,
    printer: &Printer,
) -> Result<String, RequirementsError> {
    let lock_path = app_dir.join(PIPFILE_LOCK);
    if !lock_path.try_exists()? {
        printer.subprocess("Pipfile.lock not found, running pipenv lock");
        lock_process
            .execute(app_dir, layer_path, site_packages)
            .map_err(RequirementsError::Lock)?;
    }

    let lock = PipfileLock::from_path(&lock_path)?;
    Ok(to_requirements_txt(&lock))
}

/// Write `contents` to `requirements.txt` in `layer_dir` and copy it into
/// `app_dir`. Returns the path inside the layer.
pub fn write_requirements(
    contents: &str,
    layer_dir: &Path,
    app_dir: &Path,
) -> Result<PathBuf, RequirementsError> {
    let path = layer_dir.join(REQUIREMENTS_TXT);
    fs_err::write(&path, contents)?;
    fs_err::copy(&path, app_dir.join(REQUIREMENTS_TXT))?;
    Ok(path)
}
