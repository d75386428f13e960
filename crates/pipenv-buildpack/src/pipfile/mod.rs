//! `Pipfile` and `Pipfile.lock` models.
//!
//! The buildpack only reads these files: the `Pipfile` to find the Python
//! version the app asks for, and the `Pipfile.lock` to find the locked Python
//! version and to render the `requirements.txt` handed to later buildpacks.

pub mod lockfile;
pub mod model;

pub use lockfile::{LockfileError, PipfileLock};
pub use model::{Pipfile, PipfileError};

/// File name of the Pipenv manifest.
pub const PIPFILE: &str = "Pipfile";

/// File name of the Pipenv lock file.
pub const PIPFILE_LOCK: &str = "Pipfile.lock";

/// File name of the pip requirements file.
pub const REQUIREMENTS_TXT: &str = "requirements.txt";
