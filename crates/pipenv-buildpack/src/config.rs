//! Buildpack configuration read from the platform environment.
//!
//! Users configure the buildpack through `pack build --env` (or a
//! `project.toml`); the lifecycle exposes those values through the platform
//! [`Env`].

use std::ffi::OsStr;

use libcnb::Env;

/// Requested Pipenv version constraint.
pub const BP_PIPENV_VERSION: &str = "BP_PIPENV_VERSION";

/// Requested CPython version, owned by the CPython buildpack.
pub const BP_CPYTHON_VERSION: &str = "BP_CPYTHON_VERSION";

/// Log level of the buildpack output (`INFO` or `DEBUG`).
pub const BP_LOG_LEVEL: &str = "BP_LOG_LEVEL";

/// Stack the image is being built on.
pub const CNB_STACK_ID: &str = "CNB_STACK_ID";

/// Verbosity of the buildpack output.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// Parse the value of `BP_LOG_LEVEL`. Anything but `debug` (in any case)
    /// is treated as the default level.
    pub fn from_env_var(value: Option<&str>) -> Self {
        match value {
            Some(value) if value.trim().eq_ignore_ascii_case("debug") => Self::Debug,
            _ => Self::Info,
        }
    }

    /// Read `BP_LOG_LEVEL` from the process environment, before the platform
    /// environment is available.
    pub fn from_process_env() -> Self {
        Self::from_env_var(std::env::var(BP_LOG_LEVEL).ok().as_deref())
    }
}

/// Settings that influence detection and build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Value of `BP_PIPENV_VERSION`, if set and non-empty.
    pub pipenv_version: Option<String>,
    /// Value of `BP_CPYTHON_VERSION`, if set and non-empty.
    pub cpython_version: Option<String>,
    /// Output verbosity.
    pub log_level: LogLevel,
    /// Stack ID used to filter dependencies. `None` matches every stack.
    pub stack: Option<String>,
}

impl Config {
    /// Read the configuration from the platform environment.
    pub fn from_env(env: &Env) -> Self {
        Self {
            pipenv_version: non_empty(env.get(BP_PIPENV_VERSION)),
            cpython_version: non_empty(env.get(BP_CPYTHON_VERSION)),
            log_level: LogLevel::from_env_var(non_empty(env.get(BP_LOG_LEVEL)).as_deref()),
            stack: non_empty(env.get(CNB_STACK_ID)),
        }
    }
}

fn non_empty(value: Option<impl AsRef<OsStr>>) -> Option<String> {
    value
        .map(|value| value.as_ref().to_string_lossy().trim().to_owned())
        .filter(|value| !value.is_empty())
}
