//! pipenv-buildpack: a Cloud Native Buildpack for Pipenv projects.
//!
//! The detect phase passes for apps with a `Pipfile` (and no competing
//! `requirements.txt`). The build phase installs the `pipenv` dependency
//! declared in `buildpack.toml` into a cached layer, exposes it on
//! `PYTHONPATH`, and writes a `requirements.txt` generated from
//! `Pipfile.lock`.
//!
//! The lifecycle plumbing (plan files, layer layout, env files) is handled by
//! [`libcnb`]; this crate only decides what goes into the layers.

#![deny(clippy::print_stdout, clippy::print_stderr)]

use libcnb::build::{BuildContext, BuildResult};
use libcnb::detect::{DetectContext, DetectResult, DetectResultBuilder};
use libcnb::generic::GenericPlatform;
use libcnb::{Buildpack, Platform};

use crate::config::Config;
use crate::dependency::BuildpackMetadata;
use crate::errors::PipenvBuildpackError;
use crate::printer::Printer;

pub mod build;
pub mod config;
pub mod dependency;
pub mod detect;
pub mod errors;
pub mod executable;
pub mod install;
pub mod logging;
pub mod pipfile;
pub mod plan;
pub mod printer;
pub mod requirements;
pub mod sbom;
pub mod site;

/// Build plan name provided by this buildpack.
pub const PIPENV: &str = "pipenv";

/// Build plan name of the CPython dependency.
pub const CPYTHON: &str = "cpython";

/// Build plan name of the pip dependency.
pub const PIP: &str = "pip";

/// Version sources for the `pipenv` plan entry, highest priority first.
pub const PRIORITIES: &[&str] = &["BP_PIPENV_VERSION"];

/// The buildpack registered with the libcnb runtime.
pub struct PipenvBuildpack;

impl Buildpack for PipenvBuildpack {
    type Platform = GenericPlatform;
    type Metadata = BuildpackMetadata;
    type Error = PipenvBuildpackError;

    fn detect(&self, context: DetectContext<Self>) -> libcnb::Result<DetectResult, Self::Error> {
        let config = Config::from_env(context.platform.env());
        let printer = Printer::stdout(config.log_level);

        match detect::detect(&context.app_dir, &config, &printer)? {
            Some(plan) => DetectResultBuilder::pass()
                .build_plan(plan.into_build_plan()?)
                .build(),
            None => DetectResultBuilder::fail().build(),
        }
    }

    fn build(&self, context: BuildContext<Self>) -> libcnb::Result<BuildResult, Self::Error> {
        let config = Config::from_env(context.platform.env());
        let printer = Printer::stdout(config.log_level);

        build::build(&context, &config, &printer)
    }

    fn on_error(&self, error: libcnb::Error<Self::Error>) {
        errors::on_error(error);
    }
}
