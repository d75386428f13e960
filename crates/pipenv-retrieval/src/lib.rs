//! pipenv-retrieval: dependency metadata for the Pipenv buildpack.
//!
//! Queries PyPI for Pipenv source releases, keeps the newest ones allowed by
//! the `dependency-constraints` of `buildpack.toml` that are not listed yet,
//! and writes their metadata as a JSON array ready to be appended to
//! `[[metadata.dependencies]]`.

#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use pipenv_buildpack::config::LogLevel;
use pipenv_buildpack::logging::setup_logging;
use pipenv_buildpack::printer::Printer;

use crate::cli::Cli;
use crate::metadata::{Descriptor, dependency_for, select_releases};
use crate::pypi::PypiClient;

pub mod cli;
pub mod metadata;
pub mod pypi;

/// Exit status of the retrieval run.
#[derive(Copy, Clone)]
pub enum ExitStatus {
    /// New metadata was written (possibly an empty list).
    Success,
    /// The run failed with an error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Error => Self::from(2),
        }
    }
}

/// Entry point for the pipenv-retrieval CLI.
pub fn main<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    setup_logging(level);
    let printer = Printer::stderr(level);

    match run(&cli, &printer) {
        Ok(status) => status.into(),
        Err(err) => {
            printer.error_chain(err.as_ref());
            ExitStatus::Error.into()
        }
    }
}

fn run(cli: &Cli, printer: &Printer) -> Result<ExitStatus> {
    let descriptor = Descriptor::from_path(&cli.buildpack_toml)?;
    let client = PypiClient::new(&cli.pypi_url)?;

    printer.info(&format!("Fetching Pipenv releases from {}", cli.pypi_url));
    let project = client.project("pipenv")?;
    let releases = project.sdist_releases();
    printer.debug(&format!("Found {} source releases", releases.len()));

    let selected = select_releases(&releases, &descriptor.metadata)?;

    let mut dependencies = Vec::with_capacity(selected.len());
    for release in selected {
        printer.info(&format!("New version: {}", release.version));
        let licenses = client
            .release_licenses("pipenv", &release.version.to_string())
            .with_context(|| {
                format!("failed to look up the license of pipenv {}", release.version)
            })?;
        dependencies.push(dependency_for(release, licenses));
    }

    if dependencies.is_empty() {
        printer.info("No new versions");
    }

    let json = serde_json::to_string_pretty(&dependencies)
        .context("failed to serialize the dependency metadata")?;
    fs_err::write(&cli.output, format!("{json}\n"))
        .context("failed to write the dependency metadata")?;

    Ok(ExitStatus::Success)
}
