//! CLI argument definitions for pipenv-retrieval.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Clap v3-style help menu colors.
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Generate buildpack.toml dependency metadata for new Pipenv releases.
#[derive(Parser, Debug)]
#[command(
    name = "pipenv-retrieval",
    author,
    version,
    about = "Generate buildpack.toml dependency metadata for new Pipenv releases.",
    styles = STYLES
)]
pub struct Cli {
    /// Path to the buildpack.toml listing the already supported versions.
    #[arg(long, value_name = "PATH", default_value = "buildpack.toml")]
    pub buildpack_toml: PathBuf,

    /// Where to write the JSON array of new dependency entries.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Base URL of the PyPI JSON API.
    #[arg(
        long,
        value_name = "URL",
        env = "PIPENV_RETRIEVAL_PYPI_URL",
        default_value = "https://pypi.org/pypi"
    )]
    pub pypi_url: String,

    /// Print debug output.
    #[arg(short, long)]
    pub verbose: bool,
}
