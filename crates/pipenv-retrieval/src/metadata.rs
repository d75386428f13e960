//! Selection of new releases and their `buildpack.toml` metadata.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use pipenv_buildpack::PIPENV;
use pipenv_buildpack::dependency::{BuildpackMetadata, Dependency, VersionConstraint};
use serde::Deserialize;

use crate::pypi::Release;

/// The parts of `buildpack.toml` the retrieval reads.
#[derive(Debug, Default, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub metadata: BuildpackMetadata,
}

impl Descriptor {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse `{}`", path.display()))
    }
}

/// Releases to add to `buildpack.toml`, newest first.
///
/// Each `dependency-constraints` entry for Pipenv keeps its newest `patches`
/// matching releases; without constraints every release is kept. Versions
/// already listed in `metadata` are dropped from that selection afterwards,
/// so older releases are never backfilled.
pub fn select_releases<'a>(
    releases: &'a [Release],
    metadata: &BuildpackMetadata,
) -> Result<Vec<&'a Release>> {
    let known: BTreeSet<&str> = metadata
        .dependencies
        .iter()
        .filter(|dependency| dependency.id == PIPENV)
        .map(|dependency| dependency.version.as_str())
        .collect();

    let constraints: Vec<_> = metadata
        .dependency_constraints
        .iter()
        .filter(|constraint| constraint.id == PIPENV)
        .collect();

    let mut selected: Vec<&Release> = if constraints.is_empty() {
        releases.iter().collect()
    } else {
        let mut selected = Vec::new();
        for constraint in constraints {
            let parsed = VersionConstraint::parse(&constraint.constraint).with_context(|| {
                format!("invalid dependency constraint `{}`", constraint.constraint)
            })?;
            let mut matching: Vec<&Release> = releases
                .iter()
                .filter(|release| parsed.matches(&release.version))
                .collect();
            matching.sort_by(|left, right| right.version.cmp(&left.version));
            selected.extend(matching.into_iter().take(constraint.patches));
        }
        selected
    };

    selected.retain(|release| !known.contains(release.version.to_string().as_str()));
    selected.sort_by(|left, right| right.version.cmp(&left.version));
    selected.dedup_by(|left, right| left.version == right.version);

    Ok(selected)
}

/// The `[[metadata.dependencies]]` entry for `release`.
pub fn dependency_for(release: &Release, licenses: Vec<String>) -> Dependency {
    let version = release.version.to_string();
    let checksum = format!("sha256:{}", release.sha256);

    Dependency {
        id: PIPENV.to_owned(),
        name: Some("Pipenv".to_owned()),
        cpe: Some(format!(
            "cpe:2.3:a:python-pipenv:pipenv:{version}:*:*:*:*:python:*:*"
        )),
        purl: Some(format!(
            "pkg:generic/pipenv@{version}?checksum={}&download_url={}",
            release.sha256, release.url
        )),
        checksum: Some(checksum.clone()),
        source: Some(release.url.clone()),
        source_checksum: Some(checksum),
        stacks: vec!["*".to_owned()],
        uri: release.url.clone(),
        licenses,
        version,
        ..Dependency::default()
    }
}
