//! The PyPI JSON API.
//!
//! `GET {base}/{project}/json` lists every release with its files;
//! `GET {base}/{project}/{version}/json` describes a single release.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Response of the project endpoint.
#[derive(Debug, Deserialize)]
pub struct ProjectResponse {
    pub info: ProjectInfo,
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectInfo {
    pub license: Option<String>,
    #[serde(default)]
    pub classifiers: Vec<String>,
}

/// A file uploaded for a release.
#[derive(Debug, Deserialize)]
pub struct ReleaseFile {
    pub packagetype: String,
    pub url: String,
    pub digests: Digests,
    #[serde(default)]
    pub yanked: bool,
}

#[derive(Debug, Deserialize)]
pub struct Digests {
    pub sha256: String,
}

/// The source distribution of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: Version,
    pub url: String,
    pub sha256: String,
}

impl ProjectResponse {
    /// Source distributions of every release with a semver version, newest
    /// first. Yanked files are skipped.
    pub fn sdist_releases(&self) -> Vec<Release> {
        let mut releases: Vec<Release> = self
            .releases
            .iter()
            .filter_map(|(version, files)| {
                let Ok(version) = Version::parse(version) else {
                    tracing::debug!(%version, "Skipping non-semver release");
                    return None;
                };
                let sdist = files
                    .iter()
                    .find(|file| file.packagetype == "sdist" && !file.yanked)?;
                Some(Release {
                    version,
                    url: sdist.url.clone(),
                    sha256: sdist.digests.sha256.clone(),
                })
            })
            .collect();

        releases.sort_by(|left, right| right.version.cmp(&left.version));
        releases
    }
}

impl ProjectInfo {
    /// SPDX-style license ids of the release.
    ///
    /// A short `license` field is used as is; otherwise the OSI classifiers
    /// are mapped to their ids.
    pub fn licenses(&self) -> Vec<String> {
        if let Some(license) = self.license.as_deref().map(str::trim) {
            if !license.is_empty() && !license.contains('\n') && license.len() <= 64 {
                return vec![license.to_owned()];
            }
        }

        self.classifiers
            .iter()
            .filter_map(|classifier| classifier.strip_prefix("License :: OSI Approved :: "))
            .map(|name| match name {
                "MIT License" => "MIT".to_owned(),
                "BSD License" => "BSD-3-Clause".to_owned(),
                "Apache Software License" => "Apache-2.0".to_owned(),
                other => other.to_owned(),
            })
            .collect()
    }
}

/// Blocking client for the PyPI JSON API.
pub struct PypiClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl PypiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pipenv-retrieval/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to initialize the HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(%url, "Fetching");
        self.client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("failed to fetch `{url}`"))?
            .json()
            .with_context(|| format!("failed to parse the response of `{url}`"))
    }

    /// Every release of `project`.
    pub fn project(&self, project: &str) -> Result<ProjectResponse> {
        self.get(&format!("{}/{project}/json", self.base_url))
    }

    /// The licenses declared by one release of `project`.
    pub fn release_licenses(&self, project: &str, version: &str) -> Result<Vec<String>> {
        let response: ProjectResponse =
            self.get(&format!("{}/{project}/{version}/json", self.base_url))?;
        Ok(response.info.licenses())
    }
}
