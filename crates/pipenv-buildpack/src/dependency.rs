//! The dependency catalog declared in `buildpack.toml` and its delivery.
//!
//! ```toml
//! [metadata.default-versions]
//! pipenv = "*"
//!
//! [[metadata.dependencies]]
//! id = "pipenv"
//! version = "2023.12.1"
//! uri = "https://files.pythonhosted.org/packages/.../pipenv-2023.12.1.tar.gz"
//! checksum = "sha256:..."
//! stacks = ["*"]
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `[metadata]` of `buildpack.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildpackMetadata {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Dependency id to the constraint used when no version is requested.
    #[serde(default)]
    pub default_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub dependency_constraints: Vec<DependencyConstraint>,
}

/// A `[[metadata.dependencies]]` entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Checksum with its algorithm, e.g. `sha256:<hex>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_checksum: Option<String>,
    #[serde(default)]
    pub stacks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
    /// RFC 3339 timestamp (or plain date) after which the version is
    /// deprecated.
    #[serde(
        rename = "deprecation_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deprecation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_components: Option<u32>,
    /// Operating system the artifact is built for, any when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// CPU architecture the artifact is built for, any when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// Where the build runs. Unset fields match every dependency.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyTarget {
    /// `CNB_STACK_ID`, only set by platforms older than API 0.12.
    pub stack: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl DependencyTarget {
    /// Combine the stack id with the target the lifecycle resolved for the
    /// run image.
    pub fn new(stack: Option<String>, target: &libcnb::Target) -> Self {
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_owned());
        Self {
            stack,
            os: non_empty(&target.os),
            arch: non_empty(&target.arch),
        }
    }

    /// A target that only filters by stack.
    pub fn stack(stack: impl Into<String>) -> Self {
        Self {
            stack: Some(stack.into()),
            ..Self::default()
        }
    }
}

/// A `[[metadata.dependency-constraints]]` entry: how many patch releases of
/// a version line the retrieval tool keeps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencyConstraint {
    pub id: String,
    pub constraint: String,
    #[serde(default = "default_patches")]
    pub patches: usize,
}

fn default_patches() -> usize {
    1
}

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("invalid version constraint `{constraint}` for {id}")]
    Constraint {
        id: String,
        constraint: String,
        #[source]
        err: semver::Error,
    },
    #[error(
        "failed to satisfy \"{id}\" dependency version constraint \"{constraint}\": no compatible versions on \"{stack}\" stack. Supported versions are: [{}]",
        supported.join(", ")
    )]
    NoMatch {
        id: String,
        constraint: String,
        stack: String,
        supported: Vec<String>,
    },
    #[error("dependency {id} {version} does not declare a sha256 checksum")]
    MissingChecksum { id: String, version: String },
    #[error("unsupported dependency URI `{0}`")]
    UnsupportedUri(String),
    #[error("failed to initialize the HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("failed to download `{uri}`")]
    Download {
        uri: String,
        #[source]
        err: reqwest::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("checksum does not match for `{uri}`: expected sha256 {expected}, found {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// `*` or an empty string.
    Any,
    /// A complete version such as `2023.12.1`.
    Exact(Version),
    /// A semver requirement such as `2023.*` or `>=2023.7, <2024`.
    Req(VersionReq),
}

impl VersionConstraint {
    /// Parse a constraint. A partial version without an operator (`2023.12`)
    /// matches every release of that line.
    pub fn parse(constraint: &str) -> Result<Self, semver::Error> {
        let constraint = constraint.trim();
        if constraint.is_empty() || constraint == "*" {
            return Ok(Self::Any);
        }
        if let Ok(version) = Version::parse(constraint) {
            return Ok(Self::Exact(version));
        }
        if constraint.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return VersionReq::parse(&format!("={constraint}")).map(Self::Req);
        }
        VersionReq::parse(constraint).map(Self::Req)
    }

    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => exact == version,
            Self::Req(req) => req.matches(version),
        }
    }
}

impl BuildpackMetadata {
    /// Pick the highest version of `id` matching `version` on `target`.
    ///
    /// An empty `version` (or `default`) falls back to the default version
    /// for `id`, and to `*` when there is none.
    pub fn resolve(
        &self,
        id: &str,
        version: &str,
        target: &DependencyTarget,
    ) -> Result<Dependency, DependencyError> {
        let constraint = if version.is_empty() || version == "default" {
            self.default_versions
                .get(id)
                .map(String::as_str)
                .unwrap_or("*")
        } else {
            version
        };

        let parsed = VersionConstraint::parse(constraint).map_err(|err| {
            DependencyError::Constraint {
                id: id.to_owned(),
                constraint: constraint.to_owned(),
                err,
            }
        })?;

        let candidates: Vec<&Dependency> = self
            .dependencies
            .iter()
            .filter(|dependency| dependency.id == id && dependency.supports(target))
            .collect();

        let selected = candidates
            .iter()
            .filter_map(|dependency| match Version::parse(&dependency.version) {
                Ok(parsed) => Some((parsed, *dependency)),
                Err(err) => {
                    tracing::warn!(
                        id = %dependency.id,
                        version = %dependency.version,
                        "Skipping dependency with an invalid version: {err}"
                    );
                    None
                }
            })
            .filter(|(version, _)| parsed.matches(version))
            .max_by(|(left, _), (right, _)| left.cmp(right))
            .map(|(_, dependency)| dependency.clone());

        selected.ok_or_else(|| {
            let mut supported: Vec<String> = candidates
                .iter()
                .map(|dependency| dependency.version.clone())
                .collect();
            supported.sort();
            supported.dedup();

            DependencyError::NoMatch {
                id: id.to_owned(),
                constraint: constraint.to_owned(),
                stack: target.stack.as_deref().unwrap_or("*").to_owned(),
                supported,
            }
        })
    }
}

impl Dependency {
    /// Human readable name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// The sha256 hex digest of the artifact.
    pub fn checksum(&self) -> Option<&str> {
        if let Some(checksum) = self.checksum.as_deref() {
            let (_, hex) = checksum.split_once(':').unwrap_or(("sha256", checksum));
            return Some(hex);
        }
        self.sha256.as_deref()
    }

    /// Whether the dependency can be installed on `target`.
    pub fn supports(&self, target: &DependencyTarget) -> bool {
        let stack = match target.stack.as_deref() {
            None => true,
            Some(stack) => self
                .stacks
                .iter()
                .any(|candidate| candidate == "*" || candidate == stack),
        };
        stack
            && matches_field(self.os.as_deref(), target.os.as_deref())
            && matches_field(self.arch.as_deref(), target.arch.as_deref())
    }

    /// The parsed deprecation date, if any.
    pub fn deprecation_timestamp(&self) -> Option<Timestamp> {
        let date = self.deprecation_date.as_deref()?.trim();
        if let Ok(timestamp) = date.parse::<Timestamp>() {
            return Some(timestamp);
        }
        date.parse::<Date>()
            .ok()
            .and_then(|date| date.to_zoned(TimeZone::UTC).ok())
            .map(|zoned| zoned.timestamp())
    }

    /// File name of the artifact, taken from the last segment of its URI.
    pub fn artifact_name(&self) -> String {
        self.uri
            .split(['?', '#'])
            .next()
            .and_then(|uri| uri.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("{}-{}.tar.gz", self.id, self.version))
    }
}

fn matches_field(declared: Option<&str>, actual: Option<&str>) -> bool {
    match (declared, actual) {
        (Some(declared), Some(actual)) => declared == actual,
        _ => true,
    }
}

/// Fetches dependency artifacts.
pub trait DependencyManager {
    /// Store the artifact of `dependency` in `dest_dir` and return its path.
    fn deliver(
        &self,
        dependency: &Dependency,
        buildpack_dir: &Path,
        dest_dir: &Path,
    ) -> Result<PathBuf, DependencyError>;
}

/// A [`DependencyManager`] reading `http(s)://` and `file://` URIs.
///
/// `file:///dependencies/<name>` resolves inside the buildpack directory, as
/// written by offline packaging.
pub struct DependencyService {
    client: reqwest::blocking::Client,
}

impl DependencyService {
    pub fn new() -> Result<Self, DependencyError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pipenv-buildpack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DependencyError::Client)?;
        Ok(Self { client })
    }

    fn open(&self, uri: &str, buildpack_dir: &Path) -> Result<Box<dyn Read>, DependencyError> {
        if let Some(path) = uri.strip_prefix("file://") {
            let path = match path.strip_prefix("/dependencies/") {
                Some(relative) => buildpack_dir.join("dependencies").join(relative),
                None => PathBuf::from(path),
            };
            return Ok(Box::new(fs_err::File::open(path)?));
        }

        if uri.starts_with("https://") || uri.starts_with("http://") {
            let response = self
                .client
                .get(uri)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .map_err(|err| DependencyError::Download {
                    uri: uri.to_owned(),
                    err,
                })?;
            return Ok(Box::new(response));
        }

        Err(DependencyError::UnsupportedUri(uri.to_owned()))
    }
}

impl DependencyManager for DependencyService {
    fn deliver(
        &self,
        dependency: &Dependency,
        buildpack_dir: &Path,
        dest_dir: &Path,
    ) -> Result<PathBuf, DependencyError> {
        let expected = dependency
            .checksum()
            .ok_or_else(|| DependencyError::MissingChecksum {
                id: dependency.id.clone(),
                version: dependency.version.clone(),
            })?;

        tracing::debug!(uri = %dependency.uri, "Delivering dependency");

        let mut reader = self.open(&dependency.uri, buildpack_dir)?;
        let path = dest_dir.join(dependency.artifact_name());
        let mut file = fs_err::File::create(&path)?;
        let actual = copy_with_sha256(reader.as_mut(), &mut file)?;
        drop(file);

        if !actual.eq_ignore_ascii_case(expected) {
            fs_err::remove_file(&path)?;
            return Err(DependencyError::ChecksumMismatch {
                uri: dependency.uri.clone(),
                expected: expected.to_owned(),
                actual,
            });
        }

        Ok(path)
    }
}

/// Copy `reader` into `writer`, returning the sha256 hex digest of the bytes.
fn copy_with_sha256(reader: &mut dyn Read, writer: &mut dyn Write) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        writer.write_all(&buffer[..read])?;
    }
    writer.flush()?;

    Ok(format!("{:x}", hasher.finalize()))
}
