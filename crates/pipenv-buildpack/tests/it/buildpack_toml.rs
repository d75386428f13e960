//! The shipped `buildpack.toml`.

use pipenv_buildpack::dependency::BuildpackMetadata;
use serde::Deserialize;

#[derive(Deserialize)]
struct Descriptor {
    api: String,
    buildpack: Buildpack,
    metadata: BuildpackMetadata,
}

#[derive(Deserialize)]
struct Buildpack {
    id: String,
    #[serde(rename = "sbom-formats")]
    sbom_formats: Vec<String>,
}

fn descriptor() -> Descriptor {
    let content =
        fs_err::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/buildpack.toml")).unwrap();
    toml::from_str(&content).unwrap()
}

#[test]
fn identity() {
    let descriptor = descriptor();
    assert_eq!(descriptor.api, "0.10");
    assert_eq!(descriptor.buildpack.id, "paketo-community/pipenv");
    assert_eq!(
        descriptor.buildpack.sbom_formats,
        ["application/vnd.cyclonedx+json"]
    );
}

#[test]
fn pipenv_metadata() {
    let metadata = descriptor().metadata;
    assert_eq!(metadata.default_versions["pipenv"], "*");

    let constraint = &metadata.dependency_constraints[0];
    assert_eq!(constraint.id, "pipenv");
    assert_eq!(constraint.constraint, "*");
    assert_eq!(constraint.patches, 2);

    for dependency in &metadata.dependencies {
        assert_eq!(dependency.id, "pipenv");
        assert!(dependency.checksum().is_some());
        assert!(semver::Version::parse(&dependency.version).is_ok());
    }
}
