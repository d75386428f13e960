//! CycloneDX SBOM describing the installed Pipenv release.

use cyclonedx_bom::errors::JsonWriteError;
use cyclonedx_bom::external_models::spdx::SpdxIdentifier;
use cyclonedx_bom::external_models::uri::Purl;
use cyclonedx_bom::models::component::{Classification, Component, Components, Cpe};
use cyclonedx_bom::models::hash::{Hash, HashAlgorithm, HashValue, Hashes};
use cyclonedx_bom::models::license::{License, LicenseChoice, Licenses};
use cyclonedx_bom::models::metadata::Metadata;
use cyclonedx_bom::models::tool::{Tool, Tools};
use cyclonedx_bom::prelude::{Bom, DateTime};

use crate::dependency::Dependency;

/// Render a CycloneDX 1.4 JSON document with `dependency` as its only
/// component.
pub fn cyclonedx(dependency: &Dependency) -> Result<Vec<u8>, JsonWriteError> {
    let mut component = Component::new(
        Classification::Library,
        &dependency.id,
        &dependency.version,
        None,
    );
    component.purl = dependency
        .purl
        .as_deref()
        .and_then(|purl| purl.parse::<Purl>().ok());
    component.cpe = dependency.cpe.as_deref().map(Cpe::new);
    component.hashes = dependency.checksum().map(|checksum| {
        Hashes(vec![Hash {
            alg: HashAlgorithm::SHA_256,
            content: HashValue(checksum.to_owned()),
        }])
    });
    if !dependency.licenses.is_empty() {
        component.licenses = Some(Licenses(
            dependency
                .licenses
                .iter()
                .map(|license| license_choice(license))
                .collect(),
        ));
    }

    let metadata = Metadata {
        timestamp: DateTime::now().ok(),
        tools: Some(Tools::List(vec![Tool::new(
            "paketo-community",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        )])),
        ..Metadata::default()
    };

    let bom = Bom {
        metadata: Some(metadata),
        components: Some(Components(vec![component])),
        ..Bom::default()
    };

    let mut output = Vec::new();
    bom.output_as_json_v1_4(&mut output)?;
    Ok(output)
}

/// An SPDX license when `license` is a known identifier, a named license
/// otherwise (PyPI's `info.license` is free text).
fn license_choice(license: &str) -> LicenseChoice {
    let license = match SpdxIdentifier::try_from(license.to_owned()) {
        Ok(_) => License::license_id(license),
        Err(_) => License::named_license(license),
    };
    LicenseChoice::License(license)
}
