//! Downloading dependency artifacts over HTTP.

use pipenv_buildpack::dependency::{
    Dependency, DependencyError, DependencyManager, DependencyService,
};
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTIFACT: &[u8] = b"pipenv-2023.12.1 source distribution";

async fn serve_artifact() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages/pipenv-2023.12.1.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ARTIFACT))
        .mount(&server)
        .await;
    server
}

fn dependency(server: &MockServer, checksum: String) -> Dependency {
    Dependency {
        id: "pipenv".to_owned(),
        version: "2023.12.1".to_owned(),
        uri: format!("{}/packages/pipenv-2023.12.1.tar.gz", server.uri()),
        checksum: Some(format!("sha256:{checksum}")),
        ..Dependency::default()
    }
}

/// Run a delivery off the async runtime, as the blocking client requires.
async fn deliver(
    dependency: Dependency,
) -> (tempfile::TempDir, Result<std::path::PathBuf, DependencyError>) {
    tokio::task::spawn_blocking(move || {
        let dest = tempfile::tempdir().unwrap();
        let service = DependencyService::new().unwrap();
        let result = service.deliver(&dependency, dest.path(), dest.path());
        (dest, result)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn http_artifact_is_verified_and_stored() {
    let server = serve_artifact().await;
    let checksum = format!("{:x}", Sha256::digest(ARTIFACT));

    let (dest, result) = deliver(dependency(&server, checksum)).await;

    let path = result.unwrap();
    assert_eq!(path, dest.path().join("pipenv-2023.12.1.tar.gz"));
    assert_eq!(fs_err::read(&path).unwrap(), ARTIFACT);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_checksum_mismatch_discards_the_artifact() {
    let server = serve_artifact().await;

    let (dest, result) = deliver(dependency(&server, "0".repeat(64))).await;

    let err = result.unwrap_err();
    assert!(
        matches!(err, DependencyError::ChecksumMismatch { ref expected, .. } if *expected == "0".repeat(64)),
        "got: {err}"
    );
    assert!(!dest.path().join("pipenv-2023.12.1.tar.gz").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn http_error_status_is_a_download_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_dest, result) = deliver(dependency(&server, "0".repeat(64))).await;

    assert!(matches!(result, Err(DependencyError::Download { .. })));
}
