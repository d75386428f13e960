use indoc::indoc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{INSTA_FILTERS, retrieval_command};
use crate::retrieval_snapshot;

#[test]
fn missing_buildpack_toml() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = retrieval_command();
    cmd.current_dir(dir.path())
        .args(["--output", "metadata.json"]);

    retrieval_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    error: failed to read `buildpack.toml`
      Caused by: failed to open file `buildpack.toml`: No such file or directory (os error 2)
    ");

    assert!(!dir.path().join("metadata.json").exists());
}

#[test]
fn malformed_buildpack_toml() {
    let dir = tempfile::tempdir().unwrap();
    fs_err::write(dir.path().join("buildpack.toml"), "[metadata\n").unwrap();
    let mut cmd = retrieval_command();
    cmd.current_dir(dir.path())
        .args(["--output", "metadata.json"]);

    let output = cmd.output().expect("Failed to execute pipenv-retrieval");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr.starts_with("error: failed to parse `buildpack.toml`"),
        "got: {stderr}"
    );
}

#[test]
fn unreachable_index() {
    let dir = tempfile::tempdir().unwrap();
    fs_err::write(dir.path().join("buildpack.toml"), "api = \"0.10\"\n").unwrap();
    let mut cmd = retrieval_command();
    cmd.current_dir(dir.path())
        .args(["--output", "metadata.json", "--pypi-url", "http://127.0.0.1:9"]);

    let output = cmd.output().expect("Failed to execute pipenv-retrieval");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr.contains("error: failed to fetch `http://127.0.0.1:9/pipenv/json`"),
        "got: {stderr}"
    );
}

async fn pypi_server() -> MockServer {
    let server = MockServer::start().await;
    let files = |version: &str, sha256: &str| {
        json!([
            {
                "packagetype": "bdist_wheel",
                "url": format!("https://files.example.com/pipenv-{version}-py3-none-any.whl"),
                "digests": {"sha256": "ffff"}
            },
            {
                "packagetype": "sdist",
                "url": format!("https://files.example.com/pipenv-{version}.tar.gz"),
                "digests": {"sha256": sha256}
            }
        ])
    };

    Mock::given(method("GET"))
        .and(path("/pipenv/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {"license": "MIT", "classifiers": []},
            "releases": {
                "2023.10.24": files("2023.10.24", "aaaa"),
                "2023.11.15": files("2023.11.15", "bbbb"),
                "2023.11.17": files("2023.11.17", "cccc"),
                "2023.12.1": files("2023.12.1", "dddd")
            }
        })))
        .mount(&server)
        .await;

    for version in ["2023.11.17", "2023.11.15"] {
        Mock::given(method("GET"))
            .and(path(format!("/pipenv/{version}/json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "info": {
                    "license": "MIT License",
                    "classifiers": ["License :: OSI Approved :: MIT License"]
                },
                "releases": {}
            })))
            .mount(&server)
            .await;
    }

    server
}

#[tokio::test(flavor = "multi_thread")]
async fn writes_metadata_for_new_releases() {
    let server = pypi_server().await;
    let dir = tempfile::tempdir().unwrap();
    fs_err::write(
        dir.path().join("buildpack.toml"),
        indoc! {r#"
            api = "0.10"

            [[metadata.dependencies]]
            id = "pipenv"
            version = "2023.12.1"
            uri = "https://files.example.com/pipenv-2023.12.1.tar.gz"
            checksum = "sha256:dddd"

            [[metadata.dependency-constraints]]
            id = "pipenv"
            constraint = "2023.11.*"
            patches = 2
        "#},
    )
    .unwrap();

    let mut cmd = retrieval_command();
    cmd.current_dir(dir.path())
        .args(["--output", "metadata.json", "--pypi-url"])
        .arg(server.uri());

    let output = cmd.output().expect("Failed to execute pipenv-retrieval");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let metadata = fs_err::read_to_string(dir.path().join("metadata.json")).unwrap();
    insta::assert_snapshot!(metadata, @r#"
    [
      {
        "id": "pipenv",
        "name": "Pipenv",
        "version": "2023.11.17",
        "uri": "https://files.example.com/pipenv-2023.11.17.tar.gz",
        "checksum": "sha256:cccc",
        "source": "https://files.example.com/pipenv-2023.11.17.tar.gz",
        "source-checksum": "sha256:cccc",
        "stacks": [
          "*"
        ],
        "cpe": "cpe:2.3:a:python-pipenv:pipenv:2023.11.17:*:*:*:*:python:*:*",
        "purl": "pkg:generic/pipenv@2023.11.17?checksum=cccc&download_url=https://files.example.com/pipenv-2023.11.17.tar.gz",
        "licenses": [
          "MIT License"
        ]
      },
      {
        "id": "pipenv",
        "name": "Pipenv",
        "version": "2023.11.15",
        "uri": "https://files.example.com/pipenv-2023.11.15.tar.gz",
        "checksum": "sha256:bbbb",
        "source": "https://files.example.com/pipenv-2023.11.15.tar.gz",
        "source-checksum": "sha256:bbbb",
        "stacks": [
          "*"
        ],
        "cpe": "cpe:2.3:a:python-pipenv:pipenv:2023.11.15:*:*:*:*:python:*:*",
        "purl": "pkg:generic/pipenv@2023.11.15?checksum=bbbb&download_url=https://files.example.com/pipenv-2023.11.15.tar.gz",
        "licenses": [
          "MIT License"
        ]
      }
    ]
    "#);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("New version: 2023.11.17"), "got: {stderr}");
    assert!(stderr.contains("New version: 2023.11.15"), "got: {stderr}");
}
