use crate::common::retrieval_command;

#[test]
fn version_flag_shows_version() {
    let mut cmd = retrieval_command();
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute pipenv-retrieval");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.starts_with("pipenv-retrieval "),
        "Expected version string starting with 'pipenv-retrieval ', got: {stdout}"
    );
}
