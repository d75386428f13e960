use crate::common::retrieval_command;

#[test]
fn help_lists_options() {
    let mut cmd = retrieval_command();
    cmd.arg("--help");

    let output = cmd.output().expect("Failed to execute pipenv-retrieval");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.starts_with(
        "Generate buildpack.toml dependency metadata for new Pipenv releases."
    ));
    for option in ["--buildpack-toml", "--output", "--pypi-url", "--verbose"] {
        assert!(stdout.contains(option), "missing {option} in: {stdout}");
    }
}

#[test]
fn output_is_required() {
    let output = retrieval_command()
        .output()
        .expect("Failed to execute pipenv-retrieval");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("--output <PATH>"), "got: {stderr}");
}
