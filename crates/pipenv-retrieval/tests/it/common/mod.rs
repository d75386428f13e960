// The `unreachable_pub` is to silence false positives in RustRover.
#![allow(dead_code, unreachable_pub)]

use std::path::PathBuf;
use std::process::Command;

/// Insta snapshot filters shared across pipenv-retrieval tests.
pub const INSTA_FILTERS: &[(&str, &str)] = &[
    // Temporary directories
    (r"/[^\s`]*/\.tmp[\w]+", "[TEMP_DIR]"),
    // Version display
    (
        r"pipenv-retrieval \d+\.\d+\.\d+(-(alpha|beta|rc)\.\d+)?",
        r"pipenv-retrieval [VERSION]",
    ),
    // Trim end-of-line whitespaces
    (r"([^\s])[ \t]+(\r?\n)", "$1$2"),
];

/// Returns the pipenv-retrieval binary that cargo built before launching the tests.
pub fn get_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pipenv-retrieval"))
}

/// Create a `pipenv-retrieval` command for testing.
pub fn retrieval_command() -> Command {
    let mut command = Command::new(get_bin());
    command.env_remove("PIPENV_RETRIEVAL_PYPI_URL");
    command.env_remove("RUST_LOG");
    command.env("NO_COLOR", "1");
    command
}

/// Snapshot test helper macro. Runs a command and asserts against an insta snapshot.
#[macro_export]
macro_rules! retrieval_snapshot {
    ($filters:expr, $command:expr, @$expected:literal) => {{
        let output = $command
            .output()
            .expect("Failed to execute pipenv-retrieval");
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let mut combined = format!(
            "success: {:?}\nexit_code: {}\n----- stdout -----\n{}\n----- stderr -----\n{}",
            output.status.success(),
            output.status.code().unwrap_or(-1),
            stdout.trim(),
            stderr.trim(),
        );

        for (pattern, replacement) in $filters.iter() {
            let re = regex::Regex::new(pattern).expect("Invalid filter regex");
            combined = re.replace_all(&combined, *replacement).to_string();
        }

        insta::assert_snapshot!(combined, @$expected);
    }};
}
