//! Subprocess execution.
//!
//! The install, site and lock processes only describe *what* to run; the
//! [`Executable`] seam runs it, which lets tests substitute a fake.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// A single invocation of an executable.
#[derive(Debug, Default, Clone)]
pub struct Execution {
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Variables added on top of the inherited process environment.
    pub env: Vec<(OsString, OsString)>,
    /// Working directory, defaulting to the current one.
    pub dir: Option<PathBuf>,
}

impl Execution {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        err: std::io::Error,
    },
    #[error("`{program}` exited with {}", exit_code(*code))]
    Failed {
        program: String,
        code: Option<i32>,
        output: String,
    },
}

fn exit_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_owned(),
    }
}

impl ExecutionError {
    /// Output captured before the failure, empty when the program never ran.
    pub fn output(&self) -> &str {
        match self {
            Self::Spawn { .. } => "",
            Self::Failed { output, .. } => output,
        }
    }
}

/// What a successful execution wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an [`Execution`] and returns its captured output.
///
/// On failure the error carries stdout followed by stderr.
pub trait Executable {
    fn execute(&self, execution: &Execution) -> Result<Output, ExecutionError>;
}

/// An [`Executable`] backed by a program on the `PATH`.
#[derive(Debug, Clone)]
pub struct CommandExecutable {
    program: String,
}

impl CommandExecutable {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl fmt::Display for CommandExecutable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)
    }
}

impl Executable for CommandExecutable {
    fn execute(&self, execution: &Execution) -> Result<Output, ExecutionError> {
        let mut command = Command::new(&self.program);
        command.args(&execution.args);
        for (key, value) in &execution.env {
            command.env(key, value);
        }
        if let Some(dir) = &execution.dir {
            command.current_dir(dir);
        }

        tracing::debug!(program = %self.program, args = ?execution.args, "Running subprocess");

        let output = command.output().map_err(|err| ExecutionError::Spawn {
            program: self.program.clone(),
            err,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(Output { stdout, stderr })
        } else {
            Err(ExecutionError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                output: stdout + &stderr,
            })
        }
    }
}
