//! Output formatting for the buildpack phases.
//!
//! The [`Printer`] writes the indented, human-readable build log that the
//! lifecycle streams to the user. Lines are grouped in four levels (title,
//! process, subprocess, action) so that each phase of the build reads as a
//! nested outline. Debug lines only appear when `BP_LOG_LEVEL=DEBUG`.

use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anstream::{eprintln, println};
use jiff::{SignedDuration, Timestamp};
use owo_colors::OwoColorize;

use crate::config::LogLevel;
use crate::dependency::Dependency;
use crate::plan::PlanEntry;

/// Deprecation warnings start this long before the deprecation date.
const DEPRECATION_WINDOW: SignedDuration = SignedDuration::from_hours(30 * 24);

#[derive(Clone)]
enum Sink {
    Stdout,
    Stderr,
    Buffer(Arc<Mutex<String>>),
}

/// Controls output formatting for the buildpack.
#[derive(Clone)]
pub struct Printer {
    sink: Sink,
    level: LogLevel,
}

/// In-memory copy of everything a buffered [`Printer`] emitted.
#[derive(Clone, Default)]
pub struct PrinterBuffer(Arc<Mutex<String>>);

impl PrinterBuffer {
    /// The emitted output, with ANSI styling removed.
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Printer {
    /// A printer writing to stdout, where the lifecycle collects build logs.
    pub fn stdout(level: LogLevel) -> Self {
        Self {
            sink: Sink::Stdout,
            level,
        }
    }

    /// A printer writing to stderr.
    pub fn stderr(level: LogLevel) -> Self {
        Self {
            sink: Sink::Stderr,
            level,
        }
    }

    /// A printer that records its output in memory.
    pub fn buffered(level: LogLevel) -> (Self, PrinterBuffer) {
        let buffer = PrinterBuffer::default();
        let printer = Self {
            sink: Sink::Buffer(Arc::clone(&buffer.0)),
            level,
        };
        (printer, buffer)
    }

    fn emit(&self, line: &str) {
        match &self.sink {
            Sink::Stdout => println!("{line}"),
            Sink::Stderr => eprintln!("{line}"),
            Sink::Buffer(buffer) => {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(buffer, "{}", anstream::adapter::strip_str(line));
            }
        }
    }

    /// Top-level heading, e.g. the buildpack name and version.
    pub fn title(&self, message: &str) {
        self.emit(&message.bold().to_string());
    }

    /// A step of the current phase.
    pub fn process(&self, message: &str) {
        self.emit(&format!("  {message}"));
    }

    /// A detail of the current step.
    pub fn subprocess(&self, message: &str) {
        self.emit(&format!("    {message}"));
    }

    /// The outcome of a subprocess, e.g. its duration.
    pub fn action(&self, message: &str) {
        self.emit(&format!("      {message}"));
    }

    /// An empty separator line.
    pub fn break_line(&self) {
        self.emit("");
    }

    /// An informational message without indentation.
    pub fn info(&self, message: &str) {
        self.emit(message);
    }

    /// A warning, indented at the process level.
    pub fn warn(&self, message: &str) {
        self.emit(&format!("  {}: {message}", "warning".yellow().bold()));
    }

    /// An error message.
    pub fn error(&self, message: &str) {
        self.emit(&format!("{}: {message}", "error".red().bold()));
    }

    /// Print a debug message (only at `BP_LOG_LEVEL=DEBUG`).
    pub fn debug(&self, message: &str) {
        if self.level == LogLevel::Debug {
            self.emit(&format!("  {}: {message}", "debug".dimmed()));
        }
    }

    /// Print an error followed by every cause in its source chain.
    pub fn error_chain(&self, error: &dyn Error) {
        self.error(&error.to_string());
        let mut source = error.source();
        while let Some(cause) = source {
            self.emit(&format!(
                "  {}: {}",
                "Caused by".red().bold(),
                cause.to_string().trim()
            ));
            source = cause.source();
        }
    }

    /// List the plan entries that asked for a version, in priority order.
    pub fn candidates(&self, entries: &[&PlanEntry]) {
        if entries.is_empty() {
            return;
        }

        self.subprocess("Candidate version sources (in priority order):");

        let sources: Vec<&str> = entries
            .iter()
            .map(|entry| display_source(&entry.version_source))
            .collect();
        let width = sources.iter().map(|source| source.len()).max().unwrap_or(0);

        for (entry, source) in entries.iter().zip(sources) {
            self.action(&format!("{source:<width$} -> \"{}\"", entry.version));
        }

        self.break_line();
    }

    /// Announce the dependency picked for the plan entry, warning when the
    /// dependency is (or is about to be) deprecated.
    pub fn selected_dependency(&self, entry: &PlanEntry, dependency: &Dependency, now: Timestamp) {
        self.subprocess(&format!(
            "Selected {} version (using {}): {}",
            dependency.display_name(),
            display_source(&entry.version_source),
            dependency.version
        ));

        if let Some(deprecation) = dependency.deprecation_timestamp() {
            let name = dependency.display_name();
            if deprecation <= now {
                self.action(&format!(
                    "Version {} of {name} is deprecated.",
                    dependency.version
                ));
                self.action(&format!(
                    "Migrate your application to a supported version of {name}."
                ));
            } else if now
                .checked_add(DEPRECATION_WINDOW)
                .is_ok_and(|limit| deprecation <= limit)
            {
                self.action(&format!(
                    "Version {} of {name} will be deprecated after {}.",
                    dependency.version,
                    deprecation.strftime("%Y-%m-%d")
                ));
                self.action(&format!(
                    "Migrate your application to a supported version of {name} before this time."
                ));
            }
        }

        self.break_line();
    }

    /// Describe the environment variables a layer contributes.
    ///
    /// Each variable is prepended to its existing value with `:`; the build
    /// and launch sections are only shown for the scopes the layer is
    /// available in.
    pub fn environment_variables(&self, prepend: &[(&str, &Path)], build: bool, launch: bool) {
        let scopes = [("build", build), ("launch", launch)];
        for (scope, enabled) in scopes {
            if !enabled {
                continue;
            }
            self.process(&format!("Configuring {scope} environment"));
            for (name, value) in prepend {
                self.subprocess(&format!("{name} -> \"{}:${name}\"", value.display()));
            }
            self.break_line();
        }
    }
}

fn display_source(source: &str) -> &str {
    if source.is_empty() {
        "<unknown>"
    } else {
        source
    }
}
