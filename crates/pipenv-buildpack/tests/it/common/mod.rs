// The `unreachable_pub` is to silence false positives in RustRover.
#![allow(dead_code, unreachable_pub)]

use std::path::{Path, PathBuf};

use pipenv_buildpack::config::LogLevel;
use pipenv_buildpack::printer::{Printer, PrinterBuffer};

/// Directory of the app fixtures.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Copy the fixture app `name` into a fresh temporary directory.
pub fn fixture_app(name: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in fs_err::read_dir(fixtures_dir().join(name)).unwrap() {
        let entry = entry.unwrap();
        fs_err::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

/// A printer recording its output, at the debug level.
pub fn printer() -> (Printer, PrinterBuffer) {
    Printer::buffered(LogLevel::Debug)
}
