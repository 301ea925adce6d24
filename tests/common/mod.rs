//! Shared integration-test harness for running the `deployconf` binary and
//! locating fixtures.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Runs the compiled `deployconf` binary as a child process.
pub struct DeployConfProcess;

impl DeployConfProcess {
    /// Runs `deployconf` with `args` and waits for it to exit.
    ///
    /// Logging is pinned to `warn` so stray `DEPLOYCONF_LOG_LEVEL` settings
    /// don't leak into assertions on stderr.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_deployconf"))
            .args(args)
            .env("DEPLOYCONF_LOG_LEVEL", "warn")
            .env_remove("DEPLOYCONF_CONFIG")
            .output()
            .expect("failed to run deployconf")
    }

    /// Runs `deployconf` with `args` against the fixture `name` passed via `--config`.
    #[allow(clippy::missing_panics_doc)]
    pub fn with_config(name: &str, args: &[&str]) -> Output {
        let path = Self::fixture_path(name);
        let path = path.to_str().expect("non-UTF-8 fixture path");
        let mut full: Vec<&str> = args.to_vec();
        full.extend(["--config", path]);
        Self::spawn_command(&full)
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Writes `contents` to `name` inside `dir` and returns the full path.
    #[allow(clippy::missing_panics_doc)]
    pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("failed to write temp config");
        path
    }
}

/// Lossy stdout/stderr helpers for assertions.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
