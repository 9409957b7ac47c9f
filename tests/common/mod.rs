//! Common test utilities for timebox integration tests.
//!
//! Provides `TestEnv`, an isolated data directory so tests never touch
//! the user's `~/.timebox/`.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with its own data directory and user.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the tb binary acting as user `ana`.
    ///
    /// Sets `TIMEBOX_DIR` per-command for parallel safety.
    pub fn tb(&self) -> Command {
        self.tb_as("ana")
    }

    pub fn tb_as(&self, user: &str) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tb"));
        cmd.env("TIMEBOX_DIR", self.data_dir.path());
        cmd.env("TIMEBOX_USER", user);
        cmd.env_remove("TIMEBOX_LOG");
        cmd
    }

    pub fn store_path(&self) -> std::path::PathBuf {
        self.data_dir.path().join("tasks.json")
    }

    /// Parsed JSON output of a successful command.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.tb().args(args).output().unwrap();
        assert!(output.status.success(), "{args:?} failed: {output:?}");
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
