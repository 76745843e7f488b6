//! Command helper methods for Test.

use std::process::Output;

use assert_cmd::Command;

use super::Test;

impl Test {
    /// Create a cellar command bound to this environment.
    ///
    /// Returns a Command configured with:
    /// - CELLAR_CONFIG pointing at the temp config file
    /// - HOME set to the temporary home directory
    /// - colors and log filters cleared
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("cellar").expect("failed to find cellar binary");
        cmd.env("CELLAR_CONFIG", self.config_path());
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("CELLAR_LOG");
        cmd.env_remove("CELLAR_STORE");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `cellar init [recipients]`.
    pub fn init_cmd(&self, recipients: &[&str]) -> Output {
        self.cmd()
            .arg("init")
            .args(recipients)
            .output()
            .expect("failed to run cellar init")
    }

    /// Shortcut for `cellar insert`, value piped on stdin.
    pub fn insert(&self, name: &str, value: &str) -> Output {
        self.cmd()
            .args(["insert", name])
            .write_stdin(format!("{}\n", value))
            .output()
            .expect("failed to run cellar insert")
    }

    /// Shortcut for `cellar show`.
    pub fn show(&self, name: &str) -> Output {
        self.cmd()
            .args(["show", name])
            .output()
            .expect("failed to run cellar show")
    }

    /// Shortcut for `cellar ls`.
    pub fn ls(&self) -> Output {
        self.cmd()
            .arg("ls")
            .output()
            .expect("failed to run cellar ls")
    }

    /// Shortcut for `cellar ls --json`.
    pub fn ls_json(&self) -> Output {
        self.cmd()
            .args(["ls", "--json"])
            .output()
            .expect("failed to run cellar ls --json")
    }

    /// Shortcut for `cellar rm`.
    pub fn rm(&self, name: &str) -> Output {
        self.cmd()
            .args(["rm", name])
            .output()
            .expect("failed to run cellar rm")
    }

    /// Shortcut for `cellar recipients ...`.
    pub fn recipients(&self, args: &[&str]) -> Output {
        self.cmd()
            .arg("recipients")
            .args(args)
            .output()
            .expect("failed to run cellar recipients")
    }
}
