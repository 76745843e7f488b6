//! Git versioning backend.
//!
//! Drives the git CLI in the store root. Every invocation goes through the
//! cancellable process runner, so a stuck push or pull is killed when the
//! context is cancelled.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::Versioning;
use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::core::process::{self, Output};
use crate::error::{Result, VcsError};

/// Git repository at a store root.
#[derive(Debug, Clone)]
pub struct Git {
    binary: PathBuf,
    root: PathBuf,
}

impl Git {
    /// Locate `git` on `PATH` for the repository at `root`.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::Unavailable` if git is not installed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let binary = which::which("git")
            .map_err(|_| VcsError::Unavailable("git CLI not found".to_string()))?;
        Ok(Self {
            binary,
            root: root.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-C").arg(&self.root);
        cmd.args(args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn run(&self, ctx: &Context, args: &[&str]) -> Result<Output> {
        debug!(args = ?args, "git");
        process::run(ctx, self.command(args), None)
    }

    fn run_checked(&self, ctx: &Context, args: &[&str]) -> Result<Output> {
        let output = self.run(ctx, args)?;
        if !output.success() {
            return Err(VcsError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: output.stderr_lossy(),
            }
            .into());
        }
        Ok(output)
    }

    /// `branch`, or the checked out branch when it is empty.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::CommandFailed` on a detached HEAD.
    fn branch_or_current(&self, ctx: &Context, branch: &str) -> Result<String> {
        if !branch.is_empty() {
            return Ok(branch.to_string());
        }
        let output = self.run_checked(ctx, &["symbolic-ref", "--short", "HEAD"])?;
        let current = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(branch = %current, "using current branch");
        Ok(current)
    }

    fn ensure_config(&self, ctx: &Context, key: &str, value: &str) -> Result<()> {
        let current = self.run(ctx, &["config", "--get", key])?;
        if current.success() && !current.stdout.is_empty() {
            return Ok(());
        }
        self.run_checked(ctx, &["config", key, value])?;
        Ok(())
    }
}

impl Versioning for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn is_initialized(&self) -> bool {
        self.root.join(".git").exists()
    }

    fn init(&self, ctx: &Context, user_name: &str, email: &str) -> Result<()> {
        if !self.is_initialized() {
            self.run_checked(ctx, &["init", "--quiet"])?;
            info!(root = %self.root.display(), "initialized git repository");
        }
        self.ensure_config(ctx, "user.name", user_name)?;
        self.ensure_config(ctx, "user.email", email)?;
        Ok(())
    }

    fn add(&self, ctx: &Context, paths: &[PathBuf]) -> Result<()> {
        if !self.is_initialized() {
            return Err(VcsError::NotInitialized(self.root.clone()).into());
        }
        if paths.is_empty() {
            return Ok(());
        }

        let relative: Vec<String> = paths
            .iter()
            .map(|p| {
                p.strip_prefix(&self.root)
                    .unwrap_or(p)
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        let mut args = vec!["add", "--all", "--"];
        args.extend(relative.iter().map(String::as_str));
        self.run_checked(ctx, &args)?;
        Ok(())
    }

    fn commit(&self, ctx: &Context, message: &str) -> Result<()> {
        if !self.is_initialized() {
            return Err(VcsError::NotInitialized(self.root.clone()).into());
        }

        // exit 0 means the index matches HEAD
        if self.run(ctx, &["diff", "--cached", "--quiet"])?.success() {
            debug!("nothing to commit");
            return Ok(());
        }

        self.run_checked(ctx, &["commit", "--quiet", "-m", message])?;
        debug!(message, "committed");
        Ok(())
    }

    fn push(&self, ctx: &Context, remote: &str, branch: &str) -> Result<()> {
        let branch = self.branch_or_current(ctx, branch)?;
        self.run_checked(ctx, &["push", remote, &branch])?;
        Ok(())
    }

    fn pull(&self, ctx: &Context, remote: &str, branch: &str) -> Result<()> {
        let branch = self.branch_or_current(ctx, branch)?;
        self.run_checked(ctx, &["pull", "--ff-only", remote, &branch])?;
        Ok(())
    }

    fn version(&self, ctx: &Context) -> BackendVersion {
        self.run(ctx, &["--version"])
            .ok()
            .filter(Output::success)
            .map(|o| BackendVersion::parse(&String::from_utf8_lossy(&o.stdout)))
            .unwrap_or(BackendVersion::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git(tmp: &TempDir) -> Option<Git> {
        match Git::new(tmp.path()) {
            Ok(git) => Some(git),
            Err(_) => {
                eprintln!("SKIPPED: git not installed");
                None
            }
        }
    }

    #[test]
    fn test_init_add_commit() {
        let tmp = TempDir::new().unwrap();
        let Some(git) = git(&tmp) else { return };
        let ctx = Context::background();

        assert!(!git.is_initialized());
        git.init(&ctx, "Test User", "test@example.com").unwrap();
        assert!(git.is_initialized());

        let file = tmp.path().join("foo.gpg");
        std::fs::write(&file, b"ciphertext").unwrap();
        git.add(&ctx, &[file.clone()]).unwrap();
        git.commit(&ctx, "Save secret to foo").unwrap();

        // second commit with nothing staged is fine
        git.commit(&ctx, "noop").unwrap();

        std::fs::remove_file(&file).unwrap();
        git.add(&ctx, &[file]).unwrap();
        git.commit(&ctx, "Remove foo").unwrap();

        let log = git.run_checked(&ctx, &["log", "--oneline"]).unwrap();
        assert_eq!(String::from_utf8_lossy(&log.stdout).lines().count(), 2);
    }

    #[test]
    fn test_add_requires_init() {
        let tmp = TempDir::new().unwrap();
        let Some(git) = git(&tmp) else { return };
        let err = git
            .add(&Context::background(), &[tmp.path().join("x")])
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BackendUnavailable);
    }

    #[test]
    fn test_empty_branch_is_current() {
        let tmp = TempDir::new().unwrap();
        let Some(git) = git(&tmp) else { return };
        let ctx = Context::background();
        git.init(&ctx, "Test User", "test@example.com").unwrap();
        git.run_checked(&ctx, &["checkout", "--quiet", "-b", "vault"]).unwrap();

        assert_eq!(git.branch_or_current(&ctx, "").unwrap(), "vault");
        assert_eq!(git.branch_or_current(&ctx, "other").unwrap(), "other");
    }

    #[test]
    fn test_version_known() {
        let tmp = TempDir::new().unwrap();
        let Some(git) = git(&tmp) else { return };
        assert!(git.version(&Context::background()).is_known());
    }
}
