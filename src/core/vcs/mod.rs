//! Versioning backends.
//!
//! The store reports every file it touches to a [`Versioning`] backend and
//! asks it to commit. Serializing concurrent writers (git's index lock,
//! commit conflicts) is the backend's job, not the store's.

use std::path::PathBuf;

use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::error::Result;

mod git;
mod noop;

pub use git::Git;
pub use noop::Noop;

/// Versioning backend capability.
pub trait Versioning: Send + Sync {
    /// Backend name for display/config.
    fn name(&self) -> &'static str;

    /// Whether the store root is under version control.
    fn is_initialized(&self) -> bool;

    /// Put the store root under version control.
    fn init(&self, ctx: &Context, user_name: &str, email: &str) -> Result<()>;

    /// Track changes (additions, modifications, removals) to `paths`.
    fn add(&self, ctx: &Context, paths: &[PathBuf]) -> Result<()>;

    /// Record tracked changes. Nothing to commit is not an error.
    fn commit(&self, ctx: &Context, message: &str) -> Result<()>;

    /// Publish commits to `remote`/`branch`. An empty `branch` means the
    /// currently checked out one.
    fn push(&self, ctx: &Context, remote: &str, branch: &str) -> Result<()>;

    /// Fetch and merge `remote`/`branch`, with the same empty-branch rule
    /// as [`Versioning::push`].
    fn pull(&self, ctx: &Context, remote: &str, branch: &str) -> Result<()>;

    /// Version of the underlying tool.
    fn version(&self, ctx: &Context) -> BackendVersion;
}
