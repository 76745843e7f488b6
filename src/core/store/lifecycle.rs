//! Versioning sync.

use tracing::info;

use super::Store;
use crate::core::context::Context;
use crate::error::Result;

impl Store {
    /// Publish local history to `remote`/`branch`. An empty `branch` is the
    /// current one.
    pub fn push(&self, ctx: &Context, remote: &str, branch: &str) -> Result<()> {
        ctx.check()?;
        self.vcs.push(ctx, remote, branch)?;
        info!(remote, branch, "pushed");
        Ok(())
    }

    /// Merge `remote`/`branch` into the store.
    ///
    /// Recipient lists may have changed upstream, so the cache is dropped.
    pub fn pull(&self, ctx: &Context, remote: &str, branch: &str) -> Result<()> {
        ctx.check()?;
        self.invalidate();
        self.vcs.pull(ctx, remote, branch)?;
        self.invalidate();
        info!(remote, branch, "pulled");
        Ok(())
    }
}
