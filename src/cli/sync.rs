//! Sync commands - push and pull store history.

use std::path::PathBuf;

use crate::cli::{open_store, output};
use crate::core::context::Context;
use crate::error::Result;

/// Push `branch`, or the current branch when empty.
pub fn push(ctx: &Context, store: Option<PathBuf>, remote: &str, branch: &str) -> Result<()> {
    let store = open_store(store)?;
    store.push(ctx, remote, branch)?;
    output::success(&format!("pushed to {}", target(remote, branch)));
    Ok(())
}

/// Pull, then import keys of any recipients added upstream.
pub fn pull(ctx: &Context, store: Option<PathBuf>, remote: &str, branch: &str) -> Result<()> {
    let store = open_store(store)?;
    store.pull(ctx, remote, branch)?;
    output::success(&format!("pulled from {}", target(remote, branch)));

    let report = store.import_missing_public_keys(ctx)?;
    if !report.imported.is_empty() || !report.missing.is_empty() {
        output::import_report(&report);
    }
    Ok(())
}

fn target(remote: &str, branch: &str) -> String {
    if branch.is_empty() {
        remote.to_string()
    } else {
        format!("{}/{}", remote, branch)
    }
}
