//! Recipient commands.

use std::path::PathBuf;

use crate::cli::{open_store, output};
use crate::core::context::Context;
use crate::error::Result;

/// Print the recipients effective for `name`.
pub fn list(store: Option<PathBuf>, name: &str) -> Result<()> {
    let store = open_store(store)?;
    let ids = store.recipients(name)?;

    if ids.is_empty() {
        output::dimmed("no recipients");
        return Ok(());
    }

    let scope = if name.is_empty() { "store root" } else { name };
    output::header(&format!("Recipients for {}", scope));
    for id in ids {
        output::list_item(&output::name(&id));
    }
    Ok(())
}

pub fn add(ctx: &Context, store: Option<PathBuf>, subtree: &str, id: &str) -> Result<()> {
    let store = open_store(store)?;
    let report = store.add_recipient_at(ctx, subtree, id)?;
    output::success(&format!("added {}", output::name(id)));
    output::reencrypt_report(&report);
    Ok(())
}

pub fn rm(ctx: &Context, store: Option<PathBuf>, subtree: &str, id: &str) -> Result<()> {
    let store = open_store(store)?;
    let report = store.remove_recipient_at(ctx, subtree, id)?;
    output::success(&format!("removed {}", output::name(id)));
    output::reencrypt_report(&report);
    Ok(())
}

pub fn reencrypt(ctx: &Context, store: Option<PathBuf>, subtree: &str) -> Result<()> {
    let store = open_store(store)?;
    let report = store.reencrypt(ctx, subtree)?;
    output::reencrypt_report(&report);
    Ok(())
}

/// Import public keys of recipients the backend doesn't know yet.
pub fn import_keys(ctx: &Context, store: Option<PathBuf>) -> Result<()> {
    let store = open_store(store)?;
    let report = store.import_missing_public_keys(ctx)?;
    output::import_report(&report);
    Ok(())
}
