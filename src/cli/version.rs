//! Version command.

use std::path::PathBuf;

use crate::cli::{open_store, output};
use crate::core::context::Context;
use crate::error::Result;

/// Print cellar's version and the versions of the store's backends.
pub fn execute(ctx: &Context, store: Option<PathBuf>) -> Result<()> {
    output::header(&format!("cellar {}", env!("CARGO_PKG_VERSION")));

    let store = open_store(store)?;
    output::kv("store ", store.path().display());
    output::kv(
        "crypto",
        format!("{} {}", store.crypto().name(), store.crypto_version(ctx)),
    );
    output::kv(
        "vcs   ",
        format!("{} {}", store.vcs().name(), store.vcs_version(ctx)),
    );
    Ok(())
}
