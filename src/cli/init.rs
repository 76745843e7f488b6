//! Init command - create a store.

use std::path::PathBuf;

use tracing::info;

use crate::cli::{crypto_backend, load_config, output, vcs_backend};
use crate::core::config::CryptoKind;
use crate::core::context::Context;
use crate::core::crypto::identity;
use crate::core::store::Store;
use crate::error::Result;

/// Initialize a store for `recipients`, or for the caller's own identities
/// when none are given. An age identity is generated if none exists yet.
pub fn execute(ctx: &Context, store: Option<PathBuf>, recipients: &[String]) -> Result<()> {
    let config = load_config(store)?;

    if config.crypto_kind()? == CryptoKind::Age && !config.age.identity.exists() {
        let generated = identity::generate(&config.age.identity)?;
        output::success(&format!(
            "generated identity {}",
            output::name(&generated.to_public().to_string())
        ));
    }

    let crypto = crypto_backend(&config)?;
    let ids = if recipients.is_empty() {
        crypto.list_private_identities(ctx)?
    } else {
        recipients.to_vec()
    };

    let vcs = vcs_backend(&config)?;
    let store = Store::init(ctx, &config.path, "", crypto, vcs, config.store.clone(), &ids)?;

    info!(path = %store.path().display(), "initialized");
    output::success(&format!("initialized store at {}", store.path().display()));
    for id in &ids {
        output::list_item(&output::name(id));
    }
    Ok(())
}
