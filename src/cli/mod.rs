//! Command-line interface.
//!
//! A thin front-end over one [`Store`]: it reads the config, builds the
//! backends it names and calls the engine.

pub mod completions;
pub mod init;
pub mod output;
pub mod recipients;
pub mod secrets;
pub mod sync;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::core::config::{Config, CryptoKind, VcsKind};
use crate::core::context::Context;
use crate::core::crypto::{Age, Crypto};
use crate::core::store::Store;
use crate::core::vcs::{Git, Noop, Versioning};
use crate::error::Result;

/// Cellar - a git-native, recipient-scoped encrypted secret store.
#[derive(Parser)]
#[command(
    name = "cellar",
    about = "A git-native, recipient-scoped encrypted secret store",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store root, overriding the config file
    #[arg(long, global = true, env = "CELLAR_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create a new store
    Init {
        /// Recipients of the store (defaults to your own identities)
        recipients: Vec<String>,
    },

    /// List entries
    #[command(alias = "list")]
    Ls {
        /// Subtree to list
        prefix: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decrypt and print an entry
    Show {
        /// Entry name (e.g. web/github)
        name: String,
        /// Print only the password line
        #[arg(short, long)]
        password: bool,
    },

    /// Store an entry, prompting on a terminal or reading stdin otherwise
    Insert {
        /// Entry name
        name: String,
        /// Read the whole of stdin instead of a single line
        #[arg(short, long)]
        multiline: bool,
    },

    /// Remove an entry
    Rm {
        /// Entry or subtree name
        name: String,
        /// Remove a whole subtree
        #[arg(short, long)]
        recursive: bool,
    },

    /// Move an entry or subtree
    Mv {
        from: String,
        to: String,
    },

    /// Copy an entry or subtree
    Cp {
        from: String,
        to: String,
    },

    /// Manage recipients
    Recipients {
        #[command(subcommand)]
        action: Option<RecipientsAction>,
    },

    /// Re-encrypt entries for their current recipients
    Reencrypt {
        /// Subtree to re-encrypt (defaults to the whole store)
        subtree: Option<String>,
    },

    /// Import recipients' public keys exported into the store
    ImportKeys,

    /// Show backend versions
    Version,

    /// Push store history to a remote
    Push {
        #[arg(default_value = "origin")]
        remote: String,
        /// Branch to push, defaults to the current one
        branch: Option<String>,
    },

    /// Pull store history from a remote
    Pull {
        #[arg(default_value = "origin")]
        remote: String,
        /// Branch to pull, defaults to the current one
        branch: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Recipient subcommands.
#[derive(Subcommand)]
pub enum RecipientsAction {
    /// List effective recipients
    List {
        /// Entry or subtree (defaults to the store root)
        name: Option<String>,
    },

    /// Add a recipient and re-encrypt the entries it should read
    Add {
        /// Recipient id (age public key or GPG fingerprint/email)
        id: String,
        /// Edit the recipient list governing this subtree
        #[arg(long, default_value = "")]
        subtree: String,
    },

    /// Remove a recipient and re-encrypt without them
    Rm {
        /// Recipient id
        id: String,
        /// Edit the recipient list governing this subtree
        #[arg(long, default_value = "")]
        subtree: String,
    },
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let ctx = Context::background();
    let store_path = cli.store;

    match cli.command {
        Init { recipients } => init::execute(&ctx, store_path, &recipients),
        Ls { prefix, json } => secrets::list(store_path, prefix.as_deref().unwrap_or(""), json),
        Show { name, password } => secrets::show(&ctx, store_path, &name, password),
        Insert { name, multiline } => secrets::insert(&ctx, store_path, &name, multiline),
        Rm { name, recursive } => secrets::rm(&ctx, store_path, &name, recursive),
        Mv { from, to } => secrets::mv(&ctx, store_path, &from, &to),
        Cp { from, to } => secrets::cp(&ctx, store_path, &from, &to),
        Recipients { action } => match action.unwrap_or(RecipientsAction::List { name: None }) {
            RecipientsAction::List { name } => {
                recipients::list(store_path, name.as_deref().unwrap_or(""))
            }
            RecipientsAction::Add { id, subtree } => {
                recipients::add(&ctx, store_path, &subtree, &id)
            }
            RecipientsAction::Rm { id, subtree } => recipients::rm(&ctx, store_path, &subtree, &id),
        },
        Reencrypt { subtree } => {
            recipients::reencrypt(&ctx, store_path, subtree.as_deref().unwrap_or(""))
        }
        ImportKeys => recipients::import_keys(&ctx, store_path),
        Version => version::execute(&ctx, store_path),
        Push { remote, branch } => {
            sync::push(&ctx, store_path, &remote, branch.as_deref().unwrap_or(""))
        }
        Pull { remote, branch } => {
            sync::pull(&ctx, store_path, &remote, branch.as_deref().unwrap_or(""))
        }
        Completions { shell } => completions::execute(shell),
    }
}

/// Load the config, applying a `--store` override.
pub(crate) fn load_config(store: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(path) = store {
        config.path = path;
    }
    Ok(config)
}

/// Open the configured store.
pub(crate) fn open_store(store: Option<PathBuf>) -> Result<Store> {
    let config = load_config(store)?;
    let crypto = crypto_backend(&config)?;
    let vcs = vcs_backend(&config)?;
    Store::open_with(&config.path, "", crypto, vcs, config.store.clone())
}

pub(crate) fn crypto_backend(config: &Config) -> Result<Arc<dyn Crypto>> {
    match config.crypto_kind()? {
        CryptoKind::Age => {
            let age = Age::from_identity_file(&config.age.identity)?
                .with_keyring(&config.age.keyring)?;
            Ok(Arc::new(age))
        }
        CryptoKind::Gpg => gpg_backend(),
    }
}

#[cfg(feature = "gpg")]
fn gpg_backend() -> Result<Arc<dyn Crypto>> {
    Ok(Arc::new(crate::core::crypto::Gpg::new()?))
}

#[cfg(not(feature = "gpg"))]
fn gpg_backend() -> Result<Arc<dyn Crypto>> {
    Err(crate::error::CipherError::Unavailable("built without the gpg feature".to_string()).into())
}

pub(crate) fn vcs_backend(config: &Config) -> Result<Arc<dyn Versioning>> {
    match config.vcs_kind()? {
        VcsKind::Git => Ok(Arc::new(Git::new(&config.path)?)),
        VcsKind::Noop => Ok(Arc::new(Noop)),
    }
}
