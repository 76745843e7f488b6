//! Cellar - a git-native, recipient-scoped encrypted secret store.
//!
//! A store is a directory of individually encrypted entries. Each entry is
//! encrypted for the recipients listed in the nearest recipient file above
//! it, and every change is recorded by a versioning backend.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line front-end
//! │   ├── init          # Create a store
//! │   ├── secrets       # ls, show, insert, rm, mv, cp
//! │   ├── recipients    # Recipient management, re-encryption, key import
//! │   ├── sync          # push / pull
//! │   ├── version       # Backend versions
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── store/        # Sub-store engine
//!     ├── tree          # Entry names <-> files
//!     ├── recipients    # Recipient lists, key exchange
//!     ├── crypto/       # Encryption backends
//!     │   ├── mod       # Crypto trait
//!     │   ├── age       # age (x25519)
//!     │   ├── gpg       # gpg CLI
//!     │   └── mock      # Test double
//!     ├── vcs/          # Versioning backends (git, noop)
//!     ├── context       # Cancellation
//!     ├── process       # Cancellable subprocesses
//!     ├── domain/       # Secret, reports, versions
//!     └── config        # config.toml, store options
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cellar::core::config::StoreOptions;
//! use cellar::core::context::Context;
//! use cellar::core::crypto::Mock;
//! use cellar::core::domain::Secret;
//! use cellar::core::store::Store;
//! use cellar::core::vcs::Noop;
//!
//! # fn main() -> cellar::error::Result<()> {
//! let ctx = Context::background();
//! let store = Store::init(
//!     &ctx,
//!     "/tmp/cellar-example",
//!     "",
//!     Arc::new(Mock::new()),
//!     Arc::new(Noop),
//!     StoreOptions::default(),
//!     &["alice@example.com".to_string()],
//! )?;
//!
//! store.set(&ctx, "web/github", &Secret::new("hunter2", ""))?;
//! assert_eq!(store.list("")?, vec!["web/github"]);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::context::Context;
pub use crate::core::domain::Secret;
pub use crate::core::store::Store;
pub use crate::error::{Error, ErrorKind, Result};
