//! Sub-store engine.
//!
//! A [`Store`] owns one store root and composes the secret tree, the
//! recipient manager and the two injected backends into the public
//! operations. Every mutation is written atomically, then reported to the
//! versioning backend.

mod lifecycle;
mod recipients;
mod secrets;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::core::config::StoreOptions;
use crate::core::context::Context;
use crate::core::crypto::Crypto;
use crate::core::domain::BackendVersion;
use crate::core::recipients::Recipients;
use crate::core::tree::Tree;
use crate::core::types::RecipientId;
use crate::core::vcs::Versioning;
use crate::error::{ConfigError, Error, RecipientError, Result, VcsError};

/// One mounted store root.
pub struct Store {
    alias: String,
    path: PathBuf,
    crypto: Arc<dyn Crypto>,
    vcs: Arc<dyn Versioning>,
    tree: Tree,
    recipients: Recipients,
    options: StoreOptions,
    cache: Mutex<BTreeMap<PathBuf, Vec<RecipientId>>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("alias", &self.alias)
            .field("path", &self.path)
            .field("crypto", &self.crypto.name())
            .field("vcs", &self.vcs.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Store {
    /// Open the store at `root` with default options.
    ///
    /// # Arguments
    ///
    /// * `root` - Store root directory
    /// * `alias` - Mount name, empty for the root mount
    /// * `crypto` - Encryption backend
    /// * `vcs` - Versioning backend
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotADirectory` if `root` is not a directory.
    pub fn open(
        root: impl Into<PathBuf>,
        alias: &str,
        crypto: Arc<dyn Crypto>,
        vcs: Arc<dyn Versioning>,
    ) -> Result<Self> {
        Self::open_with(root, alias, crypto, vcs, StoreOptions::default())
    }

    /// Open the store at `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotADirectory` if `root` is not a directory and
    /// `VcsError::NotInitialized` if `options.require_versioning` is set and
    /// the versioning backend is not initialized.
    pub fn open_with(
        root: impl Into<PathBuf>,
        alias: &str,
        crypto: Arc<dyn Crypto>,
        vcs: Arc<dyn Versioning>,
        options: StoreOptions,
    ) -> Result<Self> {
        let path = root.into();
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory(path).into());
        }
        if options.require_versioning && !vcs.is_initialized() {
            return Err(VcsError::NotInitialized(path).into());
        }

        debug!(
            alias,
            path = %path.display(),
            crypto = crypto.name(),
            vcs = vcs.name(),
            "store opened"
        );

        Ok(Self {
            alias: alias.to_string(),
            tree: Tree::new(&path, crypto.ext()),
            recipients: Recipients::new(&path, crypto.id_file()),
            path,
            crypto,
            vcs,
            options,
            cache: Mutex::new(BTreeMap::new()),
        })
    }

    /// Create a store at `root` for `ids`.
    ///
    /// Creates the directory, initializes versioning if needed, writes the
    /// root recipient list, exports the recipients' public keys and commits.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::NoRecipients` if `ids` is empty.
    pub fn init(
        ctx: &Context,
        root: impl Into<PathBuf>,
        alias: &str,
        crypto: Arc<dyn Crypto>,
        vcs: Arc<dyn Versioning>,
        options: StoreOptions,
        ids: &[RecipientId],
    ) -> Result<Self> {
        ctx.check()?;
        let root = root.into();
        if ids.is_empty() {
            return Err(RecipientError::NoRecipients(root.display().to_string()).into());
        }

        std::fs::create_dir_all(&root)?;
        if !vcs.is_initialized() {
            let (user, email) = default_author();
            vcs.init(ctx, &user, &email)?;
        }

        let store = Self::open_with(root, alias, crypto, vcs, options)?;
        let file = store.recipients.save(ids, &store.path, false)?;

        let mut paths = vec![file];
        let exported = if store.options.export_keys {
            store.export_keys(ctx, ids)
        } else {
            Ok(Vec::new())
        };
        let result = exported.map(|keys| paths.extend(keys));
        store.commit_outcome(
            ctx,
            result,
            &paths,
            &format!("Initialized Store for {}", ids.join(", ")),
        )?;
        info!(path = %store.path.display(), recipients = ids.len(), "store initialized");
        Ok(store)
    }

    /// Mount name, empty for the root mount.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Store root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn crypto(&self) -> &dyn Crypto {
        self.crypto.as_ref()
    }

    pub fn vcs(&self) -> &dyn Versioning {
        self.vcs.as_ref()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Version of the encryption backend. Never fails; an unreachable
    /// backend reports [`BackendVersion::Unknown`].
    pub fn crypto_version(&self, ctx: &Context) -> BackendVersion {
        match self.crypto.version(ctx) {
            Ok(version) => version,
            Err(e) => {
                warn!(backend = self.crypto.name(), error = %e, "failed to query backend version");
                BackendVersion::Unknown
            }
        }
    }

    /// Version of the versioning backend.
    pub fn vcs_version(&self, ctx: &Context) -> BackendVersion {
        self.vcs.version(ctx)
    }

    /// Recipients applying to `dir`, read through the cache.
    fn recipients_for(&self, dir: &Path) -> Result<Vec<RecipientId>> {
        if let Some(ids) = self.cache.lock().get(dir) {
            return Ok(ids.clone());
        }
        let ids = self.recipients.load_for(dir)?;
        self.cache.lock().insert(dir.to_path_buf(), ids.clone());
        Ok(ids)
    }

    /// Drop cached recipient lists so the next lookup reads the disk.
    fn invalidate(&self) {
        self.cache.lock().clear();
    }

    /// Report `paths` to versioning and commit when auto-commit is on.
    ///
    /// A backend without a repository is not an error; anything else is.
    fn track_and_commit(&self, ctx: &Context, paths: &[PathBuf], message: &str) -> Result<()> {
        let result = self.vcs.add(ctx, paths).and_then(|()| {
            if self.options.auto_commit {
                self.vcs.commit(ctx, message)
            } else {
                Ok(())
            }
        });

        match result {
            Err(Error::Vcs(VcsError::NotInitialized(_))) => {
                debug!(message, "versioning not initialized, change not recorded");
                Ok(())
            }
            other => other,
        }
    }

    /// Record `paths` for an operation that ended with `result`.
    ///
    /// When the operation failed partway, whatever it already wrote is still
    /// reported to versioning, marked as interrupted, and the original error
    /// is returned.
    fn commit_outcome<T>(
        &self,
        ctx: &Context,
        result: Result<T>,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.track_and_commit(ctx, paths, message)?;
                Ok(value)
            }
            Err(e) => {
                if !paths.is_empty() {
                    let message = format!("{} (interrupted)", message);
                    // the caller's context may be the reason we stopped
                    if let Err(track) =
                        self.track_and_commit(&Context::background(), paths, &message)
                    {
                        warn!(error = %track, "failed to record partial change");
                    }
                }
                Err(e)
            }
        }
    }

    /// Export public keys of `ids` into the store. Failures are logged.
    fn export_keys(&self, ctx: &Context, ids: &[RecipientId]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for id in ids {
            match self.recipients.export_public_key(ctx, self.crypto.as_ref(), id) {
                Ok(Some(path)) => written.push(path),
                Ok(None) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!(id = %id, error = %e, "failed to export public key"),
            }
        }
        Ok(written)
    }
}

fn default_author() -> (String, String) {
    let user = whoami::username();
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    let name = whoami::realname();
    let name = if name.trim().is_empty() {
        user.clone()
    } else {
        name
    };
    (name, format!("{}@{}", user, host))
}

/// Join a subtree prefix and a relative name.
fn join(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}
