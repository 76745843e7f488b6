//! Recipient operations.
//!
//! Who can decrypt what, and keeping existing ciphertext in line with it.
//! Editing a recipient list re-encrypts exactly the entries that list
//! governs; entries below a deeper list are left alone.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::Store;
use crate::core::context::Context;
use crate::core::crypto;
use crate::core::domain::{ImportReport, ReencryptReport};
use crate::core::recipients;
use crate::core::types::{RecipientId, SecretName};
use crate::error::{RecipientError, Result};

impl Store {
    /// Effective recipients of an entry or subtree. The innermost recipient
    /// list wins; no list at all yields an empty set.
    pub fn recipients(&self, name: &str) -> Result<Vec<RecipientId>> {
        let dir = self.scope_dir(name)?;
        self.recipients_for(&dir)
    }

    /// Add `id` to the root recipient list and re-encrypt what it governs.
    pub fn add_recipient(&self, ctx: &Context, id: &str) -> Result<ReencryptReport> {
        self.add_recipient_at(ctx, "", id)
    }

    /// Remove `id` from the root recipient list and re-encrypt what it
    /// governs.
    pub fn remove_recipient(&self, ctx: &Context, id: &str) -> Result<ReencryptReport> {
        self.remove_recipient_at(ctx, "", id)
    }

    /// Add `id` to the recipient list nearest to `subtree`.
    ///
    /// The recipient's public key is imported from the store if the backend
    /// doesn't know it yet, and exported into the store when
    /// `export_keys` is set. Every entry governed by the edited list is then
    /// re-encrypted; per-entry failures are reported, not raised.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::AlreadyPresent` if `id` is already listed and
    /// `RecipientError::InvalidId` for IDs that are empty, start with `.` or
    /// contain whitespace, slashes or NUL.
    pub fn add_recipient_at(
        &self,
        ctx: &Context,
        subtree: &str,
        id: &str,
    ) -> Result<ReencryptReport> {
        ctx.check()?;
        self.invalidate();
        validate_id(id)?;

        let dir = self.tree.resolve_dir(subtree)?;
        let file = self
            .recipients
            .lookup(&dir)
            .unwrap_or_else(|| self.recipients.root_file());
        let mut ids = load_if_exists(&file)?;
        if ids.iter().any(|known| known == id) {
            return Err(RecipientError::AlreadyPresent(id.to_string()).into());
        }

        self.import_key_for(ctx, id)?;

        ids.push(id.to_string());
        recipients::save(&file, &ids)?;
        info!(id, file = %file.display(), "recipient added");

        let mut paths = vec![file.clone()];
        let exported = if self.options.export_keys {
            self.export_keys(ctx, &[id.to_string()])
        } else {
            Ok(Vec::new())
        };
        let result = exported.and_then(|keys| {
            paths.extend(keys);
            self.reencrypt_governed(ctx, &file, &mut paths)
        });
        self.commit_outcome(ctx, result, &paths, &format!("Added Recipient {}", id))
    }

    /// Remove `id` from the recipient list nearest to `subtree`.
    ///
    /// `id` may be given as a key-id suffix of the listed fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::NotFound` if `id` isn't listed and
    /// `RecipientError::NoRecipients` if it is the last one.
    pub fn remove_recipient_at(
        &self,
        ctx: &Context,
        subtree: &str,
        id: &str,
    ) -> Result<ReencryptReport> {
        ctx.check()?;
        self.invalidate();

        let dir = self.tree.resolve_dir(subtree)?;
        let file = self
            .recipients
            .lookup(&dir)
            .ok_or_else(|| RecipientError::NotFound(id.to_string()))?;
        let ids = recipients::load(&file)?;

        let remaining: Vec<RecipientId> = ids
            .iter()
            .filter(|listed| !crypto::is_known(std::slice::from_ref(*listed), id))
            .cloned()
            .collect();
        if remaining.len() == ids.len() {
            return Err(RecipientError::NotFound(id.to_string()).into());
        }
        if remaining.is_empty() {
            return Err(RecipientError::NoRecipients(subtree.to_string()).into());
        }

        recipients::save(&file, &remaining)?;
        info!(id, file = %file.display(), "recipient removed");

        let mut paths = vec![file.clone()];
        let result = self.reencrypt_governed(ctx, &file, &mut paths);
        self.commit_outcome(ctx, result, &paths, &format!("Removed Recipient {}", id))
    }

    /// Write a recipient list at `subtree` itself, scoping that subtree to
    /// `ids`, and record it with `message`.
    ///
    /// Existing entries are not re-encrypted; call [`Store::reencrypt`].
    pub fn save_recipients(
        &self,
        ctx: &Context,
        subtree: &str,
        ids: &[RecipientId],
        message: &str,
        export_keys: bool,
    ) -> Result<PathBuf> {
        ctx.check()?;
        self.invalidate();

        let dir = self.tree.resolve_dir(subtree)?;
        let file = self.recipients.save(ids, &dir, true)?;

        let mut paths = vec![file.clone()];
        let exported = if export_keys {
            self.export_keys(ctx, ids)
        } else {
            Ok(Vec::new())
        };
        let result = exported.map(|keys| paths.extend(keys));
        self.commit_outcome(ctx, result, &paths, message)?;
        Ok(file)
    }

    /// Re-encrypt every entry below `subtree` for its current recipients.
    ///
    /// Entries are processed one at a time. An entry that fails keeps its
    /// old ciphertext and is reported; cancellation stops the batch, and
    /// the entries re-encrypted before it are still recorded.
    pub fn reencrypt(&self, ctx: &Context, subtree: &str) -> Result<ReencryptReport> {
        ctx.check()?;
        self.invalidate();

        let names = self.tree.list(subtree)?;
        let mut paths = Vec::new();
        let result = self.reencrypt_entries(ctx, names, &mut paths);
        let scope = if subtree.is_empty() { "store" } else { subtree };
        let message = format!("Re-encrypted {} entries in {}", paths.len(), scope);
        self.commit_outcome(ctx, result, &paths, &message)
    }

    /// Import public keys of listed recipients the backend doesn't know,
    /// from `<root>/.public-keys`.
    pub fn import_missing_public_keys(&self, ctx: &Context) -> Result<ImportReport> {
        let report = self
            .recipients
            .import_missing_public_keys(ctx, self.crypto.as_ref())?;
        if !report.is_complete() {
            warn!(missing = ?report.missing, "public keys unavailable for some recipients");
        }
        Ok(report)
    }

    /// Directory whose recipient list applies to `name`.
    fn scope_dir(&self, name: &str) -> Result<PathBuf> {
        if !name.is_empty() && self.tree.exists(name) {
            let path = self.tree.resolve(name)?;
            return Ok(path.parent().unwrap_or(&self.path).to_path_buf());
        }
        self.tree.resolve_dir(name)
    }

    /// Make sure the backend can encrypt to `id`, importing its key from the
    /// store if one was exported there.
    fn import_key_for(&self, ctx: &Context, id: &str) -> Result<()> {
        let known = self.crypto.list_identities(ctx)?;
        if crypto::is_known(&known, id) {
            return Ok(());
        }

        let Some(key) = self.recipients.key_path(id) else {
            return Ok(());
        };
        if key.is_file() {
            let material = std::fs::read(&key)?;
            match self.crypto.import_public_key(ctx, &material) {
                Ok(()) => debug!(id, "imported public key from store"),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!(id, error = %e, "failed to import public key"),
            }
        }
        Ok(())
    }

    /// Re-encrypt the entries whose nearest recipient list is `file`.
    fn reencrypt_governed(
        &self,
        ctx: &Context,
        file: &Path,
        paths: &mut Vec<PathBuf>,
    ) -> Result<ReencryptReport> {
        let dir = file.parent().unwrap_or(&self.path);
        let prefix = dir
            .strip_prefix(&self.path)
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        let mut names = Vec::new();
        for name in self.tree.list(&prefix)? {
            let entry = self.tree.resolve(&name)?;
            let governing = entry
                .parent()
                .and_then(|parent| self.recipients.lookup(parent));
            if governing.as_deref() == Some(file) {
                names.push(name);
            }
        }

        debug!(file = %file.display(), entries = names.len(), "re-encrypting governed entries");
        self.reencrypt_entries(ctx, names, paths)
    }

    fn reencrypt_entries(
        &self,
        ctx: &Context,
        names: Vec<SecretName>,
        paths: &mut Vec<PathBuf>,
    ) -> Result<ReencryptReport> {
        let mut report = ReencryptReport::default();
        for name in names {
            ctx.check()?;
            let result = self
                .decrypt_entry(ctx, &name)
                .and_then(|plaintext| self.encrypt_entry(ctx, &name, &plaintext));
            match result {
                Ok(path) => {
                    paths.push(path);
                    report.succeeded.push(name);
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(name = %name, error = %e, "failed to re-encrypt");
                    report.failed.push((name, e));
                }
            }
        }
        Ok(report)
    }
}

/// IDs name files under the exported key directory, so they must be
/// usable as a single path component.
fn validate_id(id: &str) -> Result<()> {
    let bad_char = |c: char| c.is_whitespace() || matches!(c, '/' | '\\' | '\0');
    if id.is_empty() || id.starts_with('.') || id.contains(bad_char) {
        return Err(RecipientError::InvalidId(id.to_string()).into());
    }
    Ok(())
}

fn load_if_exists(file: &Path) -> Result<Vec<RecipientId>> {
    if file.is_file() {
        recipients::load(file)
    } else {
        Ok(Vec::new())
    }
}
