//! Entry operations.
//!
//! CRUD, copy/move and prune for entries of the store.

use std::path::PathBuf;

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{join, Store};
use crate::core::context::Context;
use crate::core::domain::Secret;
use crate::core::types::SecretName;
use crate::error::{RecipientError, Result, SecretError};

impl Store {
    /// Decrypt and decode the entry `name`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` if the entry doesn't exist,
    /// `CipherError::DecryptionFailed` if the backend holds no matching key
    /// and `SecretError::Corrupt` if the plaintext cannot be decoded.
    pub fn get(&self, ctx: &Context, name: &str) -> Result<Secret> {
        ctx.check()?;
        let plaintext = self.decrypt_entry(ctx, name)?;
        Secret::parse(name, &plaintext)
    }

    /// Encrypt `secret` for the recipients of its directory and store it
    /// under `name`, replacing any previous content.
    ///
    /// # Arguments
    ///
    /// * `name` - Entry name, e.g. `web/github`
    /// * `secret` - Content to store
    ///
    /// # Errors
    ///
    /// Returns `RecipientError::NoRecipients` if no recipient list applies,
    /// in which case nothing is written. Returns `CipherError` if any
    /// recipient is rejected; partial ciphertext is never persisted.
    /// Returns `SecretError::Unencodable` if `secret` would not read back
    /// unchanged.
    pub fn set(&self, ctx: &Context, name: &str, secret: &Secret) -> Result<()> {
        ctx.check()?;
        self.invalidate();
        secret.validate(name)?;

        let path = self.encrypt_entry(ctx, name, &secret.to_bytes())?;
        self.track_and_commit(ctx, &[path], &format!("Save secret to {}", name))
    }

    /// Remove the entry `name`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` if the entry doesn't exist.
    pub fn delete(&self, ctx: &Context, name: &str) -> Result<()> {
        ctx.check()?;
        self.invalidate();

        let path = self.tree.remove(name)?;
        self.track_and_commit(ctx, &[path], &format!("Remove {} from store", name))
    }

    /// Every entry below `prefix`, sorted by byte order. The empty prefix
    /// lists the whole store; a missing prefix lists nothing.
    pub fn list(&self, prefix: &str) -> Result<Vec<SecretName>> {
        self.tree.list(prefix)
    }

    /// Whether `name` is an entry.
    pub fn exists(&self, name: &str) -> bool {
        self.tree.exists(name)
    }

    /// Whether `name` is a directory.
    pub fn is_dir(&self, name: &str) -> bool {
        self.tree.is_dir(name)
    }

    /// Copy an entry or a whole subtree.
    ///
    /// Content is re-encrypted for the recipients at the destination, which
    /// may differ from the source's. Copying an entry onto an existing
    /// directory (or a name ending in `/`) places it inside.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` if `from` is neither an entry nor a
    /// directory holding entries.
    pub fn copy(&self, ctx: &Context, from: &str, to: &str) -> Result<()> {
        self.transfer(ctx, from, to, false, &format!("Copied {} to {}", from, to))
    }

    /// Move an entry or a whole subtree.
    ///
    /// Every source is decrypted and re-encrypted for its destination before
    /// anything is written, so an entry that can't be read or re-encrypted
    /// leaves the store untouched. Each source entry is removed only after
    /// its destination was written.
    pub fn rename(&self, ctx: &Context, from: &str, to: &str) -> Result<()> {
        self.transfer(ctx, from, to, true, &format!("Moved {} to {}", from, to))
    }

    /// Remove an entry or a whole subtree, including any recipient list
    /// inside it.
    pub fn prune(&self, ctx: &Context, subtree: &str) -> Result<()> {
        ctx.check()?;
        self.invalidate();

        let path = if self.tree.exists(subtree) {
            self.tree.remove(subtree)?
        } else if self.tree.is_dir(subtree) {
            self.tree.remove_dir(subtree)?
        } else {
            return Err(SecretError::NotFound(subtree.to_string()).into());
        };
        self.track_and_commit(ctx, &[path], &format!("Remove {} from store", subtree))
    }

    pub(super) fn decrypt_entry(&self, ctx: &Context, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let ciphertext = self.tree.read(name)?;
        trace!(name, bytes = ciphertext.len(), "decrypting");
        self.crypto.decrypt(ctx, &ciphertext)
    }

    /// Encrypt `plaintext` for the recipients governing `name` and write it.
    pub(super) fn encrypt_entry(
        &self,
        ctx: &Context,
        name: &str,
        plaintext: &[u8],
    ) -> Result<PathBuf> {
        let ciphertext = self.seal_entry(ctx, name, plaintext)?;
        ctx.check()?;
        self.tree.write(name, &ciphertext)
    }

    /// Encrypt `plaintext` for the recipients governing `name` without
    /// writing anything.
    fn seal_entry(&self, ctx: &Context, name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        let path = self.tree.resolve(name)?;
        let dir = path.parent().unwrap_or(&self.path);
        let recipients = self.recipients_for(dir)?;
        if recipients.is_empty() {
            return Err(RecipientError::NoRecipients(name.to_string()).into());
        }

        trace!(name, recipients = recipients.len(), "encrypting");
        self.crypto.encrypt(ctx, plaintext, &recipients)
    }

    fn transfer(
        &self,
        ctx: &Context,
        from: &str,
        to: &str,
        remove: bool,
        message: &str,
    ) -> Result<()> {
        ctx.check()?;
        self.invalidate();

        let pairs = self.plan_transfer(from, to)?;
        for (_, dest) in &pairs {
            self.tree.resolve(dest)?;
        }

        let mut staged = Vec::with_capacity(pairs.len());
        for (src, dest) in pairs {
            ctx.check()?;
            let plaintext = self.decrypt_entry(ctx, &src)?;
            let ciphertext = self.seal_entry(ctx, &dest, &plaintext)?;
            staged.push((src, dest, ciphertext));
        }
        ctx.check()?;

        let mut paths = Vec::new();
        let result = self.apply_transfer(&staged, remove, &mut paths);
        self.commit_outcome(ctx, result, &paths, message)
    }

    fn apply_transfer(
        &self,
        staged: &[(SecretName, SecretName, Vec<u8>)],
        remove: bool,
        paths: &mut Vec<PathBuf>,
    ) -> Result<()> {
        for (src, dest, ciphertext) in staged {
            paths.push(self.tree.write(dest, ciphertext)?);
            if remove {
                paths.push(self.tree.remove(src)?);
            }
            debug!(from = %src, to = %dest, remove, "entry transferred");
        }
        Ok(())
    }

    /// Source/destination name pairs for a copy or move.
    fn plan_transfer(&self, from: &str, to: &str) -> Result<Vec<(SecretName, SecretName)>> {
        if self.tree.exists(from) {
            let dest = if to.is_empty() || to.ends_with('/') || self.tree.is_dir(to) {
                let base = from.rsplit('/').next().unwrap_or(from);
                join(to, base)
            } else {
                to.to_string()
            };
            if dest == from {
                return Err(SecretError::invalid(to, "source and destination are the same").into());
            }
            return Ok(vec![(from.to_string(), dest)]);
        }

        let base = from.trim_end_matches('/');
        let entries = self.tree.list(from)?;
        if base.is_empty() || entries.is_empty() {
            return Err(SecretError::NotFound(from.to_string()).into());
        }
        let to = to.trim_end_matches('/');
        if to == base || to.starts_with(&format!("{}/", base)) {
            return Err(SecretError::invalid(to, "destination is inside the source").into());
        }

        Ok(entries
            .into_iter()
            .map(|name| {
                let rel = name[base.len()..].trim_start_matches('/').to_string();
                let dest = join(to, &rel);
                (name, dest)
            })
            .collect())
    }
}
