//! In-memory test double.
//!
//! Ciphertext is the plaintext prefixed with a header naming its recipients,
//! so tests can inspect who an entry was encrypted for. A permissive mock
//! encrypts to and decrypts for anyone; a strict one only knows the
//! identities it was built with.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use super::Crypto;
use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::core::types::{Ciphertext, RecipientId};
use crate::error::{CipherError, Result};

const MAGIC: &[u8] = b"MOCK\n";

/// Mock encryption backend.
pub struct Mock {
    known: RwLock<BTreeSet<RecipientId>>,
    private: BTreeSet<RecipientId>,
    strict: bool,
}

impl Mock {
    /// Permissive mock: any recipient is accepted, any mock ciphertext decrypts.
    pub fn new() -> Self {
        Self {
            known: RwLock::new(BTreeSet::new()),
            private: BTreeSet::new(),
            strict: false,
        }
    }

    /// Strict mock knowing `public` keys and holding private keys for `private`.
    ///
    /// Private identities are implicitly public too.
    pub fn with_identities(public: &[&str], private: &[&str]) -> Self {
        let mut known: BTreeSet<RecipientId> = public.iter().map(|s| s.to_string()).collect();
        known.extend(private.iter().map(|s| s.to_string()));
        Self {
            known: RwLock::new(known),
            private: private.iter().map(|s| s.to_string()).collect(),
            strict: true,
        }
    }

    /// Recipients recorded in a mock ciphertext.
    pub fn recipients_of(ciphertext: &[u8]) -> Option<Vec<RecipientId>> {
        let (recipients, _) = split(ciphertext)?;
        Some(recipients)
    }
}

impl Default for Mock {
    fn default() -> Self {
        Self::new()
    }
}

fn split(ciphertext: &[u8]) -> Option<(Vec<RecipientId>, &[u8])> {
    let rest = ciphertext.strip_prefix(MAGIC)?;
    let end = rest.iter().position(|b| *b == b'\n')?;
    let header = std::str::from_utf8(&rest[..end]).ok()?;
    let recipients = header
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some((recipients, &rest[end + 1..]))
}

impl Crypto for Mock {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn ext(&self) -> &'static str {
        "gpg"
    }

    fn id_file(&self) -> &'static str {
        ".gpg-id"
    }

    fn version(&self, _ctx: &Context) -> Result<BackendVersion> {
        Ok(BackendVersion::new(0, 0, 1))
    }

    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[RecipientId],
    ) -> Result<Ciphertext> {
        ctx.check()?;
        if recipients.is_empty() {
            return Err(CipherError::EncryptionFailed("no recipients provided".to_string()).into());
        }
        if self.strict {
            let known = self.known.read();
            if let Some(unknown) = recipients.iter().find(|r| !known.contains(*r)) {
                return Err(CipherError::UnknownRecipient(unknown.clone()).into());
            }
        }

        let mut out = MAGIC.to_vec();
        out.extend_from_slice(recipients.join(",").as_bytes());
        out.push(b'\n');
        out.extend_from_slice(plaintext);
        Ok(out)
    }

    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        ctx.check()?;
        let (recipients, payload) = split(ciphertext)
            .ok_or_else(|| CipherError::DecryptionFailed("not a mock ciphertext".to_string()))?;

        if self.strict && !recipients.iter().any(|r| self.private.contains(r)) {
            return Err(CipherError::DecryptionFailed(
                "no private key for any recipient".to_string(),
            )
            .into());
        }
        Ok(Zeroizing::new(payload.to_vec()))
    }

    fn list_identities(&self, _ctx: &Context) -> Result<Vec<RecipientId>> {
        Ok(self.known.read().iter().cloned().collect())
    }

    fn list_private_identities(&self, _ctx: &Context) -> Result<Vec<RecipientId>> {
        Ok(self.private.iter().cloned().collect())
    }

    fn import_public_key(&self, ctx: &Context, material: &[u8]) -> Result<()> {
        ctx.check()?;
        let text = std::str::from_utf8(material)
            .map_err(|e| CipherError::KeyImport(format!("UTF-8 error: {}", e)))?;
        let ids: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if ids.is_empty() {
            return Err(CipherError::KeyImport("empty key material".to_string()).into());
        }
        self.known
            .write()
            .extend(ids.into_iter().map(str::to_string));
        Ok(())
    }

    fn export_public_key(&self, _ctx: &Context, id: &str) -> Result<Vec<u8>> {
        if self.strict && !self.known.read().contains(id) {
            return Err(CipherError::KeyExport(format!("no public key for {}", id)).into());
        }
        Ok(format!("{}\n", id).into_bytes())
    }
}
