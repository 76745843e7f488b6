//! Age encryption backend implementation.
//!
//! Encrypts entries in the binary age format with x25519 keys. Decryption
//! also accepts ASCII-armored input.

use std::collections::BTreeSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ::age::x25519;
use parking_lot::RwLock;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{identity, Crypto};
use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::core::tree::write_atomic;
use crate::core::types::{Ciphertext, RecipientId};
use crate::error::{CipherError, Result};

/// Age-based backend holding the caller's identities and a keyring of
/// imported recipient public keys.
pub struct Age {
    identities: Vec<x25519::Identity>,
    keyring: RwLock<BTreeSet<RecipientId>>,
    keyring_path: Option<PathBuf>,
}

impl Age {
    /// Create a backend decrypting with `identities`.
    pub fn new(identities: Vec<x25519::Identity>) -> Self {
        Self {
            identities,
            keyring: RwLock::new(BTreeSet::new()),
            keyring_path: None,
        }
    }

    /// Create a backend from an identity file.
    pub fn from_identity_file(path: &Path) -> Result<Self> {
        Ok(Self::new(identity::load(path)?))
    }

    /// Persist imported keys in `path`, loading any already there.
    ///
    /// The keyring file lists one public key per line.
    pub fn with_keyring(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let mut keyring = self.keyring.write();
            for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
                parse_recipient(line)?;
                keyring.insert(line.to_string());
            }
            debug!(keys = keyring.len(), path = %path.display(), "keyring loaded");
        }
        self.keyring_path = Some(path);
        Ok(self)
    }

    /// Public keys of the held identities.
    pub fn public_keys(&self) -> Vec<RecipientId> {
        self.identities
            .iter()
            .map(|i| i.to_public().to_string())
            .collect()
    }

    fn save_keyring(&self, keyring: &BTreeSet<RecipientId>) -> Result<()> {
        let Some(path) = &self.keyring_path else {
            return Ok(());
        };
        let mut contents = String::new();
        for key in keyring {
            contents.push_str(key);
            contents.push('\n');
        }
        write_atomic(path, contents.as_bytes())
    }
}

impl Crypto for Age {
    fn name(&self) -> &'static str {
        "age"
    }

    fn ext(&self) -> &'static str {
        "age"
    }

    fn id_file(&self) -> &'static str {
        ".age-recipients"
    }

    fn version(&self, _ctx: &Context) -> Result<BackendVersion> {
        // age-encryption.org/v1
        Ok(BackendVersion::new(1, 0, 0))
    }

    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[RecipientId],
    ) -> Result<Ciphertext> {
        ctx.check()?;
        trace!(
            recipients = recipients.len(),
            plaintext_len = plaintext.len(),
            "encrypting"
        );

        if recipients.is_empty() {
            return Err(CipherError::EncryptionFailed("no recipients provided".to_string()).into());
        }

        let parsed = recipients
            .iter()
            .map(|r| {
                r.parse::<x25519::Recipient>()
                    .map_err(|_| CipherError::UnknownRecipient(r.clone()).into())
            })
            .collect::<Result<Vec<_>>>()?;

        let encryptor =
            ::age::Encryptor::with_recipients(parsed.iter().map(|r| r as &dyn ::age::Recipient))
                .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        writer.write_all(plaintext)?;
        writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        trace!(ciphertext_len = encrypted.len(), "encrypted");
        Ok(encrypted)
    }

    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        ctx.check()?;
        trace!(ciphertext_len = ciphertext.len(), "decrypting");

        if self.identities.is_empty() {
            return Err(CipherError::DecryptionFailed("no identity loaded".to_string()).into());
        }

        let reader = ::age::armor::ArmoredReader::new(ciphertext);
        let decryptor = ::age::Decryptor::new(reader)
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        let mut reader = decryptor
            .decrypt(self.identities.iter().map(|i| i as &dyn ::age::Identity))
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        let mut decrypted = Zeroizing::new(Vec::new());
        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        trace!(plaintext_len = decrypted.len(), "decrypted");
        Ok(decrypted)
    }

    fn list_identities(&self, _ctx: &Context) -> Result<Vec<RecipientId>> {
        let mut ids: BTreeSet<RecipientId> = self.keyring.read().clone();
        ids.extend(self.public_keys());
        Ok(ids.into_iter().collect())
    }

    fn list_private_identities(&self, _ctx: &Context) -> Result<Vec<RecipientId>> {
        Ok(self.public_keys())
    }

    fn import_public_key(&self, ctx: &Context, material: &[u8]) -> Result<()> {
        ctx.check()?;
        let text = std::str::from_utf8(material)
            .map_err(|e| CipherError::KeyImport(format!("UTF-8 error: {}", e)))?;

        let keys = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| {
                parse_recipient(l)
                    .map(|r| r.to_string())
                    .map_err(|_| CipherError::KeyImport(format!("not an age public key: {}", l)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if keys.is_empty() {
            return Err(CipherError::KeyImport("no public key in material".to_string()).into());
        }

        let mut keyring = self.keyring.write();
        keyring.extend(keys);
        self.save_keyring(&keyring)
    }

    fn export_public_key(&self, _ctx: &Context, id: &str) -> Result<Vec<u8>> {
        // An age recipient is its own public key.
        let recipient =
            parse_recipient(id).map_err(|_| CipherError::KeyExport(format!("not an age key: {}", id)))?;
        Ok(format!("{}\n", recipient).into_bytes())
    }
}

/// Parse a public key string into an age recipient
///
/// # Errors
///
/// Returns `CipherError::InvalidPublicKey` if the key format is invalid.
pub fn parse_recipient(key: &str) -> Result<x25519::Recipient> {
    key.parse::<x25519::Recipient>()
        .map_err(|_| CipherError::InvalidPublicKey(key.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn backend() -> (Age, String) {
        let identity = x25519::Identity::generate();
        let public = identity.to_public().to_string();
        (Age::new(vec![identity]), public)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let ctx = Context::background();
        let (age, public) = backend();

        let encrypted = age.encrypt(&ctx, b"Hello, World!", &[public]).unwrap();
        assert_ne!(encrypted.as_slice(), b"Hello, World!");
        assert!(encrypted.starts_with(b"age-encryption.org/v1"));

        let decrypted = age.decrypt(&ctx, &encrypted).unwrap();
        assert_eq!(decrypted.as_slice(), b"Hello, World!");
    }

    #[test]
    fn test_encrypt_with_multiple_recipients() {
        let ctx = Context::background();
        let (alice, alice_pub) = backend();
        let (bob, bob_pub) = backend();

        let encrypted = alice
            .encrypt(&ctx, b"Shared secret", &[alice_pub, bob_pub])
            .unwrap();

        assert_eq!(alice.decrypt(&ctx, &encrypted).unwrap().as_slice(), b"Shared secret");
        assert_eq!(bob.decrypt(&ctx, &encrypted).unwrap().as_slice(), b"Shared secret");
    }

    #[test]
    fn test_decrypt_without_matching_key() {
        let ctx = Context::background();
        let (alice, alice_pub) = backend();
        let (eve, _) = backend();

        let encrypted = alice.encrypt(&ctx, b"private", &[alice_pub]).unwrap();
        let err = eve.decrypt(&ctx, &encrypted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
    }

    #[test]
    fn test_encrypt_unknown_recipient() {
        let ctx = Context::background();
        let (age, public) = backend();

        let err = age
            .encrypt(&ctx, b"x", &[public, "john.doe".to_string()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownRecipient);
    }

    #[test]
    fn test_import_persists_keyring() {
        let ctx = Context::background();
        let tmp = TempDir::new().unwrap();
        let keyring = tmp.path().join("keyring");
        let other = x25519::Identity::generate().to_public().to_string();

        let (age, _) = backend();
        let age = age.with_keyring(&keyring).unwrap();
        age.import_public_key(&ctx, other.as_bytes()).unwrap();
        assert!(age.list_identities(&ctx).unwrap().contains(&other));

        let reloaded = Age::new(vec![]).with_keyring(&keyring).unwrap();
        assert_eq!(reloaded.list_identities(&ctx).unwrap(), vec![other]);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let ctx = Context::background();
        let (age, _) = backend();
        assert!(age.import_public_key(&ctx, b"not a key").is_err());
    }

    #[test]
    fn test_cancelled_context() {
        let ctx = Context::background();
        ctx.cancel();
        let (age, public) = backend();
        let err = age.encrypt(&ctx, b"x", &[public]).unwrap_err();
        assert!(err.is_cancelled());
    }
}
