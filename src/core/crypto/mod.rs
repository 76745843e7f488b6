//! Encryption backends.
//!
//! The store never encrypts anything itself; it hands plaintext and a
//! recipient list to a [`Crypto`] implementation and persists whatever comes
//! back.
//!
//! ## Backends
//!
//! - **age**: default, in-process. x25519 keys, `.age` entries.
//! - **GPG**: feature-gated (`gpg`). Shells out to the gpg CLI, `.gpg` entries.
//! - **Mock**: in-memory test double with configurable key sets.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Crypto` trait
//! 2. Add the implementation in a new file
//! 3. Feature-gate if it needs an external tool
//! 4. Re-export from this module

use zeroize::Zeroizing;

use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::core::types::{Ciphertext, RecipientId};
use crate::error::Result;

mod age;
pub mod identity;
mod mock;

#[cfg(feature = "gpg")]
mod gpg;

pub use self::age::{parse_recipient, Age};
pub use mock::Mock;

#[cfg(feature = "gpg")]
pub use gpg::Gpg;

/// Encryption backend capability.
///
/// Recipient IDs are backend-specific:
/// - age: public keys (age1...)
/// - GPG: key fingerprints, key ids or email addresses
pub trait Crypto: Send + Sync {
    /// Backend name for display/config.
    fn name(&self) -> &'static str;

    /// File extension of entries, without the dot.
    fn ext(&self) -> &'static str;

    /// File name of recipient lists.
    fn id_file(&self) -> &'static str;

    /// Version of the underlying implementation.
    fn version(&self, ctx: &Context) -> Result<BackendVersion>;

    /// Encrypt `plaintext` so every recipient can decrypt it.
    ///
    /// Either every recipient is included or the call fails; partial
    /// ciphertext is never returned.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::UnknownRecipient` if any ID cannot be resolved.
    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[RecipientId],
    ) -> Result<Ciphertext>;

    /// Decrypt with whatever private keys the backend holds.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if no held key matches.
    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Public identities the backend can encrypt to.
    fn list_identities(&self, ctx: &Context) -> Result<Vec<RecipientId>>;

    /// Identities the backend can decrypt for.
    fn list_private_identities(&self, ctx: &Context) -> Result<Vec<RecipientId>>;

    /// Import public key material.
    fn import_public_key(&self, ctx: &Context, material: &[u8]) -> Result<()>;

    /// Export public key material for `id`, suitable for `import_public_key`.
    fn export_public_key(&self, ctx: &Context, id: &str) -> Result<Vec<u8>>;
}

/// Whether `id` names one of the `known` identities.
///
/// Matches exactly, case-insensitively, and by key-id suffix of a
/// fingerprint (`0xDEADBEEF` matches `...DEADBEEF`).
pub fn is_known(known: &[RecipientId], id: &str) -> bool {
    let needle = id.trim_start_matches("0x").to_ascii_uppercase();
    known.iter().any(|k| {
        k == id
            || k.eq_ignore_ascii_case(id)
            || (needle.len() >= 8
                && needle.chars().all(|c| c.is_ascii_hexdigit())
                && k.to_ascii_uppercase().ends_with(&needle))
    })
}
