//! Batch results.

use crate::core::types::{RecipientId, SecretName};
use crate::error::Error;

/// Outcome of re-encrypting a set of entries.
///
/// Failures are collected per entry; the batch itself does not fail because
/// one entry could not be re-encrypted.
#[derive(Debug, Default)]
pub struct ReencryptReport {
    /// Entries now encrypted for the current recipient set.
    pub succeeded: Vec<SecretName>,
    /// Entries left on their previous ciphertext, with the reason.
    pub failed: Vec<(SecretName, Error)>,
}

impl ReencryptReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Outcome of importing recipient public keys.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// IDs imported during this call.
    pub imported: Vec<RecipientId>,
    /// IDs still unknown to the encryption backend.
    pub missing: Vec<RecipientId>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
