//! Type aliases for domain concepts.

/// A hierarchical entry name (e.g. `web/github`).
///
/// Slash-separated, case-sensitive, no leading or trailing slash.
pub type SecretName = String;

/// An opaque recipient identifier.
///
/// An age public key (`age1...`) or a GPG fingerprint/user id, depending on
/// the encryption backend.
pub type RecipientId = String;

/// Backend-produced ciphertext, stored on disk without framing.
pub type Ciphertext = Vec<u8>;
