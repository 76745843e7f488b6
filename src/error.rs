//! Error types.
//!
//! Each layer has its own error enum; `Error` wraps them so `?` works across
//! layers. Callers that need to branch on the failure use [`Error::kind`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for all cellar operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Recipient(#[from] RecipientError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed name or path traversal attempt.
    InvalidName,
    /// Entry, directory or recipient absent.
    NotFound,
    /// Encryption attempted with an empty recipient set.
    NoRecipients,
    /// Encryption targeted an ID the backend cannot resolve.
    UnknownRecipient,
    /// Backend refused or failed to decrypt.
    DecryptionFailed,
    /// Decrypted bytes could not be decoded.
    Corrupt,
    /// Encryption or versioning backend missing or not initialized.
    BackendUnavailable,
    /// Cancellation observed before the operation touched durable state.
    Cancelled,
    /// Recipient already present.
    Conflict,
    /// Invalid configuration.
    Config,
    /// Filesystem error.
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Secret(e) => match e {
                SecretError::InvalidName { .. } => ErrorKind::InvalidName,
                SecretError::NotFound(_) => ErrorKind::NotFound,
                SecretError::Corrupt { .. } | SecretError::Unencodable { .. } => {
                    ErrorKind::Corrupt
                }
            },
            Error::Recipient(e) => match e {
                RecipientError::NoRecipients(_) => ErrorKind::NoRecipients,
                RecipientError::NotFound(_) => ErrorKind::NotFound,
                RecipientError::AlreadyPresent(_) => ErrorKind::Conflict,
                RecipientError::InvalidId(_) => ErrorKind::InvalidName,
            },
            Error::Cipher(e) => match e {
                CipherError::UnknownRecipient(_) | CipherError::InvalidPublicKey(_) => {
                    ErrorKind::UnknownRecipient
                }
                CipherError::DecryptionFailed(_) => ErrorKind::DecryptionFailed,
                CipherError::Unavailable(_) => ErrorKind::BackendUnavailable,
                CipherError::EncryptionFailed(_)
                | CipherError::KeyImport(_)
                | CipherError::KeyExport(_)
                | CipherError::InvalidIdentity(_) => ErrorKind::BackendUnavailable,
            },
            Error::Vcs(_) => ErrorKind::BackendUnavailable,
            Error::Config(e) => match e {
                ConfigError::NotADirectory(_) => ErrorKind::NotFound,
                _ => ErrorKind::Config,
            },
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Prompt(_) | Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

/// Errors about entries in the secret tree.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("invalid secret name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("secret '{name}' cannot be stored: {reason}")]
    Unencodable { name: String, reason: String },
}

impl SecretError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors about recipient lists.
#[derive(Error, Debug)]
pub enum RecipientError {
    #[error("no recipients for '{0}'")]
    NoRecipients(String),

    #[error("recipient not found: {0}")]
    NotFound(String),

    #[error("recipient already present: {0}")]
    AlreadyPresent(String),

    #[error("invalid recipient id: {0:?}")]
    InvalidId(String),
}

/// Errors from an encryption backend.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("key import failed: {0}")]
    KeyImport(String),

    #[error("key export failed: {0}")]
    KeyExport(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("encryption backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a versioning backend.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("versioning backend not initialized at {0}")]
    NotInitialized(PathBuf),

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("versioning backend unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("store root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
