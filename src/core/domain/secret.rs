//! Secret type.
//!
//! The decrypted form of an entry: a password line, ordered `key: value`
//! metadata lines, then a free-text body. A single empty line separates the
//! metadata from a body that starts with an empty line or with something
//! that would read as metadata.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::{Result, SecretError};

/// A decrypted secret.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret {
    password: Zeroizing<String>,
    metadata: Vec<(String, String)>,
    body: Zeroizing<String>,
}

impl Secret {
    /// Create a secret from a password and a free-text body.
    pub fn new(password: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            metadata: Vec::new(),
            body: Zeroizing::new(body.into()),
        }
    }

    /// Decode plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Corrupt` if the bytes are not UTF-8.
    pub fn parse(name: &str, plaintext: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(plaintext).map_err(|e| SecretError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let (password, mut rest) = text.split_once('\n').unwrap_or((text, ""));

        let mut metadata = Vec::new();
        while !rest.is_empty() {
            let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
            match parse_kv(line) {
                Some(kv) => {
                    metadata.push(kv);
                    rest = tail;
                }
                None => break,
            }
        }
        let rest = rest.strip_prefix('\n').unwrap_or(rest);

        Ok(Self {
            password: Zeroizing::new(password.to_string()),
            metadata,
            body: Zeroizing::new(rest.to_string()),
        })
    }

    /// Encode to plaintext bytes.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = String::with_capacity(self.password.len() + self.body.len() + 1);
        out.push_str(&self.password);
        out.push('\n');
        for (k, v) in &self.metadata {
            out.push_str(k);
            out.push_str(": ");
            out.push_str(v);
            out.push('\n');
        }
        if self.needs_separator() {
            out.push('\n');
        }
        out.push_str(&self.body);
        Zeroizing::new(out.into_bytes())
    }

    fn needs_separator(&self) -> bool {
        let first = self.body.split('\n').next().unwrap_or("");
        self.body.starts_with('\n') || parse_kv(first).is_some()
    }

    /// Check that the secret encodes to bytes that parse back to it.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Unencodable` if the password or a metadata
    /// entry contains a newline, or a metadata key would not read back as one.
    pub fn validate(&self, name: &str) -> Result<()> {
        let fail = |reason: String| -> Result<()> {
            Err(SecretError::Unencodable {
                name: name.to_string(),
                reason,
            }
            .into())
        };
        if self.password.contains('\n') {
            return fail("password contains a newline".to_string());
        }
        for (k, v) in &self.metadata {
            if v.contains('\n') {
                return fail(format!("value of '{}' contains a newline", k));
            }
            if parse_kv(&format!("{}: {}", k, v)).as_ref().map(|(pk, _)| pk) != Some(k) {
                return fail(format!("invalid metadata key {:?}", k));
            }
        }
        Ok(())
    }

    /// The first line.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Zeroizing::new(password.into());
    }

    /// Free text after the metadata block.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Metadata in insertion order.
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, replacing an existing value in place or appending.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.metadata.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.metadata.push((key, value)),
        }
    }
}

// A metadata line is `key: value` with a non-empty key free of whitespace.
fn parse_kv(line: &str) -> Option<(String, String)> {
    let (k, v) = line.split_once(": ")?;
    if k.is_empty() || k.chars().any(char::is_whitespace) {
        return None;
    }
    Some((k.to_string(), v.to_string()))
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("password", &"<redacted>")
            .field("metadata", &self.metadata.len())
            .field("body", &"<redacted>")
            .finish()
    }
}
