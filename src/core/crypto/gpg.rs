//! GPG cipher backend.
//!
//! Encrypts entries using GnuPG (GNU Privacy Guard).
//! Enable with `--features gpg`.
//!
//! ## Requirements
//!
//! - `gpg` CLI must be installed
//! - GPG keyring must hold the recipients' public keys
//! - Private key must be available for decryption
//!
//! Recipients are key fingerprints, key ids or email addresses, one per
//! line in `.gpg-id`, the same layout `pass` uses.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::Crypto;
use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::core::process::{self, Output};
use crate::core::types::{Ciphertext, RecipientId};
use crate::error::{CipherError, Result};

/// GPG backend using the gpg CLI.
#[derive(Debug, Clone)]
pub struct Gpg {
    binary: PathBuf,
    homedir: Option<PathBuf>,
}

impl Gpg {
    /// Locate `gpg` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::Unavailable` if gpg is not installed.
    pub fn new() -> Result<Self> {
        let binary = which::which("gpg").map_err(|_| {
            CipherError::Unavailable(
                "gpg CLI not found. Install GnuPG from https://gnupg.org/download/".to_string(),
            )
        })?;
        debug!(binary = %binary.display(), "using gpg");
        Ok(Self {
            binary,
            homedir: None,
        })
    }

    /// Use a specific keyring directory instead of `~/.gnupg`.
    pub fn with_homedir(mut self, homedir: impl Into<PathBuf>) -> Self {
        self.homedir = Some(homedir.into());
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(home) = &self.homedir {
            cmd.env("GNUPGHOME", home);
        }
        cmd.args(["--batch", "--no-tty", "--yes"]);
        cmd.args(args);
        cmd
    }

    fn run(&self, ctx: &Context, cmd: Command, input: Option<&[u8]>) -> Result<Output> {
        process::run(ctx, cmd, input)
    }

    fn list_keys(&self, ctx: &Context, secret: bool) -> Result<Vec<RecipientId>> {
        let listing = if secret {
            "--list-secret-keys"
        } else {
            "--list-keys"
        };
        let output = self.run(
            ctx,
            self.command(&[listing, "--with-colons", "--fixed-list-mode"]),
            None,
        )?;
        // gpg exits 2 on an empty keyring
        if !output.success() && !output.stdout.is_empty() {
            return Err(CipherError::Unavailable(output.stderr_lossy()).into());
        }
        Ok(parse_colons(
            &String::from_utf8_lossy(&output.stdout),
            if secret { "sec" } else { "pub" },
        ))
    }
}

/// Pull fingerprints and uid emails of primary keys from `--with-colons`
/// output.
fn parse_colons(listing: &str, record: &str) -> Vec<RecipientId> {
    let mut ids = Vec::new();
    let mut in_key = false;
    let mut want_fpr = false;

    for line in listing.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        match fields.first().copied() {
            Some(r) if r == record => {
                in_key = true;
                want_fpr = true;
            }
            Some("sub") | Some("ssb") => want_fpr = false,
            Some("fpr") if in_key && want_fpr => {
                if let Some(fpr) = fields.get(9).filter(|f| !f.is_empty()) {
                    ids.push(fpr.to_string());
                }
                want_fpr = false;
            }
            Some("uid") if in_key => {
                if let Some(uid) = fields.get(9) {
                    if let Some(email) = uid
                        .split_once('<')
                        .and_then(|(_, rest)| rest.split_once('>'))
                        .map(|(email, _)| email)
                    {
                        ids.push(email.to_string());
                    }
                }
            }
            Some("pub") | Some("sec") => in_key = false,
            _ => {}
        }
    }
    ids
}

impl Crypto for Gpg {
    fn name(&self) -> &'static str {
        "gpg"
    }

    fn ext(&self) -> &'static str {
        "gpg"
    }

    fn id_file(&self) -> &'static str {
        ".gpg-id"
    }

    fn version(&self, ctx: &Context) -> Result<BackendVersion> {
        let output = self.run(ctx, self.command(&["--version"]), None)?;
        if !output.success() {
            return Err(CipherError::Unavailable(output.stderr_lossy()).into());
        }
        Ok(BackendVersion::parse(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    fn encrypt(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        recipients: &[RecipientId],
    ) -> Result<Ciphertext> {
        trace!(
            recipients = recipients.len(),
            plaintext_len = plaintext.len(),
            "encrypting with GPG"
        );

        if recipients.is_empty() {
            return Err(CipherError::EncryptionFailed("no recipients provided".to_string()).into());
        }

        let mut args = vec!["--encrypt", "--quiet", "--trust-model", "always"];
        for recipient in recipients {
            args.extend(["--recipient", recipient.as_str()]);
        }

        let output = self.run(ctx, self.command(&args), Some(plaintext))?;
        if !output.success() {
            let stderr = output.stderr_lossy();
            if stderr.contains("No public key") || stderr.contains("unusable public key") {
                return Err(CipherError::UnknownRecipient(stderr).into());
            }
            return Err(
                CipherError::EncryptionFailed(format!("gpg encrypt failed: {}", stderr)).into(),
            );
        }

        trace!(ciphertext_len = output.stdout.len(), "encrypted with GPG");
        Ok(output.stdout)
    }

    fn decrypt(&self, ctx: &Context, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting with GPG");

        let output = self.run(ctx, self.command(&["--decrypt", "--quiet"]), Some(ciphertext))?;
        if !output.success() {
            return Err(CipherError::DecryptionFailed(format!(
                "gpg decrypt failed: {}. Ensure you have the private key in your keyring.",
                output.stderr_lossy()
            ))
            .into());
        }

        trace!(plaintext_len = output.stdout.len(), "decrypted with GPG");
        Ok(Zeroizing::new(output.stdout))
    }

    fn list_identities(&self, ctx: &Context) -> Result<Vec<RecipientId>> {
        self.list_keys(ctx, false)
    }

    fn list_private_identities(&self, ctx: &Context) -> Result<Vec<RecipientId>> {
        self.list_keys(ctx, true)
    }

    fn import_public_key(&self, ctx: &Context, material: &[u8]) -> Result<()> {
        let output = self.run(ctx, self.command(&["--import", "--quiet"]), Some(material))?;
        if !output.success() {
            return Err(CipherError::KeyImport(output.stderr_lossy()).into());
        }
        Ok(())
    }

    fn export_public_key(&self, ctx: &Context, id: &str) -> Result<Vec<u8>> {
        let output = self.run(ctx, self.command(&["--armor", "--export", id]), None)?;
        if !output.success() || output.stdout.is_empty() {
            return Err(CipherError::KeyExport(format!("no public key for {}", id)).into());
        }
        Ok(output.stdout)
    }
}
