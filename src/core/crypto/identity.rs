//! age identity files.
//!
//! An identity file holds one or more `AGE-SECRET-KEY-1...` lines; `#` lines
//! are comments. Files are written with mode 0600 and a warning is logged
//! when an existing file is more permissive.

use std::fs;
use std::io::Write;
use std::path::Path;

use ::age::x25519;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{CipherError, Result};

/// Load every identity in the file at `path`.
///
/// # Errors
///
/// Returns `CipherError::Unavailable` if the file doesn't exist and
/// `CipherError::InvalidIdentity` if a line fails to parse or the file holds
/// no identity.
pub fn load(path: &Path) -> Result<Vec<x25519::Identity>> {
    debug!(path = %path.display(), "loading identity");

    if !path.exists() {
        return Err(CipherError::Unavailable(format!("no identity at {}", path.display())).into());
    }

    #[cfg(unix)]
    check_permissions(path);

    let contents = fs::read_to_string(path)?;
    let identities = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| {
            l.parse::<x25519::Identity>()
                .map_err(|e: &str| CipherError::InvalidIdentity(e.to_string()).into())
        })
        .collect::<Result<Vec<_>>>()?;

    if identities.is_empty() {
        return Err(CipherError::InvalidIdentity(format!(
            "{} contains no identity",
            path.display()
        ))
        .into());
    }

    debug!(count = identities.len(), "identity loaded");
    Ok(identities)
}

/// Generate a new identity and save it to `path`.
///
/// Parent directories are created as needed. The key goes to a 0600 temp
/// file next to `path` that is then renamed into place.
pub fn generate(path: &Path) -> Result<x25519::Identity> {
    debug!(path = %path.display(), "generating new identity");

    let identity = x25519::Identity::generate();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // Write identity using Display trait (outputs AGE-SECRET-KEY-...)
    use ::age::secrecy::ExposeSecret;
    let secret = identity.to_string();
    let contents = format!(
        "# public key: {}\n{}\n",
        identity.to_public(),
        secret.expose_secret()
    );
    let contents = zeroize::Zeroizing::new(contents);

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "identity saved");
    Ok(identity)
}

#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "insecure identity file permissions"
            );
        }
    }
}
