//! Secret tree.
//!
//! Maps hierarchical entry names onto files below the store root and
//! enumerates them. Entry `a/b/c` lives at `<root>/a/b/c.<ext>`. Hidden
//! files and directories (leading `.`) are never entries, which keeps
//! recipient lists, exported keys and `.git` out of listings.
//!
//! Symlinks are not followed: a name whose existing part resolves outside
//! the store root is rejected, and listings skip symlinks altogether.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::core::types::SecretName;
use crate::error::{Result, SecretError};

/// Filesystem view of one store root.
#[derive(Debug, Clone)]
pub struct Tree {
    root: PathBuf,
    ext: &'static str,
}

impl Tree {
    pub fn new(root: impl Into<PathBuf>, ext: &'static str) -> Self {
        Self {
            root: root.into(),
            ext,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ext(&self) -> &'static str {
        self.ext
    }

    /// Path of the entry `name`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::InvalidName` for empty names, empty, `.` or `..`
    /// segments, leading or trailing slashes, hidden segments, and names
    /// that reach outside the root through a symlink.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.root.join(format!("{}.{}", name, self.ext));
        self.ensure_inside(name, &path)?;
        Ok(path)
    }

    /// Directory for a subtree prefix. The empty prefix is the root.
    pub fn resolve_dir(&self, prefix: &str) -> Result<PathBuf> {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Ok(self.root.clone());
        }
        validate_name(prefix)?;
        let path = self.root.join(prefix);
        self.ensure_inside(prefix, &path)?;
        Ok(path)
    }

    fn ensure_inside(&self, name: &str, path: &Path) -> Result<()> {
        let escapes = path
            .strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            })
            .unwrap_or(true);
        if escapes || !self.stays_inside(path) {
            return Err(SecretError::invalid(name, "resolves outside the store root").into());
        }
        Ok(())
    }

    /// Whether the deepest existing part of `path` really lies below the
    /// root once symlinks are resolved. Dangling links count as outside.
    fn stays_inside(&self, path: &Path) -> bool {
        let Ok(root) = self.root.canonicalize() else {
            // nothing on disk yet
            return true;
        };
        let Some(existing) = path.ancestors().find(|p| p.symlink_metadata().is_ok()) else {
            return true;
        };
        existing
            .canonicalize()
            .map(|real| real.starts_with(&root))
            .unwrap_or(false)
    }

    /// Whether `name` is an existing entry.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Whether `prefix` is an existing directory.
    pub fn is_dir(&self, prefix: &str) -> bool {
        self.resolve_dir(prefix).map(|p| p.is_dir()).unwrap_or(false)
    }

    /// Every entry below `prefix`, sorted by byte order.
    ///
    /// Names are relative to the store root. A missing prefix yields an
    /// empty list.
    pub fn list(&self, prefix: &str) -> Result<Vec<SecretName>> {
        let dir = self.resolve_dir(prefix)?;
        let mut names = Vec::new();
        if !dir.is_dir() {
            return Ok(names);
        }

        let base = prefix.trim_end_matches('/');
        match self.walk(&dir, base, &mut names) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        names.sort();
        trace!(prefix, entries = names.len(), "listed");
        Ok(names)
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<SecretName>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                trace!(path = %entry.path().display(), "skipping symlink");
                continue;
            }
            if file_type.is_dir() {
                self.walk(&entry.path(), &join(prefix, file_name), out)?;
            } else if let Some(stem) = file_name
                .strip_suffix(self.ext)
                .and_then(|s| s.strip_suffix('.'))
            {
                if !stem.is_empty() {
                    out.push(join(prefix, stem));
                }
            }
        }
        Ok(())
    }

    /// Read the raw ciphertext of `name`.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|e| not_found_or(e, name))
    }

    /// Write `bytes` as the content of `name`, replacing it atomically.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.resolve(name)?;
        write_atomic(&path, bytes)?;
        debug!(name, path = %path.display(), "entry written");
        Ok(path)
    }

    /// Delete the entry `name`. Empty parent directories are left in place.
    pub fn remove(&self, name: &str) -> Result<PathBuf> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).map_err(|e| not_found_or(e, name))?;
        debug!(name, "entry removed");
        Ok(path)
    }

    /// Delete the directory `prefix` and everything in it.
    pub fn remove_dir(&self, prefix: &str) -> Result<PathBuf> {
        if prefix.trim_end_matches('/').is_empty() {
            return Err(SecretError::invalid(prefix, "refusing to remove the store root").into());
        }
        let path = self.resolve_dir(prefix)?;
        fs::remove_dir_all(&path).map_err(|e| not_found_or(e, prefix))?;
        debug!(prefix, "subtree removed");
        Ok(path)
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn not_found_or(e: io::Error, name: &str) -> crate::error::Error {
    if e.kind() == io::ErrorKind::NotFound {
        SecretError::NotFound(name.to_string()).into()
    } else {
        e.into()
    }
}

/// Check an entry name or subtree prefix.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SecretError::invalid(name, "empty name").into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(SecretError::invalid(name, "leading or trailing slash").into());
    }
    if name.contains('\\') || name.contains('\0') {
        return Err(SecretError::invalid(name, "contains a backslash or NUL").into());
    }
    for segment in name.split('/') {
        match segment {
            "" => return Err(SecretError::invalid(name, "empty path segment").into()),
            "." | ".." => return Err(SecretError::invalid(name, "path traversal").into()),
            s if s.starts_with('.') => {
                return Err(SecretError::invalid(name, "hidden path segment").into())
            }
            _ => {}
        }
    }
    Ok(())
}

/// Write `bytes` to `path` via a temp file in the same directory.
///
/// A crash leaves either the old content or the new one, never a partial
/// file. Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
