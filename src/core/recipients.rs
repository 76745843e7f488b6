//! Recipient manager.
//!
//! A recipient file lists one ID per line. The file nearest to an entry,
//! walking from the entry's directory up to the store root, decides who the
//! entry is encrypted for, so dropping a file into a subdirectory scopes
//! that subtree to a different set of people.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::core::constants::PUBLIC_KEY_DIR;
use crate::core::context::Context;
use crate::core::crypto::{self, Crypto};
use crate::core::domain::ImportReport;
use crate::core::tree::write_atomic;
use crate::core::types::RecipientId;
use crate::error::{RecipientError, Result};

/// Recipient files of one store root.
#[derive(Debug, Clone)]
pub struct Recipients {
    root: PathBuf,
    id_file: &'static str,
}

impl Recipients {
    pub fn new(root: impl Into<PathBuf>, id_file: &'static str) -> Self {
        Self {
            root: root.into(),
            id_file,
        }
    }

    /// The recipient file at the store root.
    pub fn root_file(&self) -> PathBuf {
        self.root.join(self.id_file)
    }

    /// Directory holding exported public keys.
    pub fn key_dir(&self) -> PathBuf {
        self.root.join(PUBLIC_KEY_DIR)
    }

    /// Nearest existing recipient file, searching from `dir` up to the root.
    ///
    /// `dir` must lie inside the store root; anything else yields `None`.
    pub fn lookup(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.starts_with(&self.root) {
            return None;
        }
        dir.ancestors()
            .take_while(|d| d.starts_with(&self.root))
            .map(|d| d.join(self.id_file))
            .find(|f| f.is_file())
    }

    /// Recipients applying to `dir`; empty when no file exists in the chain.
    pub fn load_for(&self, dir: &Path) -> Result<Vec<RecipientId>> {
        match self.lookup(dir) {
            Some(file) => {
                trace!(file = %file.display(), "recipient file");
                load(&file)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Write `ids` for `dir`.
    ///
    /// With `at_the_bottom` the file is created (or replaced) at `dir`
    /// itself. Otherwise the nearest existing file is rewritten, falling
    /// back to the root file. Returns the file written.
    pub fn save(&self, ids: &[RecipientId], dir: &Path, at_the_bottom: bool) -> Result<PathBuf> {
        let file = if at_the_bottom {
            dir.join(self.id_file)
        } else {
            self.lookup(dir).unwrap_or_else(|| self.root_file())
        };
        save(&file, ids)?;
        Ok(file)
    }

    /// Every recipient file in the store, root first.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_files(&self.root, self.id_file, &mut files)?;
        files.sort_by_key(|f| f.components().count());
        Ok(files)
    }

    /// Import keys for recipients the backend doesn't know yet.
    ///
    /// Key material comes from the store's `.public-keys/<id>` files. IDs
    /// without material, or whose import fails, are reported as missing;
    /// only a failure to query the backend fails the call.
    pub fn import_missing_public_keys(
        &self,
        ctx: &Context,
        crypto: &dyn Crypto,
    ) -> Result<ImportReport> {
        ctx.check()?;

        let mut wanted: Vec<RecipientId> = Vec::new();
        for file in self.files()? {
            for id in load(&file)? {
                if !wanted.contains(&id) {
                    wanted.push(id);
                }
            }
        }

        let known = crypto.list_identities(ctx)?;
        let mut report = ImportReport::default();

        for id in wanted.into_iter().filter(|id| !crypto::is_known(&known, id)) {
            ctx.check()?;
            let Some(path) = self.key_path(&id) else {
                warn!(id = %id, "recipient id is not usable as a key file name");
                report.missing.push(id);
                continue;
            };
            if !path.is_file() {
                debug!(id = %id, "no public key material in store");
                report.missing.push(id);
                continue;
            }

            let material = fs::read(&path)?;
            match crypto.import_public_key(ctx, &material) {
                Ok(()) => {
                    debug!(id = %id, "imported public key");
                    report.imported.push(id);
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(id = %id, error = %e, "failed to import public key");
                    report.missing.push(id);
                }
            }
        }

        Ok(report)
    }

    /// Export the public key of `id` into the store, unless already there.
    ///
    /// Returns the written path, or `None` if a key file already existed.
    pub fn export_public_key(
        &self,
        ctx: &Context,
        crypto: &dyn Crypto,
        id: &str,
    ) -> Result<Option<PathBuf>> {
        let path = self
            .key_path(id)
            .ok_or_else(|| RecipientError::InvalidId(id.to_string()))?;
        if path.exists() {
            return Ok(None);
        }
        let material = crypto.export_public_key(ctx, id)?;
        write_atomic(&path, &material)?;
        debug!(id, path = %path.display(), "exported public key");
        Ok(Some(path))
    }

    pub(crate) fn key_path(&self, id: &str) -> Option<PathBuf> {
        if id.is_empty() || id.starts_with('.') || id.contains(&['/', '\\', '\0'][..]) {
            return None;
        }
        Some(self.key_dir().join(id))
    }
}

/// Read a recipient file. Blank lines are skipped and duplicates dropped.
pub fn load(file: &Path) -> Result<Vec<RecipientId>> {
    let contents = fs::read_to_string(file)?;
    Ok(parse(&contents))
}

/// Parse recipient file contents.
pub fn parse(contents: &str) -> Vec<RecipientId> {
    dedup(contents.lines().map(str::trim).filter(|l| !l.is_empty()))
}

/// Write `ids` one per line, first occurrence kept.
pub fn save(file: &Path, ids: &[RecipientId]) -> Result<()> {
    let ids = dedup(ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()));
    if let Some(bad) = ids.iter().find(|id| id.contains(char::is_whitespace)) {
        return Err(RecipientError::InvalidId(bad.clone()).into());
    }

    let mut contents = String::new();
    for id in &ids {
        contents.push_str(id);
        contents.push('\n');
    }
    write_atomic(file, contents.as_bytes())?;
    debug!(file = %file.display(), recipients = ids.len(), "recipients saved");
    Ok(())
}

fn dedup<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<RecipientId> {
    let mut out: Vec<RecipientId> = Vec::new();
    for id in ids {
        if !out.iter().any(|o| o == id) {
            out.push(id.to_string());
        }
    }
    out
}

fn collect_files(dir: &Path, id_file: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let candidate = dir.join(id_file);
    if candidate.is_file() {
        out.push(candidate);
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_dir() {
            collect_files(&entry.path(), id_file, out)?;
        }
    }
    Ok(())
}
