//! Configuration.
//!
//! `StoreOptions` tune the engine and are usable on their own. `Config` is
//! what the binary reads from `config.toml`: where the store lives and which
//! backends drive it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{APP_DIR, CONFIG_ENV};
use crate::error::{ConfigError, Result};

/// Engine behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Commit after every mutation. When false changes are only tracked.
    pub auto_commit: bool,
    /// Refuse to open a store whose versioning backend is not initialized.
    pub require_versioning: bool,
    /// Export public keys into the store when recipients are added.
    pub export_keys: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            auto_commit: true,
            require_versioning: false,
            export_keys: true,
        }
    }
}

/// Encryption backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoKind {
    Age,
    Gpg,
}

/// Versioning backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Noop,
}

/// age backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeConfig {
    /// Identity file holding the caller's private key(s).
    pub identity: PathBuf,
    /// File collecting imported recipient public keys.
    pub keyring: PathBuf,
}

impl Default for AgeConfig {
    fn default() -> Self {
        let dir = config_dir();
        Self {
            identity: dir.join("identity.txt"),
            keyring: dir.join("keyring.txt"),
        }
    }
}

/// Binary configuration, `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store root.
    pub path: PathBuf,
    /// Encryption backend: "age" or "gpg".
    pub crypto: String,
    /// Versioning backend: "git" or "noop".
    pub vcs: String,
    pub age: AgeConfig,
    pub store: StoreOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("store"),
            crypto: "age".to_string(),
            vcs: "git".to_string(),
            age: AgeConfig::default(),
            store: StoreOptions::default(),
        }
    }
}

impl Config {
    /// Location of the config file: `$CELLAR_CONFIG` or the platform
    /// config directory.
    pub fn config_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => config_dir().join("config.toml"),
        }
    }

    /// Load from [`Config::config_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::InvalidValue` for unknown backend names.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.crypto_kind()?;
        config.vcs_kind()?;
        debug!(path = %path.display(), crypto = %config.crypto, vcs = %config.vcs, "config loaded");
        Ok(config)
    }

    pub fn crypto_kind(&self) -> Result<CryptoKind> {
        match self.crypto.to_ascii_lowercase().as_str() {
            "age" => Ok(CryptoKind::Age),
            "gpg" => Ok(CryptoKind::Gpg),
            _ => Err(invalid("crypto", &self.crypto)),
        }
    }

    pub fn vcs_kind(&self) -> Result<VcsKind> {
        match self.vcs.to_ascii_lowercase().as_str() {
            "git" => Ok(VcsKind::Git),
            "noop" | "none" => Ok(VcsKind::Noop),
            _ => Err(invalid("vcs", &self.vcs)),
        }
    }
}

fn invalid(field: &str, value: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
