//! Test support utilities for cellar integration tests.
//!
//! Provides isolated store environments for the library API and the binary.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;
use std::sync::Arc;

use cellar::core::config::{AgeConfig, Config, StoreOptions};
use cellar::core::context::Context;
use cellar::core::crypto::{Crypto, Mock};
use cellar::core::store::Store;
use cellar::core::vcs::Noop;
use tempfile::TempDir;

/// Binary test environment with isolated temp directories.
///
/// Each test gets its own store dir and home dir, and a config file pointing
/// the binary at them through `CELLAR_CONFIG`. No process-global state is
/// mutated, so tests can run in parallel.
pub struct Test {
    /// Parent of the store root
    pub dir: TempDir,
    /// Temporary home directory holding config and identity
    pub home: TempDir,
}

impl Test {
    /// Create an environment with a config file but no store.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let t = Self { dir, home };

        let config = Config {
            path: t.store_path(),
            crypto: "age".to_string(),
            vcs: "noop".to_string(),
            age: AgeConfig {
                identity: t.identity_path(),
                keyring: t.home.path().join("keyring.txt"),
            },
            store: StoreOptions::default(),
        };
        let toml = toml::to_string(&config).expect("failed to serialize config");
        std::fs::write(t.config_path(), toml).expect("failed to write config");
        t
    }

    /// Create an environment with a store initialized for a fresh identity.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.init_cmd(&[]);
        assert!(
            output.status.success(),
            "Failed to initialize store: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Create an initialized environment holding `entries`.
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let t = Self::init();
        for (name, value) in entries {
            let output = t.insert(name, value);
            assert!(
                output.status.success(),
                "Failed to insert {}: {}",
                name,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("config.toml")
    }

    pub fn identity_path(&self) -> PathBuf {
        self.home.path().join("identity.txt")
    }
}

/// Library test environment: a store on a temp dir with injected backends.
pub struct StoreEnv {
    pub dir: TempDir,
    pub store: Store,
    pub ctx: Context,
}

impl StoreEnv {
    /// Empty store without any recipient list.
    pub fn empty(crypto: Arc<dyn Crypto>) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = Store::open(dir.path(), "", crypto, Arc::new(Noop)).expect("failed to open store");
        Self {
            dir,
            store,
            ctx: Context::background(),
        }
    }

    /// Store initialized for `ids` with a permissive mock backend.
    pub fn mock(ids: &[&str]) -> Self {
        Self::with_crypto(Arc::new(Mock::new()), ids)
    }

    /// Store initialized for `ids`.
    pub fn with_crypto(crypto: Arc<dyn Crypto>, ids: &[&str]) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let ctx = Context::background();
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let store = Store::init(
            &ctx,
            dir.path(),
            "",
            crypto,
            Arc::new(Noop),
            StoreOptions::default(),
            &ids,
        )
        .expect("failed to init store");
        Self { dir, store, ctx }
    }

    /// Every file below the store root, relative and sorted.
    pub fn files(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect(self.dir.path(), self.dir.path(), &mut out);
        out.sort();
        out
    }
}

fn collect(root: &std::path::Path, dir: &std::path::Path, out: &mut Vec<String>) {
    for entry in std::fs::read_dir(dir).expect("failed to read dir") {
        let entry = entry.expect("failed to read entry");
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).expect("path outside root");
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
