//! Core library components.
//!
//! The sub-store engine and everything it is built from: the secret tree,
//! recipient lists, the encryption and versioning backend traits with their
//! implementations, and configuration.

pub mod config;
pub mod constants;
pub mod context;
pub mod crypto;
pub mod domain;
pub mod process;
pub mod recipients;
pub mod store;
pub mod tree;
pub mod types;
pub mod vcs;
