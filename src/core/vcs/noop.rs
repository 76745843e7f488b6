//! Versioning disabled.

use std::path::PathBuf;

use tracing::trace;

use super::Versioning;
use crate::core::context::Context;
use crate::core::domain::BackendVersion;
use crate::error::Result;

/// Accepts every call and records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Noop;

impl Versioning for Noop {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn init(&self, ctx: &Context, _user_name: &str, _email: &str) -> Result<()> {
        ctx.check()
    }

    fn add(&self, ctx: &Context, paths: &[PathBuf]) -> Result<()> {
        trace!(paths = paths.len(), "noop add");
        ctx.check()
    }

    fn commit(&self, ctx: &Context, message: &str) -> Result<()> {
        trace!(message, "noop commit");
        ctx.check()
    }

    fn push(&self, ctx: &Context, _remote: &str, _branch: &str) -> Result<()> {
        ctx.check()
    }

    fn pull(&self, ctx: &Context, _remote: &str, _branch: &str) -> Result<()> {
        ctx.check()
    }

    fn version(&self, _ctx: &Context) -> BackendVersion {
        BackendVersion::Unknown
    }
}
