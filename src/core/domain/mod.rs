//! Domain types.

mod report;
mod secret;
mod version;

pub use report::{ImportReport, ReencryptReport};
pub use secret::Secret;
pub use version::BackendVersion;
