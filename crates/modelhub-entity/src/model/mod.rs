//! Ingested model entities.

pub mod grant;
pub mod identity;

pub use grant::{AccessGrant, UPLOADER_ACCESS_LEVEL};
pub use identity::{IngestedModel, ModelIdentity, NewModel};
