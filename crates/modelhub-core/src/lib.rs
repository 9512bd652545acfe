//! # modelhub-core
//!
//! Core crate for ModelHub. Contains configuration schemas, pagination
//! types, and the unified error system shared by the ingestion pipeline,
//! the annotation validator, and the persistence layer.
//!
//! This crate has **no** internal dependencies on other ModelHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
