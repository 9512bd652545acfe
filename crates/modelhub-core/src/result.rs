//! Convenience result type alias for ModelHub.

use crate::error::AppError;

/// A specialized `Result` type for ModelHub operations.
pub type AppResult<T> = Result<T, AppError>;
