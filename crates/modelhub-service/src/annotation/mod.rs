//! Part/mobility annotation: validation and save.

pub mod error;
pub mod service;
pub mod validator;

pub use error::{AnnotationError, TreeValidationError};
pub use service::{AnnotationService, SaveAnnotationRequest};
pub use validator::validate_annotation;
