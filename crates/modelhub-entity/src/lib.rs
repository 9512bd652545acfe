//! # modelhub-entity
//!
//! Domain entity models for ModelHub. Database rows derive `sqlx::FromRow`;
//! annotation trees keep the field names the annotation tool submits so
//! they serialize back byte-for-byte.

pub mod annotation;
pub mod category;
pub mod model;
