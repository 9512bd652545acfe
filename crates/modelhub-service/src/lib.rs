//! # modelhub-service
//!
//! Application services for ModelHub. Each service receives its
//! collaborators at construction time as `Arc` references:
//!
//! - [`IngestService`]: upload → dedup → extract → locate → convert → publish
//! - [`AnnotationService`]: validate and persist part/mobility annotations
//! - [`CatalogService`]: categories and model listings

pub mod annotation;
pub mod catalog;
pub mod context;
pub mod ingest;
pub mod layout;

pub use annotation::{
    AnnotationError, AnnotationService, SaveAnnotationRequest, TreeValidationError,
    validate_annotation,
};
pub use catalog::CatalogService;
pub use context::RequestContext;
pub use ingest::{IngestError, IngestOutcome, IngestService};
pub use layout::ModelLayout;
