//! Model ingestion: checksum dedup, extraction, conversion, publishing.

pub mod dedup;
pub mod error;
pub mod service;

pub use dedup::{FlightGuard, SingleFlight};
pub use error::IngestError;
pub use service::{IngestOutcome, IngestService};
