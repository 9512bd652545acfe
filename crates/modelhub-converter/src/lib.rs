//! # modelhub-converter
//!
//! The leaf stages of model ingestion:
//!
//! - [`archive`]: bounded, all-or-nothing zip extraction
//! - [`locator`]: picking the single model file out of the extracted entries
//! - [`checksum`]: staging an upload to disk while hashing it
//! - [`executor`]: scoped external process execution
//! - [`chain`]: the pre-conversion + primary converter chain producing glTF

pub mod archive;
pub mod chain;
pub mod checksum;
pub mod error;
pub mod executor;
pub mod formats;
pub mod locator;

pub use archive::{ArchiveEntry, ArchiveExtractor, ArchiveLimits, ExtractedArchive};
pub use chain::{ConversionChain, ConversionReport};
pub use checksum::{StagedUpload, stage_upload};
pub use error::ConversionError;
pub use executor::{ExecutionResult, ProcessExecutor};
pub use formats::ModelFormat;
pub use locator::locate_model_file;
