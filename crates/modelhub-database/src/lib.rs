//! # modelhub-database
//!
//! PostgreSQL connection management, migrations, and the [`ModelStore`]
//! persistence seam with PostgreSQL and in-memory implementations.

pub mod connection;
pub mod migration;
pub mod store;

pub use connection::DatabasePool;
pub use store::{MemoryModelStore, ModelStore, PgModelStore};
