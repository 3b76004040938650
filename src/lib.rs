//! URI-addressed resource provider over a table store.

pub mod config;
pub mod observability;
pub mod query;
pub mod routing;
pub mod storage;

pub use config::ProviderConfig;
pub use query::{Columns, Predicate, QueryDescriptor, Row, Value};
pub use routing::{ProviderError, ResourceIdentifier, ResourceRouter};
pub use storage::{SqliteStore, Storage, StorageError};
