//! Storage backends.
//!
//! # Data Flow
//! ```text
//! ResourceRouter (translated descriptor)
//!     → Storage::query(table, descriptor)
//!     → sqlite.rs (render parameterised SELECT, bind args)
//!     → Vec<Row> or StorageError
//! ```
//!
//! # Design Decisions
//! - The router only sees the trait; backends own their own locking
//! - Backend failures are opaque to the router and passed through verbatim

pub mod sqlite;

use std::fmt;

use thiserror::Error;

use crate::query::{QueryDescriptor, Row};

pub use sqlite::SqliteStore;

/// Opaque backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A table-oriented store the router delegates queries to.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Run a table-scoped query and return all matching rows.
    fn query(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Row>, StorageError>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn query(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Row>, StorageError> {
        (**self).query(table, query)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn query(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Row>, StorageError> {
        (**self).query(table, query)
    }
}
