//! Query model.
//!
//! # Data Flow
//! ```text
//! Caller
//!     → QueryDescriptor { columns, predicate, sort_order }
//!     → router translation (default sort, id clause)
//!     → Storage::query(table, descriptor)
//!     → Vec<Row>
//! ```
//!
//! # Design Decisions
//! - Predicate text and bound values travel separately
//! - An empty sort order is the same as no sort order

pub mod predicate;
pub mod row;
pub mod value;

use serde::{Deserialize, Serialize};

pub use predicate::Predicate;
pub use row::Row;
pub use value::Value;

/// Columns requested by a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Columns {
    #[default]
    All,
    Named(Vec<String>),
}

impl Columns {
    pub fn named<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Columns::Named(columns.into_iter().map(Into::into).collect())
    }
}

/// A caller's query: projection, selection and ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub columns: Columns,
    pub predicate: Predicate,
    pub sort_order: Option<String>,
}

impl QueryDescriptor {
    /// All columns, no filter, storage order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: Columns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_sort_order(mut self, sort_order: impl Into<String>) -> Self {
        self.sort_order = Some(sort_order.into());
        self
    }

    /// Sort order, treating blank strings as absent.
    pub fn effective_sort_order(&self) -> Option<&str> {
        self.sort_order
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}
