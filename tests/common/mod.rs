//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use book_provider::config::ProviderConfig;
use book_provider::query::{QueryDescriptor, Row, Value};
use book_provider::storage::{SqliteStore, Storage, StorageError};

/// A backend that records every call and returns canned rows.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub calls: Mutex<Vec<(String, QueryDescriptor)>>,
    pub rows: Vec<Row>,
}

impl RecordingStore {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, QueryDescriptor)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Storage for RecordingStore {
    fn query(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Row>, StorageError> {
        self.calls
            .lock()
            .unwrap()
            .push((table.to_string(), query.clone()));
        Ok(self.rows.clone())
    }
}

/// Books used across the SQLite tests, in insertion order.
pub const BOOKS: [(&str, &str, &str); 4] = [
    ("Dune", "Frank Herbert", "sf"),
    ("Emma", "Jane Austen", "classic"),
    ("Anathem", "Neal Stephenson", "sf"),
    ("Persuasion", "Jane Austen", "classic"),
];

/// Default books config backed by an in-memory database.
pub fn books_config() -> ProviderConfig {
    let mut config = ProviderConfig::default();
    config.storage.database_path = ":memory:".to_string();
    config
}

/// Open the books store from config and insert [`BOOKS`].
pub fn seeded_store(config: &ProviderConfig) -> SqliteStore {
    let store = SqliteStore::from_config(&config.storage).unwrap();
    for (title, author, genre) in BOOKS {
        store
            .execute(
                "INSERT INTO books (title, author, genre) VALUES (?, ?, ?)",
                &[Value::from(title), Value::from(author), Value::from(genre)],
            )
            .unwrap();
    }
    store
}
