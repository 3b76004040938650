//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the provider.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Authority of the bundled books provider.
pub const BOOKS_AUTHORITY: &str = "com.training.contentprovidersample";

/// Root configuration for the provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Authority every resource pattern is registered under.
    pub authority: String,

    /// Resource definitions, in match priority order.
    pub resources: Vec<ResourceConfig>,

    /// Storage backend settings.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authority: BOOKS_AUTHORITY.to_string(),
            resources: vec![
                ResourceConfig {
                    kind: "books".to_string(),
                    path: "books".to_string(),
                    table: "books".to_string(),
                    id_column: default_id_column(),
                    default_sort: Some("title ASC".to_string()),
                },
                ResourceConfig {
                    kind: "book".to_string(),
                    path: "books/#".to_string(),
                    table: "books".to_string(),
                    id_column: default_id_column(),
                    default_sort: None,
                },
            ],
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// A resource pattern and its query translation rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Unique resource-kind tag.
    pub kind: String,

    /// Path pattern relative to the authority; `#` is a numeric id.
    pub path: String,

    /// Table queried for this resource.
    pub table: String,

    /// Column compared against a captured id.
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Sort order applied when the caller gives none.
    #[serde(default)]
    pub default_sort: Option<String>,
}

fn default_id_column() -> String {
    "_id".to_string()
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file, or `:memory:`.
    pub database_path: String,

    /// Statements run every time the database is opened.
    pub bootstrap: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "books.db".to_string(),
            bootstrap: vec![
                "CREATE TABLE IF NOT EXISTS books (\
                 _id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 title VARCHAR(100), \
                 author VARCHAR(100), \
                 genre VARCHAR(50));"
                    .to_string(),
            ],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
