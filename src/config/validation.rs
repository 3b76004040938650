//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check resource patterns compile and do not collide
//! - Check table and column names are plain identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProviderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::ProviderConfig;
use crate::routing::matcher::Pattern;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProviderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.authority.trim().is_empty() {
        errors.push(ValidationError::new("authority", "must not be empty"));
    }

    if config.resources.is_empty() {
        errors.push(ValidationError::new("resources", "at least one resource is required"));
    }

    let mut kinds = HashSet::new();
    let mut patterns: Vec<Pattern> = Vec::new();

    for (i, resource) in config.resources.iter().enumerate() {
        let field = |name: &str| format!("resources[{}].{}", i, name);

        if resource.kind.trim().is_empty() {
            errors.push(ValidationError::new(field("kind"), "must not be empty"));
        } else if !kinds.insert(resource.kind.as_str()) {
            errors.push(ValidationError::new(
                field("kind"),
                format!("duplicate resource kind {:?}", resource.kind),
            ));
        }

        if !config.authority.trim().is_empty() {
            match Pattern::parse(&config.authority, &resource.path) {
                Ok(pattern) => {
                    if patterns.contains(&pattern) {
                        errors.push(ValidationError::new(
                            field("path"),
                            format!("duplicate pattern {:?}", resource.path),
                        ));
                    } else {
                        patterns.push(pattern);
                    }
                }
                Err(e) => errors.push(ValidationError::new(field("path"), e.to_string())),
            }
        }

        if !is_identifier(&resource.table) {
            errors.push(ValidationError::new(
                field("table"),
                format!("{:?} is not a valid table name", resource.table),
            ));
        }
        if !is_identifier(&resource.id_column) {
            errors.push(ValidationError::new(
                field("id_column"),
                format!("{:?} is not a valid column name", resource.id_column),
            ));
        }
        if let Some(sort) = &resource.default_sort {
            if sort.trim().is_empty() {
                errors.push(ValidationError::new(
                    field("default_sort"),
                    "must be omitted rather than empty",
                ));
            }
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ValidationError::new("storage.database_path", "must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Letters, digits and underscores, not starting with a digit.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
