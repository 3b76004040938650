//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (identifier, columns, predicate, sort order)
//!     → identifier.rs (authority + segments)
//!     → matcher.rs (evaluate registered patterns)
//!     → router.rs (rule lookup, predicate/sort translation)
//!     → Storage::query(table, descriptor)
//!
//! Router construction (at startup):
//!     ResourceConfig[] or RouterBuilder calls
//!     → Compile patterns in registration order
//!     → Freeze as immutable ResourceRouter
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - No regex (literal and numeric segments only)
//! - Deterministic: same input always matches same pattern
//! - First match wins (registration order)

pub mod identifier;
pub mod matcher;
pub mod router;
pub mod types;

pub use identifier::ResourceIdentifier;
pub use matcher::{MatchResult, Pattern, PatternMatcher, RegisterError, Segment};
pub use router::{ResourceRouter, ResourceRule, RouterBuilder, TranslatedQuery};
pub use types::{Operation, ProviderError, ProviderResult, ResourceKind};
