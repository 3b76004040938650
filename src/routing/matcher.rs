//! Pattern matching for resource identifiers.
//!
//! # Responsibilities
//! - Compile path patterns (`books`, `books/#`) into segment specs
//! - Classify an identifier into a resource kind
//! - Capture the numeric id at a `#` position
//!
//! # Design Decisions
//! - Authority and literal segments compare exactly (case-sensitive)
//! - `#` accepts only ASCII digits that fit in an `i64`
//! - A pattern holds at most one `#`, so there is never more than one id
//! - First match wins: registration order is priority order, so a broader
//!   pattern must be registered after the narrower ones it overlaps
//! - No regex; matching is a linear scan over a short table

use std::fmt;

use thiserror::Error;

use crate::routing::identifier::ResourceIdentifier;
use crate::routing::types::ResourceKind;

/// Token for the numeric wildcard segment.
pub const NUMERIC_WILDCARD: &str = "#";

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Numeric,
}

impl Segment {
    /// Returns the captured id for a wildcard, `Some(None)` for a matching
    /// literal and `None` when the segment does not match.
    fn accept(&self, segment: &str) -> Option<Option<i64>> {
        match self {
            Segment::Literal(literal) => (literal == segment).then_some(None),
            Segment::Numeric => parse_numeric(segment).map(Some),
        }
    }
}

fn parse_numeric(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// A compiled pattern: authority plus segment specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    authority: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern from an authority and a path such as `books/#`.
    pub fn parse(authority: &str, path: &str) -> Result<Self, RegisterError> {
        if authority.is_empty() {
            return Err(RegisterError::InvalidPattern(format!(
                "pattern {path:?} has no authority"
            )));
        }

        let trimmed = path.trim_matches('/');
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('/')
                .map(|segment| match segment {
                    "" => Err(RegisterError::InvalidPattern(format!(
                        "empty segment in pattern {path:?}"
                    ))),
                    NUMERIC_WILDCARD => Ok(Segment::Numeric),
                    literal => Ok(Segment::Literal(literal.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        if segments.iter().filter(|s| matches!(s, Segment::Numeric)).count() > 1 {
            return Err(RegisterError::InvalidPattern(format!(
                "pattern {path:?} has more than one {NUMERIC_WILDCARD}"
            )));
        }

        Ok(Self {
            authority: authority.to_string(),
            segments,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern captures an id.
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Numeric))
    }

    /// Match an identifier; the inner option carries the captured id.
    fn capture(&self, identifier: &ResourceIdentifier) -> Option<Option<i64>> {
        if self.authority != identifier.authority()
            || self.segments.len() != identifier.segments().len()
        {
            return None;
        }

        let mut captured = None;
        for (spec, segment) in self.segments.iter().zip(identifier.segments()) {
            if let Some(id) = spec.accept(segment)? {
                captured = Some(id);
            }
        }
        Some(captured)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority)?;
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => write!(f, "/{}", literal)?,
                Segment::Numeric => write!(f, "/{}", NUMERIC_WILDCARD)?,
            }
        }
        Ok(())
    }
}

/// Outcome of matching an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult<K = ResourceKind> {
    NoMatch,
    Matched { kind: K, id: Option<i64> },
}

/// Errors raised while registering patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("Resource kind {0} is already registered")]
    DuplicateKind(String),

    #[error("Pattern {0} is already registered")]
    DuplicatePath(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("No translation rule for resource kind {0}")]
    MissingRule(String),
}

/// Ordered table of patterns.
#[derive(Debug, Clone)]
pub struct PatternMatcher<K = ResourceKind> {
    entries: Vec<(Pattern, K)>,
}

impl<K> Default for PatternMatcher<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Clone + PartialEq + fmt::Debug> PatternMatcher<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern. The table is left unchanged on error.
    pub fn register(&mut self, authority: &str, path: &str, kind: K) -> Result<(), RegisterError> {
        let pattern = Pattern::parse(authority, path)?;

        if self.entries.iter().any(|(_, k)| *k == kind) {
            return Err(RegisterError::DuplicateKind(format!("{:?}", kind)));
        }
        if self.entries.iter().any(|(p, _)| *p == pattern) {
            return Err(RegisterError::DuplicatePath(pattern.to_string()));
        }

        tracing::debug!(pattern = %pattern, kind = ?kind, "Registered resource pattern");
        self.entries.push((pattern, kind));
        Ok(())
    }

    /// Classify an identifier. Never fails.
    pub fn match_identifier(&self, identifier: &ResourceIdentifier) -> MatchResult<K> {
        self.entries
            .iter()
            .find_map(|(pattern, kind)| {
                pattern.capture(identifier).map(|id| MatchResult::Matched {
                    kind: kind.clone(),
                    id,
                })
            })
            .unwrap_or(MatchResult::NoMatch)
    }

    /// The pattern registered for a kind.
    pub fn pattern_for(&self, kind: &K) -> Option<&Pattern> {
        self.entries.iter().find(|(_, k)| k == kind).map(|(p, _)| p)
    }

    /// Registered (pattern, kind) pairs in priority order.
    pub fn entries(&self) -> impl Iterator<Item = (&Pattern, &K)> {
        self.entries.iter().map(|(p, k)| (p, k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
