//! Resource identifiers.
//!
//! # Responsibilities
//! - Parse `scheme://authority/seg/seg` into authority + path segments
//! - Reject structurally invalid identifiers up front
//!
//! # Design Decisions
//! - Immutable once parsed
//! - `parse` percent-decodes each segment after splitting, so `%2F` stays
//!   inside its segment; `new` takes segments as written
//! - A single trailing slash is ignored, interior empty segments are not

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::routing::types::ProviderError;

/// A parsed resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentifier {
    authority: String,
    segments: Vec<String>,
}

impl ResourceIdentifier {
    /// Build an identifier from an authority and a relative path such as `books/2`.
    pub fn new(authority: impl Into<String>, path: &str) -> Result<Self, ProviderError> {
        let authority = authority.into();
        if authority.is_empty() {
            return Err(ProviderError::MalformedRequest(
                "resource identifier has no authority".into(),
            ));
        }
        let segments = split_segments(path)?;
        Ok(Self {
            authority,
            segments,
        })
    }

    /// Parse a full identifier, e.g. `content://com.example.books/books/2`.
    pub fn parse(input: &str) -> Result<Self, ProviderError> {
        let url = Url::parse(input).map_err(|e| {
            ProviderError::MalformedRequest(format!("invalid resource identifier {input:?}: {e}"))
        })?;

        let authority = match url.host_str() {
            Some(host) if !host.is_empty() => match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            _ => {
                return Err(ProviderError::MalformedRequest(format!(
                    "resource identifier {input:?} has no authority"
                )))
            }
        };

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ProviderError::MalformedRequest(format!(
                "resource identifier {input:?} must not carry a query or fragment"
            )));
        }

        let segments = split_segments(url.path())?
            .into_iter()
            .map(|segment| decode_segment(&segment))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            authority,
            segments,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Ordered path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last path segment, if any.
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl FromStr for ResourceIdentifier {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content://{}", self.authority)?;
        for segment in &self.segments {
            write!(f, "/{}", urlencoding::encode(segment))?;
        }
        Ok(())
    }
}

fn split_segments(path: &str) -> Result<Vec<String>, ProviderError> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        return Ok(Vec::new());
    }

    path.split('/')
        .map(|segment| {
            if segment.is_empty() {
                Err(ProviderError::MalformedRequest(format!(
                    "empty path segment in {path:?}"
                )))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

fn decode_segment(segment: &str) -> Result<String, ProviderError> {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            ProviderError::MalformedRequest(format!(
                "path segment {segment:?} is not valid UTF-8 once decoded: {e}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_uri() {
        let id = ResourceIdentifier::parse("content://com.training.contentprovidersample/books/2")
            .unwrap();
        assert_eq!(id.authority(), "com.training.contentprovidersample");
        assert_eq!(id.segments(), ["books", "2"]);
        assert_eq!(id.last_segment(), Some("2"));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let id = ResourceIdentifier::parse("content://books.example/books/").unwrap();
        assert_eq!(id.segments(), ["books"]);
    }

    #[test]
    fn test_root_has_no_segments() {
        let id = ResourceIdentifier::parse("content://books.example").unwrap();
        assert!(id.segments().is_empty());
        assert_eq!(id.last_segment(), None);
    }

    #[test]
    fn test_rejects_missing_authority() {
        let err = ResourceIdentifier::parse("content:books/2").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));

        let err = ResourceIdentifier::new("", "books").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
    }

    #[test]
    fn test_rejects_empty_interior_segment() {
        let err = ResourceIdentifier::parse("content://books.example/books//2").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
    }

    #[test]
    fn test_rejects_query_string() {
        let err = ResourceIdentifier::parse("content://books.example/books?x=1").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let id = ResourceIdentifier::parse("content://books.example/shelves/my book").unwrap();
        assert_eq!(id.segments(), ["shelves", "my book"]);

        let id = ResourceIdentifier::parse("content://books.example/shelves/a%2Fb").unwrap();
        assert_eq!(id.segments(), ["shelves", "a/b"]);
    }

    #[test]
    fn test_rejects_invalid_utf8_segment() {
        let err = ResourceIdentifier::parse("content://books.example/books/%FF").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
    }

    #[test]
    fn test_display_round_trips() {
        let id = ResourceIdentifier::new("books.example", "books/7").unwrap();
        assert_eq!(id.to_string(), "content://books.example/books/7");
        assert_eq!(id.to_string().parse::<ResourceIdentifier>().unwrap(), id);

        let spaced = ResourceIdentifier::parse("content://books.example/shelves/my%20book").unwrap();
        assert_eq!(spaced.to_string(), "content://books.example/shelves/my%20book");
        assert_eq!(spaced.to_string().parse::<ResourceIdentifier>().unwrap(), spaced);
    }
}
