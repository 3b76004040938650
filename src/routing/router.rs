//! Resource lookup and query translation.
//!
//! # Responsibilities
//! - Own the compiled pattern table and per-kind translation rules
//! - Translate a caller query into a table-scoped backend query
//! - Delegate to storage and return its rows or error unchanged
//! - Report unimplemented operations explicitly
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Explicit `UnknownResource` rather than forwarding unmatched input
//! - Captured ids are bound as arguments, never spliced into predicate text

use std::collections::HashMap;
use std::time::Instant;

use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::observability::metrics;
use crate::query::{Columns, Predicate, QueryDescriptor, Row};
use crate::routing::identifier::ResourceIdentifier;
use crate::routing::matcher::{MatchResult, PatternMatcher, RegisterError};
use crate::routing::types::{Operation, ProviderError, ProviderResult, ResourceKind};
use crate::storage::Storage;

/// Column compared against a captured id unless a rule names another.
pub const DEFAULT_ID_COLUMN: &str = "_id";

/// How queries for one resource kind are translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRule {
    /// Table the query is scoped to.
    pub table: String,
    /// Column matched against a captured id.
    pub id_column: String,
    /// Sort order substituted when the caller gives none.
    pub default_sort: Option<String>,
}

impl ResourceRule {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            default_sort: None,
        }
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    pub fn with_default_sort(mut self, sort: impl Into<String>) -> Self {
        self.default_sort = Some(sort.into());
        self
    }
}

/// A query after translation, ready for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedQuery {
    pub kind: ResourceKind,
    pub table: String,
    pub query: QueryDescriptor,
}

/// Collects patterns and rules before a router is built.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    matcher: PatternMatcher<ResourceKind>,
    rules: HashMap<ResourceKind, ResourceRule>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern and its rule. Registration order is match priority.
    ///
    /// A rejected registration leaves the builder as it was.
    pub fn resource(
        &mut self,
        authority: &str,
        path: &str,
        kind: impl Into<ResourceKind>,
        rule: ResourceRule,
    ) -> Result<&mut Self, RegisterError> {
        let kind = kind.into();
        self.matcher.register(authority, path, kind.clone())?;
        self.rules.insert(kind, rule);
        Ok(self)
    }

    pub fn build<S: Storage>(self, storage: S) -> ResourceRouter<S> {
        ResourceRouter {
            matcher: self.matcher,
            rules: self.rules,
            storage,
        }
    }
}

/// Routes identifiers to storage queries.
#[derive(Debug)]
pub struct ResourceRouter<S> {
    matcher: PatternMatcher<ResourceKind>,
    rules: HashMap<ResourceKind, ResourceRule>,
    storage: S,
}

impl<S: Storage> ResourceRouter<S> {
    /// Build from a prepared matcher; every registered kind needs a rule.
    pub fn new(
        matcher: PatternMatcher<ResourceKind>,
        rules: HashMap<ResourceKind, ResourceRule>,
        storage: S,
    ) -> Result<Self, RegisterError> {
        if let Some((_, kind)) = matcher.entries().find(|(_, k)| !rules.contains_key(*k)) {
            return Err(RegisterError::MissingRule(kind.to_string()));
        }
        Ok(Self {
            matcher,
            rules,
            storage,
        })
    }

    /// Build the router described by a (validated) configuration.
    pub fn from_config(config: &ProviderConfig, storage: S) -> Result<Self, RegisterError> {
        let mut builder = RouterBuilder::new();
        for resource in &config.resources {
            let mut rule =
                ResourceRule::new(resource.table.clone()).with_id_column(resource.id_column.clone());
            rule.default_sort = resource.default_sort.clone();
            builder.resource(
                &config.authority,
                &resource.path,
                resource.kind.as_str(),
                rule,
            )?;
        }
        tracing::info!(
            authority = %config.authority,
            resources = config.resources.len(),
            "Resource router built"
        );
        Ok(builder.build(storage))
    }

    pub fn matcher(&self) -> &PatternMatcher<ResourceKind> {
        &self.matcher
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Classify an identifier without querying.
    pub fn match_identifier(&self, identifier: &ResourceIdentifier) -> MatchResult<ResourceKind> {
        self.matcher.match_identifier(identifier)
    }

    /// Validate and translate a caller query without running it.
    pub fn translate(
        &self,
        identifier: &ResourceIdentifier,
        query: QueryDescriptor,
    ) -> ProviderResult<TranslatedQuery> {
        query
            .predicate
            .validate()
            .map_err(ProviderError::MalformedRequest)?;
        if matches!(&query.columns, Columns::Named(columns) if columns.is_empty()) {
            return Err(ProviderError::MalformedRequest(
                "projection names no columns".into(),
            ));
        }

        let (kind, id) = match self.matcher.match_identifier(identifier) {
            MatchResult::Matched { kind, id } => (kind, id),
            MatchResult::NoMatch => {
                return Err(ProviderError::UnknownResource(identifier.to_string()))
            }
        };
        let rule = self
            .rules
            .get(&kind)
            .ok_or_else(|| ProviderError::UnknownResource(identifier.to_string()))?;

        let mut query = query;
        if query.effective_sort_order().is_none() {
            query.sort_order = rule.default_sort.clone();
        }
        if let Some(id) = id {
            let caller = std::mem::take(&mut query.predicate);
            query.predicate = caller.and(Predicate::column_equals(&rule.id_column, id));
        }

        Ok(TranslatedQuery {
            kind,
            table: rule.table.clone(),
            query,
        })
    }

    /// Run a query against the resource named by `identifier`.
    pub fn query(
        &self,
        identifier: &ResourceIdentifier,
        query: QueryDescriptor,
    ) -> ProviderResult<Vec<Row>> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "provider.query",
            request_id = %request_id,
            identifier = %identifier
        );
        let _enter = span.enter();
        let start = Instant::now();

        let translated = match self.translate(identifier, query) {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(error = %e, "Query rejected");
                metrics::record_query("none", e.label(), start);
                return Err(e);
            }
        };

        tracing::debug!(
            kind = %translated.kind,
            table = %translated.table,
            predicate = %translated.query.predicate.text(),
            args = translated.query.predicate.args().len(),
            sort_order = ?translated.query.sort_order,
            "Dispatching query"
        );

        match self.storage.query(&translated.table, &translated.query) {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "Query complete");
                metrics::record_query(translated.kind.as_str(), "ok", start);
                metrics::record_rows(translated.kind.as_str(), rows.len());
                Ok(rows)
            }
            Err(e) => {
                tracing::error!(error = %e, kind = %translated.kind, "Storage query failed");
                metrics::record_query(translated.kind.as_str(), "storage_error", start);
                Err(ProviderError::Storage(e))
            }
        }
    }

    /// Not supported; returns the identifier of the new row in a full provider.
    pub fn insert(
        &self,
        identifier: &ResourceIdentifier,
        _values: &Row,
    ) -> ProviderResult<ResourceIdentifier> {
        Err(self.unsupported(Operation::Insert, identifier))
    }

    /// Not supported; returns the number of rows changed in a full provider.
    pub fn update(
        &self,
        identifier: &ResourceIdentifier,
        _values: &Row,
        _predicate: &Predicate,
    ) -> ProviderResult<usize> {
        Err(self.unsupported(Operation::Update, identifier))
    }

    /// Not supported; returns the number of rows removed in a full provider.
    pub fn delete(
        &self,
        identifier: &ResourceIdentifier,
        _predicate: &Predicate,
    ) -> ProviderResult<usize> {
        Err(self.unsupported(Operation::Delete, identifier))
    }

    /// Not supported; returns the content type of a resource in a full provider.
    pub fn resource_type(&self, identifier: &ResourceIdentifier) -> ProviderResult<String> {
        Err(self.unsupported(Operation::ResourceType, identifier))
    }

    fn unsupported(&self, operation: Operation, identifier: &ResourceIdentifier) -> ProviderError {
        tracing::debug!(operation = %operation, identifier = %identifier, "Unsupported operation");
        metrics::record_unsupported(operation);
        ProviderError::NotSupported(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Value;
    use crate::storage::StorageError;
    use std::sync::Mutex;

    const AUTHORITY: &str = "com.example.items";

    /// Records every backend call and answers with a fixed result.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, QueryDescriptor)>>,
        fail_with: Option<String>,
    }

    impl Storage for Recorder {
        fn query(&self, table: &str, query: &QueryDescriptor) -> Result<Vec<Row>, StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push((table.to_string(), query.clone()));
            match &self.fail_with {
                Some(message) => Err(StorageError::new(message.clone())),
                None => Ok(vec![Row::new(vec![("id".into(), Value::Integer(1))])]),
            }
        }
    }

    fn router_with(storage: Recorder) -> ResourceRouter<Recorder> {
        let mut builder = RouterBuilder::new();
        builder
            .resource(
                AUTHORITY,
                "items",
                "listing",
                ResourceRule::new("items")
                    .with_id_column("id")
                    .with_default_sort("title ASC"),
            )
            .unwrap()
            .resource(AUTHORITY, "items/#", "item", ResourceRule::new("items").with_id_column("id"))
            .unwrap();
        builder.build(storage)
    }

    fn router() -> ResourceRouter<Recorder> {
        router_with(Recorder::default())
    }

    fn id(path: &str) -> ResourceIdentifier {
        ResourceIdentifier::new(AUTHORITY, path).unwrap()
    }

    fn last_call(router: &ResourceRouter<Recorder>) -> (String, QueryDescriptor) {
        router.storage().calls.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn test_item_query_binds_id() {
        let router = router();
        let query = QueryDescriptor::all().with_columns(Columns::named(["id", "title"]));
        router.query(&id("items/42"), query).unwrap();

        let (table, sent) = last_call(&router);
        assert_eq!(table, "items");
        assert_eq!(sent.predicate.text(), "id = ?");
        assert_eq!(sent.predicate.args(), [Value::Integer(42)]);
        assert_eq!(sent.sort_order, None);
        assert_eq!(sent.columns, Columns::named(["id", "title"]));
    }

    #[test]
    fn test_item_query_never_splices_id() {
        let router = router();
        router.query(&id("items/7"), QueryDescriptor::all()).unwrap();
        let (_, sent) = last_call(&router);
        assert_eq!(sent.predicate.text(), "id = ?");
        assert!(!sent.predicate.text().contains('7'));
        assert_eq!(sent.predicate.args(), [Value::Integer(7)]);
    }

    #[test]
    fn test_item_query_ands_caller_predicate() {
        let router = router();
        let query = QueryDescriptor::all()
            .with_predicate(Predicate::new("genre = ? OR genre = ?", vec!["a".into(), "b".into()]));
        router.query(&id("items/3"), query).unwrap();

        let (_, sent) = last_call(&router);
        assert_eq!(sent.predicate.text(), "(genre = ? OR genre = ?) AND id = ?");
        assert_eq!(
            sent.predicate.args(),
            [Value::from("a"), Value::from("b"), Value::Integer(3)]
        );
    }

    #[test]
    fn test_listing_default_sort() {
        let router = router();
        router.query(&id("items"), QueryDescriptor::all()).unwrap();
        let (_, sent) = last_call(&router);
        assert_eq!(sent.sort_order.as_deref(), Some("title ASC"));
        assert!(sent.predicate.is_empty());

        router
            .query(&id("items"), QueryDescriptor::all().with_sort_order(""))
            .unwrap();
        let (_, sent) = last_call(&router);
        assert_eq!(sent.sort_order.as_deref(), Some("title ASC"));
    }

    #[test]
    fn test_listing_explicit_sort_unmodified() {
        let router = router();
        router
            .query(&id("items"), QueryDescriptor::all().with_sort_order("author  desc"))
            .unwrap();
        let (_, sent) = last_call(&router);
        assert_eq!(sent.sort_order.as_deref(), Some("author  desc"));
    }

    #[test]
    fn test_listing_keeps_caller_predicate() {
        let router = router();
        let predicate = Predicate::new("author = ?", vec!["Austen".into()]);
        router
            .query(&id("items"), QueryDescriptor::all().with_predicate(predicate.clone()))
            .unwrap();
        let (_, sent) = last_call(&router);
        assert_eq!(sent.predicate, predicate);
    }

    #[test]
    fn test_unknown_resource_not_forwarded() {
        let router = router();
        let err = router.query(&id("other"), QueryDescriptor::all()).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
        assert!(router.storage().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_arity_mismatch_is_malformed() {
        let router = router();
        let query = QueryDescriptor::all().with_predicate(Predicate::new("a = ? AND b = ?", vec![1i64.into()]));
        let err = router.query(&id("items"), query).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));

        let query = QueryDescriptor::all().with_predicate(Predicate::new("", vec![1i64.into()]));
        let err = router.query(&id("items/1"), query).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
        assert!(router.storage().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_projection_is_malformed() {
        let router = router();
        let query = QueryDescriptor::all().with_columns(Columns::Named(vec![]));
        let err = router.query(&id("items"), query).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedRequest(_)));
    }

    #[test]
    fn test_storage_error_propagated_verbatim() {
        let router = router_with(Recorder {
            fail_with: Some("disk I/O error".into()),
            ..Default::default()
        });
        let err = router.query(&id("items"), QueryDescriptor::all()).unwrap_err();
        match err {
            ProviderError::Storage(e) => assert_eq!(e.message(), "disk I/O error"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_write_operations_not_supported() {
        let router = router();
        let values = Row::new(vec![("title".into(), Value::from("Emma"))]);
        let everything = Predicate::empty();

        for identifier in [id("items"), id("items/1"), id("nothing/here")] {
            assert!(matches!(
                router.insert(&identifier, &values),
                Err(ProviderError::NotSupported(Operation::Insert))
            ));
            assert!(matches!(
                router.update(&identifier, &values, &everything),
                Err(ProviderError::NotSupported(Operation::Update))
            ));
            assert!(matches!(
                router.delete(&identifier, &everything),
                Err(ProviderError::NotSupported(Operation::Delete))
            ));
            assert!(matches!(
                router.resource_type(&identifier),
                Err(ProviderError::NotSupported(Operation::ResourceType))
            ));
        }
        assert!(router.storage().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_new_requires_rule_per_kind() {
        let mut matcher = PatternMatcher::new();
        matcher.register(AUTHORITY, "items", ResourceKind::new("listing")).unwrap();
        let err = ResourceRouter::new(matcher, HashMap::new(), Recorder::default()).unwrap_err();
        assert_eq!(err, RegisterError::MissingRule("listing".into()));
    }

    #[test]
    fn test_builder_rejects_duplicate_kind() {
        let mut builder = RouterBuilder::new();
        let err = builder
            .resource(AUTHORITY, "items", "listing", ResourceRule::new("items"))
            .unwrap()
            .resource(AUTHORITY, "things", "listing", ResourceRule::new("things"))
            .unwrap_err();
        assert!(matches!(err, RegisterError::DuplicateKind(_)));
    }

    #[test]
    fn test_builder_keeps_entries_after_rejection() {
        let mut builder = RouterBuilder::new();
        builder
            .resource(AUTHORITY, "items", "listing", ResourceRule::new("items"))
            .unwrap();
        assert!(builder
            .resource(AUTHORITY, "items", "again", ResourceRule::new("items"))
            .is_err());
        assert!(builder
            .resource(AUTHORITY, "items/#/#", "pair", ResourceRule::new("items"))
            .is_err());
        builder
            .resource(AUTHORITY, "items/#", "item", ResourceRule::new("items"))
            .unwrap();

        let router = builder.build(Recorder::default());
        assert_eq!(router.matcher().len(), 2);
        assert_eq!(
            router.match_identifier(&id("items")),
            MatchResult::Matched { kind: ResourceKind::new("listing"), id: None }
        );
        assert_eq!(
            router.match_identifier(&id("items/7")),
            MatchResult::Matched { kind: ResourceKind::new("item"), id: Some(7) }
        );
    }

    #[test]
    fn test_unbalanced_predicate_is_malformed() {
        let router = router();
        for text in ["1=1) OR (1", "(title = ?", "id = 1; DELETE FROM items", "title = 'x"] {
            let args = if text.contains('?') { vec![Value::from("x")] } else { vec![] };
            let query = QueryDescriptor::all().with_predicate(Predicate::new(text, args));
            let err = router.query(&id("items/3"), query).unwrap_err();
            assert!(matches!(err, ProviderError::MalformedRequest(_)), "{text}: {err}");
        }
        assert!(router.storage().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_default_config() {
        let router = ResourceRouter::from_config(&ProviderConfig::default(), Recorder::default()).unwrap();
        let books = ResourceIdentifier::parse("content://com.training.contentprovidersample/books/2").unwrap();
        let translated = router.translate(&books, QueryDescriptor::all()).unwrap();
        assert_eq!(translated.kind, ResourceKind::new("book"));
        assert_eq!(translated.table, "books");
        assert_eq!(translated.query.predicate.text(), "_id = ?");
        assert_eq!(translated.query.predicate.args(), [Value::Integer(2)]);
    }
}
