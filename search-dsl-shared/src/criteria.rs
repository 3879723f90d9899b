//! The chainable search criteria.
//!
//! [`Criteria`] accumulates everything a search needs. It is a plain value:
//! every chain call clones the current state, extends or replaces one field
//! and hands back the new instance, so earlier criteria stay usable.
//!
//! ```ignore
//! let base = Criteria::new().r#where([("state", "approved")]);
//! let cheap = base.range("price", json!({ "lte": 20 })).sort("price", SortOrder::Asc);
//! let recent = base.post_exists("published_at").limit(5);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::aggregation::AggregationDef;
use crate::clause::{field_clauses, negated_field_clauses, Clause, FieldFilter};
use crate::target::IndexTarget;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One `(field, direction)` sort entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ self.field.as_str(): self.order.as_str() })
    }
}

/// Scroll settings. Without an id the search opens a new scroll context;
/// with one it continues an existing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollOptions {
    pub id: Option<String>,
    /// Keep-alive in engine time units, e.g. `"1m"`. Passed through verbatim.
    pub timeout: String,
}

/// Immutable, chainable search criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    target: Option<Arc<IndexTarget>>,
    filter_clauses: Vec<Clause>,
    post_filter_clauses: Vec<Clause>,
    must_clauses: Vec<Clause>,
    must_not_clauses: Vec<Clause>,
    should_clauses: Vec<Clause>,
    query_clauses: Vec<Value>,
    aggregations: BTreeMap<String, AggregationDef>,
    sort: Vec<SortField>,
    offset: Option<u64>,
    limit: Option<u64>,
    source: Option<Vec<String>>,
    includes: Vec<String>,
    eager_load: Vec<String>,
    preload: Vec<String>,
    scroll: Option<ScrollOptions>,
    profile: bool,
    highlight: Option<Value>,
    suggest: Map<String, Value>,
    failsafe: bool,
}

impl Criteria {
    /// An empty criteria without an index target, mainly used for aggregation
    /// sub-criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty criteria searching the given index target.
    pub fn for_target(target: Arc<IndexTarget>) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    fn fresh(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        change(&mut next);
        next
    }

    pub fn with_target(&self, target: Arc<IndexTarget>) -> Self {
        self.fresh(|c| c.target = Some(target))
    }

    pub fn target(&self) -> Option<&IndexTarget> {
        self.target.as_deref()
    }

    pub fn filter_clauses(&self) -> &[Clause] {
        &self.filter_clauses
    }

    pub fn post_filter_clauses(&self) -> &[Clause] {
        &self.post_filter_clauses
    }

    pub fn must_clauses(&self) -> &[Clause] {
        &self.must_clauses
    }

    pub fn must_not_clauses(&self) -> &[Clause] {
        &self.must_not_clauses
    }

    pub fn should_clauses(&self) -> &[Clause] {
        &self.should_clauses
    }

    pub fn query_clauses(&self) -> &[Value] {
        &self.query_clauses
    }

    pub fn aggregations(&self) -> &BTreeMap<String, AggregationDef> {
        &self.aggregations
    }

    pub fn sort_fields(&self) -> &[SortField] {
        &self.sort
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn source_fields(&self) -> Option<&[String]> {
        self.source.as_deref()
    }

    pub fn includes_values(&self) -> &[String] {
        &self.includes
    }

    pub fn eager_load_values(&self) -> &[String] {
        &self.eager_load
    }

    pub fn preload_values(&self) -> &[String] {
        &self.preload
    }

    pub fn scroll_options(&self) -> Option<&ScrollOptions> {
        self.scroll.as_ref()
    }

    pub fn is_profiled(&self) -> bool {
        self.profile
    }

    pub fn highlight_value(&self) -> Option<&Value> {
        self.highlight.as_ref()
    }

    pub fn suggest_values(&self) -> &Map<String, Value> {
        &self.suggest
    }

    pub fn is_failsafe(&self) -> bool {
        self.failsafe
    }
}

// Primary filter context.
impl Criteria {
    /// Add a term, terms or range filter per field, depending on the value kind.
    pub fn r#where<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldFilter>,
    {
        let clauses = field_clauses(fields);
        self.fresh(|c| c.filter_clauses.extend(clauses))
    }

    /// Like [`Criteria::r#where`], excluding the matching documents instead.
    pub fn where_not<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldFilter>,
    {
        let clauses = negated_field_clauses(fields);
        self.fresh(|c| c.filter_clauses.extend(clauses))
    }

    /// Add a raw filter.
    pub fn filter(&self, clause: impl Into<Clause>) -> Self {
        let clause = clause.into();
        self.fresh(|c| c.filter_clauses.push(clause))
    }

    pub fn range(&self, field: &str, options: Value) -> Self {
        self.filter(json!({ "range": { field: options } }))
    }

    pub fn match_all(&self) -> Self {
        self.filter(json!({ "match_all": {} }))
    }

    pub fn exists(&self, field: &str) -> Self {
        self.filter(json!({ "exists": { "field": field } }))
    }

    pub fn exists_not(&self, field: &str) -> Self {
        self.filter(json!({ "bool": { "must_not": { "exists": { "field": field } } } }))
    }

    pub fn must(&self, clause: impl Into<Clause>) -> Self {
        let clause = clause.into();
        self.fresh(|c| c.must_clauses.push(clause))
    }

    pub fn must_not(&self, clause: impl Into<Clause>) -> Self {
        let clause = clause.into();
        self.fresh(|c| c.must_not_clauses.push(clause))
    }

    pub fn should(&self, clause: impl Into<Clause>) -> Self {
        let clause = clause.into();
        self.fresh(|c| c.should_clauses.push(clause))
    }
}

// Post filters: applied to hits after aggregations are computed.
impl Criteria {
    pub fn post_where<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldFilter>,
    {
        let clauses = field_clauses(fields);
        self.fresh(|c| c.post_filter_clauses.extend(clauses))
    }

    pub fn post_where_not<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldFilter>,
    {
        let clauses = negated_field_clauses(fields);
        self.fresh(|c| c.post_filter_clauses.extend(clauses))
    }

    pub fn post_filter(&self, clause: impl Into<Clause>) -> Self {
        let clause = clause.into();
        self.fresh(|c| c.post_filter_clauses.push(clause))
    }

    pub fn post_range(&self, field: &str, options: Value) -> Self {
        self.post_filter(json!({ "range": { field: options } }))
    }

    pub fn post_exists(&self, field: &str) -> Self {
        self.post_filter(json!({ "exists": { "field": field } }))
    }

    pub fn post_exists_not(&self, field: &str) -> Self {
        self.post_filter(json!({ "bool": { "must_not": { "exists": { "field": field } } } }))
    }
}

// Aggregations. Same-named aggregations replace earlier ones.
impl Criteria {
    /// A `terms` aggregation on `field`, named after the field.
    pub fn aggregate(&self, field: &str) -> Self {
        self.aggregate_with(field, Value::Null)
    }

    /// A `terms` aggregation on `field` with extra options such as `size`.
    pub fn aggregate_with(&self, field: &str, options: Value) -> Self {
        self.aggregate_named(field, AggregationDef::terms(field, options))
    }

    /// A named aggregation with a raw definition, e.g.
    /// `aggregate_named("price_sum", json!({ "sum": { "field": "price" } }))`.
    pub fn aggregate_named(&self, name: &str, definition: Value) -> Self {
        let name = name.to_string();
        self.fresh(|c| {
            c.aggregations.insert(name, AggregationDef::Plain(definition));
        })
    }

    /// A `terms` aggregation on `field` whose sub-filters and sub-aggregations
    /// are built on a fresh sub-criteria.
    pub fn aggregate_by(&self, field: &str, build: impl FnOnce(Criteria) -> Criteria) -> Self {
        self.aggregate_nested(field, AggregationDef::terms(field, Value::Null), build)
    }

    /// A named aggregation with a raw definition, extended by a sub-criteria.
    pub fn aggregate_nested(
        &self,
        name: &str,
        definition: Value,
        build: impl FnOnce(Criteria) -> Criteria,
    ) -> Self {
        let name = name.to_string();
        let nested = AggregationDef::nested(definition, build(Criteria::new()));
        self.fresh(|c| {
            c.aggregations.insert(name, nested);
        })
    }
}

// Queries.
impl Criteria {
    /// Add a structured query fragment. Fragments accumulate and must all match.
    pub fn query(&self, query: Value) -> Self {
        self.fresh(|c| c.query_clauses.push(query))
    }

    /// Free-text search through a `query_string` query with `AND` as the
    /// default operator.
    pub fn search(&self, text: &str) -> Self {
        self.search_with(text, Value::Null)
    }

    /// Free-text search with extra `query_string` options, e.g.
    /// `json!({ "default_operator": "OR" })`.
    pub fn search_with(&self, text: &str, options: Value) -> Self {
        let mut query_string = Map::new();
        query_string.insert("query".to_string(), json!(text));
        query_string.insert("default_operator".to_string(), json!("AND"));
        if let Value::Object(options) = options {
            query_string.extend(options);
        }
        self.query(json!({ "query_string": query_string }))
    }
}

// Sorting, pagination and pass-through hints.
impl Criteria {
    pub fn sort(&self, field: &str, order: SortOrder) -> Self {
        let entry = SortField::new(field, order);
        self.fresh(|c| c.sort.push(entry))
    }

    pub fn sort_by(&self, fields: impl IntoIterator<Item = SortField>) -> Self {
        let fields: Vec<SortField> = fields.into_iter().collect();
        self.fresh(|c| c.sort.extend(fields))
    }

    /// Replace the sort entirely.
    pub fn resort(&self, fields: impl IntoIterator<Item = SortField>) -> Self {
        let fields: Vec<SortField> = fields.into_iter().collect();
        self.fresh(|c| c.sort = fields)
    }

    pub fn offset(&self, offset: u64) -> Self {
        self.fresh(|c| c.offset = Some(offset))
    }

    pub fn limit(&self, limit: u64) -> Self {
        self.fresh(|c| c.limit = Some(limit))
    }

    /// Derive offset and limit from a 1-based page number. Pages below 1 are
    /// treated as the first page.
    pub fn paginate(&self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.fresh(|c| {
            c.offset = Some((page - 1).saturating_mul(per_page));
            c.limit = Some(per_page);
        })
    }

    pub fn source<S: Into<String>>(&self, fields: impl IntoIterator<Item = S>) -> Self {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.fresh(|c| c.source = Some(fields))
    }

    pub fn includes<S: Into<String>>(&self, associations: impl IntoIterator<Item = S>) -> Self {
        let associations: Vec<String> = associations.into_iter().map(Into::into).collect();
        self.fresh(|c| c.includes.extend(associations))
    }

    pub fn eager_load<S: Into<String>>(&self, associations: impl IntoIterator<Item = S>) -> Self {
        let associations: Vec<String> = associations.into_iter().map(Into::into).collect();
        self.fresh(|c| c.eager_load.extend(associations))
    }

    pub fn preload<S: Into<String>>(&self, associations: impl IntoIterator<Item = S>) -> Self {
        let associations: Vec<String> = associations.into_iter().map(Into::into).collect();
        self.fresh(|c| c.preload.extend(associations))
    }
}

// Execution flags.
impl Criteria {
    /// Open a scroll context kept alive for `timeout`.
    pub fn scroll(&self, timeout: &str) -> Self {
        let options = ScrollOptions {
            id: None,
            timeout: timeout.to_string(),
        };
        self.fresh(|c| c.scroll = Some(options))
    }

    /// Continue an existing scroll context. The request body is replaced by
    /// the scroll id when this criteria is executed.
    pub fn scroll_continue(&self, id: &str, timeout: &str) -> Self {
        let options = ScrollOptions {
            id: Some(id.to_string()),
            timeout: timeout.to_string(),
        };
        self.fresh(|c| c.scroll = Some(options))
    }

    pub fn profile(&self, enabled: bool) -> Self {
        self.fresh(|c| c.profile = enabled)
    }

    pub fn highlight(&self, options: Value) -> Self {
        self.fresh(|c| c.highlight = Some(options))
    }

    pub fn suggest(&self, name: &str, options: Value) -> Self {
        let name = name.to_string();
        self.fresh(|c| {
            c.suggest.insert(name, options);
        })
    }

    /// Turn connection and response failures into an empty result set.
    pub fn failsafe(&self, enabled: bool) -> Self {
        self.fresh(|c| c.failsafe = enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutators_do_not_touch_the_receiver() {
        let base = Criteria::new().r#where([("state", "approved")]);
        let extended = base.r#where([("category", "books")]);

        assert_eq!(base.filter_clauses().len(), 1);
        assert_eq!(extended.filter_clauses().len(), 2);
    }

    #[test]
    fn test_where_appends_in_call_order() {
        let criteria = Criteria::new()
            .r#where([("price", FieldFilter::range(100, 200))])
            .where_not([("category", "category2")])
            .exists("title");

        let rendered: Vec<Value> = criteria.filter_clauses().iter().map(Clause::to_value).collect();
        assert_eq!(
            rendered,
            vec![
                json!({ "range": { "price": { "gte": 100, "lte": 200 } } }),
                json!({ "not": { "term": { "category": "category2" } } }),
                json!({ "exists": { "field": "title" } }),
            ]
        );
    }

    #[test]
    fn test_post_filters_are_kept_apart() {
        let criteria = Criteria::new()
            .post_where([("price", 100..=200)])
            .post_exists_not("description");

        assert!(criteria.filter_clauses().is_empty());
        assert_eq!(criteria.post_filter_clauses().len(), 2);
        assert_eq!(
            criteria.post_filter_clauses()[1].to_value(),
            json!({ "bool": { "must_not": { "exists": { "field": "description" } } } })
        );
    }

    #[test]
    fn test_sort_appends_and_resort_replaces() {
        let sorted = Criteria::new()
            .sort("rank", SortOrder::Desc)
            .sort("price", SortOrder::Asc);
        assert_eq!(sorted.sort_fields().len(), 2);

        let resorted = sorted.resort([SortField::new("price", SortOrder::Asc)]);
        assert_eq!(resorted.sort_fields(), &[SortField::new("price", SortOrder::Asc)]);
    }

    #[test]
    fn test_offset_and_limit_replace() {
        let criteria = Criteria::new().offset(10).offset(20).limit(5).limit(10);

        assert_eq!(criteria.offset_value(), Some(20));
        assert_eq!(criteria.limit_value(), Some(10));
    }

    #[test]
    fn test_paginate_huge_page_saturates() {
        let criteria = Criteria::new().paginate(u64::MAX, 10);

        assert_eq!(criteria.offset_value(), Some(u64::MAX));
        assert_eq!(criteria.limit_value(), Some(10));
    }

    #[test]
    fn test_paginate() {
        let criteria = Criteria::new().paginate(3, 10);
        assert_eq!(criteria.offset_value(), Some(20));
        assert_eq!(criteria.limit_value(), Some(10));

        let first = Criteria::new().paginate(0, 25);
        assert_eq!(first.offset_value(), Some(0));
    }

    #[test]
    fn test_aggregate_merges_by_name() {
        let criteria = Criteria::new()
            .aggregate("category")
            .aggregate_named("price_sum", json!({ "sum": { "field": "price" } }))
            .aggregate_with("category", json!({ "size": 2 }));

        assert_eq!(criteria.aggregations().len(), 2);
        assert_eq!(
            criteria.aggregations()["category"],
            AggregationDef::Plain(json!({ "terms": { "field": "category", "size": 2 } }))
        );
    }

    #[test]
    fn test_aggregate_by_builds_sub_criteria() {
        let criteria = Criteria::new().aggregate_by("category", |agg| {
            agg.r#where([("title", "title")]).aggregate("brand")
        });

        match &criteria.aggregations()["category"] {
            AggregationDef::Nested {
                definition,
                criteria,
            } => {
                assert_eq!(definition["terms"]["field"], "category");
                assert_eq!(criteria.filter_clauses().len(), 1);
                assert!(criteria.aggregations().contains_key("brand"));
            }
            other => panic!("unexpected definition: {:?}", other),
        }
    }

    #[test]
    fn test_search_uses_query_string() {
        let criteria = Criteria::new()
            .search("title1 OR title3")
            .search_with("title", json!({ "default_operator": "OR" }));

        assert_eq!(
            criteria.query_clauses()[0],
            json!({ "query_string": { "query": "title1 OR title3", "default_operator": "AND" } })
        );
        assert_eq!(criteria.query_clauses()[1]["query_string"]["default_operator"], "OR");
    }

    #[test]
    fn test_hints_accumulate() {
        let criteria = Criteria::new()
            .includes(["user"])
            .includes(["comments"])
            .preload(["user"])
            .source(["id", "price"]);

        assert_eq!(criteria.includes_values(), &["user".to_string(), "comments".to_string()]);
        assert_eq!(criteria.preload_values().len(), 1);
        assert!(criteria.eager_load_values().is_empty());
        assert_eq!(criteria.source_fields().map(|f| f.len()), Some(2));
    }

    #[test]
    fn test_scroll_continue_replaces_scroll_options() {
        let criteria = Criteria::new().scroll("1m").scroll_continue("abc", "30s");

        assert_eq!(
            criteria.scroll_options(),
            Some(&ScrollOptions {
                id: Some("abc".to_string()),
                timeout: "30s".to_string(),
            })
        );
    }
}
