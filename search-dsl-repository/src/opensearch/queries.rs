//! Request body compilation.
//!
//! Turns a [`Criteria`] into the engine's search request body. Boolean
//! combination depends on the [`Dialect`]:
//!
//! - **Modern**: one `bool` query with `must`, `must_not`, `should` and
//!   `filter` keys, each present only when it has clauses.
//! - **Legacy**: a filter list of plain filters and `{"not": ...}` wrapped
//!   must-nots, combined with `and` when it has more than one entry.
//!
//! Compilation is total. Raw clauses are passed through unexamined and the
//! engine is left to reject anything it does not understand.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use search_dsl_shared::clause::clauses_to_values;
use search_dsl_shared::{AggregationDef, Clause, Criteria, Dialect};

/// Compile the full search request body.
///
/// Keys whose criteria fields are empty or unset are omitted, never emitted
/// as `null` or empty structures.
pub fn compile(criteria: &Criteria, dialect: Dialect) -> Value {
    let mut body = Map::new();

    if let Some(query) = build_query(criteria, dialect) {
        body.insert("query".to_string(), query);
    }
    if let Some(post_filter) = build_post_filter(criteria, dialect) {
        body.insert("post_filter".to_string(), post_filter);
    }
    if let Some(aggregations) = build_aggregations(criteria.aggregations(), dialect) {
        body.insert("aggregations".to_string(), aggregations);
    }
    if !criteria.sort_fields().is_empty() {
        let sort: Vec<Value> = criteria.sort_fields().iter().map(|s| s.to_value()).collect();
        body.insert("sort".to_string(), Value::Array(sort));
    }
    if let Some(offset) = criteria.offset_value() {
        body.insert("from".to_string(), json!(offset));
    }
    if let Some(limit) = criteria.limit_value() {
        body.insert("size".to_string(), json!(limit));
    }
    if let Some(fields) = criteria.source_fields() {
        body.insert("_source".to_string(), json!(fields));
    }
    if let Some(highlight) = criteria.highlight_value() {
        body.insert("highlight".to_string(), highlight.clone());
    }
    if !criteria.suggest_values().is_empty() {
        body.insert(
            "suggest".to_string(),
            Value::Object(criteria.suggest_values().clone()),
        );
    }
    if criteria.is_profiled() {
        body.insert("profile".to_string(), json!(true));
    }

    Value::Object(body)
}

/// Compile only the `query` part of the request, if the criteria has one.
pub fn build_query(criteria: &Criteria, dialect: Dialect) -> Option<Value> {
    let must = must_values(criteria);

    match dialect {
        Dialect::Modern => modern_bool(
            &must,
            &clauses_to_values(criteria.must_not_clauses()),
            &clauses_to_values(criteria.should_clauses()),
            &clauses_to_values(criteria.filter_clauses()),
        ),
        Dialect::Legacy => {
            let query = legacy_query(&must, &clauses_to_values(criteria.should_clauses()));
            let filter = legacy_filter(
                criteria.filter_clauses(),
                criteria.must_not_clauses(),
                None,
            );

            match filter {
                Some(filter) => Some(json!({
                    "filtered": {
                        "query": query.unwrap_or_else(|| json!({ "match_all": {} })),
                        "filter": filter
                    }
                })),
                None => query,
            }
        }
    }
}

/// Compile the top-level `post_filter`. It restricts hits without affecting
/// aggregation buckets.
pub fn build_post_filter(criteria: &Criteria, dialect: Dialect) -> Option<Value> {
    let clauses = criteria.post_filter_clauses();
    if clauses.is_empty() {
        return None;
    }

    match dialect {
        Dialect::Modern => Some(json!({ "bool": { "filter": clauses_to_values(clauses) } })),
        Dialect::Legacy => legacy_filter(clauses, &[], None),
    }
}

/// Compile the filter fragment of an aggregation sub-criteria.
pub fn build_filter_fragment(criteria: &Criteria, dialect: Dialect) -> Option<Value> {
    let must = must_values(criteria);
    let should = clauses_to_values(criteria.should_clauses());

    match dialect {
        Dialect::Modern => modern_bool(
            &must,
            &clauses_to_values(criteria.must_not_clauses()),
            &should,
            &clauses_to_values(criteria.filter_clauses()),
        ),
        Dialect::Legacy => legacy_filter(
            criteria.filter_clauses(),
            criteria.must_not_clauses(),
            legacy_query(&must, &should),
        ),
    }
}

/// Compile named aggregation definitions, recursing into sub-criteria.
pub fn build_aggregations(
    aggregations: &BTreeMap<String, AggregationDef>,
    dialect: Dialect,
) -> Option<Value> {
    if aggregations.is_empty() {
        return None;
    }

    let compiled: Map<String, Value> = aggregations
        .iter()
        .map(|(name, definition)| (name.clone(), build_aggregation(definition, dialect)))
        .collect();

    Some(Value::Object(compiled))
}

fn build_aggregation(definition: &AggregationDef, dialect: Dialect) -> Value {
    match definition {
        AggregationDef::Plain(value) => value.clone(),
        AggregationDef::Nested {
            definition,
            criteria,
        } => {
            let mut compiled = definition.clone();
            if let Some(aggregations) = build_aggregations(criteria.aggregations(), dialect) {
                compiled.insert("aggregations".to_string(), aggregations);
            }
            if let Some(filter) = build_filter_fragment(criteria, dialect) {
                compiled.insert("filter".to_string(), filter);
            }
            Value::Object(compiled)
        }
    }
}

/// Query fragments and `must` clauses all have to match.
fn must_values(criteria: &Criteria) -> Vec<Value> {
    criteria
        .query_clauses()
        .iter()
        .cloned()
        .chain(criteria.must_clauses().iter().map(Clause::to_value))
        .collect()
}

fn modern_bool(must: &[Value], must_not: &[Value], should: &[Value], filter: &[Value]) -> Option<Value> {
    let mut bool_query = Map::new();

    for (key, values) in [
        ("must", must),
        ("must_not", must_not),
        ("should", should),
        ("filter", filter),
    ] {
        if !values.is_empty() {
            bool_query.insert(key.to_string(), Value::Array(values.to_vec()));
        }
    }

    if bool_query.is_empty() {
        None
    } else {
        Some(json!({ "bool": bool_query }))
    }
}

fn legacy_query(must: &[Value], should: &[Value]) -> Option<Value> {
    let mut bool_query = Map::new();
    if !must.is_empty() {
        bool_query.insert("must".to_string(), Value::Array(must.to_vec()));
    }
    if !should.is_empty() {
        bool_query.insert("should".to_string(), Value::Array(should.to_vec()));
    }

    if bool_query.is_empty() {
        None
    } else {
        Some(json!({ "bool": bool_query }))
    }
}

/// Filters, then `{"not": ...}` for each must-not, then the optional bool
/// query. More than one entry is wrapped in `and`; exactly one is emitted
/// unwrapped.
fn legacy_filter(filters: &[Clause], must_not: &[Clause], query: Option<Value>) -> Option<Value> {
    let mut combined: Vec<Value> = clauses_to_values(filters);
    combined.extend(must_not.iter().map(|clause| json!({ "not": clause.to_value() })));
    combined.extend(query);

    match combined.len() {
        0 => None,
        1 => combined.pop(),
        _ => Some(json!({ "and": combined })),
    }
}
