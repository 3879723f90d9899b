//! Search response decoding.
//!
//! A [`Response`] wraps one raw engine response together with the criteria
//! that produced it. Derived views (`ids`, `results`, decoded aggregations)
//! are computed on first access and cached.

mod aggregation;

pub use aggregation::{Aggregation, AggregationNode, Bucket};

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::{json, Map, Value};

use search_dsl_shared::Criteria;

/// Page size the engine applies when a search sets no `size`.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

static NULL: Value = Value::Null;

static EMPTY_OBJECT: OnceLock<Map<String, Value>> = OnceLock::new();

fn empty_object() -> &'static Map<String, Value> {
    EMPTY_OBJECT.get_or_init(Map::new)
}

/// A decoded search response.
#[derive(Debug)]
pub struct Response {
    criteria: Criteria,
    raw: Value,
    ids: OnceLock<Vec<String>>,
    results: OnceLock<Vec<Value>>,
    aggregations: OnceLock<HashMap<String, Aggregation>>,
}

impl Response {
    pub fn new(criteria: Criteria, raw: Value) -> Self {
        Self {
            criteria,
            raw,
            ids: OnceLock::new(),
            results: OnceLock::new(),
            aggregations: OnceLock::new(),
        }
    }

    /// A response with no hits, used when a failsafe search fails.
    pub fn empty(criteria: Criteria) -> Self {
        Self::new(criteria, json!({ "hits": { "total": 0, "hits": [] } }))
    }

    /// The raw response body.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// The raw `hits` object: `total`, `max_score` and the hit list.
    pub fn hits(&self) -> &Value {
        self.raw.get("hits").unwrap_or(&NULL)
    }

    /// The `hits.hits` list.
    pub fn hit_list(&self) -> &[Value] {
        self.raw
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `hits.total`, given either as a number or as `{value, relation}`.
    pub fn total_entries(&self) -> u64 {
        match self.raw.pointer("/hits/total") {
            Some(Value::Number(total)) => total.as_u64().unwrap_or(0),
            Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
            _ => 0,
        }
    }

    pub fn max_score(&self) -> Option<f64> {
        self.raw.pointer("/hits/max_score").and_then(Value::as_f64)
    }

    fn page_size(&self) -> u64 {
        self.criteria
            .limit_value()
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn current_page(&self) -> u64 {
        let offset = self.criteria.offset_value().unwrap_or(0);
        offset.div_ceil(self.page_size()).saturating_add(1)
    }

    pub fn total_pages(&self) -> u64 {
        self.total_entries().div_ceil(self.page_size()).max(1)
    }

    pub fn previous_page(&self) -> Option<u64> {
        let current = self.current_page();
        let total = self.total_pages();

        if current <= 1 {
            None
        } else if current > total {
            Some(total)
        } else {
            Some(current - 1)
        }
    }

    pub fn next_page(&self) -> Option<u64> {
        let current = self.current_page();
        (current < self.total_pages()).then_some(current + 1)
    }

    /// Hit ids in response order.
    pub fn ids(&self) -> &[String] {
        self.ids.get_or_init(|| {
            self.hit_list()
                .iter()
                .filter_map(|hit| match hit.get("_id")? {
                    Value::String(id) => Some(id.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect()
        })
    }

    /// Each hit's `_source`, with its `highlight` fragment (if any) merged in
    /// under the `highlight` key.
    pub fn results(&self) -> &[Value] {
        self.results.get_or_init(|| {
            self.hit_list()
                .iter()
                .map(|hit| {
                    let mut result = match hit.get("_source") {
                        Some(Value::Object(source)) => source.clone(),
                        _ => Map::new(),
                    };
                    if let Some(highlight) = hit.get("highlight") {
                        result.insert("highlight".to_string(), highlight.clone());
                    }
                    Value::Object(result)
                })
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit_list().is_empty()
    }

    /// The raw `aggregations` object, or an empty one.
    pub fn aggregations(&self) -> &Map<String, Value> {
        self.raw
            .get("aggregations")
            .and_then(Value::as_object)
            .unwrap_or_else(|| empty_object())
    }

    /// The named aggregation, decoded by shape. See [`Aggregation`].
    pub fn aggregation(&self, name: &str) -> &Aggregation {
        self.aggregations
            .get_or_init(|| {
                self.aggregations()
                    .iter()
                    .map(|(key, value)| (key.clone(), Aggregation::decode(Some(value))))
                    .collect()
            })
            .get(name)
            .unwrap_or(Aggregation::empty_ref())
    }

    /// All suggestion groups, or an empty object.
    pub fn suggestions(&self) -> &Map<String, Value> {
        self.raw
            .get("suggest")
            .and_then(Value::as_object)
            .unwrap_or_else(|| empty_object())
    }

    /// The options of the first entry of the named suggestion group.
    pub fn suggestion(&self, name: &str) -> &[Value] {
        self.suggestions()
            .get(name)
            .and_then(|group| group.get(0))
            .and_then(|entry| entry.get("options"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn scroll_id(&self) -> Option<&str> {
        self.raw.get("_scroll_id").and_then(Value::as_str)
    }

    /// Engine-side processing time in milliseconds.
    pub fn took(&self) -> Option<u64> {
        self.raw.get("took").and_then(Value::as_u64)
    }

    pub fn profile(&self) -> Option<&Value> {
        self.raw.get("profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits_response(total: u64, ids: &[&str]) -> Value {
        let hits: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "_id": id, "_source": { "id": id } }))
            .collect();
        json!({ "took": 3, "hits": { "total": total, "max_score": 1.5, "hits": hits } })
    }

    #[test]
    fn test_pagination_arithmetic() {
        let response = Response::new(Criteria::new().offset(20).limit(10), hits_response(45, &[]));

        assert_eq!(response.current_page(), 3);
        assert_eq!(response.total_pages(), 5);
        assert_eq!(response.previous_page(), Some(2));
        assert_eq!(response.next_page(), Some(4));
    }

    #[test]
    fn test_first_and_last_page() {
        let first = Response::new(Criteria::new().offset(0).limit(10), hits_response(45, &[]));
        assert_eq!(first.current_page(), 1);
        assert_eq!(first.previous_page(), None);
        assert_eq!(first.next_page(), Some(2));

        let last = Response::new(Criteria::new().paginate(5, 10), hits_response(45, &[]));
        assert_eq!(last.current_page(), 5);
        assert_eq!(last.next_page(), None);
        assert_eq!(last.previous_page(), Some(4));
    }

    #[test]
    fn test_previous_page_past_the_end_is_clamped() {
        let response = Response::new(Criteria::new().paginate(9, 10), hits_response(45, &[]));

        assert_eq!(response.current_page(), 9);
        assert_eq!(response.previous_page(), Some(5));
        assert_eq!(response.next_page(), None);
    }

    #[test]
    fn test_pagination_defaults() {
        let response = Response::new(Criteria::new(), hits_response(0, &[]));

        assert_eq!(response.current_page(), 1);
        assert_eq!(response.total_pages(), 1);
        assert_eq!(response.previous_page(), None);
        assert_eq!(response.next_page(), None);
    }

    #[test]
    fn test_pagination_with_huge_offset() {
        let criteria = Criteria::new().paginate(u64::MAX, 1);
        let response = Response::new(criteria, json!({ "hits": { "total": 5, "hits": [] } }));

        assert_eq!(response.current_page(), u64::MAX);
        assert_eq!(response.previous_page(), Some(5));
        assert_eq!(response.next_page(), None);
    }

    #[test]
    fn test_total_as_object() {
        let response = Response::new(
            Criteria::new(),
            json!({ "hits": { "total": { "value": 12, "relation": "eq" }, "hits": [] } }),
        );
        assert_eq!(response.total_entries(), 12);
        assert_eq!(response.hits()["total"]["relation"], json!("eq"));
        assert!(response.hit_list().is_empty());
    }

    #[test]
    fn test_hits_is_the_raw_object() {
        let raw = json!({
            "hits": { "total": 1, "max_score": 1.5, "hits": [{ "_id": "1", "_source": {} }] }
        });
        let response = Response::new(Criteria::new(), raw.clone());

        assert_eq!(response.hits(), &raw["hits"]);
        assert_eq!(response.hit_list().len(), 1);
        assert!(Response::new(Criteria::new(), json!({})).hits().is_null());
    }

    #[test]
    fn test_ids_and_results() {
        let raw = json!({
            "hits": {
                "total": 2,
                "hits": [
                    { "_id": "1", "_source": { "title": "a" } },
                    {
                        "_id": 2,
                        "_source": { "title": "b" },
                        "highlight": { "title": ["<em>b</em>"] }
                    }
                ]
            }
        });
        let response = Response::new(Criteria::new(), raw);

        assert_eq!(response.ids(), &["1".to_string(), "2".to_string()]);
        assert_eq!(response.len(), 2);
        assert_eq!(response.results()[0], json!({ "title": "a" }));
        assert_eq!(
            response.results()[1],
            json!({ "title": "b", "highlight": { "title": ["<em>b</em>"] } })
        );
    }

    #[test]
    fn test_bucket_aggregation_by_name() {
        let raw = json!({
            "hits": { "total": 3, "hits": [] },
            "aggregations": {
                "cat": {
                    "buckets": [
                        { "key": "a", "doc_count": 2 },
                        { "key": "b", "doc_count": 1 }
                    ]
                }
            }
        });
        let response = Response::new(Criteria::new().aggregate("cat"), raw);

        let cat = response.aggregation("cat");
        assert_eq!(cat.doc_counts(), vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        assert!(response.aggregation("missing").is_empty());
        assert!(std::ptr::eq(cat, response.aggregation("cat")));
    }

    #[test]
    fn test_no_hits_and_no_aggregations() {
        let response = Response::new(Criteria::new(), json!({ "hits": { "total": 0 } }));

        assert_eq!(response.total_entries(), 0);
        assert!(response.aggregations().is_empty());
        assert!(response.suggestions().is_empty());
        assert!(response.aggregation("anything").is_empty());
        assert!(response.is_empty());
        assert!(response.ids().is_empty());
    }

    #[test]
    fn test_suggestions() {
        let raw = json!({
            "hits": { "total": 0, "hits": [] },
            "suggest": {
                "spelling": [{ "text": "helo", "options": [{ "text": "hello", "score": 0.8 }] }]
            }
        });
        let response = Response::new(Criteria::new(), raw);

        assert!(response.suggestions().contains_key("spelling"));
        assert_eq!(response.suggestion("spelling")[0]["text"], "hello");
        assert!(response.suggestion("other").is_empty());
    }

    #[test]
    fn test_pass_through_fields() {
        let mut raw = hits_response(1, &["1"]);
        raw["_scroll_id"] = json!("cXVlcnk");
        let response = Response::new(Criteria::new(), raw);

        assert_eq!(response.scroll_id(), Some("cXVlcnk"));
        assert_eq!(response.took(), Some(3));
        assert_eq!(response.max_score(), Some(1.5));
        assert!(response.profile().is_none());
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty(Criteria::new().limit(5));

        assert!(response.is_empty());
        assert_eq!(response.total_entries(), 0);
        assert_eq!(response.criteria().limit_value(), Some(5));
    }
}
