//! Decoded aggregation results.
//!
//! The wire format carries no type tag for aggregations, so the kind is told
//! apart purely by shape:
//!
//! - absent or empty: [`Aggregation::Empty`]
//! - `buckets` is a list: [`Aggregation::Buckets`], one entry per bucket key
//! - `buckets` is an object: [`Aggregation::Keyed`], one entry per object key
//! - anything else (`sum`, `avg`, `filter`, ...): [`Aggregation::Single`]
//!
//! Every bucket or single result is an [`AggregationNode`], which decodes
//! its own named sub-aggregations by the same rule.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::{Map, Value};

static EMPTY_AGGREGATION: Aggregation = Aggregation::Empty;

/// One decoded aggregation.
#[derive(Debug, Clone)]
pub enum Aggregation {
    Empty,
    Buckets(Vec<Bucket>),
    Keyed(Vec<Bucket>),
    Single(AggregationNode),
}

impl Aggregation {
    /// Decode one aggregation object from a response.
    pub fn decode(value: Option<&Value>) -> Self {
        let Some(Value::Object(object)) = value else {
            return Aggregation::Empty;
        };
        if object.is_empty() {
            return Aggregation::Empty;
        }

        match object.get("buckets") {
            Some(Value::Array(buckets)) => Aggregation::Buckets(
                buckets
                    .iter()
                    .map(|bucket| {
                        // Anonymous `filters` buckets carry no key.
                        let key = bucket.get("key").cloned().unwrap_or(Value::Null);
                        Bucket::new(key, bucket)
                    })
                    .collect(),
            ),
            Some(Value::Object(buckets)) => Aggregation::Keyed(
                buckets
                    .iter()
                    .map(|(key, bucket)| Bucket::new(Value::String(key.clone()), bucket))
                    .collect(),
            ),
            _ => Aggregation::Single(AggregationNode::new(object.clone())),
        }
    }

    /// The shared empty result returned for unknown names.
    pub(crate) fn empty_ref() -> &'static Aggregation {
        &EMPTY_AGGREGATION
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Aggregation::Empty => true,
            Aggregation::Buckets(buckets) | Aggregation::Keyed(buckets) => buckets.is_empty(),
            Aggregation::Single(_) => false,
        }
    }

    /// Buckets in response order. Empty for single-value and empty results.
    pub fn buckets(&self) -> &[Bucket] {
        match self {
            Aggregation::Buckets(buckets) | Aggregation::Keyed(buckets) => buckets,
            _ => &[],
        }
    }

    /// Look up a bucket by its key in string form, e.g. `"4922"` for a
    /// numeric key.
    pub fn bucket(&self, key: &str) -> Option<&AggregationNode> {
        self.buckets()
            .iter()
            .find(|bucket| bucket.key_string() == key)
            .map(|bucket| &bucket.node)
    }

    /// Map of bucket key to document count.
    pub fn doc_counts(&self) -> Vec<(String, u64)> {
        self.buckets()
            .iter()
            .map(|bucket| (bucket.key_string(), bucket.node.doc_count().unwrap_or(0)))
            .collect()
    }

    pub fn as_single(&self) -> Option<&AggregationNode> {
        match self {
            Aggregation::Single(node) => Some(node),
            _ => None,
        }
    }

    /// The `value` of a single-value aggregation such as `sum` or `avg`.
    pub fn value(&self) -> Option<&Value> {
        self.as_single().and_then(AggregationNode::value)
    }
}

/// One keyed bucket.
#[derive(Debug, Clone)]
pub struct Bucket {
    key: Value,
    node: AggregationNode,
}

impl Bucket {
    fn new(key: Value, bucket: &Value) -> Self {
        let fields = match bucket {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        Self {
            key,
            node: AggregationNode::new(fields),
        }
    }

    /// The bucket key as the engine returned it.
    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn key_string(&self) -> String {
        match &self.key {
            Value::String(key) => key.clone(),
            other => other.to_string(),
        }
    }

    pub fn node(&self) -> &AggregationNode {
        &self.node
    }

    pub fn doc_count(&self) -> Option<u64> {
        self.node.doc_count()
    }

    pub fn aggregation(&self, name: &str) -> &Aggregation {
        self.node.aggregation(name)
    }
}

/// A bucket body or a single-value aggregation body.
#[derive(Debug, Clone)]
pub struct AggregationNode {
    fields: Map<String, Value>,
    nested: OnceLock<HashMap<String, Aggregation>>,
}

impl AggregationNode {
    fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            nested: OnceLock::new(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn doc_count(&self) -> Option<u64> {
        self.fields.get("doc_count").and_then(Value::as_u64)
    }

    pub fn value(&self) -> Option<&Value> {
        self.fields.get("value")
    }

    /// A named sub-aggregation of this node. Unknown names decode to
    /// [`Aggregation::Empty`].
    pub fn aggregation(&self, name: &str) -> &Aggregation {
        self.nested
            .get_or_init(|| {
                self.fields
                    .iter()
                    .filter(|(_, value)| value.is_object())
                    .map(|(key, value)| (key.clone(), Aggregation::decode(Some(value))))
                    .collect()
            })
            .get(name)
            .unwrap_or(Aggregation::empty_ref())
    }
}
