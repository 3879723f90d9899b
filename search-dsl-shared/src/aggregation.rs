//! Aggregation definitions held by a criteria.

use serde_json::{json, Map, Value};

use crate::criteria::Criteria;

/// One named aggregation request.
///
/// `Plain` is passed to the engine as-is. `Nested` carries its own
/// sub-criteria whose filters and sub-aggregations are compiled into the
/// definition when the request body is built, since their encoding depends on
/// the dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationDef {
    Plain(Value),
    Nested {
        definition: Map<String, Value>,
        criteria: Box<Criteria>,
    },
}

impl AggregationDef {
    /// A `terms` aggregation on `field`, extended with `options`.
    pub fn terms(field: &str, options: Value) -> Value {
        let mut terms = Map::new();
        terms.insert("field".to_string(), json!(field));
        if let Value::Object(options) = options {
            terms.extend(options);
        }
        json!({ "terms": terms })
    }

    pub fn nested(definition: Value, criteria: Criteria) -> Self {
        let definition = match definition {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::Nested {
            definition,
            criteria: Box::new(criteria),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_merges_options() {
        assert_eq!(
            AggregationDef::terms("category", json!({ "size": 2 })),
            json!({ "terms": { "field": "category", "size": 2 } })
        );
        assert_eq!(
            AggregationDef::terms("category", Value::Null),
            json!({ "terms": { "field": "category" } })
        );
    }

    #[test]
    fn test_nested_ignores_non_object_definition() {
        let def = AggregationDef::nested(json!("bogus"), Criteria::new());
        match def {
            AggregationDef::Nested { definition, .. } => assert!(definition.is_empty()),
            AggregationDef::Plain(_) => panic!("expected nested definition"),
        }
    }
}
