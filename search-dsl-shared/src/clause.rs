//! Primitive filter clauses and the field-to-filter transform.
//!
//! A [`Clause`] is the smallest fragment the criteria accumulates. Clauses are
//! built once and never mutated; rendering to the engine's JSON happens in
//! [`Clause::to_value`].

use std::ops::RangeInclusive;

use serde_json::{json, Value};

/// A single filter or query fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact match on a single value.
    Term { field: String, value: Value },
    /// Match any of the listed values.
    Terms { field: String, values: Vec<Value> },
    /// Inclusive range match.
    Range {
        field: String,
        gte: Value,
        lte: Value,
    },
    /// Negation of another clause, rendered as `{"not": ...}`.
    Negated(Box<Clause>),
    /// Arbitrary engine-specific JSON, passed through unexamined.
    Raw(Value),
}

impl Clause {
    /// Create a raw clause from any JSON fragment.
    pub fn raw(value: Value) -> Self {
        Self::Raw(value)
    }

    /// Wrap this clause in a negation.
    pub fn negate(self) -> Self {
        Self::Negated(Box::new(self))
    }

    /// Render the clause as engine JSON.
    pub fn to_value(&self) -> Value {
        match self {
            Clause::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Clause::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Clause::Range { field, gte, lte } => {
                json!({ "range": { field.as_str(): { "gte": gte, "lte": lte } } })
            }
            Clause::Negated(inner) => json!({ "not": inner.to_value() }),
            Clause::Raw(value) => value.clone(),
        }
    }
}

impl From<Value> for Clause {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

/// Render a slice of clauses as a JSON array.
pub fn clauses_to_values(clauses: &[Clause]) -> Vec<Value> {
    clauses.iter().map(Clause::to_value).collect()
}

/// The value side of a field-to-filter mapping.
///
/// The variant decides which clause the field compiles to: a list matches any
/// of its values, a range matches inclusively, anything else is an exact term.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    Scalar(Value),
    List(Vec<Value>),
    Range { min: Value, max: Value },
}

impl FieldFilter {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn any<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    fn into_clause(self, field: String) -> Clause {
        match self {
            FieldFilter::List(values) => Clause::Terms { field, values },
            FieldFilter::Range { min, max } => Clause::Range {
                field,
                gte: min,
                lte: max,
            },
            FieldFilter::Scalar(value) => Clause::Term { field, value },
        }
    }
}

impl<T: Into<Value>> From<RangeInclusive<T>> for FieldFilter {
    fn from(range: RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self::range(min, max)
    }
}

impl<T: Into<Value>> From<Vec<T>> for FieldFilter {
    fn from(values: Vec<T>) -> Self {
        Self::any(values)
    }
}

macro_rules! scalar_field_filter {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldFilter {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_field_filter!(&str, String, bool, i32, i64, u32, u64, f64);

impl From<Value> for FieldFilter {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::List(values),
            other => Self::Scalar(other),
        }
    }
}

/// Convert a field-to-filter mapping into one clause per entry, in order.
pub fn field_clauses<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Vec<Clause>
where
    K: Into<String>,
    V: Into<FieldFilter>,
{
    fields
        .into_iter()
        .map(|(field, filter)| filter.into().into_clause(field.into()))
        .collect()
}

/// Same as [`field_clauses`], with every clause negated.
pub fn negated_field_clauses<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Vec<Clause>
where
    K: Into<String>,
    V: Into<FieldFilter>,
{
    field_clauses(fields).into_iter().map(Clause::negate).collect()
}
