//! Metadata filters for search.
//!
//! Filters are JSON documents in the service's operator syntax:
//!
//! ```json
//! {"$and": [{"category": "B"}, {"quantity": {"$gt": 2}}]}
//! ```
//!
//! They are sent as-is; the service validates them and rejects filters
//! over non-filterable keys.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A metadata filter document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Value);

impl Filter {
    /// `key` equals `value`
    pub fn eq(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$eq", value.into())
    }

    pub fn ne(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$ne", value.into())
    }

    pub fn gt(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$gt", value.into())
    }

    pub fn gte(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$gte", value.into())
    }

    pub fn lt(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$lt", value.into())
    }

    pub fn lte(key: &str, value: impl Into<Value>) -> Self {
        Self::op(key, "$lte", value.into())
    }

    /// `key` is one of `values`
    pub fn in_list<V: Into<Value>>(key: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::op(key, "$in", Value::Array(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in<V: Into<Value>>(key: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::op(key, "$nin", Value::Array(values.into_iter().map(Into::into).collect()))
    }

    /// `key` is present (or absent, when `exists` is false)
    pub fn exists(key: &str, exists: bool) -> Self {
        Self::op(key, "$exists", Value::Bool(exists))
    }

    /// All of `filters` match
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter(json!({ "$and": filters.into_iter().map(|f| f.0).collect::<Vec<_>>() }))
    }

    /// Any of `filters` matches
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter(json!({ "$or": filters.into_iter().map(|f| f.0).collect::<Vec<_>>() }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn op(key: &str, op: &str, value: Value) -> Self {
        let mut inner = serde_json::Map::new();
        inner.insert(op.to_string(), value);
        let mut outer = serde_json::Map::new();
        outer.insert(key.to_string(), Value::Object(inner));
        Filter(Value::Object(outer))
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        Filter(value)
    }
}
