//! Resource record model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resource instance as seen by the kernel.
///
/// Related records are embedded by relationship name so include trees can be
/// walked without another round trip to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Resource type name (e.g. "articles").
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Primary identifier.
    pub id: String,

    /// Human-readable slug for friendly lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(default)]
    pub attributes: Map<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            slug: None,
            attributes: Map::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Attach records under a relationship name.
    pub fn with_related(mut self, relationship: impl Into<String>, records: Vec<Record>) -> Self {
        self.relationships
            .entry(relationship.into())
            .or_default()
            .extend(records);
        self
    }

    /// Value used when ordering: `id` and `slug` resolve to the identity
    /// fields, anything else to the attribute.
    pub fn sort_value(&self, field: &str) -> Value {
        match field {
            "id" => Value::String(self.id.clone()),
            "slug" => self.slug.clone().map(Value::String).unwrap_or(Value::Null),
            _ => self.attributes.get(field).cloned().unwrap_or(Value::Null),
        }
    }

    pub fn related(&self, relationship: &str) -> &[Record] {
        self.relationships
            .get(relationship)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
