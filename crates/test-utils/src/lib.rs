//! Sagoma test utilities.
//!
//! Helpers for integration testing: record fixtures in the seed/record JSON
//! shape, and assertion utilities for JSON:API documents.

use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Create a test record with a fresh id.
pub fn test_record(resource_type: &str) -> TestRecord {
    TestRecord {
        id: Uuid::now_v7().to_string(),
        resource_type: resource_type.to_string(),
        slug: None,
        attributes: serde_json::json!({}),
        relationships: Vec::new(),
    }
}

/// A test record builder for creating fixtures.
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub id: String,
    pub resource_type: String,
    pub slug: Option<String>,
    pub attributes: JsonValue,
    pub relationships: Vec<(String, Vec<TestRecord>)>,
}

impl TestRecord {
    /// Set a custom ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Set the slug used by friendly lookup.
    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    /// Add a single attribute.
    pub fn with_attribute(mut self, name: &str, value: JsonValue) -> Self {
        if let Some(obj) = self.attributes.as_object_mut() {
            obj.insert(name.to_string(), value);
        }
        self
    }

    /// Attach related records under a relationship name.
    pub fn with_related(mut self, relationship: &str, records: Vec<TestRecord>) -> Self {
        self.relationships.push((relationship.to_string(), records));
        self
    }

    /// Render in the record JSON shape accepted by the kernel.
    pub fn to_json(&self) -> JsonValue {
        let relationships: serde_json::Map<String, JsonValue> = self
            .relationships
            .iter()
            .map(|(name, records)| {
                (
                    name.clone(),
                    JsonValue::Array(records.iter().map(TestRecord::to_json).collect()),
                )
            })
            .collect();

        let mut value = serde_json::json!({
            "type": self.resource_type,
            "id": self.id,
            "attributes": self.attributes,
            "relationships": relationships,
        });
        if let Some(slug) = &self.slug {
            value["slug"] = JsonValue::String(slug.clone());
        }
        value
    }
}

/// Assertion helpers for JSON:API documents.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Ids of the primary data, in order.
    pub fn data_ids(document: &Value) -> Vec<String> {
        match &document["data"] {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect(),
            Value::Object(_) => document["data"]["id"]
                .as_str()
                .map(|id| vec![id.to_string()])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Assert that an error document carries a detail containing `needle`.
    pub fn error_detail_contains(document: &Value, needle: &str) {
        let details: Vec<&str> = document["errors"]
            .as_array()
            .map(|errors| errors.iter().filter_map(|e| e["detail"].as_str()).collect())
            .unwrap_or_default();
        assert!(
            details.iter().any(|d| d.contains(needle)),
            "Expected an error detail containing '{needle}'\nActual: {details:?}"
        );
    }
}
