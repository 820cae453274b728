//! JSON:API document rendering.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::directive::{IncludeNode, RequestOptions};
use crate::record::Record;

/// Media type for every response body.
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// Serialization contract: records plus request options in, payload out.
pub trait DocumentSerializer: Send + Sync {
    fn render_one(&self, record: &Record, options: &RequestOptions) -> Value;

    fn render_many(&self, records: &[Record], options: &RequestOptions) -> Value;
}

/// Renders JSON:API documents with `data` and, when includes were requested,
/// a deduplicated `included` array.
///
/// Relationship data is always rendered as an array of resource identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiSerializer;

impl JsonApiSerializer {
    fn resource_object(&self, record: &Record, relationships: &[IncludeNode]) -> Value {
        let mut object = json!({
            "type": record.resource_type,
            "id": record.id,
            "attributes": record.attributes,
        });

        if !relationships.is_empty() {
            let rendered: Map<String, Value> = relationships
                .iter()
                .map(|node| {
                    let data: Vec<Value> = record
                        .related(node.name())
                        .iter()
                        .map(|r| json!({ "type": r.resource_type, "id": r.id }))
                        .collect();
                    (node.name().to_string(), json!({ "data": data }))
                })
                .collect();
            object["relationships"] = Value::Object(rendered);
        }

        object
    }

    fn collect_included(
        &self,
        record: &Record,
        tree: &[IncludeNode],
        seen: &mut HashSet<(String, String)>,
        included: &mut Vec<Value>,
    ) {
        for node in tree {
            for related in record.related(node.name()) {
                let key = (related.resource_type.clone(), related.id.clone());
                if seen.insert(key) {
                    included.push(self.resource_object(related, node.children()));
                }
                self.collect_included(related, node.children(), seen, included);
            }
        }
    }

    fn document(&self, data: Value, primary: &[&Record], options: &RequestOptions) -> Value {
        let mut document = json!({ "data": data });
        if options.include_tree.is_empty() {
            return document;
        }

        let mut seen: HashSet<(String, String)> = primary
            .iter()
            .map(|r| (r.resource_type.clone(), r.id.clone()))
            .collect();
        let mut included = Vec::new();
        for record in primary {
            self.collect_included(record, &options.include_tree, &mut seen, &mut included);
        }
        document["included"] = Value::Array(included);
        document
    }
}

impl DocumentSerializer for JsonApiSerializer {
    fn render_one(&self, record: &Record, options: &RequestOptions) -> Value {
        let data = self.resource_object(record, &options.include_tree);
        self.document(data, &[record], options)
    }

    fn render_many(&self, records: &[Record], options: &RequestOptions) -> Value {
        let data: Vec<Value> = records
            .iter()
            .map(|r| self.resource_object(r, &options.include_tree))
            .collect();
        let primary: Vec<&Record> = records.iter().collect();
        self.document(Value::Array(data), &primary, options)
    }
}
