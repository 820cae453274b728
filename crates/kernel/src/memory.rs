//! In-memory resource store.
//!
//! Backs the demo server and the integration tests. Collections are
//! snapshots taken when the handle is created; shaping is applied on fetch.

use std::cmp::Ordering;

use parking_lot::RwLock;
use serde_json::Value;

use crate::collection::{CollectionHandle, ResourceFinder, ResourceStore};
use crate::directive::{IncludeNode, SortKey};
use crate::error::ValidationErrors;
use crate::record::Record;

/// Records of a single resource type held in memory.
pub struct MemoryStore {
    resource_type: String,
    friendly: bool,
    required: Vec<String>,
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            friendly: false,
            required: Vec::new(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Resolve members by slug as well as by id.
    pub fn with_friendly_lookup(mut self) -> Self {
        self.friendly = true;
        self
    }

    /// Attributes that must be present and non-blank on insert.
    pub fn with_required_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_records(self, records: Vec<Record>) -> Self {
        *self.records.write() = records;
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// `existing` must not contain `record` itself when replacing it.
    fn validate(&self, record: &Record, existing: &[Record]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for attribute in &self.required {
            let blank = match record.attributes.get(attribute) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if blank {
                errors.add(attribute.as_str(), "can't be blank");
            }
        }

        if existing.iter().any(|r| r.id == record.id) {
            errors.add("id", "has already been taken");
        }
        if let Some(slug) = &record.slug
            && existing.iter().any(|r| r.slug.as_ref() == Some(slug))
        {
            errors.add("slug", "has already been taken");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl ResourceStore for MemoryStore {
    type Collection = MemoryCollection;

    fn collection(&self) -> MemoryCollection {
        MemoryCollection::new(self.records.read().clone(), self.friendly)
    }

    fn insert(&self, record: Record) -> Result<Record, ValidationErrors> {
        let mut records = self.records.write();
        self.validate(&record, &records)?;
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: Record) -> Result<Record, ValidationErrors> {
        let mut records = self.records.write();
        let Some(index) = records.iter().position(|r| r.id == record.id) else {
            let mut errors = ValidationErrors::new();
            errors.add("id", "does not exist");
            return Err(errors);
        };

        let (before, after) = records.split_at(index);
        let others: Vec<Record> = before.iter().chain(&after[1..]).cloned().collect();
        self.validate(&record, &others)?;

        records[index] = record.clone();
        Ok(record)
    }

    fn delete(&self, id: &str) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        records.len() != before
    }
}

/// Shaped view over a snapshot of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    records: Vec<Record>,
    friendly: bool,
    includes: Vec<IncludeNode>,
    order: Vec<SortKey>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl MemoryCollection {
    pub fn new(records: Vec<Record>, friendly: bool) -> Self {
        Self {
            records,
            friendly,
            ..Default::default()
        }
    }

    /// Keep only matching records. Intended for filter hooks.
    pub fn retain(mut self, mut keep: impl FnMut(&Record) -> bool) -> Self {
        self.records.retain(|r| keep(r));
        self
    }

    /// Include tree requested through [`CollectionHandle::expand`].
    pub fn includes(&self) -> &[IncludeNode] {
        &self.includes
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.order
    }
}

impl CollectionHandle for MemoryCollection {
    fn expand(mut self, tree: &[IncludeNode]) -> Self {
        self.includes.extend_from_slice(tree);
        self
    }

    fn order_by(mut self, keys: &[SortKey]) -> Self {
        self.order.extend_from_slice(keys);
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl ResourceFinder for MemoryCollection {
    type Resource = Record;

    fn supports_friendly_lookup(&self) -> bool {
        self.friendly
    }

    fn find_by_id(&self, id: &str) -> Option<Record> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    /// Slug match first, then primary id.
    fn find_by_friendly_id(&self, id: &str) -> Option<Record> {
        self.records
            .iter()
            .find(|r| r.slug.as_deref() == Some(id))
            .or_else(|| self.records.iter().find(|r| r.id == id))
            .cloned()
    }

    fn fetch(&self) -> Vec<Record> {
        let mut records = self.records.clone();
        if !self.order.is_empty() {
            records.sort_by(|a, b| compare_records(a, b, &self.order));
        }

        let offset = self
            .offset
            .map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
        let limit = self
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        records.into_iter().skip(offset).take(limit).collect()
    }
}

fn compare_records(a: &Record, b: &Record, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = compare_values(&a.sort_value(&key.field), &b.sort_value(&key.field));
        let ordering = if key.is_descending() {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order over JSON values: null < bool < number < string < other.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
