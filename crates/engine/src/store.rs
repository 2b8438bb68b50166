//! Scalar record storage and the materialized read view.
//!
//! Only scalar field values are stored on a record. Relational fields
//! are derived: reading one resolves the record's node through the graph
//! store and looks up the opposite endpoints. [`Record`] is the
//! materialized result of such a read, a plain snapshot detached from
//! the store.

use indexmap::IndexMap;
use relata_core::{RecordId, Value};

/// Stored state of one record: its id and scalar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Record id.
    pub id: RecordId,
    /// Scalar field values, in assignment order.
    pub scalars: IndexMap<String, Value>,
}

/// Per-model record tables, creation-ordered.
#[derive(Debug, Default)]
pub struct RecordTable {
    by_model: IndexMap<String, IndexMap<RecordId, StoredRecord>>,
}

impl RecordTable {
    /// Create empty tables for the given model names.
    pub fn with_models<'a>(models: impl Iterator<Item = &'a str>) -> Self {
        let by_model = models
            .map(|m| (m.to_string(), IndexMap::new()))
            .collect();
        RecordTable { by_model }
    }

    /// Whether any record exists.
    pub fn is_empty(&self) -> bool {
        self.by_model.values().all(|t| t.is_empty())
    }

    /// Whether (`model`, `id`) names a live record.
    pub fn contains(&self, model: &str, id: &RecordId) -> bool {
        self.by_model
            .get(model)
            .is_some_and(|t| t.contains_key(id))
    }

    /// Look up a record.
    pub fn get(&self, model: &str, id: &RecordId) -> Option<&StoredRecord> {
        self.by_model.get(model).and_then(|t| t.get(id))
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, model: &str, id: &RecordId) -> Option<&mut StoredRecord> {
        self.by_model.get_mut(model).and_then(|t| t.get_mut(id))
    }

    /// Insert a record into its model table.
    pub fn insert(&mut self, model: &str, record: StoredRecord) {
        self.by_model
            .entry(model.to_string())
            .or_default()
            .insert(record.id.clone(), record);
    }

    /// Remove a record, returning it if present.
    pub fn remove(&mut self, model: &str, id: &RecordId) -> Option<StoredRecord> {
        self.by_model
            .get_mut(model)
            .and_then(|t| t.shift_remove(id))
    }

    /// All records of a model, in creation order.
    pub fn all(&self, model: &str) -> impl Iterator<Item = &StoredRecord> {
        self.by_model.get(model).into_iter().flat_map(|t| t.values())
    }

    /// Iterate every record as (model, record).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredRecord)> {
        self.by_model
            .iter()
            .flat_map(|(m, t)| t.values().map(move |r| (m.as_str(), r)))
    }
}

/// A resolved field on a materialized record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Scalar value.
    Scalar(Value),
    /// Single-valued relation: the linked counterpart, if any.
    One(Option<RecordId>),
    /// Multi-valued relation: linked counterparts in link order.
    Many(Vec<RecordId>),
}

/// A read view of one record with every field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: String,
    id: RecordId,
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub(crate) fn new(model: String, id: RecordId, fields: IndexMap<String, FieldValue>) -> Self {
        Record { model, id, fields }
    }

    /// Owning model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Record id.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// A scalar field's value. `None` for unassigned or relational
    /// fields.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            Some(FieldValue::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    /// The counterpart of a many2one field.
    pub fn one(&self, field: &str) -> Option<&RecordId> {
        match self.fields.get(field) {
            Some(FieldValue::One(id)) => id.as_ref(),
            _ => None,
        }
    }

    /// The counterparts of an x2many field, in link order. Empty for
    /// anything that is not a multi-valued field.
    pub fn many(&self, field: &str) -> &[RecordId] {
        match self.fields.get(field) {
            Some(FieldValue::Many(ids)) => ids,
            _ => &[],
        }
    }

    /// All resolved fields, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
