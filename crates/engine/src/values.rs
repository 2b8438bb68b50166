//! Field values supplied to create and update calls.
//!
//! [`Values`] is field-sparse: a field absent from it is left untouched
//! by `update` and defaulted by `create`. Field names not present in the
//! schema are silently ignored.

use indexmap::IndexMap;
use relata_core::{RecordId, Value};

use crate::commands::Command;

/// Input for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Scalar assignment.
    Scalar(Value),
    /// many2one: connect to an existing record by id.
    Id(RecordId),
    /// many2one: create the counterpart inline, then connect.
    Inline(Values),
    /// many2one: disconnect whatever is currently linked.
    Unset,
    /// x2many: ordered command sequence.
    Commands(Vec<Command>),
}

/// Ordered field-name → input map for one create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    id: Option<RecordId>,
    fields: IndexMap<String, FieldInput>,
}

impl Values {
    /// An empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply an explicit record id (create only; ignored by update).
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Assign a scalar field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(field.into(), FieldInput::Scalar(value.into()));
        self
    }

    /// Point a many2one field at an existing record.
    pub fn one(mut self, field: impl Into<String>, id: impl Into<RecordId>) -> Self {
        self.fields.insert(field.into(), FieldInput::Id(id.into()));
        self
    }

    /// Create the many2one counterpart inline and connect to it.
    pub fn one_new(mut self, field: impl Into<String>, values: Values) -> Self {
        self.fields
            .insert(field.into(), FieldInput::Inline(values));
        self
    }

    /// Disconnect a many2one field (the update-call equivalent of
    /// passing `false`).
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldInput::Unset);
        self
    }

    /// Apply a command sequence to an x2many field.
    pub fn many(
        mut self,
        field: impl Into<String>,
        commands: impl IntoIterator<Item = Command>,
    ) -> Self {
        self.fields.insert(
            field.into(),
            FieldInput::Commands(commands.into_iter().collect()),
        );
        self
    }

    /// The explicit id, if one was supplied.
    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    /// Whether the field has an input.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate inputs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldInput)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
