//! Record identity types and the scalar value representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar field payload. Relational fields never store a `Value`; they are
/// derived from the graph layer at read time.
pub type Value = serde_json::Value;

/// Identifier of a record within its model's namespace.
///
/// Ids are opaque strings: caller-supplied on create, or produced by the
/// store's [`IdAllocator`](crate::ident::IdAllocator). Uniqueness is only
/// guaranteed per model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a record id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<&RecordId> for RecordId {
    fn from(id: &RecordId) -> Self {
        id.clone()
    }
}

/// A (model, id) identity pair.
///
/// All cross-record "pointers" in the store are `RecordRef` lookups into
/// per-model tables; records never own each other, which is what makes
/// cyclic bidirectional references representable at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    /// Owning model name.
    pub model: String,
    /// Record id within the model.
    pub id: RecordId,
}

impl RecordRef {
    /// Create a record reference.
    pub fn new(model: impl Into<String>, id: impl Into<RecordId>) -> Self {
        RecordRef {
            model: model.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model, self.id)
    }
}
