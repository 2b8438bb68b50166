//! Raw schema definitions as supplied by the caller.
//!
//! A schema is a mapping from model name to a mapping of field name to
//! [`FieldDef`]. Definitions are serde-deserializable, so a schema can be
//! described in JSON:
//!
//! ```json
//! {
//!   "order": {
//!     "orderline_ids": {
//!       "type": "one2many",
//!       "related_to": "orderline",
//!       "relation_ref": "order_orderline_rel"
//!     }
//!   },
//!   "orderline": {
//!     "quantity": { "type": "number", "required": true },
//!     "order_id": {
//!       "type": "many2one",
//!       "related_to": "order",
//!       "relation_ref": "order_orderline_rel"
//!     }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw schema input: model name → field name → descriptor.
pub type ModelDefs = IndexMap<String, IndexMap<String, FieldDef>>;

/// Kind of a field. Any `type` string that is not one of the three
/// relational kinds deserializes as `Scalar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-valued relation: this side holds at most one counterpart.
    Many2One,
    /// Multi-valued side of an asymmetric relation.
    One2Many,
    /// Symmetric relation: both sides multi-valued.
    Many2Many,
    /// Plain scalar value (string, number, bool, ...).
    #[serde(other)]
    Scalar,
}

impl FieldKind {
    /// Whether this kind participates in a relation.
    pub fn is_relational(self) -> bool {
        !matches!(self, FieldKind::Scalar)
    }

    /// Whether this kind holds a set of counterparts.
    pub fn is_x2many(self) -> bool {
        matches!(self, FieldKind::One2Many | FieldKind::Many2Many)
    }

    /// The structurally opposite relational kind.
    pub fn inverse(self) -> Option<FieldKind> {
        match self {
            FieldKind::Many2One => Some(FieldKind::One2Many),
            FieldKind::One2Many => Some(FieldKind::Many2One),
            FieldKind::Many2Many => Some(FieldKind::Many2Many),
            FieldKind::Scalar => None,
        }
    }
}

/// Descriptor of one field in the raw schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Target model for relational kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_to: Option<String>,
    /// Grouping key pairing this field with its inverse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_ref: Option<String>,
    /// Whether the field must be present when creating a record.
    #[serde(default)]
    pub required: bool,
    /// For `one2many`: name of an existing `many2one` field on the target
    /// model to pair with, as an alternative to spelling `relation_ref`
    /// on both sides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
}

impl FieldDef {
    fn relational(kind: FieldKind, related_to: impl Into<String>, rel_ref: impl Into<String>) -> Self {
        FieldDef {
            kind,
            related_to: Some(related_to.into()),
            relation_ref: Some(rel_ref.into()),
            required: false,
            inverse: None,
        }
    }

    /// A plain scalar field.
    pub fn scalar() -> Self {
        FieldDef {
            kind: FieldKind::Scalar,
            related_to: None,
            relation_ref: None,
            required: false,
            inverse: None,
        }
    }

    /// A `many2one` field targeting `related_to`, grouped by `rel_ref`.
    pub fn many2one(related_to: impl Into<String>, rel_ref: impl Into<String>) -> Self {
        Self::relational(FieldKind::Many2One, related_to, rel_ref)
    }

    /// A `one2many` field targeting `related_to`, grouped by `rel_ref`.
    pub fn one2many(related_to: impl Into<String>, rel_ref: impl Into<String>) -> Self {
        Self::relational(FieldKind::One2Many, related_to, rel_ref)
    }

    /// A `one2many` field paired with the named `many2one` field on the
    /// target model instead of a shared `relation_ref`.
    pub fn one2many_inverse(related_to: impl Into<String>, inverse: impl Into<String>) -> Self {
        FieldDef {
            kind: FieldKind::One2Many,
            related_to: Some(related_to.into()),
            relation_ref: None,
            required: false,
            inverse: Some(inverse.into()),
        }
    }

    /// A `many2many` field targeting `related_to`, grouped by `rel_ref`.
    pub fn many2many(related_to: impl Into<String>, rel_ref: impl Into<String>) -> Self {
        Self::relational(FieldKind::Many2Many, related_to, rel_ref)
    }

    /// Mark the field as required on create.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
