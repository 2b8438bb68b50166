//! Node and link types for the relation storage layer.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use relata_core::{RecordId, RecordRef};

use crate::schema::Role;

/// One endpoint of a link: a specific record seen through a specific
/// relational field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEnd {
    /// Model of the record.
    pub model: String,
    /// Relational field on that model.
    pub field: String,
    /// Record id.
    pub id: RecordId,
}

impl LinkEnd {
    /// Create a link end.
    pub fn new(model: impl Into<String>, field: impl Into<String>, id: impl Into<RecordId>) -> Self {
        LinkEnd {
            model: model.into(),
            field: field.into(),
            id: id.into(),
        }
    }

    /// The record identity at this end.
    pub fn record(&self) -> RecordRef {
        RecordRef::new(self.model.clone(), self.id.clone())
    }

    fn sort_key(&self) -> (&str, &str, &str) {
        (&self.model, &self.field, self.id.as_str())
    }
}

/// Canonical identifier of a link.
///
/// Derived deterministically from both endpoints ordered by
/// `(model, field, id)`, so both participants compute the same id
/// regardless of which side initiated the connection. The field name in
/// the ordering is what keeps the two directions of an asymmetric
/// self-relation distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    /// Compute the canonical id for a pair of endpoints.
    pub fn canonical(a: &LinkEnd, b: &LinkEnd) -> LinkId {
        let (x, y) = if a.sort_key() <= b.sort_key() {
            (a, b)
        } else {
            (b, a)
        };
        LinkId(format!(
            "{}/{}/{}--{}/{}/{}",
            x.model, x.field, x.id, y.model, y.field, y.id
        ))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An edge record representing one connection between two records.
///
/// Created exactly when two records are connected and destroyed exactly
/// when they are disconnected, directly or via cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Canonical id.
    pub id: LinkId,
    /// One endpoint.
    pub a: LinkEnd,
    /// The other endpoint.
    pub b: LinkEnd,
}

impl Link {
    /// Build a link from two endpoints, computing the canonical id.
    pub fn between(a: LinkEnd, b: LinkEnd) -> Link {
        let id = LinkId::canonical(&a, &b);
        Link { id, a, b }
    }

    /// The endpoint opposite to (`model`, `field`, `id`).
    pub fn other_end(&self, model: &str, field: &str, id: &RecordId) -> &LinkEnd {
        if self.a.model == model && self.a.field == field && &self.a.id == id {
            &self.b
        } else {
            &self.a
        }
    }
}

/// Key of a node: one (record, relational field) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    /// Model of the record.
    pub model: String,
    /// Relational field.
    pub field: String,
    /// Record id.
    pub id: RecordId,
}

impl NodeKey {
    /// Create a node key.
    pub fn new(model: impl Into<String>, field: impl Into<String>, id: impl Into<RecordId>) -> Self {
        NodeKey {
            model: model.into(),
            field: field.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.model, self.id, self.field)
    }
}

/// Per (record, relational field) storage of the field's current links.
///
/// A single-valued role holds at most one link id; a multi-valued role
/// holds a set of link ids iterated in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Single-valued role (`many2one`).
    Single(Option<LinkId>),
    /// Multi-valued role (`one2many`, `many2many`).
    Multi(IndexSet<LinkId>),
}

impl Node {
    /// An empty node appropriate for the given role.
    pub fn for_role(role: Role) -> Node {
        match role {
            Role::Single => Node::Single(None),
            Role::Multi => Node::Multi(IndexSet::new()),
        }
    }

    /// Add a link id. For a single-valued node this assumes the previous
    /// link was already disconnected by the caller.
    pub fn insert(&mut self, link: LinkId) {
        match self {
            Node::Single(slot) => *slot = Some(link),
            Node::Multi(set) => {
                set.insert(link);
            }
        }
    }

    /// Remove a link id. Returns whether it was present.
    pub fn remove(&mut self, link: &LinkId) -> bool {
        match self {
            Node::Single(slot) => {
                if slot.as_ref() == Some(link) {
                    *slot = None;
                    true
                } else {
                    false
                }
            }
            // shift_remove keeps the insertion order of the remainder.
            Node::Multi(set) => set.shift_remove(link),
        }
    }

    /// Current link ids, in insertion order.
    pub fn link_ids(&self) -> Vec<LinkId> {
        match self {
            Node::Single(slot) => slot.iter().cloned().collect(),
            Node::Multi(set) => set.iter().cloned().collect(),
        }
    }

    /// The held link of a single-valued node.
    pub fn current(&self) -> Option<&LinkId> {
        match self {
            Node::Single(slot) => slot.as_ref(),
            Node::Multi(_) => None,
        }
    }

    /// Number of links on this node.
    pub fn len(&self) -> usize {
        match self {
            Node::Single(slot) => usize::from(slot.is_some()),
            Node::Multi(set) => set.len(),
        }
    }

    /// Whether the node holds no links.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
