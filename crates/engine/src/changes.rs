//! Per-call change accumulation and coalescing.
//!
//! Every mutation inside one public call appends events here; the facade
//! flushes the buffer to the external listener exactly once per call, so
//! a create that fans out into nested creates and a handful of links
//! still produces a single notification.
//!
//! Coalescing, applied when two events target the same identity within
//! one buffer lifetime:
//!
//! | existing | incoming | result |
//! |----------|----------|--------|
//! | created  | deleted  | entry removed (net no-op) |
//! | modified | deleted  | deleted |
//! | created  | modified | created (payload refreshed) |
//! | deleted  | created  | both kept, in order (see below) |
//!
//! A `deleted` entry is never cancelled by a later `created` for the same
//! identity: the delete seals the entry and the create starts a fresh
//! one, so identity reuse within a batch is reported as `deleted`
//! followed by `created` rather than silently collapsing to nothing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use relata_core::Value;

/// What happened to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The target came into existence.
    Created,
    /// The target changed in place.
    Modified,
    /// The target was removed.
    Deleted,
}

/// What kind of entity the event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTarget {
    /// A record in a model table.
    Record,
    /// A (record, relational field) node.
    Node,
    /// A link between two records.
    Link,
}

/// One change event, identified by (namespace, id) where the namespace is
/// the owning model (records, nodes) or the relation ref (links).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened.
    pub kind: ChangeKind,
    /// What it happened to.
    pub target: ChangeTarget,
    /// Owning model or relation ref.
    pub namespace: String,
    /// Identity within the namespace.
    pub id: String,
    /// Optional payload: scalar values for record events, endpoints for
    /// link creation.
    pub payload: Option<Value>,
}

impl ChangeEvent {
    /// A record-targeted event.
    pub fn record(kind: ChangeKind, model: impl Into<String>, id: impl Into<String>, payload: Option<Value>) -> Self {
        ChangeEvent {
            kind,
            target: ChangeTarget::Record,
            namespace: model.into(),
            id: id.into(),
            payload,
        }
    }

    /// A node-targeted event.
    pub fn node(kind: ChangeKind, model: impl Into<String>, id: impl Into<String>) -> Self {
        ChangeEvent {
            kind,
            target: ChangeTarget::Node,
            namespace: model.into(),
            id: id.into(),
            payload: None,
        }
    }

    /// A link-targeted event.
    pub fn link(kind: ChangeKind, relation_ref: impl Into<String>, id: impl Into<String>, payload: Option<Value>) -> Self {
        ChangeEvent {
            kind,
            target: ChangeTarget::Link,
            namespace: relation_ref.into(),
            id: id.into(),
            payload,
        }
    }
}

type ChangeKey = (ChangeTarget, String, String);

/// Map-keyed accumulator for one public call.
#[derive(Debug, Default)]
pub struct ChangeBuffer {
    /// Sealed events: deletions that were followed by a re-creation of
    /// the same identity. Flushed ahead of the active entries.
    sealed: Vec<ChangeEvent>,
    active: IndexMap<ChangeKey, ChangeEvent>,
}

impl ChangeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, coalescing against any existing entry for the
    /// same (target, namespace, id).
    pub fn add(&mut self, event: ChangeEvent) {
        let key = (event.target, event.namespace.clone(), event.id.clone());
        let existing = match self.active.get_mut(&key) {
            None => {
                self.active.insert(key, event);
                return;
            }
            Some(existing) => existing,
        };
        match (existing.kind, event.kind) {
            (ChangeKind::Created, ChangeKind::Deleted) => {
                self.active.shift_remove(&key);
            }
            (ChangeKind::Modified, ChangeKind::Deleted) => {
                *existing = event;
            }
            (ChangeKind::Deleted, ChangeKind::Created) => {
                // Identity reuse after deletion is a genuinely new
                // identity: seal the deletion, start a fresh entry.
                let sealed = self.active.shift_remove(&key);
                if let Some(sealed) = sealed {
                    self.sealed.push(sealed);
                }
                self.active.insert(key, event);
            }
            (ChangeKind::Created, ChangeKind::Modified) => {
                // Still reported as created; payload refreshed.
                if event.payload.is_some() {
                    existing.payload = event.payload;
                }
            }
            (ChangeKind::Modified, ChangeKind::Modified) => {
                if event.payload.is_some() {
                    existing.payload = event.payload;
                }
            }
            _ => {}
        }
    }

    /// Whether no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.sealed.is_empty() && self.active.is_empty()
    }

    /// Drain the buffer, returning sealed deletions first and the
    /// remaining entries in insertion order.
    pub fn flush(&mut self) -> Vec<ChangeEvent> {
        let mut events = std::mem::take(&mut self.sealed);
        events.extend(self.active.drain(..).map(|(_, e)| e));
        events
    }
}
