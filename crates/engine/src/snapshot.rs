//! Whole-store export and import.
//!
//! A [`Snapshot`] carries the three storage layers (records, nodes,
//! links) as plain serde-friendly entries. Export walks the live
//! tables; import replays the entries into an empty store without
//! emitting change events, so a loaded store starts with a clean
//! buffer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use relata_core::{RecordId, StoreError, StoreResult, Value};

use crate::facade::ModelStore;
use crate::graph::{Link, LinkId, Node, NodeKey};
use crate::store::StoredRecord;

/// One record: its model, id, and scalar values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Owning model.
    pub model: String,
    /// Record id.
    pub id: RecordId,
    /// Scalar field values.
    pub values: IndexMap<String, Value>,
}

/// One node: its relation ref, key, and held link ids. The node's
/// cardinality is not stored; it is re-derived from the schema on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Relation the node belongs to.
    pub relation_ref: String,
    /// The (model, field, record) the node stands for.
    pub key: NodeKey,
    /// Link ids currently on the node, in insertion order.
    pub links: Vec<LinkId>,
}

/// One link and the relation it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Relation the link belongs to.
    pub relation_ref: String,
    /// The link itself, both endpoints included.
    pub link: Link,
}

/// A complete serializable copy of a store's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every record, in creation order.
    pub records: Vec<RecordEntry>,
    /// Every node.
    pub nodes: Vec<NodeEntry>,
    /// Every link.
    pub links: Vec<LinkEntry>,
}

impl ModelStore {
    /// Export the store's current state.
    pub fn snapshot(&self) -> Snapshot {
        let records = self
            .records
            .iter()
            .map(|(model, record)| RecordEntry {
                model: model.to_string(),
                id: record.id.clone(),
                values: record.scalars.clone(),
            })
            .collect();
        let nodes = self
            .graph
            .all_nodes()
            .map(|(ref_name, key, node)| NodeEntry {
                relation_ref: ref_name.to_string(),
                key: key.clone(),
                links: node.link_ids(),
            })
            .collect();
        let links = self
            .graph
            .all_links()
            .map(|(ref_name, link)| LinkEntry {
                relation_ref: ref_name.to_string(),
                link: link.clone(),
            })
            .collect();
        Snapshot {
            records,
            nodes,
            links,
        }
    }

    /// Replay a snapshot into this store.
    ///
    /// The store must be empty and its schema must know every model and
    /// relation the snapshot references. No change events are emitted.
    pub fn load(&mut self, snapshot: Snapshot) -> StoreResult<()> {
        if !self.records.is_empty() || !self.graph.is_empty() {
            return Err(StoreError::validation(
                "snapshot can only be loaded into an empty store",
            ));
        }
        for entry in snapshot.records {
            if !self.schema.has_model(&entry.model) {
                return Err(StoreError::schema(format!(
                    "snapshot references unknown model '{}'",
                    entry.model
                )));
            }
            self.records.insert(
                &entry.model,
                StoredRecord {
                    id: entry.id,
                    scalars: entry.values,
                },
            );
        }
        for entry in snapshot.nodes {
            let role = self
                .schema
                .relation(&entry.relation_ref)
                .ok_or_else(|| {
                    StoreError::schema(format!(
                        "snapshot references unknown relation '{}'",
                        entry.relation_ref
                    ))
                })?
                .role_of(&entry.key.model, &entry.key.field);
            let mut node = Node::for_role(role);
            for link in entry.links {
                node.insert(link);
            }
            self.graph.insert_node_raw(&entry.relation_ref, entry.key, node);
        }
        for entry in snapshot.links {
            if self.schema.relation(&entry.relation_ref).is_none() {
                return Err(StoreError::schema(format!(
                    "snapshot references unknown relation '{}'",
                    entry.relation_ref
                )));
            }
            self.graph.insert_link_raw(&entry.relation_ref, entry.link);
        }
        tracing::debug!(
            target: "relata::snapshot",
            links = self.graph.link_count(),
            "snapshot loaded"
        );
        Ok(())
    }
}
