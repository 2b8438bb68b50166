//! Relation storage: the node/link bipartite layer.
//!
//! Relations are stored independently of the records they connect. Each
//! relation ref owns a node table (one node per (record, relational
//! field) pair) and a link table (one link per connected pair). The
//! connect/disconnect algorithms below are what keep every relation
//! consistent from both endpoints:
//!
//! 1. a link id appears in the nodes of both its endpoints, or in
//!    neither;
//! 2. a single-valued node never holds more than one link id;
//! 3. deleting a record removes every link and node referencing it;
//! 4. connecting into an occupied single-valued role replaces the
//!    previous link instead of erroring.

pub mod types;

pub use types::{Link, LinkEnd, LinkId, Node, NodeKey};

use indexmap::IndexMap;
use relata_core::{RecordId, RecordRef};

use crate::changes::{ChangeBuffer, ChangeEvent, ChangeKind};
use crate::schema::{FieldSlot, Relation, Role};

fn node_event_id(id: &RecordId, field: &str) -> String {
    format!("{}/{}", id, field)
}

/// Node and link tables, keyed by relation ref.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<String, IndexMap<NodeKey, Node>>,
    links: IndexMap<String, IndexMap<LinkId, Link>>,
}

impl GraphStore {
    /// Create an empty graph store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no nodes or links exist.
    pub fn is_empty(&self) -> bool {
        self.nodes.values().all(|t| t.is_empty()) && self.links.values().all(|t| t.is_empty())
    }

    /// Total number of links across all relations.
    pub fn link_count(&self) -> usize {
        self.links.values().map(|t| t.len()).sum()
    }

    /// Total number of nodes across all relations.
    pub fn node_count(&self) -> usize {
        self.nodes.values().map(|t| t.len()).sum()
    }

    /// Allocate the role-appropriate empty node for `id`'s field in the
    /// relation.
    pub fn create_node(
        &mut self,
        relation: &Relation,
        slot: &FieldSlot,
        id: &RecordId,
        changes: &mut ChangeBuffer,
    ) {
        let role = relation.role_of(&slot.model, &slot.field);
        let key = NodeKey::new(&slot.model, &slot.field, id);
        self.nodes
            .entry(relation.ref_name().to_string())
            .or_default()
            .insert(key, Node::for_role(role));
        changes.add(ChangeEvent::node(
            ChangeKind::Created,
            &slot.model,
            node_event_id(id, &slot.field),
        ));
    }

    /// Connect `owner_id` (through `owner`'s field) to `target_id`.
    ///
    /// Idempotent for already-connected pairs. A single-valued end that
    /// already holds a link is disconnected first (replace, not error).
    pub fn connect(
        &mut self,
        relation: &Relation,
        owner: &FieldSlot,
        owner_id: &RecordId,
        target_id: &RecordId,
        changes: &mut ChangeBuffer,
    ) {
        let inverse = relation.inverse_of(&owner.model, &owner.field).clone();
        let link = Link::between(
            LinkEnd::new(&owner.model, &owner.field, owner_id),
            LinkEnd::new(&inverse.model, &inverse.field, target_id),
        );
        let ref_name = relation.ref_name();
        if self
            .links
            .get(ref_name)
            .is_some_and(|t| t.contains_key(&link.id))
        {
            return;
        }

        // Replace semantics for occupied single-valued ends.
        for (slot, rid) in [(owner, owner_id), (&inverse, target_id)] {
            if relation.role_of(&slot.model, &slot.field) != Role::Single {
                continue;
            }
            let key = NodeKey::new(&slot.model, &slot.field, rid);
            let current = self
                .nodes
                .get(ref_name)
                .and_then(|t| t.get(&key))
                .and_then(|n| n.current().cloned());
            if let Some(existing) = current {
                self.remove_link(ref_name, &existing, changes);
            }
        }

        tracing::debug!(target: "relata::graph", link = %link.id, "connect");
        for end in [link.a.clone(), link.b.clone()] {
            let role = relation.role_of(&end.model, &end.field);
            let key = NodeKey::new(&end.model, &end.field, &end.id);
            let node = self
                .nodes
                .entry(ref_name.to_string())
                .or_default()
                .entry(key)
                .or_insert_with(|| Node::for_role(role));
            node.insert(link.id.clone());
            changes.add(ChangeEvent::node(
                ChangeKind::Modified,
                &end.model,
                node_event_id(&end.id, &end.field),
            ));
        }
        changes.add(ChangeEvent::link(
            ChangeKind::Created,
            ref_name,
            link.id.as_str(),
            serde_json::to_value(&link).ok(),
        ));
        self.links
            .entry(ref_name.to_string())
            .or_default()
            .insert(link.id.clone(), link);
    }

    /// Disconnect `owner_id` from `target_id`. Silent no-op when the two
    /// records are not linked.
    pub fn disconnect(
        &mut self,
        relation: &Relation,
        owner: &FieldSlot,
        owner_id: &RecordId,
        target_id: &RecordId,
        changes: &mut ChangeBuffer,
    ) {
        let inverse = relation.inverse_of(&owner.model, &owner.field);
        let link_id = LinkId::canonical(
            &LinkEnd::new(&owner.model, &owner.field, owner_id),
            &LinkEnd::new(&inverse.model, &inverse.field, target_id),
        );
        self.remove_link(relation.ref_name(), &link_id, changes);
    }

    /// Disconnect every link on `id`'s node, then delete the node
    /// (record deletion) or leave it empty (`clear` command).
    pub fn clear(
        &mut self,
        relation: &Relation,
        slot: &FieldSlot,
        id: &RecordId,
        delete_node: bool,
        changes: &mut ChangeBuffer,
    ) {
        let ref_name = relation.ref_name();
        let key = NodeKey::new(&slot.model, &slot.field, id);
        // Snapshot the link ids before disconnecting: removal mutates the
        // same collection.
        let link_ids: Vec<LinkId> = self
            .nodes
            .get(ref_name)
            .and_then(|t| t.get(&key))
            .map(|n| n.link_ids())
            .unwrap_or_default();
        for link_id in link_ids {
            self.remove_link(ref_name, &link_id, changes);
        }
        if delete_node
            && self
                .nodes
                .get_mut(ref_name)
                .and_then(|t| t.shift_remove(&key))
                .is_some()
        {
            changes.add(ChangeEvent::node(
                ChangeKind::Deleted,
                &slot.model,
                node_event_id(id, &slot.field),
            ));
        }
    }

    /// Resolve `id`'s node to the opposite endpoints' record identities,
    /// in link-insertion order.
    pub fn linked(&self, relation: &Relation, slot: &FieldSlot, id: &RecordId) -> Vec<RecordRef> {
        let ref_name = relation.ref_name();
        let key = NodeKey::new(&slot.model, &slot.field, id);
        let node = match self.nodes.get(ref_name).and_then(|t| t.get(&key)) {
            Some(n) => n,
            None => return Vec::new(),
        };
        let links = self.links.get(ref_name);
        node.link_ids()
            .iter()
            .filter_map(|lid| links.and_then(|t| t.get(lid)))
            .map(|link| link.other_end(&slot.model, &slot.field, id).record())
            .collect()
    }

    /// The single linked counterpart, for single-valued roles.
    pub fn linked_one(
        &self,
        relation: &Relation,
        slot: &FieldSlot,
        id: &RecordId,
    ) -> Option<RecordRef> {
        self.linked(relation, slot, id).into_iter().next()
    }

    /// The node stored for a key, if any.
    pub fn node(&self, ref_name: &str, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(ref_name).and_then(|t| t.get(key))
    }

    /// Iterate all nodes as (relation ref, key, node).
    pub fn all_nodes(&self) -> impl Iterator<Item = (&str, &NodeKey, &Node)> {
        self.nodes.iter().flat_map(|(ref_name, table)| {
            table
                .iter()
                .map(move |(key, node)| (ref_name.as_str(), key, node))
        })
    }

    /// Iterate all links as (relation ref, link).
    pub fn all_links(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.links.iter().flat_map(|(ref_name, table)| {
            table.values().map(move |link| (ref_name.as_str(), link))
        })
    }

    /// Insert a node during snapshot replay, bypassing events.
    pub(crate) fn insert_node_raw(&mut self, ref_name: &str, key: NodeKey, node: Node) {
        self.nodes
            .entry(ref_name.to_string())
            .or_default()
            .insert(key, node);
    }

    /// Insert a link during snapshot replay, bypassing events.
    pub(crate) fn insert_link_raw(&mut self, ref_name: &str, link: Link) {
        self.links
            .entry(ref_name.to_string())
            .or_default()
            .insert(link.id.clone(), link);
    }

    fn remove_link(&mut self, ref_name: &str, link_id: &LinkId, changes: &mut ChangeBuffer) {
        let link = match self
            .links
            .get_mut(ref_name)
            .and_then(|t| t.shift_remove(link_id))
        {
            Some(link) => link,
            None => return,
        };
        tracing::debug!(target: "relata::graph", link = %link.id, "disconnect");
        for end in [&link.a, &link.b] {
            let key = NodeKey::new(&end.model, &end.field, &end.id);
            if let Some(node) = self.nodes.get_mut(ref_name).and_then(|t| t.get_mut(&key)) {
                if node.remove(link_id) {
                    changes.add(ChangeEvent::node(
                        ChangeKind::Modified,
                        &end.model,
                        node_event_id(&end.id, &end.field),
                    ));
                }
            }
        }
        changes.add(ChangeEvent::link(
            ChangeKind::Deleted,
            ref_name,
            link.id.as_str(),
            None,
        ));
    }
}
