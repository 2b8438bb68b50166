//! relata: an embedded, in-memory relational object-graph store.
//!
//! Records belong to typed models; relational fields are kept
//! bidirectionally consistent by construction. A schema declares models
//! and fields, [`ModelStore`] processes it and serves per-model CRUD
//! handles, and every public call ends with a single coalesced change
//! notification.
//!
//! ```
//! use relata::{FieldDef, ModelDefs, ModelStore, Values};
//! use relata::commands::create;
//! use indexmap::IndexMap;
//!
//! let mut defs = ModelDefs::new();
//! let mut order = IndexMap::new();
//! order.insert("name".to_string(), FieldDef::scalar());
//! order.insert(
//!     "orderline_ids".to_string(),
//!     FieldDef::one2many("orderline", "order_orderline_rel"),
//! );
//! defs.insert("order".to_string(), order);
//! let mut orderline = IndexMap::new();
//! orderline.insert("quantity".to_string(), FieldDef::scalar());
//! orderline.insert(
//!     "order_id".to_string(),
//!     FieldDef::many2one("order", "order_orderline_rel"),
//! );
//! defs.insert("orderline".to_string(), orderline);
//!
//! let mut store = ModelStore::new(defs).unwrap();
//! let order = store
//!     .model("order")
//!     .unwrap()
//!     .create(
//!         Values::new()
//!             .set("name", "SO001")
//!             .many("orderline_ids", [create([Values::new().set("quantity", 2)])]),
//!     )
//!     .unwrap();
//! assert_eq!(order.many("orderline_ids").len(), 1);
//! ```

pub use relata_core::{
    IdAllocator, RecordId, RecordRef, SequentialIds, StoreError, StoreResult, UuidIds, Value,
};
pub use relata_engine::{
    ChangeEvent, ChangeKind, ChangeTarget, Command, FieldDef, FieldKind, FieldValue, ModelDefs,
    ModelHandle, ModelStore, Record, Schema, Snapshot, Values,
};

/// The x2many command vocabulary: `link`, `unlink`, `create`, `clear`.
pub mod commands {
    pub use relata_engine::commands::{clear, create, link, unlink, Command};
}

/// Schema types beyond the common re-exports.
pub mod schema {
    pub use relata_engine::schema::{Field, FieldSlot, Relation, Role};
}

/// Snapshot entry types.
pub mod snapshot {
    pub use relata_engine::snapshot::{LinkEntry, NodeEntry, RecordEntry, Snapshot};
}
