//! Relational graph engine.
//!
//! The engine keeps typed records linked by bidirectional relations and
//! guarantees referential integrity from both endpoints after every public
//! call. Relations are stored independently of the records they connect,
//! as a bipartite node/link structure:
//!
//! - one **node** per (record, relational field) pair, holding the link
//!   ids currently incident to that pair;
//! - one **link** per connected pair of records, keyed canonically so both
//!   participants compute the same id.
//!
//! Layers, bottom up:
//!
//! - [`schema`]: normalizes raw model definitions into a closed, fully
//!   bidirectional schema plus a relation registry.
//! - [`graph`]: the node/link store and the connect/disconnect algorithms
//!   that enforce single-valued vs multi-valued invariants.
//! - [`store`]: scalar record storage and the materialized read view.
//! - [`changes`]: the per-call change buffer flushed once per public call.
//! - [`commands`] / [`values`]: the input vocabulary for mutating
//!   relational fields.
//! - [`facade`]: the per-model CRUD surface that orchestrates the rest.
//! - [`snapshot`]: export/rehydrate of the full store state.

pub mod changes;
pub mod commands;
pub mod facade;
pub mod graph;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod values;

pub use changes::{ChangeEvent, ChangeKind, ChangeTarget};
pub use commands::Command;
pub use facade::{ModelHandle, ModelStore};
pub use schema::{FieldDef, FieldKind, ModelDefs, Schema};
pub use snapshot::Snapshot;
pub use store::{FieldValue, Record};
pub use values::Values;
