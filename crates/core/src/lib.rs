//! Core types for the relata store.
//!
//! This crate holds everything the engine and the public facade share:
//! record identity, the scalar value representation, the error taxonomy,
//! and identifier allocation. It has no dependency on any other workspace
//! member.

pub mod error;
pub mod ident;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use ident::{IdAllocator, SequentialIds, UuidIds};
pub use types::{RecordId, RecordRef, Value};
