//! Error taxonomy for the store.
//!
//! Four categories, matching the lifecycle of a call:
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Malformed schema at construction | `Schema` |
//! | Bad input to a single create/load | `Validation` |
//! | Unknown model or record id | `NotFound` |
//! | Invalid reference shape | `Reference` |
//!
//! Schema errors are fatal: they are raised before any record exists and
//! are never recovered. Validation errors abort the single call that
//! raised them; the store guarantees no partial record remains visible.
//! Disconnecting a pair that was never connected and `link` commands
//! naming unknown ids are *not* errors; both are silent no-ops, applied
//! uniformly across all entrypoints (tolerant-link semantics).

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for all store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed schema: dangling target model, a relation group without
    /// exactly two fields, mismatched relation kinds.
    #[error("schema error: {0}")]
    Schema(String),

    /// Invalid input to a single call: missing required field, duplicate
    /// record id, snapshot loaded into a non-empty store.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown model name or record id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid reference shape in a relational operand.
    #[error("reference error: {0}")]
    Reference(String),
}

impl StoreError {
    /// Construct a `Schema` error.
    pub fn schema(msg: impl Into<String>) -> Self {
        StoreError::Schema(msg.into())
    }

    /// Construct a `Validation` error.
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    /// Construct a `NotFound` error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        StoreError::NotFound(msg.into())
    }

    /// Construct a `Reference` error.
    pub fn reference(msg: impl Into<String>) -> Self {
        StoreError::Reference(msg.into())
    }
}
