//! Identifier allocation.
//!
//! The store never reaches for a process-wide counter: an allocator is an
//! explicit object injected at construction and scoped to one store
//! instance. Two strategies are provided: sequential per-model counters
//! (the default, produces readable `model_1`-style ids) and random v4
//! UUIDs for callers that merge stores or need unguessable ids.

use std::collections::HashMap;

use crate::types::RecordId;

/// Produces unique per-model identifiers for records created without an
/// explicit id.
///
/// The uniqueness contract is cooperative: an allocator only tracks what
/// it produced itself, so the store re-asks on collision with
/// caller-supplied ids.
pub trait IdAllocator {
    /// Allocate the next id in `model`'s namespace.
    fn allocate(&mut self, model: &str) -> RecordId;
}

/// Sequential per-model counters: `order_1`, `order_2`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counters: HashMap<String, u64>,
}

impl SequentialIds {
    /// Create an allocator with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdAllocator for SequentialIds {
    fn allocate(&mut self, model: &str) -> RecordId {
        let counter = self.counters.entry(model.to_string()).or_insert(0);
        *counter += 1;
        RecordId::new(format!("{}_{}", model, counter))
    }
}

/// Random v4 UUID ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl UuidIds {
    /// Create a UUID allocator.
    pub fn new() -> Self {
        UuidIds
    }
}

impl IdAllocator for UuidIds {
    fn allocate(&mut self, _model: &str) -> RecordId {
        RecordId::new(uuid::Uuid::new_v4().to_string())
    }
}
