//! The command vocabulary for mutating x2many fields.
//!
//! An x2many field's value in a create or update call is an ordered
//! sequence of commands, applied left-to-right. Composing `clear()`
//! followed by `link(...)` realizes whole-field replacement in a single
//! call.

use relata_core::RecordId;

use crate::values::Values;

/// A tagged operation on an x2many field.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connect each existing record to the owner. Ids that do not name a
    /// live record are silently filtered out (tolerant-link semantics).
    Link(Vec<RecordId>),
    /// Disconnect each given record from the owner, leaving the record
    /// itself intact. Unlinked pairs are a silent no-op.
    Unlink(Vec<RecordId>),
    /// Create each nested record, then connect it to the owner.
    Create(Vec<Values>),
    /// Disconnect everything currently linked to the owner, without
    /// deleting the node.
    Clear,
}

/// `link(ids...)`: connect existing records.
pub fn link<I, T>(ids: I) -> Command
where
    I: IntoIterator<Item = T>,
    T: Into<RecordId>,
{
    Command::Link(ids.into_iter().map(Into::into).collect())
}

/// `unlink(ids...)`: disconnect records.
pub fn unlink<I, T>(ids: I) -> Command
where
    I: IntoIterator<Item = T>,
    T: Into<RecordId>,
{
    Command::Unlink(ids.into_iter().map(Into::into).collect())
}

/// `create(valueObjects...)`: create nested records and connect them.
pub fn create<I>(values: I) -> Command
where
    I: IntoIterator<Item = Values>,
{
    Command::Create(values.into_iter().collect())
}

/// `clear()`: disconnect everything currently linked.
pub fn clear() -> Command {
    Command::Clear
}
