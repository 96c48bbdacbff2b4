//! Identifier and versioning primitives shared by every entity kind.
//!
//! Mirrors the reference codebase's habit of giving domain ids a plain
//! type alias (e.g. `pub type ProjectId = i64;` in `pipeline_server/src/db.rs`)
//! rather than a newtype wrapper — the alias documents intent at call sites
//! without adding conversion ceremony.

use uuid::Uuid;

/// 128-bit stable identifier, generated at construction.
pub type EntityId = Uuid;

/// Optimistic concurrency version. Starts at 1, increments by exactly one
/// per mutating operation that publishes state.
pub type Version = u32;

/// Strictly monotonic per-lot bid ordinal, issued by a [`crate::sequence::SequenceSource`].
pub type Sequence = i64;

pub(crate) fn new_id() -> EntityId {
    Uuid::new_v4()
}
