//! The error taxonomy exposed by the command API.
//!
//! Modeled after the reference codebase's small hand-rolled `enum Error`
//! types (e.g. `circuit::schedule::Error`), but derived with `thiserror`
//! because callers need to match on structured fields (`VersionConflict`'s
//! expected/actual versions), not just read a display string.

use std::fmt;
use uuid::Uuid;

use crate::ids::Version;

/// What kind of entity a `NotFound` or state violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Auction,
    Lot,
    Vehicle,
    Bid,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Auction => "auction",
            EntityKind::Lot => "lot",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Bid => "bid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("duplicate id: {kind} {id} already exists")]
    DuplicateId { kind: EntityKind, id: Uuid },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("illegal state transition: {0}")]
    StateViolation(String),

    #[error("version conflict on {kind} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        kind: EntityKind,
        id: Uuid,
        expected: Version,
        actual: Version,
    },

    #[error("operation did not complete after {attempts} attempts, last error: {last}")]
    Unrecoverable { attempts: u32, last: Box<Error> },
}

impl Error {
    pub(crate) fn is_version_conflict(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
