//! C2: the versioned store. One instance per entity kind {Auction, Lot,
//! Vehicle}, each maintaining the snapshot map and the committed-version
//! map described in the spec, guarded together by a single short
//! mutual-exclusion section around the compare-and-swap in `update`.
//!
//! The generic repository here replaces what would otherwise be a
//! dynamic/reflective repository pattern: three concrete instantiations
//! are all this crate needs.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{EntityKind, Error, Result};
use crate::ids::{EntityId, Version};
use crate::model::Versioned;

struct Inner<T> {
    entities: HashMap<EntityId, T>,
    stored_versions: HashMap<EntityId, Version>,
}

pub struct VersionedStore<T> {
    kind: EntityKind,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone + Versioned> VersionedStore<T> {
    pub fn new(kind: EntityKind) -> Self {
        VersionedStore {
            kind,
            inner: Mutex::new(Inner {
                entities: HashMap::new(),
                stored_versions: HashMap::new(),
            }),
        }
    }

    /// Inserts if absent; records `stored_versions[e.id] = e.version()`.
    pub fn add(&self, entity: T) -> Result<()> {
        let id = entity.id();
        let mut inner = self.inner.lock();
        if inner.entities.contains_key(&id) {
            return Err(Error::DuplicateId { kind: self.kind, id });
        }
        inner.stored_versions.insert(id, entity.version());
        inner.entities.insert(id, entity);
        Ok(())
    }

    pub fn get(&self, id: EntityId) -> Option<T> {
        self.inner.lock().entities.get(&id).cloned()
    }

    pub fn get_all(&self) -> Vec<T> {
        self.inner.lock().entities.values().cloned().collect()
    }

    pub fn get_by_auction_id(&self, auction_id: EntityId) -> Vec<T> {
        self.inner
            .lock()
            .entities
            .values()
            .filter(|e| e.auction_id() == Some(auction_id))
            .cloned()
            .collect()
    }

    /// Requires `stored_versions[e.id]` to exist and `e.version() ==
    /// stored_versions[e.id] + 1`; on match, replaces the snapshot and
    /// advances the stored version. Any mismatch is a version conflict.
    pub fn update(&self, entity: T) -> Result<()> {
        let id = entity.id();
        let mut inner = self.inner.lock();
        let expected = *inner
            .stored_versions
            .get(&id)
            .ok_or(Error::NotFound { kind: self.kind, id })?;

        if entity.version() != expected + 1 {
            return Err(Error::VersionConflict {
                kind: self.kind,
                id,
                expected: expected + 1,
                actual: entity.version(),
            });
        }

        inner.stored_versions.insert(id, entity.version());
        inner.entities.insert(id, entity);
        Ok(())
    }
}
