//! C4: the unit-of-work transaction scope. Collects pending adds/updates
//! against up to three stores and either commits them in recorded order or
//! is discarded.
//!
//! Reads and list operations pass through to the backing stores
//! immediately (read-committed); only `add`/`update` are deferred. See the
//! spec's atomicity caveat: because commit replays pending changes
//! one-by-one against independent stores, a failure partway through can
//! leave a partial commit — callers (C5) mitigate this by discarding the
//! whole scope and retrying the operation from scratch.

use std::cell::RefCell;

use crate::error::Result;
use crate::ids::EntityId;
use crate::model::{Auction, Lot, Vehicle};
use crate::store::VersionedStore;

enum PendingChange {
    AddAuction(Auction),
    UpdateAuction(Auction),
    AddLot(Lot),
    UpdateLot(Lot),
    AddVehicle(Vehicle),
}

/// The three versioned stores a scope can touch. Owned by the service (C5)
/// for the lifetime of the process; scopes only ever borrow it.
pub struct Stores {
    pub(crate) auctions: VersionedStore<Auction>,
    pub(crate) lots: VersionedStore<Lot>,
    pub(crate) vehicles: VersionedStore<Vehicle>,
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

impl Stores {
    pub fn new() -> Self {
        Stores {
            auctions: VersionedStore::new(crate::error::EntityKind::Auction),
            lots: VersionedStore::new(crate::error::EntityKind::Lot),
            vehicles: VersionedStore::new(crate::error::EntityKind::Vehicle),
        }
    }

    pub fn begin(&self) -> UnitOfWork<'_> {
        UnitOfWork {
            stores: self,
            pending: RefCell::new(Vec::new()),
        }
    }
}

/// One logical transaction over `Stores`. Single-caller only — not `Sync`,
/// matching the spec's "a scope is owned by a single caller; no concurrent
/// use."
pub struct UnitOfWork<'s> {
    stores: &'s Stores,
    pending: RefCell<Vec<PendingChange>>,
}

impl<'s> UnitOfWork<'s> {
    pub fn auctions(&self) -> AuctionRepo<'_, 's> {
        AuctionRepo { scope: self }
    }

    pub fn lots(&self) -> LotRepo<'_, 's> {
        LotRepo { scope: self }
    }

    pub fn vehicles(&self) -> VehicleRepo<'_, 's> {
        VehicleRepo { scope: self }
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Applies pending changes in recorded order. Returns the count
    /// applied. On any version-conflict or duplicate-id the error
    /// propagates immediately — the scope must then be discarded, per the
    /// spec's atomicity caveat.
    pub fn commit(self) -> Result<usize> {
        let pending = self.pending.into_inner();
        let mut applied = 0;
        for change in pending {
            match change {
                PendingChange::AddAuction(e) => self.stores.auctions.add(e)?,
                PendingChange::UpdateAuction(e) => self.stores.auctions.update(e)?,
                PendingChange::AddLot(e) => self.stores.lots.add(e)?,
                PendingChange::UpdateLot(e) => self.stores.lots.update(e)?,
                PendingChange::AddVehicle(e) => self.stores.vehicles.add(e)?,
            }
            applied += 1;
        }
        Ok(applied)
    }

    /// Discards pending changes. Equivalent to simply dropping the scope —
    /// provided for callers that want to make the discard explicit at the
    /// call site.
    pub fn rollback(self) {}
}

pub struct AuctionRepo<'a, 's> {
    scope: &'a UnitOfWork<'s>,
}

impl AuctionRepo<'_, '_> {
    pub fn get(&self, id: EntityId) -> Option<Auction> {
        self.scope.stores.auctions.get(id)
    }

    pub fn get_all(&self) -> Vec<Auction> {
        self.scope.stores.auctions.get_all()
    }

    pub fn add(&self, auction: Auction) {
        self.scope.pending.borrow_mut().push(PendingChange::AddAuction(auction));
    }

    pub fn update(&self, auction: Auction) {
        self.scope.pending.borrow_mut().push(PendingChange::UpdateAuction(auction));
    }
}

pub struct LotRepo<'a, 's> {
    scope: &'a UnitOfWork<'s>,
}

impl LotRepo<'_, '_> {
    pub fn get(&self, id: EntityId) -> Option<Lot> {
        self.scope.stores.lots.get(id)
    }

    pub fn get_all(&self) -> Vec<Lot> {
        self.scope.stores.lots.get_all()
    }

    pub fn get_by_auction_id(&self, auction_id: EntityId) -> Vec<Lot> {
        self.scope.stores.lots.get_by_auction_id(auction_id)
    }

    pub fn add(&self, lot: Lot) {
        self.scope.pending.borrow_mut().push(PendingChange::AddLot(lot));
    }

    pub fn update(&self, lot: Lot) {
        self.scope.pending.borrow_mut().push(PendingChange::UpdateLot(lot));
    }
}

pub struct VehicleRepo<'a, 's> {
    scope: &'a UnitOfWork<'s>,
}

impl VehicleRepo<'_, '_> {
    pub fn get(&self, id: EntityId) -> Option<Vehicle> {
        self.scope.stores.vehicles.get(id)
    }

    pub fn get_all(&self) -> Vec<Vehicle> {
        self.scope.stores.vehicles.get_all()
    }

    /// Vehicles are insert-only; no `update`.
    pub fn add(&self, vehicle: Vehicle) {
        self.scope.pending.borrow_mut().push(PendingChange::AddVehicle(vehicle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn rollback_leaves_store_untouched() {
        let stores = Stores::new();
        let scope = stores.begin();
        let auction = Auction::new("Spring sale".into(), "desc".into()).unwrap();
        scope.auctions().add(auction.clone());
        assert!(scope.has_pending_changes());
        scope.rollback();

        assert!(stores.auctions.get(auction.id).is_none());
        assert!(stores.auctions.get_all().is_empty());
    }

    #[test]
    fn dropping_without_commit_discards_pending() {
        let stores = Stores::new();
        {
            let scope = stores.begin();
            scope.auctions().add(Auction::new("a".repeat(10), String::new()).unwrap());
        }
        assert!(stores.auctions.get_all().is_empty());
    }

    #[test]
    fn commit_applies_in_order_and_clears_pending() {
        let stores = Stores::new();
        let scope = stores.begin();
        let auction = Auction::new("Spring sale".into(), String::new()).unwrap();
        scope.auctions().add(auction.clone());
        let applied = scope.commit().unwrap();
        assert_eq!(applied, 1);
        assert_eq!(stores.auctions.get(auction.id).unwrap().version, 1);
    }

    #[test]
    fn commit_propagates_version_conflict_and_scope_is_spent() {
        let stores = Stores::new();
        let mut auction = Auction::new("Spring sale".into(), String::new()).unwrap();
        stores.auctions.add(auction.clone()).unwrap();

        // Simulate a racer bumping the stored version first.
        let mut racer = auction.clone();
        racer.version += 1;
        stores.auctions.update(racer).unwrap();

        // Our stale copy still thinks it's racing from version 1.
        auction.version += 1;
        let scope = stores.begin();
        scope.auctions().update(auction);
        let err = scope.commit().unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[test]
    fn vehicles_have_no_update_repo_method() {
        let stores = Stores::new();
        let scope = stores.begin();
        let vehicle = Vehicle::new(crate::model::CreateVehicleRequest {
            kind: crate::model::VehicleKind::Sedan,
            make: "BMW".into(),
            model: "i4".into(),
            year: 2023,
            vin: "1HGCM82633A004352".into(),
            mileage: Decimal::new(28000, 0),
            color: "Grey".into(),
            extra: Default::default(),
        })
        .unwrap();
        scope.vehicles().add(vehicle.clone());
        scope.commit().unwrap();
        assert_eq!(stores.vehicles.get(vehicle.id).unwrap().id, vehicle.id);
    }
}
