//! C1: the entity model — Auction, Lot, Bid, Vehicle — with their
//! invariants, state machine, and versioning contract.

mod auction;
mod bid;
mod lot;
mod vehicle;

pub use auction::{Auction, AuctionState};
pub use bid::Bid;
pub use lot::Lot;
pub use vehicle::{CreateVehicleRequest, ExtraAttributes, Vehicle, VehicleDetails, VehicleKind};

use crate::ids::{EntityId, Version};

/// Every entity kind carries an id and a version the store can compare.
/// `auction_id()` is `Some` only for entities scoped to an auction (Lot);
/// it backs `VersionedStore::get_by_auction_id`.
pub trait Versioned {
    fn id(&self) -> EntityId;
    fn version(&self) -> Version;
    fn auction_id(&self) -> Option<EntityId> {
        None
    }
}

impl Versioned for Auction {
    fn id(&self) -> EntityId {
        self.id
    }
    fn version(&self) -> Version {
        self.version
    }
}

impl Versioned for Lot {
    fn id(&self) -> EntityId {
        self.id
    }
    fn version(&self) -> Version {
        self.version
    }
    fn auction_id(&self) -> Option<EntityId> {
        Some(self.auction_id)
    }
}

impl Versioned for Vehicle {
    fn id(&self) -> EntityId {
        self.id
    }
    fn version(&self) -> Version {
        self.version
    }
}
