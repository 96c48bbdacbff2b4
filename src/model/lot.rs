//! Lot: a single vehicle offered within an auction, carrying all bids
//! placed on it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bid::Bid;
use super::vehicle::Vehicle;
use crate::error::{Error, Result};
use crate::ids::{new_id, EntityId, Sequence, Version};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: Version,
    pub auction_id: EntityId,
    pub vehicle: Vehicle,
    pub starting_bid: Decimal,
    pub reserve_price: Option<Decimal>,
    bids: Vec<Bid>,
    /// Monotonic counter used only when a caller drives this `Lot` directly,
    /// without going through [`crate::service::AuctionService`] and its
    /// external [`crate::sequence::SequenceSource`].
    local_sequence: Sequence,
}

impl Lot {
    pub fn new(
        auction_id: EntityId,
        vehicle: Vehicle,
        starting_bid: Decimal,
        reserve_price: Option<Decimal>,
    ) -> Result<Self> {
        if auction_id.is_nil() {
            return Err(Error::InvalidInput("auction id must not be nil".into()));
        }
        if starting_bid <= Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "starting bid must be strictly positive, got {starting_bid}"
            )));
        }
        if let Some(reserve) = reserve_price {
            if reserve <= Decimal::ZERO {
                return Err(Error::InvalidInput(format!(
                    "reserve price must be strictly positive, got {reserve}"
                )));
            }
        }

        Ok(Lot {
            id: new_id(),
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
            auction_id,
            vehicle,
            starting_bid,
            reserve_price,
            bids: Vec::new(),
            local_sequence: 0,
        })
    }

    fn publish(&mut self) {
        self.updated_at = Some(Utc::now());
        self.version += 1;
    }

    /// Appends a bid unconditionally (AP ingestion): `amount > 0` and
    /// `sequence > 0` are the only preconditions. There is no
    /// amount-vs-current-high check here — that's a CP read-time concern,
    /// see [`Lot::get_valid_bids`].
    pub fn place_bid(&mut self, bidder_id: String, amount: Decimal, sequence: Sequence) -> Result<&Bid> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "bid amount must be strictly positive, got {amount}"
            )));
        }
        if sequence <= 0 {
            return Err(Error::InvalidInput(format!(
                "sequence must be strictly positive, got {sequence}"
            )));
        }

        let bid = Bid::new(self.id, bidder_id, amount, sequence);
        self.bids.push(bid);
        self.publish();
        Ok(self.bids.last().expect("just pushed"))
    }

    /// Convenience for driving a `Lot` without an external sequence source:
    /// issues the next value from the lot's own local counter.
    pub fn place_bid_with_local_sequence(&mut self, bidder_id: String, amount: Decimal) -> Result<&Bid> {
        self.local_sequence += 1;
        let sequence = self.local_sequence;
        self.place_bid(bidder_id, amount, sequence)
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    /// The single source of truth for "valid bids": project the bid list
    /// into ascending `Sequence` order, sweep with a running `currentHigh`
    /// seeded at `starting_bid`, and keep only bids that strictly exceed
    /// the running high at the time they're considered.
    pub fn get_valid_bids(&self) -> Vec<Bid> {
        let mut ordered: Vec<&Bid> = self.bids.iter().collect();
        ordered.sort_by_key(|b| b.sequence);

        let mut current_high = self.starting_bid;
        let mut valid = Vec::new();
        for bid in ordered {
            if bid.amount > current_high {
                current_high = bid.amount;
                valid.push(bid.clone());
            }
        }
        valid
    }

    pub fn get_highest_bid_amount(&self) -> Decimal {
        self.get_valid_bids()
            .last()
            .map(|b| b.amount)
            .unwrap_or(self.starting_bid)
    }

    pub fn get_highest_bid(&self) -> Option<Bid> {
        self.get_valid_bids().into_iter().last()
    }

    /// The winning bidder, if the highest valid bid clears the reserve
    /// price (when one is set). Reserve price is never applied at
    /// ingestion, only here.
    pub fn get_winning_bidder_id(&self) -> Option<String> {
        let highest = self.get_highest_bid()?;
        match self.reserve_price {
            Some(reserve) if highest.amount < reserve => None,
            _ => Some(highest.bidder_id),
        }
    }

    /// Advisory only — not enforced on append. `amount > GetHighestBidAmount()`.
    pub fn would_bid_be_valid(&self, amount: Decimal) -> bool {
        amount > self.get_highest_bid_amount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vehicle::{CreateVehicleRequest, ExtraAttributes, VehicleKind};

    fn test_lot(starting_bid: i64, reserve: Option<i64>) -> Lot {
        let vehicle = crate::model::Vehicle::new(CreateVehicleRequest {
            kind: VehicleKind::Sedan,
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2020,
            vin: "2HGFC2F59KH500001".into(),
            mileage: Decimal::new(10_000, 0),
            color: "White".into(),
            extra: ExtraAttributes::default(),
        })
        .unwrap();
        Lot::new(
            EntityId::new_v4(),
            vehicle,
            Decimal::new(starting_bid, 0),
            reserve.map(|r| Decimal::new(r, 0)),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_non_positive_starting_bid_and_reserve() {
        let vehicle = crate::model::Vehicle::new(CreateVehicleRequest {
            kind: VehicleKind::Sedan,
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2020,
            vin: "2HGFC2F59KH500001".into(),
            mileage: Decimal::new(10_000, 0),
            color: "White".into(),
            extra: ExtraAttributes::default(),
        })
        .unwrap();
        assert!(Lot::new(EntityId::new_v4(), vehicle.clone(), Decimal::ZERO, None).is_err());
        assert!(Lot::new(EntityId::new_v4(), vehicle.clone(), Decimal::new(-1, 0), None).is_err());
        assert!(Lot::new(EntityId::new_v4(), vehicle, Decimal::new(1_000, 0), Some(Decimal::ZERO)).is_err());
    }

    #[test]
    fn place_bid_rejects_non_positive_amount_or_sequence() {
        let mut lot = test_lot(1_000, None);
        assert!(lot.place_bid("b1".into(), Decimal::ZERO, 1).is_err());
        assert!(lot.place_bid("b1".into(), Decimal::new(-5, 0), 1).is_err());
        assert!(lot.place_bid("b1".into(), Decimal::new(100, 0), 0).is_err());
        assert_eq!(lot.bids().len(), 0);
    }

    #[test]
    fn place_bid_appends_unconditionally_even_when_not_the_new_high() {
        let mut lot = test_lot(1_000, None);
        lot.place_bid("b1".into(), Decimal::new(5_000, 0), 1).unwrap();
        // A lower amount is still accepted at ingestion (AP), just excluded
        // from the valid-bid projection.
        lot.place_bid("b2".into(), Decimal::new(2_000, 0), 2).unwrap();
        assert_eq!(lot.bids().len(), 2);
        assert_eq!(lot.get_highest_bid_amount(), Decimal::new(5_000, 0));
    }

    #[test]
    fn no_bids_means_highest_is_starting_bid_and_no_highest_bid() {
        let lot = test_lot(1_000, None);
        assert_eq!(lot.get_highest_bid_amount(), Decimal::new(1_000, 0));
        assert!(lot.get_highest_bid().is_none());
        assert!(lot.get_winning_bidder_id().is_none());
    }

    #[test]
    fn winner_is_none_without_bids_meeting_reserve() {
        let mut lot = test_lot(1_000, Some(10_000));
        lot.place_bid("b1".into(), Decimal::new(3_000, 0), 1).unwrap();
        assert!(lot.get_winning_bidder_id().is_none());

        lot.place_bid("b2".into(), Decimal::new(15_000, 0), 2).unwrap();
        assert_eq!(lot.get_winning_bidder_id(), Some("b2".to_string()));
    }

    #[test]
    fn would_bid_be_valid_is_advisory_only() {
        let mut lot = test_lot(1_000, None);
        assert!(lot.would_bid_be_valid(Decimal::new(1_001, 0)));
        assert!(!lot.would_bid_be_valid(Decimal::new(1_000, 0)));

        lot.place_bid("b1".into(), Decimal::new(2_000, 0), 1).unwrap();
        assert!(!lot.would_bid_be_valid(Decimal::new(1_500, 0)));
        assert!(lot.would_bid_be_valid(Decimal::new(2_001, 0)));
    }

    #[test]
    fn local_sequence_counter_is_monotonic_and_independent_of_place_bid() {
        let mut lot = test_lot(1_000, None);
        lot.place_bid_with_local_sequence("b1".into(), Decimal::new(2_000, 0)).unwrap();
        lot.place_bid_with_local_sequence("b2".into(), Decimal::new(3_000, 0)).unwrap();
        let sequences: Vec<_> = lot.bids().iter().map(|b| b.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }
}
