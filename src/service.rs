//! C5: the serialization + retry orchestrator. This is the application-
//! level command surface (§4.5/§6): per-entity mutual exclusion, retry on
//! version conflict with exponential backoff, and the `PlaceBid` algorithm
//! that ties C1-C4 together.

use std::sync::Arc;
use std::thread;

use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::error::{EntityKind, Error, Result};
use crate::events::{Event, EventPayload, EventSink, NullEventSink};
use crate::ids::EntityId;
use crate::locks::EntityLocks;
use crate::model::{Auction, Bid, CreateVehicleRequest, Lot, Vehicle, VehicleKind};
use crate::sequence::{InProcessSequenceSource, SequenceSource};
use crate::txn::Stores;

const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01
const MAX_AMOUNT_MANTISSA: i64 = 1_000_000_000;
const BIDDER_ID_LEN: std::ops::RangeInclusive<usize> = 1..=100;

fn validate_amount(label: &str, amount: Decimal) -> Result<()> {
    let max = Decimal::from(MAX_AMOUNT_MANTISSA);
    if amount < MIN_AMOUNT || amount > max {
        return Err(Error::InvalidInput(format!(
            "{label} must be in 0.01-1,000,000,000, got {amount}"
        )));
    }
    Ok(())
}

fn validate_bidder_id(bidder_id: &str) -> Result<()> {
    if !BIDDER_ID_LEN.contains(&bidder_id.len()) {
        return Err(Error::InvalidInput(format!(
            "bidder id must be 1-100 chars, got {}",
            bidder_id.len()
        )));
    }
    Ok(())
}

/// Result of a `place_bid` call. Per §7's propagation policy, `place_bid`
/// returns this even on failure (amount rejected, auction closed, retries
/// exhausted) rather than raising — the one exception being the lot itself
/// not existing, which surfaces as `Error::NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceBidOutcome {
    pub success: bool,
    pub message: String,
    pub bid_id: Option<EntityId>,
    pub current_highest: Option<Decimal>,
    pub is_currently_highest: Option<bool>,
}

impl PlaceBidOutcome {
    fn failure(message: impl Into<String>) -> Self {
        PlaceBidOutcome {
            success: false,
            message: message.into(),
            bid_id: None,
            current_highest: None,
            is_currently_highest: None,
        }
    }
}

/// Optional filter for `search_vehicles`. Every field is a wildcard when
/// `None`; `make`/`model` match case-insensitively as a substring.
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub kind: Option<VehicleKind>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub mileage_min: Option<Decimal>,
    pub mileage_max: Option<Decimal>,
}

impl VehicleFilter {
    fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(kind) = self.kind {
            if vehicle.kind != kind {
                return false;
            }
        }
        if let Some(make) = &self.make {
            if !vehicle.make.to_lowercase().contains(&make.to_lowercase()) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if !vehicle.model.to_lowercase().contains(&model.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.year_min {
            if vehicle.year < min {
                return false;
            }
        }
        if let Some(max) = self.year_max {
            if vehicle.year > max {
                return false;
            }
        }
        if let Some(min) = self.mileage_min {
            if vehicle.mileage < min {
                return false;
            }
        }
        if let Some(max) = self.mileage_max {
            if vehicle.mileage > max {
                return false;
            }
        }
        true
    }
}

/// Process-wide orchestrator state: the stores, the per-entity lock
/// tables, the sequence source and the event sink all live here with an
/// init-at-start lifecycle; there are no other mutable singletons (spec
/// §9, "Global orchestrator state").
pub struct AuctionService {
    stores: Stores,
    auction_locks: EntityLocks,
    lot_locks: EntityLocks,
    sequence: Arc<dyn SequenceSource>,
    event_sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl Default for AuctionService {
    fn default() -> Self {
        Self::new()
    }
}

impl AuctionService {
    pub fn new() -> Self {
        AuctionService::with_collaborators(
            Arc::new(InProcessSequenceSource::new()),
            Arc::new(NullEventSink),
            EngineConfig::default(),
        )
    }

    pub fn with_collaborators(
        sequence: Arc<dyn SequenceSource>,
        event_sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        AuctionService {
            stores: Stores::new(),
            auction_locks: EntityLocks::new(),
            lot_locks: EntityLocks::new(),
            sequence,
            event_sink,
            config,
        }
    }

    /// Runs `attempt` in a loop of at most `config.max_attempts`,
    /// retrying only on `VersionConflict` with exponential backoff
    /// (`base_delay * 2^(attempt-1)`). Any other error, or the attempt
    /// succeeding, returns immediately. Exhausting all attempts yields
    /// `Error::Unrecoverable`.
    fn retry<T>(&self, mut attempt: impl FnMut(u32) -> Result<T>) -> Result<T> {
        let mut last_err = None;
        for n in 1..=self.config.max_attempts {
            match attempt(n) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_version_conflict() => {
                    log::warn!("version conflict on attempt {n}/{}: {e}", self.config.max_attempts);
                    last_err = Some(e);
                    if n < self.config.max_attempts {
                        thread::sleep(self.config.backoff_for_attempt(n));
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::Unrecoverable {
            attempts: self.config.max_attempts,
            last: Box::new(last_err.expect("loop ran at least once")),
        })
    }

    // ---- Vehicle -------------------------------------------------------

    pub fn create_vehicle(&self, req: CreateVehicleRequest) -> Result<Vehicle> {
        let vehicle = Vehicle::new(req)?;
        let scope = self.stores.begin();
        scope.vehicles().add(vehicle.clone());
        scope.commit()?;
        Ok(vehicle)
    }

    pub fn get_vehicle(&self, id: EntityId) -> Result<Vehicle> {
        self.stores
            .vehicles
            .get(id)
            .ok_or(Error::NotFound { kind: EntityKind::Vehicle, id })
    }

    pub fn search_vehicles(&self, filter: &VehicleFilter) -> Vec<Vehicle> {
        self.stores
            .vehicles
            .get_all()
            .into_iter()
            .filter(|v| filter.matches(v))
            .collect()
    }

    // ---- Auction ---------------------------------------------------

    pub fn create_auction(&self, title: String, description: String) -> Result<Auction> {
        let auction = Auction::new(title.clone(), description)?;
        let scope = self.stores.begin();
        scope.auctions().add(auction.clone());
        scope.commit()?;
        log::info!("created auction {} ({title})", auction.id);
        self.event_sink.emit(Event::new(
            auction.id,
            EventPayload::AuctionCreated { title },
        ));
        Ok(auction)
    }

    pub fn get_auction(&self, id: EntityId) -> Result<Auction> {
        self.stores
            .auctions
            .get(id)
            .ok_or(Error::NotFound { kind: EntityKind::Auction, id })
    }

    /// Insertion order, approximated via `created_at` (the store is a plain
    /// map and does not otherwise remember insertion order).
    pub fn list_auctions(&self) -> Vec<Auction> {
        let mut all = self.stores.auctions.get_all();
        all.sort_by_key(|a| a.created_at);
        all
    }

    pub fn start_auction(&self, auction_id: EntityId) -> Result<()> {
        let permit = self.auction_locks.acquire(auction_id);
        let lot_count = self.retry(|_| {
            let scope = self.stores.begin();
            let mut auction = scope
                .auctions()
                .get(auction_id)
                .ok_or(Error::NotFound { kind: EntityKind::Auction, id: auction_id })?;
            auction.start()?;
            let lot_count = auction.lots().len();
            scope.auctions().update(auction);
            scope.commit()?;
            Ok(lot_count)
        })?;
        drop(permit);
        log::info!("started auction {auction_id} with {lot_count} lot(s)");
        self.event_sink
            .emit(Event::new(auction_id, EventPayload::AuctionStarted { lot_count }));
        Ok(())
    }

    pub fn close_auction(&self, auction_id: EntityId) -> Result<()> {
        let permit = self.auction_locks.acquire(auction_id);
        self.retry(|_| {
            let scope = self.stores.begin();
            let mut auction = scope
                .auctions()
                .get(auction_id)
                .ok_or(Error::NotFound { kind: EntityKind::Auction, id: auction_id })?;
            auction.close()?;
            scope.auctions().update(auction);
            scope.commit()
        })?;
        drop(permit);
        log::info!("closed auction {auction_id}");
        self.event_sink.emit(Event::new(auction_id, EventPayload::AuctionEnded));
        Ok(())
    }

    // ---- Lot ---------------------------------------------------------

    pub fn create_lot(
        &self,
        auction_id: EntityId,
        vehicle_id: EntityId,
        starting_bid: Decimal,
        reserve_price: Option<Decimal>,
    ) -> Result<Lot> {
        validate_amount("starting bid", starting_bid)?;
        if let Some(reserve) = reserve_price {
            validate_amount("reserve price", reserve)?;
        }

        let permit = self.auction_locks.acquire(auction_id);
        let lot = self.retry(|_| {
            let scope = self.stores.begin();
            let vehicle = scope
                .vehicles()
                .get(vehicle_id)
                .ok_or(Error::NotFound { kind: EntityKind::Vehicle, id: vehicle_id })?;
            let mut auction = scope
                .auctions()
                .get(auction_id)
                .ok_or(Error::NotFound { kind: EntityKind::Auction, id: auction_id })?;
            let lot = Lot::new(auction_id, vehicle, starting_bid, reserve_price)?;
            auction.add_lot(lot.clone())?;
            scope.auctions().update(auction);
            scope.lots().add(lot.clone());
            scope.commit()?;
            Ok(lot)
        })?;
        drop(permit);
        log::info!("created lot {} on auction {auction_id}", lot.id);
        Ok(lot)
    }

    pub fn get_lot(&self, id: EntityId) -> Result<Lot> {
        self.stores.lots.get(id).ok_or(Error::NotFound { kind: EntityKind::Lot, id })
    }

    pub fn get_lots_for_auction(&self, auction_id: EntityId) -> Vec<Lot> {
        self.stores.lots.get_by_auction_id(auction_id)
    }

    // ---- Bidding -------------------------------------------------------

    pub fn get_highest_bid(&self, lot_id: EntityId) -> Result<Option<Bid>> {
        Ok(self.get_lot(lot_id)?.get_highest_bid())
    }

    pub fn get_winner(&self, lot_id: EntityId) -> Result<Option<String>> {
        Ok(self.get_lot(lot_id)?.get_winning_bidder_id())
    }

    /// Implements the ten-step `PlaceBid` algorithm of spec §4.5.
    pub fn place_bid(&self, lot_id: EntityId, bidder_id: String, amount: Decimal) -> Result<PlaceBidOutcome> {
        if let Err(e) = validate_bidder_id(&bidder_id) {
            return Ok(PlaceBidOutcome::failure(e.to_string()));
        }
        if let Err(e) = validate_amount("bid amount", amount) {
            return Ok(PlaceBidOutcome::failure(e.to_string()));
        }

        // Step 1: fast-path pre-check, outside the lock. A missing lot is
        // the one PlaceBid failure that surfaces as a raised error rather
        // than a structured failure result (§7).
        let pre_lot = self
            .stores
            .lots
            .get(lot_id)
            .ok_or(Error::NotFound { kind: EntityKind::Lot, id: lot_id })?;
        if let Some(outcome) = self.reject_unless_active(pre_lot.auction_id) {
            return Ok(outcome);
        }

        // Step 2: acquire the per-lot lock and enter the retry loop.
        let permit = self.lot_locks.acquire(lot_id);

        let mut rejected: Option<PlaceBidOutcome> = None;
        let commit_result = self.retry(|_| {
            let scope = self.stores.begin();
            // Step 3: reload lot and auction inside the fresh scope.
            let lot = match scope.lots().get(lot_id) {
                Some(l) => l,
                None => {
                    rejected = Some(PlaceBidOutcome::failure("lot no longer exists"));
                    return Ok(None);
                }
            };
            match scope.auctions().get(lot.auction_id) {
                Some(a) if a.can_accept_bids() => {}
                Some(a) => {
                    rejected = Some(PlaceBidOutcome::failure(format!(
                        "auction {} is not accepting bids (state {:?})",
                        a.id, a.state
                    )));
                    return Ok(None);
                }
                None => {
                    rejected = Some(PlaceBidOutcome::failure("owning auction no longer exists"));
                    return Ok(None);
                }
            }

            // Step 4: advisory pre-append check.
            let is_currently_highest = lot.would_bid_be_valid(amount);
            // Step 5: sequence.
            let seq = self.sequence.next(lot_id);
            // Step 6: append, publishing a new version.
            let mut lot = lot;
            let bid_id = lot.place_bid(bidder_id.clone(), amount, seq)?.id;
            let current_highest = lot.get_highest_bid_amount();

            // Step 7: record the update and commit.
            scope.lots().update(lot);
            scope.commit()?;

            Ok(Some((bid_id, current_highest, is_currently_highest, seq)))
        });

        drop(permit);

        if let Some(outcome) = rejected {
            return Ok(outcome);
        }

        let (bid_id, current_highest, is_currently_highest, seq) = match commit_result {
            Ok(Some(v)) => v,
            Ok(None) => unreachable!("rejected is set whenever the closure returns Ok(None)"),
            Err(e) => return Ok(PlaceBidOutcome::failure(e.to_string())),
        };

        // Step 9: emit BidPlaced outside the lock (already released above).
        self.event_sink.emit(Event::new(
            pre_lot.auction_id,
            EventPayload::BidPlaced { lot_id, bidder_id: bidder_id.clone(), amount, sequence: seq },
        ));
        log::debug!(
            "bid {bid_id} accepted on lot {lot_id}: amount={amount} current_highest={current_highest} is_currently_highest={is_currently_highest}"
        );

        // Step 10: AP ingestion — success regardless of is_currently_highest.
        Ok(PlaceBidOutcome {
            success: true,
            message: "bid accepted".into(),
            bid_id: Some(bid_id),
            current_highest: Some(current_highest),
            is_currently_highest: Some(is_currently_highest),
        })
    }

    fn reject_unless_active(&self, auction_id: EntityId) -> Option<PlaceBidOutcome> {
        match self.stores.auctions.get(auction_id) {
            Some(a) if a.can_accept_bids() => None,
            Some(a) => Some(PlaceBidOutcome::failure(format!(
                "auction {} is not accepting bids (state {:?})",
                a.id, a.state
            ))),
            None => Some(PlaceBidOutcome::failure("owning auction no longer exists")),
        }
    }
}
