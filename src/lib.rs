//! Concurrent bidding and auction-lifecycle core for a multi-tenant
//! car-auction backend.
//!
//! This crate is the hard part of a larger system: the entity model, the
//! versioned in-memory stores, the per-lot sequence generator, the
//! unit-of-work transaction boundary, and the per-entity serialization +
//! retry orchestrator that ties them together into a command API
//! ([`AuctionService`]). The thin HTTP layer, request validation
//! attributes, API-key auth, rate limiting, push notifications and the
//! event-stream broadcast implementation are deliberately out of scope —
//! see [`EventSink`] and [`SequenceSource`] for the two contracts this
//! crate consumes from an outer layer.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod locks;
pub mod model;
pub mod sequence;
pub mod service;
pub mod store;
pub mod txn;

pub use config::EngineConfig;
pub use error::{EntityKind, Error, Result};
pub use events::{Event, EventPayload, EventSink, NullEventSink, RecordingEventSink};
pub use ids::{EntityId, Sequence, Version};
pub use model::{
    Auction, AuctionState, Bid, CreateVehicleRequest, ExtraAttributes, Lot, Vehicle,
    VehicleDetails, VehicleKind,
};
pub use sequence::{InProcessSequenceSource, SequenceSource};
pub use service::{AuctionService, PlaceBidOutcome, VehicleFilter};
pub use txn::{Stores, UnitOfWork};
