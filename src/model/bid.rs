//! Bid: an immutable append to a Lot's bid list.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{new_id, EntityId, Sequence};

/// A single bid placed on a lot.
///
/// Unlike Auction/Lot/Vehicle, a bid carries no `Version`: it is never
/// mutated after it is appended, so there is nothing to optimistically
/// concurrency-check it against. Its place in history is its `sequence`,
/// not a version counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: EntityId,
    pub lot_id: EntityId,
    /// Opaque bidder identity, taken as-is from the caller (see the open
    /// question on `BidderId` origin — authentication is not this crate's
    /// concern).
    pub bidder_id: String,
    pub amount: Decimal,
    pub bid_time: DateTime<Utc>,
    pub sequence: Sequence,
}

impl Bid {
    pub(crate) fn new(lot_id: EntityId, bidder_id: String, amount: Decimal, sequence: Sequence) -> Self {
        Bid {
            id: new_id(),
            lot_id,
            bidder_id,
            amount,
            bid_time: Utc::now(),
            sequence,
        }
    }
}
