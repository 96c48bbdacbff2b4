//! The event sink contract: the core emits one event per successful commit
//! and hands it to an external collaborator. Delivery, persistence and
//! broadcast fan-out are explicitly out of scope (see spec §1) — this
//! module only defines the shape of what crosses that boundary and a
//! trait callers implement to receive it.

use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ids::{EntityId, Sequence};

/// One payload variant per event type, carrying the minimum fields a
/// downstream consumer needs without re-querying the store.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    AuctionCreated { title: String },
    AuctionStarted { lot_count: usize },
    AuctionEnded,
    BidPlaced {
        lot_id: EntityId,
        bidder_id: String,
        amount: Decimal,
        sequence: Sequence,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::AuctionCreated { .. } => "AuctionCreated",
            EventPayload::AuctionStarted { .. } => "AuctionStarted",
            EventPayload::AuctionEnded => "AuctionEnded",
            EventPayload::BidPlaced { .. } => "BidPlaced",
        }
    }
}

/// Partition key is always `auction_id`, so a consumer fanning events out
/// by partition preserves per-auction order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_id: Uuid,
    pub auction_id: EntityId,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    pub(crate) fn new(auction_id: EntityId, payload: EventPayload) -> Self {
        Event {
            event_id: Uuid::new_v4(),
            auction_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Emitted after commit, outside the per-entity lock. A sink implementation
/// is expected to be cheap or itself asynchronous (hand off to a queue);
/// event-emission failures never invalidate a committed transaction — the
/// store is the source of truth (spec §4.5, §7).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Discards every event. Used where a caller doesn't wire a real sink
/// (tests, the `wiring` example before a broadcast layer is attached).
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, event: Event) {
        log::debug!(
            "discarding event {} ({}) for auction {}",
            event.event_id,
            event.payload.event_type(),
            event.auction_id
        );
    }
}

/// Collects every emitted event in order, guarded by a mutex. Useful in
/// tests that assert on emission order/count without standing up a real
/// broadcast collaborator.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: parking_lot::Mutex<Vec<Event>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Buffers emitted events in a lock-free queue for an external consumer
/// (the push-notification/broadcast layer, out of this crate's scope) to
/// drain at its own pace via [`QueuedEventSink::poll`]. `emit` never
/// blocks, matching the spec's "event-emission failures do not invalidate
/// a committed transaction" — there's nothing here that can fail.
#[derive(Default)]
pub struct QueuedEventSink {
    queue: SegQueue<Event>,
}

impl QueuedEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops the oldest buffered event, if any.
    pub fn poll(&self) -> Option<Event> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventSink for QueuedEventSink {
    fn emit(&self, event: Event) {
        self.queue.push(event);
    }
}

#[cfg(test)]
mod queue_tests {
    use super::*;

    #[test]
    fn polls_in_fifo_order() {
        let sink = QueuedEventSink::new();
        let auction_id = EntityId::new_v4();
        sink.emit(Event::new(auction_id, EventPayload::AuctionEnded));
        sink.emit(Event::new(auction_id, EventPayload::AuctionCreated { title: "x".into() }));

        assert_eq!(sink.len(), 2);
        assert!(matches!(sink.poll().unwrap().payload, EventPayload::AuctionEnded));
        assert!(matches!(sink.poll().unwrap().payload, EventPayload::AuctionCreated { .. }));
        assert!(sink.is_empty());
        assert!(sink.poll().is_none());
    }
}
