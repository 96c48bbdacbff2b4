//! Demonstrates wiring the command API end to end: create a vehicle and
//! an auction, add a lot, start the auction, place a few bids, close it,
//! and read back the winner. Mirrors the scenario in the spec's S1.

use std::sync::Arc;

use env_logger::Env;
use rust_decimal::Decimal;

use auction_engine::{AuctionService, CreateVehicleRequest, EngineConfig, ExtraAttributes, RecordingEventSink, VehicleKind};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let events = Arc::new(RecordingEventSink::new());
    let service = AuctionService::with_collaborators(
        Arc::new(auction_engine::InProcessSequenceSource::new()),
        events.clone(),
        EngineConfig::default(),
    );

    let vehicle = service.create_vehicle(CreateVehicleRequest {
        kind: VehicleKind::Sedan,
        make: "BMW".into(),
        model: "i4 M50".into(),
        year: 2023,
        vin: "WBA33AW01PFP12345".into(),
        mileage: Decimal::new(28_000, 0),
        color: "Grey".into(),
        extra: ExtraAttributes { doors: Some(4), sunroof: Some(true), ..Default::default() },
    })?;

    let auction = service.create_auction("Dec 2025".into(), "Year-end clearance".into())?;
    let lot = service.create_lot(auction.id, vehicle.id, Decimal::new(15_000, 0), Some(Decimal::new(18_000, 0)))?;
    service.start_auction(auction.id)?;

    for (bidder, amount) in [("b1", 16_000), ("b2", 17_000), ("b3", 19_000), ("b1", 18_000)] {
        let outcome = service.place_bid(lot.id, bidder.to_string(), Decimal::new(amount, 0))?;
        println!(
            "{bidder} bid {amount}: success={} current_highest={:?} is_currently_highest={:?}",
            outcome.success, outcome.current_highest, outcome.is_currently_highest
        );
    }

    service.close_auction(auction.id)?;
    let winner = service.get_winner(lot.id)?;
    println!("winner: {winner:?}");
    println!("events emitted: {}", events.events().len());

    Ok(())
}
