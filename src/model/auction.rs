//! Auction: owns an ordered sequence of Lots and walks a three-state
//! lifecycle (Created -> Active -> Ended).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lot::Lot;
use crate::error::{Error, Result};
use crate::ids::{new_id, EntityId, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionState {
    Created,
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: Version,
    pub title: String,
    pub description: String,
    pub state: AuctionState,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    lots: Vec<Lot>,
}

const TITLE_LEN: std::ops::RangeInclusive<usize> = 3..=200;
const DESCRIPTION_MAX_LEN: usize = 2000;

impl Auction {
    pub fn new(title: String, description: String) -> Result<Self> {
        if !TITLE_LEN.contains(&title.len()) {
            return Err(Error::InvalidInput(format!(
                "title must be 3-200 chars, got {}",
                title.len()
            )));
        }
        if description.len() > DESCRIPTION_MAX_LEN {
            return Err(Error::InvalidInput(format!(
                "description must be at most {DESCRIPTION_MAX_LEN} chars, got {}",
                description.len()
            )));
        }

        Ok(Auction {
            id: new_id(),
            created_at: Utc::now(),
            updated_at: None,
            version: 1,
            title,
            description,
            state: AuctionState::Created,
            start_time: None,
            end_time: None,
            lots: Vec::new(),
        })
    }

    fn publish(&mut self) {
        self.updated_at = Some(Utc::now());
        self.version += 1;
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn can_accept_bids(&self) -> bool {
        self.state == AuctionState::Active
    }

    /// Legal only in `Created`. Appends and publishes.
    pub fn add_lot(&mut self, lot: Lot) -> Result<()> {
        if self.state != AuctionState::Created {
            return Err(Error::StateViolation(format!(
                "cannot add a lot to auction {} in state {:?}, lots may only be added while Created",
                self.id, self.state
            )));
        }
        self.lots.push(lot);
        self.publish();
        Ok(())
    }

    /// Created -> Active. Requires at least one lot. Sets `start_time = now`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != AuctionState::Created {
            return Err(Error::StateViolation(format!(
                "cannot start auction {} from state {:?}, only Created -> Active is legal",
                self.id, self.state
            )));
        }
        if self.lots.is_empty() {
            return Err(Error::StateViolation(format!(
                "cannot start auction {} with no lots",
                self.id
            )));
        }
        self.state = AuctionState::Active;
        self.start_time = Some(Utc::now());
        self.publish();
        Ok(())
    }

    /// Active -> Ended. Sets `end_time = now`.
    pub fn close(&mut self) -> Result<()> {
        if self.state != AuctionState::Active {
            return Err(Error::StateViolation(format!(
                "cannot close auction {} from state {:?}, only Active -> Ended is legal",
                self.id, self.state
            )));
        }
        self.state = AuctionState::Ended;
        self.end_time = Some(Utc::now());
        self.publish();
        Ok(())
    }
}
