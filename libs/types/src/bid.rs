//! Bid and auto-bid directive records
//!
//! At most one bid per auction carries `is_winning = true` at any
//! time, and it is always the highest-amount, most-recently-accepted
//! bid. The document store maintains that flag on write.

use crate::ids::{AuctionId, BidId, UserId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// How a bid entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidOrigin {
    /// Placed directly by a user.
    User,
    /// Synthetic proxy bid produced by the auto-bid cascade.
    AutoBid,
}

/// A timestamped monetary offer by a user on an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub user_id: UserId,
    pub amount: Money,
    pub timestamp_ms: i64,
    pub is_winning: bool,
    pub origin: BidOrigin,
}

impl Bid {
    /// A user-placed bid; the winning flag is assigned by the store.
    pub fn user(auction_id: AuctionId, user_id: UserId, amount: Money, now_ms: i64) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            user_id,
            amount,
            timestamp_ms: now_ms,
            is_winning: false,
            origin: BidOrigin::User,
        }
    }

    /// A synthetic proxy bid emitted on behalf of an auto-bid directive.
    pub fn proxy(auction_id: AuctionId, user_id: UserId, amount: Money, now_ms: i64) -> Self {
        Self {
            origin: BidOrigin::AutoBid,
            ..Self::user(auction_id, user_id, amount, now_ms)
        }
    }
}

/// A standing instruction to bid automatically on a user's behalf up
/// to `max_bid`.
///
/// A directive stays active until its owner deactivates it or its
/// headroom is consumed; eligibility at any moment is
/// `active && max_bid > current_bid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoBidDirective {
    pub auction_id: AuctionId,
    pub user_id: UserId,
    pub max_bid: Money,
    pub active: bool,
    pub created_at_ms: i64,
}

impl AutoBidDirective {
    /// Whether this directive is eligible to produce a proxy bid at
    /// the given current price.
    pub fn can_fire(&self, current_bid: Money) -> bool {
        self.active && self.max_bid > current_bid
    }
}
