//! Auction record and status state machine
//!
//! Status transitions are forward-only: scheduled → active → ending →
//! ended, with `ending` optional. `ended` is terminal; once an auction
//! is finalized its status never changes again.

use crate::ids::{AuctionId, ProductId, UserId};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Auction lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// Created but bidding has not opened yet
    Scheduled,
    /// Open for bids
    Active,
    /// Advisory final phase; still open for bids
    Ending,
    /// Finalized (terminal)
    Ended,
}

impl AuctionStatus {
    /// Whether a transition to `next` moves forward in the lifecycle.
    ///
    /// `ending` is optional: active may jump straight to ended.
    pub fn can_transition_to(self, next: AuctionStatus) -> bool {
        use AuctionStatus::*;
        matches!(
            (self, next),
            (Scheduled, Active) | (Active, Ending) | (Active, Ended) | (Ending, Ended)
        )
    }

    /// Statuses the finalizer sweeps for.
    pub fn is_open_for_finalize(self) -> bool {
        matches!(self, AuctionStatus::Active | AuctionStatus::Ending)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AuctionStatus::Ended)
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuctionStatus::Scheduled => "scheduled",
            AuctionStatus::Active => "active",
            AuctionStatus::Ending => "ending",
            AuctionStatus::Ended => "ended",
        };
        write!(f, "{}", label)
    }
}

/// A time-boxed sale where bids raise the price until `bid_end_time_ms`.
///
/// `current_bid` is monotonically non-decreasing over the auction's
/// lifetime; the bid-acceptance path enforces that upstream and the
/// store's bid write never lowers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub title: String,
    /// The catalog product being auctioned.
    pub product_id: ProductId,
    pub status: AuctionStatus,
    /// Highest accepted bid so far; zero when no bids.
    pub current_bid: Money,
    /// Bidder holding the current bid, if any.
    pub highest_bidder: Option<UserId>,
    /// Bidding deadline (Unix milliseconds).
    pub bid_end_time_ms: i64,
    pub seller_id: UserId,
    /// Every user that has placed at least one bid.
    pub participants: BTreeSet<UserId>,
}

impl Auction {
    /// Whether the auction is past its deadline and still open.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.status.is_open_for_finalize() && self.bid_end_time_ms <= now_ms
    }

    /// Server-side countdown, clamped at zero.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.bid_end_time_ms - now_ms).max(0)
    }
}
