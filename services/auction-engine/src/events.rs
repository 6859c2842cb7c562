//! Real-time channel protocol
//!
//! Wire messages exchanged with watchers over the WebSocket channel.
//! Hub→client events are externally tagged with `event`, client→hub
//! messages with `action`, both kebab-case.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use types::auction::{Auction, AuctionStatus};
use types::bid::{Bid, BidOrigin};
use types::ids::{AuctionId, UserId};
use types::money::Money;

/// Public summary of an auction, as pushed in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub id: AuctionId,
    pub title: String,
    pub status: AuctionStatus,
    pub current_bid: Money,
    pub highest_bidder: Option<UserId>,
    pub bid_end_time_ms: i64,
}

impl From<&Auction> for AuctionSummary {
    fn from(auction: &Auction) -> Self {
        Self {
            id: auction.id,
            title: auction.title.clone(),
            status: auction.status,
            current_bid: auction.current_bid,
            highest_bidder: auction.highest_bidder,
            bid_end_time_ms: auction.bid_end_time_ms,
        }
    }
}

/// Public summary of a bid, as pushed in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidSummary {
    pub user_id: UserId,
    pub amount: Money,
    pub timestamp_ms: i64,
    pub is_winning: bool,
    pub origin: BidOrigin,
}

impl From<&Bid> for BidSummary {
    fn from(bid: &Bid) -> Self {
        Self {
            user_id: bid.user_id,
            amount: bid.amount,
            timestamp_ms: bid.timestamp_ms,
            is_winning: bid.is_winning,
            origin: bid.origin,
        }
    }
}

/// Hub→client events.
///
/// Broadcasts are at-most-once and fire-and-forget; there is no
/// delivery confirmation and no request/response error channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum WatcherEvent {
    /// Snapshot pushed on join. Pieces that failed to load are simply
    /// absent; a degraded snapshot is still sent.
    AuctionState {
        auction: Option<AuctionSummary>,
        recent_bids: Vec<BidSummary>,
        watcher_count: usize,
    },
    /// A user-placed bid was accepted.
    NewBid {
        auction_id: AuctionId,
        user_id: UserId,
        amount: Money,
        current_bid: Money,
        bid_count: Option<u64>,
        timestamp_ms: i64,
        is_winning: bool,
    },
    /// A proxy bid was placed by the cascade.
    AutoBidPlaced {
        auction_id: AuctionId,
        user_id: UserId,
        amount: Money,
        current_bid: Money,
        bid_count: Option<u64>,
        timestamp_ms: i64,
        is_winning: bool,
    },
    /// Private to the directive's owner: their proxy bid fired.
    AutobidExecuted {
        auction_id: AuctionId,
        amount: Money,
        remaining_headroom: Money,
    },
    AuctionStatusChanged {
        auction_id: AuctionId,
        status: AuctionStatus,
        extra: Value,
    },
    /// Server-synchronized countdown; clients derive drift-free local
    /// countdowns from `server_time_ms`, never their own clock.
    CountdownSync {
        auction_id: AuctionId,
        remaining_ms: i64,
        server_time_ms: i64,
        bid_end_time_ms: i64,
    },
    /// Advisory, driven by the external scheduler.
    EndingSoon {
        auction_id: AuctionId,
        minutes_remaining: u32,
    },
}

/// Client→hub messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinAuction { auction_id: AuctionId },
    LeaveAuction { auction_id: AuctionId },
    SyncCountdown { auction_id: AuctionId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags_are_kebab_case() {
        let event = WatcherEvent::NewBid {
            auction_id: AuctionId::new(),
            user_id: UserId::new(),
            amount: Money::from_u64(500),
            current_bid: Money::from_u64(500),
            bid_count: Some(3),
            timestamp_ms: 1_700_000_000_000,
            is_winning: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "new-bid");

        let event = WatcherEvent::AutobidExecuted {
            auction_id: AuctionId::new(),
            amount: Money::from_u64(500),
            remaining_headroom: Money::from_u64(100),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "autobid-executed");

        let event = WatcherEvent::CountdownSync {
            auction_id: AuctionId::new(),
            remaining_ms: 60_000,
            server_time_ms: 1_700_000_000_000,
            bid_end_time_ms: 1_700_000_060_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "countdown-sync");
    }

    #[test]
    fn test_client_message_parsing() {
        let id = AuctionId::new();
        let json = format!(r#"{{"action":"join-auction","auction_id":"{}"}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, ClientMessage::JoinAuction { auction_id: id });

        let json = format!(r#"{{"action":"sync-countdown","auction_id":"{}"}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, ClientMessage::SyncCountdown { auction_id: id });

        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"unknown"}"#).is_err());
    }

    #[test]
    fn test_snapshot_serialization() {
        let event = WatcherEvent::AuctionState {
            auction: None,
            recent_bids: vec![],
            watcher_count: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "auction-state");
        assert_eq!(json["watcher_count"], 1);
        assert!(json["auction"].is_null());
    }
}
