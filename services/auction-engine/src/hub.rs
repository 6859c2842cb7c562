//! Real-Time Hub
//!
//! Manages per-auction watcher rooms, broadcasts bid and status
//! events, answers countdown-sync requests against the server clock,
//! and triggers the auto-bid cascade for user-originated bids.
//!
//! The hub holds no durable state: room membership is transient and
//! every read comes from the document store. Store failures during
//! snapshot or broadcast assembly degrade the payload — partial data
//! is sent, total silence is not.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use types::auction::AuctionStatus;
use types::bid::{Bid, BidOrigin};
use types::clock::now_ms;
use types::ids::{AuctionId, SubscriberId, UserId};

use crate::cascade::plan_proxy_bid;
use crate::config::EngineConfig;
use crate::error_log::{ErrorKind, ErrorRecord};
use crate::events::{AuctionSummary, BidSummary, WatcherEvent};
use crate::notify::{NotificationContext, NotificationKind, Notifier};
use crate::rooms::{RoomRegistry, WatcherSender};
use crate::store::{DocumentStore, StoreError};

/// Failures inside one cascade evaluation. Always caught by
/// `publish_bid`; never suppresses the triggering broadcast.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("auction not found: {0}")]
    MissingAuction(AuctionId),
}

/// The real-time broadcast hub.
pub struct AuctionHub {
    rooms: RoomRegistry,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl AuctionHub {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            store,
            notifier,
            config,
        }
    }

    /// Add a watcher to the auction's room and push a snapshot.
    ///
    /// The snapshot carries the auction summary, the most recent bids
    /// (newest first) and the room size including this watcher. A
    /// store failure degrades the snapshot; join itself always
    /// succeeds so future broadcasts reach the watcher.
    pub async fn join(
        &self,
        auction_id: AuctionId,
        subscriber: SubscriberId,
        user_id: UserId,
        sender: WatcherSender,
    ) {
        let watcher_count = self.rooms.join(auction_id, subscriber, user_id, sender);
        debug!(auction_id = %auction_id, subscriber = %subscriber, watcher_count, "watcher joined");

        let auction = match self.store.auction(&auction_id).await {
            Ok(found) => found.as_ref().map(AuctionSummary::from),
            Err(e) => {
                self.record_failure(ErrorKind::Snapshot, Some(auction_id), &e.to_string())
                    .await;
                None
            }
        };
        let recent_bids = match self
            .store
            .recent_bids(&auction_id, self.config.snapshot_recent_bids)
            .await
        {
            Ok(bids) => bids.iter().map(BidSummary::from).collect(),
            Err(e) => {
                self.record_failure(ErrorKind::Snapshot, Some(auction_id), &e.to_string())
                    .await;
                Vec::new()
            }
        };

        self.rooms.send_to_subscriber(
            &auction_id,
            &subscriber,
            WatcherEvent::AuctionState {
                auction,
                recent_bids,
                watcher_count,
            },
        );
    }

    /// Remove a watcher from the auction's room.
    pub fn leave(&self, auction_id: &AuctionId, subscriber: &SubscriberId) {
        self.rooms.leave(auction_id, subscriber);
        debug!(auction_id = %auction_id, subscriber = %subscriber, "watcher left");
    }

    /// Current room size.
    pub fn watcher_count(&self, auction_id: &AuctionId) -> usize {
        self.rooms.watcher_count(auction_id)
    }

    /// Broadcast an accepted bid to the room, then run the cascade.
    ///
    /// User-originated bids trigger one cascade evaluation in the same
    /// call; proxy bids do not, which keeps the cascade at one proxy
    /// bid per externally-originated bid. A cascade failure is caught,
    /// logged and recorded — it never suppresses the broadcast that
    /// already went out.
    pub async fn publish_bid(&self, auction_id: AuctionId, bid: &Bid) {
        let (current_bid, bid_count) = match self.store.auction(&auction_id).await {
            Ok(Some(auction)) => {
                let count = match self.store.bid_count(&auction_id).await {
                    Ok(count) => Some(count),
                    Err(e) => {
                        self.record_failure(ErrorKind::Broadcast, Some(auction_id), &e.to_string())
                            .await;
                        None
                    }
                };
                (auction.current_bid, count)
            }
            Ok(None) => {
                // Absence is not a captured failure
                debug!(auction_id = %auction_id, "bid broadcast for unknown auction");
                (bid.amount, None)
            }
            Err(e) => {
                // Degrade to the bid's own values rather than staying silent
                self.record_failure(ErrorKind::Broadcast, Some(auction_id), &e.to_string())
                    .await;
                (bid.amount, None)
            }
        };

        let event = match bid.origin {
            BidOrigin::User => WatcherEvent::NewBid {
                auction_id,
                user_id: bid.user_id,
                amount: bid.amount,
                current_bid,
                bid_count,
                timestamp_ms: bid.timestamp_ms,
                is_winning: bid.is_winning,
            },
            BidOrigin::AutoBid => WatcherEvent::AutoBidPlaced {
                auction_id,
                user_id: bid.user_id,
                amount: bid.amount,
                current_bid,
                bid_count,
                timestamp_ms: bid.timestamp_ms,
                is_winning: bid.is_winning,
            },
        };
        self.rooms.broadcast(&auction_id, &event);

        if let Err(e) = self.store.increment_user_bid_count(&bid.user_id).await {
            debug!(user_id = %bid.user_id, error = %e, "bid-count metric skipped");
        }

        if bid.origin == BidOrigin::User {
            if let Err(e) = self.run_cascade(auction_id).await {
                self.record_failure(ErrorKind::Cascade, Some(auction_id), &e.to_string())
                    .await;
            }
        }
    }

    /// Evaluate the cascade once against the auction's current state.
    ///
    /// A planned proxy bid is persisted and re-enters `publish_bid`,
    /// and the directive's owner gets a private autobid-executed
    /// notification with their remaining headroom.
    async fn run_cascade(&self, auction_id: AuctionId) -> Result<(), CascadeError> {
        let auction = self
            .store
            .auction(&auction_id)
            .await?
            .ok_or(CascadeError::MissingAuction(auction_id))?;

        let directives = self
            .store
            .active_directives_above(&auction_id, auction.current_bid)
            .await?;

        let Some(plan) = plan_proxy_bid(
            auction.current_bid,
            auction.highest_bidder.as_ref(),
            &directives,
            self.config.min_increment,
        ) else {
            return Ok(());
        };

        let proxy = Bid::proxy(auction_id, plan.user_id, plan.amount, now_ms());
        let proxy = self.store.record_bid(proxy).await?;
        debug!(auction_id = %auction_id, user_id = %plan.user_id, amount = %plan.amount, "proxy bid placed");

        Box::pin(self.publish_bid(auction_id, &proxy)).await;

        self.rooms.send_to_user(
            &auction_id,
            &plan.user_id,
            &WatcherEvent::AutobidExecuted {
                auction_id,
                amount: plan.amount,
                remaining_headroom: plan.remaining_headroom,
            },
        );
        if let Err(e) = self
            .notifier
            .notify(
                plan.user_id,
                NotificationKind::AutobidExecuted,
                NotificationContext::for_auction(auction_id)
                    .with_amount(plan.amount)
                    .with_remaining_headroom(plan.remaining_headroom),
            )
            .await
        {
            self.record_failure(ErrorKind::Notify, Some(auction_id), &e.to_string())
                .await;
        }

        Ok(())
    }

    /// Broadcast an auction-status-changed event.
    pub fn publish_status_change(&self, auction_id: AuctionId, status: AuctionStatus, extra: Value) {
        self.rooms.broadcast(
            &auction_id,
            &WatcherEvent::AuctionStatusChanged {
                auction_id,
                status,
                extra,
            },
        );
    }

    /// Recompute the countdown server-side and broadcast it.
    ///
    /// Client clocks are never trusted; watchers derive drift-free
    /// countdowns from `server_time_ms`.
    pub async fn sync_countdown(&self, auction_id: AuctionId, now: i64) {
        match self.store.auction(&auction_id).await {
            Ok(Some(auction)) => {
                self.rooms.broadcast(
                    &auction_id,
                    &WatcherEvent::CountdownSync {
                        auction_id,
                        remaining_ms: auction.remaining_ms(now),
                        server_time_ms: now,
                        bid_end_time_ms: auction.bid_end_time_ms,
                    },
                );
            }
            Ok(None) => {
                debug!(auction_id = %auction_id, "countdown sync for unknown auction");
            }
            Err(e) => {
                self.record_failure(ErrorKind::Broadcast, Some(auction_id), &e.to_string())
                    .await;
            }
        }
    }

    /// Advisory ending-soon broadcast, driven by the external
    /// scheduler independently of the finalizer's cadence.
    pub fn broadcast_ending_soon(&self, auction_id: AuctionId, minutes_remaining: u32) {
        self.rooms.broadcast(
            &auction_id,
            &WatcherEvent::EndingSoon {
                auction_id,
                minutes_remaining,
            },
        );
    }

    async fn record_failure(&self, kind: ErrorKind, auction_id: Option<AuctionId>, error: &str) {
        warn!(kind = ?kind, auction_id = ?auction_id, error, "captured failure");
        let record = ErrorRecord::new(kind, auction_id, error, now_ms());
        if let Err(e) = self.store.append_error(record).await {
            warn!(error = %e, "error sink append failed");
        }
    }
}
