//! Document Store contract
//!
//! The persistent record store is an external collaborator; this
//! module defines the read/write operations the engine needs from it,
//! plus an in-memory implementation for local runs and tests.
//!
//! All writes to a single auction record are expressed as atomic
//! single-record operations (conditional status update, bid write that
//! maintains the winning flag) rather than multi-step read-modify-write,
//! so concurrent bids and overlapping finalize attempts cannot lose
//! updates.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use types::auction::{Auction, AuctionStatus};
use types::bid::{AutoBidDirective, Bid};
use types::ids::{AuctionId, UserId};
use types::money::Money;
use types::order::Order;

use crate::error_log::ErrorRecord;

/// Errors surfaced by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("auction not found: {0}")]
    AuctionNotFound(AuctionId),
}

/// Read/write contract against the document store.
///
/// Query semantics:
/// - `overdue_auctions` returns auctions with status ∈ {active, ending}
///   and `bid_end_time_ms <= now_ms`, capped at `limit`.
/// - `update_status_if` is an atomic conditional update; `Ok(false)`
///   means the stored status no longer matched `expected` and nothing
///   was written.
/// - `record_bid` appends the bid, clears the previous winning flag,
///   marks the new bid winning, and raises the auction's current bid,
///   highest bidder and participant set. It never lowers the current
///   bid: a stale amount is recorded as a non-winning bid.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn auction(&self, id: &AuctionId) -> Result<Option<Auction>, StoreError>;

    async fn overdue_auctions(
        &self,
        now_ms: i64,
        limit: usize,
    ) -> Result<Vec<Auction>, StoreError>;

    async fn update_status_if(
        &self,
        id: &AuctionId,
        expected: AuctionStatus,
        new: AuctionStatus,
    ) -> Result<bool, StoreError>;

    async fn record_bid(&self, bid: Bid) -> Result<Bid, StoreError>;

    /// Most recent bids first.
    async fn recent_bids(&self, auction_id: &AuctionId, limit: usize)
        -> Result<Vec<Bid>, StoreError>;

    /// All bids, highest amount first; equal amounts newest first.
    async fn bids_by_amount_desc(&self, auction_id: &AuctionId) -> Result<Vec<Bid>, StoreError>;

    async fn bid_count(&self, auction_id: &AuctionId) -> Result<u64, StoreError>;

    /// Active directives with `max_bid > floor`.
    async fn active_directives_above(
        &self,
        auction_id: &AuctionId,
        floor: Money,
    ) -> Result<Vec<AutoBidDirective>, StoreError>;

    async fn insert_order(&self, order: Order) -> Result<(), StoreError>;

    async fn order_for_auction(&self, auction_id: &AuctionId) -> Result<Option<Order>, StoreError>;

    /// Fire-and-forget bid-metric counter; callers ignore failures
    /// beyond a debug log.
    async fn increment_user_bid_count(&self, user_id: &UserId) -> Result<(), StoreError>;

    /// Append a captured failure to the error-log collection.
    async fn append_error(&self, record: ErrorRecord) -> Result<(), StoreError>;
}

#[derive(Default)]
struct InMemoryInner {
    auctions: BTreeMap<AuctionId, Auction>,
    bids: Vec<Bid>,
    directives: Vec<AutoBidDirective>,
    orders: Vec<Order>,
    errors: Vec<ErrorRecord>,
    bid_counts: BTreeMap<UserId, u64>,
}

/// In-memory document store for local runs and tests.
///
/// `fail_reads` makes every read return `StoreError::Unavailable`, to
/// exercise degraded-snapshot and sweep-failure paths.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<InMemoryInner>,
    fail_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle read-failure injection.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Seed an auction record.
    pub fn put_auction(&self, auction: Auction) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.auctions.insert(auction.id, auction);
    }

    /// Seed a standing directive.
    pub fn put_directive(&self, directive: AutoBidDirective) {
        let mut inner = self.inner.lock().expect("store lock");
        inner.directives.push(directive);
    }

    /// All orders written so far (test inspection).
    pub fn orders(&self) -> Vec<Order> {
        self.inner.lock().expect("store lock").orders.clone()
    }

    /// All error-log records written so far (test inspection).
    pub fn error_records(&self) -> Vec<ErrorRecord> {
        self.inner.lock().expect("store lock").errors.clone()
    }

    /// Bid-metric counter for a user (test inspection).
    pub fn user_bid_count(&self, user_id: &UserId) -> u64 {
        self.inner
            .lock()
            .expect("store lock")
            .bid_counts
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected read failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn auction(&self, id: &AuctionId) -> Result<Option<Auction>, StoreError> {
        self.check_reads()?;
        Ok(self.inner.lock().expect("store lock").auctions.get(id).cloned())
    }

    async fn overdue_auctions(
        &self,
        now_ms: i64,
        limit: usize,
    ) -> Result<Vec<Auction>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .auctions
            .values()
            .filter(|a| a.is_overdue(now_ms))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_status_if(
        &self,
        id: &AuctionId,
        expected: AuctionStatus,
        new: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        let auction = inner
            .auctions
            .get_mut(id)
            .ok_or(StoreError::AuctionNotFound(*id))?;
        if auction.status != expected {
            return Ok(false);
        }
        auction.status = new;
        Ok(true)
    }

    async fn record_bid(&self, mut bid: Bid) -> Result<Bid, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        let auction = inner
            .auctions
            .get_mut(&bid.auction_id)
            .ok_or(StoreError::AuctionNotFound(bid.auction_id))?;

        if bid.amount > auction.current_bid {
            auction.current_bid = bid.amount;
            auction.highest_bidder = Some(bid.user_id);
            auction.participants.insert(bid.user_id);
            bid.is_winning = true;
            let auction_id = bid.auction_id;
            for prior in inner.bids.iter_mut().filter(|b| b.auction_id == auction_id) {
                prior.is_winning = false;
            }
        } else {
            // Stale amount: recorded, but never lowers the current bid
            debug!(auction_id = %bid.auction_id, amount = %bid.amount, "recording non-winning bid");
            auction.participants.insert(bid.user_id);
            bid.is_winning = false;
        }

        inner.bids.push(bid.clone());
        Ok(bid)
    }

    async fn recent_bids(
        &self,
        auction_id: &AuctionId,
        limit: usize,
    ) -> Result<Vec<Bid>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().expect("store lock");
        let mut bids: Vec<Bid> = inner
            .bids
            .iter()
            .filter(|b| b.auction_id == *auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms).then(b.id.cmp(&a.id)));
        bids.truncate(limit);
        Ok(bids)
    }

    async fn bids_by_amount_desc(&self, auction_id: &AuctionId) -> Result<Vec<Bid>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().expect("store lock");
        let mut bids: Vec<Bid> = inner
            .bids
            .iter()
            .filter(|b| b.auction_id == *auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount).then(b.timestamp_ms.cmp(&a.timestamp_ms)));
        Ok(bids)
    }

    async fn bid_count(&self, auction_id: &AuctionId) -> Result<u64, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .bids
            .iter()
            .filter(|b| b.auction_id == *auction_id)
            .count() as u64)
    }

    async fn active_directives_above(
        &self,
        auction_id: &AuctionId,
        floor: Money,
    ) -> Result<Vec<AutoBidDirective>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .directives
            .iter()
            .filter(|d| d.auction_id == *auction_id && d.active && d.max_bid > floor)
            .cloned()
            .collect())
    }

    async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        self.inner.lock().expect("store lock").orders.push(order);
        Ok(())
    }

    async fn order_for_auction(&self, auction_id: &AuctionId) -> Result<Option<Order>, StoreError> {
        self.check_reads()?;
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .orders
            .iter()
            .find(|o| o.auction_id == *auction_id)
            .cloned())
    }

    async fn increment_user_bid_count(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        *inner.bid_counts.entry(*user_id).or_insert(0) += 1;
        Ok(())
    }

    async fn append_error(&self, record: ErrorRecord) -> Result<(), StoreError> {
        self.inner.lock().expect("store lock").errors.push(record);
        Ok(())
    }
}
