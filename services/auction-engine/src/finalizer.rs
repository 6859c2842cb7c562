//! Auction Finalizer
//!
//! Invoked by a periodic trigger; stateless between invocations. Each
//! sweep selects a bounded batch of overdue auctions and settles them
//! as independent tasks: commits the status transition with an atomic
//! conditional update, determines winner and losers, creates the
//! settlement order and dispatches notifications.
//!
//! The conditional status update is the correctness mechanism for
//! overlapping invocations: the losing invocation sees the rejection
//! and skips the auction. The transition itself is the durable commit
//! point — downstream settlement is best-effort and failures are
//! captured per auction without rolling it back.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use types::auction::{Auction, AuctionStatus};
use types::clock::now_ms;
use types::ids::UserId;
use types::order::Order;

use crate::config::EngineConfig;
use crate::error_log::{ErrorKind, ErrorRecord};
use crate::hub::AuctionHub;
use crate::notify::{NotificationContext, NotificationKind, Notifier, NotifyError};
use crate::store::{DocumentStore, StoreError};

/// Failures inside one auction's settlement.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Outcome of one auction's settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettleOutcome {
    /// This invocation committed the transition. Downstream settlement
    /// failures are captured separately and do not revoke the commit.
    Finalized,
    /// The conditional update was rejected; another invocation won.
    AlreadyFinalized,
    /// The conditional update itself errored; nothing was written.
    CommitFailed,
}

/// Summary returned to the scheduled trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub success: bool,
    pub processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepSummary {
    fn completed(processed: usize) -> Self {
        Self {
            success: true,
            processed,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            processed: 0,
            error: Some(error),
        }
    }
}

/// The overdue-auction sweeper.
pub struct Finalizer {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    hub: Arc<AuctionHub>,
    config: EngineConfig,
}

impl Finalizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        hub: Arc<AuctionHub>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            hub,
            config,
        }
    }

    /// Run one sweep at the given trigger time.
    ///
    /// If the overdue query itself fails, nothing is mutated and the
    /// summary reports failure. Otherwise every selected auction is
    /// settled independently; `processed` counts the auctions whose
    /// status transition this invocation committed. The commit is what
    /// counts: a settlement that errors after it still shows up in
    /// `processed`, with the failure captured in the error sink.
    pub async fn sweep(&self, now: i64) -> SweepSummary {
        let overdue = match self
            .store
            .overdue_auctions(now, self.config.finalize_batch_size)
            .await
        {
            Ok(overdue) => overdue,
            Err(e) => {
                error!(error = %e, "overdue-auction query failed; sweep aborted");
                self.record_failure(ErrorKind::Sweep, None, &e.to_string()).await;
                return SweepSummary::failed(e.to_string());
            }
        };

        if overdue.is_empty() {
            return SweepSummary::completed(0);
        }
        info!(count = overdue.len(), "sweeping overdue auctions");

        let outcomes =
            futures::future::join_all(overdue.into_iter().map(|auction| self.settle_guarded(auction, now)))
                .await;

        let processed = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SettleOutcome::Finalized))
            .count();
        SweepSummary::completed(processed)
    }

    /// Settle one auction, capturing any failure so sibling auctions
    /// are unaffected.
    async fn settle_guarded(&self, auction: Auction, now: i64) -> SettleOutcome {
        let auction_id = auction.id;
        // The atomic conditional update guards overlapping sweeps:
        // whoever commits the transition owns settlement.
        let committed = match self
            .store
            .update_status_if(&auction_id, auction.status, AuctionStatus::Ended)
            .await
        {
            Ok(committed) => committed,
            Err(e) => {
                error!(auction_id = %auction_id, error = %e, "status commit failed");
                self.record_failure(ErrorKind::Finalize, Some(auction_id), &e.to_string())
                    .await;
                return SettleOutcome::CommitFailed;
            }
        };
        if !committed {
            debug!(auction_id = %auction_id, "already finalized by another invocation, skipping");
            return SettleOutcome::AlreadyFinalized;
        }
        info!(auction_id = %auction_id, final_bid = %auction.current_bid, "auction ended");

        // The transition is durable at this point; a downstream failure
        // is captured without revoking the commit, so the auction still
        // counts as processed.
        if let Err(e) = self.settle_committed(&auction, now).await {
            error!(auction_id = %auction_id, error = %e, "settlement failed after commit");
            self.record_failure(ErrorKind::Finalize, Some(auction_id), &e.to_string())
                .await;
        }
        SettleOutcome::Finalized
    }

    async fn settle_committed(&self, auction: &Auction, now: i64) -> Result<(), FinalizeError> {
        self.hub.publish_status_change(
            auction.id,
            AuctionStatus::Ended,
            serde_json::json!({
                "final_bid": auction.current_bid,
                "winner": auction.highest_bidder,
            }),
        );

        let bids = self.store.bids_by_amount_desc(&auction.id).await?;
        let winner = bids.first().map(|bid| bid.user_id);

        if let Some(winner) = winner.filter(|_| !auction.current_bid.is_zero()) {
            self.notifier
                .notify(
                    winner,
                    NotificationKind::AuctionWinner,
                    NotificationContext::for_auction(auction.id)
                        .with_title(auction.title.clone())
                        .with_amount(auction.current_bid),
                )
                .await?;

            // Idempotency guard: one settlement order per auction,
            // even if a finalize path runs twice.
            if self.store.order_for_auction(&auction.id).await?.is_none() {
                let order = Order::settlement(winner, auction, self.config.tax_rate, now);
                self.store.insert_order(order).await?;
            } else {
                debug!(auction_id = %auction.id, "settlement order already exists, skipping");
            }

            self.notifier
                .notify(
                    auction.seller_id,
                    NotificationKind::AuctionEndedSeller,
                    NotificationContext::for_auction(auction.id)
                        .with_title(auction.title.clone())
                        .with_amount(auction.current_bid)
                        .with_winner(winner),
                )
                .await?;
        }

        let losers: BTreeSet<UserId> = bids
            .iter()
            .map(|bid| bid.user_id)
            .filter(|user| Some(*user) != winner)
            .collect();
        for loser in losers {
            self.notifier
                .notify(
                    loser,
                    NotificationKind::AuctionEndedLoser,
                    NotificationContext::for_auction(auction.id).with_title(auction.title.clone()),
                )
                .await?;
        }

        Ok(())
    }

    async fn record_failure(
        &self,
        kind: ErrorKind,
        auction_id: Option<types::ids::AuctionId>,
        err: &str,
    ) {
        let record = ErrorRecord::new(kind, auction_id, err, now_ms());
        if let Err(e) = self.store.append_error(record).await {
            tracing::warn!(error = %e, "error sink append failed");
        }
    }
}
