//! Notifier contract
//!
//! The notifier is an external collaborator: it accepts structured
//! notification requests and owns delivery/retry semantics as well as
//! the textual content. The engine only supplies recipient, kind and
//! context.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use types::ids::{AuctionId, UserId};
use types::money::Money;

/// Errors surfaced by a notifier backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// The notification vocabulary the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AuctionWinner,
    AuctionEndedSeller,
    AuctionEndedLoser,
    AutobidExecuted,
}

/// Structured context attached to a notification request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContext {
    pub auction_id: Option<AuctionId>,
    pub auction_title: Option<String>,
    pub amount: Option<Money>,
    pub winner: Option<UserId>,
    pub remaining_headroom: Option<Money>,
}

impl NotificationContext {
    pub fn for_auction(auction_id: AuctionId) -> Self {
        Self {
            auction_id: Some(auction_id),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.auction_title = Some(title.into());
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_winner(mut self, winner: UserId) -> Self {
        self.winner = Some(winner);
        self
    }

    pub fn with_remaining_headroom(mut self, headroom: Money) -> Self {
        self.remaining_headroom = Some(headroom);
        self
    }
}

/// Notification dispatch contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        context: NotificationContext,
    ) -> Result<(), NotifyError>;
}

/// Tracing-only notifier for local runs.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        context: NotificationContext,
    ) -> Result<(), NotifyError> {
        info!(recipient = %recipient, kind = ?kind, context = ?context, "notification dispatched");
        Ok(())
    }
}

/// Test double that records every request and can be made to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, NotificationKind, NotificationContext)>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(UserId, NotificationKind, NotificationContext)> {
        self.sent.lock().expect("notifier lock").clone()
    }

    pub fn count_for(&self, kind: NotificationKind) -> usize {
        self.sent
            .lock()
            .expect("notifier lock")
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    pub fn recipients_of(&self, kind: NotificationKind) -> Vec<UserId> {
        self.sent
            .lock()
            .expect("notifier lock")
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(recipient, _, _)| *recipient)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        context: NotificationContext,
    ) -> Result<(), NotifyError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("injected failure".to_string()));
        }
        self.sent
            .lock()
            .expect("notifier lock")
            .push((recipient, kind, context));
        Ok(())
    }
}
