//! Auction Engine Service
//!
//! The auction bidding & lifecycle subsystem of the marketplace:
//! - Real-time broadcast hub with per-auction watcher rooms
//! - Auto-bid cascade engine producing proxy bids from standing directives
//! - Scheduled finalizer sweeping overdue auctions into settlement
//!
//! # Architecture
//!
//! ```text
//! Bid placement (external)
//!        │
//!    ┌───▼────────┐     ┌──────────────┐
//!    │ AuctionHub │────►│ Room watchers│
//!    └───┬────────┘     └──────────────┘
//!        │ user-originated bids only
//!    ┌───▼────────┐
//!    │  Cascade   │  ← one proxy bid per trigger,
//!    └───┬────────┘    re-enters the hub once
//!        │
//!  Document Store ◄── Finalizer ◄── periodic trigger
//!                       │
//!                       └─► Notifier + Order creation
//! ```

pub mod cascade;
pub mod config;
pub mod error;
pub mod error_log;
pub mod events;
pub mod finalizer;
pub mod hub;
pub mod notify;
pub mod rooms;
pub mod router;
pub mod store;
pub mod ws;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
