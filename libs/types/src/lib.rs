//! Types library for the auction marketplace
//!
//! This library provides the core type definitions shared across the
//! marketplace services, ensuring type safety and deterministic
//! monetary arithmetic.
//!
//! # Modules
//! - `ids`: Unique identifiers (AuctionId, BidId, OrderId, ProductId, UserId, SubscriberId)
//! - `money`: Decimal money type with tax computation
//! - `clock`: Unix-millisecond clock helper
//! - `auction`: Auction record and status state machine
//! - `bid`: Bid and auto-bid directive records
//! - `order`: Settlement order types

pub mod auction;
pub mod bid;
pub mod clock;
pub mod ids;
pub mod money;
pub mod order;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auction::*;
    pub use crate::bid::*;
    pub use crate::clock::*;
    pub use crate::ids::*;
    pub use crate::money::*;
    pub use crate::order::*;
}
