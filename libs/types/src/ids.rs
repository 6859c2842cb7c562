//! Unique identifier types for marketplace entities
//!
//! All IDs use UUID v7 for time-sortable ordering, enabling efficient
//! chronological queries over auctions, bids and orders.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with the current timestamp
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an auction
    ///
    /// Uses UUID v7 for time-based sorting. Auctions can be efficiently
    /// queried in creation order using the embedded timestamp.
    AuctionId
}

uuid_id! {
    /// Unique identifier for a bid
    BidId
}

uuid_id! {
    /// Unique identifier for a settlement order
    OrderId
}

uuid_id! {
    /// Unique identifier for a catalog product
    ProductId
}

uuid_id! {
    /// Unique identifier for a marketplace user (bidder or seller)
    UserId
}

uuid_id! {
    /// Unique identifier for one real-time watcher connection
    ///
    /// A user with two open connections holds two distinct subscriber
    /// ids; private events are addressed by user, not by subscriber.
    SubscriberId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auction_id_creation() {
        let id1 = AuctionId::new();
        let id2 = AuctionId::new();
        assert_ne!(id1, id2, "AuctionIds should be unique");
    }

    #[test]
    fn test_auction_id_serialization() {
        let id = AuctionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: AuctionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_ids_are_time_sortable() {
        let first = BidId::new();
        let second = BidId::new();
        // UUID v7 embeds the timestamp, so creation order sorts
        assert!(first <= second);
    }

    #[test]
    fn test_user_id_roundtrip_via_uuid() {
        let id = UserId::new();
        let copy = UserId::from_uuid(*id.as_uuid());
        assert_eq!(id, copy);
    }

    #[test]
    fn test_display_matches_uuid() {
        let id = OrderId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
