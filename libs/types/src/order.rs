//! Settlement order types
//!
//! An order is created exclusively by the auction finalizer when a
//! winner exists: a single line referencing the auctioned product,
//! subtotal equal to the final bid, tax added on top, and status
//! `pending_payment` awaiting the payment flow.

use crate::auction::Auction;
use crate::ids::{AuctionId, OrderId, ProductId, UserId};
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment status of a settlement order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created by the finalizer, awaiting payment
    PendingPayment,
    /// Paid via the payment flow (downstream)
    Paid,
    /// Cancelled before payment (downstream)
    Cancelled,
}

/// One line of a settlement order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A settlement order binding the auction winner to payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub auction_id: AuctionId,
    pub items: Vec<OrderLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at_ms: i64,
}

impl Order {
    /// Build the pending-payment order for an auction's winner.
    ///
    /// Subtotal is the final bid, tax is `tax_rate` of the subtotal
    /// rounded to 2 decimal places, total is their sum.
    pub fn settlement(winner: UserId, auction: &Auction, tax_rate: Decimal, now_ms: i64) -> Self {
        let subtotal = auction.current_bid;
        let tax = subtotal.tax(tax_rate);
        Self {
            id: OrderId::new(),
            user_id: winner,
            auction_id: auction.id,
            items: vec![OrderLine {
                product_id: auction.product_id,
                title: auction.title.clone(),
                unit_price: subtotal,
                quantity: 1,
            }],
            subtotal,
            tax,
            total: subtotal + tax,
            status: OrderStatus::PendingPayment,
            created_at_ms: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::AuctionStatus;
    use std::collections::BTreeSet;
    use std::str::FromStr;

    fn auction_with_bid(amount: u64) -> Auction {
        Auction {
            id: AuctionId::new(),
            title: "Vintage camera".to_string(),
            product_id: ProductId::new(),
            status: AuctionStatus::Ended,
            current_bid: Money::from_u64(amount),
            highest_bidder: Some(UserId::new()),
            bid_end_time_ms: 1_700_000_000_000,
            seller_id: UserId::new(),
            participants: BTreeSet::new(),
        }
    }

    #[test]
    fn test_settlement_totals_at_18_percent() {
        let rate = Decimal::from_str("0.18").unwrap();
        let auction = auction_with_bid(1000);
        let winner = UserId::new();

        let order = Order::settlement(winner, &auction, rate, 1_700_000_100_000);

        assert_eq!(order.user_id, winner);
        assert_eq!(order.auction_id, auction.id);
        assert_eq!(order.subtotal, Money::from_u64(1000));
        assert_eq!(order.tax, Money::from_u64(180));
        assert_eq!(order.total, Money::from_u64(1180));
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn test_settlement_single_line_references_product() {
        let rate = Decimal::from_str("0.18").unwrap();
        let auction = auction_with_bid(250);

        let order = Order::settlement(UserId::new(), &auction, rate, 1_700_000_100_000);

        assert_eq!(order.items.len(), 1);
        let line = &order.items[0];
        assert_eq!(line.product_id, auction.product_id);
        assert_eq!(line.title, auction.title);
        assert_eq!(line.unit_price, Money::from_u64(250));
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"pending_payment\"");
    }
}
