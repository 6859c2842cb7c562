//! Auto-bid cascade decision logic
//!
//! The pure decision step: given the auction's current price, the
//! leading bidder and the standing directives, decide whether one
//! proxy bid should be produced. The hub owns the trigger that feeds
//! this function and re-enters the publish path with the result.
//!
//! The cascade is deliberately one-step-per-trigger: each externally
//! placed bid produces at most one proxy bid, so two competing
//! auto-bidders do not resolve to their equilibrium until another
//! external bid arrives.

use types::bid::AutoBidDirective;
use types::ids::UserId;
use types::money::Money;

/// A proxy bid the cascade decided to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyBid {
    pub user_id: UserId,
    pub amount: Money,
    /// `max_bid - amount` of the selected directive.
    pub remaining_headroom: Money,
}

/// Decide whether a standing directive should produce a proxy bid.
///
/// Selection: the eligible directive (active, not the leading bidder,
/// `max_bid > current_bid`) with the highest `max_bid`; ties are
/// broken by earliest `created_at_ms` — a deterministic rule rather
/// than incidental query order.
///
/// The proxy amount is `min(current_bid + min_increment, max_bid)`,
/// and no bid is produced unless that strictly exceeds the current
/// price.
pub fn plan_proxy_bid(
    current_bid: Money,
    leading_bidder: Option<&UserId>,
    directives: &[AutoBidDirective],
    min_increment: Money,
) -> Option<ProxyBid> {
    let selected = directives
        .iter()
        .filter(|d| d.can_fire(current_bid))
        .filter(|d| leading_bidder != Some(&d.user_id))
        .min_by(|a, b| {
            b.max_bid
                .cmp(&a.max_bid)
                .then(a.created_at_ms.cmp(&b.created_at_ms))
        })?;

    let amount = (current_bid + min_increment).min(selected.max_bid);
    if amount <= current_bid {
        return None;
    }

    Some(ProxyBid {
        user_id: selected.user_id,
        amount,
        remaining_headroom: selected.max_bid.saturating_sub(amount),
    })
}
