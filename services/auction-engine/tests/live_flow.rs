//! Real-time hub and cascade flow scenarios
//!
//! Drives the hub directly through watcher channels: snapshot on join,
//! bid broadcasts, the one-step auto-bid cascade and degraded
//! behavior when the store is down.

use std::collections::BTreeSet;
use std::sync::Arc;

use auction_engine::config::EngineConfig;
use auction_engine::events::WatcherEvent;
use auction_engine::hub::AuctionHub;
use auction_engine::notify::{NotificationKind, RecordingNotifier};
use auction_engine::store::{DocumentStore, InMemoryStore};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use types::auction::{Auction, AuctionStatus};
use types::bid::{AutoBidDirective, Bid, BidOrigin};
use types::ids::{AuctionId, ProductId, SubscriberId, UserId};
use types::money::Money;

const NOW: i64 = 1_700_000_000_000;

fn fixture() -> (Arc<InMemoryStore>, Arc<RecordingNotifier>, Arc<AuctionHub>) {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let hub = Arc::new(AuctionHub::new(
        store.clone(),
        notifier.clone(),
        EngineConfig::default(),
    ));
    (store, notifier, hub)
}

fn active_auction() -> Auction {
    Auction {
        id: AuctionId::new(),
        title: "Vintage camera".to_string(),
        product_id: ProductId::new(),
        status: AuctionStatus::Active,
        current_bid: Money::ZERO,
        highest_bidder: None,
        bid_end_time_ms: NOW + 600_000,
        seller_id: UserId::new(),
        participants: BTreeSet::new(),
    }
}

fn directive(auction_id: AuctionId, user_id: UserId, max: u64, created_at_ms: i64) -> AutoBidDirective {
    AutoBidDirective {
        auction_id,
        user_id,
        max_bid: Money::from_u64(max),
        active: true,
        created_at_ms,
    }
}

async fn join(
    hub: &AuctionHub,
    auction_id: AuctionId,
    user_id: UserId,
) -> (SubscriberId, UnboundedReceiver<WatcherEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscriber = SubscriberId::new();
    hub.join(auction_id, subscriber, user_id, tx).await;
    (subscriber, rx)
}

fn drain(rx: &mut UnboundedReceiver<WatcherEvent>) -> Vec<WatcherEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_snapshot_on_join() {
    let (store, _notifier, hub) = fixture();
    let auction = active_auction();
    let auction_id = auction.id;
    store.put_auction(auction);

    for i in 1..=12u64 {
        store
            .record_bid(Bid::user(
                auction_id,
                UserId::new(),
                Money::from_u64(i * 100),
                NOW - 120_000 + i as i64 * 1_000,
            ))
            .await
            .unwrap();
    }

    let (_s1, mut rx1) = join(&hub, auction_id, UserId::new()).await;
    let (_s2, mut rx2) = join(&hub, auction_id, UserId::new()).await;

    match rx2.try_recv().unwrap() {
        WatcherEvent::AuctionState {
            auction,
            recent_bids,
            watcher_count,
        } => {
            let auction = auction.expect("summary present");
            assert_eq!(auction.id, auction_id);
            assert_eq!(auction.current_bid, Money::from_u64(1_200));
            assert_eq!(recent_bids.len(), 10, "snapshot capped at 10 bids");
            assert_eq!(recent_bids[0].amount, Money::from_u64(1_200), "newest first");
            assert_eq!(watcher_count, 2, "count includes the joiner");
        }
        other => panic!("expected auction-state, got {:?}", other),
    }

    // First watcher joined alone
    match rx1.try_recv().unwrap() {
        WatcherEvent::AuctionState { watcher_count, .. } => assert_eq!(watcher_count, 1),
        other => panic!("expected auction-state, got {:?}", other),
    }
}

#[tokio::test]
async fn test_degraded_snapshot_when_store_down() {
    let (store, _notifier, hub) = fixture();
    let auction = active_auction();
    let auction_id = auction.id;
    store.put_auction(auction);

    store.set_fail_reads(true);
    let (_s, mut rx) = join(&hub, auction_id, UserId::new()).await;
    store.set_fail_reads(false);

    // Join still succeeded and the degraded snapshot was pushed
    match rx.try_recv().unwrap() {
        WatcherEvent::AuctionState {
            auction,
            recent_bids,
            watcher_count,
        } => {
            assert!(auction.is_none());
            assert!(recent_bids.is_empty());
            assert_eq!(watcher_count, 1);
        }
        other => panic!("expected auction-state, got {:?}", other),
    }
    assert!(!store.error_records().is_empty());

    // Future broadcasts reach the watcher
    hub.broadcast_ending_soon(auction_id, 2);
    assert!(matches!(
        rx.try_recv().unwrap(),
        WatcherEvent::EndingSoon {
            minutes_remaining: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn test_cascade_scenario_one_step() {
    let (store, notifier, hub) = fixture();
    let auction = active_auction();
    let auction_id = auction.id;
    store.put_auction(auction);

    let user_a = UserId::new();
    let user_b = UserId::new();
    let user_c = UserId::new();
    store.put_directive(directive(auction_id, user_b, 600, NOW - 10_000));
    store.put_directive(directive(auction_id, user_c, 500, NOW - 5_000));

    let (_watcher, mut watcher_rx) = join(&hub, auction_id, UserId::new()).await;
    let (_b_conn, mut b_rx) = join(&hub, auction_id, user_b).await;
    drain(&mut watcher_rx);
    drain(&mut b_rx);

    // userA bids 400 through the external placement path
    let bid = store
        .record_bid(Bid::user(auction_id, user_a, Money::from_u64(400), NOW))
        .await
        .unwrap();
    hub.publish_bid(auction_id, &bid).await;

    let events = drain(&mut watcher_rx);
    assert_eq!(events.len(), 2, "one bid broadcast plus one proxy broadcast");
    match &events[0] {
        WatcherEvent::NewBid {
            user_id,
            amount,
            current_bid,
            is_winning,
            ..
        } => {
            assert_eq!(*user_id, user_a);
            assert_eq!(*amount, Money::from_u64(400));
            assert_eq!(*current_bid, Money::from_u64(400));
            assert!(*is_winning);
        }
        other => panic!("expected new-bid, got {:?}", other),
    }
    match &events[1] {
        WatcherEvent::AutoBidPlaced {
            user_id,
            amount,
            current_bid,
            ..
        } => {
            assert_eq!(*user_id, user_b, "highest max_bid directive selected");
            assert_eq!(*amount, Money::from_u64(500));
            assert_eq!(*current_bid, Money::from_u64(500));
        }
        other => panic!("expected auto-bid-placed, got {:?}", other),
    }

    // userB privately learns their directive fired
    let b_events = drain(&mut b_rx);
    let executed = b_events
        .iter()
        .find_map(|e| match e {
            WatcherEvent::AutobidExecuted {
                amount,
                remaining_headroom,
                ..
            } => Some((*amount, *remaining_headroom)),
            _ => None,
        })
        .expect("private autobid-executed event");
    assert_eq!(executed, (Money::from_u64(500), Money::from_u64(100)));
    assert_eq!(
        notifier.recipients_of(NotificationKind::AutobidExecuted),
        vec![user_b]
    );

    // One proxy bid per external bid: the 500-max directive did not
    // fire again off the proxy bid
    assert_eq!(store.bid_count(&auction_id).await.unwrap(), 2);
    let auction = store.auction(&auction_id).await.unwrap().unwrap();
    assert_eq!(auction.current_bid, Money::from_u64(500));
    assert_eq!(auction.highest_bidder, Some(user_b));

    // Single winning bid, and it is the proxy at 500
    let bids = store.bids_by_amount_desc(&auction_id).await.unwrap();
    let winning: Vec<_> = bids.iter().filter(|b| b.is_winning).collect();
    assert_eq!(winning.len(), 1);
    assert_eq!(winning[0].origin, BidOrigin::AutoBid);
    assert_eq!(winning[0].amount, Money::from_u64(500));
}

#[tokio::test]
async fn test_bid_broadcast_order_matches_publish_order() {
    let (store, _notifier, hub) = fixture();
    let auction = active_auction();
    let auction_id = auction.id;
    store.put_auction(auction);

    let (_s, mut rx) = join(&hub, auction_id, UserId::new()).await;
    drain(&mut rx);

    for (i, amount) in [300u64, 450, 700].into_iter().enumerate() {
        let bid = store
            .record_bid(Bid::user(
                auction_id,
                UserId::new(),
                Money::from_u64(amount),
                NOW + i as i64 * 1_000,
            ))
            .await
            .unwrap();
        hub.publish_bid(auction_id, &bid).await;
    }

    let amounts: Vec<Money> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            WatcherEvent::NewBid { amount, .. } => Some(amount),
            _ => None,
        })
        .collect();
    assert_eq!(
        amounts,
        vec![
            Money::from_u64(300),
            Money::from_u64(450),
            Money::from_u64(700)
        ],
        "no reordering buffer"
    );
}

#[tokio::test]
async fn test_bid_metric_counter_incremented() {
    let (store, _notifier, hub) = fixture();
    let auction = active_auction();
    let auction_id = auction.id;
    store.put_auction(auction);

    let bidder = UserId::new();
    let bid = store
        .record_bid(Bid::user(auction_id, bidder, Money::from_u64(200), NOW))
        .await
        .unwrap();
    hub.publish_bid(auction_id, &bid).await;

    assert_eq!(store.user_bid_count(&bidder), 1);
}
