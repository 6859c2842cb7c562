//! Per-auction watcher rooms
//!
//! Room membership is transient, in-memory state owned by an
//! injectable registry object; multiple hub instances and test doubles
//! hold their own registries. Scaling broadcasts beyond one process
//! requires backing this with a shared pub/sub transport.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use types::ids::{AuctionId, SubscriberId, UserId};

use crate::events::WatcherEvent;

/// Fire-and-forget event sender for one watcher connection.
pub type WatcherSender = mpsc::UnboundedSender<WatcherEvent>;

struct Watcher {
    user_id: UserId,
    sender: WatcherSender,
}

/// Room membership: auction id → subscriber set.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<AuctionId, HashMap<SubscriberId, Watcher>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber to the auction's room. Returns the room size
    /// including the new member.
    pub fn join(
        &self,
        auction_id: AuctionId,
        subscriber: SubscriberId,
        user_id: UserId,
        sender: WatcherSender,
    ) -> usize {
        let mut room = self.rooms.entry(auction_id).or_default();
        room.insert(subscriber, Watcher { user_id, sender });
        room.len()
    }

    /// Remove a subscriber; empty rooms are dropped.
    pub fn leave(&self, auction_id: &AuctionId, subscriber: &SubscriberId) {
        if let Some(mut room) = self.rooms.get_mut(auction_id) {
            room.remove(subscriber);
            let empty = room.is_empty();
            drop(room);
            if empty {
                self.rooms.remove_if(auction_id, |_, members| members.is_empty());
            }
        }
    }

    /// Current room size.
    pub fn watcher_count(&self, auction_id: &AuctionId) -> usize {
        self.rooms.get(auction_id).map(|room| room.len()).unwrap_or(0)
    }

    /// Broadcast to every room member, at most once each. Watchers
    /// whose receiver is gone are pruned. Returns delivered count.
    pub fn broadcast(&self, auction_id: &AuctionId, event: &WatcherEvent) -> usize {
        let Some(mut room) = self.rooms.get_mut(auction_id) else {
            return 0;
        };
        let before = room.len();
        room.retain(|subscriber, watcher| {
            let alive = watcher.sender.send(event.clone()).is_ok();
            if !alive {
                debug!(auction_id = %auction_id, subscriber = %subscriber, "pruning dead watcher");
            }
            alive
        });
        let delivered = room.len();
        if before != delivered {
            debug!(auction_id = %auction_id, pruned = before - delivered, "room pruned during broadcast");
        }
        delivered
    }

    /// Deliver to every connection of one user in the room (private
    /// events). Returns delivered count.
    pub fn send_to_user(&self, auction_id: &AuctionId, user_id: &UserId, event: &WatcherEvent) -> usize {
        let Some(room) = self.rooms.get(auction_id) else {
            return 0;
        };
        room.values()
            .filter(|w| w.user_id == *user_id)
            .filter(|w| w.sender.send(event.clone()).is_ok())
            .count()
    }

    /// Deliver to one specific subscriber (snapshot push).
    pub fn send_to_subscriber(
        &self,
        auction_id: &AuctionId,
        subscriber: &SubscriberId,
        event: WatcherEvent,
    ) -> bool {
        let Some(room) = self.rooms.get(auction_id) else {
            return false;
        };
        room.get(subscriber)
            .map(|w| w.sender.send(event).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ending_soon(auction_id: AuctionId) -> WatcherEvent {
        WatcherEvent::EndingSoon {
            auction_id,
            minutes_remaining: 5,
        }
    }

    #[test]
    fn test_join_leave_counts() {
        let registry = RoomRegistry::new();
        let auction = AuctionId::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let s1 = SubscriberId::new();
        let s2 = SubscriberId::new();
        assert_eq!(registry.join(auction, s1, UserId::new(), tx1), 1);
        assert_eq!(registry.join(auction, s2, UserId::new(), tx2), 2);
        assert_eq!(registry.watcher_count(&auction), 2);

        registry.leave(&auction, &s1);
        assert_eq!(registry.watcher_count(&auction), 1);
        registry.leave(&auction, &s2);
        assert_eq!(registry.watcher_count(&auction), 0);
    }

    #[test]
    fn test_broadcast_reaches_all_members() {
        let registry = RoomRegistry::new();
        let auction = AuctionId::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.join(auction, SubscriberId::new(), UserId::new(), tx1);
        registry.join(auction, SubscriberId::new(), UserId::new(), tx2);

        let delivered = registry.broadcast(&auction, &ending_soon(auction));
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_prunes_dead_watchers() {
        let registry = RoomRegistry::new();
        let auction = AuctionId::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        registry.join(auction, SubscriberId::new(), UserId::new(), tx1);
        registry.join(auction, SubscriberId::new(), UserId::new(), tx2);
        drop(rx1);

        let delivered = registry.broadcast(&auction, &ending_soon(auction));
        assert_eq!(delivered, 1);
        assert_eq!(registry.watcher_count(&auction), 1);
    }

    #[test]
    fn test_send_to_user_is_private() {
        let registry = RoomRegistry::new();
        let auction = AuctionId::new();
        let target = UserId::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.join(auction, SubscriberId::new(), target, tx1);
        registry.join(auction, SubscriberId::new(), UserId::new(), tx2);

        let delivered = registry.send_to_user(&auction, &target, &ending_soon(auction));
        assert_eq!(delivered, 1);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_to_empty_room() {
        let registry = RoomRegistry::new();
        let auction = AuctionId::new();
        assert_eq!(registry.broadcast(&auction, &ending_soon(auction)), 0);
    }
}
