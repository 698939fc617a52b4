//! Thread-safe player/channel collections, grounded on
//! `objects/collections.py` and the `LockedSet` it builds on.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::channel::Channel;
use crate::player::Player;

/// Players known to this session, indexed by id and by name for the
/// lookups `bancho/packets.py` does constantly (`players.by_id`,
/// `players.by_name`).
#[derive(Default)]
pub struct Players {
    by_id: RwLock<HashMap<i32, Arc<Player>>>,
}

impl Players {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, player: Arc<Player>) {
        self.by_id.write().insert(player.id, player);
    }

    pub fn remove(&self, id: i32) -> Option<Arc<Player>> {
        self.by_id.write().remove(&id)
    }

    pub fn by_id(&self, id: i32) -> Option<Arc<Player>> {
        self.by_id.read().get(&id).cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<Player>> {
        self.by_id.read().values().find(|p| p.name() == name).cloned()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.by_id.read().contains_key(&id)
    }

    pub fn ids(&self) -> Vec<i32> {
        self.by_id.read().keys().copied().collect()
    }

    /// Players whose presence has not arrived yet (name still empty).
    pub fn pending(&self) -> Vec<Arc<Player>> {
        self.by_id
            .read()
            .values()
            .filter(|p| !p.loaded())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Arc<Player>> {
        self.by_id.read().values().cloned().collect()
    }
}

/// Channels known to this session, indexed by name.
#[derive(Default)]
pub struct Channels {
    by_name: RwLock<HashMap<String, Arc<Channel>>>,
}

impl Channels {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, channel: Arc<Channel>) {
        self.by_name.write().insert(channel.name.clone(), channel);
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Channel>> {
        self.by_name.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Channel>> {
        self.by_name.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.read().contains_key(name)
    }

    pub fn joined(&self) -> Vec<Arc<Channel>> {
        self.by_name
            .read()
            .values()
            .filter(|c| c.is_joined())
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Arc<Channel>> {
        self.by_name.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::OutboundQueue;

    #[test]
    fn by_id_and_by_name_lookup() {
        let players = Players::new();
        players.add(Player::with_name(1, "cookiezi"));
        assert!(players.by_id(1).is_some());
        assert!(players.by_name("cookiezi").is_some());
        assert!(players.by_name("nobody").is_none());
    }

    #[test]
    fn pending_only_counts_nameless_players() {
        let players = Players::new();
        players.add(Player::new(1));
        players.add(Player::with_name(2, "loaded"));
        assert_eq!(players.pending().len(), 1);
    }

    #[test]
    fn channel_lookup_by_name() {
        let sink = OutboundQueue::new();
        let channels = Channels::new();
        channels.add(Channel::new("#osu", sink));
        assert!(channels.get("#osu").is_some());
        assert!(channels.joined().is_empty());
    }
}
