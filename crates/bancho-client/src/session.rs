//! Session-owned state shared between the dispatcher, the outbound
//! facade and the runtime loop, grounded on `bancho/client.py::BanchoClient`
//! (the `player`/`spectating`/`players`/`channels`/`friends`/`privileges`/
//! `ping_count`/`fast_read`/`silenced`/`in_lobby` attributes).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bancho_protocol::Privileges;
use parking_lot::RwLock;

use crate::channel::Channel;
use crate::collections::{Channels, Players};
use crate::player::Player;
use crate::queue::OutboundQueue;

pub struct Session {
    pub queue: Arc<OutboundQueue>,
    pub players: Arc<Players>,
    pub channels: Arc<Channels>,

    own_player: RwLock<Option<Arc<Player>>>,
    spectating: RwLock<Option<Arc<Player>>>,

    pub user_id: AtomicI32,
    pub connected: AtomicBool,
    pub retry: AtomicBool,
    token: RwLock<String>,

    pub friends: RwLock<HashSet<i32>>,
    pub privileges: RwLock<Privileges>,

    pub ping_count: AtomicU32,
    last_action: RwLock<Instant>,
    pub fast_read: AtomicBool,
    pub silenced: AtomicBool,
    pub in_lobby: AtomicBool,

    pub min_idle_time: f64,
    pub max_idle_time: f64,
    pub tournament: bool,
}

impl Session {
    pub fn new(min_idle_time: f64, max_idle_time: f64, tournament: bool) -> Arc<Self> {
        Arc::new(Self {
            queue: OutboundQueue::new(),
            players: Players::new(),
            channels: Channels::new(),
            own_player: RwLock::new(None),
            spectating: RwLock::new(None),
            user_id: AtomicI32::new(-1),
            connected: AtomicBool::new(false),
            retry: AtomicBool::new(true),
            token: RwLock::new(String::new()),
            friends: RwLock::new(HashSet::new()),
            privileges: RwLock::new(Privileges::NORMAL),
            ping_count: AtomicU32::new(0),
            last_action: RwLock::new(Instant::now()),
            fast_read: AtomicBool::new(false),
            silenced: AtomicBool::new(false),
            in_lobby: AtomicBool::new(false),
            min_idle_time,
            max_idle_time,
            tournament,
        })
    }

    pub fn player(&self) -> Option<Arc<Player>> {
        self.own_player.read().clone()
    }

    pub fn set_player(&self, player: Arc<Player>) {
        self.user_id.store(player.id, Ordering::Release);
        *self.own_player.write() = Some(player);
    }

    pub fn spectating(&self) -> Option<Arc<Player>> {
        self.spectating.read().clone()
    }

    pub fn set_spectating(&self, target: Option<Arc<Player>>) {
        *self.spectating.write() = target;
    }

    pub fn token(&self) -> String {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: String) {
        *self.token.write() = token;
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.read().is_empty()
    }

    pub fn touch_last_action(&self) {
        *self.last_action.write() = Instant::now();
    }

    pub fn idle_time_secs(&self) -> f64 {
        self.last_action.read().elapsed().as_secs_f64()
    }

    /// The HTTP-transport polling interval, per the adaptive pacing
    /// formula. TCP transport never calls this — its loop blocks on a
    /// read instead.
    pub fn request_interval(&self) -> f64 {
        if self.fast_read.load(Ordering::Acquire) {
            return 0.0;
        }

        let mut interval = 1.0;
        if self.tournament {
            return interval;
        }

        if self.spectating().is_none() {
            interval *= 1.0 + self.idle_time_secs() / 10.0;
            interval *= 1.0 + f64::from(self.ping_count.load(Ordering::Acquire));
        }

        interval.clamp(self.min_idle_time, self.max_idle_time)
    }

    pub fn get_or_create_channel(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.channels.get(name) {
            return channel;
        }
        let channel = Channel::new(name, self.queue.clone());
        self.channels.add(channel.clone());
        channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_read_forces_zero_interval() {
        let session = Session::new(1.0, 4.0, false);
        session.fast_read.store(true, Ordering::Release);
        assert_eq!(session.request_interval(), 0.0);
    }

    #[test]
    fn tournament_client_ignores_idle_scaling() {
        let session = Session::new(1.0, 4.0, true);
        session.ping_count.store(10, Ordering::Release);
        assert_eq!(session.request_interval(), 1.0);
    }

    #[test]
    fn interval_clamps_to_max_idle() {
        let session = Session::new(1.0, 4.0, false);
        session.ping_count.store(1000, Ordering::Release);
        assert_eq!(session.request_interval(), 4.0);
    }

    #[test]
    fn spectating_skips_idle_scaling() {
        let session = Session::new(1.0, 4.0, false);
        session.ping_count.store(1000, Ordering::Release);
        session.set_spectating(Some(Player::new(1)));
        assert_eq!(session.request_interval(), 1.0);
    }
}
