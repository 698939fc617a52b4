//! Stateful player handle, grounded on `objects/player.py`.

use bancho_protocol::{Mode, Privileges, Status};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// A player known to this session: either the connected account itself,
/// or anyone whose presence/stats have been received.
///
/// Cloning an `Arc<Player>` and sharing it across the collection, the
/// spectating target slot and event callbacks is the idiomatic analog of
/// the reference client handing the same Python object reference around.
#[derive(Debug)]
pub struct Player {
    pub id: i32,
    state: RwLock<PlayerState>,
}

#[derive(Debug, Clone)]
struct PlayerState {
    name: String,
    timezone: i16,
    country_code: u8,
    longitude: f32,
    latitude: f32,
    status: Status,
    last_status: Status,
    rscore: i64,
    acc: f32,
    playcount: i32,
    tscore: i64,
    rank: i32,
    pp: i16,
    privileges: Privileges,
    spectators: HashSet<i32>,
    cant_spectate: bool,
    silenced: bool,
    dms_blocked: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            name: String::new(),
            timezone: 0,
            country_code: 0,
            longitude: 0.0,
            latitude: 0.0,
            status: Status::default(),
            last_status: Status::default(),
            rscore: 0,
            acc: 100.0,
            playcount: 0,
            tscore: 0,
            rank: 0,
            pp: 0,
            privileges: Privileges::NORMAL,
            spectators: HashSet::new(),
            cant_spectate: false,
            silenced: false,
            dms_blocked: false,
        }
    }
}

impl Player {
    pub fn new(id: i32) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: RwLock::new(PlayerState::default()),
        })
    }

    pub fn with_name(id: i32, name: impl Into<String>) -> Arc<Self> {
        let player = Self::new(id);
        player.state.write().name = name.into();
        player
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.state.write().name = name.into();
    }

    /// A player is "loaded" once its presence (starting with its name)
    /// has actually arrived, matching `Player.loaded` in the original.
    pub fn loaded(&self) -> bool {
        !self.state.read().name.is_empty()
    }

    pub fn status(&self) -> Status {
        self.state.read().status.clone()
    }

    pub fn set_status(&self, status: Status) {
        self.state.write().status = status;
    }

    pub fn with_status_mut<R>(&self, f: impl FnOnce(&mut Status) -> R) -> R {
        f(&mut self.state.write().status)
    }

    pub fn mode(&self) -> Mode {
        self.state.read().status.mode
    }

    /// Stash the current status as `last_status` before overwriting it —
    /// called by the `USER_STATS` handler before it mutates `status`.
    pub fn stash_last_status(&self) {
        let mut state = self.state.write();
        state.last_status = state.status.clone();
    }

    pub fn last_status(&self) -> Status {
        self.state.read().last_status.clone()
    }

    pub fn timezone(&self) -> i16 {
        self.state.read().timezone
    }

    pub fn set_presence(&self, timezone: i16, country_code: u8, longitude: f32, latitude: f32, privileges: Privileges, mode: Mode, rank: i32) {
        let mut state = self.state.write();
        state.timezone = timezone;
        state.country_code = country_code;
        state.longitude = longitude;
        state.latitude = latitude;
        state.privileges = privileges;
        state.status.mode = mode;
        state.rank = rank;
    }

    pub fn set_stats(&self, rscore: i64, acc: f32, playcount: i32, tscore: i64, rank: i32, pp: i16) {
        let mut state = self.state.write();
        state.rscore = rscore;
        state.acc = acc;
        state.playcount = playcount;
        state.tscore = tscore;
        state.rank = rank;
        state.pp = pp;
    }

    pub fn privileges(&self) -> Privileges {
        self.state.read().privileges
    }

    pub fn rank(&self) -> i32 {
        self.state.read().rank
    }

    pub fn cant_spectate(&self) -> bool {
        self.state.read().cant_spectate
    }

    pub fn set_cant_spectate(&self, value: bool) {
        self.state.write().cant_spectate = value;
    }

    pub fn silenced(&self) -> bool {
        self.state.read().silenced
    }

    pub fn set_silenced(&self, value: bool) {
        self.state.write().silenced = value;
    }

    pub fn dms_blocked(&self) -> bool {
        self.state.read().dms_blocked
    }

    pub fn set_dms_blocked(&self, value: bool) {
        self.state.write().dms_blocked = value;
    }

    pub fn add_spectator(&self, id: i32) {
        self.state.write().spectators.insert(id);
    }

    pub fn remove_spectator(&self, id: i32) {
        self.state.write().spectators.remove(&id);
    }

    pub fn has_spectators(&self) -> bool {
        !self.state.read().spectators.is_empty()
    }

    pub fn spectator_ids(&self) -> Vec<i32> {
        self.state.read().spectators.iter().copied().collect()
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl std::hash::Hash for Player {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_player_is_not_loaded() {
        let player = Player::new(1);
        assert!(!player.loaded());
        player.set_name("cookiezi");
        assert!(player.loaded());
    }

    #[test]
    fn stash_last_status_copies_before_overwrite() {
        let player = Player::new(1);
        player.with_status_mut(|s| s.beatmap_id = 10);
        player.stash_last_status();
        player.with_status_mut(|s| s.beatmap_id = 20);
        assert_eq!(player.last_status().beatmap_id, 10);
        assert_eq!(player.status().beatmap_id, 20);
    }

    #[test]
    fn equality_is_by_id_only() {
        let a = Player::with_name(1, "a");
        let b = Player::with_name(1, "b");
        assert_eq!(a, b);
    }
}
