//! Built-in packet handlers, grounded on `bancho/packets.py`. Every
//! received packet runs through here first (mutating session state: the
//! players/channels collections, the acting player's status, spectator
//! lists, the match table) and then through whatever user callbacks are
//! registered on the same id in `EventRegistry` — fed the same decoded
//! value the built-in handler just produced.

use std::any::Any;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bancho_protocol::{
    BeatmapInfo, ByteReader, ByteWriter, ClientPacketId, Decode, LoginError, Match, Presence, Privileges,
    ServerPacketId, SpectateFrameBundle, Status,
};
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::error::Result;
use crate::events::EventRegistry;
use crate::player::Player;
use crate::session::Session;
use crate::tasks::TaskManager;
use crate::worker::WorkerPool;

/// A chat message, carried by `SEND_MESSAGE`/`SEND_PUBLIC_MESSAGE`.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender_name: String,
    pub text: String,
    pub target_name: String,
    pub sender_id: i32,
}

impl Decode for ChatMessage {
    fn decode(reader: &mut ByteReader<'_>) -> bancho_protocol::Result<Self> {
        Ok(Self {
            sender_name: reader.read_string()?,
            text: reader.read_string()?,
            target_name: reader.read_string()?,
            sender_id: reader.read_i32()?,
        })
    }
}

/// A `SEND_MESSAGE` target, resolved to either a joined-or-known channel or
/// a player, matching `bancho/packets.py::message`'s `target` resolution.
#[derive(Clone)]
pub enum MessageTarget {
    Channel(Arc<Channel>),
    Player(Arc<Player>),
}

/// A fully resolved chat message: sender/target have already been looked
/// up in the player/channel collections, so user callbacks get the same
/// `(sender, text, target)` triple `game.events.call` passes.
#[derive(Clone)]
pub struct ChatEvent {
    pub sender: Arc<Player>,
    pub text: String,
    pub target: MessageTarget,
}

/// Splits `ids` into `UserPresenceRequest` packets of at most 255 ids each
/// — the protocol's own limit on how many ids an intlist can carry
/// meaningfully in one request, not a preference. Grounded on
/// `objects/collections.py::Players.load`.
fn request_presence_chunked(session: &Arc<Session>, ids: &[i32]) {
    for chunk in ids.chunks(255) {
        let mut writer = ByteWriter::new();
        writer.write_intlist(chunk);
        session.queue.push(ClientPacketId::UserPresenceRequest, &writer.into_bytes());
    }
}

/// Run `payload` through the built-in handler for `packet`, decode a
/// concrete event value along the way, then fan that value out to user
/// callbacks. Unknown/unhandled packets are logged and otherwise ignored,
/// matching `packets.py`'s default no-op branch.
pub fn dispatch(
    session: &Arc<Session>,
    events: &EventRegistry,
    tasks: &TaskManager,
    pool: &WorkerPool,
    packet: ServerPacketId,
    payload: &[u8],
) -> Result<()> {
    let mut reader = ByteReader::new(payload);

    let event: Arc<dyn Any + Send + Sync> = match packet {
        ServerPacketId::UserId => handle_login_reply(session, &mut reader)?,
        ServerPacketId::Privileges => Arc::new(handle_privileges(session, &mut reader)?),
        ServerPacketId::FriendsList => Arc::new(handle_friends_list(session, &mut reader)?),
        ServerPacketId::ProtocolVersion => {
            let version = reader.read_i32()?;
            debug!(version, "protocol version");
            Arc::new(version)
        }
        ServerPacketId::MainMenuIcon => {
            let icon = reader.read_string()?;
            debug!(icon, "main menu icon");
            Arc::new(icon)
        }
        ServerPacketId::VersionUpdate | ServerPacketId::VersionUpdateForced => {
            let forced = packet == ServerPacketId::VersionUpdateForced;
            info!(forced, "version update");
            Arc::new(forced)
        }
        ServerPacketId::GetAttention => {
            info!("server requested attention");
            Arc::new(())
        }
        ServerPacketId::Notification => {
            let message = reader.read_string()?;
            info!(message, "notification");
            Arc::new(message)
        }

        ServerPacketId::UserPresence => handle_user_presence(session, &mut reader)?,
        ServerPacketId::UserPresenceSingle => Arc::new(handle_presence_single(session, &mut reader)?),
        ServerPacketId::UserPresenceBundle => Arc::new(handle_presence_bundle(session, &mut reader)?),
        ServerPacketId::UserStats => handle_user_stats(session, &mut reader)?,
        ServerPacketId::UserLogout => Arc::new(handle_user_logout(session, &mut reader)?),

        ServerPacketId::SendMessage => match handle_send_message(session, &mut reader)? {
            Some(chat) => Arc::new(chat),
            None => Arc::new(()),
        },
        ServerPacketId::SilenceEnd => {
            let seconds = reader.read_i32()?;
            handle_silence_end(session, tasks, seconds);
            Arc::new(seconds)
        }
        ServerPacketId::UserSilenced => {
            let id = reader.read_i32()?;
            if let Some(player) = session.players.by_id(id) {
                player.set_silenced(true);
            }
            Arc::new(id)
        }
        ServerPacketId::TargetIsSilenced => {
            let name = reader.read_string()?;
            warn!(name, "message target is silenced");
            Arc::new(name)
        }
        ServerPacketId::UserDmBlocked => {
            let name = reader.read_string()?;
            warn!(name, "message target has dms blocked");
            Arc::new(name)
        }

        ServerPacketId::SpectatorJoined => Arc::new(handle_spectator_joined(session, &mut reader)?),
        ServerPacketId::SpectatorLeft => Arc::new(handle_spectator_left(session, &mut reader)?),
        ServerPacketId::FellowSpectatorJoined | ServerPacketId::FellowSpectatorLeft => {
            let id = reader.read_i32()?;
            debug!(id, joined = packet == ServerPacketId::FellowSpectatorJoined, "fellow spectator");
            Arc::new(id)
        }
        ServerPacketId::SpectatorCantSpectate => {
            let id = reader.read_i32()?;
            if let Some(player) = session.players.by_id(id) {
                player.set_cant_spectate(true);
            }
            Arc::new(id)
        }
        ServerPacketId::SpectateFrames => Arc::new(SpectateFrameBundle::decode(&mut reader)?),

        ServerPacketId::ChannelInfo => handle_channel_info(session, &mut reader)?,
        ServerPacketId::ChannelAutoJoin => {
            let name = reader.read_string()?;
            let _topic = reader.read_string()?;
            let _count = reader.read_i16()?;
            let channel = session.get_or_create_channel(&name);
            channel.join();
            channel
        }
        ServerPacketId::ChannelJoinSuccess => handle_channel_join_success(session, &mut reader)?,
        ServerPacketId::ChannelKick => {
            let name = reader.read_string()?;
            if let Some(channel) = session.channels.get(&name) {
                channel.leave();
            }
            Arc::new(name)
        }
        ServerPacketId::ChannelInfoEnd => {
            debug!("channel info end");
            Arc::new(())
        }

        ServerPacketId::MatchJoinSuccess | ServerPacketId::NewMatch | ServerPacketId::UpdateMatch | ServerPacketId::MatchStart => {
            Arc::new(Match::decode(&mut reader)?)
        }
        ServerPacketId::DisposeMatch => Arc::new(reader.read_i32()?),
        ServerPacketId::MatchComplete | ServerPacketId::MatchSkip | ServerPacketId::MatchAllPlayersLoaded => Arc::new(()),
        ServerPacketId::MatchPlayerFailed => Arc::new(reader.read_i32()?),
        ServerPacketId::MatchScoreUpdate => Arc::new(()),
        ServerPacketId::MatchTransferHost => Arc::new(()),
        ServerPacketId::MatchInvite => Arc::new(ChatMessage::decode(&mut reader)?),
        ServerPacketId::MatchChangePassword => Arc::new(reader.read_string()?),
        ServerPacketId::MatchJoinFail | ServerPacketId::MatchAbort => Arc::new(()),

        ServerPacketId::Restart => {
            let millis = reader.read_i32()?;
            warn!(millis, "server requested restart");
            Arc::new(millis)
        }
        ServerPacketId::AccountRestricted => {
            if let Some(player) = session.player() {
                warn!(id = player.id, "account restricted");
            }
            Arc::new(())
        }
        ServerPacketId::SwitchServer | ServerPacketId::SwitchTournamentServer => {
            let target = reader.read_i32()?;
            info!(target, "server switch requested");
            Arc::new(target)
        }
        ServerPacketId::BeatmapInfoReply => {
            let count = reader.read_i32()?;
            let mut infos = Vec::with_capacity(count.max(0) as usize);
            for _ in 0..count.max(0) {
                infos.push(BeatmapInfo::decode(&mut reader)?);
            }
            debug!(count = infos.len(), "beatmap info reply");
            Arc::new(infos)
        }

        other => {
            debug!(?other, "unhandled built-in packet");
            Arc::new(())
        }
    };

    events.call(packet, event, pool);
    Ok(())
}

fn handle_login_reply(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Arc<Player>> {
    let user_id = reader.read_i32()?;
    if user_id <= 0 {
        if let Some(error) = LoginError::from_user_id(user_id) {
            return Err(error.into());
        }
    }
    let player = Player::new(user_id);
    session.set_player(player.clone());
    session.players.add(player.clone());
    session.connected.store(true, Ordering::Release);
    session.fast_read.store(true, Ordering::Release);
    info!(user_id, "logged in");
    Ok(player)
}

fn handle_privileges(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Privileges> {
    let bits = reader.read_u32()?;
    let privileges = Privileges::from_bits_truncate(bits as u8);
    *session.privileges.write() = privileges;
    Ok(privileges)
}

fn handle_friends_list(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Vec<i32>> {
    let ids = reader.read_intlist()?;
    let mut friends = session.friends.write();
    friends.clear();
    friends.extend(ids.iter().copied());
    Ok(ids)
}

fn handle_user_presence(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Arc<Player>> {
    let presence = Presence::decode(reader)?;
    let player = session
        .players
        .by_id(presence.user_id)
        .unwrap_or_else(|| Player::new(presence.user_id));
    player.set_name(presence.name.clone());
    player.set_presence(
        presence.timezone,
        presence.country_code,
        presence.longitude,
        presence.latitude,
        presence.privileges,
        presence.mode,
        presence.rank,
    );
    session.players.add(player.clone());
    session.fast_read.store(true, Ordering::Release);
    Ok(player)
}

/// `USER_PRESENCE_SINGLE` ensures the referenced player exists and, if it
/// was just created, requests its presence — the same "ensure then
/// request" shape as the bundle handler below.
fn handle_presence_single(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<i32> {
    let id = reader.read_i32()?;
    if !session.players.contains(id) {
        session.players.add(Player::new(id));
        request_presence_chunked(session, &[id]);
    }
    Ok(id)
}

fn handle_presence_bundle(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Vec<i32>> {
    let ids = reader.read_intlist()?;
    let mut unknown = Vec::new();
    for id in &ids {
        if !session.players.contains(*id) {
            session.players.add(Player::new(*id));
            unknown.push(*id);
        }
    }
    if !unknown.is_empty() {
        request_presence_chunked(session, &unknown);
    }
    session.fast_read.store(true, Ordering::Release);
    Ok(ids)
}

fn handle_user_stats(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Arc<Player>> {
    let user_id = reader.read_i32()?;
    let status = Status::decode(reader)?;
    let rscore = reader.read_i64()?;
    let acc = reader.read_f32()?;
    let playcount = reader.read_i32()?;
    let tscore = reader.read_i64()?;
    let rank = reader.read_i32()?;
    let pp = reader.read_i16()?;

    let player = session
        .players
        .by_id(user_id)
        .unwrap_or_else(|| Player::new(user_id));
    player.stash_last_status();
    player.set_status(status);
    player.set_stats(rscore, acc, playcount, tscore, rank, pp);
    session.players.add(player.clone());
    Ok(player)
}

fn handle_user_logout(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<i32> {
    let id = reader.read_i32()?;
    if session.players.by_id(id).is_some() {
        if session.spectating().is_some_and(|p| p.id == id) {
            session.set_spectating(None);
        }
        session.players.remove(id);
    }
    Ok(id)
}

/// Resolves sender and target, matching `bancho/packets.py::message`:
/// sender is looked up by id then by name (bailing out silently if
/// neither resolves, same as the original's early `return`); target is a
/// channel if it starts with `#`, otherwise another player. Either side
/// missing its presence triggers a presence request.
fn handle_send_message(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Option<ChatEvent>> {
    let raw = ChatMessage::decode(reader)?;

    let Some(sender) = session
        .players
        .by_id(raw.sender_id)
        .or_else(|| session.players.by_name(&raw.sender_name))
    else {
        return Ok(None);
    };
    if !sender.loaded() {
        request_presence_chunked(session, &[sender.id]);
    }

    let target = if raw.target_name.starts_with('#') {
        let Some(channel) = session.channels.get(&raw.target_name) else {
            return Ok(None);
        };
        MessageTarget::Channel(channel)
    } else {
        let Some(player) = session.players.by_name(&raw.target_name) else {
            return Ok(None);
        };
        if !player.loaded() {
            request_presence_chunked(session, &[player.id]);
        }
        MessageTarget::Player(player)
    };

    session.fast_read.store(true, Ordering::Release);
    debug!(from = %sender.name(), text = %raw.text, "message received");
    Ok(Some(ChatEvent { sender, text: raw.text, target }))
}

/// A positive remaining-silence duration marks the acting player silenced
/// and schedules a one-shot task to clear it once it elapses; zero (or
/// less) clears it immediately. Grounded on `bancho/packets.py::silence_info`.
fn handle_silence_end(session: &Arc<Session>, tasks: &TaskManager, seconds: i32) {
    if seconds > 0 {
        session.silenced.store(true, Ordering::Release);
        if let Some(player) = session.player() {
            player.set_silenced(true);
        }
        warn!(seconds, "silenced");

        let session = session.clone();
        tasks.register(
            Duration::from_secs(seconds as u64),
            false,
            false,
            Arc::new(move || {
                session.silenced.store(false, Ordering::Release);
                if let Some(player) = session.player() {
                    player.set_silenced(false);
                }
            }),
        );
    } else {
        session.silenced.store(false, Ordering::Release);
        if let Some(player) = session.player() {
            player.set_silenced(false);
        }
    }
}

fn handle_spectator_joined(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<i32> {
    let id = reader.read_i32()?;
    if let Some(player) = session.player() {
        player.add_spectator(id);
    }
    Ok(id)
}

fn handle_spectator_left(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<i32> {
    let id = reader.read_i32()?;
    if let Some(player) = session.player() {
        player.remove_spectator(id);
    }
    Ok(id)
}

/// Upserts the channel and, for `#osu` specifically, auto-joins it if not
/// already joined — the same call `ChannelAutoJoin` makes, just gated on
/// the channel actually being `#osu`. Grounded on
/// `bancho/packets.py::channel_info`.
fn handle_channel_info(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Arc<Channel>> {
    let name = reader.read_string()?;
    let topic = reader.read_string()?;
    let count = reader.read_i16()?;

    let channel = session.get_or_create_channel(&name);
    channel.set_user_count(count.max(0) as u32);
    *channel.topic.write() = Some(topic);

    if name == "#osu" && !channel.is_joined() {
        channel.join();
    }
    Ok(channel)
}

fn handle_channel_join_success(session: &Arc<Session>, reader: &mut ByteReader<'_>) -> Result<Arc<Channel>> {
    let name = reader.read_string()?;
    let channel = session.get_or_create_channel(&name);
    channel.mark_join_success();

    // `#osu` is the channel every logged-in user auto-joins, so it's the
    // one point where the whole pending-player backlog gets its presence
    // requested, in protocol-limited chunks of 255 ids.
    if name == "#osu" {
        let pending_ids: Vec<i32> = session.players.pending().iter().map(|p| p.id).collect();
        if !pending_ids.is_empty() {
            debug!(count = pending_ids.len(), "requesting presence for pending players");
            request_presence_chunked(session, &pending_ids);
        }
    }
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bancho_protocol::Encode;

    fn new_session() -> Arc<Session> {
        Session::new(1.0, 4.0, false)
    }

    #[test]
    fn login_reply_with_positive_id_creates_player() {
        let session = new_session();
        let mut writer = ByteWriter::new();
        writer.write_i32(1001);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        let player = handle_login_reply(&session, &mut reader).unwrap();
        assert_eq!(player.id, 1001);
        assert!(session.players.contains(1001));
        assert!(session.fast_read.load(Ordering::Acquire));
    }

    #[test]
    fn login_reply_with_negative_id_is_login_error() {
        let session = new_session();
        let mut writer = ByteWriter::new();
        writer.write_i32(-1);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        assert!(handle_login_reply(&session, &mut reader).is_err());
    }

    #[test]
    fn user_logout_clears_spectating_target() {
        let session = new_session();
        let target = Player::new(5);
        session.players.add(target.clone());
        session.set_spectating(Some(target));

        let mut writer = ByteWriter::new();
        writer.write_i32(5);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        handle_user_logout(&session, &mut reader).unwrap();

        assert!(session.players.by_id(5).is_none());
        assert!(session.spectating().is_none());
    }

    #[test]
    fn user_stats_stashes_previous_status() {
        let session = new_session();
        let player = Player::new(9);
        player.with_status_mut(|s| s.beatmap_id = 111);
        session.players.add(player);

        let mut writer = ByteWriter::new();
        writer.write_i32(9);
        Status { beatmap_id: 222, ..Status::default() }.encode(&mut writer);
        writer.write_i64(0);
        writer.write_f32(100.0);
        writer.write_i32(0);
        writer.write_i64(0);
        writer.write_i32(0);
        writer.write_i16(0);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        let player = handle_user_stats(&session, &mut reader).unwrap();

        assert_eq!(player.last_status().beatmap_id, 111);
        assert_eq!(player.status().beatmap_id, 222);
    }

    #[test]
    fn presence_bundle_requests_presence_for_unknown_ids() {
        let session = new_session();
        session.players.add(Player::new(1));

        let mut writer = ByteWriter::new();
        writer.write_intlist(&[1, 2, 3]);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        handle_presence_bundle(&session, &mut reader).unwrap();

        assert!(session.players.contains(2));
        assert!(session.players.contains(3));
        assert!(session.fast_read.load(Ordering::Acquire));
        assert!(!session.queue.is_empty());
    }

    #[test]
    fn presence_single_requests_only_when_newly_created() {
        let session = new_session();
        session.players.add(Player::new(1));

        let mut writer = ByteWriter::new();
        writer.write_i32(1);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        handle_presence_single(&session, &mut reader).unwrap();
        assert!(session.queue.is_empty());

        let mut writer = ByteWriter::new();
        writer.write_i32(2);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);
        handle_presence_single(&session, &mut reader).unwrap();
        assert!(!session.queue.is_empty());
    }

    #[test]
    fn silence_end_with_positive_seconds_silences_and_schedules_unsilence() {
        let session = new_session();
        let tasks = TaskManager::new();
        session.set_player(Player::new(1));

        handle_silence_end(&session, &tasks, 60);
        assert!(session.silenced.load(Ordering::Acquire));
        assert!(session.player().unwrap().silenced());
    }

    #[test]
    fn silence_end_with_zero_seconds_clears_silenced() {
        let session = new_session();
        session.set_player(Player::new(1));
        session.player().unwrap().set_silenced(true);
        session.silenced.store(true, Ordering::Release);
        let tasks = TaskManager::new();

        handle_silence_end(&session, &tasks, 0);
        assert!(!session.silenced.load(Ordering::Acquire));
        assert!(!session.player().unwrap().silenced());
    }

    #[test]
    fn send_message_resolves_sender_and_channel_target() {
        let session = new_session();
        session.players.add(Player::with_name(1, "cookiezi"));
        session.channels.add(Channel::new("#osu", session.queue.clone()));

        let mut writer = ByteWriter::new();
        writer.write_string("cookiezi");
        writer.write_string("hello");
        writer.write_string("#osu");
        writer.write_i32(1);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);

        let event = handle_send_message(&session, &mut reader).unwrap().unwrap();
        assert_eq!(event.sender.id, 1);
        assert_eq!(event.text, "hello");
        assert!(matches!(event.target, MessageTarget::Channel(_)));
    }

    #[test]
    fn send_message_with_unknown_sender_is_ignored() {
        let session = new_session();

        let mut writer = ByteWriter::new();
        writer.write_string("nobody");
        writer.write_string("hi");
        writer.write_string("#osu");
        writer.write_i32(404);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);

        assert!(handle_send_message(&session, &mut reader).unwrap().is_none());
    }

    #[test]
    fn channel_info_auto_joins_osu_when_not_joined() {
        let session = new_session();

        let mut writer = ByteWriter::new();
        writer.write_string("#osu");
        writer.write_string("general chat");
        writer.write_i16(5);
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);

        let channel = handle_channel_info(&session, &mut reader).unwrap();
        assert_eq!(channel.user_count(), 5);
        assert!(channel.is_joining());
    }

    #[test]
    fn channel_join_success_requests_pending_presence_for_osu() {
        let session = new_session();
        session.players.add(Player::new(42));

        let mut writer = ByteWriter::new();
        writer.write_string("#osu");
        let bytes = writer.into_bytes();
        let mut reader = ByteReader::new(&bytes);

        handle_channel_join_success(&session, &mut reader).unwrap();
        assert!(!session.queue.is_empty());
    }
}
