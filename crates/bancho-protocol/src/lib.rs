//! Wire codec and domain structs for the bancho binary protocol: the
//! primitive byte streams, packet framing, packet-id tables and the
//! payload types carried by built-in packets.

pub mod beatmap;
pub mod error;
pub mod filter;
pub mod frame;
pub mod ids;
pub mod login;
pub mod mods;
pub mod multiplayer;
pub mod presence;
pub mod privileges;
pub mod replay;
pub mod status;
pub mod stream;

pub use beatmap::{BeatmapInfo, Grade};
pub use error::{ProtocolError, Result};
pub use filter::PresenceFilter;
pub use frame::{decode_packet, decode_packet_stream, encode_packet, Compressor, RawPacket};
pub use ids::{ClientPacketId, ServerPacketId};
pub use login::LoginError;
pub use mods::Mods;
pub use multiplayer::{Match, MatchScoringType, MatchTeamType, MatchType, Slot, SlotStatus, SlotTeam};
pub use presence::Presence;
pub use privileges::Privileges;
pub use replay::{ButtonState, ReplayAction, ReplayFrame, ScoreFrame, SpectateFrameBundle};
pub use status::{Mode, Status, StatusAction};
pub use stream::{ByteReader, ByteWriter, Decode, Encode};
