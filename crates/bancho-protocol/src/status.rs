//! Player status: what a player is currently doing, grounded on
//! `objects/status.py` and the field order used by `USER_STATS`/`CHANGE_ACTION`.

use crate::error::{ProtocolError, Result};
use crate::mods::Mods;
use crate::stream::{ByteReader, ByteWriter, Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusAction {
    Idle = 0,
    Afk = 1,
    Playing = 2,
    Editing = 3,
    Modding = 4,
    Multiplayer = 5,
    Watching = 6,
    Unknown = 7,
    Testing = 8,
    Submitting = 9,
    Paused = 10,
    Lobby = 11,
    Multiplaying = 12,
    OsuDirect = 13,
}

impl StatusAction {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Idle,
            1 => Self::Afk,
            2 => Self::Playing,
            3 => Self::Editing,
            4 => Self::Modding,
            5 => Self::Multiplayer,
            6 => Self::Watching,
            7 => Self::Unknown,
            8 => Self::Testing,
            9 => Self::Submitting,
            10 => Self::Paused,
            11 => Self::Lobby,
            12 => Self::Multiplaying,
            13 => Self::OsuDirect,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "StatusAction",
                    value: i64::from(other),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    Osu = 0,
    Taiko = 1,
    CatchTheBeat = 2,
    OsuMania = 3,
}

impl Mode {
    /// The reference client clamps whatever comes off the wire into
    /// `[0, 3]` instead of rejecting it outright.
    pub fn from_clamped(value: u8) -> Self {
        match value.min(3) {
            0 => Self::Osu,
            1 => Self::Taiko,
            2 => Self::CatchTheBeat,
            _ => Self::OsuMania,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub action: StatusAction,
    pub text: String,
    pub checksum: String,
    pub mods: Mods,
    pub mode: Mode,
    pub beatmap_id: i32,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            action: StatusAction::Idle,
            text: String::new(),
            checksum: String::new(),
            mods: Mods::NO_MOD,
            mode: Mode::Osu,
            beatmap_id: 0,
        }
    }
}

impl Status {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Decode for Status {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let action = StatusAction::from_u8(reader.read_u8()?)?;
        let text = reader.read_string()?;
        let checksum = reader.read_string()?;
        let mods = Mods::from_bits_retain(reader.read_u32()?);
        let mode = Mode::from_clamped(reader.read_u8()?);
        let beatmap_id = reader.read_i32()?;
        Ok(Self {
            action,
            text,
            checksum,
            mods,
            mode,
            beatmap_id,
        })
    }
}

impl Encode for Status {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u8(self.action as u8);
        writer.write_string(&self.text);
        writer.write_string(&self.checksum);
        writer.write_u32(self.mods.bits());
        writer.write_u8(self.mode as u8);
        writer.write_i32(self.beatmap_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_idle() {
        let status = Status::default();
        assert_eq!(status.action, StatusAction::Idle);
        assert_eq!(status.mode, Mode::Osu);
    }

    #[test]
    fn round_trip() {
        let status = Status {
            action: StatusAction::Playing,
            text: "UNDEAD CORPORATION".into(),
            checksum: "a84050da9b68ca1bd8e2d1700b9c6ca5".into(),
            mods: Mods::HIDDEN | Mods::HARD_ROCK,
            mode: Mode::Osu,
            beatmap_id: 555_797,
        };

        let mut w = ByteWriter::new();
        status.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(Status::decode(&mut r).unwrap(), status);
    }

    #[test]
    fn mode_clamps_out_of_range_values() {
        assert_eq!(Mode::from_clamped(200), Mode::OsuMania);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut status = Status {
            action: StatusAction::Playing,
            text: "x".into(),
            ..Status::default()
        };
        status.reset();
        assert_eq!(status, Status::default());
    }
}
