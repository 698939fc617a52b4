//! Spectator replay data, grounded on `objects/replays.py` and the
//! `SPECTATE_FRAMES` handler in `bancho/packets.py`.

use bitflags::bitflags;

use crate::error::{ProtocolError, Result};
use crate::stream::{ByteReader, ByteWriter, Decode, Encode};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ButtonState: u8 {
        const NO_BUTTONS = 0;
        const LEFT1      = 1 << 0;
        const RIGHT1     = 1 << 1;
        const LEFT2      = 1 << 2;
        const RIGHT2     = 1 << 3;
        const SMOKE      = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReplayAction {
    Standard = 0,
    NewSong = 1,
    Skip = 2,
    Completion = 3,
    Fail = 4,
    Pause = 5,
    Unpause = 6,
    SongSelect = 7,
    WatchingOther = 8,
}

impl ReplayAction {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Standard,
            1 => Self::NewSong,
            2 => Self::Skip,
            3 => Self::Completion,
            4 => Self::Fail,
            5 => Self::Pause,
            6 => Self::Unpause,
            7 => Self::SongSelect,
            8 => Self::WatchingOther,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "ReplayAction",
                    value: i64::from(other),
                })
            }
        })
    }
}

/// A single frame of replay input.
///
/// The reference client has an odd back-compat fold here: a trailing
/// signed byte greater than zero implies `RIGHT1` even if the button-state
/// byte didn't set it. Kept as-is, it is load-bearing for older clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayFrame {
    pub button_state: ButtonState,
    pub time: i32,
    pub x: f32,
    pub y: f32,
}

impl Decode for ReplayFrame {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let mut button_state = ButtonState::from_bits_truncate(reader.read_u8()?);
        if reader.read_i8()? > 0 {
            button_state |= ButtonState::RIGHT1;
        }
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let time = reader.read_i32()?;
        Ok(Self {
            button_state,
            time,
            x,
            y,
        })
    }
}

impl Encode for ReplayFrame {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u8(self.button_state.bits());
        writer.write_i8(0);
        writer.write_f32(self.x);
        writer.write_f32(self.y);
        writer.write_i32(self.time);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFrame {
    pub time: i32,
    pub id: u8,
    pub c300: u16,
    pub c100: u16,
    pub c50: u16,
    pub c_geki: u16,
    pub c_katu: u16,
    pub c_miss: u16,
    pub total_score: i32,
    pub max_combo: u16,
    pub current_combo: u16,
    pub perfect: bool,
    pub current_hp: u8,
    pub tag_byte: u8,
    pub score_v2: bool,
    pub combo_portion: f32,
    pub bonus_portion: f32,
}

impl ScoreFrame {
    pub fn total_hits(&self) -> u32 {
        u32::from(self.c50) + u32::from(self.c100) + u32::from(self.c300) + u32::from(self.c_miss)
    }
}

impl Decode for ScoreFrame {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let time = reader.read_i32()?;
        let id = reader.read_u8()?;
        let c300 = reader.read_u16()?;
        let c100 = reader.read_u16()?;
        let c50 = reader.read_u16()?;
        let c_geki = reader.read_u16()?;
        let c_katu = reader.read_u16()?;
        let c_miss = reader.read_u16()?;
        let total_score = reader.read_i32()?;
        let max_combo = reader.read_u16()?;
        let current_combo = reader.read_u16()?;
        let perfect = reader.read_bool()?;
        let current_hp = reader.read_u8()?;
        let tag_byte = reader.read_u8()?;
        let score_v2 = reader.read_bool()?;
        let (combo_portion, bonus_portion) = if score_v2 {
            (reader.read_f32()?, reader.read_f32()?)
        } else {
            (0.0, 0.0)
        };

        Ok(Self {
            time,
            id,
            c300,
            c100,
            c50,
            c_geki,
            c_katu,
            c_miss,
            total_score,
            max_combo,
            current_combo,
            perfect,
            current_hp,
            tag_byte,
            score_v2,
            combo_portion,
            bonus_portion,
        })
    }
}

impl Encode for ScoreFrame {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i32(self.time);
        writer.write_u8(self.id);
        writer.write_u16(self.c300);
        writer.write_u16(self.c100);
        writer.write_u16(self.c50);
        writer.write_u16(self.c_geki);
        writer.write_u16(self.c_katu);
        writer.write_u16(self.c_miss);
        writer.write_i32(self.total_score);
        writer.write_u16(self.max_combo);
        writer.write_u16(self.current_combo);
        writer.write_bool(self.perfect);
        writer.write_u8(self.current_hp);
        writer.write_u8(self.tag_byte);
        writer.write_bool(self.score_v2);
        if self.score_v2 {
            writer.write_f32(self.combo_portion);
            writer.write_f32(self.bonus_portion);
        }
    }
}

/// The payload of a `SPECTATE_FRAMES` packet: an opaque extra field, a
/// batch of input frames, the action that ended the batch, and an
/// optional trailing score snapshot — optional because older clients
/// sometimes omit it entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectateFrameBundle {
    pub extra: i32,
    pub frames: Vec<ReplayFrame>,
    pub action: ReplayAction,
    pub score_frame: Option<ScoreFrame>,
}

impl Decode for SpectateFrameBundle {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let extra = reader.read_i32()?;
        let count = reader.read_u16()?;
        let mut frames = Vec::with_capacity(count as usize);
        for _ in 0..count {
            frames.push(ReplayFrame::decode(reader)?);
        }
        let action = ReplayAction::from_u8(reader.read_u8()?)?;

        let score_frame = match ScoreFrame::decode(reader) {
            Ok(frame) => Some(frame),
            Err(ProtocolError::UnexpectedEof { .. }) => None,
            Err(other) => return Err(other),
        };

        Ok(Self {
            extra,
            frames,
            action,
            score_frame,
        })
    }
}

impl Encode for SpectateFrameBundle {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i32(self.extra);
        writer.write_u16(self.frames.len() as u16);
        for frame in &self.frames {
            frame.encode(writer);
        }
        writer.write_u8(self.action as u8);
        if let Some(score_frame) = &self.score_frame {
            score_frame.encode(writer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_frame_round_trip() {
        let frame = ReplayFrame {
            button_state: ButtonState::LEFT1 | ButtonState::SMOKE,
            time: 1234,
            x: 100.5,
            y: -50.25,
        };
        let mut w = ByteWriter::new();
        frame.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(ReplayFrame::decode(&mut r).unwrap(), frame);
    }

    #[test]
    fn score_frame_v1_has_zeroed_portions() {
        let mut w = ByteWriter::new();
        w.write_i32(100);
        w.write_u8(1);
        for _ in 0..6 {
            w.write_u16(0);
        }
        w.write_i32(0);
        w.write_u16(0);
        w.write_u16(0);
        w.write_bool(true);
        w.write_u8(100);
        w.write_u8(0);
        w.write_bool(false);

        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let frame = ScoreFrame::decode(&mut r).unwrap();
        assert!(!frame.score_v2);
        assert_eq!(frame.combo_portion, 0.0);
    }

    #[test]
    fn spectate_frame_bundle_without_trailing_score_frame() {
        let mut w = ByteWriter::new();
        w.write_i32(0);
        w.write_u16(0); // no frames
        w.write_u8(ReplayAction::Completion as u8);
        // deliberately no trailing ScoreFrame bytes

        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let bundle = SpectateFrameBundle::decode(&mut r).unwrap();
        assert_eq!(bundle.action, ReplayAction::Completion);
        assert!(bundle.score_frame.is_none());
    }

    #[test]
    fn spectate_frame_bundle_with_frames_and_score_frame() {
        let frame = ReplayFrame {
            button_state: ButtonState::NO_BUTTONS,
            time: 10,
            x: 1.0,
            y: 2.0,
        };
        let score_frame = ScoreFrame {
            time: 10,
            id: 0,
            c300: 1,
            c100: 0,
            c50: 0,
            c_geki: 0,
            c_katu: 0,
            c_miss: 0,
            total_score: 300,
            max_combo: 1,
            current_combo: 1,
            perfect: true,
            current_hp: 200,
            tag_byte: 0,
            score_v2: false,
            combo_portion: 0.0,
            bonus_portion: 0.0,
        };
        let bundle = SpectateFrameBundle {
            extra: 7,
            frames: vec![frame],
            action: ReplayAction::Standard,
            score_frame: Some(score_frame),
        };

        let mut w = ByteWriter::new();
        bundle.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(SpectateFrameBundle::decode(&mut r).unwrap(), bundle);
    }
}
