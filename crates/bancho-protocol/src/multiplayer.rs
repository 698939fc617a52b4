//! Multiplayer match/slot state, grounded on `objects/match.py`.
//!
//! Module is named `multiplayer` rather than `match` because the latter is
//! a reserved word.

use bitflags::bitflags;

use crate::error::{ProtocolError, Result};
use crate::mods::Mods;
use crate::status::Mode;
use crate::stream::{ByteReader, ByteWriter, Decode, Encode};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SlotStatus: u8 {
        const OPEN      = 1 << 0;
        const LOCKED    = 1 << 1;
        const NOT_READY = 1 << 2;
        const READY     = 1 << 3;
        const NO_MAP    = 1 << 4;
        const PLAYING   = 1 << 5;
        const COMPLETE  = 1 << 6;
        const QUIT      = 1 << 7;
        const HAS_PLAYER = Self::NOT_READY.bits()
            | Self::READY.bits()
            | Self::NO_MAP.bits()
            | Self::PLAYING.bits()
            | Self::COMPLETE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SlotTeam {
    Neutral = 0,
    Blue = 1,
    Red = 2,
}

impl SlotTeam {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Neutral,
            1 => Self::Blue,
            2 => Self::Red,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "SlotTeam",
                    value: i64::from(other),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MatchType {
    Standard = 0,
    Powerplay = 1,
}

impl MatchType {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Standard,
            1 => Self::Powerplay,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "MatchType",
                    value: i64::from(other),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MatchScoringType {
    Score = 0,
    Accuracy = 1,
    Combo = 2,
    ScoreV2 = 3,
}

impl MatchScoringType {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Score,
            1 => Self::Accuracy,
            2 => Self::Combo,
            3 => Self::ScoreV2,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "MatchScoringType",
                    value: i64::from(other),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MatchTeamType {
    HeadToHead = 0,
    TagCoop = 1,
    TeamVs = 2,
    TagTeamVs = 3,
}

impl MatchTeamType {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::HeadToHead,
            1 => Self::TagCoop,
            2 => Self::TeamVs,
            3 => Self::TagTeamVs,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "MatchTeamType",
                    value: i64::from(other),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub player_id: i32,
    pub status: SlotStatus,
    pub team: SlotTeam,
    pub mods: Mods,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            player_id: -1,
            status: SlotStatus::LOCKED,
            team: SlotTeam::Neutral,
            mods: Mods::NO_MOD,
        }
    }
}

impl Slot {
    pub fn has_player(&self) -> bool {
        self.status.intersects(SlotStatus::HAS_PLAYER)
    }

    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::OPEN
    }

    pub fn is_ready(&self) -> bool {
        self.status == SlotStatus::READY
    }
}

pub const DEFAULT_SLOT_COUNT: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: u16,
    pub in_progress: bool,
    pub match_type: MatchType,
    pub mods: Mods,
    pub name: String,
    pub password: String,
    pub beatmap_text: String,
    pub beatmap_id: i32,
    pub beatmap_checksum: String,
    pub host_id: i32,
    pub mode: Mode,
    pub scoring_type: MatchScoringType,
    pub team_type: MatchTeamType,
    pub freemod: bool,
    pub slots: Vec<Slot>,
    pub seed: i32,
}

impl Match {
    /// A freshly created match, as the client builds it before `CREATE_MATCH`.
    pub fn new(name: String, password: String, host_id: i32) -> Self {
        Self {
            id: 0,
            in_progress: false,
            match_type: MatchType::Standard,
            mods: Mods::NO_MOD,
            name,
            password,
            beatmap_text: String::new(),
            beatmap_id: -1,
            beatmap_checksum: String::new(),
            host_id,
            mode: Mode::Osu,
            scoring_type: MatchScoringType::Score,
            team_type: MatchTeamType::HeadToHead,
            freemod: false,
            slots: vec![Slot::default(); DEFAULT_SLOT_COUNT],
            seed: 0,
        }
    }

    pub fn decode_with_slots(reader: &mut ByteReader<'_>, amount_slots: usize) -> Result<Self> {
        let id = reader.read_u16()?;
        let in_progress = reader.read_bool()?;
        let match_type = MatchType::from_u8(reader.read_u8()?)?;
        let mods = Mods::from_bits_retain(reader.read_u32()?);

        let name = reader.read_string()?;
        let password = reader.read_string()?;

        let beatmap_text = reader.read_string()?;
        let beatmap_id = reader.read_i32()?;
        let beatmap_checksum = reader.read_string()?;

        let mut slot_status = Vec::with_capacity(amount_slots);
        for _ in 0..amount_slots {
            slot_status.push(SlotStatus::from_bits_retain(reader.read_u8()?));
        }

        let slot_team = (0..amount_slots)
            .map(|_| SlotTeam::from_u8(reader.read_u8()?))
            .collect::<Result<Vec<_>>>()?;

        let mut slot_ids = Vec::with_capacity(amount_slots);
        for status in &slot_status {
            if status.intersects(SlotStatus::HAS_PLAYER) {
                slot_ids.push(reader.read_i32()?);
            } else {
                slot_ids.push(-1);
            }
        }

        let host_id = reader.read_i32()?;
        let mode = Mode::from_clamped(reader.read_u8()?);

        let scoring_type = MatchScoringType::from_u8(reader.read_u8()?)?;
        let team_type = MatchTeamType::from_u8(reader.read_u8()?)?;

        let freemod = reader.read_bool()?;
        let slot_mods = if freemod {
            let mut mods = Vec::with_capacity(amount_slots);
            for _ in 0..amount_slots {
                mods.push(Mods::from_bits_retain(reader.read_u32()?));
            }
            mods
        } else {
            vec![Mods::NO_MOD; amount_slots]
        };

        let slots = (0..amount_slots)
            .map(|i| Slot {
                player_id: slot_ids[i],
                status: slot_status[i],
                team: slot_team[i],
                mods: slot_mods[i],
            })
            .collect();

        let seed = reader.read_i32()?;

        Ok(Self {
            id,
            in_progress,
            match_type,
            mods,
            name,
            password,
            beatmap_text,
            beatmap_id,
            beatmap_checksum,
            host_id,
            mode,
            scoring_type,
            team_type,
            freemod,
            slots,
            seed,
        })
    }
}

impl Decode for Match {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Self::decode_with_slots(reader, DEFAULT_SLOT_COUNT)
    }
}

impl Encode for Match {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u16(self.id);
        writer.write_bool(self.in_progress);
        writer.write_u8(self.match_type as u8);
        writer.write_u32(self.mods.bits());

        writer.write_string(&self.name);
        writer.write_string(&self.password);
        writer.write_string(&self.beatmap_text);
        writer.write_i32(self.beatmap_id);
        writer.write_string(&self.beatmap_checksum);

        for slot in &self.slots {
            writer.write_u8(slot.status.bits());
        }
        for slot in &self.slots {
            writer.write_u8(slot.team as u8);
        }
        for slot in &self.slots {
            if slot.has_player() {
                writer.write_i32(slot.player_id);
            }
        }

        writer.write_i32(self.host_id);
        writer.write_u8(self.mode as u8);
        writer.write_u8(self.scoring_type as u8);
        writer.write_u8(self.team_type as u8);

        writer.write_bool(self.freemod);
        if self.freemod {
            for slot in &self.slots {
                writer.write_u32(slot.mods.bits());
            }
        }

        writer.write_i32(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_has_player_matches_status_invariant() {
        let open = Slot {
            status: SlotStatus::OPEN,
            ..Slot::default()
        };
        let ready = Slot {
            status: SlotStatus::READY,
            ..Slot::default()
        };
        assert!(!open.has_player());
        assert!(ready.has_player());
    }

    #[test]
    fn match_round_trip_without_freemod() {
        let mut m = Match::new("cookiezi's game".into(), String::new(), 1001);
        m.slots[0] = Slot {
            player_id: 1001,
            status: SlotStatus::NOT_READY,
            team: SlotTeam::Neutral,
            mods: Mods::NO_MOD,
        };

        let mut w = ByteWriter::new();
        m.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let decoded = Match::decode(&mut r).unwrap();
        assert_eq!(decoded, m);
    }

    #[test]
    fn match_round_trip_with_freemod() {
        let mut m = Match::new("freemod lobby".into(), "secret".into(), 5);
        m.freemod = true;
        m.slots[0] = Slot {
            player_id: 5,
            status: SlotStatus::READY,
            team: SlotTeam::Blue,
            mods: Mods::HIDDEN,
        };

        let mut w = ByteWriter::new();
        m.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let decoded = Match::decode(&mut r).unwrap();
        assert_eq!(decoded, m);
        assert_eq!(decoded.slots[0].mods, Mods::HIDDEN);
    }
}
