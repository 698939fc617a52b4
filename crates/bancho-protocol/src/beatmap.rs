//! `BEATMAP_INFO_REPLY` payload, grounded on `objects/beatmap.py`.

use crate::error::{ProtocolError, Result};
use crate::stream::{ByteReader, ByteWriter, Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Grade {
    Xh = 0,
    Sh = 1,
    X = 2,
    S = 3,
    A = 4,
    B = 5,
    C = 6,
    D = 7,
    F = 8,
    N = 9,
}

impl Grade {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Xh,
            1 => Self::Sh,
            2 => Self::X,
            3 => Self::S,
            4 => Self::A,
            5 => Self::B,
            6 => Self::C,
            7 => Self::D,
            8 => Self::F,
            9 => Self::N,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "Grade",
                    value: i64::from(other),
                })
            }
        })
    }
}

impl Decode for Grade {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Self::from_u8(reader.read_u8()?)
    }
}

impl Encode for Grade {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u8(*self as u8);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatmapInfo {
    pub id: i16,
    pub beatmap_id: i32,
    pub beatmapset_id: i32,
    pub thread_id: i32,
    pub ranked: u8,
    pub osu_rank: Grade,
    pub fruits_rank: Grade,
    pub taiko_rank: Grade,
    pub mania_rank: Grade,
    pub checksum: String,
}

impl Decode for BeatmapInfo {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            id: reader.read_i16()?,
            beatmap_id: reader.read_i32()?,
            beatmapset_id: reader.read_i32()?,
            thread_id: reader.read_i32()?,
            ranked: reader.read_u8()?,
            osu_rank: Grade::decode(reader)?,
            fruits_rank: Grade::decode(reader)?,
            taiko_rank: Grade::decode(reader)?,
            mania_rank: Grade::decode(reader)?,
            checksum: reader.read_string()?,
        })
    }
}

impl Encode for BeatmapInfo {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i16(self.id);
        writer.write_i32(self.beatmap_id);
        writer.write_i32(self.beatmapset_id);
        writer.write_i32(self.thread_id);
        writer.write_u8(self.ranked);
        self.osu_rank.encode(writer);
        self.fruits_rank.encode(writer);
        self.taiko_rank.encode(writer);
        self.mania_rank.encode(writer);
        writer.write_string(&self.checksum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let info = BeatmapInfo {
            id: 42,
            beatmap_id: 555_797,
            beatmapset_id: 241_526,
            thread_id: 0,
            ranked: 1,
            osu_rank: Grade::Sh,
            fruits_rank: Grade::N,
            taiko_rank: Grade::N,
            mania_rank: Grade::N,
            checksum: "a84050da9b68ca1bd8e2d1700b9c6ca5".into(),
        };

        let mut w = ByteWriter::new();
        info.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(BeatmapInfo::decode(&mut r).unwrap(), info);
    }

    #[test]
    fn invalid_grade_is_malformed() {
        assert!(matches!(
            Grade::from_u8(200),
            Err(ProtocolError::InvalidEnumValue { .. })
        ));
    }
}
