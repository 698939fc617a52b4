//! `USER_PRESENCE` payload, grounded on `bancho/packets.py::presence`.

use crate::error::Result;
use crate::privileges::Privileges;
use crate::status::Mode;
use crate::stream::{ByteReader, ByteWriter, Decode, Encode};

/// Raw contents of a `USER_PRESENCE` packet. Decoding this does not by
/// itself create or update a `Player` — the caller folds it into whatever
/// player collection it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: i32,
    pub name: String,
    pub timezone: i16,
    pub country_code: u8,
    pub privileges: Privileges,
    pub mode: Mode,
    pub longitude: f32,
    pub latitude: f32,
    pub rank: i32,
}

/// Splits the packed presence byte into privileges (low 5 bits) and mode
/// (bits 5-7, clamped into `[0, 3]`). See DESIGN.md for why this clears
/// `0xE0` rather than reproducing the original's `byte & -255` literally.
fn unpack_presence_byte(byte: u8) -> (Privileges, Mode) {
    let privileges = Privileges::from_bits_truncate(byte & !0xE0);
    let mode = Mode::from_clamped((byte & 0xE0) >> 5);
    (privileges, mode)
}

fn pack_presence_byte(privileges: Privileges, mode: Mode) -> u8 {
    (privileges.bits() & !0xE0) | ((mode as u8) << 5)
}

impl Decode for Presence {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let user_id = reader.read_i32()?;
        let name = reader.read_string()?;
        let timezone = i16::from(reader.read_u8()?) - 24;
        let country_code = reader.read_u8()?;
        let (privileges, mode) = unpack_presence_byte(reader.read_u8()?);
        let longitude = reader.read_f32()?;
        let latitude = reader.read_f32()?;
        let rank = reader.read_i32()?;

        Ok(Self {
            user_id,
            name,
            timezone,
            country_code,
            privileges,
            mode,
            longitude,
            latitude,
            rank,
        })
    }
}

impl Encode for Presence {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i32(self.user_id);
        writer.write_string(&self.name);
        writer.write_u8((self.timezone + 24) as u8);
        writer.write_u8(self.country_code);
        writer.write_u8(pack_presence_byte(self.privileges, self.mode));
        writer.write_f32(self.longitude);
        writer.write_f32(self.latitude);
        writer.write_i32(self.rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_clears_only_mode_bits() {
        let byte = 0b0010_0101; // mode = 1 (Taiko), privileges bits 0,2 set
        let (privileges, mode) = unpack_presence_byte(byte);
        assert_eq!(mode, Mode::Taiko);
        assert_eq!(privileges.bits(), 0b0000_0101);
    }

    #[test]
    fn round_trip() {
        let presence = Presence {
            user_id: 1001,
            name: "cookiezi".into(),
            timezone: 2,
            country_code: 14,
            privileges: Privileges::NORMAL | Privileges::SUPPORTER,
            mode: Mode::Osu,
            longitude: 12.5,
            latitude: -3.25,
            rank: 42,
        };

        let mut w = ByteWriter::new();
        presence.encode(&mut w);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(Presence::decode(&mut r).unwrap(), presence);
    }
}
