//! Packet framing: a fixed 7-byte header (u16 packet id, u8 compression
//! flag, u32 payload length) followed by the payload, optionally
//! compressed. HTTP transport uses zlib; TCP transport uses gzip — both
//! stay available side by side (see DESIGN.md for why).

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{ProtocolError, Result};

pub const HEADER_LEN: usize = 7;

/// Raw framed packet: id, whether the payload on the wire was compressed,
/// and the decompressed payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub id: u16,
    pub payload: Vec<u8>,
}

/// How a transport compresses packet payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    None,
    Zlib,
    Gzip,
}

impl Compressor {
    fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compressor::None => Ok(data.to_vec()),
            Compressor::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Compressor::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
        }
    }

    fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Compressor::None => out.extend_from_slice(data),
            Compressor::Zlib => {
                ZlibDecoder::new(data).read_to_end(&mut out)?;
            }
            Compressor::Gzip => {
                GzDecoder::new(data).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

/// Encode one packet's header + (optionally compressed) payload.
pub fn encode_packet(id: u16, payload: &[u8], compressor: Compressor) -> Result<Vec<u8>> {
    let compressed_flag = !matches!(compressor, Compressor::None);
    let body = compressor.compress(payload)?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.write_u16::<LittleEndian>(id)?;
    out.write_u8(u8::from(compressed_flag))?;
    out.write_u32::<LittleEndian>(body.len() as u32)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode exactly one packet from the front of `data`, returning the
/// packet and the number of bytes consumed. The compression flag on the
/// wire decides whether `decompressor` actually runs.
pub fn decode_packet(data: &[u8], decompressor: Compressor) -> Result<(RawPacket, usize)> {
    if data.len() < HEADER_LEN {
        return Err(ProtocolError::UnexpectedEof {
            needed: HEADER_LEN,
            available: data.len(),
        });
    }

    let mut header = &data[..HEADER_LEN];
    let id = header.read_u16::<LittleEndian>()?;
    let compressed = header.read_u8()? != 0;
    let len = header.read_u32::<LittleEndian>()? as usize;

    let total = HEADER_LEN + len;
    if data.len() < total {
        return Err(ProtocolError::UnexpectedEof {
            needed: total,
            available: data.len(),
        });
    }

    let body = &data[HEADER_LEN..total];
    let payload = if compressed {
        decompressor.decompress(body)?
    } else {
        body.to_vec()
    };

    Ok((RawPacket { id, payload }, total))
}

/// Decode every complete packet present in `data`, stopping (without
/// erroring) at the first incomplete trailing frame.
pub fn decode_packet_stream(mut data: &[u8], decompressor: Compressor) -> Result<Vec<RawPacket>> {
    let mut packets = Vec::new();
    loop {
        if data.len() < HEADER_LEN {
            break;
        }
        let declared_len = u32::from_le_bytes([data[3], data[4], data[5], data[6]]) as usize;
        if data.len() < HEADER_LEN + declared_len {
            break;
        }
        let (packet, consumed) = decode_packet(data, decompressor)?;
        packets.push(packet);
        data = &data[consumed..];
    }
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_uncompressed() {
        let payload = b"hello bancho";
        let frame = encode_packet(5, payload, Compressor::None).unwrap();
        let (packet, consumed) = decode_packet(&frame, Compressor::None).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(packet.id, 5);
        assert_eq!(packet.payload, payload);
    }

    #[test]
    fn round_trip_zlib() {
        let payload = b"a repeated repeated repeated payload";
        let frame = encode_packet(83, payload, Compressor::Zlib).unwrap();
        let (packet, _) = decode_packet(&frame, Compressor::Zlib).unwrap();
        assert_eq!(packet.payload, payload);
    }

    #[test]
    fn round_trip_gzip() {
        let payload = b"a repeated repeated repeated payload";
        let frame = encode_packet(83, payload, Compressor::Gzip).unwrap();
        let (packet, _) = decode_packet(&frame, Compressor::Gzip).unwrap();
        assert_eq!(packet.payload, payload);
    }

    #[test]
    fn stream_of_n_packets_decodes_in_order() {
        let mut buf = Vec::new();
        buf.extend(encode_packet(1, b"one", Compressor::None).unwrap());
        buf.extend(encode_packet(2, b"two", Compressor::None).unwrap());
        buf.extend(encode_packet(3, b"", Compressor::None).unwrap());

        let packets = decode_packet_stream(&buf, Compressor::None).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].id, 1);
        assert_eq!(packets[1].payload, b"two");
        assert_eq!(packets[2].payload, b"");
    }

    #[test]
    fn stream_stops_at_incomplete_trailing_frame() {
        let mut buf = encode_packet(1, b"one", Compressor::None).unwrap();
        buf.extend(encode_packet(2, b"two", Compressor::None).unwrap());
        buf.truncate(buf.len() - 2); // chop the tail off packet 2

        let packets = decode_packet_stream(&buf, Compressor::None).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id, 1);
    }

    #[test]
    fn short_header_is_unexpected_eof() {
        let buf = [0u8; 3];
        assert!(matches!(
            decode_packet(&buf, Compressor::None),
            Err(ProtocolError::UnexpectedEof { needed: HEADER_LEN, available: 3 })
        ));
    }
}
