//! Persistent TCP transport, grounded on `tcp/bancho.py::TcpBanchoClient`.
//! No adaptive pacing here — `dequeue` blocks directly on the socket
//! instead of sleeping between polls, and frames are gzip- rather than
//! zlib-compressed.

use flate2::read::GzDecoder;
use std::io::Read as _;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::Result;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self { stream })
    }

    /// Sends the login body (`username\r\npassword_hash\r\nclient\r\n`,
    /// matching the reference client's `\r\n` line endings on the TCP
    /// transport specifically).
    pub async fn login(&mut self, body: String) -> Result<()> {
        self.stream.write_all(body.as_bytes()).await?;
        Ok(())
    }

    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !data.is_empty() {
            self.stream.write_all(data).await?;
        }
        Ok(())
    }

    /// Blocks for exactly one packet: a 7-byte header (`u16` id, `bool`
    /// compressed, `u32` length) followed by that many payload bytes,
    /// gzip-inflated if the compression flag is set.
    pub async fn read_packet(&mut self) -> Result<(u16, Vec<u8>)> {
        let mut header = [0u8; 7];
        self.stream.read_exact(&mut header).await?;

        let id = u16::from_le_bytes([header[0], header[1]]);
        let compressed = header[2] != 0;
        let len = u32::from_le_bytes([header[3], header[4], header[5], header[6]]) as usize;

        let mut payload = vec![0u8; len];
        if len > 0 {
            self.stream.read_exact(&mut payload).await?;
        }

        if compressed {
            let mut decoder = GzDecoder::new(payload.as_slice());
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            payload = decompressed;
        }

        Ok((id, payload))
    }
}
