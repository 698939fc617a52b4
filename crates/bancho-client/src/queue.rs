//! Outbound send queue: a FIFO of already-framed byte buffers, safe to
//! push to from any thread. Grounded on `bancho/client.py`'s `enqueue`
//! (a `queue.Queue` of encoded packets) — `parking_lot::Mutex` stands in
//! for the GIL-backed queue.

use std::collections::VecDeque;
use std::sync::Arc;

use bancho_protocol::{encode_packet, ClientPacketId, Compressor};
use parking_lot::Mutex;

/// Anything that can accept an outbound packet. `Player`/`Channel` handles
/// hold one of these so their convenience methods (`Channel::leave`,
/// `Channel::send_message`) can enqueue without reaching back into the
/// session facade.
pub trait OutboundSink: Send + Sync {
    fn enqueue(&self, id: ClientPacketId, payload: Vec<u8>);
}

#[derive(Default)]
pub struct OutboundQueue {
    frames: Mutex<VecDeque<Vec<u8>>>,
}

impl OutboundQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Frames the payload (outbound packets are never compressed, matching
    /// `BanchoClient.enqueue`'s `stream.bool(False)`) and appends it.
    pub fn push(&self, id: ClientPacketId, payload: &[u8]) {
        let frame = encode_packet(id.as_u16(), payload, Compressor::None)
            .expect("encoding an outbound frame never fails");
        self.frames.lock().push_back(frame);
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Drains every queued frame into one contiguous buffer (the shape
    /// the HTTP transport's `dequeue` POSTs).
    pub fn drain_concat(&self) -> Vec<u8> {
        let mut frames = self.frames.lock();
        let mut out = Vec::new();
        while let Some(frame) = frames.pop_front() {
            out.extend(frame);
        }
        out
    }
}

impl OutboundSink for OutboundQueue {
    fn enqueue(&self, id: ClientPacketId, payload: Vec<u8>) {
        self.push(id, &payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_concat_preserves_fifo_order() {
        let queue = OutboundQueue::new();
        queue.push(ClientPacketId::Ping, &[]);
        queue.push(ClientPacketId::Logout, &[0, 0, 0, 0]);

        let drained = queue.drain_concat();
        assert!(queue.is_empty());
        // ping header (7 bytes, no payload) followed by logout header+payload
        assert_eq!(drained.len(), 7 + 11);
        assert_eq!(&drained[0..2], &ClientPacketId::Ping.as_u16().to_le_bytes());
    }
}
