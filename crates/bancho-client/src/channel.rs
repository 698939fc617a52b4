//! Stateful channel handle, grounded on `objects/channel.py`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use bancho_protocol::{ByteWriter, ClientPacketId};
use tracing::info;

use crate::queue::OutboundSink;

pub struct Channel {
    pub name: String,
    pub topic: parking_lot::RwLock<Option<String>>,
    user_count: AtomicU32,
    joined: AtomicBool,
    joining: AtomicBool,
    sink: Arc<dyn OutboundSink>,
}

impl Channel {
    pub fn new(name: impl Into<String>, sink: Arc<dyn OutboundSink>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            topic: parking_lot::RwLock::new(None),
            user_count: AtomicU32::new(0),
            joined: AtomicBool::new(false),
            joining: AtomicBool::new(false),
            sink,
        })
    }

    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::Acquire)
    }

    pub fn is_joining(&self) -> bool {
        self.joining.load(Ordering::Acquire)
    }

    pub fn user_count(&self) -> u32 {
        self.user_count.load(Ordering::Acquire)
    }

    pub fn set_user_count(&self, count: u32) {
        self.user_count.store(count, Ordering::Release);
    }

    /// Attempt to join this channel. A no-op if already joined.
    pub fn join(&self) {
        if self.is_joined() {
            return;
        }
        self.joining.store(true, Ordering::Release);
        let mut writer = ByteWriter::new();
        writer.write_string(&self.name);
        self.sink.enqueue(ClientPacketId::ChannelJoin, writer.into_bytes());
    }

    /// Leave this channel, if currently joined.
    pub fn leave(&self) {
        if !self.is_joined() {
            return;
        }
        self.joining.store(false, Ordering::Release);
        self.joined.store(false, Ordering::Release);
        let mut writer = ByteWriter::new();
        writer.write_string(&self.name);
        self.sink.enqueue(ClientPacketId::ChannelPart, writer.into_bytes());
    }

    /// Called by the `CHANNEL_JOIN_SUCCESS` handler.
    pub fn mark_join_success(&self) {
        if !self.is_joined() {
            info!(channel = %self.name, "joined channel");
        }
        self.joining.store(false, Ordering::Release);
        self.joined.store(true, Ordering::Release);
    }

    /// Send a message in this channel; a no-op unless joined, unless
    /// `force` is set.
    pub fn send_message(&self, sender_name: &str, sender_id: i32, message: &str, force: bool) {
        if !self.is_joined() && !force {
            return;
        }
        let mut writer = ByteWriter::new();
        writer.write_string(sender_name);
        writer.write_string(message);
        writer.write_string(&self.name);
        writer.write_i32(sender_id);
        self.sink
            .enqueue(ClientPacketId::SendPublicMessage, writer.into_bytes());
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Channel {}

impl std::hash::Hash for Channel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        sent: Mutex<Vec<(ClientPacketId, Vec<u8>)>>,
    }

    impl OutboundSink for RecordingSink {
        fn enqueue(&self, id: ClientPacketId, payload: Vec<u8>) {
            self.sent.lock().unwrap().push((id, payload));
        }
    }

    #[test]
    fn leave_is_noop_unless_joined() {
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let channel = Channel::new("#osu", sink.clone());
        channel.leave();
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn send_message_requires_joined_unless_forced() {
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let channel = Channel::new("#osu", sink.clone());
        channel.send_message("me", 1, "hi", false);
        assert!(sink.sent.lock().unwrap().is_empty());

        channel.send_message("me", 1, "hi", true);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn join_leave_round_trip_toggles_state() {
        let sink = Arc::new(RecordingSink { sent: Mutex::new(Vec::new()) });
        let channel = Channel::new("#osu", sink.clone());
        channel.join();
        assert!(channel.is_joining());
        channel.mark_join_success();
        assert!(channel.is_joined());
        channel.leave();
        assert!(!channel.is_joined());
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }
}
