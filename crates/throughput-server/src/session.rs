use bytes::Bytes;
use std::io;
use throughput_common::ClientId;
use throughput_protocol::chat::DisconnectPacket;
use throughput_protocol::packet::{packet_bytes, Packet};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(Bytes),
    /// Last frame of the connection; the writer closes the socket after it.
    Disconnect(Bytes),
}

pub struct PlayerSession {
    pub id: ClientId,
    pub username: String,
    pub uuid: Uuid,
    outbound: UnboundedSender<Outbound>,
    /// Batch size the client asked for in its last acknowledgement.
    pub chunks_per_tick: f32,
    /// Batches sent but not yet acknowledged.
    pub pending_batches: u32,
    /// Index of the next chunk to stream in spiral order.
    pub next_chunk: usize,
}

impl PlayerSession {
    pub fn new(
        id: ClientId,
        username: String,
        uuid: Uuid,
        outbound: UnboundedSender<Outbound>,
        chunks_per_tick: f32,
    ) -> Self {
        Self {
            id,
            username,
            uuid,
            outbound,
            chunks_per_tick,
            pending_batches: 0,
            next_chunk: 0,
        }
    }

    /// Queues an encoded packet. Returns false when the writer is gone.
    pub fn send_frame(&self, frame: Bytes) -> bool {
        self.outbound.send(Outbound::Frame(frame)).is_ok()
    }

    pub fn send_packet<T: Packet>(&self, packet: &T) -> io::Result<bool> {
        Ok(self.send_frame(packet_bytes(packet)?))
    }

    /// Queues a disconnect packet; nothing sent after it reaches the client.
    pub fn disconnect(&self, reason: &str) -> io::Result<()> {
        let frame = packet_bytes(&DisconnectPacket::new(reason))?;
        // A closed writer means the client is already gone.
        let _ = self.outbound.send(Outbound::Disconnect(frame));
        Ok(())
    }

    /// Whether another batch may be sent without exceeding `max_pending` and before
    /// running out of the `total` chunks in view.
    pub fn can_stream(&self, max_pending: u32, total: usize) -> bool {
        self.pending_batches < max_pending && self.next_chunk < total
    }

    /// Chunks to put in the next batch: the requested rate rounded down, at least one.
    pub fn batch_size(&self) -> usize {
        (self.chunks_per_tick.floor() as usize).max(1)
    }

    pub fn acknowledge(&mut self, chunks_per_tick: f32) {
        self.pending_batches = self.pending_batches.saturating_sub(1);
        if chunks_per_tick.is_finite() && chunks_per_tick > 0.0 {
            self.chunks_per_tick = chunks_per_tick;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    fn session(rate: f32) -> (PlayerSession, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let session = PlayerSession::new(
            ClientId::new(1),
            "Steve".to_owned(),
            Uuid::nil(),
            sender,
            rate,
        );
        (session, receiver)
    }

    #[test]
    fn test_batch_size_rounds_down_with_floor_of_one() {
        assert_eq!(session(9.0).0.batch_size(), 9);
        assert_eq!(session(37.5).0.batch_size(), 37);
        assert_eq!(session(0.25).0.batch_size(), 1);
    }

    #[test]
    fn test_acknowledge_updates_rate_and_pending() {
        let (mut session, _receiver) = session(9.0);
        session.pending_batches = 1;

        session.acknowledge(37.5);
        assert_eq!(session.pending_batches, 0);
        assert_eq!(session.chunks_per_tick, 37.5);

        session.acknowledge(f32::NAN);
        assert_eq!(session.pending_batches, 0);
        assert_eq!(session.chunks_per_tick, 37.5);
    }

    #[test]
    fn test_can_stream() {
        let (mut session, _receiver) = session(9.0);
        assert!(session.can_stream(1, 9));

        session.pending_batches = 1;
        assert!(!session.can_stream(1, 9));

        session.pending_batches = 0;
        session.next_chunk = 9;
        assert!(!session.can_stream(1, 9));
    }

    #[test]
    fn test_disconnect_is_queued_last() {
        let (session, mut receiver) = session(9.0);
        assert!(session.send_frame(Bytes::from_static(&[0x69])));
        session.disconnect("bye").unwrap();

        assert_matches!(receiver.try_recv(), Ok(Outbound::Frame(_)));
        assert_matches!(receiver.try_recv(), Ok(Outbound::Disconnect(frame)) if frame[0] == 0x1B);
    }
}
