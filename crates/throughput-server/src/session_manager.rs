use crate::session::PlayerSession;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::Range;
use throughput_common::ClientId;
use throughput_logger::{log, LogSeverity::{Debug, Warning}};
use throughput_pipeline::{PacketEvent, PacketSink};
use throughput_protocol::packet::Packet;
use throughput_protocol::{Direction, ProtocolMessage};

/// A batch the tick loop should send: chunk indices into the spiral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub client: ClientId,
    pub chunks: Range<usize>,
}

/// Connected players keyed by client id.
///
/// Also the sink at the end of the packet pipeline: clientbound packets that survive
/// the listeners are written to their session, acknowledgements update its stream state.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<ClientId, PlayerSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(&self, session: PlayerSession) {
        self.sessions.write().insert(session.id, session);
    }

    pub fn remove_session(&self, client: ClientId) -> Option<PlayerSession> {
        self.sessions.write().remove(&client)
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.sessions.read().contains_key(&client)
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.sessions.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn username(&self, client: ClientId) -> Option<String> {
        self.sessions
            .read()
            .get(&client)
            .map(|session| session.username.clone())
    }

    /// Encodes and queues a packet for one client. Returns false if it is not connected.
    pub fn send_packet<T: Packet>(&self, client: ClientId, packet: &T) -> bool {
        let sessions = self.sessions.read();
        let Some(session) = sessions.get(&client) else {
            return false;
        };

        match session.send_packet(packet) {
            Ok(sent) => sent,
            Err(err) => {
                log(format!("Failed to encode packet for {}: {}", client, err), Warning);
                false
            }
        }
    }

    /// Writes a clientbound intercepted packet to its session.
    pub fn deliver(&self, client: ClientId, message: &ProtocolMessage) -> bool {
        let frame = match message.to_bytes() {
            Ok(frame) => frame,
            Err(err) => {
                log(format!("Failed to encode {} for {}: {}", message.packet_type(), client, err), Warning);
                return false;
            }
        };

        self.sessions
            .read()
            .get(&client)
            .map(|session| session.send_frame(frame))
            .unwrap_or(false)
    }

    /// Sends the disconnect packet and forgets the session.
    pub fn disconnect(&self, client: ClientId, reason: &str) -> bool {
        let Some(session) = self.remove_session(client) else {
            return false;
        };

        if let Err(err) = session.disconnect(reason) {
            log(format!("Failed to encode disconnect for {}: {}", client, err), Warning);
        }
        true
    }

    /// Reserves the next batch for every session that may stream one.
    pub fn plan_batches(&self, max_pending: u32, total_chunks: usize) -> Vec<PlannedBatch> {
        let mut sessions = self.sessions.write();
        let mut batches: Vec<PlannedBatch> = sessions
            .values_mut()
            .filter(|session| session.can_stream(max_pending, total_chunks))
            .map(|session| {
                let start = session.next_chunk;
                let end = (start + session.batch_size()).min(total_chunks);
                session.next_chunk = end;
                session.pending_batches += 1;
                PlannedBatch {
                    client: session.id,
                    chunks: start..end,
                }
            })
            .collect();
        batches.sort_unstable_by_key(|batch| batch.client);
        batches
    }

    fn acknowledge(&self, client: ClientId, chunks_per_tick: f32) {
        if let Some(session) = self.sessions.write().get_mut(&client) {
            session.acknowledge(chunks_per_tick);
        }
    }
}

impl PacketSink for SessionManager {
    fn forward(&self, event: PacketEvent) {
        let client = event.client();
        match event.direction() {
            Direction::Clientbound => {
                self.deliver(client, event.message());
            }
            Direction::Serverbound => match event.message().read_float(0) {
                Ok(chunks_per_tick) => self.acknowledge(client, chunks_per_tick),
                Err(err) => log(format!("Ignoring packet from {}: {}", client, err), Debug),
            },
        }
    }
}
