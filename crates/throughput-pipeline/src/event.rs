use throughput_common::ClientId;
use throughput_protocol::{Direction, PacketType, ProtocolMessage};

/// A packet on its way to or from a client, as seen by listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketEvent {
    client: ClientId,
    message: ProtocolMessage,
    cancelled: bool,
}

impl PacketEvent {
    pub fn new(client: ClientId, message: ProtocolMessage) -> Self {
        Self {
            client,
            message,
            cancelled: false,
        }
    }

    /// The connection the packet is sent to or was received from.
    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn packet_type(&self) -> PacketType {
        self.message.packet_type()
    }

    pub fn direction(&self) -> Direction {
        self.message.direction()
    }

    pub fn message(&self) -> &ProtocolMessage {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut ProtocolMessage {
        &mut self.message
    }

    pub fn into_message(self) -> ProtocolMessage {
        self.message
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// A cancelled packet is never delivered.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}
