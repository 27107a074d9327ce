use crate::event::PacketEvent;
use throughput_protocol::{Direction, PacketTypeSet};

/// Callbacks for the packet types a listener subscribes to. Only play-phase packets
/// are ever delivered.
pub trait PacketListener: Send + Sync {
    fn packet_types(&self) -> PacketTypeSet;

    /// Called for serverbound packets.
    fn on_packet_receiving(&self, _event: &mut PacketEvent) {}

    /// Called for clientbound packets.
    fn on_packet_sending(&self, _event: &mut PacketEvent) {}
}

/// Whether `listener` subscribes to the event's packet type.
pub fn wants(listener: &dyn PacketListener, event: &PacketEvent) -> bool {
    listener.packet_types().contains(event.packet_type())
}

/// Runs the callback matching the event's direction.
pub fn invoke(listener: &dyn PacketListener, event: &mut PacketEvent) {
    match event.direction() {
        Direction::Serverbound => listener.on_packet_receiving(event),
        Direction::Clientbound => listener.on_packet_sending(event),
    }
}
