use crate::chunk_batch::{ChunkBatchFinishedPacket, ChunkBatchReceivedPacket, ChunkBatchStartPacket};
use crate::chunk_data::ChunkDataPacket;
use crate::codec::RawPacket;
use crate::packet::{packet_bytes, MinecraftPacketBuffer, Packet};
use crate::packet_type::{Direction, PacketType};
use bytes::Bytes;
use throughput_common::{Result, ThroughputError};

/// One of the intercepted packets, with typed field access by index.
///
/// Float fields: `ChunkBatchReceived` index 0 (chunks per tick).
/// Buffer fields: `ChunkData` index 0 (section data).
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolMessage {
    ChunkData(ChunkDataPacket),
    ChunkBatchStart(ChunkBatchStartPacket),
    ChunkBatchFinished(ChunkBatchFinishedPacket),
    ChunkBatchReceived(ChunkBatchReceivedPacket),
}

impl ProtocolMessage {
    pub fn packet_type(&self) -> PacketType {
        match self {
            ProtocolMessage::ChunkData(_) => PacketType::ChunkData,
            ProtocolMessage::ChunkBatchStart(_) => PacketType::ChunkBatchStart,
            ProtocolMessage::ChunkBatchFinished(_) => PacketType::ChunkBatchFinished,
            ProtocolMessage::ChunkBatchReceived(_) => PacketType::ChunkBatchReceived,
        }
    }

    pub fn direction(&self) -> Direction {
        self.packet_type().direction()
    }

    pub fn read_float(&self, index: usize) -> Result<f32> {
        match (self, index) {
            (ProtocolMessage::ChunkBatchReceived(packet), 0) => Ok(packet.chunks_per_tick),
            _ => Err(self.missing("float", index)),
        }
    }

    pub fn write_float(&mut self, index: usize, value: f32) -> Result<()> {
        if let (ProtocolMessage::ChunkBatchReceived(packet), 0) = (&mut *self, index) {
            packet.chunks_per_tick = value;
            return Ok(());
        }
        Err(self.missing("float", index))
    }

    pub fn read_buffer(&self, index: usize) -> Result<&Bytes> {
        match (self, index) {
            (ProtocolMessage::ChunkData(packet), 0) => Ok(&packet.data),
            _ => Err(self.missing("buffer", index)),
        }
    }

    pub fn write_buffer(&mut self, index: usize, value: Bytes) -> Result<()> {
        if let (ProtocolMessage::ChunkData(packet), 0) = (&mut *self, index) {
            packet.data = value;
            return Ok(());
        }
        Err(self.missing("buffer", index))
    }

    fn missing(&self, kind: &'static str, index: usize) -> ThroughputError {
        ThroughputError::field_not_found(self.packet_type().name(), kind, index)
    }

    /// Decodes a frame travelling in `direction` into one of the intercepted packets.
    pub fn decode(direction: Direction, raw: &RawPacket) -> Result<Self> {
        let packet_type = PacketType::from_id(direction, raw.id)
            .ok_or(ThroughputError::UnsupportedPacket(raw.id))?;
        let mut buffer = MinecraftPacketBuffer::from_bytes(raw.body.to_vec());

        let message = match packet_type {
            PacketType::ChunkData => {
                ProtocolMessage::ChunkData(ChunkDataPacket::read_from_buffer(&mut buffer)?)
            }
            PacketType::ChunkBatchStart => ProtocolMessage::ChunkBatchStart(
                ChunkBatchStartPacket::read_from_buffer(&mut buffer)?,
            ),
            PacketType::ChunkBatchFinished => ProtocolMessage::ChunkBatchFinished(
                ChunkBatchFinishedPacket::read_from_buffer(&mut buffer)?,
            ),
            PacketType::ChunkBatchReceived => ProtocolMessage::ChunkBatchReceived(
                ChunkBatchReceivedPacket::read_from_buffer(&mut buffer)?,
            ),
        };

        if buffer.remaining() != 0 {
            return Err(ThroughputError::protocol(format!(
                "{} bytes left after {}",
                buffer.remaining(),
                packet_type
            )));
        }
        Ok(message)
    }

    /// Serializes the packet id and body, ready for [`crate::codec::PacketCodec`].
    pub fn to_bytes(&self) -> Result<Bytes> {
        let bytes = match self {
            ProtocolMessage::ChunkData(packet) => packet_bytes(packet)?,
            ProtocolMessage::ChunkBatchStart(packet) => packet_bytes(packet)?,
            ProtocolMessage::ChunkBatchFinished(packet) => packet_bytes(packet)?,
            ProtocolMessage::ChunkBatchReceived(packet) => packet_bytes(packet)?,
        };
        Ok(bytes)
    }
}
