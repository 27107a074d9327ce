use crate::ids::play;
use crate::packet::{MinecraftPacketBuffer, Packet};
use std::io;

/// Marks the start of a burst of chunk data packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkBatchStartPacket;

impl Packet for ChunkBatchStartPacket {
    fn packet_id() -> i32 {
        play::CLIENT_CHUNK_BATCH_START
    }

    fn read_from_buffer(_buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        Ok(ChunkBatchStartPacket)
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());
        Ok(())
    }
}

/// Closes a batch; the client answers with [`ChunkBatchReceivedPacket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBatchFinishedPacket {
    /// Number of chunk data packets sent since the matching start marker.
    pub batch_size: i32,
}

impl Packet for ChunkBatchFinishedPacket {
    fn packet_id() -> i32 {
        play::CLIENT_CHUNK_BATCH_FINISHED
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        Ok(ChunkBatchFinishedPacket {
            batch_size: buffer.read_varint()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());
        buffer.write_varint(self.batch_size);
        Ok(())
    }
}

impl ChunkBatchFinishedPacket {
    pub fn new(batch_size: i32) -> Self {
        Self { batch_size }
    }
}

/// Client acknowledgement of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBatchReceivedPacket {
    /// The rate at which the client wants to receive chunks.
    pub chunks_per_tick: f32,
}

impl Packet for ChunkBatchReceivedPacket {
    fn packet_id() -> i32 {
        play::SERVER_CHUNK_BATCH_RECEIVED
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        Ok(ChunkBatchReceivedPacket {
            chunks_per_tick: buffer.read_f32()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());
        buffer.write_f32(self.chunks_per_tick);
        Ok(())
    }
}

impl ChunkBatchReceivedPacket {
    pub fn new(chunks_per_tick: f32) -> Self {
        Self { chunks_per_tick }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::packet_bytes;

    #[test]
    fn test_batch_start_is_bare_id() {
        let bytes = packet_bytes(&ChunkBatchStartPacket).unwrap();
        assert_eq!(&bytes[..], &[0x0D]);
    }

    #[test]
    fn test_batch_finished_layout() {
        let bytes = packet_bytes(&ChunkBatchFinishedPacket::new(200)).unwrap();
        assert_eq!(&bytes[..], &[0x0C, 0xC8, 0x01]);

        let mut buffer = MinecraftPacketBuffer::from_bytes(bytes[1..].to_vec());
        let packet = ChunkBatchFinishedPacket::read_from_buffer(&mut buffer).unwrap();
        assert_eq!(packet.batch_size, 200);
    }

    #[test]
    fn test_batch_received_reads_big_endian_float() {
        let mut buffer = MinecraftPacketBuffer::from_bytes(37.5f32.to_be_bytes().to_vec());
        let packet = ChunkBatchReceivedPacket::read_from_buffer(&mut buffer).unwrap();
        assert_eq!(packet.chunks_per_tick, 37.5);
    }

    #[test]
    fn test_truncated_ack_is_an_error() {
        let mut buffer = MinecraftPacketBuffer::from_bytes(vec![0x42, 0x16]);
        assert!(ChunkBatchReceivedPacket::read_from_buffer(&mut buffer).is_err());
    }
}
