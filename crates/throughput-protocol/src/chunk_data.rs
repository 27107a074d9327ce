use crate::ids::play;
use crate::packet::{MinecraftPacketBuffer, Packet};
use bytes::Bytes;
use std::io;

/// Network NBT for an empty nameless compound, the only heightmaps value produced.
const EMPTY_HEIGHTMAPS: [u8; 2] = [0x0A, 0x00];

/// Block entity count, four empty light bit sets and two empty light array lists.
pub const EMPTY_TRAILER: [u8; 7] = [0; 7];

/// Chunk data packet. The section buffer is kept as raw bytes so it can be swapped
/// wholesale; block entities and light data after it are carried untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDataPacket {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// Concatenated chunk sections, bottom first.
    pub data: Bytes,
    /// Everything after the section buffer.
    pub trailer: Bytes,
}

impl ChunkDataPacket {
    pub fn new(chunk_x: i32, chunk_z: i32, data: Bytes) -> Self {
        Self {
            chunk_x,
            chunk_z,
            data,
            trailer: Bytes::from_static(&EMPTY_TRAILER),
        }
    }
}

impl Packet for ChunkDataPacket {
    fn packet_id() -> i32 {
        play::CLIENT_CHUNK_DATA
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        let chunk_x = buffer.read_i32()?;
        let chunk_z = buffer.read_i32()?;

        let tag = buffer.read_u8()?;
        let end = buffer.read_u8()?;
        if [tag, end] != EMPTY_HEIGHTMAPS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Only empty heightmaps are supported",
            ));
        }

        let data = Bytes::from(buffer.read_byte_array()?);
        let trailer = Bytes::from(buffer.read_remaining());

        Ok(ChunkDataPacket {
            chunk_x,
            chunk_z,
            data,
            trailer,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());
        buffer.write_i32(self.chunk_x);
        buffer.write_i32(self.chunk_z);
        buffer.write_raw(&EMPTY_HEIGHTMAPS);
        buffer.write_byte_array(&self.data);
        buffer.write_raw(&self.trailer);
        Ok(())
    }
}
