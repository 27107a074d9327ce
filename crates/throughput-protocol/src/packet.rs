use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{BufMut, Bytes};
use std::io::{self, Cursor};

/// Packet trait. Contains the packet ID and the functions to write and read the packet.
pub trait Packet {
    /// Packet ID
    fn packet_id() -> i32
    where
        Self: Sized;

    /// Reads the packet body from the buffer. The packet ID has already been consumed by the
    /// frame codec.
    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self>
    where
        Self: Sized;

    /// Writes the packet ID followed by the packet body to the buffer.
    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()>;
}

/// Serializes a packet (ID and body) without the length prefix; framing is left to
/// [`crate::codec::PacketCodec`].
pub fn packet_bytes<T: Packet>(packet: &T) -> io::Result<Bytes> {
    let mut buffer = MinecraftPacketBuffer::new();
    packet.write_to_buffer(&mut buffer)?;
    Ok(buffer.into_bytes())
}

/// Appends `value` as a VarInt: 7 bits per byte, least significant group first, with
/// the high bit set on every byte but the last.
pub fn put_varint<B: BufMut>(dst: &mut B, value: i32) {
    let mut value = value as u32;
    while (value & !0x7F) != 0 {
        dst.put_u8(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8((value & 0x7F) as u8);
}

/// Decodes a VarInt from the front of `src` without consuming it.
/// Returns the value and its encoded width, or `None` if more bytes are needed.
pub fn peek_varint(src: &[u8]) -> io::Result<Option<(i32, usize)>> {
    let mut result: u32 = 0;
    for (index, byte) in src.iter().take(5).enumerate() {
        result |= ((byte & 0x7F) as u32) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(Some((result as i32, index + 1)));
        }
    }

    if src.len() >= 5 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt too big"));
    }
    Ok(None)
}

/// Minecraft packet buffer. Contains the buffer and the cursor.
/// The cursor is used to keep track of the current position in the buffer.
#[derive(Debug, Default)]
pub struct MinecraftPacketBuffer {
    pub buffer: Vec<u8>,
    cursor: usize,
}

impl MinecraftPacketBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    /// Creates a new Minecraft packet buffer from a byte array, cursor at 0.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            cursor: 0,
        }
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buffer)
    }

    /// Returns the byte at the cursor without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    fn ensure(&self, len: usize, what: &str) -> io::Result<()> {
        if self.cursor + len > self.buffer.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Not enough bytes to read {}", what),
            ));
        }
        Ok(())
    }

    fn take(&mut self, len: usize, what: &str) -> io::Result<&[u8]> {
        self.ensure(len, what)?;
        let slice = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    /// Writes a VarInt to the buffer.
    pub fn write_varint(&mut self, value: i32) {
        put_varint(&mut self.buffer, value);
    }

    /// Reads a VarInt from the buffer. At most 5 bytes are consumed.
    pub fn read_varint(&mut self) -> io::Result<i32> {
        match peek_varint(&self.buffer[self.cursor..])? {
            Some((value, width)) => {
                self.cursor += width;
                Ok(value)
            }
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "EOF while reading VarInt",
            )),
        }
    }

    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_varint(bytes.len() as i32);
        self.buffer.extend_from_slice(bytes);
    }

    pub fn read_string(&mut self) -> io::Result<String> {
        let length = self.read_length()?;
        let bytes = self.take(length, "the full string")?.to_vec();
        String::from_utf8(bytes).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "Failed to convert bytes to UTF-8 string",
            )
        })
    }

    /// Writes a UUID as two big-endian longs.
    pub fn write_uuid(&mut self, value: uuid::Uuid) {
        self.buffer.extend_from_slice(value.as_bytes());
    }

    pub fn read_uuid(&mut self) -> io::Result<uuid::Uuid> {
        let bytes = self.take(16, "UUID")?;
        uuid::Uuid::from_slice(bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn read_bool(&mut self) -> io::Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid bool byte: {}", other),
            )),
        }
    }

    // Write an u16 in network (big-endian) order.
    pub fn write_u16(&mut self, value: u16) {
        let _ = self.buffer.write_u16::<BigEndian>(value);
    }

    // Read an u16 in network (big-endian) order.
    pub fn read_u16(&mut self) -> io::Result<u16> {
        Cursor::new(self.take(2, "u16")?).read_u16::<BigEndian>()
    }

    pub fn write_i32(&mut self, value: i32) {
        // Writing into a Vec cannot fail.
        let _ = self.buffer.write_i32::<BigEndian>(value);
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        Cursor::new(self.take(4, "i32")?).read_i32::<BigEndian>()
    }

    pub fn write_i64(&mut self, value: i64) {
        let _ = self.buffer.write_i64::<BigEndian>(value);
    }

    pub fn read_i64(&mut self) -> io::Result<i64> {
        Cursor::new(self.take(8, "i64")?).read_i64::<BigEndian>()
    }

    pub fn write_f32(&mut self, value: f32) {
        let _ = self.buffer.write_f32::<BigEndian>(value);
    }

    pub fn read_f32(&mut self) -> io::Result<f32> {
        Cursor::new(self.take(4, "f32")?).read_f32::<BigEndian>()
    }

    /// Writes a VarInt length followed by the bytes.
    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as i32);
        self.buffer.extend_from_slice(bytes);
    }

    pub fn read_byte_array(&mut self) -> io::Result<Vec<u8>> {
        let length = self.read_length()?;
        Ok(self.take(length, "byte array")?.to_vec())
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Consumes everything after the cursor.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let rest = self.buffer[self.cursor..].to_vec();
        self.cursor = self.buffer.len();
        rest
    }

    fn read_length(&mut self) -> io::Result<usize> {
        let length = self.read_varint()?;
        usize::try_from(length).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Negative length prefix: {}", length),
            )
        })
    }
}
