use crate::packet::{peek_varint, put_varint};
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Largest frame accepted from or written to a connection.
pub const MAX_FRAME_LENGTH: usize = 2 * 1024 * 1024;

/// One length-delimited frame with its packet id split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub id: i32,
    pub body: Bytes,
}

/// Frames are `VarInt length | VarInt packet id | body`. Decoding yields [`RawPacket`]s,
/// encoding takes an already serialized id and body (see [`crate::packet::packet_bytes`]).
#[derive(Debug, Clone)]
pub struct PacketCodec {
    max_frame_length: usize,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self {
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }

    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self { max_frame_length }
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of bytes `value` occupies as a VarInt.
pub fn varint_size(value: i32) -> usize {
    let value = value as u32;
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

impl Decoder for PacketCodec {
    type Item = RawPacket;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<RawPacket>> {
        let Some((length, header_len)) = peek_varint(&src[..])? else {
            return Ok(None);
        };

        let length = usize::try_from(length)
            .ok()
            .filter(|length| *length <= self.max_frame_length)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid frame length: {}", length),
                )
            })?;

        if src.len() < header_len + length {
            src.reserve(header_len + length - src.len());
            return Ok(None);
        }

        src.advance(header_len);
        let mut frame = src.split_to(length).freeze();

        let (id, id_len) = peek_varint(&frame)?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "Frame has no packet id")
        })?;
        frame.advance(id_len);

        Ok(Some(RawPacket { id, body: frame }))
    }
}

impl Encoder<Bytes> for PacketCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> io::Result<()> {
        if item.len() > self.max_frame_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Frame of {} bytes exceeds limit", item.len()),
            ));
        }

        let length = item.len() as i32;
        dst.reserve(varint_size(length) + item.len());
        put_varint(dst, length);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn test_varint_size_matches_encoding() {
        assert_eq!(varint_size(0), 1);
        assert_eq!(varint_size(127), 1);
        assert_eq!(varint_size(128), 2);
        assert_eq!(varint_size(16383), 2);
        assert_eq!(varint_size(16384), 3);
        assert_eq!(varint_size(-1), 5);
    }

    #[test]
    fn test_peek_varint_incomplete() {
        assert_eq!(peek_varint(&[]).unwrap(), None);
        assert_eq!(peek_varint(&[0x80]).unwrap(), None);
        assert_eq!(peek_varint(&[0x80, 0x01]).unwrap(), Some((128, 2)));
        assert!(peek_varint(&[0xFF; 5]).is_err());
    }

    #[test]
    fn test_decode_waits_for_full_frame() {
        let mut codec = PacketCodec::new();
        let mut src = BytesMut::from(&[0x03, 0x07, 0x42][..]);
        assert_eq!(codec.decode(&mut src).unwrap(), None);

        src.extend_from_slice(&[0x00]);
        let packet = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(packet.id, 0x07);
        assert_eq!(&packet.body[..], &[0x42, 0x00]);
        assert!(src.is_empty());
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let mut codec = PacketCodec::with_max_frame_length(4);
        let mut src = BytesMut::from(&[0x05, 0, 0, 0, 0, 0][..]);
        assert!(codec.decode(&mut src).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_frame() {
        let mut codec = PacketCodec::new();
        let mut src = BytesMut::from(&[0x00][..]);
        assert!(codec.decode(&mut src).is_err());
    }

    #[test]
    fn test_encode_prefixes_length() {
        let mut codec = PacketCodec::new();
        let mut dst = BytesMut::new();
        let payload = Bytes::from(vec![0x25; 200]);
        codec.encode(payload, &mut dst).unwrap();

        assert_eq!(&dst[..2], &[0xC8, 0x01]);
        assert_eq!(dst.len(), 202);
    }

    #[test]
    fn test_encoded_length_matches_buffer_varint() {
        let mut codec = PacketCodec::new();
        for len in [0usize, 1, 127, 128, 300, 16_384] {
            let mut dst = BytesMut::new();
            codec.encode(Bytes::from(vec![0; len]), &mut dst).unwrap();

            let mut prefix = crate::packet::MinecraftPacketBuffer::new();
            prefix.write_varint(len as i32);
            assert_eq!(&dst[..prefix.buffer.len()], &prefix.buffer[..], "length {}", len);
            assert_eq!(dst.len(), varint_size(len as i32) + len);
        }
    }

    #[tokio::test]
    async fn test_framed_read_splits_stream() {
        let reader = tokio_test::io::Builder::new()
            .read(&[0x02, 0x0D])
            .read(&[0x00, 0x02, 0x0C, 0x05])
            .build();
        let mut frames = FramedRead::new(reader, PacketCodec::new());

        let first = frames.next().await.unwrap().unwrap();
        assert_eq!(first.id, 0x0D);
        assert_eq!(&first.body[..], &[0x00]);

        let second = frames.next().await.unwrap().unwrap();
        assert_eq!(second.id, 0x0C);
        assert_eq!(&second.body[..], &[0x05]);

        assert!(frames.next().await.is_none());
    }
}
