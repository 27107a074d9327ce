//! Minimal single-valued chunk sections and the precomputed empty chunk.
//!
//! Every section is written as
//!
//! ```text
//! u16     non-air block count (0 or 4096)
//! u8      block palette bits per entry (0 = single value)
//! VarInt  block state id
//! VarInt  block data array length (0)
//! u8      biome palette bits per entry (0 = single value)
//! VarInt  biome id (0)
//! VarInt  biome data array length (0)
//! ```
//!
//! so a section is 8 bytes while the block id fits one VarInt byte.

use crate::packet::MinecraftPacketBuffer;
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::io;

/// Vertical sections in a chunk column.
pub const SECTIONS_PER_CHUNK: usize = 24;
/// Sections from the bottom that carry the placeholder block in the empty chunk.
pub const SOLID_SECTIONS: usize = 8;
/// Blocks in one 16x16x16 section.
pub const BLOCKS_PER_SECTION: u16 = 4096;

pub const AIR: i32 = 0;
/// Placeholder solid block used for the bottom sections of the empty chunk.
pub const PLACEHOLDER_BLOCK: i32 = 14;

/// Payload substituted into chunk data packets. Built on first use, never mutated.
pub static EMPTY_CHUNK: Lazy<Bytes> = Lazy::new(|| Bytes::from(build_empty_chunk()));

/// A section filled with `block_id`.
pub fn encode_section(block_id: i32) -> Vec<u8> {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer.write_u16(if block_id == AIR { 0 } else { BLOCKS_PER_SECTION });

    buffer.write_u8(0);
    buffer.write_varint(block_id);
    buffer.write_varint(0);

    buffer.write_u8(0);
    buffer.write_varint(0);
    buffer.write_varint(0);

    buffer.buffer
}

/// Concatenates [`SECTIONS_PER_CHUNK`] sections, bottom first, using `block_for(index)`
/// as the fill of each. Each distinct block id is encoded once.
pub fn build_chunk<F>(block_for: F) -> Vec<u8>
where
    F: Fn(usize) -> i32,
{
    let mut encoded: Vec<(i32, Vec<u8>)> = Vec::new();
    let mut chunk = Vec::new();

    for index in 0..SECTIONS_PER_CHUNK {
        let block_id = block_for(index);
        let position = match encoded.iter().position(|(id, _)| *id == block_id) {
            Some(position) => position,
            None => {
                encoded.push((block_id, encode_section(block_id)));
                encoded.len() - 1
            }
        };
        chunk.extend_from_slice(&encoded[position].1);
    }

    chunk
}

/// Sections 0-7 hold [`PLACEHOLDER_BLOCK`], the rest are air.
pub fn build_empty_chunk() -> Vec<u8> {
    build_chunk(|index| {
        if index < SOLID_SECTIONS {
            PLACEHOLDER_BLOCK
        } else {
            AIR
        }
    })
}

/// A section read back from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSection {
    pub block_count: u16,
    pub block_bits: u8,
    pub block_id: i32,
    pub block_data_length: i32,
    pub biome_bits: u8,
    pub biome_id: i32,
    pub biome_data_length: i32,
}

/// Reads one single-valued section. Sections with a non-zero bits-per-entry are rejected.
pub fn read_section(buffer: &mut MinecraftPacketBuffer) -> io::Result<DecodedSection> {
    let block_count = buffer.read_u16()?;
    let block_bits = buffer.read_u8()?;
    if block_bits != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Unsupported block palette with {} bits per entry", block_bits),
        ));
    }
    let block_id = buffer.read_varint()?;
    let block_data_length = buffer.read_varint()?;

    let biome_bits = buffer.read_u8()?;
    if biome_bits != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Unsupported biome palette with {} bits per entry", biome_bits),
        ));
    }
    let biome_id = buffer.read_varint()?;
    let biome_data_length = buffer.read_varint()?;

    Ok(DecodedSection {
        block_count,
        block_bits,
        block_id,
        block_data_length,
        biome_bits,
        biome_id,
        biome_data_length,
    })
}
