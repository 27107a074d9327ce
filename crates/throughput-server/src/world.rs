use bytes::Bytes;
use once_cell::sync::Lazy;
use throughput_protocol::chunk_section::{build_chunk, AIR};

pub const STONE: i32 = 1;
pub const GRASS: i32 = 9;
pub const DIRT: i32 = 10;

/// Flat terrain streamed for every chunk: eight sections of stone, then dirt, then grass.
pub static GENERATED_CHUNK: Lazy<Bytes> = Lazy::new(|| {
    Bytes::from(build_chunk(|index| match index {
        0..=7 => STONE,
        8 => DIRT,
        9 => GRASS,
        _ => AIR,
    }))
});

/// Chunk coordinates of the `(2 * view_distance + 1)^2` square around the origin,
/// nearest ring first.
pub fn spiral(view_distance: u8) -> Vec<(i32, i32)> {
    let radius = i32::from(view_distance);
    let side = (2 * radius + 1) as usize;
    let mut chunks = Vec::with_capacity(side * side);
    chunks.push((0, 0));

    for ring in 1..=radius {
        // Walk the ring clockwise starting at its north-west corner.
        for x in -ring..ring {
            chunks.push((x, -ring));
        }
        for z in -ring..ring {
            chunks.push((ring, z));
        }
        for x in (-ring + 1..=ring).rev() {
            chunks.push((x, ring));
        }
        for z in (-ring + 1..=ring).rev() {
            chunks.push((-ring, z));
        }
    }

    chunks
}
