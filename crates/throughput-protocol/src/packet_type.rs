use crate::ids::play;
use std::fmt;

/// First protocol version that knows the chunk batch packets.
pub const CHUNK_BATCH_PROTOCOL: i32 = 764;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Server to client
    Clientbound,
    /// Client to server
    Serverbound,
}

/// The play-phase packets the throughput harness intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PacketType {
    ChunkData,
    ChunkBatchStart,
    ChunkBatchFinished,
    ChunkBatchReceived,
}

impl PacketType {
    /// Candidate list the active set is computed from.
    pub const CANDIDATES: [PacketType; 4] = [
        PacketType::ChunkData,
        PacketType::ChunkBatchStart,
        PacketType::ChunkBatchFinished,
        PacketType::ChunkBatchReceived,
    ];

    pub fn id(self) -> i32 {
        match self {
            PacketType::ChunkData => play::CLIENT_CHUNK_DATA,
            PacketType::ChunkBatchStart => play::CLIENT_CHUNK_BATCH_START,
            PacketType::ChunkBatchFinished => play::CLIENT_CHUNK_BATCH_FINISHED,
            PacketType::ChunkBatchReceived => play::SERVER_CHUNK_BATCH_RECEIVED,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            PacketType::ChunkBatchReceived => Direction::Serverbound,
            _ => Direction::Clientbound,
        }
    }

    pub fn from_id(direction: Direction, id: i32) -> Option<PacketType> {
        Self::CANDIDATES
            .into_iter()
            .find(|ty| ty.direction() == direction && ty.id() == id)
    }

    /// Whether the packet exists in the given protocol version.
    pub fn is_supported(self, protocol_version: i32) -> bool {
        match self {
            PacketType::ChunkData => true,
            _ => protocol_version >= CHUNK_BATCH_PROTOCOL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PacketType::ChunkData => "ChunkData",
            PacketType::ChunkBatchStart => "ChunkBatchStart",
            PacketType::ChunkBatchFinished => "ChunkBatchFinished",
            PacketType::ChunkBatchReceived => "ChunkBatchReceived",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable set of packet types. Built once at startup; may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketTypeSet {
    bits: u8,
}

impl PacketTypeSet {
    pub const EMPTY: PacketTypeSet = PacketTypeSet { bits: 0 };

    /// Keeps the candidates accepted by `supported`. Unsupported types are dropped silently.
    pub fn from_candidates<I, F>(candidates: I, supported: F) -> Self
    where
        I: IntoIterator<Item = PacketType>,
        F: Fn(PacketType) -> bool,
    {
        let bits = candidates
            .into_iter()
            .filter(|ty| supported(*ty))
            .fold(0, |bits, ty| bits | ty.bit());
        Self { bits }
    }

    /// The intercepted packet set for a protocol version.
    pub fn for_protocol(protocol_version: i32) -> Self {
        Self::from_candidates(PacketType::CANDIDATES, |ty| {
            ty.is_supported(protocol_version)
        })
    }

    pub fn contains(&self, ty: PacketType) -> bool {
        self.bits & ty.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = PacketType> + '_ {
        PacketType::CANDIDATES
            .into_iter()
            .filter(move |ty| self.contains(*ty))
    }

    /// Whether any type of the set travels in `direction`.
    pub fn has_direction(&self, direction: Direction) -> bool {
        self.iter().any(|ty| ty.direction() == direction)
    }
}

impl FromIterator<PacketType> for PacketTypeSet {
    fn from_iter<T: IntoIterator<Item = PacketType>>(iter: T) -> Self {
        Self::from_candidates(iter, |_| true)
    }
}
