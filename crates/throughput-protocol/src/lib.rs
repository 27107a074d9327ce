pub mod chat;
pub mod chunk_batch;
pub mod chunk_data;
pub mod chunk_section;
pub mod codec;
pub mod login;
pub mod message;
pub mod packet;
pub mod packet_type;

pub use codec::{PacketCodec, RawPacket};
pub use message::ProtocolMessage;
pub use packet::{MinecraftPacketBuffer, Packet};
pub use packet_type::{Direction, PacketType, PacketTypeSet};

/// Packet ids of the play and login phases served by the harness.
pub mod ids {
    pub mod login {
        pub const SERVER_LOGIN_START: i32 = 0x00;
        pub const CLIENT_LOGIN_SUCCESS: i32 = 0x02;
    }

    pub mod play {
        pub const CLIENT_CHUNK_BATCH_FINISHED: i32 = 0x0C;
        pub const CLIENT_CHUNK_BATCH_START: i32 = 0x0D;
        pub const CLIENT_DISCONNECT: i32 = 0x1B;
        pub const CLIENT_CHUNK_DATA: i32 = 0x25;
        pub const CLIENT_SYSTEM_CHAT: i32 = 0x69;
        pub const SERVER_CHUNK_BATCH_RECEIVED: i32 = 0x07;
    }
}
