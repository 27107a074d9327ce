use crate::ids::login;
use crate::packet::{MinecraftPacketBuffer, Packet};
use std::io;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStartPacket {
    pub username: String,
}

impl Packet for LoginStartPacket {
    fn packet_id() -> i32 {
        login::SERVER_LOGIN_START
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        let username = buffer.read_string()?;
        if username.is_empty() || username.len() > 16 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid username length: {}", username.len()),
            ));
        }
        Ok(LoginStartPacket { username })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&self.username);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccessPacket {
    pub uuid: Uuid,
    pub username: String,
}

impl LoginSuccessPacket {
    /// Login success for an offline-mode player.
    pub fn new(username: String) -> Self {
        Self {
            uuid: offline_uuid(&username),
            username,
        }
    }
}

impl Packet for LoginSuccessPacket {
    fn packet_id() -> i32 {
        login::CLIENT_LOGIN_SUCCESS
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        let uuid = buffer.read_uuid()?;
        let username = buffer.read_string()?;
        let _properties = buffer.read_varint()?;
        Ok(LoginSuccessPacket { uuid, username })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());
        buffer.write_uuid(self.uuid);
        buffer.write_string(&self.username);
        buffer.write_varint(0); // no profile properties
        Ok(())
    }
}

/// Name based (v3) UUID derived from `OfflinePlayer:<username>`.
pub fn offline_uuid(username: &str) -> Uuid {
    let name = format!("OfflinePlayer:{}", username);
    Uuid::new_v3(&Uuid::NAMESPACE_DNS, name.as_bytes())
}
