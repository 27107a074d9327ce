use crate::ids::play;
use crate::packet::{MinecraftPacketBuffer, Packet};
use serde::{Deserialize, Serialize};
use std::io;

/// Plain JSON text component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
}

impl TextComponent {
    pub fn to_json(&self) -> io::Result<String> {
        serde_json::to_string(self).map_err(io::Error::from)
    }

    pub fn from_json(json: &str) -> io::Result<Self> {
        serde_json::from_str(json).map_err(io::Error::from)
    }
}

/// Server message shown in the client's chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemChatPacket {
    pub message: String,
    /// Show above the hotbar instead of in chat.
    pub overlay: bool,
}

impl SystemChatPacket {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            overlay: false,
        }
    }
}

impl Packet for SystemChatPacket {
    fn packet_id() -> i32 {
        play::CLIENT_SYSTEM_CHAT
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        let component = TextComponent::from_json(&buffer.read_string()?)?;
        Ok(SystemChatPacket {
            message: component.text,
            overlay: buffer.read_bool()?,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        let component = TextComponent {
            text: self.message.clone(),
        };
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&component.to_json()?);
        buffer.write_bool(self.overlay);
        Ok(())
    }
}

/// Play-phase disconnect. The connection is closed right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectPacket {
    pub reason: String,
}

impl DisconnectPacket {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Packet for DisconnectPacket {
    fn packet_id() -> i32 {
        play::CLIENT_DISCONNECT
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        let component = TextComponent::from_json(&buffer.read_string()?)?;
        Ok(DisconnectPacket {
            reason: component.text,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        let component = TextComponent {
            text: self.reason.clone(),
        };
        buffer.write_varint(Self::packet_id());
        buffer.write_string(&component.to_json()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::packet_bytes;

    #[test]
    fn test_system_chat_is_json_component() {
        let bytes = packet_bytes(&SystemChatPacket::new("chunks per tick: 37.5")).unwrap();
        let mut buffer = MinecraftPacketBuffer::from_bytes(bytes[1..].to_vec());
        assert_eq!(
            buffer.read_string().unwrap(),
            r#"{"text":"chunks per tick: 37.5"}"#
        );
        assert!(!buffer.read_bool().unwrap());
    }

    #[test]
    fn test_disconnect_reads_reason() {
        let packet = DisconnectPacket::new("changed packet listener to async, please reconnect");
        let bytes = packet_bytes(&packet).unwrap();
        assert_eq!(bytes[0], 0x1B);

        let mut buffer = MinecraftPacketBuffer::from_bytes(bytes[1..].to_vec());
        assert_eq!(DisconnectPacket::read_from_buffer(&mut buffer).unwrap(), packet);
    }

    #[test]
    fn test_quotes_are_escaped() {
        let component = TextComponent {
            text: "say \"hi\"".to_owned(),
        };
        let json = component.to_json().unwrap();
        assert_eq!(TextComponent::from_json(&json).unwrap(), component);
    }
}
