#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use throughput_common::{HarnessConfig, Result};
use throughput_protocol::chat::{DisconnectPacket, SystemChatPacket};
use throughput_protocol::ids::{login, play};
use throughput_protocol::login::{LoginStartPacket, LoginSuccessPacket};
use throughput_protocol::packet::{packet_bytes, MinecraftPacketBuffer, Packet};
use throughput_protocol::{PacketCodec, RawPacket};
use throughput_server::{Server, ServerHandle};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::codec::Framed;

pub type Client = Framed<TcpStream, PacketCodec>;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub task: JoinHandle<Result<()>>,
}

/// Small view so the whole area fits in the first batch.
pub fn test_config() -> HarnessConfig {
    HarnessConfig {
        bind_address: "127.0.0.1:0".to_owned(),
        view_distance: 1,
        ..HarnessConfig::default()
    }
}

pub async fn start_server(config: HarnessConfig) -> TestServer {
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.handle();
    let task = tokio::spawn(server.run());
    TestServer { addr, handle, task }
}

pub async fn connect_to_server(addr: SocketAddr) -> Client {
    Framed::new(TcpStream::connect(addr).await.unwrap(), PacketCodec::new())
}

pub async fn send_packet<T: Packet>(client: &mut Client, packet: T) {
    client.send(packet_bytes(&packet).unwrap()).await.unwrap();
}

pub async fn read_packet(client: &mut Client) -> Option<RawPacket> {
    timeout(READ_TIMEOUT, client.next())
        .await
        .expect("timed out waiting for a packet")
        .map(|frame| frame.unwrap())
}

/// Reads until a packet with `id` arrives, skipping everything else.
pub async fn read_until(client: &mut Client, id: i32) -> RawPacket {
    loop {
        let packet = read_packet(client)
            .await
            .unwrap_or_else(|| panic!("connection closed before packet 0x{:02x}", id));
        if packet.id == id {
            return packet;
        }
    }
}

pub fn decode<T: Packet>(packet: &RawPacket) -> T {
    let mut buffer = MinecraftPacketBuffer::from_bytes(packet.body.to_vec());
    T::read_from_buffer(&mut buffer).unwrap()
}

pub async fn login_as(addr: SocketAddr, username: &str) -> Client {
    let mut client = connect_to_server(addr).await;
    send_packet(
        &mut client,
        LoginStartPacket {
            username: username.to_owned(),
        },
    )
    .await;

    let success = read_until(&mut client, login::CLIENT_LOGIN_SUCCESS).await;
    let success: LoginSuccessPacket = decode(&success);
    assert_eq!(success.username, username);
    client
}

pub async fn read_chat(client: &mut Client) -> String {
    let packet = read_until(client, play::CLIENT_SYSTEM_CHAT).await;
    decode::<SystemChatPacket>(&packet).message
}

/// Reads chat lines until `expected`, returning the lines seen before it.
pub async fn read_chat_until(client: &mut Client, expected: &str) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        let message = read_chat(client).await;
        if message == expected {
            return seen;
        }
        seen.push(message);
    }
}

pub async fn read_disconnect(client: &mut Client) -> String {
    let packet = read_until(client, play::CLIENT_DISCONNECT).await;
    decode::<DisconnectPacket>(&packet).reason
}
