use crate::console;
use crate::host::HarnessHost;
use crate::session::{Outbound, PlayerSession};
use crate::session_manager::SessionManager;
use crate::tick::TickLoop;
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use throughput_common::{ClientId, HarnessConfig, Result, ThroughputError};
use throughput_logger::{log, LogSeverity::{Debug, Error, Info, Warning}};
use throughput_pipeline::{CommandOutcome, PacketDispatcher, PacketSink, PipelineMode, ThroughputPlugin};
use throughput_protocol::ids;
use throughput_protocol::login::{LoginStartPacket, LoginSuccessPacket};
use throughput_protocol::packet::{packet_bytes, MinecraftPacketBuffer, Packet};
use throughput_protocol::{Direction, PacketCodec, ProtocolMessage, RawPacket};
use tokio::io;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;
use tokio_util::codec::Framed;

pub type Plugin = ThroughputPlugin<PacketDispatcher>;

type FrameSink = SplitSink<Framed<TcpStream, PacketCodec>, Bytes>;

/// State shared by every connection task.
struct Shared {
    initial_chunks_per_tick: f32,
    sessions: Arc<SessionManager>,
    dispatcher: Arc<PacketDispatcher>,
    plugin: Arc<Plugin>,
}

impl Shared {
    fn receive(&self, client: ClientId, raw: RawPacket) {
        match ProtocolMessage::decode(Direction::Serverbound, &raw) {
            Ok(message) => {
                self.dispatcher.dispatch_receiving(client, message);
            }
            Err(ThroughputError::UnsupportedPacket(id)) => {
                log(format!("Ignoring packet 0x{:02x} from {}", id, client), Debug)
            }
            Err(err) if err.is_event_local() => {
                log(format!("Bad packet from {}: {}", client, err), Warning)
            }
            Err(err) => log(format!("Failed to handle packet from {}: {}", client, err), Error),
        }
    }
}

/// Operator access to a running server.
#[derive(Clone)]
pub struct ServerHandle {
    plugin: Arc<Plugin>,
    sessions: Arc<SessionManager>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    pub async fn command(&self, name: &str, args: &[&str]) -> CommandOutcome {
        self.plugin.on_command(name, args).await
    }

    pub async fn mode(&self) -> Option<PipelineMode> {
        self.plugin.mode().await
    }

    pub fn online(&self) -> usize {
        self.sessions.len()
    }

    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
    tick: TickLoop,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Server {
    pub async fn bind(config: HarnessConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_address).await?;

        let sessions = Arc::new(SessionManager::new());
        let dispatcher = Arc::new(PacketDispatcher::new(
            config.protocol_version,
            config.async_workers,
            Arc::clone(&sessions) as Arc<dyn PacketSink>,
        ));
        let (host, tasks) = HarnessHost::new(Arc::clone(&sessions));
        let plugin = Arc::new(ThroughputPlugin::new(
            Arc::new(host),
            Arc::clone(&dispatcher),
            &config,
        ));
        let tick = TickLoop::new(&config, Arc::clone(&sessions), Arc::clone(&dispatcher), tasks);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                initial_chunks_per_tick: config.initial_chunks_per_tick,
                sessions,
                dispatcher,
                plugin,
            }),
            tick,
            shutdown: Arc::new(shutdown),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            plugin: Arc::clone(&self.shared.plugin),
            sessions: Arc::clone(&self.shared.sessions),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Accepts connections until [`ServerHandle::shutdown`] is called, then disables the
    /// plugin, which disconnects every client.
    pub async fn run(self) -> Result<()> {
        let Server {
            listener,
            shared,
            tick,
            shutdown,
        } = self;

        shared.plugin.enable().await;
        let tick_task = tokio::spawn(tick.run(shutdown.subscribe()));
        let mut stopping = shutdown.subscribe();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, addr)) => {
                        log(format!("New connection from: {}", addr), Info);
                        tokio::spawn(handle_connection(socket, Arc::clone(&shared)));
                    }
                    Err(err) => log(format!("Failed to accept connection: {}", err), Error),
                },
                _ = wait_for_shutdown(&mut stopping) => break,
            }
        }

        log("Stopping server".to_owned(), Info);
        shared.plugin.disable().await;
        if let Err(err) = tick_task.await {
            log(format!("Tick loop failed: {}", err), Error);
        }
        log("Server stopped".to_owned(), Info);
        Ok(())
    }
}

/// Resolves once shutdown was requested, or the server handle is gone.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Binds the configured address and runs until `stop` is typed or Ctrl-C is pressed.
pub async fn run(config: HarnessConfig) -> Result<()> {
    let server = Server::bind(config).await?;
    log(format!("Listening on {}", server.local_addr()?), Info);

    let handle = server.handle();
    tokio::spawn(console::run_console(handle.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log("Received Ctrl-C".to_owned(), Info);
            handle.shutdown();
        }
    });

    server.run().await
}

async fn handle_connection(socket: TcpStream, shared: Arc<Shared>) {
    if let Err(err) = serve_client(socket, &shared).await {
        log(format!("Connection closed with error: {}", err), Error);
    }
}

async fn serve_client(socket: TcpStream, shared: &Shared) -> Result<()> {
    let mut framed = Framed::new(socket, PacketCodec::new());

    let login = match framed.next().await {
        Some(frame) => frame?,
        None => return Ok(()),
    };
    if login.id != ids::login::SERVER_LOGIN_START {
        return Err(ThroughputError::protocol(format!(
            "Expected login start, got packet 0x{:02x}",
            login.id
        )));
    }

    // Newer clients append their profile id; the offline id is derived from the name.
    let mut buffer = MinecraftPacketBuffer::from_bytes(login.body.to_vec());
    let login_start = LoginStartPacket::read_from_buffer(&mut buffer)?;
    log(format!("Player {} attempting to login", login_start.username), Debug);

    let success = LoginSuccessPacket::new(login_start.username.clone());
    framed.send(packet_bytes(&success)?).await?;

    let client = ClientId::next();
    let (outbound, receiver) = mpsc::unbounded_channel();
    shared.sessions.add_session(PlayerSession::new(
        client,
        login_start.username.clone(),
        success.uuid,
        outbound,
        shared.initial_chunks_per_tick,
    ));
    log(format!("Player {} joined as {}", login_start.username, client), Info);

    let (sink, mut stream) = framed.split();
    let mut writer = tokio::spawn(async move {
        if let Err(err) = write_outbound(sink, receiver).await {
            log(format!("Failed to write to {}: {}", client, err), Debug);
        }
    });

    shared.plugin.on_join(client).await;

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(raw)) => shared.receive(client, raw),
                Some(Err(err)) => {
                    log(format!("Error reading from {}: {}", client, err), Warning);
                    break;
                }
                None => break,
            },
            // The writer only finishes on its own after a disconnect.
            _ = &mut writer => break,
        }
    }

    shared.sessions.remove_session(client);
    log(format!("Player {} disconnected", login_start.username), Info);
    Ok(())
}

async fn write_outbound(mut sink: FrameSink, mut receiver: UnboundedReceiver<Outbound>) -> io::Result<()> {
    while let Some(outbound) = receiver.recv().await {
        match outbound {
            Outbound::Frame(frame) => sink.send(frame).await?,
            Outbound::Disconnect(frame) => {
                sink.send(frame).await?;
                break;
            }
        }
    }
    sink.close().await
}
