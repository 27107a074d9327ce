use crate::controller::{PipelineController, PipelineMode};
use crate::host::ServerHost;
use crate::instrumentation::ThroughputListener;
use crate::listener::PacketListener;
use crate::manager::ProtocolManager;
use std::sync::Arc;
use throughput_common::{ClientId, HarnessConfig, ThroughputError};
use throughput_protocol::{Direction, PacketType, PacketTypeSet};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Operator command that flips the packet pipeline.
pub const COMMAND_NAME: &str = "throughput";

pub const DISABLED_MESSAGE: &str = "plugin got disabled, please reconnect";

pub fn status_message(mode: PipelineMode) -> String {
    format!("currently using {} packet listener", mode)
}

pub fn switched_message(mode: PipelineMode) -> String {
    format!("changed packet listener to {}, please reconnect", mode)
}

/// Result of routing an operator command to the plugin.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Not a command this plugin owns.
    NotHandled,
    /// The pipeline now runs in this mode and every client was disconnected.
    Switched(PipelineMode),
    /// Nothing changed; the previous pipeline is still active.
    Failed(ThroughputError),
}

/// Ties the throughput listener to the host's lifecycle hooks.
pub struct ThroughputPlugin<M: ProtocolManager> {
    host: Arc<dyn ServerHost>,
    manager: Arc<M>,
    listener: Arc<ThroughputListener>,
    controller: Mutex<Option<PipelineController<M>>>,
}

impl<M: ProtocolManager> ThroughputPlugin<M> {
    pub fn new(host: Arc<dyn ServerHost>, manager: Arc<M>, config: &HarnessConfig) -> Self {
        let packet_types =
            PacketTypeSet::from_candidates(PacketType::CANDIDATES, |ty| manager.is_supported(ty));
        if packet_types.len() < PacketType::CANDIDATES.len() {
            warn!(
                protocol_version = config.protocol_version,
                supported = packet_types.len(),
                "Some packet types are not supported by this protocol version"
            );
        }
        if !packet_types.has_direction(Direction::Serverbound) {
            warn!("Acknowledgements are not intercepted, throughput will not be reported");
        }

        let listener = Arc::new(ThroughputListener::new(
            packet_types,
            config.instrumentation.send_mode,
            Arc::clone(&host),
        ));

        Self {
            host,
            manager,
            listener,
            controller: Mutex::new(None),
        }
    }

    /// Installs the sync pipeline. Enabling twice keeps the current pipeline.
    pub async fn enable(&self) {
        let mut controller = self.controller.lock().await;
        if controller.is_some() {
            return;
        }

        let listener: Arc<dyn PacketListener> = self.listener.clone();
        *controller = Some(PipelineController::install(Arc::clone(&self.manager), listener));
        info!(send_mode = %self.listener.send_mode(), "Throughput plugin enabled");
    }

    /// Tears down the active pipeline and disconnects everyone.
    pub async fn disable(&self) {
        let controller = self.controller.lock().await.take();
        if let Some(controller) = controller {
            controller.uninstall().await;
        }

        self.kick_all(DISABLED_MESSAGE);
        info!("Throughput plugin disabled");
    }

    pub async fn mode(&self) -> Option<PipelineMode> {
        self.controller.lock().await.as_ref().map(PipelineController::mode)
    }

    /// Join hook: tells the client which pipeline it is about to be measured with.
    ///
    /// Waits for a running toggle to finish, so the reported mode is the one the
    /// client's packets will actually go through.
    pub async fn on_join(&self, client: ClientId) {
        if let Some(mode) = self.mode().await {
            self.host.send_message(client, &status_message(mode));
        }
    }

    pub async fn on_command(&self, name: &str, _args: &[&str]) -> CommandOutcome {
        if !name.eq_ignore_ascii_case(COMMAND_NAME) {
            return CommandOutcome::NotHandled;
        }

        let mut guard = self.controller.lock().await;
        let Some(controller) = guard.as_mut() else {
            return CommandOutcome::Failed(ThroughputError::Disabled);
        };

        match controller.toggle().await {
            Ok(mode) => {
                self.kick_all(&switched_message(mode));
                CommandOutcome::Switched(mode)
            }
            Err(err) => {
                warn!(error = %err, "Packet listener switch failed");
                CommandOutcome::Failed(err)
            }
        }
    }

    fn kick_all(&self, reason: &str) {
        for client in self.host.online_clients() {
            self.host.kick(client, reason);
        }
    }
}
