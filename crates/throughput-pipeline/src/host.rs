use throughput_common::ClientId;
use throughput_protocol::ProtocolMessage;

/// Work deferred to the start of the next server tick.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// What the harness needs from the server hosting it.
pub trait ServerHost: Send + Sync {
    fn online_clients(&self) -> Vec<ClientId>;

    /// Shows a chat line to one client.
    fn send_message(&self, client: ClientId, message: &str);

    /// Disconnects a client with a reason.
    fn kick(&self, client: ClientId, reason: &str);

    /// Runs `task` on the server's main tick context at the next tick boundary.
    fn run_task(&self, task: ScheduledTask);

    /// Sends a packet to a client without passing it through any listener.
    fn send_packet_unfiltered(&self, client: ClientId, message: ProtocolMessage);
}
