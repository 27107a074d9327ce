use crate::session_manager::SessionManager;
use std::sync::Arc;
use throughput_common::ClientId;
use throughput_logger::{log, LogSeverity::{Info, Warning}};
use throughput_pipeline::{ScheduledTask, ServerHost};
use throughput_protocol::chat::SystemChatPacket;
use throughput_protocol::ProtocolMessage;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// The server side of the plugin host contract.
///
/// Tasks handed to [`ServerHost::run_task`] are queued for the tick loop, which runs
/// them before streaming the next batch.
pub struct HarnessHost {
    sessions: Arc<SessionManager>,
    tasks: UnboundedSender<ScheduledTask>,
}

impl HarnessHost {
    pub fn new(sessions: Arc<SessionManager>) -> (Self, UnboundedReceiver<ScheduledTask>) {
        let (tasks, receiver) = mpsc::unbounded_channel();
        (Self { sessions, tasks }, receiver)
    }
}

impl ServerHost for HarnessHost {
    fn online_clients(&self) -> Vec<ClientId> {
        self.sessions.client_ids()
    }

    fn send_message(&self, client: ClientId, message: &str) {
        self.sessions.send_packet(client, &SystemChatPacket::new(message));
    }

    fn kick(&self, client: ClientId, reason: &str) {
        if let Some(username) = self.sessions.username(client) {
            log(format!("Kicking {} ({}): {}", username, client, reason), Info);
        }
        self.sessions.disconnect(client, reason);
    }

    fn run_task(&self, task: ScheduledTask) {
        if self.tasks.send(task).is_err() {
            log("Tick loop is gone, dropping scheduled task".to_owned(), Warning);
        }
    }

    fn send_packet_unfiltered(&self, client: ClientId, message: ProtocolMessage) {
        self.sessions.deliver(client, &message);
    }
}

/// Runs every task queued so far. Returns how many ran.
pub fn run_pending_tasks(tasks: &mut UnboundedReceiver<ScheduledTask>) -> usize {
    let mut ran = 0;
    while let Ok(task) = tasks.try_recv() {
        task();
        ran += 1;
    }
    ran
}
