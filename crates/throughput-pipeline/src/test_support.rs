use crate::dispatcher::PacketSink;
use crate::event::PacketEvent;
use crate::host::{ScheduledTask, ServerHost};
use crate::listener::PacketListener;
use crate::manager::{AsyncListenerHandle, ProtocolManager};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use throughput_common::{ClientId, Result, ThroughputError};
use throughput_protocol::chunk_batch::ChunkBatchReceivedPacket;
use throughput_protocol::chunk_data::ChunkDataPacket;
use throughput_protocol::{PacketType, PacketTypeSet, ProtocolMessage};

pub fn chunk(x: i32) -> ProtocolMessage {
    ProtocolMessage::ChunkData(ChunkDataPacket::new(x, 0, Bytes::from_static(&[1, 2, 3])))
}

pub fn ack(chunks_per_tick: f32) -> ProtocolMessage {
    ProtocolMessage::ChunkBatchReceived(ChunkBatchReceivedPacket::new(chunks_per_tick))
}

/// Listener subscribed to every packet type that only counts callbacks.
pub struct CountingListener {
    receiving: AtomicUsize,
    sending: AtomicUsize,
    cancel: bool,
}

impl CountingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            receiving: AtomicUsize::new(0),
            sending: AtomicUsize::new(0),
            cancel: false,
        })
    }

    pub fn cancelling() -> Arc<Self> {
        Arc::new(Self {
            receiving: AtomicUsize::new(0),
            sending: AtomicUsize::new(0),
            cancel: true,
        })
    }

    pub fn receiving(&self) -> usize {
        self.receiving.load(Ordering::SeqCst)
    }

    pub fn sending(&self) -> usize {
        self.sending.load(Ordering::SeqCst)
    }
}

impl PacketListener for CountingListener {
    fn packet_types(&self) -> PacketTypeSet {
        PacketType::CANDIDATES.into_iter().collect()
    }

    fn on_packet_receiving(&self, event: &mut PacketEvent) {
        self.receiving.fetch_add(1, Ordering::SeqCst);
        event.set_cancelled(self.cancel);
    }

    fn on_packet_sending(&self, event: &mut PacketEvent) {
        self.sending.fetch_add(1, Ordering::SeqCst);
        event.set_cancelled(self.cancel);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PacketEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PacketEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl PacketSink for RecordingSink {
    fn forward(&self, event: PacketEvent) {
        self.events.lock().push(event);
    }
}

/// Host that records every interaction and runs scheduled tasks on demand.
#[derive(Default)]
pub struct RecordingHost {
    pub online: Mutex<Vec<ClientId>>,
    pub messages: Mutex<Vec<(ClientId, String)>>,
    pub kicks: Mutex<Vec<(ClientId, String)>>,
    pub tasks: Mutex<Vec<ScheduledTask>>,
    pub unfiltered: Mutex<Vec<(ClientId, ProtocolMessage)>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn join(&self, client: ClientId) {
        self.online.lock().push(client);
    }

    pub fn messages_for(&self, client: ClientId) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(id, _)| *id == client)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Runs every pending task, like the start of a tick.
    pub fn tick(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task();
        }
    }
}

impl ServerHost for RecordingHost {
    fn online_clients(&self) -> Vec<ClientId> {
        self.online.lock().clone()
    }

    fn send_message(&self, client: ClientId, message: &str) {
        self.messages.lock().push((client, message.to_owned()));
    }

    fn kick(&self, client: ClientId, reason: &str) {
        self.online.lock().retain(|id| *id != client);
        self.kicks.lock().push((client, reason.to_owned()));
    }

    fn run_task(&self, task: ScheduledTask) {
        self.tasks.lock().push(task);
    }

    fn send_packet_unfiltered(&self, client: ClientId, message: ProtocolMessage) {
        self.unfiltered.lock().push((client, message));
    }
}

/// Manager that records registrations; its handles can be told to fail on start.
#[derive(Default)]
pub struct FakeManager {
    pub sync_listeners: AtomicUsize,
    pub async_handles: AtomicUsize,
    pub fail_start: AtomicBool,
    pub calls: Mutex<Vec<&'static str>>,
}

#[derive(Clone)]
pub struct FakeHandle {
    fail_start: bool,
    running: Arc<AtomicBool>,
}

#[async_trait]
impl AsyncListenerHandle for FakeHandle {
    fn start(&self) -> Result<()> {
        if self.fail_start {
            return Err(ThroughputError::AsyncHandler("refused to start".to_owned()));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl FakeManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn sync_listeners(&self) -> usize {
        self.sync_listeners.load(Ordering::SeqCst)
    }

    pub fn async_handles(&self) -> usize {
        self.async_handles.load(Ordering::SeqCst)
    }
}

impl ProtocolManager for FakeManager {
    type Handle = FakeHandle;

    fn add_packet_listener(&self, _listener: Arc<dyn PacketListener>) {
        self.calls.lock().push("add_listener");
        self.sync_listeners.fetch_add(1, Ordering::SeqCst);
    }

    fn remove_packet_listener(&self, _listener: &Arc<dyn PacketListener>) -> bool {
        self.calls.lock().push("remove_listener");
        self.sync_listeners.fetch_sub(1, Ordering::SeqCst);
        true
    }

    fn register_async_handler(&self, _listener: Arc<dyn PacketListener>) -> FakeHandle {
        self.calls.lock().push("register_async");
        self.async_handles.fetch_add(1, Ordering::SeqCst);
        FakeHandle {
            fail_start: self.fail_start.load(Ordering::SeqCst),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn unregister_async_handler(&self, _handle: &FakeHandle) -> bool {
        self.calls.lock().push("unregister_async");
        self.async_handles.fetch_sub(1, Ordering::SeqCst);
        true
    }

    fn is_supported(&self, _packet_type: PacketType) -> bool {
        true
    }
}
