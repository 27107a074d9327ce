use crate::async_handler::AsyncListenerHandler;
use crate::event::PacketEvent;
use crate::listener::{invoke, wants, PacketListener};
use crate::manager::ProtocolManager;
use parking_lot::RwLock;
use std::sync::Arc;
use throughput_common::ClientId;
use throughput_protocol::{PacketType, ProtocolMessage};
use tracing::{debug, trace};

/// Final destination of packets that made it through every listener.
pub trait PacketSink: Send + Sync {
    fn forward(&self, event: PacketEvent);
}

/// What happened to a dispatched packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the sink before returning.
    Forwarded,
    /// A listener cancelled it.
    Cancelled,
    /// Waiting in an async listener queue.
    Queued,
}

/// Both pipelines sit behind one lock, so a dispatch sees a listener in at most one.
#[derive(Default)]
struct Registry {
    listeners: Vec<Arc<dyn PacketListener>>,
    async_handlers: Vec<AsyncListenerHandler>,
}

/// In-process packet interception layer.
///
/// Sync listeners run on the caller in registration order. A packet that survives them
/// goes to the first async handler subscribed to its type, or straight to the sink.
/// Each dispatch routes by a single snapshot of the registry, so a pipeline swap
/// racing with it never runs the same listener twice for one event.
pub struct PacketDispatcher {
    protocol_version: i32,
    async_workers: usize,
    sink: Arc<dyn PacketSink>,
    registry: RwLock<Registry>,
}

impl PacketDispatcher {
    pub fn new(protocol_version: i32, async_workers: usize, sink: Arc<dyn PacketSink>) -> Self {
        Self {
            protocol_version,
            async_workers,
            sink,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    /// Runs a packet headed to `client` through the listeners.
    pub fn dispatch_sending(&self, client: ClientId, message: ProtocolMessage) -> Delivery {
        self.dispatch(PacketEvent::new(client, message))
    }

    /// Runs a packet received from `client` through the listeners.
    pub fn dispatch_receiving(&self, client: ClientId, message: ProtocolMessage) -> Delivery {
        self.dispatch(PacketEvent::new(client, message))
    }

    fn dispatch(&self, mut event: PacketEvent) -> Delivery {
        // Snapshot so callbacks never run under the registry lock.
        let (listeners, handler) = {
            let registry = self.registry.read();
            let listeners: Vec<Arc<dyn PacketListener>> = registry
                .listeners
                .iter()
                .filter(|listener| wants(listener.as_ref(), &event))
                .cloned()
                .collect();
            let handler = registry
                .async_handlers
                .iter()
                .find(|handler| wants(handler.listener().as_ref(), &event))
                .cloned();
            (listeners, handler)
        };

        for listener in &listeners {
            invoke(listener.as_ref(), &mut event);
        }

        if event.is_cancelled() {
            trace!(client = %event.client(), packet = %event.packet_type(), "Packet cancelled");
            return Delivery::Cancelled;
        }

        if let Some(handler) = handler {
            event = match handler.enqueue(event) {
                Ok(()) => return Delivery::Queued,
                Err(mut event) => {
                    // Stopped after the snapshot was taken; its listener still owns this event.
                    debug!(
                        client = %event.client(),
                        packet = %event.packet_type(),
                        "Async listener closed, running it inline"
                    );
                    invoke(handler.listener().as_ref(), &mut event);
                    if event.is_cancelled() {
                        return Delivery::Cancelled;
                    }
                    event
                }
            };
        }

        self.sink.forward(event);
        Delivery::Forwarded
    }

    pub fn listener_count(&self) -> usize {
        self.registry.read().listeners.len()
    }

    pub fn async_handler_count(&self) -> usize {
        self.registry.read().async_handlers.len()
    }
}

impl ProtocolManager for PacketDispatcher {
    type Handle = AsyncListenerHandler;

    fn add_packet_listener(&self, listener: Arc<dyn PacketListener>) {
        let mut registry = self.registry.write();
        let listeners = &mut registry.listeners;
        if !listeners.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            listeners.push(listener);
        }
    }

    fn remove_packet_listener(&self, listener: &Arc<dyn PacketListener>) -> bool {
        let mut registry = self.registry.write();
        let listeners = &mut registry.listeners;
        let before = listeners.len();
        listeners.retain(|existing| !Arc::ptr_eq(existing, listener));
        listeners.len() != before
    }

    fn register_async_handler(&self, listener: Arc<dyn PacketListener>) -> AsyncListenerHandler {
        let handler =
            AsyncListenerHandler::new(listener, Arc::clone(&self.sink), self.async_workers);
        self.registry.write().async_handlers.push(handler.clone());
        handler
    }

    fn unregister_async_handler(&self, handle: &AsyncListenerHandler) -> bool {
        let mut registry = self.registry.write();
        let handlers = &mut registry.async_handlers;
        let before = handlers.len();
        handlers.retain(|existing| !existing.same_handler(handle));
        handlers.len() != before
    }

    fn is_supported(&self, packet_type: PacketType) -> bool {
        packet_type.is_supported(self.protocol_version)
    }
}
