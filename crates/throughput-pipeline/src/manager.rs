use crate::listener::PacketListener;
use async_trait::async_trait;
use std::sync::Arc;
use throughput_common::Result;
use throughput_protocol::PacketType;

/// Queue-backed listener registration owned by a [`ProtocolManager`].
#[async_trait]
pub trait AsyncListenerHandle: Send + Sync {
    /// Starts processing queued events.
    fn start(&self) -> Result<()>;

    /// Stops accepting events and returns once every queued event has been handled.
    async fn stop(&self);

    fn is_running(&self) -> bool;
}

/// Listener registry of the packet interception layer.
pub trait ProtocolManager: Send + Sync {
    type Handle: AsyncListenerHandle;

    /// Registers a listener invoked inline on the thread handling the packet.
    fn add_packet_listener(&self, listener: Arc<dyn PacketListener>);

    /// Returns false if the listener was not registered.
    fn remove_packet_listener(&self, listener: &Arc<dyn PacketListener>) -> bool;

    /// Registers `listener` behind an event queue. Nothing is processed until the
    /// returned handle is started.
    fn register_async_handler(&self, listener: Arc<dyn PacketListener>) -> Self::Handle;

    /// Returns false if the handle was not registered.
    fn unregister_async_handler(&self, handle: &Self::Handle) -> bool;

    /// Whether the running protocol version has this packet type.
    fn is_supported(&self, packet_type: PacketType) -> bool;
}
