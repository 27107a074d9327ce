//! Packet interception for the throughput harness.
//!
//! A [`PacketDispatcher`] runs registered listeners against the intercepted packet
//! types, either inline (sync) or through an [`AsyncListenerHandler`] queue (async).
//! The [`PipelineController`] swaps the [`ThroughputListener`] between the two, and
//! [`ThroughputPlugin`] exposes it all through the host's lifecycle hooks.

pub mod async_handler;
pub mod controller;
pub mod dispatcher;
pub mod event;
pub mod host;
pub mod instrumentation;
pub mod listener;
pub mod manager;
pub mod plugin;
pub mod reporter;

#[cfg(test)]
pub(crate) mod test_support;

pub use async_handler::AsyncListenerHandler;
pub use controller::{PipelineController, PipelineMode};
pub use dispatcher::{Delivery, PacketDispatcher, PacketSink};
pub use event::PacketEvent;
pub use host::{ScheduledTask, ServerHost};
pub use instrumentation::ThroughputListener;
pub use listener::PacketListener;
pub use manager::{AsyncListenerHandle, ProtocolManager};
pub use plugin::{CommandOutcome, ThroughputPlugin};
pub use reporter::ThroughputReporter;
