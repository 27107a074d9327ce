use crate::event::PacketEvent;
use crate::host::ServerHost;
use crate::listener::PacketListener;
use crate::reporter::ThroughputReporter;
use bytes::Bytes;
use std::sync::Arc;
use throughput_common::SendMode;
use throughput_protocol::chunk_section::EMPTY_CHUNK;
use throughput_protocol::{PacketType, PacketTypeSet};
use tracing::{debug, warn};

/// The measuring listener shared by both pipelines.
///
/// Inbound acknowledgements are reported back to their sender. Outbound chunk and batch
/// packets pass through unless a [`SendMode`] says otherwise.
pub struct ThroughputListener {
    packet_types: PacketTypeSet,
    send_mode: SendMode,
    reporter: ThroughputReporter,
    host: Arc<dyn ServerHost>,
    empty_chunk: Bytes,
}

impl ThroughputListener {
    pub fn new(packet_types: PacketTypeSet, send_mode: SendMode, host: Arc<dyn ServerHost>) -> Self {
        Self {
            packet_types,
            send_mode,
            reporter: ThroughputReporter::new(Arc::clone(&host)),
            host,
            empty_chunk: EMPTY_CHUNK.clone(),
        }
    }

    pub fn send_mode(&self) -> SendMode {
        self.send_mode
    }
}

impl PacketListener for ThroughputListener {
    fn packet_types(&self) -> PacketTypeSet {
        self.packet_types
    }

    fn on_packet_receiving(&self, event: &mut PacketEvent) {
        if event.packet_type() != PacketType::ChunkBatchReceived {
            return;
        }

        match event.message().read_float(0) {
            Ok(chunks_per_tick) => {
                self.reporter.report(event.client(), chunks_per_tick);
            }
            Err(err) => {
                debug!(client = %event.client(), error = %err, "Skipping throughput report");
            }
        }
    }

    fn on_packet_sending(&self, event: &mut PacketEvent) {
        match self.send_mode {
            SendMode::PassThrough => {}
            SendMode::Suppress => event.set_cancelled(true),
            SendMode::Substitute => {
                if event.packet_type() == PacketType::ChunkData {
                    if let Err(err) = event.message_mut().write_buffer(0, self.empty_chunk.clone()) {
                        warn!(client = %event.client(), error = %err, "Could not substitute chunk payload");
                    }
                }
            }
            SendMode::Reschedule => {
                event.set_cancelled(true);
                let host = Arc::clone(&self.host);
                let client = event.client();
                let message = event.message().clone();
                self.host.run_task(Box::new(move || {
                    host.send_packet_unfiltered(client, message);
                }));
            }
        }
    }
}
