use crate::host::run_pending_tasks;
use crate::server::wait_for_shutdown;
use crate::session_manager::{PlannedBatch, SessionManager};
use crate::world::{spiral, GENERATED_CHUNK};
use bytes::Bytes;
use std::sync::Arc;
use throughput_common::HarnessConfig;
use throughput_logger::{log, LogSeverity::Debug};
use throughput_pipeline::{PacketDispatcher, ScheduledTask};
use throughput_protocol::chunk_batch::{ChunkBatchFinishedPacket, ChunkBatchStartPacket};
use throughput_protocol::chunk_data::ChunkDataPacket;
use throughput_protocol::ProtocolMessage;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub tasks: usize,
    pub batches: usize,
    pub chunks: usize,
}

/// The server's main tick context. Runs deferred tasks, then streams chunk batches.
pub struct TickLoop {
    tick_rate: u32,
    max_pending: u32,
    chunks: Vec<(i32, i32)>,
    chunk_data: Bytes,
    sessions: Arc<SessionManager>,
    dispatcher: Arc<PacketDispatcher>,
    tasks: UnboundedReceiver<ScheduledTask>,
}

impl TickLoop {
    pub fn new(
        config: &HarnessConfig,
        sessions: Arc<SessionManager>,
        dispatcher: Arc<PacketDispatcher>,
        tasks: UnboundedReceiver<ScheduledTask>,
    ) -> Self {
        Self {
            tick_rate: config.tick_rate.max(1),
            max_pending: config.max_unacknowledged_batches,
            chunks: spiral(config.view_distance),
            chunk_data: GENERATED_CHUNK.clone(),
            sessions,
            dispatcher,
            tasks,
        }
    }

    pub fn tick(&mut self) -> TickStats {
        let tasks = run_pending_tasks(&mut self.tasks);

        // Planning holds the session lock; dispatching must not.
        let batches = self.sessions.plan_batches(self.max_pending, self.chunks.len());
        let mut stats = TickStats {
            tasks,
            batches: batches.len(),
            chunks: 0,
        };

        for batch in batches {
            stats.chunks += self.stream(batch);
        }
        stats
    }

    fn stream(&self, batch: PlannedBatch) -> usize {
        let client = batch.client;
        let size = batch.chunks.len();

        self.dispatcher
            .dispatch_sending(client, ProtocolMessage::ChunkBatchStart(ChunkBatchStartPacket));

        for &(x, z) in &self.chunks[batch.chunks] {
            let packet = ChunkDataPacket::new(x, z, self.chunk_data.clone());
            self.dispatcher
                .dispatch_sending(client, ProtocolMessage::ChunkData(packet));
        }

        self.dispatcher.dispatch_sending(
            client,
            ProtocolMessage::ChunkBatchFinished(ChunkBatchFinishedPacket::new(size as i32)),
        );
        size
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticks = interval(Duration::from_secs(1) / self.tick_rate);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let stats = self.tick();
                    if stats.batches > 0 {
                        log(
                            format!("Streamed {} chunks in {} batches", stats.chunks, stats.batches),
                            Debug,
                        );
                    }
                }
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        // Tasks scheduled during the last tick still run.
        run_pending_tasks(&mut self.tasks);
    }
}
