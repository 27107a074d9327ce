use crate::listener::PacketListener;
use crate::manager::{AsyncListenerHandle, ProtocolManager};
use std::fmt;
use std::sync::Arc;
use throughput_common::{Result, ThroughputError};
use tracing::{info, warn};

/// The delivery discipline packets currently go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Listener runs inline; per-connection order is preserved.
    Sync,
    /// Listener runs on queue workers; events may complete out of order.
    Async,
}

impl PipelineMode {
    pub fn toggled(self) -> Self {
        match self {
            PipelineMode::Sync => PipelineMode::Async,
            PipelineMode::Async => PipelineMode::Sync,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineMode::Sync => "sync",
            PipelineMode::Async => "async",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum PipelineState<H> {
    Sync,
    Async(H),
}

/// Owns the registration of one listener and moves it between the sync and async
/// pipelines.
///
/// The old pipeline is always torn down before the new one is built, so once a
/// transition returns at most one of them is active. Transitions take `&mut self` and
/// must only be driven from the operator command path, never from a packet callback.
pub struct PipelineController<M: ProtocolManager> {
    manager: Arc<M>,
    listener: Arc<dyn PacketListener>,
    state: PipelineState<M::Handle>,
}

impl<M: ProtocolManager> PipelineController<M> {
    /// Registers `listener` on the sync pipeline.
    pub fn install(manager: Arc<M>, listener: Arc<dyn PacketListener>) -> Self {
        manager.add_packet_listener(Arc::clone(&listener));
        info!("Installed sync packet listener");
        Self {
            manager,
            listener,
            state: PipelineState::Sync,
        }
    }

    pub fn mode(&self) -> PipelineMode {
        match self.state {
            PipelineState::Sync => PipelineMode::Sync,
            PipelineState::Async(_) => PipelineMode::Async,
        }
    }

    /// Handle of the running async pipeline, if that is the active one.
    pub fn async_handle(&self) -> Option<&M::Handle> {
        match &self.state {
            PipelineState::Sync => None,
            PipelineState::Async(handle) => Some(handle),
        }
    }

    /// Switches to the other pipeline and returns the new mode.
    ///
    /// If the async pipeline fails to start, the sync listener is registered again and
    /// the mode stays [`PipelineMode::Sync`].
    pub async fn toggle(&mut self) -> Result<PipelineMode> {
        match self.mode() {
            PipelineMode::Sync => self.switch_to_async().await?,
            PipelineMode::Async => self.switch_to_sync().await,
        }
        Ok(self.mode())
    }

    async fn switch_to_async(&mut self) -> Result<()> {
        self.manager.remove_packet_listener(&self.listener);

        let handle = self
            .manager
            .register_async_handler(Arc::clone(&self.listener));

        if let Err(err) = handle.start() {
            warn!(error = %err, "Async packet listener failed to start, restoring sync listener");
            handle.stop().await;
            self.manager.unregister_async_handler(&handle);
            self.manager.add_packet_listener(Arc::clone(&self.listener));
            return Err(ThroughputError::TransitionFailed {
                target: PipelineMode::Async.as_str(),
                reason: err.to_string(),
            });
        }

        self.state = PipelineState::Async(handle);
        info!("Switched to async packet listener");
        Ok(())
    }

    async fn switch_to_sync(&mut self) {
        let PipelineState::Async(handle) = std::mem::replace(&mut self.state, PipelineState::Sync)
        else {
            return;
        };

        handle.stop().await;
        self.manager.unregister_async_handler(&handle);
        self.manager.add_packet_listener(Arc::clone(&self.listener));
        info!("Switched to sync packet listener");
    }

    /// Removes the listener from whichever pipeline is active. Queued async events are
    /// drained first.
    pub async fn uninstall(self) {
        match self.state {
            PipelineState::Sync => {
                self.manager.remove_packet_listener(&self.listener);
            }
            PipelineState::Async(handle) => {
                handle.stop().await;
                self.manager.unregister_async_handler(&handle);
            }
        }
        info!("Uninstalled packet listener");
    }
}
