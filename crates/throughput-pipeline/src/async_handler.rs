use crate::dispatcher::PacketSink;
use crate::event::PacketEvent;
use crate::listener::{invoke, PacketListener};
use crate::manager::AsyncListenerHandle;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use throughput_common::{Result, ThroughputError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerState {
    Registered,
    Running,
    Stopped,
}

struct Inner {
    id: u64,
    listener: Arc<dyn PacketListener>,
    sink: Arc<dyn PacketSink>,
    workers: usize,
    sender: Mutex<Option<UnboundedSender<PacketEvent>>>,
    receiver: Mutex<Option<UnboundedReceiver<PacketEvent>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    state: Mutex<HandlerState>,
    processed: AtomicU64,
}

impl Inner {
    fn process(&self, mut event: PacketEvent) {
        invoke(self.listener.as_ref(), &mut event);
        self.processed.fetch_add(1, Ordering::Relaxed);
        if !event.is_cancelled() {
            self.sink.forward(event);
        }
    }
}

/// Runs a listener on worker tasks fed by an unbounded queue.
///
/// With more than one worker, events may finish out of arrival order. Events are
/// queued from registration on; stopping closes the queue and drains it, so every
/// accepted event is processed exactly once.
#[derive(Clone)]
pub struct AsyncListenerHandler {
    inner: Arc<Inner>,
}

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

impl AsyncListenerHandler {
    pub fn new(listener: Arc<dyn PacketListener>, sink: Arc<dyn PacketSink>, workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
                listener,
                sink,
                workers: workers.max(1),
                sender: Mutex::new(Some(sender)),
                receiver: Mutex::new(Some(receiver)),
                tasks: Mutex::new(Vec::new()),
                state: Mutex::new(HandlerState::Registered),
                processed: AtomicU64::new(0),
            }),
        }
    }

    pub fn listener(&self) -> &Arc<dyn PacketListener> {
        &self.inner.listener
    }

    /// Events the listener has been run against so far.
    pub fn processed(&self) -> u64 {
        self.inner.processed.load(Ordering::Relaxed)
    }

    /// Queues an event. Hands it back if the handler no longer accepts events.
    pub fn enqueue(&self, event: PacketEvent) -> std::result::Result<(), PacketEvent> {
        match self.inner.sender.lock().as_ref() {
            Some(sender) => sender.send(event).map_err(|err| err.0),
            None => Err(event),
        }
    }

    pub fn same_handler(&self, other: &AsyncListenerHandler) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn worker(
        inner: Arc<Inner>,
        receiver: Arc<tokio::sync::Mutex<UnboundedReceiver<PacketEvent>>>,
        worker: usize,
    ) {
        debug!(handler = inner.id, worker, "Async listener worker started");
        loop {
            // The lock only covers the receive, so other workers process concurrently.
            let event = receiver.lock().await.recv().await;
            match event {
                Some(event) => inner.process(event),
                None => break,
            }
        }
        debug!(handler = inner.id, worker, "Async listener worker finished");
    }
}

#[async_trait]
impl AsyncListenerHandle for AsyncListenerHandler {
    fn start(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        match *state {
            HandlerState::Running => {
                return Err(ThroughputError::AsyncHandler(
                    "listener is already running".to_owned(),
                ))
            }
            HandlerState::Stopped => {
                return Err(ThroughputError::AsyncHandler(
                    "a stopped listener cannot be restarted".to_owned(),
                ))
            }
            HandlerState::Registered => {}
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            ThroughputError::AsyncHandler(format!("no async runtime available: {}", err))
        })?;

        let receiver = self.inner.receiver.lock().take().ok_or_else(|| {
            ThroughputError::AsyncHandler("event queue is already consumed".to_owned())
        })?;
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut tasks = self.inner.tasks.lock();
        for worker in 0..self.inner.workers {
            tasks.push(runtime.spawn(Self::worker(
                Arc::clone(&self.inner),
                Arc::clone(&receiver),
                worker,
            )));
        }

        *state = HandlerState::Running;
        info!(handler = self.inner.id, workers = self.inner.workers, "Async listener started");
        Ok(())
    }

    async fn stop(&self) {
        // Dropping the only sender closes the queue; workers exit once it is empty.
        drop(self.inner.sender.lock().take());

        let tasks = std::mem::take(&mut *self.inner.tasks.lock());
        if tasks.is_empty() {
            // Never started: drain inline.
            let receiver = self.inner.receiver.lock().take();
            if let Some(mut receiver) = receiver {
                while let Ok(event) = receiver.try_recv() {
                    self.inner.process(event);
                }
            }
        }

        for task in tasks {
            if let Err(err) = task.await {
                warn!(handler = self.inner.id, error = %err, "Async listener worker failed");
            }
        }

        *self.inner.state.lock() = HandlerState::Stopped;
        info!(
            handler = self.inner.id,
            processed = self.processed(),
            "Async listener stopped"
        );
    }

    fn is_running(&self) -> bool {
        *self.inner.state.lock() == HandlerState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ack, chunk, CountingListener, RecordingSink};
    use assert_matches::assert_matches;
    use throughput_common::ClientId;

    fn handler(listener: Arc<CountingListener>, sink: Arc<RecordingSink>) -> AsyncListenerHandler {
        AsyncListenerHandler::new(listener, sink, 2)
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let handler = handler(CountingListener::new(), RecordingSink::new());
        assert_matches!(handler.start(), Err(ThroughputError::AsyncHandler(_)));
        assert!(!handler.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let handler = handler(CountingListener::new(), RecordingSink::new());
        handler.start().unwrap();
        assert!(handler.is_running());
        assert_matches!(handler.start(), Err(ThroughputError::AsyncHandler(_)));
        handler.stop().await;
        assert!(!handler.is_running());
        assert_matches!(handler.start(), Err(ThroughputError::AsyncHandler(_)));
    }

    #[tokio::test]
    async fn test_stop_drains_queued_events() {
        let listener = CountingListener::new();
        let sink = RecordingSink::new();
        let handler = handler(Arc::clone(&listener), Arc::clone(&sink));

        handler.start().unwrap();
        for index in 0..50 {
            handler
                .enqueue(PacketEvent::new(ClientId::new(1), chunk(index)))
                .unwrap();
        }
        handler.stop().await;

        assert_eq!(handler.processed(), 50);
        assert_eq!(listener.sending(), 50);
        assert_eq!(sink.len(), 50);
    }

    #[tokio::test]
    async fn test_stop_before_start_processes_queue_inline() {
        let listener = CountingListener::new();
        let sink = RecordingSink::new();
        let handler = handler(Arc::clone(&listener), Arc::clone(&sink));

        handler
            .enqueue(PacketEvent::new(ClientId::new(1), ack(2.0)))
            .unwrap();
        handler.stop().await;

        assert_eq!(listener.receiving(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_after_stop_is_handed_back() {
        let handler = handler(CountingListener::new(), RecordingSink::new());
        handler.start().unwrap();
        handler.stop().await;

        let event = PacketEvent::new(ClientId::new(3), chunk(0));
        assert_eq!(handler.enqueue(event.clone()), Err(event));
    }

    #[tokio::test]
    async fn test_cancelled_events_are_not_forwarded() {
        let listener = CountingListener::cancelling();
        let sink = RecordingSink::new();
        let handler = handler(Arc::clone(&listener), Arc::clone(&sink));

        handler.start().unwrap();
        handler
            .enqueue(PacketEvent::new(ClientId::new(1), chunk(0)))
            .unwrap();
        handler.stop().await;

        assert_eq!(listener.sending(), 1);
        assert!(sink.is_empty());
    }
}
