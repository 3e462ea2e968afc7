use sitegrab_core::WorkerEvent;

/// Push-based delivery of protocol events out of the pipeline. Job
/// results never travel through return values; everything the observer
/// sees flows through a sink.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkerEvent);
}

/// Sink backed by an in-process channel, for embedding and tests.
pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<WorkerEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<WorkerEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.tx.send(event);
    }
}
