use std::sync::Arc;

use crate::models::audio_models::VolumeEvent;
use crate::traits::capture_observer::CaptureObserver;

use super::messages::{FrameMessage, HostMessage, StatusEvent, STARTED_MESSAGE, STOPPED_MESSAGE};

/// Destination for bridge messages (a host callback, a socket, stdout...).
pub trait HostSink: Send + Sync {
    fn send(&self, message: &HostMessage);
}

impl<F> HostSink for F
where
    F: Fn(&HostMessage) + Send + Sync,
{
    fn send(&self, message: &HostMessage) {
        self(message)
    }
}

/// `CaptureObserver` that forwards every event to a host as a structured
/// message.
pub struct HostBridge {
    sink: Arc<dyn HostSink>,
}

impl HostBridge {
    pub fn new(sink: Arc<dyn HostSink>) -> Arc<Self> {
        Arc::new(Self { sink })
    }
}

impl CaptureObserver for HostBridge {
    fn on_start(&self) {
        self.sink
            .send(&HostMessage::status(StatusEvent::Start, STARTED_MESSAGE));
    }

    fn on_frame(&self, event: &VolumeEvent) {
        self.sink.send(&HostMessage::Frame(FrameMessage::from(event)));
    }

    fn on_stop(&self) {
        self.sink
            .send(&HostMessage::status(StatusEvent::Stop, STOPPED_MESSAGE));
    }

    fn on_error(&self, message: &str) {
        self.sink.send(&HostMessage::status(StatusEvent::Error, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn observer_calls_become_messages() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let bridge = HostBridge::new(Arc::new(move |message: &HostMessage| {
            sink.lock().push(message.clone());
        }));

        bridge.on_start();
        bridge.on_frame(&VolumeEvent {
            samples: vec![7],
            volume: 3,
            elapsed_ms: 9,
            sample_rate: 16_000,
            label: "x".into(),
        });
        bridge.on_error("bad");
        bridge.on_stop();

        let received = received.lock();
        assert_eq!(received.len(), 4);
        assert_eq!(received[0], HostMessage::status(StatusEvent::Start, STARTED_MESSAGE));
        assert!(matches!(
            &received[1],
            HostMessage::Frame(frame) if frame.buffers == vec![vec![7]]
        ));
        assert_eq!(received[2], HostMessage::status(StatusEvent::Error, "bad"));
        assert_eq!(received[3], HostMessage::status(StatusEvent::Stop, STOPPED_MESSAGE));
    }
}
