use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::audio_models::CaptureEvent;
use crate::traits::capture_observer::CaptureObserver;

use super::executor::EventExecutor;

type ObserverSlot = Arc<RwLock<Option<Arc<dyn CaptureObserver>>>>;

/// Routes capture events to the single registered observer through a
/// serial executor.
///
/// The observer is resolved when the event is delivered, not when it is
/// posted. Events with no observer are dropped; nothing is buffered.
#[derive(Clone)]
pub struct FrameDispatcher {
    observer: ObserverSlot,
    executor: Arc<dyn EventExecutor>,
}

impl FrameDispatcher {
    pub fn new(executor: Arc<dyn EventExecutor>) -> Self {
        Self {
            observer: Arc::new(RwLock::new(None)),
            executor,
        }
    }

    /// Register the observer, replacing any previous one.
    pub fn set_observer(&self, observer: Arc<dyn CaptureObserver>) {
        *self.observer.write() = Some(observer);
    }

    pub fn clear_observer(&self) {
        self.observer.write().take();
    }

    pub fn has_observer(&self) -> bool {
        self.observer.read().is_some()
    }

    /// Queue `event` for delivery.
    pub fn dispatch(&self, event: CaptureEvent) {
        if !self.has_observer() {
            log::trace!("No observer registered, dropping {} event", event.kind());
            return;
        }

        let observer = Arc::clone(&self.observer);
        self.executor.post(Box::new(move || {
            let Some(observer) = observer.read().clone() else {
                return;
            };
            deliver(observer.as_ref(), &event);
        }));
    }
}

fn deliver(observer: &dyn CaptureObserver, event: &CaptureEvent) {
    match event {
        CaptureEvent::Started => observer.on_start(),
        CaptureEvent::Frame(frame) => observer.on_frame(frame),
        CaptureEvent::Stopped => observer.on_stop(),
        CaptureEvent::Error(message) => observer.on_error(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::executor::DispatchThread;
    use crate::models::audio_models::VolumeEvent;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl CaptureObserver for Recorder {
        fn on_start(&self) {
            self.calls.lock().push("start".into());
        }
        fn on_frame(&self, event: &VolumeEvent) {
            self.calls.lock().push(format!("frame:{}", event.volume));
        }
        fn on_stop(&self) {
            self.calls.lock().push("stop".into());
        }
        fn on_error(&self, message: &str) {
            self.calls.lock().push(format!("error:{}", message));
        }
    }

    fn frame(volume: u8) -> CaptureEvent {
        CaptureEvent::Frame(VolumeEvent {
            samples: vec![0; 4],
            volume,
            elapsed_ms: 0,
            sample_rate: 16_000,
            label: String::new(),
        })
    }

    #[test]
    fn delivers_each_variant_in_order() {
        let executor = Arc::new(DispatchThread::new());
        let dispatcher = FrameDispatcher::new(executor.clone());
        let recorder = Arc::new(Recorder::default());
        dispatcher.set_observer(recorder.clone());

        dispatcher.dispatch(CaptureEvent::Started);
        dispatcher.dispatch(frame(10));
        dispatcher.dispatch(frame(20));
        dispatcher.dispatch(CaptureEvent::Error("boom".into()));
        dispatcher.dispatch(CaptureEvent::Stopped);
        executor.flush();

        assert_eq!(
            *recorder.calls.lock(),
            vec!["start", "frame:10", "frame:20", "error:boom", "stop"]
        );
    }

    #[test]
    fn events_without_observer_are_dropped() {
        let executor = Arc::new(DispatchThread::new());
        let dispatcher = FrameDispatcher::new(executor.clone());
        dispatcher.dispatch(CaptureEvent::Started);
        dispatcher.dispatch(frame(50));

        let recorder = Arc::new(Recorder::default());
        dispatcher.set_observer(recorder.clone());
        dispatcher.dispatch(CaptureEvent::Stopped);
        executor.flush();

        assert_eq!(*recorder.calls.lock(), vec!["stop"]);
    }

    #[test]
    fn cleared_observer_stops_receiving() {
        let executor = Arc::new(DispatchThread::new());
        let dispatcher = FrameDispatcher::new(executor.clone());
        let recorder = Arc::new(Recorder::default());
        dispatcher.set_observer(recorder.clone());
        dispatcher.dispatch(CaptureEvent::Started);
        executor.flush();
        dispatcher.clear_observer();
        dispatcher.dispatch(CaptureEvent::Stopped);
        executor.flush();

        assert!(!dispatcher.has_observer());
        assert_eq!(*recorder.calls.lock(), vec!["start"]);
    }
}
