use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::dispatch::dispatcher::FrameDispatcher;
use crate::dispatch::executor::{DispatchThread, EventExecutor};
use crate::models::audio_models::{AudioSource, CaptureDiagnostics, CaptureEvent, VolumeEvent};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::session_info::SessionInfo;
use crate::models::state::CaptureState;
use crate::processing::volume_estimator::VolumeEstimator;
use crate::traits::capture_device::{CaptureDevice, PcmStream};
use crate::traits::capture_observer::CaptureObserver;
use crate::traits::permission::PermissionProvider;

/// Bookkeeping for the session currently owned by the controller.
struct ActiveSession {
    info: SessionInfo,
    // Cleared by `stop()`; polled once per loop iteration.
    running: Arc<AtomicBool>,
    // Cleared by teardown once the device is released.
    recording: Arc<AtomicBool>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    handle: Option<thread::JoinHandle<()>>,
}

/// Everything the sampling thread owns for one session.
struct SamplingLoop {
    stream: Arc<Mutex<Option<Box<dyn PcmStream>>>>,
    info: SessionInfo,
    running: Arc<AtomicBool>,
    recording: Arc<AtomicBool>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    dispatcher: FrameDispatcher,
}

/// Microphone capture controller.
///
/// Generic over the device backend and the platform permission check.
/// Owns at most one session at a time:
/// ```text
/// [PcmStream] → read block → [VolumeEstimator] → VolumeEvent → [FrameDispatcher] → observer
/// ```
/// `start` opens the device on the caller's thread and hands it to a
/// dedicated sampling thread; `stop` only flips an atomic flag. Teardown
/// runs on the sampling thread after its loop exits, whatever the reason.
pub struct CaptureController<D: CaptureDevice, P: PermissionProvider> {
    device: D,
    permissions: P,
    dispatcher: FrameDispatcher,
    active: Option<ActiveSession>,
}

impl<D: CaptureDevice, P: PermissionProvider> CaptureController<D, P> {
    pub fn new(device: D, permissions: P, executor: Arc<dyn EventExecutor>) -> Self {
        Self {
            device,
            permissions,
            dispatcher: FrameDispatcher::new(executor),
            active: None,
        }
    }

    /// Controller delivering events on its own [`DispatchThread`].
    pub fn with_dispatch_thread(device: D, permissions: P) -> Self {
        Self::new(device, permissions, Arc::new(DispatchThread::new()))
    }

    pub fn set_observer(&self, observer: Arc<dyn CaptureObserver>) {
        self.dispatcher.set_observer(observer);
    }

    pub fn clear_observer(&self) {
        self.dispatcher.clear_observer();
    }

    pub fn device_info(&self) -> AudioSource {
        self.device.device_info()
    }

    pub fn permissions(&self) -> &P {
        &self.permissions
    }

    pub fn has_permission(&self) -> bool {
        self.permissions.has_permission()
    }

    pub fn request_permission(&self) {
        self.permissions.request_permission();
    }

    pub fn state(&self) -> CaptureState {
        match &self.active {
            Some(session) if session.recording.load(Ordering::SeqCst) => CaptureState::Recording,
            _ => CaptureState::Idle,
        }
    }

    /// The running session, if any.
    pub fn session_info(&self) -> Option<SessionInfo> {
        self.active
            .as_ref()
            .filter(|session| session.recording.load(Ordering::SeqCst))
            .map(|session| session.info.clone())
    }

    /// Counters of the most recent session.
    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.active
            .as_ref()
            .map(|session| *session.diagnostics.lock())
            .unwrap_or_default()
    }

    /// Start a new session. Transitions: idle → recording.
    ///
    /// A session that is already running is stopped and joined first, so
    /// its `Stopped` event precedes this session's `Started`. Failures are
    /// reported to the observer as an `error` event as well as returned.
    pub fn start(&mut self, config: CaptureConfiguration) -> Result<(), CaptureError> {
        if !self.permissions.has_permission() {
            return Err(self.report(CaptureError::PermissionDenied));
        }

        self.shutdown_active();

        if let Err(e) = config.validate() {
            return Err(self.report(CaptureError::DeviceConfig(e)));
        }

        if !self.device.is_available() {
            return Err(self.report(as_device_config(CaptureError::DeviceNotAvailable)));
        }

        let format = config.format();
        let block_size = match self.device.min_block_size(&format).filter(|size| *size > 0) {
            Some(size) => size,
            None => {
                return Err(self.report(CaptureError::DeviceConfig(format!(
                    "invalid buffer size for {} Hz mono 16-bit",
                    format.sample_rate
                ))))
            }
        };

        let mut stream = match self.device.open(&format, block_size) {
            Ok(stream) => stream,
            Err(e) => return Err(self.report(as_device_config(e))),
        };

        if let Err(e) = stream.start() {
            if let Err(release_error) = stream.release() {
                log::debug!("Ignoring release failure after failed start: {}", release_error);
            }
            return Err(self.report(as_device_config(e)));
        }

        let info = SessionInfo::new(format, block_size, config.label);
        let running = Arc::new(AtomicBool::new(true));
        let recording = Arc::new(AtomicBool::new(true));
        let diagnostics = Arc::new(Mutex::new(CaptureDiagnostics::default()));
        let stream = Arc::new(Mutex::new(Some(stream)));

        log::info!(
            "Capture session {} started: {} Hz, block {} samples ({} ms)",
            info.id,
            format.sample_rate,
            block_size,
            info.block_duration_ms()
        );
        self.dispatcher.dispatch(CaptureEvent::Started);

        let sampling = SamplingLoop {
            stream: Arc::clone(&stream),
            info: info.clone(),
            running: Arc::clone(&running),
            recording: Arc::clone(&recording),
            diagnostics: Arc::clone(&diagnostics),
            dispatcher: self.dispatcher.clone(),
        };

        let handle = match thread::Builder::new()
            .name("audio-record".into())
            .spawn(move || sampling.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                // The closure never ran; reclaim the device and tear down here.
                let error =
                    CaptureError::DeviceConfig(format!("failed to spawn sampling thread: {}", e));
                self.dispatcher.dispatch(CaptureEvent::Error(error.to_string()));
                if let Some(stream) = stream.lock().take() {
                    teardown(stream, &recording, &self.dispatcher, &info.id);
                }
                return Err(error);
            }
        };

        self.active = Some(ActiveSession {
            info,
            running,
            recording,
            diagnostics,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Request the running session to stop. Never blocks.
    ///
    /// The sampling loop notices within one device read. Calling this when
    /// idle, or more than once, has no further effect.
    pub fn stop(&self) {
        if let Some(session) = &self.active {
            if session.running.swap(false, Ordering::SeqCst) {
                log::debug!("Stop requested for capture session {}", session.info.id);
            }
        }
    }

    /// Stop the active session and wait for its teardown to finish.
    fn shutdown_active(&mut self) {
        let Some(mut session) = self.active.take() else {
            return;
        };
        session.running.store(false, Ordering::SeqCst);
        if let Some(handle) = session.handle.take() {
            if handle.join().is_err() {
                log::error!("Sampling thread for session {} panicked", session.info.id);
            }
        }
    }

    fn report(&self, error: CaptureError) -> CaptureError {
        log::warn!("Capture failed to start: {}", error);
        self.dispatcher.dispatch(CaptureEvent::Error(error.to_string()));
        error
    }
}

impl<D: CaptureDevice, P: PermissionProvider> Drop for CaptureController<D, P> {
    fn drop(&mut self) {
        self.shutdown_active();
    }
}

impl SamplingLoop {
    fn run(self) {
        let Some(mut stream) = self.stream.lock().take() else {
            return;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.capture(stream.as_mut())))
            .unwrap_or_else(|_| Err(CaptureError::RuntimeCapture("capture loop panicked".into())));

        if let Err(e) = outcome {
            log::error!("Capture session {} failed: {}", self.info.id, e);
            self.dispatcher.dispatch(CaptureEvent::Error(e.to_string()));
        }

        teardown(stream, &self.recording, &self.dispatcher, &self.info.id);
    }

    /// Read → measure → dispatch until stopped or the device fails.
    fn capture(&self, stream: &mut dyn PcmStream) -> Result<(), CaptureError> {
        let mut estimator = VolumeEstimator::new();
        let mut buffer = vec![0i16; self.info.block_size];

        while self.running.load(Ordering::SeqCst) && stream.is_recording() {
            let read = stream.read(&mut buffer)?.min(buffer.len());
            let block = &buffer[..read];

            let Some(volume) = estimator.process(block) else {
                self.diagnostics.lock().empty_reads += 1;
                continue;
            };

            {
                let mut d = self.diagnostics.lock();
                d.blocks_read += 1;
                d.samples_total += read as u64;
                d.dropped_samples = stream.dropped_samples();
            }

            if !self.dispatcher.has_observer() {
                continue;
            }

            let event = VolumeEvent {
                samples: block.to_vec(),
                volume,
                elapsed_ms: self.info.elapsed_ms(),
                sample_rate: self.info.format.sample_rate,
                label: self.info.label.clone(),
            };
            log::trace!("Block of {} samples, volume {}", read, volume);
            self.dispatcher.dispatch(CaptureEvent::Frame(event));
            self.diagnostics.lock().frames_dispatched += 1;
        }

        // The device may have stopped recording because of an error it
        // reported between reads.
        match stream.take_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Halt and release the device, then announce the stop. Release errors are
/// logged and dropped; `Stopped` is always emitted.
fn teardown(
    mut stream: Box<dyn PcmStream>,
    recording: &AtomicBool,
    dispatcher: &FrameDispatcher,
    session_id: &str,
) {
    if let Err(e) = stream.stop() {
        log::debug!("Ignoring stop failure during teardown: {}", e);
    }
    if let Err(e) = stream.release() {
        log::debug!("Ignoring release failure during teardown: {}", e);
    }
    drop(stream);

    recording.store(false, Ordering::SeqCst);
    log::info!("Capture session {} stopped", session_id);
    dispatcher.dispatch(CaptureEvent::Stopped);
}

fn as_device_config(error: CaptureError) -> CaptureError {
    match error {
        CaptureError::DeviceConfig(_) | CaptureError::PermissionDenied => error,
        other => CaptureError::DeviceConfig(other.to_string()),
    }
}
