//! Scripted capture device and recording observer shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::dispatch::executor::DispatchThread;
use crate::models::audio_models::{AudioSource, CaptureEvent, VolumeEvent};
use crate::models::config::PcmFormat;
use crate::models::error::CaptureError;
use crate::traits::capture_device::{CaptureDevice, PcmStream};
use crate::traits::capture_observer::CaptureObserver;
use crate::traits::permission::PermissionProvider;

#[derive(Clone, Default)]
pub(crate) struct DeviceOptions {
    pub(crate) block_size: Option<usize>,
    pub(crate) open_error: Option<CaptureError>,
    pub(crate) start_error: Option<CaptureError>,
    pub(crate) release_error: bool,
    // After the script runs out: Some(err) fails the read, None idles.
    pub(crate) exhausted_error: Option<CaptureError>,
    // After the script runs out the hardware reports it stopped.
    pub(crate) stop_recording_when_exhausted: bool,
    pub(crate) unavailable: bool,
    pub(crate) dropped_samples: u64,
    pub(crate) fault: Option<Arc<StreamFault>>,
}

/// A device failure reported from outside `read`, the way a platform error
/// callback does: it ends recording and parks the error for `take_error`.
#[derive(Default)]
pub(crate) struct StreamFault {
    error: Mutex<Option<CaptureError>>,
}

impl StreamFault {
    pub(crate) fn fail(&self, message: &str) {
        *self.error.lock() = Some(CaptureError::RuntimeCapture(message.into()));
    }

    fn is_set(&self) -> bool {
        self.error.lock().is_some()
    }

    fn take(&self) -> Option<CaptureError> {
        self.error.lock().take()
    }
}

pub(crate) struct ScriptedDevice {
    options: DeviceOptions,
    script: Vec<Vec<i16>>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDevice {
    pub(crate) fn new(script: Vec<Vec<i16>>) -> Self {
        Self::with_options(
            script,
            DeviceOptions {
                block_size: Some(320),
                ..Default::default()
            },
        )
    }

    pub(crate) fn with_options(script: Vec<Vec<i16>>, options: DeviceOptions) -> Self {
        Self {
            options,
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub(crate) struct ScriptedStream {
    options: DeviceOptions,
    script: VecDeque<Vec<i16>>,
    recording: bool,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
}

impl CaptureDevice for ScriptedDevice {
    fn is_available(&self) -> bool {
        !self.options.unavailable
    }

    fn min_block_size(&self, _format: &PcmFormat) -> Option<usize> {
        self.options.block_size
    }

    fn open(
        &self,
        format: &PcmFormat,
        block_size: usize,
    ) -> Result<Box<dyn PcmStream>, CaptureError> {
        self.calls
            .lock()
            .push(format!("open:{}:{}", format.sample_rate, block_size));
        if let Some(e) = self.options.open_error.clone() {
            return Err(e);
        }
        Ok(Box::new(ScriptedStream {
            options: self.options.clone(),
            script: self.script.clone().into(),
            recording: false,
            calls: Arc::clone(&self.calls),
        }))
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "scripted".into(),
            name: "Scripted Mic".into(),
            is_default: true,
            transport_type: None,
        }
    }
}

impl PcmStream for ScriptedStream {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.calls.lock().push("start".into());
        if let Some(e) = self.options.start_error.clone() {
            return Err(e);
        }
        self.recording = true;
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording && !self.options.fault.as_ref().is_some_and(|fault| fault.is_set())
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        if let Some(block) = self.script.pop_front() {
            let n = block.len().min(buf.len());
            buf[..n].copy_from_slice(&block[..n]);
            return Ok(n);
        }
        if let Some(e) = self.options.exhausted_error.clone() {
            return Err(e);
        }
        if self.options.stop_recording_when_exhausted {
            self.recording = false;
            return Ok(0);
        }
        thread::sleep(Duration::from_millis(2));
        Ok(0)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.calls.lock().push("stop".into());
        self.recording = false;
        Ok(())
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        self.calls.lock().push("release".into());
        if self.options.release_error {
            return Err(CaptureError::RuntimeCapture("release failed".into()));
        }
        Ok(())
    }

    fn take_error(&mut self) -> Option<CaptureError> {
        self.options.fault.as_ref().and_then(|fault| fault.take())
    }

    fn dropped_samples(&self) -> u64 {
        self.options.dropped_samples
    }
}

pub(crate) struct TogglePermission(pub(crate) AtomicBool);

impl PermissionProvider for TogglePermission {
    fn has_permission(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn request_permission(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct EventLog {
    pub(crate) events: Mutex<Vec<CaptureEvent>>,
}

impl EventLog {
    pub(crate) fn snapshot(&self) -> Vec<CaptureEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(CaptureEvent::kind).collect()
    }

    pub(crate) fn frames(&self) -> Vec<VolumeEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                CaptureEvent::Frame(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl CaptureObserver for EventLog {
    fn on_start(&self) {
        self.events.lock().push(CaptureEvent::Started);
    }
    fn on_frame(&self, event: &VolumeEvent) {
        self.events.lock().push(CaptureEvent::Frame(event.clone()));
    }
    fn on_stop(&self) {
        self.events.lock().push(CaptureEvent::Stopped);
    }
    fn on_error(&self, message: &str) {
        self.events.lock().push(CaptureEvent::Error(message.to_string()));
    }
}

pub(crate) fn silence(blocks: usize) -> Vec<Vec<i16>> {
    vec![vec![0; 320]; blocks]
}

/// Flush `executor` and poll `condition` until it holds, failing after 5s.
pub(crate) fn wait_until(
    executor: &DispatchThread,
    log: &EventLog,
    mut condition: impl FnMut(&EventLog) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        executor.flush();
        if condition(log) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out; events: {:?}", log.kinds());
        thread::sleep(Duration::from_millis(2));
    }
}
