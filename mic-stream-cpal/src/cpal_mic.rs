//! cpal microphone capture device.
//!
//! cpal delivers audio by callback on a platform thread and its `Stream` is
//! not `Send` everywhere, so each opened stream lives on a dedicated thread
//! that owns it and takes play/pause/release commands over a channel. The
//! callback converts every buffer to mono i16 at the requested rate and
//! pushes it into a ring buffer; `read` blocks on a condvar until a full
//! block is available.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig, SupportedBufferSize, SupportedStreamConfig};
use parking_lot::{Condvar, Mutex};

use mic_stream_core::models::audio_models::AudioSource;
use mic_stream_core::models::config::PcmFormat;
use mic_stream_core::models::error::CaptureError;
use mic_stream_core::processing::pcm::{self, StreamResampler};
use mic_stream_core::processing::ring_buffer::RingBuffer;
use mic_stream_core::traits::capture_device::{CaptureDevice, PcmStream};

use crate::device_enumerator;

/// How long `read` waits for a full block before returning 0.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Seconds of audio buffered between the callback and the sampling thread.
const BUFFER_SECONDS: usize = 2;

/// Microphone capture through cpal's default host.
///
/// The device is looked up by name each time it is needed, so a
/// `CpalMicDevice` stays valid across hot-plugging.
#[derive(Debug, Clone, Default)]
pub struct CpalMicDevice {
    device_name: Option<String>,
}

impl CpalMicDevice {
    /// The system default input device.
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    /// A specific input device, matched by its cpal name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl CaptureDevice for CpalMicDevice {
    fn is_available(&self) -> bool {
        resolve_device(self.device_name.as_deref()).is_some()
    }

    fn min_block_size(&self, format: &PcmFormat) -> Option<usize> {
        if format.channels != 1 || format.bit_depth != 16 || format.sample_rate == 0 {
            return None;
        }
        let device = resolve_device(self.device_name.as_deref())?;
        match negotiate(&device, format.sample_rate) {
            Ok(negotiated) => Some(block_size_for(
                negotiated.supported.buffer_size(),
                negotiated.supported.sample_rate().0,
                format.sample_rate,
            )),
            Err(e) => {
                log::warn!("No usable input configuration: {}", e);
                None
            }
        }
    }

    fn open(
        &self,
        format: &PcmFormat,
        block_size: usize,
    ) -> Result<Box<dyn PcmStream>, CaptureError> {
        let stream =
            CpalPcmStream::open(self.device_name.clone(), format.sample_rate, block_size)?;
        Ok(Box::new(stream))
    }

    fn device_info(&self) -> AudioSource {
        let resolved = resolve_device(self.device_name.as_deref())
            .and_then(|device| device.name().ok());
        let name = resolved
            .or_else(|| self.device_name.clone())
            .unwrap_or_else(|| "Default Microphone".into());
        let is_default = self.device_name.is_none() || device_enumerator::is_default_input(&name);

        AudioSource {
            id: name.clone(),
            transport_type: device_enumerator::transport_from_name(&name),
            name,
            is_default,
        }
    }
}

fn resolve_device(name: Option<&str>) -> Option<Device> {
    match name {
        Some(name) => device_enumerator::find_input_device(name),
        None => cpal::default_host().default_input_device(),
    }
}

/// Native stream configuration chosen for a target rate.
struct Negotiated {
    supported: SupportedStreamConfig,
}

impl Negotiated {
    fn stream_config(&self) -> StreamConfig {
        self.supported.config()
    }

    fn sample_format(&self) -> SampleFormat {
        self.supported.sample_format()
    }
}

fn is_convertible(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16)
}

/// Prefer a native configuration that runs at `target_rate` directly (fewest
/// channels first); otherwise fall back to the device default and resample.
fn negotiate(device: &Device, target_rate: u32) -> Result<Negotiated, CaptureError> {
    let exact = device
        .supported_input_configs()
        .map_err(|e| CaptureError::DeviceConfig(e.to_string()))?
        .filter(|range| is_convertible(range.sample_format()))
        .filter(|range| {
            range.min_sample_rate().0 <= target_rate && target_rate <= range.max_sample_rate().0
        })
        .min_by_key(|range| range.channels())
        .map(|range| range.with_sample_rate(cpal::SampleRate(target_rate)));

    let supported = match exact {
        Some(config) => config,
        None => device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceConfig(e.to_string()))?,
    };

    if !is_convertible(supported.sample_format()) {
        return Err(CaptureError::DeviceConfig(format!(
            "unsupported sample format {:?}",
            supported.sample_format()
        )));
    }

    Ok(Negotiated { supported })
}

/// Block size in samples at `target_rate`.
///
/// Never smaller than 20 ms of audio; grows to the device's minimum period
/// when the device reports one.
pub(crate) fn block_size_for(
    buffer_size: &SupportedBufferSize,
    native_rate: u32,
    target_rate: u32,
) -> usize {
    let floor = (target_rate / 50).max(1) as usize;
    match buffer_size {
        SupportedBufferSize::Range { min, .. } if native_rate > 0 => {
            let scaled = (*min as u64 * target_rate as u64 / native_rate as u64) as usize;
            scaled.max(floor)
        }
        _ => floor,
    }
}

/// State shared between the cpal callback and the reader.
struct Buffered {
    ring: RingBuffer,
    error: Option<String>,
}

struct Shared {
    state: Mutex<Buffered>,
    ready: Condvar,
    recording: AtomicBool,
}

impl Shared {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(Buffered {
                ring: RingBuffer::new(capacity),
                error: None,
            }),
            ready: Condvar::new(),
            recording: AtomicBool::new(false),
        }
    }

    fn push(&self, samples: &[i16]) {
        self.state.lock().ring.write(samples);
        self.ready.notify_one();
    }

    fn fail(&self, message: String) {
        self.state.lock().error = Some(message);
        self.recording.store(false, Ordering::SeqCst);
        self.ready.notify_all();
    }
}

type Reply = mpsc::Sender<Result<(), CaptureError>>;

/// Commands sent to the thread that owns the cpal stream.
enum StreamCommand {
    Play(Reply),
    Pause(Reply),
    Release,
}

/// An opened cpal input stream.
///
/// The platform stream itself stays on the "cpal-mic-stream" thread; this
/// handle only holds the command channel and the shared sample buffer.
pub struct CpalPcmStream {
    commands: mpsc::Sender<StreamCommand>,
    shared: Arc<Shared>,
    block_size: usize,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl CpalPcmStream {
    fn open(
        device_name: Option<String>,
        target_rate: u32,
        block_size: usize,
    ) -> Result<Self, CaptureError> {
        let capacity = (target_rate as usize * BUFFER_SECONDS).max(block_size * 2);
        let shared = Arc::new(Shared::new(capacity));
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_shared = Arc::clone(&shared);
        let thread_handle = thread::Builder::new()
            .name("cpal-mic-stream".into())
            .spawn(move || {
                run_stream_thread(device_name, target_rate, thread_shared, ready_tx, command_rx)
            })
            .map_err(|e| {
                CaptureError::DeviceConfig(format!("failed to spawn stream thread: {}", e))
            })?;

        let opened = ready_rx.recv().unwrap_or_else(|_| {
            Err(CaptureError::DeviceConfig("stream thread exited during setup".into()))
        });

        if let Err(e) = opened {
            let _ = thread_handle.join();
            return Err(e);
        }

        Ok(Self {
            commands: command_tx,
            shared,
            block_size,
            thread_handle: Some(thread_handle),
        })
    }

    fn command(&self, make: impl FnOnce(Reply) -> StreamCommand) -> Result<(), CaptureError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(make(reply_tx))
            .map_err(|_| CaptureError::RuntimeCapture("stream thread is gone".into()))?;
        reply_rx
            .recv()
            .map_err(|_| CaptureError::RuntimeCapture("stream thread is gone".into()))?
    }
}

impl PcmStream for CpalPcmStream {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.shared.state.lock().ring.reset();
        self.command(StreamCommand::Play)?;
        self.shared.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::SeqCst)
    }

    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        let wanted = buf.len().min(self.block_size.max(1));
        let deadline = Instant::now() + READ_TIMEOUT;
        let mut state = self.shared.state.lock();

        while state.ring.count() < wanted && state.error.is_none() {
            if self.shared.ready.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }

        if let Some(message) = state.error.take() {
            return Err(CaptureError::RuntimeCapture(message));
        }
        if state.ring.count() < wanted {
            return Ok(0);
        }
        Ok(state.ring.read_into(&mut buf[..wanted]))
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.shared.recording.store(false, Ordering::SeqCst);
        self.command(StreamCommand::Pause)
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        self.shared.recording.store(false, Ordering::SeqCst);
        let Some(handle) = self.thread_handle.take() else {
            return Ok(());
        };
        let _ = self.commands.send(StreamCommand::Release);
        handle
            .join()
            .map_err(|_| CaptureError::RuntimeCapture("stream thread panicked".into()))
    }

    fn take_error(&mut self) -> Option<CaptureError> {
        self.shared.state.lock().error.take().map(CaptureError::RuntimeCapture)
    }

    fn dropped_samples(&self) -> u64 {
        self.shared.state.lock().ring.dropped()
    }
}

impl Drop for CpalPcmStream {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release cpal stream: {}", e);
        }
    }
}

/// Owns the cpal stream for its whole life.
fn run_stream_thread(
    device_name: Option<String>,
    target_rate: u32,
    shared: Arc<Shared>,
    ready: Reply,
    commands: mpsc::Receiver<StreamCommand>,
) {
    let stream = match build_stream(device_name.as_deref(), target_rate, shared) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Play(reply) => {
                let result = stream.play().map_err(|e| CaptureError::DeviceConfig(e.to_string()));
                let _ = reply.send(result);
            }
            StreamCommand::Pause(reply) => {
                let result = stream
                    .pause()
                    .map_err(|e| CaptureError::RuntimeCapture(e.to_string()));
                let _ = reply.send(result);
            }
            StreamCommand::Release => break,
        }
    }

    drop(stream);
    log::debug!("cpal input stream released");
}

fn build_stream(
    device_name: Option<&str>,
    target_rate: u32,
    shared: Arc<Shared>,
) -> Result<cpal::Stream, CaptureError> {
    let device = resolve_device(device_name).ok_or(CaptureError::DeviceNotAvailable)?;
    let negotiated = negotiate(&device, target_rate)?;
    let config = negotiated.stream_config();

    log::info!(
        "Opening input '{}': {} Hz, {} channels, {:?} → {} Hz mono",
        device.name().unwrap_or_else(|_| "unknown".into()),
        config.sample_rate.0,
        config.channels,
        negotiated.sample_format(),
        target_rate
    );

    let result = match negotiated.sample_format() {
        SampleFormat::F32 => build_typed_stream::<f32>(&device, &config, target_rate, shared),
        SampleFormat::I16 => build_typed_stream::<i16>(&device, &config, target_rate, shared),
        SampleFormat::U16 => build_typed_stream::<u16>(&device, &config, target_rate, shared),
        other => {
            return Err(CaptureError::DeviceConfig(format!(
                "unsupported sample format {:?}",
                other
            )));
        }
    };
    result.map_err(|e| CaptureError::DeviceConfig(e.to_string()))
}

fn build_typed_stream<T>(
    device: &Device,
    config: &StreamConfig,
    target_rate: u32,
    shared: Arc<Shared>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = config.channels as usize;
    let native_rate = config.sample_rate.0;
    let error_shared = Arc::clone(&shared);
    let mut resampler = StreamResampler::new(native_rate, target_rate);

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let floats: Vec<f32> = data.iter().map(|s| cpal::Sample::from_sample(*s)).collect();
            let mono = pcm::downmix_to_mono(&floats, channels);
            let samples = pcm::to_i16(&resampler.process(&mono));
            shared.push(&samples);
        },
        move |err| {
            log::error!("Audio input stream error: {}", err);
            error_shared.fail(err.to_string());
        },
        None,
    )
}
