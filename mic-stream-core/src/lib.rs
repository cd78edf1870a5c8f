//! # mic-stream-core
//!
//! Platform-agnostic microphone streaming core.
//!
//! Runs the capture loop, measures each PCM block against an adaptive noise
//! baseline and delivers the results to one observer in order. Platform
//! backends (cpal, test doubles) implement `CaptureDevice` and
//! `PermissionProvider` and plug into the generic `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! mic-stream-core (this crate)
//! ├── traits/       ← CaptureDevice, PcmStream, CaptureObserver, PermissionProvider
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, VolumeEvent, SessionInfo
//! ├── processing/   ← VolumeEstimator, RingBuffer, PCM conversions
//! ├── dispatch/     ← FrameDispatcher, EventExecutor, DispatchThread
//! ├── session/      ← CaptureController (start/stop, sampling thread)
//! └── bridge/       ← host JSON messages, HostBridge observer, RecorderPlugin facade
//! ```

pub mod bridge;
pub mod dispatch;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use bridge::host_bridge::{HostBridge, HostSink};
pub use bridge::messages::{
    FrameMessage, HostMessage, HostParams, PermissionStatus, StatusEvent, StatusMessage, StopAck,
};
pub use bridge::plugin::{request_permission, RecorderPlugin, PERMISSION_RECHECK_DELAY};
pub use dispatch::dispatcher::FrameDispatcher;
pub use dispatch::executor::{DispatchThread, EventExecutor, Task};
pub use models::audio_models::{
    AudioSource, AudioTransportType, CaptureDiagnostics, CaptureEvent, VolumeEvent,
};
pub use models::config::{CaptureConfiguration, PcmFormat, DEFAULT_SAMPLE_RATE};
pub use models::error::CaptureError;
pub use models::session_info::SessionInfo;
pub use models::state::CaptureState;
pub use processing::ring_buffer::RingBuffer;
pub use processing::pcm::StreamResampler;
pub use processing::volume_estimator::{NoiseBaseline, VolumeEstimator, VolumeReading};
pub use session::controller::CaptureController;
pub use traits::capture_device::{CaptureDevice, PcmStream};
pub use traits::capture_observer::CaptureObserver;
pub use traits::permission::{AlwaysGranted, PermissionProvider};
