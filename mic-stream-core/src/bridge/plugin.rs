use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::state::CaptureState;
use crate::session::controller::CaptureController;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::permission::PermissionProvider;

use super::host_bridge::{HostBridge, HostSink};
use super::messages::{HostParams, PermissionStatus, StopAck, STOPPED_MESSAGE};

/// How long to wait for the consent flow before re-checking.
pub const PERMISSION_RECHECK_DELAY: Duration = Duration::from_millis(1000);

/// Ask for microphone access and report the outcome.
///
/// Returns at once when access is already granted; otherwise starts the
/// platform consent flow, waits `wait` and checks again.
pub fn request_permission(provider: &dyn PermissionProvider, wait: Duration) -> PermissionStatus {
    if provider.has_permission() {
        return PermissionStatus {
            granted: true,
            message: "microphone permission already granted".into(),
        };
    }

    provider.request_permission();
    thread::sleep(wait);

    if provider.has_permission() {
        PermissionStatus {
            granted: true,
            message: "microphone permission granted".into(),
        }
    } else {
        log::warn!("Microphone permission denied by user");
        PermissionStatus {
            granted: false,
            message: "microphone permission denied".into(),
        }
    }
}

/// Host-facing facade: the three calls a host runtime makes.
///
/// Errors never cross this boundary; they reach the host as `error`
/// messages on the sink registered by `start_record`.
pub struct RecorderPlugin<D: CaptureDevice, P: PermissionProvider> {
    controller: CaptureController<D, P>,
}

impl<D: CaptureDevice, P: PermissionProvider> RecorderPlugin<D, P> {
    pub fn new(controller: CaptureController<D, P>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &CaptureController<D, P> {
        &self.controller
    }

    pub fn state(&self) -> CaptureState {
        self.controller.state()
    }

    pub fn request_permission(&self, wait: Duration) -> PermissionStatus {
        request_permission(self.controller.permissions(), wait)
    }

    /// Route events to `sink` and start a session with `params`.
    pub fn start_record(&mut self, params: HostParams, sink: Arc<dyn HostSink>) {
        self.controller.set_observer(HostBridge::new(sink));
        if let Err(e) = self.controller.start(params.into_config()) {
            log::debug!("start_record failed: {}", e);
        }
    }

    /// Ask the session to stop. The host's `stop` message arrives on the
    /// sink once teardown completes.
    pub fn stop_record(&self) -> StopAck {
        self.controller.stop();
        StopAck {
            message: STOPPED_MESSAGE.into(),
        }
    }
}
