use crate::models::audio_models::VolumeEvent;

/// Receiver for capture session notifications.
///
/// Called on the dispatcher's execution context, one call at a time and in
/// session order: `on_start`, any number of `on_frame`, then `on_stop`
/// (preceded by `on_error` if the session failed).
pub trait CaptureObserver: Send + Sync {
    /// Hardware recording has begun.
    fn on_start(&self);

    /// One block was read and measured.
    fn on_frame(&self, event: &VolumeEvent);

    /// The session has been torn down and the device released.
    fn on_stop(&self);

    /// Startup failed or the capture loop hit an error.
    fn on_error(&self, message: &str);
}
