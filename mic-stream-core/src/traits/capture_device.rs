use crate::models::audio_models::AudioSource;
use crate::models::config::PcmFormat;
use crate::models::error::CaptureError;

/// A microphone that can be opened as a blocking PCM stream.
///
/// Implemented by:
/// - `CpalMicDevice` (mic-stream-cpal)
/// - scripted devices in tests
pub trait CaptureDevice: Send + Sync {
    /// Whether an input device is present at all.
    fn is_available(&self) -> bool;

    /// Smallest read size, in samples, the device supports for `format`.
    ///
    /// `None` means the format cannot be captured.
    fn min_block_size(&self, format: &PcmFormat) -> Option<usize>;

    /// Open and initialize the device. Recording does not begin until
    /// [`PcmStream::start`].
    fn open(
        &self,
        format: &PcmFormat,
        block_size: usize,
    ) -> Result<Box<dyn PcmStream>, CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}

/// An opened capture device handle.
///
/// Owned by the sampling thread once the session starts.
pub trait PcmStream: Send {
    /// Begin hardware recording.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Whether the hardware is still recording.
    fn is_recording(&self) -> bool;

    /// Block until samples are available and copy up to `buf.len()` of them.
    ///
    /// May return 0 (for example on a read timeout); callers skip empty reads.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError>;

    /// Halt hardware recording.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Release the device. The stream is not used afterwards.
    fn release(&mut self) -> Result<(), CaptureError>;

    /// Take an error the device reported outside of `read`, such as a
    /// platform error callback that also ended recording.
    fn take_error(&mut self) -> Option<CaptureError> {
        None
    }

    /// Samples discarded so far because the reader fell behind.
    fn dropped_samples(&self) -> u64 {
        0
    }
}
