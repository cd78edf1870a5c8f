use thiserror::Error;

/// Errors that can occur while starting or running a capture session.
///
/// Every variant is also delivered to the observer as an `error` event;
/// the `Result` returned to Rust callers carries the same value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission not granted")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("device configuration failed: {0}")]
    DeviceConfig(String),

    #[error("capture failed: {0}")]
    RuntimeCapture(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = CaptureError::DeviceConfig("invalid buffer size".into());
        assert_eq!(err.to_string(), "device configuration failed: invalid buffer size");
    }
}
