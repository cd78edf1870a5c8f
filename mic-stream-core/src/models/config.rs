use serde::{Deserialize, Serialize};

/// Sample rate used when the host supplies none or a non-positive one.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// PCM layout of the capture stream.
///
/// Capture is always mono, signed 16-bit; only the rate varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl PcmFormat {
    pub fn mono_i16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            bit_depth: 16,
        }
    }
}

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Requested sample rate in Hz (default: 16000).
    pub sample_rate: u32,

    /// Opaque label supplied by the host, echoed back on every frame.
    pub label: String,
}

impl CaptureConfiguration {
    pub fn new(sample_rate: u32, label: impl Into<String>) -> Self {
        Self {
            sample_rate,
            label: label.into(),
        }
    }

    /// Build a configuration from a host-supplied rate, which may be
    /// missing, zero or negative.
    pub fn from_host(sample_rate: Option<i64>, label: Option<String>) -> Self {
        let sample_rate = sample_rate
            .filter(|rate| *rate > 0)
            .and_then(|rate| u32::try_from(rate).ok())
            .unwrap_or(DEFAULT_SAMPLE_RATE);
        Self {
            sample_rate,
            label: label.unwrap_or_default(),
        }
    }

    pub fn format(&self) -> PcmFormat {
        PcmFormat::mono_i16(self.effective_sample_rate())
    }

    /// The rate actually used for capture.
    pub fn effective_sample_rate(&self) -> u32 {
        if self.sample_rate == 0 {
            DEFAULT_SAMPLE_RATE
        } else {
            self.sample_rate
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let rate = self.effective_sample_rate();
        if rate > 1_000_000 {
            return Err(format!("unsupported sample rate: {}", rate));
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            label: String::new(),
        }
    }
}
