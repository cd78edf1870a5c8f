use serde::{Deserialize, Serialize};

/// Transport type for an input device, when the platform reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    Usb,
    Virtual,
    Unknown,
}

/// An input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

/// One processed block: the raw samples plus its normalized volume.
///
/// Only the block that was just read is carried; events never accumulate
/// history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEvent {
    pub samples: Vec<i16>,
    /// Loudness relative to the noise baseline, 0..=100.
    pub volume: u8,
    /// Milliseconds since the session started.
    pub elapsed_ms: u64,
    pub sample_rate: u32,
    /// Host label of the session that produced this block.
    pub label: String,
}

/// Everything a capture session reports, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Started,
    Frame(VolumeEvent),
    Stopped,
    Error(String),
}

impl CaptureEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started => "start",
            Self::Frame(_) => "frame",
            Self::Stopped => "stop",
            Self::Error(_) => "error",
        }
    }
}

/// Counters for debugging a capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub blocks_read: u64,
    pub empty_reads: u64,
    pub samples_total: u64,
    pub frames_dispatched: u64,
    /// Samples the device discarded because reads fell behind.
    pub dropped_samples: u64,
}
