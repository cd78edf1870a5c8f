use serde::{Deserialize, Serialize};

use crate::models::audio_models::VolumeEvent;
use crate::models::config::CaptureConfiguration;

pub const STARTED_MESSAGE: &str = "recording started";
pub const STOPPED_MESSAGE: &str = "recording stopped";

/// Lifecycle event names as the host expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusEvent {
    Start,
    Stop,
    Error,
}

/// `{"event": "...", "message": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub event: StatusEvent,
    pub message: String,
}

/// One measured block, as delivered to the host.
///
/// `buffers` always holds exactly the current block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMessage {
    pub buffers: Vec<Vec<i16>>,
    pub volume: u8,
    /// Milliseconds since the session started.
    pub duration: u64,
    pub sample_rate: u32,
    #[serde(rename = "type")]
    pub label: String,
}

/// Any message sent across the host bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostMessage {
    Status(StatusMessage),
    Frame(FrameMessage),
}

impl HostMessage {
    pub fn status(event: StatusEvent, message: impl Into<String>) -> Self {
        Self::Status(StatusMessage {
            event,
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&VolumeEvent> for FrameMessage {
    fn from(event: &VolumeEvent) -> Self {
        Self {
            buffers: vec![event.samples.clone()],
            volume: event.volume,
            duration: event.elapsed_ms,
            sample_rate: event.sample_rate,
            label: event.label.clone(),
        }
    }
}

/// Parameters of a host `startRecord` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostParams {
    #[serde(rename = "type", default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sample_rate: Option<i64>,
}

impl HostParams {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Missing or non-positive rates become 16000.
    pub fn into_config(self) -> CaptureConfiguration {
        CaptureConfiguration::from_host(self.sample_rate, self.label)
    }
}

/// Reply to a host `requestPermission` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
    pub granted: bool,
    pub message: String,
}

/// Reply to a host `stopRecord` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopAck {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_messages_serialize_flat() {
        let start = HostMessage::status(StatusEvent::Start, STARTED_MESSAGE);
        assert_eq!(
            serde_json::to_value(&start).unwrap(),
            json!({"event": "start", "message": "recording started"})
        );

        let error = HostMessage::status(StatusEvent::Error, "no mic");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"event": "error", "message": "no mic"})
        );

        let stop = HostMessage::status(StatusEvent::Stop, STOPPED_MESSAGE);
        assert_eq!(
            serde_json::to_string(&stop).unwrap(),
            stop.to_json().unwrap()
        );
        assert_eq!(
            serde_json::to_value(&stop).unwrap(),
            json!({"event": "stop", "message": "recording stopped"})
        );
    }

    #[test]
    fn frame_message_carries_single_block() {
        let event = VolumeEvent {
            samples: vec![1, -2, 3],
            volume: 42,
            elapsed_ms: 1250,
            sample_rate: 16_000,
            label: "asr".into(),
        };

        let message = HostMessage::Frame(FrameMessage::from(&event));

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "buffers": [[1, -2, 3]],
                "volume": 42,
                "duration": 1250,
                "sampleRate": 16000,
                "type": "asr"
            })
        );
    }

    #[test]
    fn host_params_default_sample_rate() {
        let params = HostParams::from_json(r#"{"type": "asr", "sampleRate": 0}"#).unwrap();
        let config = params.into_config();
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.label, "asr");

        let config = HostParams::from_json("{}").unwrap().into_config();
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.label, "");
    }

    #[test]
    fn host_params_keep_positive_rate() {
        let config = HostParams::from_json(r#"{"sampleRate": 8000}"#)
            .unwrap()
            .into_config();
        assert_eq!(config.sample_rate, 8_000);
    }

    #[test]
    fn messages_parse_back_into_the_right_variant() {
        let frame: HostMessage = serde_json::from_str(
            r#"{"buffers":[[0]],"volume":0,"duration":5,"sampleRate":16000,"type":""}"#,
        )
        .unwrap();
        assert!(matches!(frame, HostMessage::Frame(_)));

        let status: HostMessage =
            serde_json::from_str(r#"{"event":"stop","message":"bye"}"#).unwrap();
        assert_eq!(status, HostMessage::status(StatusEvent::Stop, "bye"));
    }
}
