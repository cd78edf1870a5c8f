//! Input device enumeration through cpal's default host.
//!
//! cpal exposes neither stable device ids nor transport metadata, so the
//! device name doubles as its id and the transport is guessed from it.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

use mic_stream_core::models::audio_models::{AudioSource, AudioTransportType};
use mic_stream_core::models::error::CaptureError;

/// List the input devices of the default host.
pub fn list_input_devices() -> Result<Vec<AudioSource>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host.input_devices().map_err(|e| {
        CaptureError::DeviceConfig(format!("failed to enumerate input devices: {}", e))
    })?;

    let mut sources = Vec::new();
    for (index, device) in devices.enumerate() {
        let name = device.name().unwrap_or_else(|_| format!("Input {}", index));
        let is_default = default_name.as_deref() == Some(name.as_str());
        sources.push(AudioSource {
            id: name.clone(),
            transport_type: transport_from_name(&name),
            name,
            is_default,
        });
    }

    log::debug!("Found {} input devices", sources.len());
    Ok(sources)
}

/// Find an input device by exact name.
pub fn find_input_device(name: &str) -> Option<Device> {
    let mut devices = match cpal::default_host().input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("Failed to enumerate input devices: {}", e);
            return None;
        }
    };

    let found = devices.find(|device| device.name().map(|n| n == name).unwrap_or(false));
    if found.is_none() {
        log::warn!("Input device '{}' not found", name);
    }
    found
}

/// Whether `name` is the host's default input device.
pub fn is_default_input(name: &str) -> bool {
    cpal::default_host()
        .default_input_device()
        .and_then(|d| d.name().ok())
        .is_some_and(|default| default == name)
}

/// Best-effort transport guess from a device name.
pub fn transport_from_name(name: &str) -> Option<AudioTransportType> {
    let lower = name.to_lowercase();
    if lower.contains("bluetooth") || lower.contains("airpods") || lower.contains("bluez") {
        Some(AudioTransportType::Bluetooth)
    } else if lower.contains("usb") {
        Some(AudioTransportType::Usb)
    } else if lower.contains("monitor") || lower.contains("loopback") || lower.contains("virtual") {
        Some(AudioTransportType::Virtual)
    } else if lower.contains("built-in")
        || lower.contains("internal")
        || lower.contains("macbook")
    {
        Some(AudioTransportType::BuiltIn)
    } else {
        None
    }
}
