//! Microphone access check for cpal hosts.
//!
//! Desktop platforms have no uniform consent API. Access counts as granted
//! when the input device can be queried for a configuration; on macOS the
//! system prompt appears the first time a stream is opened.

use cpal::traits::{DeviceTrait, HostTrait};

use mic_stream_core::traits::permission::PermissionProvider;

use crate::device_enumerator;

#[derive(Debug, Clone, Default)]
pub struct CpalPermissions {
    device_name: Option<String>,
}

impl CpalPermissions {
    /// Check access to the default input device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check access to a specific input device.
    pub fn for_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl PermissionProvider for CpalPermissions {
    fn has_permission(&self) -> bool {
        let device = match &self.device_name {
            Some(name) => device_enumerator::find_input_device(name),
            None => cpal::default_host().default_input_device(),
        };
        let Some(device) = device else {
            log::debug!("No input device; treating microphone access as unavailable");
            return false;
        };

        match device.default_input_config() {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Microphone not accessible: {}", e);
                false
            }
        }
    }

    fn request_permission(&self) {
        log::info!("Microphone access is managed by the operating system privacy settings");
    }
}
