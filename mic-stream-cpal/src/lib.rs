//! # mic-stream-cpal
//!
//! Cross-platform microphone backend for mic-stream-core, built on cpal.
//!
//! Provides:
//! - `CpalMicDevice`: default or named input device as a blocking mono i16 stream
//! - `CpalPermissions`: microphone access check
//! - `list_input_devices`: input device enumeration
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use mic_stream_core::{CaptureConfiguration, CaptureController, DispatchThread};
//! use mic_stream_cpal::{CpalMicDevice, CpalPermissions};
//!
//! let executor = Arc::new(DispatchThread::new());
//! let mut controller =
//!     CaptureController::new(CpalMicDevice::default_device(), CpalPermissions::new(), executor);
//! controller.start(CaptureConfiguration::default())?;
//! ```

pub mod cpal_mic;
pub mod device_enumerator;
pub mod permissions;

pub use cpal_mic::CpalMicDevice;
pub use device_enumerator::list_input_devices;
pub use permissions::CpalPermissions;
