pub mod capture_device;
pub mod capture_observer;
pub mod permission;
