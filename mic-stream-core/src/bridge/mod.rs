pub mod host_bridge;
pub mod messages;
pub mod plugin;
