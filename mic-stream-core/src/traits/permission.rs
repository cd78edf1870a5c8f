/// Platform microphone permission check.
///
/// The consent flow itself belongs to the host; the controller only asks
/// whether access has been granted.
pub trait PermissionProvider: Send + Sync {
    fn has_permission(&self) -> bool;

    /// Trigger the platform consent flow. Returns immediately; the outcome
    /// is observed later through [`has_permission`](Self::has_permission).
    fn request_permission(&self);
}

/// Provider for platforms without a microphone permission model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionProvider for AlwaysGranted {
    fn has_permission(&self) -> bool {
        true
    }

    fn request_permission(&self) {}
}
