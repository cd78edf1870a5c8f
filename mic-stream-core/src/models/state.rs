/// Capture controller state machine.
///
/// ```text
/// idle → recording → idle
/// ```
///
/// A `start` while recording passes through `Idle` before the new session
/// begins. There is no paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }
}
