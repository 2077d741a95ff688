use super::callbacks::CallbackTable;
use crate::attrs::AfMode;
use crate::display::{DisplayHandle, DisplayType};
use crate::frame::DetectedFace;
use crate::framework::types::FrameworkState;
use crate::marshal::PacketFormat;

/// Public session states.
///
/// A simplified view of the framework's seven-state machine; `Captured` is
/// a pseudo-state synthesized from capture bookkeeping rather than read
/// from the framework (see [`SessionState::resolved_state`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CameraState {
    None,
    Created,
    Preview,
    Capturing,
    Captured,
}

/// Why a state transition was forced from outside the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyCause {
    None,
    Sound,
    SoundByCall,
    SoundByAlarm,
    Security,
}

/// Collapse the framework's detailed state into the public view.
pub(crate) fn map_framework_state(state: FrameworkState) -> CameraState {
    match state {
        FrameworkState::None => CameraState::None,
        FrameworkState::Null | FrameworkState::Ready => CameraState::Created,
        FrameworkState::Prepare => CameraState::Preview,
        FrameworkState::Capturing => CameraState::Capturing,
        FrameworkState::Recording | FrameworkState::Paused => CameraState::Preview,
    }
}

/// The whole mutable session state, guarded by one mutex in
/// [`super::SessionShared`]. Touched by public-API threads and by the
/// framework's callback thread; every access goes through that lock.
pub(crate) struct SessionState {
    /// Public state as last recomputed by the relay (or overridden by the
    /// capture manager's pseudo-transition).
    pub state: CameraState,

    pub capture_count: u32,
    pub current_capture_count: u32,
    pub current_capture_complete_count: u32,
    pub is_continuous_shot_break: bool,
    pub is_capture_completed: bool,
    /// Idempotence latch: the completion decision fires callbacks at most
    /// once per capture sequence, whichever delivery path evaluates first.
    pub completion_fired: bool,
    pub hdr_keep_mode: bool,

    /// Capture resolution as configured by the application; restored when
    /// a burst temporarily forced it to the preview resolution.
    pub capture_width: i32,
    pub capture_height: i32,
    pub capture_resolution_modified: bool,

    pub focus_area_valid: bool,
    pub cached_focus_mode: Option<AfMode>,
    pub on_continuous_focusing: bool,

    pub callbacks: CallbackTable,

    pub display_type: DisplayType,
    pub display_handle: Option<DisplayHandle>,

    /// Most recent face-detection result, replaced wholesale per message.
    pub faces: Vec<DetectedFace>,

    pub is_used_in_recorder: bool,
    pub packet_format: Option<PacketFormat>,
    pub destroyed: bool,
}

impl SessionState {
    pub fn new(capture_width: i32, capture_height: i32) -> Self {
        Self {
            state: CameraState::Created,
            capture_count: 0,
            current_capture_count: 0,
            current_capture_complete_count: 0,
            is_continuous_shot_break: false,
            is_capture_completed: false,
            completion_fired: false,
            hdr_keep_mode: false,
            capture_width,
            capture_height,
            capture_resolution_modified: false,
            focus_area_valid: false,
            cached_focus_mode: None,
            on_continuous_focusing: false,
            callbacks: CallbackTable::default(),
            display_type: DisplayType::None,
            display_handle: None,
            faces: Vec::new(),
            is_used_in_recorder: false,
            packet_format: None,
            destroyed: false,
        }
    }

    /// Public state for `framework_state`, with the pseudo-`Captured`
    /// override applied.
    ///
    /// The framework keeps reporting `Capturing` until the capture session
    /// is torn down; once the bookkeeping says the sequence is done the
    /// public view must already be `Captured`.
    pub fn resolved_state(&self, framework_state: FrameworkState) -> CameraState {
        if (self.state == CameraState::Captured || self.is_capture_completed)
            && (self.current_capture_count > 0 || self.is_capture_completed)
            && framework_state == FrameworkState::Capturing
        {
            return CameraState::Captured;
        }

        map_framework_state(framework_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_states_collapse_to_public_set() {
        assert_eq!(map_framework_state(FrameworkState::None), CameraState::None);
        assert_eq!(
            map_framework_state(FrameworkState::Null),
            CameraState::Created
        );
        assert_eq!(
            map_framework_state(FrameworkState::Ready),
            CameraState::Created
        );
        assert_eq!(
            map_framework_state(FrameworkState::Prepare),
            CameraState::Preview
        );
        assert_eq!(
            map_framework_state(FrameworkState::Capturing),
            CameraState::Capturing
        );
        assert_eq!(
            map_framework_state(FrameworkState::Recording),
            CameraState::Preview
        );
        assert_eq!(
            map_framework_state(FrameworkState::Paused),
            CameraState::Preview
        );
    }

    #[test]
    fn captured_override_requires_capturing_framework_state() {
        let mut state = SessionState::new(640, 480);
        state.state = CameraState::Captured;
        state.current_capture_count = 1;

        assert_eq!(
            state.resolved_state(FrameworkState::Capturing),
            CameraState::Captured
        );
        // Once the framework leaves capturing, the mapped state wins.
        assert_eq!(
            state.resolved_state(FrameworkState::Prepare),
            CameraState::Preview
        );
    }

    #[test]
    fn completion_latch_alone_resolves_captured() {
        let mut state = SessionState::new(640, 480);
        state.is_capture_completed = true;

        assert_eq!(
            state.resolved_state(FrameworkState::Capturing),
            CameraState::Captured
        );
    }
}
