//! Typed per-category callback table.
//!
//! One optional slot per event category: registering overwrites the
//! previous entry, unregistering clears it. The relay reads slots under the
//! session lock and invokes the cloned handler after releasing it, so a
//! handler can never be observed half-unregistered and re-entering the
//! public API from a callback does not deadlock.

use super::state::{CameraState, PolicyCause};
use crate::error::CameraError;
use crate::frame::{DetectedFace, ImageData, PreviewFrame};
use crate::framework::types::{FocusResult, Message};
use crate::marshal::MediaPacket;
use std::sync::Arc;

pub type StateChangedCb = Arc<dyn Fn(CameraState, CameraState, PolicyCause) + Send + Sync>;
pub type InterruptedCb = Arc<dyn Fn(PolicyCause, CameraState, CameraState) + Send + Sync>;
pub type FocusChangedCb = Arc<dyn Fn(FocusResult) + Send + Sync>;
/// Arguments: captured image, postview (screennail), thumbnail.
pub type CapturingCb =
    Arc<dyn Fn(&ImageData<'_>, Option<&ImageData<'_>>, Option<&ImageData<'_>>) + Send + Sync>;
pub type CaptureCompletedCb = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCb = Arc<dyn Fn(CameraError, CameraState) + Send + Sync>;
pub type HdrProgressCb = Arc<dyn Fn(u32) + Send + Sync>;
pub type FaceDetectedCb = Arc<dyn Fn(&[DetectedFace]) + Send + Sync>;
pub type PreviewCb = Arc<dyn Fn(&PreviewFrame<'_>) + Send + Sync>;
pub type PacketPreviewCb = Arc<dyn Fn(MediaPacket) + Send + Sync>;
pub type RenderErrorCb = Arc<dyn Fn(u32) + Send + Sync>;
/// Raw-message relay for an external recorder sharing the session.
pub type RelayMessageCb = Arc<dyn Fn(&Message) + Send + Sync>;

#[derive(Default, Clone)]
pub(crate) struct CallbackTable {
    pub state_changed: Option<StateChangedCb>,
    pub interrupted: Option<InterruptedCb>,
    pub focus_changed: Option<FocusChangedCb>,
    pub capturing: Option<CapturingCb>,
    pub capture_completed: Option<CaptureCompletedCb>,
    pub error: Option<ErrorCb>,
    pub hdr_progress: Option<HdrProgressCb>,
    pub face_detected: Option<FaceDetectedCb>,
    pub preview: Option<PreviewCb>,
    pub packet_preview: Option<PacketPreviewCb>,
    pub render_error: Option<RenderErrorCb>,
    pub relay_message: Option<RelayMessageCb>,
}
