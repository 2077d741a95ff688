//! Capture session manager.
//!
//! Owns the burst/HDR/break bookkeeping layered over the framework's
//! capture primitives. The completion decision lives in one place
//! ([`capture_complete_due`]) and fires at most once per sequence
//! regardless of which delivery path — capture frame or captured message —
//! evaluates it first.

use super::callbacks::{CaptureCompletedCb, CapturingCb, StateChangedCb};
use super::state::{CameraState, PolicyCause, SessionState};
use super::{Camera, SessionShared};
use crate::config::CompletionAuthority;
use crate::error::{translate, CameraError, Result};
use crate::frame::{ImageData, PixelFormat};
use crate::framework::types::{AttrKey, AttrValue, CaptureData, CaptureFrame, FrameworkState};
use std::sync::Arc;
use tracing::{debug, error, warn};

impl Camera {
    /// Take a single shot.
    ///
    /// Requires an active preview. The capturing/completed callbacks are
    /// one-shot registrations for this sequence; if the framework refuses
    /// to start they are rolled back so a later capture cannot fire stale
    /// callbacks.
    pub fn start_capture(
        &self,
        capturing: Option<CapturingCb>,
        completed: Option<CaptureCompletedCb>,
    ) -> Result<()> {
        let framework_state = self.shared.backend.state();
        if !matches!(
            framework_state,
            FrameworkState::Prepare | FrameworkState::Recording | FrameworkState::Paused
        ) {
            error!("capture requested in framework state {framework_state:?}");
            return Err(CameraError::InvalidState);
        }

        {
            let mut state = self.shared.state.lock();

            if state.capture_resolution_modified {
                let restore = [
                    (AttrKey::CaptureWidth, AttrValue::Int(state.capture_width)),
                    (AttrKey::CaptureHeight, AttrValue::Int(state.capture_height)),
                ];
                if let Err(code) = self.shared.set_attrs(&restore) {
                    warn!("failed to restore capture resolution: {code:?}");
                }
                state.capture_resolution_modified = false;
            }

            if let Err(code) = self
                .shared
                .set_attrs(&[(AttrKey::CaptureCount, AttrValue::Int(1))])
            {
                warn!("failed to reset capture count: {code:?}");
            }

            begin_sequence(&mut state, 1);
            state.callbacks.capturing = capturing;
            state.callbacks.capture_completed = completed;
        }

        if let Err(code) = self.shared.backend.capture_start() {
            rollback_sequence(&self.shared);
            return Err(translate(code));
        }

        Ok(())
    }

    /// Whether the device can take more than one shot per capture start.
    pub fn is_supported_continuous_capture(&self) -> Result<bool> {
        let (_, max) = self.shared.int_range(AttrKey::CaptureCount)?;
        Ok(max > 1)
    }

    /// Take a burst of `count` shots, `interval_ms` apart.
    pub fn start_continuous_capture(
        &self,
        count: i32,
        interval_ms: i32,
        capturing: Option<CapturingCb>,
        completed: Option<CaptureCompletedCb>,
    ) -> Result<()> {
        if count < 2 || interval_ms < 0 {
            error!("invalid burst request: count {count}, interval {interval_ms}");
            return Err(CameraError::InvalidParameter);
        }

        if !self.is_supported_continuous_capture()? {
            return Err(CameraError::NotSupported);
        }

        if self.shared.backend.state() != FrameworkState::Prepare {
            return Err(CameraError::InvalidState);
        }

        self.shared.set_attrs(&[
            (AttrKey::CaptureCount, AttrValue::Int(count)),
            (AttrKey::CaptureInterval, AttrValue::Int(interval_ms)),
        ])?;

        {
            let mut state = self.shared.state.lock();
            begin_sequence(&mut state, count as u32);

            // Without zero-shutter-lag, switching to a different capture
            // resolution mid-burst would stall the pipeline; force capture
            // to match preview for the duration and restore later.
            let zsl = self
                .shared
                .get_bool(AttrKey::SupportZslCapture)
                .unwrap_or_else(|code| {
                    warn!("zsl capability query failed: {code:?}");
                    false
                });
            if !zsl {
                let preview = (
                    self.shared.get_int(AttrKey::PreviewWidth),
                    self.shared.get_int(AttrKey::PreviewHeight),
                );
                if let (Ok(preview_width), Ok(preview_height)) = preview {
                    if preview_width != state.capture_width
                        || preview_height != state.capture_height
                    {
                        let override_attrs = [
                            (AttrKey::CaptureWidth, AttrValue::Int(preview_width)),
                            (AttrKey::CaptureHeight, AttrValue::Int(preview_height)),
                        ];
                        if self.shared.set_attrs(&override_attrs).is_ok() {
                            state.capture_resolution_modified = true;
                        }
                    }
                }
            }

            state.callbacks.capturing = capturing;
            state.callbacks.capture_completed = completed;
        }

        if let Err(code) = self.shared.backend.capture_start() {
            rollback_sequence(&self.shared);
            return Err(translate(code));
        }

        Ok(())
    }

    /// Request early termination of a running burst.
    ///
    /// The underlying break is asynchronous; completion is confirmed by a
    /// later captured message or by the deferred check posted here, never
    /// by blocking.
    pub fn stop_continuous_capture(&self) -> Result<()> {
        if !self.is_supported_continuous_capture()? {
            return Err(CameraError::NotSupported);
        }

        {
            let state = self.shared.state.lock();
            let resolved = state.resolved_state(self.shared.backend.state());
            if resolved != CameraState::Capturing && state.capture_count > 1 {
                return Err(CameraError::InvalidState);
            }
        }

        self.shared
            .set_attrs(&[(AttrKey::BreakContinuousShot, AttrValue::Int(1))])?;

        {
            let mut state = self.shared.state.lock();
            state.is_continuous_shot_break = true;
            if state.current_capture_count > 0 {
                state.is_capture_completed = true;
            }
        }

        let weak = Arc::downgrade(&self.shared);
        self.shared.backend.post_idle(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                deferred_completion_check(&shared);
            }
        }));

        Ok(())
    }
}

/// Undo a sequence whose underlying capture start was refused: the
/// one-shot callbacks are cleared so a later capture cannot fire stale
/// registrations, and the counters no longer describe a live sequence.
fn rollback_sequence(shared: &SessionShared) {
    let mut state = shared.state.lock();
    state.callbacks.capturing = None;
    state.callbacks.capture_completed = None;
    state.capture_count = 0;
}

/// Reset all per-sequence bookkeeping for a capture of `count` shots.
fn begin_sequence(state: &mut SessionState, count: u32) {
    state.capture_count = count;
    state.current_capture_count = 0;
    state.current_capture_complete_count = 0;
    state.is_continuous_shot_break = false;
    state.is_capture_completed = false;
    state.completion_fired = false;
}

/// The single completion rule, shared by both delivery paths.
///
/// A sequence is complete when it was a single shot, when the delivered
/// count reaches the requested count, when an early break was requested
/// while actively capturing, or — in HDR keep mode — when both the
/// original and the processed frame have arrived.
fn capture_complete_due(state: &SessionState) -> bool {
    let delivered = state
        .current_capture_count
        .max(state.current_capture_complete_count);

    if state.capture_count == 1 && state.hdr_keep_mode {
        delivered >= 2
    } else if state.capture_count == 1 {
        delivered >= 1
    } else if state.capture_count > 0 && delivered >= state.capture_count {
        true
    } else {
        state.is_continuous_shot_break && state.state == CameraState::Capturing
    }
}

type CompletionInvocations = (
    Option<(CameraState, StateChangedCb)>,
    Option<CaptureCompletedCb>,
);

/// Perform the pseudo-state transition and collect the callbacks to fire.
/// Idempotent: the second and later calls per sequence return nothing.
fn fire_completion(state: &mut SessionState) -> Option<CompletionInvocations> {
    if state.completion_fired {
        return None;
    }
    state.completion_fired = true;
    state.is_capture_completed = true;

    let state_cb = if state.state != CameraState::Captured {
        let previous = state.state;
        state.state = CameraState::Captured;
        state
            .callbacks
            .state_changed
            .clone()
            .map(|cb| (previous, cb))
    } else {
        None
    };

    Some((state_cb, state.callbacks.capture_completed.clone()))
}

fn run_completion(invocations: CompletionInvocations) {
    let (state_cb, completed_cb) = invocations;
    if let Some((previous, cb)) = state_cb {
        cb(previous, CameraState::Captured, PolicyCause::None);
    }
    if let Some(cb) = completed_cb {
        cb();
    }
}

/// Capture-frame delivery path, entered on the framework thread for every
/// captured still of the running sequence.
pub(crate) fn on_capture_frame(shared: &Arc<SessionShared>, frame: CaptureFrame) {
    let (capturing_cb, authority) = {
        let mut state = shared.state.lock();
        state.current_capture_count += 1;

        // Keep the latch in step with delivery so state queries between
        // the last frame and its completion message already see the
        // sequence as done.
        if state.capture_count == 1 && state.hdr_keep_mode {
            if state.current_capture_count == 2 {
                state.is_capture_completed = true;
            }
        } else if state.capture_count == state.current_capture_count
            || state.is_continuous_shot_break
        {
            state.is_capture_completed = true;
        }

        (state.callbacks.capturing.clone(), shared.config.completion_authority)
    };

    if let Some(cb) = capturing_cb {
        let exif = shared
            .backend
            .get_attribute(AttrKey::CapturedExifRawData)
            .ok()
            .and_then(|value| match value {
                AttrValue::Bytes(bytes) => Some(bytes),
                _ => None,
            });

        let image = image_data(&frame.image, exif.as_deref());
        let postview = frame.screennail.as_ref().map(|data| image_data(data, None));
        let thumbnail = frame.thumbnail.as_ref().map(|data| image_data(data, None));

        cb(&image, postview.as_ref(), thumbnail.as_ref());
    }

    if matches!(
        authority,
        CompletionAuthority::Either | CompletionAuthority::FrameDelivery
    ) {
        let invocations = {
            let mut state = shared.state.lock();
            if capture_complete_due(&state) {
                fire_completion(&mut state)
            } else {
                None
            }
        };
        if let Some(invocations) = invocations {
            run_completion(invocations);
        }
    }
}

/// Captured-message delivery path: the framework reports how many shots
/// have finished post-processing.
pub(crate) fn on_captured_message(shared: &Arc<SessionShared>, count: u32) {
    let authority = shared.config.completion_authority;

    let invocations = {
        let mut state = shared.state.lock();
        state.current_capture_complete_count = count;

        if matches!(
            authority,
            CompletionAuthority::Either | CompletionAuthority::CapturedMessage
        ) && capture_complete_due(&state)
        {
            fire_completion(&mut state)
        } else {
            None
        }
    };

    if let Some(invocations) = invocations {
        run_completion(invocations);
    }
}

/// Deferred check posted by [`Camera::stop_continuous_capture`]: the break
/// is asynchronous, so completion is re-evaluated once the framework has
/// drained its pending messages.
pub(crate) fn deferred_completion_check(shared: &Arc<SessionShared>) {
    let invocations = {
        let mut state = shared.state.lock();
        let due = state.current_capture_count > 0
            && state.current_capture_count == state.current_capture_complete_count
            && state.state == CameraState::Capturing;
        if due {
            fire_completion(&mut state)
        } else {
            debug!(
                "deferred completion not due: delivered {}, completed {}, state {:?}",
                state.current_capture_count, state.current_capture_complete_count, state.state
            );
            None
        }
    };

    if let Some(invocations) = invocations {
        run_completion(invocations);
    }
}

fn image_data<'a>(data: &'a CaptureData, exif: Option<&'a [u8]>) -> ImageData<'a> {
    ImageData {
        data: &data.data,
        width: data.width,
        height: data.height,
        format: PixelFormat::from_raw(data.format),
        exif,
    }
}
