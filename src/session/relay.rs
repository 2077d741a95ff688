//! Framework message relay.
//!
//! Entered on the framework's event thread for every message. Each arm
//! mutates session state under the lock, clones the registered callback
//! for its category and invokes it after the lock is released; an
//! unregistered category is never invoked.

use super::capture;
use super::state::{map_framework_state, PolicyCause};
use super::SessionShared;
use crate::error::CameraError;
use crate::frame::{DetectedFace, MAX_DETECTED_FACES};
use crate::framework::types::{
    FrameworkError, FrameworkState, Message, PolicyEvent, RawFaceInfo, RecordingReport,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) fn handle_message(shared: &Arc<SessionShared>, message: Message) {
    let relay_cb = shared.state.lock().callbacks.relay_message.clone();
    if let Some(cb) = relay_cb {
        cb(&message);
    }

    match message {
        Message::StateChanged {
            current, policy, ..
        } => on_state_changed(shared, current, policy),
        Message::FocusChanged(result) => {
            let cb = shared.state.lock().callbacks.focus_changed.clone();
            if let Some(cb) = cb {
                cb(result);
            }
        }
        Message::Captured(count) => capture::on_captured_message(shared, count),
        Message::VideoCaptured(report) | Message::AudioCaptured(report) => {
            release_recording_report(report);
        }
        Message::VideoSnapshotCaptured => {
            // A snapshot taken mid-recording has no counted-burst
            // bookkeeping; completion is reported directly.
            let cb = shared.state.lock().callbacks.capture_completed.clone();
            if let Some(cb) = cb {
                cb();
            }
        }
        Message::Error(code) => on_error(shared, code),
        Message::HdrProgress(percent) => {
            let cb = shared.state.lock().callbacks.hdr_progress.clone();
            if let Some(cb) = cb {
                cb(percent);
            }
        }
        Message::FaceDetected(info) => on_face_detected(shared, info),
    }
}

fn on_state_changed(shared: &Arc<SessionShared>, current: FrameworkState, policy: PolicyEvent) {
    let cause = match policy {
        PolicyEvent::None => PolicyCause::None,
        PolicyEvent::Sound => PolicyCause::Sound,
        PolicyEvent::SoundByCall => PolicyCause::SoundByCall,
        PolicyEvent::SoundByAlarm => PolicyCause::SoundByAlarm,
        PolicyEvent::Security => PolicyCause::Security,
    };
    if cause != PolicyCause::None {
        warn!("state change forced by policy: {cause:?}");
    }

    let (previous_public, new_public, state_cb, interrupted_cb) = {
        let mut state = shared.state.lock();
        let previous_public = state.state;
        state.state = map_framework_state(current);

        let state_cb = if previous_public != state.state {
            state.callbacks.state_changed.clone()
        } else {
            None
        };

        // A policy-forced drop to the framework's idle state gets a second,
        // distinct notification on top of the state-changed one.
        let interrupted_cb = if cause != PolicyCause::None && current == FrameworkState::Null {
            state.callbacks.interrupted.clone()
        } else {
            None
        };

        (previous_public, state.state, state_cb, interrupted_cb)
    };

    if let Some(cb) = state_cb {
        cb(previous_public, new_public, cause);
    }
    if let Some(cb) = interrupted_cb {
        cb(cause, previous_public, new_public);
    }
}

/// Coarse mapping for asynchronous mid-session errors. Narrower than the
/// call-path translator: only device faults, memory exhaustion, ESD and a
/// generic invalid-operation bucket are reported through the error
/// callback.
fn map_async_error(code: FrameworkError) -> CameraError {
    use FrameworkError::*;
    match code {
        Device | DeviceIo | DeviceTimeout | DeviceWrongJpeg | DeviceLackBuffer => {
            CameraError::Device
        }
        OutOfMemory | ResourceCreation => CameraError::OutOfMemory,
        DeviceRegTrouble => CameraError::Esd,
        _ => CameraError::InvalidOperation,
    }
}

fn on_error(shared: &Arc<SessionShared>, code: FrameworkError) {
    let mapped = map_async_error(code);

    let (public_state, cb) = {
        let mut state = shared.state.lock();
        // Latch completion so a stalled in-flight capture cannot leave the
        // session stuck in capturing forever.
        state.is_capture_completed = true;
        (state.state, state.callbacks.error.clone())
    };

    warn!("framework error {code:?} reported as {mapped:?} in state {public_state:?}");

    if let Some(cb) = cb {
        cb(mapped, public_state);
    }
}

fn on_face_detected(shared: &Arc<SessionShared>, info: Option<Vec<RawFaceInfo>>) {
    match info {
        Some(raw_faces) => {
            let faces: Vec<DetectedFace> = raw_faces
                .iter()
                .take(MAX_DETECTED_FACES)
                .map(|face| DetectedFace {
                    id: face.id,
                    score: face.score,
                    x: face.x,
                    y: face.y,
                    width: face.width,
                    height: face.height,
                })
                .collect();

            let cb = {
                let mut state = shared.state.lock();
                state.faces = faces.clone();
                state.callbacks.face_detected.clone()
            };

            if let Some(cb) = cb {
                cb(&faces);
            }
        }
        None => {
            // No detector data at all: reset the cache but suppress the
            // callback, unlike an explicit zero-face result.
            debug!("face detection message without data");
            shared.state.lock().faces.clear();
        }
    }
}

fn release_recording_report(mut report: RecordingReport) {
    if let Some(filename) = report.recording_filename.take() {
        debug!("releasing recording report for {filename}");
    }
}
