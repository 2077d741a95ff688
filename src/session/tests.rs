use super::*;
use crate::attrs::{AfMode, HdrMode};
use crate::config::{ClearAfAreaPolicy, CompletionAuthority};
use crate::frame::PixelFormat;
use crate::framework::mock::{MockBackend, MockProvider};
use crate::framework::types::{
    focus_mode, AttrInfo, AttrKey, AttrValue, CameraDevice, CaptureData, CaptureFrame,
    FocusResult, FrameworkError, FrameworkState, Message, PolicyEvent, RawFaceInfo,
    RawPixelFormat, StreamData, StreamFrame, MAX_STREAM_PLANES,
};
use parking_lot::Mutex as PlMutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_camera() -> (Camera, Arc<MockBackend>) {
    open_camera_with(FacadeConfig::default())
}

fn open_camera_with(config: FacadeConfig) -> (Camera, Arc<MockBackend>) {
    init_tracing();
    let backend = MockBackend::new();
    let provider = MockProvider::new(backend.clone());
    let camera = Camera::open(&provider, CameraDevice::Rear, config).unwrap();
    (camera, backend)
}

fn start_preview(camera: &Camera, backend: &MockBackend) {
    camera.start_preview().unwrap();
    backend.emit_state_changed(FrameworkState::Ready, FrameworkState::Prepare);
    assert_eq!(camera.state().unwrap(), CameraState::Preview);
}

fn jpeg_frame() -> CaptureFrame {
    CaptureFrame {
        image: CaptureData {
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 3264,
            height: 2448,
            format: RawPixelFormat::Encoded,
        },
        thumbnail: None,
        screennail: None,
    }
}

fn nv12_stream_frame(width: u32, height: u32, internal_buffer: u64) -> StreamFrame {
    let mut strides = [0u32; MAX_STREAM_PLANES];
    let mut elevations = [0u32; MAX_STREAM_PLANES];
    strides[0] = width;
    strides[1] = width;
    elevations[0] = height;
    elevations[1] = height / 2;
    StreamFrame {
        format: RawPixelFormat::Nv12,
        width,
        height,
        timestamp_ms: 16,
        data: StreamData::SemiPlanar {
            y: vec![0; (width * height) as usize],
            uv: vec![0; (width * height / 2) as usize],
        },
        buffers: vec![1],
        strides,
        elevations,
        internal_buffer: Some(internal_buffer),
    }
}

struct CaptureCounters {
    captured_transitions: Arc<AtomicU32>,
    completions: Arc<AtomicU32>,
    frames: Arc<AtomicU32>,
}

fn arm_capture(camera: &Camera, count: Option<i32>) -> CaptureCounters {
    let captured_transitions = Arc::new(AtomicU32::new(0));
    let completions = Arc::new(AtomicU32::new(0));
    let frames = Arc::new(AtomicU32::new(0));

    let transitions = captured_transitions.clone();
    camera
        .set_state_changed_cb(move |_previous, current, _policy| {
            if current == CameraState::Captured {
                transitions.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    let frame_count = frames.clone();
    let completion_count = completions.clone();
    let capturing: CapturingCb = Arc::new(move |_image, _postview, _thumbnail| {
        frame_count.fetch_add(1, Ordering::SeqCst);
    });
    let completed: CaptureCompletedCb = Arc::new(move || {
        completion_count.fetch_add(1, Ordering::SeqCst);
    });

    match count {
        None => camera.start_capture(Some(capturing), Some(completed)).unwrap(),
        Some(count) => camera
            .start_continuous_capture(count, 0, Some(capturing), Some(completed))
            .unwrap(),
    }

    CaptureCounters {
        captured_transitions,
        completions,
        frames,
    }
}

#[test]
fn open_negotiates_initial_attributes() {
    let (_camera, backend) = open_camera();

    assert_eq!(backend.attr_int(AttrKey::Mode), Some(1));
    assert_eq!(
        backend.attr_int(AttrKey::CaptureFormat),
        Some(RawPixelFormat::Encoded.code())
    );
    assert_eq!(backend.attr_int(AttrKey::CaptureCount), Some(1));
}

#[test]
fn open_fails_atomically_on_create_error() {
    let provider = MockProvider::failing(FrameworkError::DeviceNotFound);
    let result = Camera::open(&provider, CameraDevice::Rear, FacadeConfig::default());
    assert_eq!(result.unwrap_err(), CameraError::DeviceNotFound);
}

#[test]
fn open_destroys_backend_when_negotiation_fails() {
    let backend = MockBackend::new();
    backend.fail_next_set_attributes(FrameworkError::InvalidArgument.into());
    let provider = MockProvider::new(backend.clone());

    let result = Camera::open(&provider, CameraDevice::Rear, FacadeConfig::default());
    assert_eq!(result.unwrap_err(), CameraError::InvalidParameter);
    assert!(backend.is_destroyed());
}

#[test]
fn state_starts_created_and_follows_preview() {
    let (camera, backend) = open_camera();
    assert_eq!(camera.state().unwrap(), CameraState::Created);

    start_preview(&camera, &backend);

    camera.stop_preview().unwrap();
    assert_eq!(camera.state().unwrap(), CameraState::Created);
}

#[test]
fn single_capture_fires_one_transition_and_one_completion() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let counters = arm_capture(&camera, None);
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);

    backend.emit_capture_frame(jpeg_frame());
    backend.emit_message(Message::Captured(1));

    assert_eq!(counters.frames.load(Ordering::SeqCst), 1);
    assert_eq!(counters.completions.load(Ordering::SeqCst), 1);
    assert_eq!(counters.captured_transitions.load(Ordering::SeqCst), 1);
    assert_eq!(camera.state().unwrap(), CameraState::Captured);
}

#[test]
fn completion_also_fires_when_only_the_message_arrives() {
    let config = FacadeConfig {
        completion_authority: CompletionAuthority::CapturedMessage,
        ..Default::default()
    };
    let (camera, backend) = open_camera_with(config);
    start_preview(&camera, &backend);

    let counters = arm_capture(&camera, None);
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);

    backend.emit_capture_frame(jpeg_frame());
    assert_eq!(counters.completions.load(Ordering::SeqCst), 0);

    backend.emit_message(Message::Captured(1));
    assert_eq!(counters.completions.load(Ordering::SeqCst), 1);
}

#[test]
fn continuous_capture_completes_only_after_last_delivery() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let counters = arm_capture(&camera, Some(5));
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);

    for shot in 1..=5u32 {
        assert_eq!(counters.completions.load(Ordering::SeqCst), 0);
        backend.emit_capture_frame(jpeg_frame());
        backend.emit_message(Message::Captured(shot));
    }

    assert_eq!(counters.frames.load(Ordering::SeqCst), 5);
    assert_eq!(counters.completions.load(Ordering::SeqCst), 1);
    assert_eq!(counters.captured_transitions.load(Ordering::SeqCst), 1);
}

#[test]
fn break_finishes_burst_before_planned_count() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let counters = arm_capture(&camera, Some(5));
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);

    for shot in 1..=2u32 {
        backend.emit_capture_frame(jpeg_frame());
        backend.emit_message(Message::Captured(shot));
    }
    assert_eq!(counters.completions.load(Ordering::SeqCst), 0);

    camera.stop_continuous_capture().unwrap();
    assert_eq!(backend.attr_int(AttrKey::BreakContinuousShot), Some(1));

    // The framework never reports 5 of 5; the session is already
    // queryable as captured and the deferred check fires completion.
    assert_eq!(camera.state().unwrap(), CameraState::Captured);
    backend.drain_idle();

    assert_eq!(counters.completions.load(Ordering::SeqCst), 1);
    assert_eq!(counters.captured_transitions.load(Ordering::SeqCst), 1);

    // A late break acknowledgment does not fire a second completion.
    backend.emit_message(Message::Captured(2));
    assert_eq!(counters.completions.load(Ordering::SeqCst), 1);
}

#[test]
fn hdr_keep_mode_waits_for_the_second_delivery() {
    let (camera, backend) = open_camera();
    camera.set_hdr_mode(HdrMode::KeepOriginal).unwrap();
    start_preview(&camera, &backend);

    let counters = arm_capture(&camera, None);
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);

    backend.emit_capture_frame(jpeg_frame());
    assert_eq!(counters.completions.load(Ordering::SeqCst), 0);
    assert_eq!(camera.state().unwrap(), CameraState::Capturing);

    backend.emit_capture_frame(jpeg_frame());
    assert_eq!(counters.completions.load(Ordering::SeqCst), 1);
    assert_eq!(camera.state().unwrap(), CameraState::Captured);
}

#[test]
fn continuous_capture_count_below_two_is_invalid_even_without_support() {
    let (camera, backend) = open_camera();
    backend.declare_attr_info(AttrKey::CaptureCount, AttrInfo::IntRange { min: 1, max: 1 });

    let result = camera.start_continuous_capture(1, 0, None, None);
    assert_eq!(result.unwrap_err(), CameraError::InvalidParameter);
}

#[test]
fn continuous_capture_requires_burst_support() {
    let (camera, backend) = open_camera();
    backend.declare_attr_info(AttrKey::CaptureCount, AttrInfo::IntRange { min: 1, max: 1 });

    let result = camera.start_continuous_capture(3, 0, None, None);
    assert_eq!(result.unwrap_err(), CameraError::NotSupported);

    assert_eq!(
        camera.stop_continuous_capture().unwrap_err(),
        CameraError::NotSupported
    );
}

#[test]
fn continuous_capture_requires_preview_state() {
    let (camera, _backend) = open_camera();
    let result = camera.start_continuous_capture(3, 0, None, None);
    assert_eq!(result.unwrap_err(), CameraError::InvalidState);
}

#[test]
fn negative_interval_is_rejected() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);
    let result = camera.start_continuous_capture(3, -1, None, None);
    assert_eq!(result.unwrap_err(), CameraError::InvalidParameter);
}

#[test]
fn capture_requires_preview_state() {
    let (camera, _backend) = open_camera();
    assert_eq!(
        camera.start_capture(None, None).unwrap_err(),
        CameraError::InvalidState
    );
}

#[test]
fn capture_start_failure_rolls_back_callbacks() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let completions = Arc::new(AtomicU32::new(0));
    let completion_count = completions.clone();
    let completed: CaptureCompletedCb = Arc::new(move || {
        completion_count.fetch_add(1, Ordering::SeqCst);
    });

    backend.fail_capture_start(FrameworkError::Device);
    let result = camera.start_capture(None, Some(completed));
    assert_eq!(result.unwrap_err(), CameraError::Device);

    // A stale registration must not fire on later framework events.
    backend.emit_capture_frame(jpeg_frame());
    backend.emit_message(Message::Captured(1));
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[test]
fn burst_without_zsl_forces_capture_resolution_to_preview() {
    let (camera, backend) = open_camera();
    backend.seed_attr(AttrKey::SupportZslCapture, AttrValue::Bool(false));
    start_preview(&camera, &backend);

    arm_capture(&camera, Some(3));
    assert_eq!(backend.attr_int(AttrKey::CaptureWidth), Some(1280));
    assert_eq!(backend.attr_int(AttrKey::CaptureHeight), Some(720));
    // The configured capture resolution is preserved for the caller.
    assert_eq!(camera.capture_resolution().unwrap(), (3264, 2448));

    // Finish the burst and return to preview.
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);
    for shot in 1..=3u32 {
        backend.emit_capture_frame(jpeg_frame());
        backend.emit_message(Message::Captured(shot));
    }
    camera.start_preview().unwrap();
    backend.emit_state_changed(FrameworkState::Capturing, FrameworkState::Prepare);

    // The next capture start restores the configured resolution.
    arm_capture(&camera, None);
    assert_eq!(backend.attr_int(AttrKey::CaptureWidth), Some(3264));
    assert_eq!(backend.attr_int(AttrKey::CaptureHeight), Some(2448));
}

#[test]
fn start_preview_from_captured_finishes_the_cycle() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    arm_capture(&camera, None);
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);
    backend.emit_capture_frame(jpeg_frame());
    backend.emit_message(Message::Captured(1));
    assert_eq!(camera.state().unwrap(), CameraState::Captured);

    camera.start_preview().unwrap();
    // capture_stop dropped the framework back to preview.
    assert_eq!(backend.state(), FrameworkState::Prepare);
}

#[test]
fn unregistered_callbacks_are_never_invoked() {
    let (camera, backend) = open_camera();

    let focus_events = Arc::new(AtomicU32::new(0));
    let count = focus_events.clone();
    camera
        .set_focus_changed_cb(move |_result| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    camera.unset_focus_changed_cb().unwrap();

    backend.emit_message(Message::FocusChanged(FocusResult::Focused));
    assert_eq!(focus_events.load(Ordering::SeqCst), 0);

    let state_events = Arc::new(AtomicU32::new(0));
    let count = state_events.clone();
    camera
        .set_state_changed_cb(move |_previous, _current, _policy| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    camera.unset_state_changed_cb().unwrap();

    backend.emit_state_changed(FrameworkState::Null, FrameworkState::Ready);
    assert_eq!(state_events.load(Ordering::SeqCst), 0);
}

#[test]
fn focus_result_is_forwarded_verbatim() {
    let (camera, backend) = open_camera();

    let seen = Arc::new(PlMutex::new(Vec::new()));
    let sink = seen.clone();
    camera
        .set_focus_changed_cb(move |result| {
            sink.lock().push(result);
        })
        .unwrap();

    backend.emit_message(Message::FocusChanged(FocusResult::Ongoing));
    backend.emit_message(Message::FocusChanged(FocusResult::Failed));

    assert_eq!(
        *seen.lock(),
        vec![FocusResult::Ongoing, FocusResult::Failed]
    );
}

#[test]
fn policy_interruption_fires_both_notifications() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let interruptions = Arc::new(PlMutex::new(Vec::new()));
    let sink = interruptions.clone();
    camera
        .set_interrupted_cb(move |policy, previous, current| {
            sink.lock().push((policy, previous, current));
        })
        .unwrap();

    let transitions = Arc::new(AtomicU32::new(0));
    let count = transitions.clone();
    camera
        .set_state_changed_cb(move |_previous, _current, _policy| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    backend.set_framework_state(FrameworkState::Null);
    backend.emit_message(Message::StateChanged {
        previous: FrameworkState::Prepare,
        current: FrameworkState::Null,
        policy: PolicyEvent::SoundByCall,
    });

    assert_eq!(transitions.load(Ordering::SeqCst), 1);
    assert_eq!(
        *interruptions.lock(),
        vec![(
            PolicyCause::SoundByCall,
            CameraState::Preview,
            CameraState::Created
        )]
    );
}

#[test]
fn async_error_is_reported_and_unsticks_the_session() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let errors = Arc::new(PlMutex::new(Vec::new()));
    let sink = errors.clone();
    camera
        .set_error_cb(move |error, state| {
            sink.lock().push((error, state));
        })
        .unwrap();

    arm_capture(&camera, Some(5));
    backend.emit_state_changed(FrameworkState::Prepare, FrameworkState::Capturing);
    backend.emit_message(Message::Error(FrameworkError::DeviceTimeout));

    assert_eq!(
        *errors.lock(),
        vec![(CameraError::Device, CameraState::Capturing)]
    );
    // The completion latch keeps the stalled capture from pinning the
    // session in capturing.
    assert_eq!(camera.state().unwrap(), CameraState::Captured);
}

#[test]
fn face_detection_replaces_the_cache_wholesale() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);

    let deliveries = Arc::new(PlMutex::new(Vec::new()));
    let sink = deliveries.clone();
    camera
        .start_face_detection(move |faces| {
            sink.lock().push(faces.len());
        })
        .unwrap();

    let face = |id| RawFaceInfo {
        id,
        score: 80,
        x: 10,
        y: 10,
        width: 64,
        height: 64,
    };

    backend.emit_message(Message::FaceDetected(Some(vec![face(1), face(2)])));
    assert_eq!(camera.detected_faces().len(), 2);

    // Zero faces still fires and clears the cache.
    backend.emit_message(Message::FaceDetected(Some(Vec::new())));
    assert_eq!(camera.detected_faces().len(), 0);

    // No detector data clears the cache without firing.
    backend.emit_message(Message::FaceDetected(Some(vec![face(3)])));
    backend.emit_message(Message::FaceDetected(None));
    assert_eq!(camera.detected_faces().len(), 0);

    assert_eq!(*deliveries.lock(), vec![2, 0, 1]);
}

#[test]
fn face_cache_is_bounded() {
    let (camera, backend) = open_camera();
    start_preview(&camera, &backend);
    camera.start_face_detection(|_faces| {}).unwrap();

    let faces: Vec<RawFaceInfo> = (0..30)
        .map(|id| RawFaceInfo {
            id,
            score: 50,
            x: 0,
            y: 0,
            width: 16,
            height: 16,
        })
        .collect();
    backend.emit_message(Message::FaceDetected(Some(faces)));

    assert_eq!(camera.detected_faces().len(), crate::frame::MAX_DETECTED_FACES);
}

#[test]
fn face_detection_requires_support_and_preview() {
    let (camera, backend) = open_camera();

    assert_eq!(
        camera.start_face_detection(|_| {}).unwrap_err(),
        CameraError::InvalidState
    );

    backend.declare_attr_info(AttrKey::DetectMode, AttrInfo::IntArray(vec![0]));
    assert_eq!(
        camera.start_face_detection(|_| {}).unwrap_err(),
        CameraError::NotSupported
    );
}

#[test]
fn destroy_fails_while_recorder_owns_the_session() {
    let (camera, backend) = open_camera();

    camera.mark_used_by_recorder(true);
    assert_eq!(camera.destroy().unwrap_err(), CameraError::InvalidOperation);

    // The session is intact and queryable.
    assert!(!backend.is_destroyed());
    assert_eq!(camera.state().unwrap(), CameraState::Created);

    camera.mark_used_by_recorder(false);
    camera.destroy().unwrap();
    assert!(backend.is_destroyed());
}

#[test]
fn af_mode_is_cached_while_continuous_focus_is_pending() {
    let (camera, backend) = open_camera();
    backend.seed_attr(AttrKey::FocusMode, AttrValue::Int(focus_mode::CONTINUOUS));

    camera.set_af_mode(AfMode::Macro).unwrap();
    // Deferred: no scan-range write reached the framework.
    assert!(backend.writes_of(AttrKey::AfScanRange).is_empty());

    camera.start_focusing(true).unwrap();
    assert_eq!(
        backend.writes_of(AttrKey::AfScanRange),
        vec![AttrValue::Int(AfMode::Macro.scan_range_code())]
    );

    // The cache is consumed; focusing again does not re-apply it.
    camera.start_focusing(true).unwrap();
    assert_eq!(backend.writes_of(AttrKey::AfScanRange).len(), 1);
}

#[test]
fn af_mode_applies_directly_once_continuous_focusing_started() {
    let (camera, backend) = open_camera();
    backend.seed_attr(AttrKey::FocusMode, AttrValue::Int(focus_mode::CONTINUOUS));

    camera.start_focusing(true).unwrap();
    camera.set_af_mode(AfMode::Normal).unwrap();

    assert_eq!(
        backend.writes_of(AttrKey::AfScanRange),
        vec![AttrValue::Int(AfMode::Normal.scan_range_code())]
    );
}

#[test]
fn af_area_requires_autofocus() {
    let (camera, backend) = open_camera();

    assert_eq!(
        camera.set_af_area(120, 80).unwrap_err(),
        CameraError::InvalidOperation
    );

    backend.seed_attr(AttrKey::FocusMode, AttrValue::Int(focus_mode::AUTO));
    backend.seed_attr(AttrKey::AfScanRange, AttrValue::Int(1));
    camera.set_af_area(120, 80).unwrap();
    assert_eq!(backend.attr_int(AttrKey::AfTouchX), Some(120));
    assert_eq!(backend.attr_int(AttrKey::AfTouchY), Some(80));
}

#[test]
fn clear_af_area_policy_is_configurable() {
    let (camera, backend) = open_camera();
    backend.seed_attr(AttrKey::FocusMode, AttrValue::Int(focus_mode::AUTO));
    backend.seed_attr(AttrKey::AfScanRange, AttrValue::Int(1));

    // Default policy: clearing an unset area is a no-op.
    camera.clear_af_area().unwrap();

    camera.set_af_area(10, 10).unwrap();
    camera.clear_af_area().unwrap();

    let config = FacadeConfig {
        clear_af_area_policy: ClearAfAreaPolicy::ErrorWhenUnset,
        ..Default::default()
    };
    let (strict, _backend) = open_camera_with(config);
    assert_eq!(
        strict.clear_af_area().unwrap_err(),
        CameraError::InvalidOperation
    );
}

#[test]
fn focus_area_selects_region_based_auto_mode() {
    let (camera, backend) = open_camera();
    backend.seed_attr(AttrKey::FocusMode, AttrValue::Int(focus_mode::AUTO));
    backend.seed_attr(AttrKey::AfScanRange, AttrValue::Int(1));

    camera.start_focusing(false).unwrap();
    assert_eq!(backend.attr_int(AttrKey::FocusMode), Some(focus_mode::AUTO));

    camera.set_af_area(50, 50).unwrap();
    camera.start_focusing(false).unwrap();
    assert_eq!(
        backend.attr_int(AttrKey::FocusMode),
        Some(focus_mode::TOUCH_AUTO)
    );
}

#[test]
fn supported_preview_formats_skip_the_interleaved_alias() {
    let (camera, backend) = open_camera();
    backend.declare_attr_info(
        AttrKey::PreviewFormat,
        AttrInfo::IntArray(vec![
            RawPixelFormat::Nv12.code(),
            RawPixelFormat::Uyvy.code(),
            RawPixelFormat::ItlvJpegUyvy.code(),
            RawPixelFormat::I420.code(),
        ]),
    );

    let mut formats = Vec::new();
    camera
        .foreach_supported_preview_format(|format| {
            formats.push(format);
            true
        })
        .unwrap();

    assert_eq!(
        formats,
        vec![PixelFormat::Nv12, PixelFormat::Uyvy, PixelFormat::I420]
    );
}

#[test]
fn uyvy_write_prefers_the_interleaved_alias_and_reads_normalize() {
    let (camera, backend) = open_camera();
    backend.declare_attr_info(
        AttrKey::PreviewFormat,
        AttrInfo::IntArray(vec![
            RawPixelFormat::Uyvy.code(),
            RawPixelFormat::ItlvJpegUyvy.code(),
        ]),
    );

    camera.set_preview_format(PixelFormat::Uyvy).unwrap();
    assert_eq!(
        backend.attr_int(AttrKey::PreviewFormat),
        Some(RawPixelFormat::ItlvJpegUyvy.code())
    );

    // The alias never escapes through the getter.
    assert_eq!(camera.preview_format().unwrap(), PixelFormat::Uyvy);
}

#[test]
fn foreach_enumeration_stops_early() {
    let (camera, _backend) = open_camera();

    let mut seen = 0;
    camera
        .foreach_supported_preview_resolution(|_width, _height| {
            seen += 1;
            false
        })
        .unwrap();
    assert_eq!(seen, 1);
}

#[test]
fn flat_preview_frames_are_delivered_in_order() {
    let (camera, backend) = open_camera();

    let frames = Arc::new(PlMutex::new(Vec::new()));
    let sink = frames.clone();
    camera
        .set_preview_cb(move |frame| {
            sink.lock()
                .push((frame.format, frame.width, frame.height, frame.planes.count()));
        })
        .unwrap();

    backend.emit_stream_frame(nv12_stream_frame(640, 480, 1));
    backend.emit_stream_frame(nv12_stream_frame(640, 480, 2));

    assert_eq!(
        *frames.lock(),
        vec![
            (PixelFormat::Nv12, 640, 480, 2),
            (PixelFormat::Nv12, 640, 480, 2)
        ]
    );

    camera.unset_preview_cb().unwrap();
    assert!(!backend.has_stream_handler());
}

#[test]
fn media_packets_wrap_and_release_the_native_buffer_once() {
    let (camera, backend) = open_camera();

    let packets = Arc::new(PlMutex::new(Vec::new()));
    let sink = packets.clone();
    camera
        .set_media_packet_preview_cb(move |packet| {
            sink.lock().push(packet);
        })
        .unwrap();

    backend.emit_stream_frame(nv12_stream_frame(640, 480, 77));

    {
        let packets = packets.lock();
        assert_eq!(packets.len(), 1);
        let packet = &packets[0];
        assert_eq!(packet.format().width, 640);
        assert_eq!(packet.planes().len(), 2);
        assert_eq!(packet.pts_ns(), 16_000_000);
        // Nothing released while the packet is alive.
        assert!(backend.released_buffers().is_empty());
    }

    packets.lock().clear();
    assert_eq!(backend.released_buffers(), vec![77]);
}

#[test]
fn unmappable_packet_format_drops_the_frame_only() {
    let (camera, backend) = open_camera();

    let deliveries = Arc::new(AtomicU32::new(0));
    let count = deliveries.clone();
    camera
        .set_media_packet_preview_cb(move |_packet| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let mut encoded = nv12_stream_frame(640, 480, 5);
    encoded.format = RawPixelFormat::Encoded;
    backend.emit_stream_frame(encoded);
    assert_eq!(deliveries.load(Ordering::SeqCst), 0);

    // The next well-formed frame still goes through.
    backend.emit_stream_frame(nv12_stream_frame(640, 480, 6));
    assert_eq!(deliveries.load(Ordering::SeqCst), 1);
}

#[test]
fn both_preview_paths_receive_the_same_frame() {
    let (camera, backend) = open_camera();

    let flat = Arc::new(AtomicU32::new(0));
    let flat_count = flat.clone();
    camera
        .set_preview_cb(move |_frame| {
            flat_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let packets = Arc::new(AtomicU32::new(0));
    let packet_count = packets.clone();
    camera
        .set_media_packet_preview_cb(move |_packet| {
            packet_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    backend.emit_stream_frame(nv12_stream_frame(640, 480, 9));

    assert_eq!(flat.load(Ordering::SeqCst), 1);
    assert_eq!(packets.load(Ordering::SeqCst), 1);
}

#[test]
fn recommended_preview_resolution_follows_capture_ratio() {
    let (camera, _backend) = open_camera();
    // 3264x2448 is 4:3 -> the "normal" entry.
    assert_eq!(camera.recommended_preview_resolution().unwrap(), (1280, 720));
}

#[test]
fn relay_message_hook_sees_every_message() {
    let (camera, backend) = open_camera();

    let relayed = Arc::new(AtomicU32::new(0));
    let count = relayed.clone();
    camera
        .set_relay_message_cb(move |_message| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    backend.emit_message(Message::HdrProgress(40));
    backend.emit_message(Message::FocusChanged(FocusResult::Focused));
    backend.emit_message(Message::VideoSnapshotCaptured);

    assert_eq!(relayed.load(Ordering::SeqCst), 3);
}

#[test]
fn video_snapshot_fires_completion_directly() {
    let (camera, backend) = open_camera();

    let completions = Arc::new(AtomicU32::new(0));
    let count = completions.clone();
    // Register through a single capture so the completion slot is filled.
    start_preview(&camera, &backend);
    let completed: CaptureCompletedCb = Arc::new(move || {
        count.fetch_add(1, Ordering::SeqCst);
    });
    camera.start_capture(None, Some(completed)).unwrap();

    backend.emit_message(Message::VideoSnapshotCaptured);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn hdr_progress_is_forwarded_verbatim() {
    let (camera, backend) = open_camera();

    let seen = Arc::new(PlMutex::new(Vec::new()));
    let sink = seen.clone();
    camera
        .set_hdr_capture_progress_cb(move |percent| {
            sink.lock().push(percent);
        })
        .unwrap();

    backend.emit_message(Message::HdrProgress(25));
    backend.emit_message(Message::HdrProgress(100));

    assert_eq!(*seen.lock(), vec![25, 100]);
}
