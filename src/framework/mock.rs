//! Deterministic in-process framework fake.
//!
//! Drives the facade the way the real framework would — synchronous handler
//! invocation on the caller's thread stands in for the framework's event
//! thread, and [`MockBackend::drain_idle`] stands in for its idle loop — so
//! state-machine behavior can be asserted without hardware.

use super::backend::{BackendProvider, CameraBackend};
use super::types::{
    AttrFailure, AttrInfo, AttrKey, AttrValue, CameraDevice, CaptureFrame, FrameworkError,
    FrameworkState, Message, MessageHandler, RawPixelFormat, RenderErrorHandler, StreamFrame,
    VideoCaptureHandler, VideoStreamHandler,
};
use crossbeam::queue::SegQueue;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct MockInner {
    state: FrameworkState,
    attrs: HashMap<AttrKey, AttrValue>,
    infos: HashMap<AttrKey, AttrInfo>,
    write_log: Vec<(AttrKey, AttrValue)>,
    message_handler: Option<MessageHandler>,
    stream_handler: Option<VideoStreamHandler>,
    capture_handler: Option<VideoCaptureHandler>,
    render_error_handler: Option<RenderErrorHandler>,
    fail_next_set: Option<AttrFailure>,
    fail_capture_start: Option<FrameworkError>,
    destroyed: bool,
    released_buffers: Vec<u64>,
}

/// Scriptable fake camcorder session.
pub struct MockBackend {
    inner: Mutex<MockInner>,
    idle: SegQueue<Box<dyn FnOnce() + Send>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let mut attrs = HashMap::new();
        attrs.insert(
            AttrKey::RecommendPreviewFormat,
            AttrValue::Int(RawPixelFormat::Yuyv.code()),
        );
        attrs.insert(AttrKey::RecommendDisplayRotation, AttrValue::Int(0));
        attrs.insert(AttrKey::CaptureWidth, AttrValue::Int(3264));
        attrs.insert(AttrKey::CaptureHeight, AttrValue::Int(2448));
        attrs.insert(AttrKey::PreviewWidth, AttrValue::Int(1280));
        attrs.insert(AttrKey::PreviewHeight, AttrValue::Int(720));
        attrs.insert(AttrKey::SupportZslCapture, AttrValue::Bool(true));
        attrs.insert(AttrKey::SupportMediaPacketPreview, AttrValue::Bool(true));
        attrs.insert(AttrKey::DeviceCount, AttrValue::Int(2));
        attrs.insert(
            AttrKey::FocusMode,
            AttrValue::Int(super::types::focus_mode::NONE),
        );
        attrs.insert(AttrKey::HdrCapture, AttrValue::Int(0));
        attrs.insert(AttrKey::PreviewFpsAuto, AttrValue::Bool(false));
        attrs.insert(AttrKey::PreviewFps, AttrValue::Int(30));

        let mut infos = HashMap::new();
        infos.insert(AttrKey::CaptureCount, AttrInfo::IntRange { min: 1, max: 30 });
        infos.insert(AttrKey::DetectMode, AttrInfo::IntArray(vec![0, 1]));
        infos.insert(AttrKey::HdrCapture, AttrInfo::IntArray(vec![0, 1, 2]));
        infos.insert(AttrKey::AntiHandshake, AttrInfo::IntArray(vec![0, 1]));
        infos.insert(AttrKey::VideoStabilization, AttrInfo::IntArray(vec![0, 1]));
        infos.insert(AttrKey::WideDynamicRange, AttrInfo::IntArray(vec![0, 1]));
        infos.insert(AttrKey::DigitalZoom, AttrInfo::IntRange { min: 10, max: 40 });
        infos.insert(AttrKey::Brightness, AttrInfo::IntRange { min: 0, max: 9 });
        infos.insert(AttrKey::Contrast, AttrInfo::IntRange { min: 0, max: 9 });
        infos.insert(
            AttrKey::ExposureValue,
            AttrInfo::IntRange { min: -12, max: 12 },
        );
        infos.insert(AttrKey::Pan, AttrInfo::IntRange { min: -90, max: 90 });
        infos.insert(AttrKey::Tilt, AttrInfo::IntRange { min: -45, max: 45 });
        infos.insert(
            AttrKey::PreviewFormat,
            AttrInfo::IntArray(vec![
                RawPixelFormat::Nv12.code(),
                RawPixelFormat::Yuyv.code(),
                RawPixelFormat::Uyvy.code(),
                RawPixelFormat::I420.code(),
            ]),
        );
        infos.insert(
            AttrKey::CaptureFormat,
            AttrInfo::IntArray(vec![
                RawPixelFormat::Encoded.code(),
                RawPixelFormat::Nv12.code(),
                RawPixelFormat::Uyvy.code(),
            ]),
        );
        infos.insert(
            AttrKey::PreviewWidth,
            AttrInfo::IntArray(vec![320, 640, 1280]),
        );
        infos.insert(
            AttrKey::PreviewHeight,
            AttrInfo::IntArray(vec![240, 480, 720]),
        );
        infos.insert(
            AttrKey::CaptureWidth,
            AttrInfo::IntArray(vec![640, 2048, 3264]),
        );
        infos.insert(
            AttrKey::CaptureHeight,
            AttrInfo::IntArray(vec![480, 1536, 2448]),
        );
        infos.insert(
            AttrKey::RecommendPreviewWidth,
            AttrInfo::IntArray(vec![1280, 1600, 1088]),
        );
        infos.insert(
            AttrKey::RecommendPreviewHeight,
            AttrInfo::IntArray(vec![720, 900, 1088]),
        );
        infos.insert(
            AttrKey::AfScanRange,
            AttrInfo::IntArray(vec![0, 1, 2, 3]),
        );
        infos.insert(
            AttrKey::FocusMode,
            AttrInfo::IntArray(vec![0, 1, 2, 3, 4, 5]),
        );
        infos.insert(AttrKey::ExposureMode, AttrInfo::IntArray(vec![0, 1, 2, 5, 7]));
        infos.insert(
            AttrKey::Iso,
            AttrInfo::IntArray(vec![0, 1, 2, 3, 4, 5, 6, 7]),
        );
        infos.insert(
            AttrKey::Whitebalance,
            AttrInfo::IntArray(vec![0, 1, 3, 4, 5]),
        );
        infos.insert(AttrKey::ColorTone, AttrInfo::IntArray(vec![0, 1, 2, 3]));
        infos.insert(AttrKey::SceneMode, AttrInfo::IntArray(vec![0, 1, 2, 3, 4]));
        infos.insert(AttrKey::FlashMode, AttrInfo::IntArray(vec![0, 1, 2, 3]));
        infos.insert(AttrKey::PreviewFps, AttrInfo::IntArray(vec![15, 24, 30]));
        infos.insert(AttrKey::StreamRotation, AttrInfo::IntArray(vec![0, 1, 2, 3]));
        infos.insert(AttrKey::StreamFlip, AttrInfo::IntArray(vec![0, 1, 2, 3]));
        infos.insert(AttrKey::DisplayMode, AttrInfo::IntArray(vec![0, 1]));

        Arc::new(Self {
            inner: Mutex::new(MockInner {
                state: FrameworkState::Null,
                attrs,
                infos,
                write_log: Vec::new(),
                message_handler: None,
                stream_handler: None,
                capture_handler: None,
                render_error_handler: None,
                fail_next_set: None,
                fail_capture_start: None,
                destroyed: false,
                released_buffers: Vec::new(),
            }),
            idle: SegQueue::new(),
        })
    }

    // --- scripting -----------------------------------------------------

    pub fn set_framework_state(&self, state: FrameworkState) {
        self.inner.lock().state = state;
    }

    pub fn seed_attr(&self, key: AttrKey, value: AttrValue) {
        self.inner.lock().attrs.insert(key, value);
    }

    pub fn declare_attr_info(&self, key: AttrKey, info: AttrInfo) {
        self.inner.lock().infos.insert(key, info);
    }

    pub fn fail_next_set_attributes(&self, failure: AttrFailure) {
        self.inner.lock().fail_next_set = Some(failure);
    }

    pub fn fail_capture_start(&self, code: FrameworkError) {
        self.inner.lock().fail_capture_start = Some(code);
    }

    // --- inspection ----------------------------------------------------

    pub fn attr_int(&self, key: AttrKey) -> Option<i32> {
        self.inner.lock().attrs.get(&key).and_then(AttrValue::as_int)
    }

    pub fn writes_of(&self, key: AttrKey) -> Vec<AttrValue> {
        self.inner
            .lock()
            .write_log
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    pub fn released_buffers(&self) -> Vec<u64> {
        self.inner.lock().released_buffers.clone()
    }

    pub fn has_stream_handler(&self) -> bool {
        self.inner.lock().stream_handler.is_some()
    }

    pub fn pending_idle_tasks(&self) -> usize {
        self.idle.len()
    }

    // --- event injection ------------------------------------------------

    /// Deliver a framework message to the registered handler, synchronously
    /// on the calling thread.
    pub fn emit_message(&self, message: Message) {
        let handler = self.inner.lock().message_handler.clone();
        if let Some(handler) = handler {
            handler(message);
        }
    }

    pub fn emit_state_changed(&self, previous: FrameworkState, current: FrameworkState) {
        self.set_framework_state(current);
        self.emit_message(Message::StateChanged {
            previous,
            current,
            policy: super::types::PolicyEvent::None,
        });
    }

    pub fn emit_stream_frame(&self, frame: StreamFrame) {
        let handler = self.inner.lock().stream_handler.clone();
        if let Some(handler) = handler {
            handler(frame);
        }
    }

    pub fn emit_capture_frame(&self, frame: CaptureFrame) {
        let handler = self.inner.lock().capture_handler.clone();
        if let Some(handler) = handler {
            handler(frame);
        }
    }

    pub fn emit_render_error(&self, pixmap_id: u32) {
        let handler = self.inner.lock().render_error_handler.clone();
        if let Some(handler) = handler {
            handler(pixmap_id);
        }
    }

    /// Run every queued idle task, in posting order.
    pub fn drain_idle(&self) {
        while let Some(task) = self.idle.pop() {
            task();
        }
    }
}

impl CameraBackend for MockBackend {
    fn destroy(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return Err(FrameworkError::NotInitialized);
        }
        inner.destroyed = true;
        inner.state = FrameworkState::None;
        Ok(())
    }

    fn state(&self) -> FrameworkState {
        self.inner.lock().state
    }

    fn realize(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        match inner.state {
            FrameworkState::Null => {
                inner.state = FrameworkState::Ready;
                Ok(())
            }
            _ => Err(FrameworkError::InvalidState),
        }
    }

    fn unrealize(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        match inner.state {
            FrameworkState::Ready => {
                inner.state = FrameworkState::Null;
                Ok(())
            }
            _ => Err(FrameworkError::InvalidState),
        }
    }

    fn start(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        match inner.state {
            FrameworkState::Ready => {
                inner.state = FrameworkState::Prepare;
                Ok(())
            }
            _ => Err(FrameworkError::InvalidState),
        }
    }

    fn stop(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        match inner.state {
            FrameworkState::Prepare => {
                inner.state = FrameworkState::Ready;
                Ok(())
            }
            _ => Err(FrameworkError::InvalidState),
        }
    }

    fn capture_start(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fail_capture_start.take() {
            return Err(code);
        }
        match inner.state {
            FrameworkState::Prepare | FrameworkState::Recording | FrameworkState::Paused => {
                inner.state = FrameworkState::Capturing;
                Ok(())
            }
            _ => Err(FrameworkError::InvalidState),
        }
    }

    fn capture_stop(&self) -> Result<(), FrameworkError> {
        let mut inner = self.inner.lock();
        match inner.state {
            FrameworkState::Capturing => {
                inner.state = FrameworkState::Prepare;
                Ok(())
            }
            _ => Err(FrameworkError::InvalidState),
        }
    }

    fn start_focusing(&self) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn stop_focusing(&self) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn set_attributes(&self, pairs: &[(AttrKey, AttrValue)]) -> Result<(), AttrFailure> {
        let mut inner = self.inner.lock();
        if let Some(failure) = inner.fail_next_set.take() {
            return Err(failure);
        }
        for (key, value) in pairs {
            debug!("mock attr write {key:?} = {value:?}");
            inner.attrs.insert(*key, value.clone());
            inner.write_log.push((*key, value.clone()));
        }
        Ok(())
    }

    fn get_attribute(&self, key: AttrKey) -> Result<AttrValue, FrameworkError> {
        self.inner
            .lock()
            .attrs
            .get(&key)
            .cloned()
            .ok_or(FrameworkError::AttributeNotFound)
    }

    fn attribute_info(&self, key: AttrKey) -> Result<AttrInfo, FrameworkError> {
        self.inner
            .lock()
            .infos
            .get(&key)
            .cloned()
            .ok_or(FrameworkError::AttributeNotFound)
    }

    fn set_message_handler(&self, handler: Option<MessageHandler>) {
        self.inner.lock().message_handler = handler;
    }

    fn set_video_stream_handler(&self, handler: Option<VideoStreamHandler>) {
        self.inner.lock().stream_handler = handler;
    }

    fn set_video_capture_handler(&self, handler: Option<VideoCaptureHandler>) {
        self.inner.lock().capture_handler = handler;
    }

    fn set_render_error_handler(&self, handler: Option<RenderErrorHandler>) {
        self.inner.lock().render_error_handler = handler;
    }

    fn post_idle(&self, task: Box<dyn FnOnce() + Send>) {
        self.idle.push(task);
    }

    fn release_stream_buffer(&self, buffer: u64) {
        self.inner.lock().released_buffers.push(buffer);
    }
}

/// Provider returning a pre-built mock session.
pub struct MockProvider {
    backend: Arc<MockBackend>,
    fail_create: Option<FrameworkError>,
}

impl MockProvider {
    pub fn new(backend: Arc<MockBackend>) -> Self {
        Self {
            backend,
            fail_create: None,
        }
    }

    pub fn failing(code: FrameworkError) -> Self {
        Self {
            backend: MockBackend::new(),
            fail_create: Some(code),
        }
    }
}

impl BackendProvider for MockProvider {
    fn create(&self, _device: CameraDevice) -> Result<Arc<dyn CameraBackend>, FrameworkError> {
        match self.fail_create {
            Some(code) => Err(code),
            None => Ok(self.backend.clone() as Arc<dyn CameraBackend>),
        }
    }
}
