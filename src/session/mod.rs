mod callbacks;
mod capture;
mod focus;
mod relay;
mod state;
#[cfg(test)]
mod tests;

pub use callbacks::{
    CaptureCompletedCb, CapturingCb, ErrorCb, FaceDetectedCb, FocusChangedCb, HdrProgressCb,
    InterruptedCb, PacketPreviewCb, PreviewCb, RelayMessageCb, RenderErrorCb, StateChangedCb,
};
pub use state::{CameraState, PolicyCause};

use crate::config::FacadeConfig;
use crate::display::{DisplayHandle, DisplayType, SURFACE_EVAS, SURFACE_NULL, SURFACE_OVERLAY};
use crate::error::{translate, CameraError, Result};
use crate::frame::{DetectedFace, PixelFormat};
use crate::framework::backend::{BackendProvider, CameraBackend};
use crate::framework::types::{
    AttrInfo, AttrKey, AttrValue, CameraDevice, FrameworkState, RawPixelFormat,
};
use crate::marshal;
use parking_lot::Mutex;
use state::SessionState;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Framework mode attribute: still-image capture with preview pipeline.
const MODE_VIDEO_CAPTURE: i32 = 1;
/// Framework image encoder attribute: JPEG.
const IMAGE_CODEC_JPEG: i32 = 1;
/// Framework display device attribute: main LCD.
const DISPLAY_DEVICE_MAIN: i32 = 0;
/// Framework detect-mode attribute values.
const DETECT_MODE_OFF: i32 = 0;
const DETECT_MODE_ON: i32 = 1;

/// Shared core of one camera session: the framework handle, the facade
/// configuration and the mutex guarding all mutable session state.
pub(crate) struct SessionShared {
    pub(crate) backend: Arc<dyn CameraBackend>,
    pub(crate) config: FacadeConfig,
    pub(crate) state: Mutex<SessionState>,
}

impl SessionShared {
    pub(crate) fn set_attrs(&self, pairs: &[(AttrKey, AttrValue)]) -> Result<()> {
        self.backend.set_attributes(pairs).map_err(|failure| {
            if let Some(detail) = &failure.detail {
                error!("attribute write failed: {detail}");
            }
            translate(failure.code)
        })
    }

    pub(crate) fn get_int(&self, key: AttrKey) -> Result<i32> {
        self.backend
            .get_attribute(key)
            .map_err(translate)?
            .as_int()
            .ok_or(CameraError::InvalidOperation)
    }

    pub(crate) fn get_bool(&self, key: AttrKey) -> Result<bool> {
        self.backend
            .get_attribute(key)
            .map_err(translate)?
            .as_bool()
            .ok_or(CameraError::InvalidOperation)
    }

    pub(crate) fn int_range(&self, key: AttrKey) -> Result<(i32, i32)> {
        match self.backend.attribute_info(key).map_err(translate)? {
            AttrInfo::IntRange { min, max } => Ok((min, max)),
            AttrInfo::IntArray(values) => {
                let min = values.iter().min().copied();
                let max = values.iter().max().copied();
                match (min, max) {
                    (Some(min), Some(max)) => Ok((min, max)),
                    _ => Err(CameraError::InvalidOperation),
                }
            }
        }
    }

    pub(crate) fn int_array(&self, key: AttrKey) -> Result<Vec<i32>> {
        match self.backend.attribute_info(key).map_err(translate)? {
            AttrInfo::IntArray(values) => Ok(values),
            AttrInfo::IntRange { .. } => Err(CameraError::InvalidOperation),
        }
    }
}

impl Drop for SessionShared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.destroyed && !state.is_used_in_recorder {
            let _ = self.backend.destroy();
        }
    }
}

/// One camera session.
///
/// Public operations are synchronous: they either complete immediately or
/// kick off asynchronous work whose outcome arrives through a registered
/// callback on the framework's event thread.
pub struct Camera {
    pub(crate) shared: Arc<SessionShared>,
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera").finish_non_exhaustive()
    }
}

impl Camera {
    /// Create a session for `device` and negotiate its initial attributes.
    ///
    /// Fails atomically: any negotiation error destroys the framework
    /// handle before returning.
    pub fn open(
        provider: &dyn BackendProvider,
        device: CameraDevice,
        config: FacadeConfig,
    ) -> Result<Self> {
        info!("opening camera device {device:?}");

        let backend = provider.create(device).map_err(translate)?;

        let preview_format = backend
            .get_attribute(AttrKey::RecommendPreviewFormat)
            .ok()
            .and_then(|v| v.as_int())
            .and_then(RawPixelFormat::from_code)
            .unwrap_or(RawPixelFormat::Yuyv);
        let rotation = backend
            .get_attribute(AttrKey::RecommendDisplayRotation)
            .ok()
            .and_then(|v| v.as_int())
            .unwrap_or(0);
        let capture_width = backend
            .get_attribute(AttrKey::CaptureWidth)
            .ok()
            .and_then(|v| v.as_int())
            .unwrap_or(0);
        let capture_height = backend
            .get_attribute(AttrKey::CaptureHeight)
            .ok()
            .and_then(|v| v.as_int())
            .unwrap_or(0);

        let initial = [
            (AttrKey::Mode, AttrValue::Int(MODE_VIDEO_CAPTURE)),
            (
                AttrKey::PreviewFormat,
                AttrValue::Int(preview_format.code()),
            ),
            (AttrKey::ImageEncoder, AttrValue::Int(IMAGE_CODEC_JPEG)),
            (
                AttrKey::CaptureFormat,
                AttrValue::Int(RawPixelFormat::Encoded.code()),
            ),
            (AttrKey::DisplaySurface, AttrValue::Int(SURFACE_NULL)),
            (AttrKey::DisplayRotation, AttrValue::Int(rotation)),
            (AttrKey::CaptureCount, AttrValue::Int(1)),
        ];
        if let Err(failure) = backend.set_attributes(&initial) {
            error!(
                "initial attribute negotiation failed: {:?} ({})",
                failure.code,
                failure.detail.as_deref().unwrap_or("no detail")
            );
            let _ = backend.destroy();
            return Err(translate(failure.code));
        }

        let shared = Arc::new(SessionShared {
            backend,
            config,
            state: Mutex::new(SessionState::new(capture_width, capture_height)),
        });

        let weak = Arc::downgrade(&shared);
        shared
            .backend
            .set_message_handler(Some(Arc::new(move |message| {
                if let Some(shared) = weak.upgrade() {
                    relay::handle_message(&shared, message);
                }
            })));

        Ok(Self { shared })
    }

    /// Tear the session down.
    ///
    /// Fails with `InvalidOperation` while an external recorder owns the
    /// session, leaving it fully intact.
    pub fn destroy(&self) -> Result<()> {
        {
            let state = self.shared.state.lock();
            if state.is_used_in_recorder {
                error!("camera is in use by a recorder, refusing to destroy");
                return Err(CameraError::InvalidOperation);
            }
            if state.destroyed {
                return Err(CameraError::InvalidState);
            }
        }

        self.shared.backend.destroy().map_err(translate)?;

        self.shared.backend.set_message_handler(None);
        self.shared.backend.set_video_stream_handler(None);
        self.shared.backend.set_video_capture_handler(None);
        self.shared.backend.set_render_error_handler(None);

        let mut state = self.shared.state.lock();
        state.destroyed = true;
        state.packet_format = None;
        Ok(())
    }

    /// Current public state, pseudo-`Captured` override applied.
    pub fn state(&self) -> Result<CameraState> {
        let framework_state = self.shared.backend.state();
        Ok(self.shared.state.lock().resolved_state(framework_state))
    }

    /// Start the preview stream.
    ///
    /// From `Captured` this instead finishes the capture cycle (the
    /// framework drops back to preview on its own and reports the
    /// transition asynchronously).
    pub fn start_preview(&self) -> Result<()> {
        let framework_state = self.shared.backend.state();
        let resolved = self.shared.state.lock().resolved_state(framework_state);

        if resolved == CameraState::Captured {
            return self.shared.backend.capture_stop().map_err(translate);
        }

        // The captured message is only delivered while a capture callback
        // is registered, so the handler is wired up before preview starts.
        let weak = Arc::downgrade(&self.shared);
        self.shared
            .backend
            .set_video_capture_handler(Some(Arc::new(move |frame| {
                if let Some(shared) = weak.upgrade() {
                    capture::on_capture_frame(&shared, frame);
                }
            })));

        if framework_state != FrameworkState::Ready {
            self.shared.backend.realize().map_err(translate)?;
        }

        if let Err(code) = self.shared.backend.start() {
            let _ = self.shared.backend.unrealize();
            return Err(translate(code));
        }

        Ok(())
    }

    pub fn stop_preview(&self) -> Result<()> {
        if self.shared.backend.state() == FrameworkState::Prepare {
            self.shared.backend.stop().map_err(translate)?;
        }

        if let Err(code) = self.stop_face_detection() {
            debug!("face detection not stopped with preview: {code:?}");
        }

        self.shared.backend.unrealize().map_err(translate)
    }

    // --- display binding -----------------------------------------------

    /// Bind the preview to a display surface. The handle stays owned by
    /// the windowing collaborator; the session only forwards it.
    pub fn set_display(&self, kind: DisplayType, handle: Option<DisplayHandle>) -> Result<()> {
        if kind != DisplayType::None && handle.is_none() {
            error!("display type {kind:?} requires a handle");
            return Err(CameraError::InvalidParameter);
        }

        let surface = match kind {
            DisplayType::None => SURFACE_NULL,
            DisplayType::Overlay => SURFACE_OVERLAY,
            DisplayType::Evas => SURFACE_EVAS,
        };

        {
            let mut state = self.shared.state.lock();
            state.display_type = kind;
            state.display_handle = if kind == DisplayType::None {
                None
            } else {
                handle
            };
        }

        self.shared.set_attrs(&[
            (AttrKey::DisplayDevice, AttrValue::Int(DISPLAY_DEVICE_MAIN)),
            (AttrKey::DisplaySurface, AttrValue::Int(surface)),
        ])?;

        if let (true, Some(handle)) = (kind != DisplayType::None, handle) {
            self.shared
                .set_attrs(&[(AttrKey::DisplayHandle, AttrValue::Handle(handle.0))])?;
        }

        Ok(())
    }

    /// The currently bound display descriptor.
    pub fn display_binding(&self) -> (DisplayType, Option<DisplayHandle>) {
        let state = self.shared.state.lock();
        (state.display_type, state.display_handle)
    }

    // --- preview / capture geometry & formats ---------------------------

    pub fn set_preview_resolution(&self, width: i32, height: i32) -> Result<()> {
        self.shared.set_attrs(&[
            (AttrKey::PreviewWidth, AttrValue::Int(width)),
            (AttrKey::PreviewHeight, AttrValue::Int(height)),
        ])
    }

    pub fn preview_resolution(&self) -> Result<(i32, i32)> {
        Ok((
            self.shared.get_int(AttrKey::PreviewWidth)?,
            self.shared.get_int(AttrKey::PreviewHeight)?,
        ))
    }

    pub fn set_capture_resolution(&self, width: i32, height: i32) -> Result<()> {
        self.shared.set_attrs(&[
            (AttrKey::CaptureWidth, AttrValue::Int(width)),
            (AttrKey::CaptureHeight, AttrValue::Int(height)),
        ])?;

        let mut state = self.shared.state.lock();
        state.capture_width = width;
        state.capture_height = height;
        Ok(())
    }

    /// The configured capture resolution. Served from the session cache so
    /// it stays stable while a burst temporarily overrides the framework
    /// attribute.
    pub fn capture_resolution(&self) -> Result<(i32, i32)> {
        let state = self.shared.state.lock();
        Ok((state.capture_width, state.capture_height))
    }

    /// Set the preview pixel format.
    ///
    /// UYVY prefers the framework's interleaved-capture alias when the
    /// device declares it; the alias is an internal detail and reads
    /// normalize it back (see [`Camera::preview_format`]).
    pub fn set_preview_format(&self, format: PixelFormat) -> Result<()> {
        let raw = if format == PixelFormat::Uyvy {
            let supports_interleaved = matches!(
                self.shared.backend.attribute_info(AttrKey::PreviewFormat),
                Ok(AttrInfo::IntArray(ref formats))
                    if formats.contains(&RawPixelFormat::ItlvJpegUyvy.code())
            );
            if supports_interleaved {
                RawPixelFormat::ItlvJpegUyvy
            } else {
                RawPixelFormat::Uyvy
            }
        } else {
            format.to_raw()
        };

        self.shared
            .set_attrs(&[(AttrKey::PreviewFormat, AttrValue::Int(raw.code()))])
    }

    pub fn preview_format(&self) -> Result<PixelFormat> {
        let code = self.shared.get_int(AttrKey::PreviewFormat)?;
        RawPixelFormat::from_code(code)
            .map(PixelFormat::from_raw)
            .ok_or(CameraError::InvalidOperation)
    }

    pub fn set_capture_format(&self, format: PixelFormat) -> Result<()> {
        self.shared.set_attrs(&[(
            AttrKey::CaptureFormat,
            AttrValue::Int(format.to_raw().code()),
        )])
    }

    pub fn capture_format(&self) -> Result<PixelFormat> {
        let code = self.shared.get_int(AttrKey::CaptureFormat)?;
        RawPixelFormat::from_code(code)
            .map(PixelFormat::from_raw)
            .ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_preview_resolution(
        &self,
        mut f: impl FnMut(i32, i32) -> bool,
    ) -> Result<()> {
        let widths = self.shared.int_array(AttrKey::PreviewWidth)?;
        let heights = self.shared.int_array(AttrKey::PreviewHeight)?;
        for (width, height) in widths.into_iter().zip(heights) {
            if !f(width, height) {
                break;
            }
        }
        Ok(())
    }

    pub fn foreach_supported_capture_resolution(
        &self,
        mut f: impl FnMut(i32, i32) -> bool,
    ) -> Result<()> {
        let widths = self.shared.int_array(AttrKey::CaptureWidth)?;
        let heights = self.shared.int_array(AttrKey::CaptureHeight)?;
        for (width, height) in widths.into_iter().zip(heights) {
            if !f(width, height) {
                break;
            }
        }
        Ok(())
    }

    /// Enumerate the declared preview formats in framework order, skipping
    /// the interleaved-capture alias, which is never a public format.
    pub fn foreach_supported_preview_format(
        &self,
        mut f: impl FnMut(PixelFormat) -> bool,
    ) -> Result<()> {
        for code in self.shared.int_array(AttrKey::PreviewFormat)? {
            match RawPixelFormat::from_code(code) {
                Some(RawPixelFormat::ItlvJpegUyvy) | None => continue,
                Some(raw) => {
                    if !f(PixelFormat::from_raw(raw)) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn foreach_supported_capture_format(
        &self,
        mut f: impl FnMut(PixelFormat) -> bool,
    ) -> Result<()> {
        for code in self.shared.int_array(AttrKey::CaptureFormat)? {
            match RawPixelFormat::from_code(code) {
                Some(RawPixelFormat::ItlvJpegUyvy) | None => continue,
                Some(raw) => {
                    if !f(PixelFormat::from_raw(raw)) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Preview resolution the device recommends for the configured capture
    /// aspect ratio.
    pub fn recommended_preview_resolution(&self) -> Result<(i32, i32)> {
        let (capture_width, capture_height) = self.capture_resolution()?;
        let ratio = capture_width as f64 / capture_height as f64;
        let index = if ratio > 1.5 {
            1 // wide
        } else if (ratio - 1.0).abs() < f64::EPSILON {
            2 // square
        } else {
            0 // normal
        };

        let widths = self.shared.int_array(AttrKey::RecommendPreviewWidth)?;
        let heights = self.shared.int_array(AttrKey::RecommendPreviewHeight)?;

        match (widths.get(index), heights.get(index)) {
            (Some(&width), Some(&height)) => {
                info!("recommended preview resolution {width}x{height} (type {index})");
                Ok((width, height))
            }
            _ => {
                error!(
                    "no recommended resolution for capture {capture_width}x{capture_height} (type {index})"
                );
                Err(CameraError::InvalidOperation)
            }
        }
    }

    pub fn device_count(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::DeviceCount)
    }

    // --- capability probes ----------------------------------------------

    pub fn is_supported_zero_shutter_lag(&self) -> Result<bool> {
        self.shared.get_bool(AttrKey::SupportZslCapture)
    }

    pub fn is_supported_media_packet_preview(&self) -> Result<bool> {
        self.shared.get_bool(AttrKey::SupportMediaPacketPreview)
    }

    pub fn is_supported_face_detection(&self) -> Result<bool> {
        match self
            .shared
            .backend
            .attribute_info(AttrKey::DetectMode)
            .map_err(translate)?
        {
            AttrInfo::IntArray(modes) => Ok(modes.contains(&DETECT_MODE_ON)),
            AttrInfo::IntRange { .. } => Ok(false),
        }
    }

    // --- face detection -------------------------------------------------

    pub fn start_face_detection<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&[DetectedFace]) + Send + Sync + 'static,
    {
        if !self.is_supported_face_detection()? {
            return Err(CameraError::NotSupported);
        }

        if self.state()? != CameraState::Preview {
            return Err(CameraError::InvalidState);
        }

        self.shared
            .set_attrs(&[(AttrKey::DetectMode, AttrValue::Int(DETECT_MODE_ON))])?;

        let mut state = self.shared.state.lock();
        state.callbacks.face_detected = Some(Arc::new(callback));
        state.faces.clear();
        Ok(())
    }

    pub fn stop_face_detection(&self) -> Result<()> {
        if !self.is_supported_face_detection()? {
            return Err(CameraError::NotSupported);
        }

        let result = self
            .shared
            .set_attrs(&[(AttrKey::DetectMode, AttrValue::Int(DETECT_MODE_OFF))]);

        let mut state = self.shared.state.lock();
        state.callbacks.face_detected = None;
        state.faces.clear();
        result
    }

    /// Faces from the most recent detection pass.
    pub fn detected_faces(&self) -> Vec<DetectedFace> {
        self.shared.state.lock().faces.clone()
    }

    // --- preview callbacks ----------------------------------------------

    pub fn set_preview_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&crate::frame::PreviewFrame<'_>) + Send + Sync + 'static,
    {
        self.shared.state.lock().callbacks.preview = Some(Arc::new(callback));
        self.register_stream_handler();
        Ok(())
    }

    pub fn unset_preview_cb(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.callbacks.preview = None;
        if state.callbacks.packet_preview.is_none() {
            self.shared.backend.set_video_stream_handler(None);
        }
        Ok(())
    }

    pub fn set_media_packet_preview_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(marshal::MediaPacket) + Send + Sync + 'static,
    {
        if !self.is_supported_media_packet_preview()? {
            return Err(CameraError::NotSupported);
        }

        self.shared.state.lock().callbacks.packet_preview = Some(Arc::new(callback));
        self.register_stream_handler();
        Ok(())
    }

    pub fn unset_media_packet_preview_cb(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.callbacks.packet_preview = None;
        if state.callbacks.preview.is_none() {
            self.shared.backend.set_video_stream_handler(None);
        }
        Ok(())
    }

    fn register_stream_handler(&self) {
        let weak = Arc::downgrade(&self.shared);
        self.shared
            .backend
            .set_video_stream_handler(Some(Arc::new(move |frame| {
                if let Some(shared) = weak.upgrade() {
                    marshal::dispatch_stream_frame(&shared, frame);
                }
            })));
    }

    // --- event callbacks ------------------------------------------------

    pub fn set_state_changed_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(CameraState, CameraState, PolicyCause) + Send + Sync + 'static,
    {
        self.shared.state.lock().callbacks.state_changed = Some(Arc::new(callback));
        Ok(())
    }

    pub fn unset_state_changed_cb(&self) -> Result<()> {
        self.shared.state.lock().callbacks.state_changed = None;
        Ok(())
    }

    pub fn set_interrupted_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(PolicyCause, CameraState, CameraState) + Send + Sync + 'static,
    {
        self.shared.state.lock().callbacks.interrupted = Some(Arc::new(callback));
        Ok(())
    }

    pub fn unset_interrupted_cb(&self) -> Result<()> {
        self.shared.state.lock().callbacks.interrupted = None;
        Ok(())
    }

    pub fn set_focus_changed_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(crate::framework::types::FocusResult) + Send + Sync + 'static,
    {
        self.shared.state.lock().callbacks.focus_changed = Some(Arc::new(callback));
        Ok(())
    }

    pub fn unset_focus_changed_cb(&self) -> Result<()> {
        self.shared.state.lock().callbacks.focus_changed = None;
        Ok(())
    }

    pub fn set_error_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(CameraError, CameraState) + Send + Sync + 'static,
    {
        self.shared.state.lock().callbacks.error = Some(Arc::new(callback));
        Ok(())
    }

    pub fn unset_error_cb(&self) -> Result<()> {
        self.shared.state.lock().callbacks.error = None;
        Ok(())
    }

    /// Relay every raw framework message to an external recorder sharing
    /// this session. Invoked before the session's own dispatch.
    pub fn set_relay_message_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&crate::framework::types::Message) + Send + Sync + 'static,
    {
        self.shared.state.lock().callbacks.relay_message = Some(Arc::new(callback));
        Ok(())
    }

    pub fn unset_relay_message_cb(&self) -> Result<()> {
        self.shared.state.lock().callbacks.relay_message = None;
        Ok(())
    }

    // --- recorder ownership ---------------------------------------------

    /// Ownership latch set by an external recorder component; while held,
    /// [`Camera::destroy`] is refused.
    pub fn mark_used_by_recorder(&self, used: bool) {
        warn!("session recorder ownership set to {used}");
        self.shared.state.lock().is_used_in_recorder = used;
    }

    pub fn is_used_by_recorder(&self) -> bool {
        self.shared.state.lock().is_used_in_recorder
    }

    /// Direct handle to the framework session, for a recorder component
    /// driving the same device through its own pipeline.
    pub fn framework_backend(&self) -> Arc<dyn CameraBackend> {
        self.shared.backend.clone()
    }
}
