//! The seam between the facade and the underlying camcorder framework.
//!
//! Everything the facade needs from the framework is expressed here as an
//! object-safe trait so the session machinery can be exercised against
//! [`super::mock::MockBackend`] without hardware.

use super::types::{
    AttrFailure, AttrInfo, AttrKey, AttrValue, CameraDevice, FrameworkError, FrameworkState,
    MessageHandler, RenderErrorHandler, VideoCaptureHandler, VideoStreamHandler,
};
use std::sync::Arc;

/// Handle to one framework camcorder session.
///
/// Message, stream and capture handlers are invoked on the framework's own
/// event thread; implementations must deliver messages for a session in the
/// order they were raised and frames in arrival order.
pub trait CameraBackend: Send + Sync {
    fn destroy(&self) -> Result<(), FrameworkError>;

    fn state(&self) -> FrameworkState;

    fn realize(&self) -> Result<(), FrameworkError>;
    fn unrealize(&self) -> Result<(), FrameworkError>;
    fn start(&self) -> Result<(), FrameworkError>;
    fn stop(&self) -> Result<(), FrameworkError>;

    fn capture_start(&self) -> Result<(), FrameworkError>;
    fn capture_stop(&self) -> Result<(), FrameworkError>;

    fn start_focusing(&self) -> Result<(), FrameworkError>;
    fn stop_focusing(&self) -> Result<(), FrameworkError>;

    /// Apply a batch of attribute writes. The batch is not transactional;
    /// the error identifies the first write the framework rejected.
    fn set_attributes(&self, pairs: &[(AttrKey, AttrValue)]) -> Result<(), AttrFailure>;

    fn get_attribute(&self, key: AttrKey) -> Result<AttrValue, FrameworkError>;

    /// The framework's declared valid set for `key`.
    fn attribute_info(&self, key: AttrKey) -> Result<AttrInfo, FrameworkError>;

    fn set_message_handler(&self, handler: Option<MessageHandler>);
    fn set_video_stream_handler(&self, handler: Option<VideoStreamHandler>);
    fn set_video_capture_handler(&self, handler: Option<VideoCaptureHandler>);
    fn set_render_error_handler(&self, handler: Option<RenderErrorHandler>);

    /// Post a one-shot task onto the framework's event thread, to run after
    /// all currently pending messages have been delivered.
    fn post_idle(&self, task: Box<dyn FnOnce() + Send>);

    /// Release a framework-owned stream buffer previously handed out inside
    /// a [`super::types::StreamFrame`]. Called exactly once per buffer, by
    /// the finalizer of the packet wrapping it.
    fn release_stream_buffer(&self, buffer: u64);
}

/// Factory creating framework sessions for a device selector.
pub trait BackendProvider {
    fn create(&self, device: CameraDevice) -> Result<Arc<dyn CameraBackend>, FrameworkError>;
}
