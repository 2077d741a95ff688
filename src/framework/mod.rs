pub mod backend;
pub mod mock;
pub mod types;

pub use backend::{BackendProvider, CameraBackend};
pub use mock::{MockBackend, MockProvider};
pub use types::{
    AttrFailure, AttrInfo, AttrKey, AttrValue, CameraDevice, CaptureData, CaptureFrame,
    FocusResult, FrameworkError, FrameworkState, Message, PolicyEvent, RawFaceInfo,
    RawPixelFormat, RecordingReport, StreamData, StreamFrame, MAX_STREAM_PLANES,
};
