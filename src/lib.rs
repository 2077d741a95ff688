pub mod attrs;
pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod framework;
pub mod marshal;
pub mod session;

pub use attrs::{
    AfMode, Effect, ExposureMode, FlashMode, Fps, HdrMode, Iso, SceneMode, TheaterMode,
    Whitebalance,
};
pub use config::{ClearAfAreaPolicy, CompletionAuthority, FacadeConfig};
pub use display::{DisplayHandle, DisplayMode, DisplayType};
pub use error::{CameraError, Result};
pub use frame::{
    DetectedFace, Flip, ImageData, PixelFormat, Planes, PreviewFrame, Rotation, MAX_DETECTED_FACES,
};
pub use framework::backend::{BackendProvider, CameraBackend};
pub use framework::mock::{MockBackend, MockProvider};
pub use framework::types::{CameraDevice, FocusResult, FrameworkError, FrameworkState};
pub use marshal::{MediaPacket, PacketFormat, PacketMimetype, SurfaceFormat};
pub use session::{Camera, CameraState, PolicyCause};
