//! Types crossing the boundary to the underlying camcorder framework.
//!
//! The framework itself (pipeline management, encoding, rendering) is an
//! external collaborator; everything here mirrors the shape of the data it
//! exchanges with the facade and nothing more.

use std::sync::Arc;

/// Upper bound on the number of planes a raw stream descriptor may carry.
pub const MAX_STREAM_PLANES: usize = 4;

/// Device selector passed to [`super::backend::BackendProvider::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraDevice {
    Rear,
    Front,
}

/// The framework's detailed state machine, as reported by `state()` and
/// state-change messages. The facade collapses this into the public
/// five-state view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrameworkState {
    None,
    Null,
    Ready,
    Prepare,
    Capturing,
    Recording,
    Paused,
}

/// Native error codes raised by the framework.
///
/// The set mirrors the families the framework actually emits; the public
/// translation is total and maps anything unrecognized (`Unknown`) to a
/// generic invalid-operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkError {
    InvalidArgument,
    InvalidAttributeType,
    NotInitialized,
    InvalidState,
    DeviceNotFound,
    DeviceBusy,
    DeviceOpen,
    CommandRunning,
    Device,
    DeviceIo,
    DeviceTimeout,
    DeviceWrongJpeg,
    DeviceLackBuffer,
    PipelineCore,
    PipelineLibrary,
    PipelineResource,
    PipelineStream,
    PipelineStateChange,
    PipelineNegotiation,
    PipelineLink,
    PipelineFlow,
    Encoder,
    EncoderBuffer,
    EncoderWrongType,
    EncoderWorking,
    Internal,
    ResponseTimeout,
    DspFail,
    AudioEmpty,
    CreateConfigure,
    FileSizeOver,
    DisplayDeviceOff,
    InvalidCondition,
    ResourceCreation,
    OutOfMemory,
    PolicyBlocked,
    PolicyBlockedByCall,
    PolicyBlockedByAlarm,
    PolicyRestricted,
    DeviceRegTrouble,
    InvalidPermission,
    OutOfArray,
    OutOfRange,
    AttributeNotFound,
    NotSupported,
    Unknown(i32),
}

/// Failure of a batched attribute write, optionally carrying the
/// framework's human-readable detail string.
#[derive(Debug, Clone)]
pub struct AttrFailure {
    pub code: FrameworkError,
    pub detail: Option<String>,
}

impl From<FrameworkError> for AttrFailure {
    fn from(code: FrameworkError) -> Self {
        Self { code, detail: None }
    }
}

/// Typed attribute keys understood by the framework.
///
/// This replaces the framework's stringly-typed variadic get/set protocol
/// with an enumerated key set; each key has a known value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKey {
    Mode,
    PreviewFormat,
    PreviewWidth,
    PreviewHeight,
    PreviewFps,
    PreviewFpsAuto,
    CaptureFormat,
    CaptureWidth,
    CaptureHeight,
    CaptureCount,
    CaptureInterval,
    BreakContinuousShot,
    CaptureSoundEnable,
    ImageEncoder,
    ImageEncoderQuality,
    DisplayDevice,
    DisplaySurface,
    DisplayHandle,
    DisplayRotation,
    DisplayFlip,
    DisplayVisible,
    DisplayGeometryMethod,
    DisplayMode,
    FocusMode,
    AfScanRange,
    AfTouchX,
    AfTouchY,
    ExposureMode,
    ExposureValue,
    Iso,
    Brightness,
    Contrast,
    Whitebalance,
    ColorTone,
    SceneMode,
    FlashMode,
    HdrCapture,
    DetectMode,
    DigitalZoom,
    AntiHandshake,
    VideoStabilization,
    WideDynamicRange,
    TagEnable,
    TagImageDescription,
    TagOrientation,
    TagSoftware,
    GpsEnable,
    GpsLatitude,
    GpsLongitude,
    GpsAltitude,
    Pan,
    Tilt,
    StreamRotation,
    StreamFlip,
    EncodedPreviewBitrate,
    EncodedPreviewIFrameInterval,
    SupportZslCapture,
    SupportMediaPacketPreview,
    DeviceCount,
    RecommendPreviewFormat,
    RecommendDisplayRotation,
    RecommendPreviewWidth,
    RecommendPreviewHeight,
    LensOrientation,
    CapturedExifRawData,
}

/// Tagged attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i32),
    Bool(bool),
    Double(f64),
    Str(String),
    Handle(u64),
    Bytes(Vec<u8>),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Bool(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            AttrValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

/// The framework's declared valid set for an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrInfo {
    IntRange { min: i32, max: i32 },
    IntArray(Vec<i32>),
}

/// Raw pixel formats as declared by the framework.
///
/// `ItlvJpegUyvy` is an interleaved-capture-only alias that must never
/// surface through the public API; reads normalize it to `Uyvy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawPixelFormat {
    Nv12,
    Nv12Tiled,
    Nv16,
    Nv21,
    Yuyv,
    Uyvy,
    ItlvJpegUyvy,
    Yuv422Planar,
    I420,
    Yv12,
    Rgb565,
    Rgb888,
    Rgba8888,
    Argb8888,
    Encoded,
}

impl RawPixelFormat {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => RawPixelFormat::Nv12,
            1 => RawPixelFormat::Nv12Tiled,
            2 => RawPixelFormat::Nv16,
            3 => RawPixelFormat::Nv21,
            4 => RawPixelFormat::Yuyv,
            5 => RawPixelFormat::Uyvy,
            6 => RawPixelFormat::Yuv422Planar,
            7 => RawPixelFormat::I420,
            8 => RawPixelFormat::Yv12,
            9 => RawPixelFormat::Rgb565,
            10 => RawPixelFormat::Rgb888,
            11 => RawPixelFormat::Rgba8888,
            12 => RawPixelFormat::Argb8888,
            13 => RawPixelFormat::Encoded,
            14 => RawPixelFormat::ItlvJpegUyvy,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        match self {
            RawPixelFormat::Nv12 => 0,
            RawPixelFormat::Nv12Tiled => 1,
            RawPixelFormat::Nv16 => 2,
            RawPixelFormat::Nv21 => 3,
            RawPixelFormat::Yuyv => 4,
            RawPixelFormat::Uyvy => 5,
            RawPixelFormat::Yuv422Planar => 6,
            RawPixelFormat::I420 => 7,
            RawPixelFormat::Yv12 => 8,
            RawPixelFormat::Rgb565 => 9,
            RawPixelFormat::Rgb888 => 10,
            RawPixelFormat::Rgba8888 => 11,
            RawPixelFormat::Argb8888 => 12,
            RawPixelFormat::Encoded => 13,
            RawPixelFormat::ItlvJpegUyvy => 14,
        }
    }
}

/// Framework focus-mode attribute values.
pub mod focus_mode {
    pub const NONE: i32 = 0;
    pub const PAN: i32 = 1;
    pub const AUTO: i32 = 2;
    pub const MANUAL: i32 = 3;
    pub const TOUCH_AUTO: i32 = 4;
    pub const CONTINUOUS: i32 = 5;
}

/// Autofocus scan outcome forwarded verbatim to the focus-changed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusResult {
    Released,
    Ongoing,
    Focused,
    Failed,
}

/// Policy cause attached to externally forced state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEvent {
    None,
    Sound,
    SoundByCall,
    SoundByAlarm,
    Security,
}

/// One detected face as reported by the framework's detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFaceInfo {
    pub id: i32,
    pub score: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Recording report resource attached to video/audio-captured messages.
/// The relay releases it; there is no public counterpart.
#[derive(Debug, Clone)]
pub struct RecordingReport {
    pub recording_filename: Option<String>,
}

/// Asynchronous messages delivered on the framework's event thread.
#[derive(Debug, Clone)]
pub enum Message {
    /// State transition. `policy` is `PolicyEvent::None` for transitions
    /// the application itself requested.
    StateChanged {
        previous: FrameworkState,
        current: FrameworkState,
        policy: PolicyEvent,
    },
    FocusChanged(FocusResult),
    /// Image capture progress: number of shots whose post-processing has
    /// completed so far in the running sequence.
    Captured(u32),
    VideoCaptured(RecordingReport),
    AudioCaptured(RecordingReport),
    VideoSnapshotCaptured,
    Error(FrameworkError),
    HdrProgress(u32),
    /// `None` means the detector delivered no data at all; `Some(vec![])`
    /// means it ran and found zero faces.
    FaceDetected(Option<Vec<RawFaceInfo>>),
}

/// Plane data of one raw preview frame. Shapes follow the framework's
/// stream-data families.
#[derive(Debug, Clone)]
pub enum StreamData {
    Packed { yuv: Vec<u8> },
    SemiPlanar { y: Vec<u8>, uv: Vec<u8> },
    Planar { y: Vec<u8>, u: Vec<u8>, v: Vec<u8> },
}

/// Raw preview frame descriptor handed to the video-stream callback.
///
/// `buffers` are the native buffer objects backing the planes;
/// `internal_buffer` identifies the framework-owned buffer that must be
/// released when a zero-copy packet wrapping this frame is destroyed.
#[derive(Debug, Clone)]
pub struct StreamFrame {
    pub format: RawPixelFormat,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: u64,
    pub data: StreamData,
    pub buffers: Vec<u64>,
    pub strides: [u32; MAX_STREAM_PLANES],
    pub elevations: [u32; MAX_STREAM_PLANES],
    pub internal_buffer: Option<u64>,
}

/// One captured still image.
#[derive(Debug, Clone)]
pub struct CaptureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: RawPixelFormat,
}

/// Captured frame delivered through the video-capture callback: the main
/// image plus optional thumbnail and screennail companions.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub image: CaptureData,
    pub thumbnail: Option<CaptureData>,
    pub screennail: Option<CaptureData>,
}

pub type MessageHandler = Arc<dyn Fn(Message) + Send + Sync>;
pub type VideoStreamHandler = Arc<dyn Fn(StreamFrame) + Send + Sync>;
pub type VideoCaptureHandler = Arc<dyn Fn(CaptureFrame) + Send + Sync>;
pub type RenderErrorHandler = Arc<dyn Fn(u32) + Send + Sync>;
