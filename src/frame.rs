use crate::framework::types::RawPixelFormat;
use serde::{Deserialize, Serialize};

/// Maximum number of faces kept in the per-session detection cache.
pub const MAX_DETECTED_FACES: usize = 20;

/// Public pixel formats.
///
/// The framework additionally knows an interleaved-capture alias of UYVY;
/// that alias never appears here — reads normalize it to [`Uyvy`] and it is
/// filtered out of supported-format enumeration.
///
/// [`Uyvy`]: PixelFormat::Uyvy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Nv12,
    Nv12Tiled,
    Nv16,
    Nv21,
    Yuyv,
    Uyvy,
    Yuv422Planar,
    I420,
    Yv12,
    Rgb565,
    Rgb888,
    Rgba8888,
    Argb8888,
    Jpeg,
}

impl PixelFormat {
    /// Map a framework format to its public equivalent, normalizing the
    /// interleaved-capture alias to plain UYVY.
    pub(crate) fn from_raw(raw: RawPixelFormat) -> Self {
        match raw {
            RawPixelFormat::Nv12 => PixelFormat::Nv12,
            RawPixelFormat::Nv12Tiled => PixelFormat::Nv12Tiled,
            RawPixelFormat::Nv16 => PixelFormat::Nv16,
            RawPixelFormat::Nv21 => PixelFormat::Nv21,
            RawPixelFormat::Yuyv => PixelFormat::Yuyv,
            RawPixelFormat::Uyvy | RawPixelFormat::ItlvJpegUyvy => PixelFormat::Uyvy,
            RawPixelFormat::Yuv422Planar => PixelFormat::Yuv422Planar,
            RawPixelFormat::I420 => PixelFormat::I420,
            RawPixelFormat::Yv12 => PixelFormat::Yv12,
            RawPixelFormat::Rgb565 => PixelFormat::Rgb565,
            RawPixelFormat::Rgb888 => PixelFormat::Rgb888,
            RawPixelFormat::Rgba8888 => PixelFormat::Rgba8888,
            RawPixelFormat::Argb8888 => PixelFormat::Argb8888,
            RawPixelFormat::Encoded => PixelFormat::Jpeg,
        }
    }

    pub(crate) fn to_raw(self) -> RawPixelFormat {
        match self {
            PixelFormat::Nv12 => RawPixelFormat::Nv12,
            PixelFormat::Nv12Tiled => RawPixelFormat::Nv12Tiled,
            PixelFormat::Nv16 => RawPixelFormat::Nv16,
            PixelFormat::Nv21 => RawPixelFormat::Nv21,
            PixelFormat::Yuyv => RawPixelFormat::Yuyv,
            PixelFormat::Uyvy => RawPixelFormat::Uyvy,
            PixelFormat::Yuv422Planar => RawPixelFormat::Yuv422Planar,
            PixelFormat::I420 => RawPixelFormat::I420,
            PixelFormat::Yv12 => RawPixelFormat::Yv12,
            PixelFormat::Rgb565 => RawPixelFormat::Rgb565,
            PixelFormat::Rgb888 => RawPixelFormat::Rgb888,
            PixelFormat::Rgba8888 => RawPixelFormat::Rgba8888,
            PixelFormat::Argb8888 => RawPixelFormat::Argb8888,
            PixelFormat::Jpeg => RawPixelFormat::Encoded,
        }
    }
}

/// Rotation applied to the display or the encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Rotation::None,
            1 => Rotation::Rotate90,
            2 => Rotation::Rotate180,
            3 => Rotation::Rotate270,
            _ => return None,
        })
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 1,
            Rotation::Rotate180 => 2,
            Rotation::Rotate270 => 3,
        }
    }
}

/// Mirroring applied to the display or the encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flip {
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    pub(crate) fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Flip::None,
            1 => Flip::Horizontal,
            2 => Flip::Vertical,
            3 => Flip::Both,
            _ => return None,
        })
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            Flip::None => 0,
            Flip::Horizontal => 1,
            Flip::Vertical => 2,
            Flip::Both => 3,
        }
    }
}

/// Plane layout of one preview frame. Borrowed slices are only valid for
/// the duration of the preview callback; no ownership is transferred.
#[derive(Debug)]
pub enum Planes<'a> {
    Single { yuv: &'a [u8] },
    Double { y: &'a [u8], uv: &'a [u8] },
    Triple { y: &'a [u8], u: &'a [u8], v: &'a [u8] },
}

impl Planes<'_> {
    pub fn count(&self) -> usize {
        match self {
            Planes::Single { .. } => 1,
            Planes::Double { .. } => 2,
            Planes::Triple { .. } => 3,
        }
    }
}

/// Flat preview frame handed to the preview callback.
#[derive(Debug)]
pub struct PreviewFrame<'a> {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: u64,
    pub planes: Planes<'a>,
}

/// Captured still image (or its thumbnail/postview companion) handed to
/// the capturing callback. Borrowed for the duration of the callback.
#[derive(Debug)]
pub struct ImageData<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub exif: Option<&'a [u8]>,
}

/// One face from the most recent detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedFace {
    pub id: i32,
    pub score: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_alias_normalizes_to_uyvy() {
        assert_eq!(
            PixelFormat::from_raw(RawPixelFormat::ItlvJpegUyvy),
            PixelFormat::Uyvy
        );
        assert_eq!(
            PixelFormat::from_raw(RawPixelFormat::Uyvy),
            PixelFormat::Uyvy
        );
    }

    #[test]
    fn public_raw_round_trip() {
        for format in [
            PixelFormat::Nv12,
            PixelFormat::Nv21,
            PixelFormat::Yuyv,
            PixelFormat::Uyvy,
            PixelFormat::I420,
            PixelFormat::Jpeg,
        ] {
            assert_eq!(PixelFormat::from_raw(format.to_raw()), format);
        }
    }

    #[test]
    fn plane_counts() {
        let data = [0u8; 16];
        assert_eq!(Planes::Single { yuv: &data }.count(), 1);
        assert_eq!(Planes::Double { y: &data, uv: &data }.count(), 2);
        assert_eq!(
            Planes::Triple {
                y: &data,
                u: &data,
                v: &data
            }
            .count(),
            3
        );
    }
}
