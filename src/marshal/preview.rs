use crate::frame::{PixelFormat, Planes, PreviewFrame};
use crate::framework::types::{StreamData, StreamFrame};

/// Build the flat preview description from a raw stream descriptor.
///
/// The plane layout mirrors the framework's stream-data family; the
/// interleaved-capture format alias is reported as plain UYVY.
pub(crate) fn build_preview_frame(frame: &StreamFrame) -> PreviewFrame<'_> {
    let planes = match &frame.data {
        StreamData::Packed { yuv } => Planes::Single { yuv },
        StreamData::SemiPlanar { y, uv } => Planes::Double { y, uv },
        StreamData::Planar { y, u, v } => Planes::Triple { y, u, v },
    };

    PreviewFrame {
        format: PixelFormat::from_raw(frame.format),
        width: frame.width,
        height: frame.height,
        timestamp_ms: frame.timestamp_ms,
        planes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::types::{RawPixelFormat, MAX_STREAM_PLANES};

    fn frame(format: RawPixelFormat, data: StreamData) -> StreamFrame {
        StreamFrame {
            format,
            width: 640,
            height: 480,
            timestamp_ms: 33,
            data,
            buffers: vec![1],
            strides: [640; MAX_STREAM_PLANES],
            elevations: [480; MAX_STREAM_PLANES],
            internal_buffer: Some(7),
        }
    }

    #[test]
    fn packed_frame_has_one_plane() {
        let frame = frame(
            RawPixelFormat::Yuyv,
            StreamData::Packed {
                yuv: vec![0; 640 * 480 * 2],
            },
        );
        let flat = build_preview_frame(&frame);
        assert_eq!(flat.planes.count(), 1);
        assert_eq!(flat.format, PixelFormat::Yuyv);
    }

    #[test]
    fn semi_planar_frame_has_two_planes() {
        let frame = frame(
            RawPixelFormat::Nv12,
            StreamData::SemiPlanar {
                y: vec![0; 640 * 480],
                uv: vec![0; 640 * 480 / 2],
            },
        );
        let flat = build_preview_frame(&frame);
        assert_eq!(flat.planes.count(), 2);
    }

    #[test]
    fn planar_frame_has_three_planes() {
        let frame = frame(
            RawPixelFormat::I420,
            StreamData::Planar {
                y: vec![0; 640 * 480],
                u: vec![0; 640 * 480 / 4],
                v: vec![0; 640 * 480 / 4],
            },
        );
        let flat = build_preview_frame(&frame);
        assert_eq!(flat.planes.count(), 3);
    }

    #[test]
    fn interleaved_alias_surfaces_as_uyvy() {
        let frame = frame(
            RawPixelFormat::ItlvJpegUyvy,
            StreamData::Packed {
                yuv: vec![0; 640 * 480 * 2],
            },
        );
        let flat = build_preview_frame(&frame);
        assert_eq!(flat.format, PixelFormat::Uyvy);
    }
}
