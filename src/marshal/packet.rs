//! Zero-copy packet construction.
//!
//! Wraps a raw frame's native buffer objects into a [`MediaPacket`]
//! without copying pixel data. The packet owns the framework's internal
//! buffer through a run-once finalizer; releasing it is the packet's job
//! alone, never the marshaller's.

use crate::framework::backend::CameraBackend;
use crate::framework::types::{RawPixelFormat, StreamFrame};
use crate::session::SessionShared;
use std::sync::Arc;
use tracing::{debug, warn};

/// Native buffer-object format tag derived from the raw pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    Nv12,
    Nv16,
    Nv21,
    Yuyv,
    Uyvy,
    Yuv422,
    Yuv420,
    Yvu420,
    Rgb565,
    Rgb888,
    Rgba8888,
    Argb8888,
}

/// Packet mimetype derived from the raw pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketMimetype {
    Nv12,
    Nv16,
    Nv21,
    Yuyv,
    Uyvy,
    Yuv422P,
    I420,
    Yv12,
    Rgb565,
    Rgb888,
    Rgba,
    Argb,
}

/// Deterministic format tag table; `None` aborts packet construction for
/// the frame (one dropped frame, not fatal).
pub(crate) fn surface_format(format: RawPixelFormat) -> Option<SurfaceFormat> {
    Some(match format {
        RawPixelFormat::Nv12 | RawPixelFormat::Nv12Tiled => SurfaceFormat::Nv12,
        RawPixelFormat::Nv16 => SurfaceFormat::Nv16,
        RawPixelFormat::Nv21 => SurfaceFormat::Nv21,
        RawPixelFormat::Yuyv => SurfaceFormat::Yuyv,
        RawPixelFormat::Uyvy | RawPixelFormat::ItlvJpegUyvy => SurfaceFormat::Uyvy,
        RawPixelFormat::Yuv422Planar => SurfaceFormat::Yuv422,
        RawPixelFormat::I420 => SurfaceFormat::Yuv420,
        RawPixelFormat::Yv12 => SurfaceFormat::Yvu420,
        RawPixelFormat::Rgb565 => SurfaceFormat::Rgb565,
        RawPixelFormat::Rgb888 => SurfaceFormat::Rgb888,
        RawPixelFormat::Rgba8888 => SurfaceFormat::Rgba8888,
        RawPixelFormat::Argb8888 => SurfaceFormat::Argb8888,
        RawPixelFormat::Encoded => return None,
    })
}

pub(crate) fn packet_mimetype(format: RawPixelFormat) -> Option<PacketMimetype> {
    Some(match format {
        RawPixelFormat::Nv12 | RawPixelFormat::Nv12Tiled => PacketMimetype::Nv12,
        RawPixelFormat::Nv16 => PacketMimetype::Nv16,
        RawPixelFormat::Nv21 => PacketMimetype::Nv21,
        RawPixelFormat::Yuyv => PacketMimetype::Yuyv,
        RawPixelFormat::Uyvy | RawPixelFormat::ItlvJpegUyvy => PacketMimetype::Uyvy,
        RawPixelFormat::Yuv422Planar => PacketMimetype::Yuv422P,
        RawPixelFormat::I420 => PacketMimetype::I420,
        RawPixelFormat::Yv12 => PacketMimetype::Yv12,
        RawPixelFormat::Rgb565 => PacketMimetype::Rgb565,
        RawPixelFormat::Rgb888 => PacketMimetype::Rgb888,
        RawPixelFormat::Rgba8888 => PacketMimetype::Rgba,
        RawPixelFormat::Argb8888 => PacketMimetype::Argb,
        RawPixelFormat::Encoded => return None,
    })
}

/// Output-format description cached per session; rebuilt lazily when the
/// incoming frame's mimetype or dimensions change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketFormat {
    pub mimetype: PacketMimetype,
    pub width: u32,
    pub height: u32,
}

/// Per-plane geometry of a wrapped frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneInfo {
    pub stride: u32,
    pub offset: u32,
    pub size: u32,
}

/// A preview frame wrapped around the framework's native buffers without
/// copying.
///
/// Dropping the packet (or calling [`MediaPacket::destroy`]) runs the
/// attached finalizer exactly once, releasing the framework's internal
/// buffer.
pub struct MediaPacket {
    format: PacketFormat,
    surface_format: SurfaceFormat,
    planes: Vec<PlaneInfo>,
    total_size: u32,
    buffers: Vec<u64>,
    pts_ns: u64,
    finalizer: Option<Box<dyn FnOnce() + Send>>,
}

impl MediaPacket {
    pub fn format(&self) -> PacketFormat {
        self.format
    }

    pub fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    pub fn planes(&self) -> &[PlaneInfo] {
        &self.planes
    }

    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    pub fn buffers(&self) -> &[u64] {
        &self.buffers
    }

    pub fn pts_ns(&self) -> u64 {
        self.pts_ns
    }

    /// Release the packet and its native buffer now.
    pub fn destroy(mut self) {
        self.run_finalizer();
    }

    fn run_finalizer(&mut self) {
        if let Some(finalizer) = self.finalizer.take() {
            finalizer();
        }
    }
}

impl Drop for MediaPacket {
    fn drop(&mut self) {
        self.run_finalizer();
    }
}

impl std::fmt::Debug for MediaPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPacket")
            .field("format", &self.format)
            .field("planes", &self.planes)
            .field("total_size", &self.total_size)
            .field("pts_ns", &self.pts_ns)
            .finish()
    }
}

/// Compute per-plane stride/offset/size for the wrapped surface.
///
/// Semi-planar: luma plane plus interleaved chroma, contiguous offsets
/// when a single backing buffer holds both. Fully-planar: three contiguous
/// planes. Packed: one plane with doubled byte width.
fn plane_layout(
    surface: SurfaceFormat,
    frame: &StreamFrame,
    buffer_count: usize,
) -> (Vec<PlaneInfo>, u32) {
    let stride = |i: usize| frame.strides[i];
    let lines = |i: usize| frame.elevations[i];

    match surface {
        SurfaceFormat::Nv12 | SurfaceFormat::Nv21 | SurfaceFormat::Nv16 => {
            let luma = stride(0) * lines(0);
            let chroma = stride(1) * lines(1);
            let chroma_offset = if buffer_count == 1 { luma } else { 0 };
            (
                vec![
                    PlaneInfo {
                        stride: stride(0),
                        offset: 0,
                        size: luma,
                    },
                    PlaneInfo {
                        stride: stride(1),
                        offset: chroma_offset,
                        size: chroma,
                    },
                ],
                luma + chroma,
            )
        }
        SurfaceFormat::Yuv420 | SurfaceFormat::Yvu420 | SurfaceFormat::Yuv422 => {
            let sizes = [
                stride(0) * lines(0),
                stride(1) * lines(1),
                stride(2) * lines(2),
            ];
            let contiguous = buffer_count == 1;
            let offsets = if contiguous {
                [0, sizes[0], sizes[0] + sizes[1]]
            } else {
                [0, 0, 0]
            };
            (
                (0..3)
                    .map(|i| PlaneInfo {
                        stride: stride(i),
                        offset: offsets[i],
                        size: sizes[i],
                    })
                    .collect(),
                sizes.iter().sum(),
            )
        }
        SurfaceFormat::Uyvy | SurfaceFormat::Yuyv => {
            let size = (stride(0) * lines(0)) << 1;
            (
                vec![PlaneInfo {
                    stride: stride(0),
                    offset: 0,
                    size,
                }],
                size,
            )
        }
        _ => {
            let size = stride(0) * lines(0);
            (
                vec![PlaneInfo {
                    stride: stride(0),
                    offset: 0,
                    size,
                }],
                size,
            )
        }
    }
}

/// Wrap a raw frame into a zero-copy packet.
///
/// Returns `None` — dropping the frame — when the format has no table
/// entry, when no backing buffers exist, or when the internal buffer is
/// missing; partial resources are released before returning.
pub(crate) fn build_packet(shared: &Arc<SessionShared>, frame: &StreamFrame) -> Option<MediaPacket> {
    let surface = match surface_format(frame.format) {
        Some(surface) => surface,
        None => {
            warn!("no surface format for {:?}, dropping frame", frame.format);
            return None;
        }
    };
    let mimetype = match packet_mimetype(frame.format) {
        Some(mimetype) => mimetype,
        None => {
            warn!("no packet mimetype for {:?}, dropping frame", frame.format);
            return None;
        }
    };

    let buffer_count = frame.buffers.len();
    if buffer_count == 0 {
        warn!(
            "no backing buffers for {}x{} frame, dropping",
            frame.width, frame.height
        );
        return None;
    }

    let internal_buffer = match frame.internal_buffer {
        Some(buffer) => buffer,
        None => {
            warn!("frame carries no internal buffer, dropping");
            return None;
        }
    };

    let format = PacketFormat {
        mimetype,
        width: frame.width,
        height: frame.height,
    };

    // Rebuild the cached output-format description only when the frame
    // stops matching it; format changes are rare.
    {
        let mut state = shared.state.lock();
        match state.packet_format {
            Some(cached) if cached == format => {}
            Some(cached) => {
                warn!("packet format changed: {cached:?} -> {format:?}");
                state.packet_format = Some(format);
            }
            None => {
                debug!("creating packet format {format:?}");
                state.packet_format = Some(format);
            }
        }
    }

    let (planes, total_size) = plane_layout(surface, frame, buffer_count);

    let backend: Arc<dyn CameraBackend> = shared.backend.clone();
    let finalizer = Box::new(move || backend.release_stream_buffer(internal_buffer));

    Some(MediaPacket {
        format,
        surface_format: surface,
        planes,
        total_size,
        buffers: frame.buffers.clone(),
        pts_ns: frame.timestamp_ms * 1_000_000,
        finalizer: Some(finalizer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::types::{StreamData, MAX_STREAM_PLANES};

    fn nv12_frame(buffers: Vec<u64>) -> StreamFrame {
        let mut strides = [0u32; MAX_STREAM_PLANES];
        let mut elevations = [0u32; MAX_STREAM_PLANES];
        strides[0] = 640;
        strides[1] = 640;
        elevations[0] = 480;
        elevations[1] = 240;
        StreamFrame {
            format: RawPixelFormat::Nv12,
            width: 640,
            height: 480,
            timestamp_ms: 40,
            data: StreamData::SemiPlanar {
                y: vec![0; 640 * 480],
                uv: vec![0; 640 * 240],
            },
            buffers,
            strides,
            elevations,
            internal_buffer: Some(99),
        }
    }

    #[test]
    fn every_mappable_format_has_both_tags() {
        let formats = [
            RawPixelFormat::Nv12,
            RawPixelFormat::Nv12Tiled,
            RawPixelFormat::Nv16,
            RawPixelFormat::Nv21,
            RawPixelFormat::Yuyv,
            RawPixelFormat::Uyvy,
            RawPixelFormat::ItlvJpegUyvy,
            RawPixelFormat::Yuv422Planar,
            RawPixelFormat::I420,
            RawPixelFormat::Yv12,
            RawPixelFormat::Rgb565,
            RawPixelFormat::Rgb888,
            RawPixelFormat::Rgba8888,
            RawPixelFormat::Argb8888,
        ];
        for format in formats {
            assert!(surface_format(format).is_some(), "{format:?}");
            assert!(packet_mimetype(format).is_some(), "{format:?}");
        }
        assert!(surface_format(RawPixelFormat::Encoded).is_none());
        assert!(packet_mimetype(RawPixelFormat::Encoded).is_none());
    }

    #[test]
    fn semi_planar_single_buffer_offsets_are_contiguous() {
        let frame = nv12_frame(vec![1]);
        let (planes, total) = plane_layout(SurfaceFormat::Nv12, &frame, 1);
        assert_eq!(planes.len(), 2);
        assert_eq!(planes[0].offset, 0);
        assert_eq!(planes[0].size, 640 * 480);
        assert_eq!(planes[1].offset, 640 * 480);
        assert_eq!(total, 640 * 480 + 640 * 240);
    }

    #[test]
    fn semi_planar_dual_buffer_offsets_are_zero() {
        let frame = nv12_frame(vec![1, 2]);
        let (planes, _) = plane_layout(SurfaceFormat::Nv12, &frame, 2);
        assert_eq!(planes[1].offset, 0);
    }

    #[test]
    fn packed_plane_size_is_doubled() {
        let mut frame = nv12_frame(vec![1]);
        frame.format = RawPixelFormat::Yuyv;
        let (planes, total) = plane_layout(SurfaceFormat::Yuyv, &frame, 1);
        assert_eq!(planes.len(), 1);
        assert_eq!(total, (640 * 480) << 1);
    }

    #[test]
    fn planar_three_plane_layout_is_contiguous() {
        let mut frame = nv12_frame(vec![1]);
        frame.strides[2] = 320;
        frame.elevations[2] = 240;
        let (planes, _) = plane_layout(SurfaceFormat::Yuv420, &frame, 1);
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[1].offset, planes[0].size);
        assert_eq!(planes[2].offset, planes[0].size + planes[1].size);
    }
}
