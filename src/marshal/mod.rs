//! Preview-frame marshalling.
//!
//! Entered synchronously from the framework's frame-delivery path. Each
//! registered preview path gets the frame at most once, in arrival order;
//! the flat path borrows the plane data for the duration of the callback,
//! the packet path wraps the native buffers without copying.

mod packet;
mod preview;

pub use packet::{MediaPacket, PacketFormat, PacketMimetype, PlaneInfo, SurfaceFormat};

use crate::framework::types::StreamFrame;
use crate::session::SessionShared;
use std::sync::Arc;

pub(crate) fn dispatch_stream_frame(shared: &Arc<SessionShared>, frame: StreamFrame) {
    let (preview_cb, packet_cb) = {
        let state = shared.state.lock();
        (
            state.callbacks.preview.clone(),
            state.callbacks.packet_preview.clone(),
        )
    };

    if let Some(cb) = preview_cb {
        let flat = preview::build_preview_frame(&frame);
        cb(&flat);
    }

    if let Some(cb) = packet_cb {
        // A frame that cannot be wrapped is dropped, not surfaced as an
        // error; preview delivery is best-effort and continuous.
        if let Some(packet) = packet::build_packet(shared, &frame) {
            cb(packet);
        }
    }
}
