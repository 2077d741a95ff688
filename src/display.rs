//! Display-surface binding and display attributes.
//!
//! The surface itself belongs to the windowing collaborator; the session
//! stores the descriptor and forwards the opaque handle. The `x11`-named
//! functions are a legacy alias set kept for callers of the old surface
//! API.

use crate::error::{CameraError, Result};
use crate::frame::{Flip, Rotation};
use crate::framework::types::{AttrKey, AttrValue};
use crate::session::{Camera, CameraState};
use std::sync::Arc;

/// Framework display-surface attribute values.
pub(crate) const SURFACE_OVERLAY: i32 = 0;
pub(crate) const SURFACE_EVAS: i32 = 1;
pub(crate) const SURFACE_NULL: i32 = 3;

/// Kind of display surface the preview is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayType {
    /// No rendering; frames are only delivered through callbacks.
    None,
    /// A window-system overlay surface.
    Overlay,
    /// A scene-graph image object.
    Evas,
}

/// Opaque display handle owned by the windowing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayHandle(pub u64);

/// How the preview is fitted into the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    LetterBox,
    OriginSize,
    Full,
    CroppedFull,
}

impl DisplayMode {
    fn code(self) -> i32 {
        self as i32
    }

    fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => DisplayMode::LetterBox,
            1 => DisplayMode::OriginSize,
            2 => DisplayMode::Full,
            3 => DisplayMode::CroppedFull,
            _ => return None,
        })
    }
}

impl Camera {
    pub fn set_display_rotation(&self, rotation: Rotation) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::DisplayRotation, AttrValue::Int(rotation.code()))])
    }

    pub fn display_rotation(&self) -> Result<Rotation> {
        let code = self.shared.get_int(AttrKey::DisplayRotation)?;
        Rotation::from_code(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn set_display_flip(&self, flip: Flip) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::DisplayFlip, AttrValue::Int(flip.code()))])
    }

    pub fn display_flip(&self) -> Result<Flip> {
        let code = self.shared.get_int(AttrKey::DisplayFlip)?;
        Flip::from_code(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn set_display_visible(&self, visible: bool) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::DisplayVisible, AttrValue::Bool(visible))])
    }

    pub fn is_display_visible(&self) -> Result<bool> {
        self.shared.get_bool(AttrKey::DisplayVisible)
    }

    pub fn set_display_mode(&self, mode: DisplayMode) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::DisplayGeometryMethod, AttrValue::Int(mode.code()))])
    }

    pub fn display_mode(&self) -> Result<DisplayMode> {
        let code = self.shared.get_int(AttrKey::DisplayGeometryMethod)?;
        DisplayMode::from_code(code).ok_or(CameraError::InvalidOperation)
    }

    /// Register a render-error callback for the bound surface. Only
    /// allowed before the preview pipeline is built.
    pub fn set_render_error_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        if self.state()? > CameraState::Created {
            return Err(CameraError::InvalidState);
        }

        let callback: crate::session::RenderErrorCb = Arc::new(callback);
        self.shared.state.lock().callbacks.render_error = Some(callback.clone());

        let weak = Arc::downgrade(&self.shared);
        self.shared
            .backend
            .set_render_error_handler(Some(Arc::new(move |pixmap_id| {
                let cb = weak
                    .upgrade()
                    .and_then(|shared| shared.state.lock().callbacks.render_error.clone());
                if let Some(cb) = cb {
                    cb(pixmap_id);
                }
            })));
        Ok(())
    }

    pub fn unset_render_error_cb(&self) -> Result<()> {
        if self.state()? > CameraState::Created {
            return Err(CameraError::InvalidState);
        }

        self.shared.backend.set_render_error_handler(None);
        self.shared.state.lock().callbacks.render_error = None;
        Ok(())
    }

    // --- legacy alias set ------------------------------------------------

    #[deprecated(note = "use set_display_rotation")]
    pub fn set_x11_display_rotation(&self, rotation: Rotation) -> Result<()> {
        self.set_display_rotation(rotation)
    }

    #[deprecated(note = "use display_rotation")]
    pub fn x11_display_rotation(&self) -> Result<Rotation> {
        self.display_rotation()
    }

    #[deprecated(note = "use set_display_flip")]
    pub fn set_x11_display_flip(&self, flip: Flip) -> Result<()> {
        self.set_display_flip(flip)
    }

    #[deprecated(note = "use display_flip")]
    pub fn x11_display_flip(&self) -> Result<Flip> {
        self.display_flip()
    }

    #[deprecated(note = "use set_display_visible")]
    pub fn set_x11_display_visible(&self, visible: bool) -> Result<()> {
        self.set_display_visible(visible)
    }

    #[deprecated(note = "use is_display_visible")]
    pub fn is_x11_display_visible(&self) -> Result<bool> {
        self.is_display_visible()
    }

    #[deprecated(note = "use set_display_mode")]
    pub fn set_x11_display_mode(&self, mode: DisplayMode) -> Result<()> {
        self.set_display_mode(mode)
    }

    #[deprecated(note = "use display_mode")]
    pub fn x11_display_mode(&self) -> Result<DisplayMode> {
        self.display_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FacadeConfig;
    use crate::framework::mock::{MockBackend, MockProvider};
    use crate::framework::types::CameraDevice;

    fn open_camera() -> (Camera, std::sync::Arc<MockBackend>) {
        let backend = MockBackend::new();
        let provider = MockProvider::new(backend.clone());
        let camera = Camera::open(&provider, CameraDevice::Rear, FacadeConfig::default()).unwrap();
        (camera, backend)
    }

    #[test]
    fn overlay_binding_requires_a_handle() {
        let (camera, _backend) = open_camera();
        assert_eq!(
            camera.set_display(DisplayType::Overlay, None).unwrap_err(),
            CameraError::InvalidParameter
        );
    }

    #[test]
    fn overlay_binding_forwards_surface_and_handle() {
        let (camera, backend) = open_camera();

        camera
            .set_display(DisplayType::Overlay, Some(DisplayHandle(0x5a5a)))
            .unwrap();
        assert_eq!(backend.attr_int(AttrKey::DisplaySurface), Some(SURFACE_OVERLAY));
        assert_eq!(
            camera.display_binding(),
            (DisplayType::Overlay, Some(DisplayHandle(0x5a5a)))
        );

        camera.set_display(DisplayType::None, None).unwrap();
        assert_eq!(backend.attr_int(AttrKey::DisplaySurface), Some(SURFACE_NULL));
        assert_eq!(camera.display_binding(), (DisplayType::None, None));
    }

    #[test]
    fn display_attributes_round_trip() {
        let (camera, _backend) = open_camera();

        camera.set_display_rotation(Rotation::Rotate180).unwrap();
        assert_eq!(camera.display_rotation().unwrap(), Rotation::Rotate180);

        camera.set_display_flip(Flip::Horizontal).unwrap();
        assert_eq!(camera.display_flip().unwrap(), Flip::Horizontal);

        camera.set_display_visible(true).unwrap();
        assert!(camera.is_display_visible().unwrap());

        camera.set_display_mode(DisplayMode::CroppedFull).unwrap();
        assert_eq!(camera.display_mode().unwrap(), DisplayMode::CroppedFull);
    }

    #[test]
    fn render_error_cb_is_rejected_after_preview_starts() {
        let (camera, backend) = open_camera();

        camera.set_render_error_cb(|_pixmap| {}).unwrap();
        camera.unset_render_error_cb().unwrap();

        camera.start_preview().unwrap();
        backend.emit_state_changed(
            crate::framework::types::FrameworkState::Ready,
            crate::framework::types::FrameworkState::Prepare,
        );
        assert_eq!(
            camera.set_render_error_cb(|_pixmap| {}).unwrap_err(),
            CameraError::InvalidState
        );
    }

    #[test]
    fn render_errors_reach_the_registered_callback() {
        let (camera, backend) = open_camera();

        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        camera
            .set_render_error_cb(move |pixmap| {
                sink.lock().push(pixmap);
            })
            .unwrap();

        backend.emit_render_error(42);
        assert_eq!(*seen.lock(), vec![42]);
    }
}
