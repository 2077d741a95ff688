//! Scalar and enumerated camera properties.
//!
//! Every operation here follows one pattern: validate, forward to the
//! framework attribute protocol, translate the result. Range queries
//! surface the framework's declared valid set; `foreach_supported_*`
//! enumerates it in declared order through per-property mapping tables,
//! skipping values with no public counterpart, and stops early when the
//! visitor returns `false`.

use super::types::{
    AfMode, Effect, ExposureMode, FlashMode, Fps, HdrMode, Iso, SceneMode, TheaterMode,
    Whitebalance,
};
use crate::error::{translate, CameraError, Result};
use crate::frame::{Flip, Rotation};
use crate::framework::types::{AttrInfo, AttrKey, AttrValue};
use crate::session::Camera;
use tracing::error;

impl Camera {
    fn set_int_attr(&self, key: AttrKey, value: i32) -> Result<()> {
        self.shared.set_attrs(&[(key, AttrValue::Int(value))])
    }

    fn foreach_mapped<T>(
        &self,
        key: AttrKey,
        map: impl Fn(i32) -> Option<T>,
        mut f: impl FnMut(T) -> bool,
    ) -> Result<()> {
        for code in self.shared.int_array(key)? {
            if let Some(value) = map(code) {
                if !f(value) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Whether the framework's declared valid set for `key` contains
    /// `value`; on/off capability is published as a value list.
    fn supports_value(&self, key: AttrKey, value: i32) -> Result<bool> {
        match self.shared.backend.attribute_info(key).map_err(translate)? {
            AttrInfo::IntArray(values) => Ok(values.contains(&value)),
            AttrInfo::IntRange { min, max } => Ok(min <= value && value <= max),
        }
    }

    // --- zoom -----------------------------------------------------------

    pub fn set_zoom(&self, zoom: i32) -> Result<()> {
        self.set_int_attr(AttrKey::DigitalZoom, zoom)
    }

    pub fn zoom(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::DigitalZoom)
    }

    pub fn zoom_range(&self) -> Result<(i32, i32)> {
        self.shared.int_range(AttrKey::DigitalZoom)
    }

    // --- exposure -------------------------------------------------------

    pub fn set_exposure_mode(&self, mode: ExposureMode) -> Result<()> {
        self.set_int_attr(AttrKey::ExposureMode, mode.to_fw())
    }

    pub fn exposure_mode(&self) -> Result<ExposureMode> {
        let code = self.shared.get_int(AttrKey::ExposureMode)?;
        ExposureMode::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_exposure_mode(
        &self,
        f: impl FnMut(ExposureMode) -> bool,
    ) -> Result<()> {
        self.foreach_mapped(AttrKey::ExposureMode, ExposureMode::from_fw, f)
    }

    pub fn set_exposure(&self, value: i32) -> Result<()> {
        self.set_int_attr(AttrKey::ExposureValue, value)
    }

    pub fn exposure(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::ExposureValue)
    }

    pub fn exposure_range(&self) -> Result<(i32, i32)> {
        self.shared.int_range(AttrKey::ExposureValue)
    }

    // --- iso ------------------------------------------------------------

    pub fn set_iso(&self, iso: Iso) -> Result<()> {
        self.set_int_attr(AttrKey::Iso, iso.to_fw())
    }

    pub fn iso(&self) -> Result<Iso> {
        let code = self.shared.get_int(AttrKey::Iso)?;
        Iso::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_iso(&self, f: impl FnMut(Iso) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::Iso, Iso::from_fw, f)
    }

    // --- brightness / contrast ------------------------------------------

    pub fn set_brightness(&self, level: i32) -> Result<()> {
        self.set_int_attr(AttrKey::Brightness, level)
    }

    pub fn brightness(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::Brightness)
    }

    pub fn brightness_range(&self) -> Result<(i32, i32)> {
        self.shared.int_range(AttrKey::Brightness)
    }

    pub fn set_contrast(&self, level: i32) -> Result<()> {
        self.set_int_attr(AttrKey::Contrast, level)
    }

    pub fn contrast(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::Contrast)
    }

    pub fn contrast_range(&self) -> Result<(i32, i32)> {
        self.shared.int_range(AttrKey::Contrast)
    }

    // --- white balance / effect / scene ---------------------------------

    pub fn set_whitebalance(&self, wb: Whitebalance) -> Result<()> {
        self.set_int_attr(AttrKey::Whitebalance, wb.to_fw())
    }

    pub fn whitebalance(&self) -> Result<Whitebalance> {
        let code = self.shared.get_int(AttrKey::Whitebalance)?;
        Whitebalance::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_whitebalance(
        &self,
        f: impl FnMut(Whitebalance) -> bool,
    ) -> Result<()> {
        self.foreach_mapped(AttrKey::Whitebalance, Whitebalance::from_fw, f)
    }

    pub fn set_effect(&self, effect: Effect) -> Result<()> {
        self.set_int_attr(AttrKey::ColorTone, effect.to_fw())
    }

    pub fn effect(&self) -> Result<Effect> {
        let code = self.shared.get_int(AttrKey::ColorTone)?;
        Effect::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_effect(&self, f: impl FnMut(Effect) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::ColorTone, Effect::from_fw, f)
    }

    pub fn set_scene_mode(&self, mode: SceneMode) -> Result<()> {
        self.set_int_attr(AttrKey::SceneMode, mode.to_fw())
    }

    pub fn scene_mode(&self) -> Result<SceneMode> {
        let code = self.shared.get_int(AttrKey::SceneMode)?;
        SceneMode::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_scene_mode(&self, f: impl FnMut(SceneMode) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::SceneMode, SceneMode::from_fw, f)
    }

    // --- flash ----------------------------------------------------------

    pub fn set_flash_mode(&self, mode: FlashMode) -> Result<()> {
        self.set_int_attr(AttrKey::FlashMode, mode.to_fw())
    }

    pub fn flash_mode(&self) -> Result<FlashMode> {
        let code = self.shared.get_int(AttrKey::FlashMode)?;
        FlashMode::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_flash_mode(&self, f: impl FnMut(FlashMode) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::FlashMode, FlashMode::from_fw, f)
    }

    // --- fps ------------------------------------------------------------

    pub fn set_preview_fps(&self, fps: Fps) -> Result<()> {
        match fps {
            Fps::Auto => self
                .shared
                .set_attrs(&[(AttrKey::PreviewFpsAuto, AttrValue::Bool(true))]),
            fixed => self.shared.set_attrs(&[
                (AttrKey::PreviewFpsAuto, AttrValue::Bool(false)),
                (AttrKey::PreviewFps, AttrValue::Int(fixed.to_fw())),
            ]),
        }
    }

    pub fn preview_fps(&self) -> Result<Fps> {
        if self.shared.get_bool(AttrKey::PreviewFpsAuto)? {
            return Ok(Fps::Auto);
        }
        let code = self.shared.get_int(AttrKey::PreviewFps)?;
        Fps::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_fps(&self, f: impl FnMut(Fps) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::PreviewFps, Fps::from_fw, f)
    }

    // --- image quality --------------------------------------------------

    pub fn set_image_quality(&self, quality: i32) -> Result<()> {
        self.set_int_attr(AttrKey::ImageEncoderQuality, quality)
    }

    pub fn image_quality(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::ImageEncoderQuality)
    }

    // --- stream rotation / flip -----------------------------------------

    pub fn set_stream_rotation(&self, rotation: Rotation) -> Result<()> {
        self.set_int_attr(AttrKey::StreamRotation, rotation.code())
    }

    pub fn stream_rotation(&self) -> Result<Rotation> {
        let code = self.shared.get_int(AttrKey::StreamRotation)?;
        Rotation::from_code(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_stream_rotation(
        &self,
        f: impl FnMut(Rotation) -> bool,
    ) -> Result<()> {
        self.foreach_mapped(AttrKey::StreamRotation, Rotation::from_code, f)
    }

    pub fn set_stream_flip(&self, flip: Flip) -> Result<()> {
        self.set_int_attr(AttrKey::StreamFlip, flip.code())
    }

    pub fn stream_flip(&self) -> Result<Flip> {
        let code = self.shared.get_int(AttrKey::StreamFlip)?;
        Flip::from_code(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_stream_flip(&self, f: impl FnMut(Flip) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::StreamFlip, Flip::from_code, f)
    }

    // --- hdr ------------------------------------------------------------

    pub fn is_supported_hdr_capture(&self) -> Result<bool> {
        self.supports_value(AttrKey::HdrCapture, HdrMode::Enable.to_fw())
    }

    /// Set the HDR capture mode. Keep-original mode makes a single logical
    /// shot deliver two frames, which the capture manager waits for.
    pub fn set_hdr_mode(&self, mode: HdrMode) -> Result<()> {
        if !self.is_supported_hdr_capture()? {
            return Err(CameraError::NotSupported);
        }

        self.set_int_attr(AttrKey::HdrCapture, mode.to_fw())?;
        self.shared.state.lock().hdr_keep_mode = mode == HdrMode::KeepOriginal;
        Ok(())
    }

    pub fn hdr_mode(&self) -> Result<HdrMode> {
        if !self.is_supported_hdr_capture()? {
            return Err(CameraError::NotSupported);
        }
        let code = self.shared.get_int(AttrKey::HdrCapture)?;
        HdrMode::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn set_hdr_capture_progress_cb<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        if !self.is_supported_hdr_capture()? {
            return Err(CameraError::NotSupported);
        }
        self.shared.state.lock().callbacks.hdr_progress = Some(std::sync::Arc::new(callback));
        Ok(())
    }

    pub fn unset_hdr_capture_progress_cb(&self) -> Result<()> {
        if !self.is_supported_hdr_capture()? {
            return Err(CameraError::NotSupported);
        }
        self.shared.state.lock().callbacks.hdr_progress = None;
        Ok(())
    }

    // --- anti-shake / stabilization / auto contrast ----------------------

    pub fn is_supported_anti_shake(&self) -> Result<bool> {
        self.supports_value(AttrKey::AntiHandshake, 1)
    }

    pub fn enable_anti_shake(&self, enable: bool) -> Result<()> {
        if !self.is_supported_anti_shake()? {
            return Err(CameraError::NotSupported);
        }
        self.set_int_attr(AttrKey::AntiHandshake, enable as i32)
    }

    pub fn is_enabled_anti_shake(&self) -> Result<bool> {
        if !self.is_supported_anti_shake()? {
            return Err(CameraError::NotSupported);
        }
        self.shared.get_bool(AttrKey::AntiHandshake)
    }

    pub fn is_supported_video_stabilization(&self) -> Result<bool> {
        self.supports_value(AttrKey::VideoStabilization, 1)
    }

    pub fn enable_video_stabilization(&self, enable: bool) -> Result<()> {
        if !self.is_supported_video_stabilization()? {
            return Err(CameraError::NotSupported);
        }
        self.set_int_attr(AttrKey::VideoStabilization, enable as i32)
    }

    pub fn is_enabled_video_stabilization(&self) -> Result<bool> {
        if !self.is_supported_video_stabilization()? {
            return Err(CameraError::NotSupported);
        }
        self.shared.get_bool(AttrKey::VideoStabilization)
    }

    pub fn is_supported_auto_contrast(&self) -> Result<bool> {
        self.supports_value(AttrKey::WideDynamicRange, 1)
    }

    pub fn enable_auto_contrast(&self, enable: bool) -> Result<()> {
        if !self.is_supported_auto_contrast()? {
            return Err(CameraError::NotSupported);
        }
        self.set_int_attr(AttrKey::WideDynamicRange, enable as i32)
    }

    pub fn is_enabled_auto_contrast(&self) -> Result<bool> {
        if !self.is_supported_auto_contrast()? {
            return Err(CameraError::NotSupported);
        }
        self.shared.get_bool(AttrKey::WideDynamicRange)
    }

    // --- tags / geotag ---------------------------------------------------

    pub fn enable_tag(&self, enable: bool) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::TagEnable, AttrValue::Bool(enable))])
    }

    pub fn is_enabled_tag(&self) -> Result<bool> {
        self.shared.get_bool(AttrKey::TagEnable)
    }

    pub fn set_tag_image_description(&self, description: &str) -> Result<()> {
        self.shared.set_attrs(&[(
            AttrKey::TagImageDescription,
            AttrValue::Str(description.to_string()),
        )])
    }

    pub fn tag_image_description(&self) -> Result<String> {
        match self
            .shared
            .backend
            .get_attribute(AttrKey::TagImageDescription)
            .map_err(translate)?
        {
            AttrValue::Str(description) => Ok(description),
            _ => Err(CameraError::InvalidOperation),
        }
    }

    /// EXIF orientation tag, 1 through 8.
    pub fn set_tag_orientation(&self, orientation: i32) -> Result<()> {
        if !(1..=8).contains(&orientation) {
            error!("invalid tag orientation {orientation}");
            return Err(CameraError::InvalidParameter);
        }
        self.set_int_attr(AttrKey::TagOrientation, orientation)
    }

    pub fn tag_orientation(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::TagOrientation)
    }

    pub fn set_tag_software(&self, software: &str) -> Result<()> {
        self.shared.set_attrs(&[(
            AttrKey::TagSoftware,
            AttrValue::Str(software.to_string()),
        )])
    }

    pub fn tag_software(&self) -> Result<String> {
        match self
            .shared
            .backend
            .get_attribute(AttrKey::TagSoftware)
            .map_err(translate)?
        {
            AttrValue::Str(software) => Ok(software),
            _ => Err(CameraError::InvalidOperation),
        }
    }

    pub fn set_geotag(&self, latitude: f64, longitude: f64, altitude: f64) -> Result<()> {
        self.shared.set_attrs(&[
            (AttrKey::GpsEnable, AttrValue::Bool(true)),
            (AttrKey::GpsLatitude, AttrValue::Double(latitude)),
            (AttrKey::GpsLongitude, AttrValue::Double(longitude)),
            (AttrKey::GpsAltitude, AttrValue::Double(altitude)),
        ])
    }

    pub fn geotag(&self) -> Result<(f64, f64, f64)> {
        let get = |key| -> Result<f64> {
            match self.shared.backend.get_attribute(key).map_err(translate)? {
                AttrValue::Double(value) => Ok(value),
                _ => Err(CameraError::InvalidOperation),
            }
        };
        Ok((
            get(AttrKey::GpsLatitude)?,
            get(AttrKey::GpsLongitude)?,
            get(AttrKey::GpsAltitude)?,
        ))
    }

    pub fn remove_geotag(&self) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::GpsEnable, AttrValue::Bool(false))])
    }

    // --- theater mode ----------------------------------------------------

    pub fn set_theater_mode(&self, mode: TheaterMode) -> Result<()> {
        self.set_int_attr(AttrKey::DisplayMode, mode.to_fw())
    }

    pub fn theater_mode(&self) -> Result<TheaterMode> {
        let code = self.shared.get_int(AttrKey::DisplayMode)?;
        TheaterMode::from_fw(code).ok_or(CameraError::InvalidOperation)
    }

    pub fn foreach_supported_theater_mode(
        &self,
        f: impl FnMut(TheaterMode) -> bool,
    ) -> Result<()> {
        self.foreach_mapped(AttrKey::DisplayMode, TheaterMode::from_fw, f)
    }

    // --- pan / tilt -------------------------------------------------------

    pub fn set_pan(&self, pan: i32) -> Result<()> {
        self.set_int_attr(AttrKey::Pan, pan)
    }

    pub fn pan(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::Pan)
    }

    pub fn pan_range(&self) -> Result<(i32, i32)> {
        self.shared.int_range(AttrKey::Pan)
    }

    pub fn set_tilt(&self, tilt: i32) -> Result<()> {
        self.set_int_attr(AttrKey::Tilt, tilt)
    }

    pub fn tilt(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::Tilt)
    }

    pub fn tilt_range(&self) -> Result<(i32, i32)> {
        self.shared.int_range(AttrKey::Tilt)
    }

    // --- encoded preview --------------------------------------------------

    pub fn set_encoded_preview_bitrate(&self, bitrate: i32) -> Result<()> {
        self.set_int_attr(AttrKey::EncodedPreviewBitrate, bitrate)
    }

    pub fn encoded_preview_bitrate(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::EncodedPreviewBitrate)
    }

    pub fn set_encoded_preview_iframe_interval(&self, interval: i32) -> Result<()> {
        self.set_int_attr(AttrKey::EncodedPreviewIFrameInterval, interval)
    }

    pub fn encoded_preview_iframe_interval(&self) -> Result<i32> {
        self.shared.get_int(AttrKey::EncodedPreviewIFrameInterval)
    }

    // --- misc -------------------------------------------------------------

    /// Disabling the shutter sound is a policy decision some devices
    /// refuse; the refusal surfaces as `InvalidOperation`.
    pub fn disable_shutter_sound(&self, disable: bool) -> Result<()> {
        self.shared
            .set_attrs(&[(AttrKey::CaptureSoundEnable, AttrValue::Bool(!disable))])
            .map_err(|code| {
                error!("disabling shutter sound not permitted: {code:?}");
                CameraError::InvalidOperation
            })
    }

    /// Physical mounting angle of the lens, in degrees.
    pub fn lens_orientation(&self) -> Result<i32> {
        let rotation = self.shared.get_int(AttrKey::RecommendDisplayRotation)?;
        Ok(match rotation {
            1 => 270,
            2 => 180,
            3 => 90,
            _ => 0,
        })
    }

    pub fn foreach_supported_af_mode(&self, f: impl FnMut(AfMode) -> bool) -> Result<()> {
        self.foreach_mapped(AttrKey::AfScanRange, AfMode::from_scan_range, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FacadeConfig;
    use crate::framework::mock::{MockBackend, MockProvider};
    use crate::framework::types::{CameraDevice, FrameworkError};

    fn open_camera() -> (Camera, std::sync::Arc<MockBackend>) {
        let backend = MockBackend::new();
        let provider = MockProvider::new(backend.clone());
        let camera = Camera::open(&provider, CameraDevice::Rear, FacadeConfig::default()).unwrap();
        (camera, backend)
    }

    #[test]
    fn range_queries_surface_the_declared_range() {
        let (camera, _backend) = open_camera();
        assert_eq!(camera.zoom_range().unwrap(), (10, 40));
        assert_eq!(camera.exposure_range().unwrap(), (-12, 12));
        assert_eq!(camera.pan_range().unwrap(), (-90, 90));
        assert_eq!(camera.tilt_range().unwrap(), (-45, 45));
    }

    #[test]
    fn scalar_set_and_get_round_trip() {
        let (camera, backend) = open_camera();

        camera.set_zoom(25).unwrap();
        assert_eq!(camera.zoom().unwrap(), 25);
        assert_eq!(backend.attr_int(AttrKey::DigitalZoom), Some(25));

        camera.set_brightness(7).unwrap();
        assert_eq!(camera.brightness().unwrap(), 7);
    }

    #[test]
    fn exposure_mode_enumeration_skips_refinement_holes() {
        let (camera, backend) = open_camera();
        backend.declare_attr_info(AttrKey::ExposureMode, AttrInfo::IntArray(vec![0, 3, 5]));

        let mut modes = Vec::new();
        camera
            .foreach_supported_exposure_mode(|mode| {
                modes.push(mode);
                true
            })
            .unwrap();

        assert_eq!(modes, vec![ExposureMode::Off, ExposureMode::Spot]);
    }

    #[test]
    fn hdr_mode_round_trip_requires_support() {
        let (camera, backend) = open_camera();

        camera.set_hdr_mode(HdrMode::KeepOriginal).unwrap();
        assert_eq!(camera.hdr_mode().unwrap(), HdrMode::KeepOriginal);

        backend.declare_attr_info(AttrKey::HdrCapture, AttrInfo::IntArray(vec![0]));
        assert_eq!(
            camera.set_hdr_mode(HdrMode::Enable).unwrap_err(),
            CameraError::NotSupported
        );
    }

    #[test]
    fn geotag_round_trip_and_removal() {
        let (camera, backend) = open_camera();

        camera.set_geotag(37.24, 131.86, 12.5).unwrap();
        assert_eq!(camera.geotag().unwrap(), (37.24, 131.86, 12.5));

        camera.remove_geotag().unwrap();
        assert_eq!(backend.attr_int(AttrKey::GpsEnable), Some(0));
    }

    #[test]
    fn shutter_sound_refusal_maps_to_invalid_operation() {
        let (camera, backend) = open_camera();

        backend.fail_next_set_attributes(FrameworkError::InvalidCondition.into());
        assert_eq!(
            camera.disable_shutter_sound(true).unwrap_err(),
            CameraError::InvalidOperation
        );

        camera.disable_shutter_sound(true).unwrap();
        assert_eq!(backend.attr_int(AttrKey::CaptureSoundEnable), Some(0));
    }

    #[test]
    fn lens_orientation_inverts_display_rotation() {
        let (camera, backend) = open_camera();

        backend.seed_attr(AttrKey::RecommendDisplayRotation, AttrValue::Int(1));
        assert_eq!(camera.lens_orientation().unwrap(), 270);

        backend.seed_attr(AttrKey::RecommendDisplayRotation, AttrValue::Int(0));
        assert_eq!(camera.lens_orientation().unwrap(), 0);
    }

    #[test]
    fn tag_fields_round_trip() {
        let (camera, _backend) = open_camera();

        camera.enable_tag(true).unwrap();
        assert!(camera.is_enabled_tag().unwrap());

        camera.set_tag_image_description("evening shot").unwrap();
        assert_eq!(camera.tag_image_description().unwrap(), "evening shot");

        assert_eq!(
            camera.set_tag_orientation(9).unwrap_err(),
            CameraError::InvalidParameter
        );
        camera.set_tag_orientation(6).unwrap();
        assert_eq!(camera.tag_orientation().unwrap(), 6);
    }
}
