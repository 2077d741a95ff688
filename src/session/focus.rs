//! Focus controller.
//!
//! Reconciles the requested autofocus mode, continuous-focus mode and the
//! deferred "apply on next focus start" cache. The framework rejects a
//! focus-mode write while a continuous scan is pending, so such requests
//! are parked in `cached_focus_mode` until focusing actually starts.

use super::{Camera, SessionShared};
use crate::attrs::AfMode;
use crate::error::{translate, CameraError, Result};
use crate::config::ClearAfAreaPolicy;
use crate::framework::types::{focus_mode as fw_focus_mode, AttrKey, AttrValue};
use std::sync::Arc;
use tracing::{debug, warn};

impl Camera {
    /// Start an autofocus scan.
    ///
    /// Non-continuous scans pick whole-frame or region-based auto mode
    /// depending on whether a touch focus area is set. Continuous scans
    /// switch the live focus mode to continuous when necessary; the
    /// framework then starts focusing on its own once the mode change is
    /// acknowledged.
    pub fn start_focusing(&self, continuous: bool) -> Result<()> {
        if let Some(mode) = self.shared.state.lock().cached_focus_mode.take() {
            debug!("applying cached focus mode {mode:?}");
            let scan = [(AttrKey::AfScanRange, AttrValue::Int(mode.scan_range_code()))];
            if let Err(code) = self.shared.set_attrs(&scan) {
                warn!("cached focus mode not applied: {code:?}");
            }
        }

        if continuous {
            return start_continuous_focusing(&self.shared);
        }

        let focus_mode = if self.shared.state.lock().focus_area_valid {
            fw_focus_mode::TOUCH_AUTO
        } else {
            fw_focus_mode::AUTO
        };
        if let Err(code) = self
            .shared
            .set_attrs(&[(AttrKey::FocusMode, AttrValue::Int(focus_mode))])
        {
            warn!("focus mode not set before focusing: {code:?}");
        }

        self.shared.backend.start_focusing().map_err(translate)
    }

    /// Stop an ongoing scan. Stopping continuous focus only clears the
    /// started flag; the live mode is left as-is.
    pub fn cancel_focusing(&self) -> Result<()> {
        self.shared.state.lock().on_continuous_focusing = false;
        self.shared.backend.stop_focusing().map_err(translate)
    }

    /// Set the autofocus mode.
    ///
    /// When the live mode is continuous but no scan has started yet, a
    /// non-`Off` request is cached and applied on the next focus start;
    /// the call succeeds without touching the framework.
    pub fn set_af_mode(&self, mode: AfMode) -> Result<()> {
        let live_mode = self.shared.get_int(AttrKey::FocusMode).unwrap_or_else(|code| {
            warn!("focus mode query failed: {code:?}");
            fw_focus_mode::NONE
        });
        let auto_capable = matches!(
            live_mode,
            fw_focus_mode::AUTO | fw_focus_mode::TOUCH_AUTO | fw_focus_mode::CONTINUOUS
        );

        {
            let mut state = self.shared.state.lock();
            if mode != AfMode::Off
                && live_mode == fw_focus_mode::CONTINUOUS
                && !state.on_continuous_focusing
            {
                state.cached_focus_mode = Some(mode);
                debug!("af mode {mode:?} deferred until focusing starts");
                return Ok(());
            }
            state.cached_focus_mode = None;
        }

        if mode != AfMode::Off && !auto_capable {
            let to_auto = [(AttrKey::FocusMode, AttrValue::Int(fw_focus_mode::AUTO))];
            if let Err(code) = self.shared.set_attrs(&to_auto) {
                warn!("focus mode not switched to auto: {code:?}");
            }
        }

        match mode {
            AfMode::Off => self.shared.set_attrs(&[
                (AttrKey::FocusMode, AttrValue::Int(fw_focus_mode::NONE)),
                (AttrKey::AfScanRange, AttrValue::Int(0)),
            ]),
            _ => self.shared.set_attrs(&[(
                AttrKey::AfScanRange,
                AttrValue::Int(mode.scan_range_code()),
            )]),
        }
    }

    pub fn af_mode(&self) -> Result<AfMode> {
        let live_mode = self.shared.get_int(AttrKey::FocusMode)?;
        let auto_capable = matches!(
            live_mode,
            fw_focus_mode::AUTO | fw_focus_mode::TOUCH_AUTO | fw_focus_mode::CONTINUOUS
        );
        if !auto_capable {
            return Ok(AfMode::Off);
        }

        let scan = self.shared.get_int(AttrKey::AfScanRange)?;
        Ok(AfMode::from_scan_range(scan).unwrap_or(AfMode::Off))
    }

    /// Set a touch/region focus target. Rejected while autofocus is off.
    pub fn set_af_area(&self, x: i32, y: i32) -> Result<()> {
        if self.af_mode()? == AfMode::Off {
            warn!("af area rejected: autofocus is off");
            return Err(CameraError::InvalidOperation);
        }

        self.shared.set_attrs(&[
            (AttrKey::AfTouchX, AttrValue::Int(x)),
            (AttrKey::AfTouchY, AttrValue::Int(y)),
        ])?;

        self.shared.state.lock().focus_area_valid = true;
        Ok(())
    }

    /// Clear the touch focus target. Behavior when nothing is set follows
    /// the configured [`ClearAfAreaPolicy`].
    pub fn clear_af_area(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if !state.focus_area_valid
            && self.shared.config.clear_af_area_policy == ClearAfAreaPolicy::ErrorWhenUnset
        {
            return Err(CameraError::InvalidOperation);
        }
        state.focus_area_valid = false;
        Ok(())
    }
}

fn start_continuous_focusing(shared: &Arc<SessionShared>) -> Result<()> {
    shared.state.lock().on_continuous_focusing = true;

    let live_mode = shared.get_int(AttrKey::FocusMode).unwrap_or_else(|code| {
        warn!("focus mode query failed: {code:?}");
        fw_focus_mode::NONE
    });

    if live_mode == fw_focus_mode::CONTINUOUS {
        shared.backend.start_focusing().map_err(translate)
    } else {
        // The mode switch itself triggers focusing once the framework
        // acknowledges it.
        shared.set_attrs(&[(
            AttrKey::FocusMode,
            AttrValue::Int(fw_focus_mode::CONTINUOUS),
        )])
    }
}
