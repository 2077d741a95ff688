//! Public attribute enums and their framework value mappings.
//!
//! Most properties share the framework's numbering and map 1:1; the
//! exceptions (autofocus scan range, exposure-mode table with holes) carry
//! their own tables.

/// Autofocus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfMode {
    Off,
    Normal,
    Macro,
    Full,
}

impl AfMode {
    /// Framework scan-range code for an auto-capable mode.
    pub(crate) fn scan_range_code(self) -> i32 {
        match self {
            AfMode::Off => 0,
            AfMode::Normal => 1,
            AfMode::Macro => 2,
            AfMode::Full => 3,
        }
    }

    pub(crate) fn from_scan_range(code: i32) -> Option<Self> {
        Some(match code {
            0 => AfMode::Off,
            1 => AfMode::Normal,
            2 => AfMode::Macro,
            3 => AfMode::Full,
            _ => return None,
        })
    }
}

/// Auto-exposure metering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    Off,
    All,
    Center,
    Spot,
    Custom,
}

impl ExposureMode {
    /// The framework's metering table has multiple center/spot/custom
    /// refinements; the public mode always selects the first of each.
    pub(crate) fn to_fw(self) -> i32 {
        match self {
            ExposureMode::Off => 0,
            ExposureMode::All => 1,
            ExposureMode::Center => 2,
            ExposureMode::Spot => 5,
            ExposureMode::Custom => 7,
        }
    }

    /// Inverse of the table above; refinement entries without a public
    /// counterpart map to `None` and are skipped during enumeration.
    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => ExposureMode::Off,
            1 => ExposureMode::All,
            2 => ExposureMode::Center,
            5 => ExposureMode::Spot,
            7 => ExposureMode::Custom,
            _ => return None,
        })
    }
}

/// ISO sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iso {
    Auto,
    Iso50,
    Iso100,
    Iso200,
    Iso400,
    Iso800,
    Iso1600,
    Iso3200,
}

impl Iso {
    pub(crate) fn to_fw(self) -> i32 {
        match self {
            Iso::Auto => 0,
            Iso::Iso50 => 1,
            Iso::Iso100 => 2,
            Iso::Iso200 => 3,
            Iso::Iso400 => 4,
            Iso::Iso800 => 5,
            Iso::Iso1600 => 6,
            Iso::Iso3200 => 7,
        }
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Iso::Auto,
            1 => Iso::Iso50,
            2 => Iso::Iso100,
            3 => Iso::Iso200,
            4 => Iso::Iso400,
            5 => Iso::Iso800,
            6 => Iso::Iso1600,
            7 => Iso::Iso3200,
            _ => return None,
        })
    }
}

/// White balance preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whitebalance {
    None,
    Auto,
    Custom,
    Daylight,
    Cloudy,
    Fluorescent,
    Incandescent,
    Shade,
    Horizon,
    Flash,
}

impl Whitebalance {
    pub(crate) fn to_fw(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Whitebalance::None,
            1 => Whitebalance::Auto,
            2 => Whitebalance::Custom,
            3 => Whitebalance::Daylight,
            4 => Whitebalance::Cloudy,
            5 => Whitebalance::Fluorescent,
            6 => Whitebalance::Incandescent,
            7 => Whitebalance::Shade,
            8 => Whitebalance::Horizon,
            9 => Whitebalance::Flash,
            _ => return None,
        })
    }
}

/// Color tone effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Mono,
    Sepia,
    Negative,
    Sketch,
    Emboss,
    Aqua,
}

impl Effect {
    pub(crate) fn to_fw(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Effect::None,
            1 => Effect::Mono,
            2 => Effect::Sepia,
            3 => Effect::Negative,
            4 => Effect::Sketch,
            5 => Effect::Emboss,
            6 => Effect::Aqua,
            _ => return None,
        })
    }
}

/// Scene preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMode {
    Normal,
    Portrait,
    Landscape,
    Sports,
    Party,
    Night,
    Sunset,
    Text,
}

impl SceneMode {
    pub(crate) fn to_fw(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => SceneMode::Normal,
            1 => SceneMode::Portrait,
            2 => SceneMode::Landscape,
            3 => SceneMode::Sports,
            4 => SceneMode::Party,
            5 => SceneMode::Night,
            6 => SceneMode::Sunset,
            7 => SceneMode::Text,
            _ => return None,
        })
    }
}

/// Flash mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    Off,
    On,
    Auto,
    RedEyeReduction,
    SlowSync,
    Permanent,
}

impl FlashMode {
    pub(crate) fn to_fw(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => FlashMode::Off,
            1 => FlashMode::On,
            2 => FlashMode::Auto,
            3 => FlashMode::RedEyeReduction,
            4 => FlashMode::SlowSync,
            5 => FlashMode::Permanent,
            _ => return None,
        })
    }
}

/// Preview frame rate. `Auto` delegates rate selection to the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fps {
    Auto,
    Fps8,
    Fps15,
    Fps24,
    Fps25,
    Fps30,
    Fps60,
    Fps120,
}

impl Fps {
    pub(crate) fn to_fw(self) -> i32 {
        match self {
            Fps::Auto => 0,
            Fps::Fps8 => 8,
            Fps::Fps15 => 15,
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps30 => 30,
            Fps::Fps60 => 60,
            Fps::Fps120 => 120,
        }
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Fps::Auto,
            8 => Fps::Fps8,
            15 => Fps::Fps15,
            24 => Fps::Fps24,
            25 => Fps::Fps25,
            30 => Fps::Fps30,
            60 => Fps::Fps60,
            120 => Fps::Fps120,
            _ => return None,
        })
    }
}

/// HDR capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrMode {
    Disable,
    Enable,
    /// One logical shot delivers both the original and the processed
    /// frame; completion waits for the second delivery.
    KeepOriginal,
}

impl HdrMode {
    pub(crate) fn to_fw(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => HdrMode::Disable,
            1 => HdrMode::Enable,
            2 => HdrMode::KeepOriginal,
            _ => return None,
        })
    }
}

/// Theater (external display priority) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TheaterMode {
    Disable,
    CloneWithUi,
    Enable,
}

impl TheaterMode {
    pub(crate) fn to_fw(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_fw(code: i32) -> Option<Self> {
        Some(match code {
            0 => TheaterMode::Disable,
            1 => TheaterMode::CloneWithUi,
            2 => TheaterMode::Enable,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure_mode_table_has_holes() {
        // Refinement entries 3, 4, 6 and 8 have no public counterpart.
        assert_eq!(ExposureMode::from_fw(3), None);
        assert_eq!(ExposureMode::from_fw(4), None);
        assert_eq!(ExposureMode::from_fw(6), None);
        assert_eq!(ExposureMode::from_fw(5), Some(ExposureMode::Spot));
        assert_eq!(ExposureMode::from_fw(7), Some(ExposureMode::Custom));
    }

    #[test]
    fn exposure_mode_round_trip() {
        for mode in [
            ExposureMode::Off,
            ExposureMode::All,
            ExposureMode::Center,
            ExposureMode::Spot,
            ExposureMode::Custom,
        ] {
            assert_eq!(ExposureMode::from_fw(mode.to_fw()), Some(mode));
        }
    }

    #[test]
    fn fps_codes_are_frame_rates() {
        assert_eq!(Fps::Fps30.to_fw(), 30);
        assert_eq!(Fps::from_fw(15), Some(Fps::Fps15));
        assert_eq!(Fps::from_fw(13), None);
    }

    #[test]
    fn af_scan_range_round_trip() {
        for mode in [AfMode::Off, AfMode::Normal, AfMode::Macro, AfMode::Full] {
            assert_eq!(AfMode::from_scan_range(mode.scan_range_code()), Some(mode));
        }
    }
}
