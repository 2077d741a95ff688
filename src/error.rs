use crate::framework::types::FrameworkError;
use thiserror::Error;
use tracing::error;

/// Public error taxonomy. Every fallible operation on a [`crate::Camera`]
/// returns one of these; asynchronous failures are additionally reported
/// through the registered error callback.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraError {
    #[error("invalid parameter")]
    InvalidParameter,

    #[error("operation not valid in the current state")]
    InvalidState,

    #[error("invalid operation")]
    InvalidOperation,

    #[error("camera device not found")]
    DeviceNotFound,

    #[error("camera device busy")]
    DeviceBusy,

    #[error("camera device error")]
    Device,

    #[error("out of memory")]
    OutOfMemory,

    #[error("session stopped by audio session policy")]
    SoundPolicy,

    #[error("session stopped by call")]
    SoundPolicyByCall,

    #[error("session stopped by alarm")]
    SoundPolicyByAlarm,

    #[error("session restricted by security policy")]
    SecurityRestricted,

    #[error("permission denied")]
    PermissionDenied,

    #[error("not supported on this device")]
    NotSupported,

    #[error("electrostatic discharge fault")]
    Esd,
}

pub type Result<T> = std::result::Result<T, CameraError>;

/// Translate a framework error into the public taxonomy.
///
/// Total over the framework's error domain: codes without a dedicated
/// mapping fall back to `InvalidOperation`.
pub(crate) fn translate(code: FrameworkError) -> CameraError {
    use FrameworkError::*;

    let mapped = match code {
        InvalidArgument | InvalidAttributeType => CameraError::InvalidParameter,
        NotInitialized | InvalidState => CameraError::InvalidState,
        DeviceNotFound => CameraError::DeviceNotFound,
        DeviceBusy | DeviceOpen | CommandRunning => CameraError::DeviceBusy,
        Device | DeviceIo | DeviceTimeout | DeviceWrongJpeg | DeviceLackBuffer => {
            CameraError::Device
        }
        PipelineCore | PipelineLibrary | PipelineResource | PipelineStream
        | PipelineStateChange | PipelineNegotiation | PipelineLink | PipelineFlow | Encoder
        | EncoderBuffer | EncoderWrongType | EncoderWorking | Internal | ResponseTimeout
        | DspFail | AudioEmpty | CreateConfigure | FileSizeOver | DisplayDeviceOff
        | InvalidCondition => CameraError::InvalidOperation,
        ResourceCreation | OutOfMemory => CameraError::OutOfMemory,
        PolicyBlocked => CameraError::SoundPolicy,
        PolicyBlockedByCall => CameraError::SoundPolicyByCall,
        PolicyBlockedByAlarm => CameraError::SoundPolicyByAlarm,
        PolicyRestricted => CameraError::SecurityRestricted,
        DeviceRegTrouble => CameraError::Esd,
        InvalidPermission => CameraError::PermissionDenied,
        OutOfArray | OutOfRange | AttributeNotFound | NotSupported => CameraError::NotSupported,
        _ => CameraError::InvalidOperation,
    };

    error!("{mapped:?} : framework error {code:?}");

    mapped
}

impl From<FrameworkError> for CameraError {
    fn from(code: FrameworkError) -> Self {
        translate(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_codes_map_to_public_taxonomy() {
        assert_eq!(
            translate(FrameworkError::InvalidArgument),
            CameraError::InvalidParameter
        );
        assert_eq!(
            translate(FrameworkError::InvalidState),
            CameraError::InvalidState
        );
        assert_eq!(
            translate(FrameworkError::DeviceNotFound),
            CameraError::DeviceNotFound
        );
        assert_eq!(
            translate(FrameworkError::CommandRunning),
            CameraError::DeviceBusy
        );
        assert_eq!(
            translate(FrameworkError::DeviceTimeout),
            CameraError::Device
        );
        assert_eq!(
            translate(FrameworkError::PipelineNegotiation),
            CameraError::InvalidOperation
        );
        assert_eq!(
            translate(FrameworkError::ResourceCreation),
            CameraError::OutOfMemory
        );
        assert_eq!(
            translate(FrameworkError::PolicyBlockedByCall),
            CameraError::SoundPolicyByCall
        );
        assert_eq!(
            translate(FrameworkError::PolicyRestricted),
            CameraError::SecurityRestricted
        );
        assert_eq!(
            translate(FrameworkError::DeviceRegTrouble),
            CameraError::Esd
        );
        assert_eq!(
            translate(FrameworkError::AttributeNotFound),
            CameraError::NotSupported
        );
    }

    #[test]
    fn unknown_codes_fall_back_to_invalid_operation() {
        assert_eq!(
            translate(FrameworkError::Unknown(0x7fff_0001)),
            CameraError::InvalidOperation
        );
    }
}
