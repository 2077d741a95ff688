mod settings;
mod types;

pub use types::{
    AfMode, Effect, ExposureMode, FlashMode, Fps, HdrMode, Iso, SceneMode, TheaterMode,
    Whitebalance,
};
