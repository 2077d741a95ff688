use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Behavior of [`crate::Camera::clear_af_area`] when no focus area has been
/// set. Product revisions disagree on this; the facade makes it explicit
/// configuration instead of picking silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearAfAreaPolicy {
    /// Clearing when nothing is set is a no-op.
    #[default]
    AlwaysClear,
    /// Clearing when nothing is set fails with `InvalidOperation`.
    ErrorWhenUnset,
}

/// Which delivery path may declare a capture sequence complete.
///
/// The framework reports capture progress both through the capture-frame
/// callback and through the captured message; the completion decision
/// itself is evaluated in one place and is idempotent, so `Either` is safe
/// under double delivery ("first one wins").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionAuthority {
    #[default]
    Either,
    FrameDelivery,
    CapturedMessage,
}

/// Facade-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FacadeConfig {
    #[serde(default)]
    pub clear_af_area_policy: ClearAfAreaPolicy,

    #[serde(default)]
    pub completion_authority: CompletionAuthority,
}

impl FacadeConfig {
    /// Load configuration from an optional TOML file layered under
    /// `CAMLINK_*` environment overrides.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path.as_ref()).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("CAMLINK").separator("__"))
            .build()?;

        let config: FacadeConfig = settings.try_deserialize()?;
        debug!("loaded facade config: {:?}", config);
        Ok(config)
    }

    /// Serialize the configuration as TOML, e.g. to seed a config file.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_always_clear_and_either() {
        let config = FacadeConfig::default();
        assert_eq!(config.clear_af_area_policy, ClearAfAreaPolicy::AlwaysClear);
        assert_eq!(config.completion_authority, CompletionAuthority::Either);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "clear_af_area_policy = \"error_when_unset\"\ncompletion_authority = \"captured_message\""
        )
        .unwrap();

        let config = FacadeConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.clear_af_area_policy,
            ClearAfAreaPolicy::ErrorWhenUnset
        );
        assert_eq!(
            config.completion_authority,
            CompletionAuthority::CapturedMessage
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = FacadeConfig::load(Some("/nonexistent/camlink.toml")).unwrap();
        assert_eq!(config.clear_af_area_policy, ClearAfAreaPolicy::AlwaysClear);
    }

    #[test]
    fn toml_round_trip() {
        let config = FacadeConfig {
            clear_af_area_policy: ClearAfAreaPolicy::ErrorWhenUnset,
            completion_authority: CompletionAuthority::FrameDelivery,
        };
        let rendered = config.to_toml().unwrap();
        let parsed: FacadeConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.clear_af_area_policy, config.clear_af_area_policy);
        assert_eq!(parsed.completion_authority, config.completion_authority);
    }
}
