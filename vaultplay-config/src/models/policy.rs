use serde::{Deserialize, Serialize};
use std::time::Duration;
use vaultplay_core::GatePolicy;

use crate::loader::error::ConfigLoadError;

/// Duration as written in a config file: `"30s"`, `"1m 30s"` or plain
/// seconds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DurationSetting {
    Seconds(f64),
    Human(String),
}

impl DurationSetting {
    pub fn resolve(&self, field: &'static str) -> Result<Duration, ConfigLoadError> {
        match self {
            DurationSetting::Seconds(secs) => Duration::try_from_secs_f64(*secs)
                .map_err(|err| {
                    ConfigLoadError::Invalid(format!("{field}: {err}"))
                }),
            DurationSetting::Human(raw) => parse_duration(field, raw),
        }
    }
}

pub fn parse_duration(
    field: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::Duration {
            field,
            value: raw.to_string(),
            source,
        }
    })
}

/// `[policy]` table. Missing keys keep the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySettings {
    /// Unauthenticated preview allowance per play.
    pub preview_limit: Option<DurationSetting>,
    /// Fraction of the duration past which progress stops being saved.
    pub completion_threshold: Option<f64>,
    /// Step for skip back / skip forward.
    pub skip_interval: Option<DurationSetting>,
}

impl PolicySettings {
    pub fn resolve(&self) -> Result<GatePolicy, ConfigLoadError> {
        let mut policy = GatePolicy::default();
        if let Some(limit) = &self.preview_limit {
            policy.preview_limit = limit.resolve("policy.preview_limit")?;
        }
        if let Some(threshold) = self.completion_threshold {
            policy.completion_threshold = threshold;
        }
        if let Some(interval) = &self.skip_interval {
            policy.skip_interval = interval.resolve("policy.skip_interval")?;
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_humantime_and_seconds() {
        let settings: PolicySettings = toml::from_str(
            "preview_limit = \"1m 30s\"\nskip_interval = 5\n",
        )
        .unwrap();
        let policy = settings.resolve().unwrap();
        assert_eq!(policy.preview_limit, Duration::from_secs(90));
        assert_eq!(policy.skip_interval, Duration::from_secs(5));
        assert_eq!(policy.completion_threshold, 0.9);
    }

    #[test]
    fn rejects_garbage_duration() {
        let settings = PolicySettings {
            preview_limit: Some(DurationSetting::Human("soon".into())),
            ..Default::default()
        };
        assert!(matches!(
            settings.resolve(),
            Err(ConfigLoadError::Duration {
                field: "policy.preview_limit",
                ..
            })
        ));
    }
}
