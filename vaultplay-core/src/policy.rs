//! Tunables for the gating engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default unauthenticated preview allowance.
pub const DEFAULT_PREVIEW_LIMIT: Duration = Duration::from_secs(30);

/// Fraction at or above which content counts as finished and stops being
/// checkpointed.
pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.9;

/// Relative seek step for skip back / skip forward.
pub const DEFAULT_SKIP_INTERVAL: Duration = Duration::from_secs(10);

/// Preview, completion and seek policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatePolicy {
    #[serde(with = "duration_secs")]
    pub preview_limit: Duration,
    pub completion_threshold: f64,
    #[serde(with = "duration_secs")]
    pub skip_interval: Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            skip_interval: DEFAULT_SKIP_INTERVAL,
        }
    }
}

impl GatePolicy {
    pub fn with_preview_limit(mut self, limit: Duration) -> Self {
        self.preview_limit = limit;
        self
    }

    pub fn with_completion_threshold(mut self, threshold: f64) -> Self {
        self.completion_threshold = threshold;
        self
    }

    /// Checks the invariants the machine relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.preview_limit.is_zero() {
            return Err("preview_limit must be greater than zero".into());
        }
        if !(self.completion_threshold > 0.0 && self.completion_threshold <= 1.0)
        {
            return Err(format!(
                "completion_threshold must be in (0, 1], got {}",
                self.completion_threshold
            ));
        }
        Ok(())
    }
}

/// Durations serialised as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_preview_and_completion_rules() {
        let policy = GatePolicy::default();
        assert_eq!(policy.preview_limit, Duration::from_secs(30));
        assert_eq!(policy.completion_threshold, 0.9);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(
            GatePolicy::default()
                .with_completion_threshold(1.5)
                .validate()
                .is_err()
        );
        assert!(
            GatePolicy::default()
                .with_completion_threshold(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            GatePolicy::default()
                .with_preview_limit(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
