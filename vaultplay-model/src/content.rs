use crate::error::{ModelError, Result};
use std::{fmt, str::FromStr};

/// Separator used by the canonical `series:episode` form.
pub const CONTENT_REF_SEPARATOR: char = ':';

/// Identity of a playable unit.
///
/// Used as the join key for every piece of persisted state (entitlement
/// unlocks, resume offsets). Both halves are validated at construction so the
/// canonical `series:episode` form always parses back to the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentRef {
    series_id: String,
    episode_id: String,
}

impl ContentRef {
    pub fn new(
        series_id: impl Into<String>,
        episode_id: impl Into<String>,
    ) -> Result<Self> {
        let series_id = series_id.into();
        let episode_id = episode_id.into();
        validate_part("series id", &series_id)?;
        validate_part("episode id", &episode_id)?;
        Ok(Self {
            series_id,
            episode_id,
        })
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }

    /// Canonical `series:episode` key.
    pub fn as_key(&self) -> String {
        format!(
            "{}{}{}",
            self.series_id, CONTENT_REF_SEPARATOR, self.episode_id
        )
    }
}

fn validate_part(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ModelError::InvalidContentRef(format!("{label} is empty")));
    }
    if value.contains(CONTENT_REF_SEPARATOR) {
        return Err(ModelError::InvalidContentRef(format!(
            "{label} '{value}' contains '{CONTENT_REF_SEPARATOR}'"
        )));
    }
    Ok(())
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.series_id, CONTENT_REF_SEPARATOR, self.episode_id
        )
    }
}

impl FromStr for ContentRef {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        let (series, episode) =
            raw.split_once(CONTENT_REF_SEPARATOR).ok_or_else(|| {
                ModelError::InvalidContentRef(format!(
                    "'{raw}' is not in series{CONTENT_REF_SEPARATOR}episode form"
                ))
            })?;
        ContentRef::new(series, episode)
    }
}

// Persisted as the canonical string so the entitlement record stays a flat
// list of `series:episode` entries.
#[cfg(feature = "serde")]
impl serde::Serialize for ContentRef {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ContentRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Catalog-supplied description of a playable unit.
///
/// The engine never fetches or validates this beyond the [`ContentRef`]
/// rules; `is_premium` is taken at face value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ContentDescriptor {
    pub content_ref: ContentRef,
    pub is_premium: bool,
    /// Catalog duration in seconds. `0.0` when unknown; the media primitive
    /// reports the authoritative value once loaded.
    pub duration_seconds: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
}

impl ContentDescriptor {
    pub fn new(content_ref: ContentRef, is_premium: bool) -> Self {
        Self {
            content_ref,
            is_premium,
            duration_seconds: 0.0,
            title: None,
        }
    }

    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_round_trips() {
        let content = ContentRef::new("tour-2024", "ep-3").unwrap();
        assert_eq!(content.as_key(), "tour-2024:ep-3");
        assert_eq!("tour-2024:ep-3".parse::<ContentRef>().unwrap(), content);
    }

    #[test]
    fn rejects_separator_and_empty_parts() {
        assert!(ContentRef::new("a:b", "c").is_err());
        assert!(ContentRef::new("a", "").is_err());
        assert!(ContentRef::new("  ", "c").is_err());
        assert!("no-separator".parse::<ContentRef>().is_err());
        // Only the first separator splits, so a second one is caught by validation.
        assert!("a:b:c".parse::<ContentRef>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_canonical_string() {
        let content = ContentRef::new("s1", "e1").unwrap();
        let json = serde_json::to_string(&content).unwrap();
        assert_eq!(json, "\"s1:e1\"");
        let back: ContentRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
