use crate::content::ContentRef;

/// Resume position for one content instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProgressRecord {
    pub content_ref: ContentRef,
    /// Playback position in seconds
    pub offset_seconds: f64,
    /// Duration at the time of the write. Zero when read back from storage,
    /// which only keeps the offset.
    pub duration_seconds: f64,
}

impl ProgressRecord {
    /// Fraction watched, `None` while the duration is unknown.
    pub fn fraction(&self) -> Option<f64> {
        (self.duration_seconds > 0.0)
            .then(|| (self.offset_seconds / self.duration_seconds).clamp(0.0, 1.0))
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_switch_to_hours_past_sixty_minutes() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(42.9), "0:42");
        assert_eq!(format_timestamp(600.0), "10:00");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
        assert_eq!(format_timestamp(f64::NAN), "0:00");
    }

    #[test]
    fn fraction_requires_duration() {
        let content_ref = ContentRef::new("s", "e").unwrap();
        let record = ProgressRecord {
            content_ref,
            offset_seconds: 42.0,
            duration_seconds: 0.0,
        };
        assert!(record.fraction().is_none());
    }
}
