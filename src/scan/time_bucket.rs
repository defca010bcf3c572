//! Time-of-day bucket keys. Always UTC; display conversion belongs to the host.

use chrono::{DateTime, Utc};

/// Minute and second resolution keys for one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBuckets {
    /// `HH:MM`
    pub minute: String,
    /// `HH:MM:SS`
    pub second: String,
}

#[must_use]
pub fn bucket_keys(timestamp: &DateTime<Utc>) -> TimeBuckets {
    TimeBuckets {
        minute: timestamp.format("%H:%M").to_string(),
        second: timestamp.format("%H:%M:%S").to_string(),
    }
}

/// A validated lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeKey {
    Minute(String),
    Second(String),
}

impl TimeKey {
    /// Accepts zero-padded `HH:MM` or `HH:MM:SS` (surrounding whitespace ignored).
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let parts: Vec<&str> = key.split(':').collect();
        let fields = parts
            .iter()
            .map(|part| two_digits(part))
            .collect::<Option<Vec<u32>>>()?;
        match fields.as_slice() {
            [hour, minute] if *hour < 24 && *minute < 60 => Some(Self::Minute(key.to_string())),
            // 60 covers leap seconds, which chrono formats as `:60`.
            [hour, minute, second] if *hour < 24 && *minute < 60 && *second <= 60 => {
                Some(Self::Second(key.to_string()))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Minute(key) | Self::Second(key) => key,
        }
    }
}

fn two_digits(part: &str) -> Option<u32> {
    if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn keys_are_zero_padded_utc() {
        let ts = Utc.with_ymd_and_hms(2018, 1, 5, 3, 7, 22).single().expect("ts");
        let keys = bucket_keys(&ts);
        assert_eq!(keys.minute, "03:07");
        assert_eq!(keys.second, "03:07:22");
    }

    #[test]
    fn offset_timestamps_bucket_in_utc() {
        let parsed = DateTime::parse_from_rfc3339("2018-01-04T22:07:22-05:00").expect("parse");
        let keys = bucket_keys(&parsed.with_timezone(&Utc));
        assert_eq!(keys.minute, "03:07");
    }

    #[test]
    fn parse_classifies_resolution() {
        assert_eq!(TimeKey::parse("03:07"), Some(TimeKey::Minute("03:07".into())));
        assert_eq!(
            TimeKey::parse(" 23:59:59 "),
            Some(TimeKey::Second("23:59:59".into()))
        );
        assert_eq!(TimeKey::parse("24:00"), None);
        assert_eq!(TimeKey::parse("3:07"), None);
        assert_eq!(TimeKey::parse("03:07:22:01"), None);
        assert_eq!(TimeKey::parse(""), None);
    }
}
