//! # Temporal Types: UTC-Only Timestamps
//!
//! `Timestamp` is UTC with seconds precision. Credential issuance dates,
//! proof creation times and job bookkeeping all use it, so the serialized
//! form is always `YYYY-MM-DDTHH:MM:SSZ` and canonical bytes are stable.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC timestamp truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "seconds_z")] DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// From a `DateTime<Utc>`, dropping sub-second components.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(0))
    }

    /// Parse an RFC 3339 string with any offset, normalizing to UTC.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::from_utc(dt.with_timezone(&Utc)))
            .map_err(|e| ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_canonical_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// This timestamp shifted by `days`, or `None` outside chrono's range.
    pub fn checked_plus_days(&self, days: i64) -> Option<Self> {
        Duration::try_days(days).and_then(|d| self.checked_shift(d))
    }

    /// This timestamp shifted by `secs` seconds, or `None` outside
    /// chrono's range.
    pub fn checked_plus_seconds(&self, secs: i64) -> Option<Self> {
        Duration::try_seconds(secs).and_then(|d| self.checked_shift(d))
    }

    /// This timestamp shifted by `days` (negative values go backwards),
    /// saturating at the representable bounds.
    pub fn plus_days(&self, days: i64) -> Self {
        self.checked_plus_days(days)
            .unwrap_or_else(|| Self::saturated(days < 0))
    }

    /// This timestamp shifted by `secs` seconds, saturating.
    pub fn plus_seconds(&self, secs: i64) -> Self {
        self.checked_plus_seconds(secs)
            .unwrap_or_else(|| Self::saturated(secs < 0))
    }

    fn checked_shift(&self, delta: Duration) -> Option<Self> {
        self.0.checked_add_signed(delta).map(Self)
    }

    fn saturated(backwards: bool) -> Self {
        if backwards {
            Self::from_utc(DateTime::<Utc>::MIN_UTC)
        } else {
            Self::from_utc(DateTime::<Utc>::MAX_UTC)
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

mod seconds_z {
    use chrono::{DateTime, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(0))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn canonical_string_format() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_canonical_string(), "2024-03-09T07:05:01Z");
    }

    #[test]
    fn parse_normalizes_offsets() {
        let ts = Timestamp::parse("2024-01-01T05:30:00+05:30").unwrap();
        assert_eq!(ts.to_canonical_string(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn parse_truncates_fraction() {
        let ts = Timestamp::parse("2024-01-01T00:00:00.987Z").unwrap();
        assert_eq!(ts.to_canonical_string(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            Timestamp::parse("yesterday"),
            Err(ValidationError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn serde_uses_z_suffix() {
        let ts = Timestamp::parse("2025-06-01T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#""2025-06-01T12:00:00Z""#);
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn arithmetic() {
        let ts = Timestamp::parse("2025-01-10T00:00:00Z").unwrap();
        assert_eq!(ts.plus_days(-9).to_canonical_string(), "2025-01-01T00:00:00Z");
        assert_eq!(ts.plus_seconds(61).to_canonical_string(), "2025-01-10T00:01:01Z");
        assert!(ts.plus_days(1) > ts);
    }

    #[test]
    fn arithmetic_past_range_saturates() {
        let ts = Timestamp::parse("2025-01-10T00:00:00Z").unwrap();
        assert!(ts.checked_plus_days(100_000_000).is_none());
        assert!(ts.checked_plus_seconds(i64::MIN).is_none());
        assert!(ts.checked_plus_days(i64::MAX).is_none());

        let far = ts.plus_days(100_000_000);
        assert!(far > ts.plus_days(36_500));
        assert_eq!(far, ts.plus_days(i64::MAX));
        assert!(ts.plus_seconds(-(i64::MAX / 2)) < ts);
        assert_eq!(ts.plus_seconds(i64::MIN), ts.plus_days(-100_000_000));
    }
}
