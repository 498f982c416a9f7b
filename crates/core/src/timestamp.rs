//! Conversion of Slack request timestamps into the canonical stored form.
//!
//! Slack sends `x-slack-request-timestamp` as epoch seconds, sometimes with a
//! fractional part. Kronos stores the wall-clock time in a single fixed offset
//! (UTC+8 by default, which is Asia/Manila; that zone has no DST) formatted as
//! `YYYY-MM-DD HH:MM:SS`.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

const SECONDS_PER_HOUR: i32 = 3_600;
const MAX_CANONICAL_YEAR: i32 = 9_999;
const NANOS_DIGITS: usize = 9;

/// Epoch seconds split into whole seconds and sub-second nanos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EpochSeconds {
    pub secs: i64,
    pub nanos: u32,
}

impl EpochSeconds {
    /// Parses `digits[.digits]`. Signs, exponents, whitespace, and empty parts
    /// are rejected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (raw, None),
        };

        if !is_ascii_digits(whole) {
            return Err(ValidationError::InvalidTimestamp);
        }
        let secs = whole.parse::<i64>().map_err(|_| ValidationError::InvalidTimestamp)?;

        let nanos = match fraction {
            None => 0,
            Some(fraction) if is_ascii_digits(fraction) => fraction_to_nanos(fraction),
            Some(_) => return Err(ValidationError::InvalidTimestamp),
        };

        Ok(Self { secs, nanos })
    }
}

fn is_ascii_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

fn fraction_to_nanos(fraction: &str) -> u32 {
    fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(NANOS_DIGITS)
        .fold(0_u32, |acc, digit| acc * 10 + u32::from(digit - b'0'))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalTimestamp(String);

impl CanonicalTimestamp {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimestampNormalizer {
    offset: FixedOffset,
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self::manila()
    }
}

impl TimestampNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn manila() -> Self {
        Self::from_offset_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or(Self { offset: Utc.fix() })
    }

    /// Returns `None` when `hours` is outside chrono's offset range.
    pub fn from_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours.checked_mul(SECONDS_PER_HOUR)?).map(Self::new)
    }

    pub fn normalize(&self, raw: &str) -> Result<CanonicalTimestamp, ValidationError> {
        self.normalize_epoch(EpochSeconds::parse(raw)?)
    }

    pub fn normalize_epoch(
        &self,
        epoch: EpochSeconds,
    ) -> Result<CanonicalTimestamp, ValidationError> {
        let utc = DateTime::from_timestamp(epoch.secs, epoch.nanos)
            .ok_or(ValidationError::InvalidTimestamp)?;
        let local = utc.with_timezone(&self.offset);
        if local.year() > MAX_CANONICAL_YEAR {
            return Err(ValidationError::InvalidTimestamp);
        }

        Ok(CanonicalTimestamp(local.format(CANONICAL_FORMAT).to_string()))
    }
}

/// Normalizes with the default UTC+8 offset.
pub fn normalize(raw: &str) -> Result<CanonicalTimestamp, ValidationError> {
    TimestampNormalizer::default().normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::{normalize, EpochSeconds, TimestampNormalizer};
    use crate::errors::ValidationError;

    #[test]
    fn normalizes_known_slack_timestamps_to_manila_time() {
        assert_eq!(normalize("1727689594").expect("valid").as_str(), "2024-09-30 17:46:34");
        assert_eq!(normalize("1727689723").expect("valid").as_str(), "2024-09-30 17:48:43");
    }

    #[test]
    fn fractional_seconds_are_truncated_not_rounded() {
        assert_eq!(normalize("1727689594.999999").expect("valid").as_str(), "2024-09-30 17:46:34");
        assert_eq!(normalize("1727689594.5").expect("valid").as_str(), "2024-09-30 17:46:34");
    }

    #[test]
    fn epoch_zero_crosses_into_manila_morning() {
        assert_eq!(normalize("0").expect("valid").as_str(), "1970-01-01 08:00:00");
    }

    #[test]
    fn date_rolls_over_at_manila_midnight() {
        // 2024-09-30T16:00:00Z is midnight in UTC+8.
        assert_eq!(normalize("1727712000").expect("valid").as_str(), "2024-10-01 00:00:00");
        assert_eq!(normalize("1727711999").expect("valid").as_str(), "2024-09-30 23:59:59");
    }

    #[test]
    fn rejects_malformed_values() {
        for raw in ["", "abc", "-5", "1.2.3", " 17", "17 ", "+17", "1e9", ".5", "5.", "0x10"] {
            assert_eq!(
                normalize(raw),
                Err(ValidationError::InvalidTimestamp),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn rejects_values_beyond_the_calendar_range() {
        assert_eq!(normalize("99999999999999999999999"), Err(ValidationError::InvalidTimestamp));
        assert_eq!(normalize("9223372036854775807"), Err(ValidationError::InvalidTimestamp));
        // 10000-01-01 00:00:00 in UTC+8 no longer fits the four-digit year format.
        assert_eq!(normalize("253402272000"), Err(ValidationError::InvalidTimestamp));
    }

    #[test]
    fn last_four_digit_year_second_is_accepted() {
        assert_eq!(normalize("253402271999").expect("valid").as_str(), "9999-12-31 23:59:59");
    }

    #[test]
    fn custom_offset_is_honoured() {
        let utc = TimestampNormalizer::from_offset_hours(0).expect("offset");
        assert_eq!(utc.normalize("1727689594").expect("valid").as_str(), "2024-09-30 09:46:34");

        let honolulu = TimestampNormalizer::from_offset_hours(-10).expect("offset");
        assert_eq!(
            honolulu.normalize("1727689594").expect("valid").as_str(),
            "2024-09-29 23:46:34"
        );
    }

    #[test]
    fn out_of_range_offsets_are_refused() {
        assert!(TimestampNormalizer::from_offset_hours(25).is_none());
        assert!(TimestampNormalizer::from_offset_hours(i32::MAX).is_none());
    }

    #[test]
    fn epoch_parse_keeps_sub_second_precision() {
        let parsed = EpochSeconds::parse("1727689594.25").expect("valid");
        assert_eq!(parsed.secs, 1_727_689_594);
        assert_eq!(parsed.nanos, 250_000_000);

        let long = EpochSeconds::parse("1.1234567891").expect("valid");
        assert_eq!(long.nanos, 123_456_789);
    }
}
