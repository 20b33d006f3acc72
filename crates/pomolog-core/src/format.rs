//! Shared formatting and identity helpers.
//!
//! Records store their `HH:MM` and weekday snapshots as strings, so these
//! functions run once at record creation and never again for that record.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Time zone used to derive local calendar dates and clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The operating system's local zone.
    #[default]
    Local,
    /// A fixed offset east of UTC, in minutes.
    Fixed(i32),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(0)
    }

    /// Build from an optional configured offset; `None` means system local.
    pub fn from_offset_minutes(offset: Option<i32>) -> Self {
        offset.map(Zone::Fixed).unwrap_or_default()
    }

    fn to_fixed(self, ms: i64) -> DateTime<FixedOffset> {
        let utc = DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default();
        match self {
            Zone::Local => utc.with_timezone(&Local).fixed_offset(),
            Zone::Fixed(minutes) => {
                let offset = FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix());
                offset.from_utc_datetime(&utc.naive_utc())
            }
        }
    }
}

/// Language for weekday names and document markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn weekday(self, day: Weekday) -> &'static str {
        let idx = day.num_days_from_sunday() as usize;
        match self {
            Locale::En => [
                "Sunday",
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
            ][idx],
            Locale::Zh => [
                "星期日", "星期一", "星期二", "星期三", "星期四", "星期五", "星期六",
            ][idx],
        }
    }

    pub(crate) fn no_records(self) -> &'static str {
        match self {
            Locale::En => "(no records)",
            Locale::Zh => "（无记录）",
        }
    }

    pub(crate) fn no_note(self) -> &'static str {
        match self {
            Locale::En => "(no note)",
            Locale::Zh => "（无备注）",
        }
    }
}

/// `HH:MM` in the given zone.
pub fn format_hm(ms: i64, zone: Zone) -> String {
    zone.to_fixed(ms).format("%H:%M").to_string()
}

/// `YYYY-MM-DD` calendar date in the given zone.
pub fn date_key(ms: i64, zone: Zone) -> String {
    zone.to_fixed(ms).format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date key.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDateKey(key.to_string()))
}

/// Localized weekday name for a date key.
pub fn weekday_name(key: &str, locale: Locale) -> Result<&'static str, ValidationError> {
    Ok(locale.weekday(parse_date_key(key)?.weekday()))
}

/// `MM:SS` countdown display. Minutes are not wrapped at 60.
pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// The dedup key: one run per device per start instant.
pub fn record_id(device_id: &str, start_ms: i64) -> String {
    format!("{device_id}_{start_ms}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-10-19T08:05:00Z, a Monday.
    const MONDAY_MS: i64 = 1_792_397_100_000;

    #[test]
    fn hm_and_date_in_utc() {
        assert_eq!(format_hm(MONDAY_MS, Zone::utc()), "08:05");
        assert_eq!(date_key(MONDAY_MS, Zone::utc()), "2026-10-19");
    }

    #[test]
    fn fixed_offset_can_cross_midnight() {
        // UTC-9 puts 08:05Z on the previous evening.
        let zone = Zone::Fixed(-9 * 60);
        assert_eq!(format_hm(MONDAY_MS, zone), "23:05");
        assert_eq!(date_key(MONDAY_MS, zone), "2026-10-18");
    }

    #[test]
    fn weekday_names_are_localized() {
        assert_eq!(weekday_name("2026-10-19", Locale::En).unwrap(), "Monday");
        assert_eq!(weekday_name("2026-10-18", Locale::Zh).unwrap(), "星期日");
        assert!(weekday_name("19/10/2026", Locale::En).is_err());
    }

    #[test]
    fn mmss_pads_and_does_not_wrap() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(65), "01:05");
        assert_eq!(format_mmss(90 * 60), "90:00");
    }

    #[test]
    fn record_id_joins_device_and_start() {
        assert_eq!(record_id("dev", 123), "dev_123");
    }
}
