use serde::{Deserialize, Serialize};

use crate::format::{self, Locale, Zone};

/// One completed interval in the activity log. Immutable once created.
///
/// Field names are part of the export format and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// `<device_id>_<start_ms>`; the dedup key.
    pub id: String,
    pub device_id: String,
    /// Local calendar date the interval started, `YYYY-MM-DD`.
    pub date_key: String,
    pub weekday: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Local `HH:MM` snapshots taken when the record was created.
    pub start_hm: String,
    pub end_hm: String,
    pub note: String,
}

impl Record {
    /// Build a record for a run on `device_id`, deriving the date, weekday and
    /// clock-time snapshots in `zone`. The note is trimmed.
    pub fn from_run(
        device_id: &str,
        start_ms: i64,
        end_ms: i64,
        note: &str,
        zone: Zone,
        locale: Locale,
    ) -> Self {
        let date_key = format::date_key(start_ms, zone);
        let weekday = format::weekday_name(&date_key, locale)
            .unwrap_or_default()
            .to_string();
        Self {
            id: format::record_id(device_id, start_ms),
            device_id: device_id.to_string(),
            date_key,
            weekday,
            start_ms,
            end_ms,
            start_hm: format::format_hm(start_ms, zone),
            end_hm: format::format_hm(end_ms, zone),
            note: note.trim().to_string(),
        }
    }

    /// Ordering used for every materialized view of the log.
    pub(crate) fn sort_key(&self) -> (i64, &str) {
        (self.start_ms, self.id.as_str())
    }
}
