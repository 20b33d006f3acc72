use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerPhase;

/// Every state change in the system produces an Event.
/// Hosts render snapshots and alert the user on `TimerCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        total_secs: u64,
        start_at_ms: i64,
        end_at_ms: i64,
        note: String,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        end_at_ms: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Fired once per finished interval, after its record is durable.
    TimerCompleted {
        record_id: String,
        note: String,
        start_at_ms: i64,
        end_at_ms: i64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerPhase,
        remaining_secs: u64,
        total_secs: u64,
        note: String,
        end_at_ms: Option<i64>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether a host should alert the user for this event.
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}

/// Event timestamps follow the injected clock rather than the system time.
pub(crate) fn event_time(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}
