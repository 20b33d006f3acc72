use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
}

/// The persisted countdown. Absent while idle.
///
/// Holds absolute wall-clock instants rather than a running counter, so
/// remaining time is always recomputed from `end_at_ms` and the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub running: bool,
    /// Configured duration at start time.
    pub total_secs: u64,
    pub start_at_ms: i64,
    /// Scheduled end. Stale while paused; re-anchored on resume.
    pub end_at_ms: i64,
    #[serde(default)]
    pub note: String,
    /// Remaining-time snapshot, present only while paused.
    #[serde(default)]
    pub paused_remaining_secs: Option<u64>,
}

impl TimerState {
    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else {
            TimerPhase::Paused
        }
    }

    /// Seconds left at `now_ms`, rounded up.
    pub fn remaining_at(&self, now_ms: i64) -> u64 {
        if self.running {
            ceil_secs(self.end_at_ms.saturating_sub(now_ms))
        } else {
            self.paused_remaining_secs.unwrap_or(0)
        }
    }

    /// Checks the running/paused invariant for state read back from storage.
    pub(crate) fn is_consistent(&self) -> bool {
        if self.total_secs == 0 {
            return false;
        }
        if self.running {
            self.paused_remaining_secs.is_none() && self.end_at_ms >= self.start_at_ms
        } else {
            self.paused_remaining_secs
                .is_some_and(|secs| secs <= self.total_secs)
        }
    }
}

/// `now_ms + secs` seconds, or `None` when the instant falls outside what
/// the record formatting can represent.
pub(crate) fn end_after(now_ms: i64, secs: u64) -> Option<i64> {
    let span = i64::try_from(secs).ok()?.checked_mul(1000)?;
    let end = now_ms.checked_add(span)?;
    DateTime::<Utc>::from_timestamp_millis(end).map(|_| end)
}

/// `max(0, ceil(ms / 1000))`.
pub(crate) fn ceil_secs(ms: i64) -> u64 {
    if ms <= 0 {
        0
    } else {
        ((ms + 999) / 1000) as u64
    }
}
