//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `poll()` on a
//! short interval while running, and again whenever it wakes from
//! suspension.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |            |
//!           +-- finish --+--> Idle (record appended)
//! any -- reset --> Idle
//! ```
//!
//! Every transition is persisted before it takes effect in memory, so a
//! failed write leaves the engine exactly as it was.
//!
//! ## Usage
//!
//! ```ignore
//! let (mut engine, recovered) = TimerEngine::restore(store, clock, &mut records)?;
//! engine.start(25.0, "write report")?;
//! // In a loop:
//! engine.poll(&mut records)?; // Returns Some(Event::TimerCompleted) once
//! ```

use std::sync::Arc;

use super::state::{end_after, TimerPhase, TimerState};
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::{event_time, Event};
use crate::records::RecordStore;
use crate::storage::{SharedStore, TIMER_STATE_KEY};

/// Core timer engine.
///
/// Owns the single optional [`TimerState`]; `None` means idle.
pub struct TimerEngine {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    state: Option<TimerState>,
}

impl TimerEngine {
    /// Create an idle engine without reading persisted state.
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            state: None,
        }
    }

    /// Load any persisted timer state.
    ///
    /// Unparsable or inconsistent state is discarded and the engine starts
    /// idle. Does not finish an overdue run; see [`TimerEngine::restore`].
    ///
    /// # Errors
    /// Returns an error only if the store itself cannot be read.
    pub fn load(store: SharedStore, clock: Arc<dyn Clock>) -> Result<Self> {
        let state = match store.load(TIMER_STATE_KEY)? {
            None => None,
            Some(raw) => match serde_json::from_str::<TimerState>(&raw) {
                Ok(state) if state.is_consistent() => Some(state),
                Ok(_) => {
                    tracing::warn!("persisted timer state is inconsistent, starting idle");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "persisted timer state is corrupt, starting idle");
                    None
                }
            },
        };
        Ok(Self {
            store,
            clock,
            state,
        })
    }

    /// Load persisted state and apply the recovery contract: a run whose
    /// end passed while nobody was watching is finished immediately.
    pub fn restore(
        store: SharedStore,
        clock: Arc<dyn Clock>,
        records: &mut RecordStore,
    ) -> Result<(Self, Option<Event>)> {
        let mut engine = Self::load(store, clock)?;
        let recovered = engine.poll(records)?;
        if recovered.is_some() {
            tracing::info!("recovered a run that ended while the process was down");
        }
        Ok((engine, recovered))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.state
            .as_ref()
            .map(TimerState::phase)
            .unwrap_or(TimerPhase::Idle)
    }

    pub fn state(&self) -> Option<&TimerState> {
        self.state.as_ref()
    }

    /// Seconds left now: 0 when idle, the snapshot when paused, and the
    /// rounded-up distance to the scheduled end when running.
    pub fn query_remaining(&self) -> u64 {
        let now = self.clock.now_ms();
        self.state
            .as_ref()
            .map(|s| s.remaining_at(now))
            .unwrap_or(0)
    }

    /// Whether a running countdown has reached zero and awaits `finish()`.
    pub fn is_due(&self) -> bool {
        self.phase() == TimerPhase::Running && self.query_remaining() == 0
    }

    pub fn total_secs(&self) -> u64 {
        self.state.as_ref().map(|s| s.total_secs).unwrap_or(0)
    }

    /// 0.0 .. 1.0 fraction of the run already elapsed.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        let remaining = self.query_remaining().min(total);
        1.0 - (remaining as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let state = self.state.as_ref();
        Event::StateSnapshot {
            state: self.phase(),
            remaining_secs: self.query_remaining(),
            total_secs: self.total_secs(),
            note: state.map(|s| s.note.clone()).unwrap_or_default(),
            end_at_ms: state.filter(|s| s.running).map(|s| s.end_at_ms),
            at: event_time(self.clock.now_ms()),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a countdown of `minutes` from idle.
    ///
    /// # Errors
    /// Rejects non-finite or non-positive durations, and durations whose end
    /// instant cannot be represented, without touching state.
    pub fn start(&mut self, minutes: f64, note: &str) -> Result<Option<Event>> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(ValidationError::InvalidDuration(minutes).into());
        }
        if self.state.is_some() {
            return Ok(None);
        }

        // Saturates for huge inputs; `end_after` then rejects them.
        let total_secs = ((minutes * 60.0).floor() as u64).max(1);
        let now = self.clock.now_ms();
        let end_at_ms =
            end_after(now, total_secs).ok_or(ValidationError::InvalidDuration(minutes))?;
        let next = TimerState {
            running: true,
            total_secs,
            start_at_ms: now,
            end_at_ms,
            note: note.to_string(),
            paused_remaining_secs: None,
        };
        let event = Event::TimerStarted {
            total_secs,
            start_at_ms: next.start_at_ms,
            end_at_ms: next.end_at_ms,
            note: next.note.clone(),
            at: event_time(now),
        };
        self.commit(Some(next))?;
        tracing::info!(total_secs, "timer started");
        Ok(Some(event))
    }

    pub fn pause(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.state.as_ref().filter(|s| s.running) else {
            return Ok(None);
        };
        let now = self.clock.now_ms();
        let remaining_secs = current.remaining_at(now);
        let next = TimerState {
            running: false,
            paused_remaining_secs: Some(remaining_secs),
            ..current.clone()
        };
        self.commit(Some(next))?;
        tracing::info!(remaining_secs, "timer paused");
        Ok(Some(Event::TimerPaused {
            remaining_secs,
            at: event_time(now),
        }))
    }

    pub fn resume(&mut self) -> Result<Option<Event>> {
        let Some(current) = self.state.as_ref().filter(|s| !s.running) else {
            return Ok(None);
        };
        let now = self.clock.now_ms();
        let remaining_secs = current.paused_remaining_secs.unwrap_or(0);
        let end_at_ms = end_after(now, remaining_secs)
            .ok_or(ValidationError::InvalidDuration(remaining_secs as f64 / 60.0))?;
        let next = TimerState {
            running: true,
            end_at_ms,
            paused_remaining_secs: None,
            ..current.clone()
        };
        self.commit(Some(next))?;
        tracing::info!(remaining_secs, "timer resumed");
        Ok(Some(Event::TimerResumed {
            remaining_secs,
            end_at_ms,
            at: event_time(now),
        }))
    }

    /// Discard the current run from any state. Emits no record.
    pub fn reset(&mut self) -> Result<Option<Event>> {
        let was_active = self.state.is_some();
        self.commit(None)?;
        if was_active {
            tracing::info!("timer reset");
        }
        Ok(Some(Event::TimerReset {
            at: event_time(self.clock.now_ms()),
        }))
    }

    /// Call periodically and on wake. Returns `Some(Event::TimerCompleted)`
    /// once when the run finishes.
    pub fn poll(&mut self, records: &mut RecordStore) -> Result<Option<Event>> {
        if self.is_due() {
            return self.finish(records);
        }
        Ok(None)
    }

    /// Record the finished run and return to idle.
    ///
    /// A no-op unless running with nothing left. The record id depends only
    /// on the device and the start instant, so repeating this for the same
    /// run (for instance after a crash between the record write and the
    /// state clear) never duplicates the entry. The completion event is
    /// returned only when the record was newly added.
    pub fn finish(&mut self, records: &mut RecordStore) -> Result<Option<Event>> {
        if !self.is_due() {
            return Ok(None);
        }
        let Some(current) = self.state.clone() else {
            return Ok(None);
        };

        let now = self.clock.now_ms();
        let record = records.new_record(current.start_at_ms, now, &current.note);
        let record_id = record.id.clone();
        let note = record.note.clone();
        let added = records.append(record)?;
        self.commit(None)?;

        if !added {
            tracing::debug!(%record_id, "run was already recorded");
            return Ok(None);
        }
        tracing::info!(%record_id, "interval completed");
        Ok(Some(Event::TimerCompleted {
            record_id,
            note,
            start_at_ms: current.start_at_ms,
            end_at_ms: now,
            at: event_time(now),
        }))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn commit(&mut self, next: Option<TimerState>) -> Result<()> {
        match &next {
            Some(state) => {
                let json = serde_json::to_string(state)?;
                self.store.save(TIMER_STATE_KEY, &json)?;
            }
            None => self.store.remove(TIMER_STATE_KEY)?,
        }
        tracing::debug!(phase = ?next.as_ref().map(TimerState::phase), "timer state persisted");
        self.state = next;
        Ok(())
    }
}
