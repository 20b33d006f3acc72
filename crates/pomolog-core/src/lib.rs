//! # Pomolog Core Library
//!
//! This library provides the core logic for Pomolog, a single-session
//! countdown timer that turns finished intervals into an activity log.
//! Hosts (the bundled CLI, or any GUI) drive it and render its state.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. It stores absolute
//!   start/end instants and recomputes remaining time on every query, so it
//!   survives sleep, suspension and restarts. The caller polls it.
//! - **Record Store**: Append-only log keyed by `<device>_<start_ms>`, with
//!   per-day, JSON and CSV exports and merge-by-union import.
//! - **Storage**: A small key-value port with in-memory, file and SQLite
//!   backends, plus TOML-based configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`RecordStore`]: Activity log persistence, export and import
//! - [`KvStore`]: Persistence port
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod records;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use format::{Locale, Zone};
pub use records::{ExportPayload, ImportSource, MergeSummary, Record, RecordStore};
pub use storage::{Config, FileStore, KvStore, MemoryStore, SharedStore, SqliteStore};
pub use timer::{TimerEngine, TimerPhase, TimerState};
