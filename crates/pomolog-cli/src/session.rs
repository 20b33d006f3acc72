//! Wiring shared by every command: config, store, record log and a
//! recovered timer engine.

use std::error::Error;
use std::sync::Arc;

use pomolog_core::storage::open_store;
use pomolog_core::{format, Clock, Config, Event, RecordStore, SystemClock, TimerEngine};

pub struct Session {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub records: RecordStore,
    pub engine: TimerEngine,
}

impl Session {
    /// Open everything and apply the recovery contract, announcing a run
    /// that finished while nothing was running.
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let store = open_store(&config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let mut records = RecordStore::open(store.clone(), config.zone(), config.locale())?;
        let (engine, recovered) = TimerEngine::restore(store, clock.clone(), &mut records)?;
        if let Some(event) = recovered {
            announce(&event)?;
        }
        Ok(Self {
            config,
            clock,
            records,
            engine,
        })
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn today_key(&self) -> String {
        format::date_key(self.now_ms(), self.config.zone())
    }
}

/// Print an event as JSON; completion also rings the terminal bell.
pub fn announce(event: &Event) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    if let Event::TimerCompleted { note, .. } = event {
        if note.is_empty() {
            eprintln!("\x07Timer finished");
        } else {
            eprintln!("\x07Timer finished: {note}");
        }
    }
    Ok(())
}

/// Run a future on a fresh runtime; file import/export are the only
/// async operations.
pub fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    Ok(runtime.block_on(future))
}
