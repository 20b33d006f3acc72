mod engine;
mod state;

pub use engine::TimerEngine;
pub use state::{TimerPhase, TimerState};
