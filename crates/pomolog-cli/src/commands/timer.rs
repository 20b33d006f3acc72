use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use pomolog_core::format::format_mmss;
use pomolog_core::storage::TimerConfig;
use pomolog_core::TimerPhase;

use crate::session::{announce, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a countdown (resumes instead if paused)
    Start {
        /// Duration in minutes; defaults to timer.default_minutes
        #[arg(short, long, conflicts_with = "preset")]
        minutes: Option<f64>,
        /// Use the Nth entry of timer.presets (see `timer presets`)
        #[arg(short, long)]
        preset: Option<usize>,
        /// Free-text label recorded with the interval
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Discard the current countdown without recording it
    Reset,
    /// Print current timer state as JSON, completing a due run
    Status,
    /// Poll until the countdown finishes, showing the remaining time
    Watch,
    /// List the configured duration presets
    Presets,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;

    let event = match action {
        TimerAction::Start {
            minutes,
            preset,
            note,
        } => {
            if session.engine.phase() == TimerPhase::Paused {
                session.engine.resume()?
            } else {
                let minutes = resolve_minutes(&session.config.timer, minutes, preset)?;
                session.engine.start(minutes, note.trim())?
            }
        }
        TimerAction::Pause => session.engine.pause()?,
        TimerAction::Resume => session.engine.resume()?,
        TimerAction::Reset => session.engine.reset()?,
        TimerAction::Status => session.engine.poll(&mut session.records)?,
        TimerAction::Watch => return watch(&mut session),
        TimerAction::Presets => return list_presets(&session.config.timer),
    };

    match event {
        Some(event) => announce(&event)?,
        // Invalid transitions are not errors; show where things stand.
        None => announce(&session.engine.snapshot())?,
    }
    Ok(())
}

fn resolve_minutes(
    timer: &TimerConfig,
    minutes: Option<f64>,
    preset: Option<usize>,
) -> Result<f64, Box<dyn std::error::Error>> {
    match (minutes, preset) {
        (Some(minutes), _) => Ok(minutes),
        (None, Some(index)) => timer.preset_minutes(index).ok_or_else(|| {
            format!(
                "no preset #{index}; {} presets configured",
                timer.presets.len()
            )
            .into()
        }),
        (None, None) => Ok(timer.default_minutes),
    }
}

fn list_presets(timer: &TimerConfig) -> Result<(), Box<dyn std::error::Error>> {
    for (idx, minutes) in timer.presets.iter().enumerate() {
        let marker = if f64::from(*minutes) == timer.default_minutes {
            "  (default)"
        } else {
            ""
        };
        println!("{:>2}. {minutes} min{marker}", idx + 1);
    }
    Ok(())
}

fn watch(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let interval = Duration::from_millis(session.config.timer.poll_interval_ms);
    let mut last_shown = None;
    loop {
        if let Some(event) = session.engine.poll(&mut session.records)? {
            eprintln!();
            return announce(&event);
        }
        if session.engine.phase() != TimerPhase::Running {
            return announce(&session.engine.snapshot());
        }
        let remaining = session.engine.query_remaining();
        if last_shown != Some(remaining) {
            eprint!("\r{} ", format_mmss(remaining));
            std::io::stderr().flush()?;
            last_shown = Some(remaining);
        }
        std::thread::sleep(interval);
    }
}
