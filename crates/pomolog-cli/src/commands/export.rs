use std::path::PathBuf;

use clap::{Args, Subcommand};
use pomolog_core::records::{all_file_name, day_file_name, write_export};

use crate::session::{block_on, Session};

#[derive(Args)]
pub struct Destination {
    /// Write to this file instead of stdout
    #[arg(long, conflicts_with = "dir")]
    out: Option<PathBuf>,
    /// Write into this directory under the default file name
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ExportAction {
    /// One day as a readable document (defaults to today)
    Day {
        /// Date key (YYYY-MM-DD)
        date: Option<String>,
        #[command(flatten)]
        dest: Destination,
    },
    /// Whole log as JSON, suitable for `import`
    Json {
        #[command(flatten)]
        dest: Destination,
    },
    /// Whole log as CSV
    Csv {
        #[command(flatten)]
        dest: Destination,
    },
}

pub fn run(action: ExportAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let records = &session.records;
    let today = session.today_key();

    let (contents, default_name, dest) = match action {
        ExportAction::Day { date, dest } => {
            let date = date.unwrap_or_else(|| today.clone());
            (records.export_day_document(&date)?, day_file_name(&date), dest)
        }
        ExportAction::Json { dest } => (
            records.export_all_json(session.now_ms())?,
            all_file_name(&today, "json"),
            dest,
        ),
        ExportAction::Csv { dest } => (
            records.export_all_table()?,
            all_file_name(&today, "csv"),
            dest,
        ),
    };

    let path = match (dest.out, dest.dir) {
        (Some(out), _) => out,
        (None, Some(dir)) => dir.join(default_name),
        (None, None) => {
            print!("{contents}");
            if !contents.ends_with('\n') {
                println!();
            }
            return Ok(());
        }
    };
    block_on(write_export(&path, &contents))??;
    eprintln!("wrote {}", path.display());
    Ok(())
}
