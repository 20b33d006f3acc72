use std::path::PathBuf;

use clap::Args;

use crate::session::{block_on, Session};

#[derive(Args)]
pub struct ImportArgs {
    /// JSON exports or bare record arrays
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let summary = block_on(session.records.import_files(&args.files))??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "read {}/{} files, added {} records, {} total",
            summary.parsed, summary.sources, summary.added, summary.total
        );
    }
    Ok(())
}
