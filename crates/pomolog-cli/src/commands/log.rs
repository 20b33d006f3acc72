use clap::Subcommand;
use pomolog_core::format::weekday_name;
use pomolog_core::Record;

use crate::session::Session;

#[derive(Subcommand)]
pub enum LogAction {
    /// Records from today
    Today {
        #[arg(long)]
        json: bool,
    },
    /// All records, or one day's with --date
    List {
        /// Date key (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Most recent first
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        json: bool,
    },
    /// One line per day with its record count
    Days,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let records = &session.records;

    match action {
        LogAction::Today { json } => {
            let today = session.today_key();
            let weekday = weekday_name(&today, records.locale())?;
            let items = records.list_by_date(&today);
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                println!("{today} ({weekday})");
                if items.is_empty() {
                    println!("No records yet. Finished countdowns are logged here.");
                }
                print_lines(&items);
            }
        }
        LogAction::List { date, desc, json } => {
            let mut items: Vec<&Record> = match &date {
                Some(date) => {
                    pomolog_core::format::parse_date_key(date)?;
                    records.list_by_date(date)
                }
                None => records.list_all().iter().collect(),
            };
            if desc {
                items.reverse();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_lines(&items);
            }
        }
        LogAction::Days => {
            for (date, items) in records.group_by_date().into_iter().rev() {
                let weekday = items.first().map(|r| r.weekday.as_str()).unwrap_or_default();
                println!("{date} {weekday:<10} {}", items.len());
            }
        }
    }
    Ok(())
}

fn print_lines(items: &[&Record]) {
    for r in items {
        println!(
            "{} {} {} - {}  {}",
            r.date_key, r.weekday, r.start_hm, r.end_hm, r.note
        );
    }
}
