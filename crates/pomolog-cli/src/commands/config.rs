use std::error::Error;

use clap::Subcommand;
use pomolog_core::storage::data_dir;
use pomolog_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, e.g. `timer.default_minutes` or `display.locale`
    Get { key: String },
    /// Validate and store a value ("none" clears the UTC offset)
    Set { key: String, value: String },
    /// Print every key with its current value
    List,
    /// Show where config and activity data live
    Path,
    /// Restore defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn Error>> {
    let path = Config::path()?;
    let mut config = Config::load_from(&path)?;
    match action {
        ConfigAction::Get { key } => {
            let value = config.get(&key).ok_or_else(|| unknown_key(&config, &key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            if config.get(&key).is_none() {
                return Err(unknown_key(&config, &key));
            }
            config.apply(&key, &value)?;
            config.save_to(&path)?;
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
        ConfigAction::List => {
            for key in config.keys() {
                println!("{key} = {}", config.get(&key).unwrap_or_default());
            }
        }
        ConfigAction::Path => {
            println!("config: {}", path.display());
            println!("data:   {}", data_dir()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save_to(&path)?;
            println!("defaults written to {}", path.display());
        }
    }
    Ok(())
}

fn unknown_key(config: &Config, key: &str) -> Box<dyn Error> {
    format!("unknown key `{key}`; expected one of: {}", config.keys().join(", ")).into()
}
