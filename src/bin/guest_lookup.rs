use anyhow::{anyhow, Result};
use log::info;
use std::path::PathBuf;
use wedding_rsvp::roster::load_roster;
use wedding_rsvp::{env_manager, init_logger, lookup, Settings};

/// Flag overriding the roster directory
const DIR_FLAG: &str = "--dir";

fn main() -> Result<()> {
    init_logger();
    env_manager::load_env_file();

    let mut args = std::env::args().skip(1);
    let mut dir: Option<PathBuf> = None;
    let mut query = Vec::new();
    while let Some(arg) = args.next() {
        if arg == DIR_FLAG {
            let value = args.next().ok_or_else(|| anyhow!("{} needs a directory", DIR_FLAG))?;
            dir = Some(PathBuf::from(value));
        } else {
            query.push(arg);
        }
    }

    if query.is_empty() {
        return Err(anyhow!("Usage: guest_lookup [{} <roster dir>] <name>", DIR_FLAG));
    }

    let mut roster = Settings::from_env()?.roster;
    if let Some(dir) = dir {
        roster.dir = dir;
    }

    let guests = load_roster(&roster);
    info!("Loaded {} guests from {:?}", guests.len(), roster.dir);

    let matches = lookup(&guests, &query.join(" "));
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}
