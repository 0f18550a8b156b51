//! Roster files on disk and the process-lifetime roster cache.

use super::{parse_grid, Guest};
use crate::config::RosterSettings;
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, error, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

pub const WORKBOOK_FILE: &str = "Wedding planner - Guest list.xlsx";
pub const CSV_FILE: &str = "guest-list.csv";
pub const JSON_FILE: &str = "guest-list.json";

/// A candidate roster file, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    Workbook(PathBuf),
    Csv(PathBuf),
    Json(PathBuf),
}

impl RosterSource {
    pub fn path(&self) -> &Path {
        match self {
            RosterSource::Workbook(path) | RosterSource::Csv(path) | RosterSource::Json(path) => path,
        }
    }

    /// Read and parse this source. `Ok(None)` means the file is not there.
    pub fn load(&self, settings: &RosterSettings) -> Result<Option<Vec<Guest>>> {
        if !self.path().exists() {
            return Ok(None);
        }

        let guests = match self {
            RosterSource::Workbook(path) => parse_grid(&read_workbook(path, settings)?),
            RosterSource::Csv(path) => parse_grid(&read_csv(path)?),
            RosterSource::Json(path) => read_json(path)?,
        };
        Ok(Some(guests))
    }
}

pub fn roster_sources(settings: &RosterSettings) -> Vec<RosterSource> {
    vec![
        RosterSource::Workbook(settings.dir.join(WORKBOOK_FILE)),
        RosterSource::Csv(settings.dir.join(CSV_FILE)),
        RosterSource::Json(settings.dir.join(JSON_FILE)),
    ]
}

/// Load the roster from the first source that exists and parses.
///
/// Never fails: unreadable sources are logged and skipped, and with no usable
/// source the roster is empty.
pub fn load_roster(settings: &RosterSettings) -> Vec<Guest> {
    for source in roster_sources(settings) {
        match source.load(settings) {
            Ok(Some(guests)) => {
                info!("Loaded {} guests from {}", guests.len(), source.path().display());
                debug!("Parsed guests (first 3): {:?}", guests.iter().take(3).collect::<Vec<_>>());
                return guests;
            }
            Ok(None) => debug!("Roster source {} not present", source.path().display()),
            Err(e) => error!("Failed reading roster from {}: {:#}", source.path().display(), e),
        }
    }

    info!("No roster source available in {}", settings.dir.display());
    Vec::new()
}

fn read_workbook(path: &Path, settings: &RosterSettings) -> Result<Vec<Vec<String>>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let names = workbook.sheet_names();
    let sheet = pick_sheet(&names, settings).ok_or_else(|| anyhow!("Workbook {} has no sheets", path.display()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Failed to read sheet '{}'", sheet))?;

    Ok(range.rows().map(|row| row.iter().map(cell_text).collect()).collect())
}

/// The configured sheet name if present, else the configured index if in
/// range, else the first sheet.
fn pick_sheet(names: &[String], settings: &RosterSettings) -> Option<String> {
    settings
        .sheet_name
        .as_ref()
        .filter(|wanted| names.contains(*wanted))
        .cloned()
        .or_else(|| settings.sheet_index.and_then(|idx| names.get(idx).cloned()))
        .or_else(|| names.first().cloned())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        // Party numbers are stored as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV {}", path.display()))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed CSV row in {}", path.display()))?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

fn read_json(path: &Path) -> Result<Vec<Guest>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw).context("Guest list is not valid JSON")?;
    let entries = value
        .as_array()
        .ok_or_else(|| anyhow!("Guest list JSON must be an array"))?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            let party = match entry.get("party") {
                Some(Value::String(p)) => Some(p.trim().to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            Some(Guest::new(name, party))
        })
        .collect())
}

type Fingerprint = Vec<(PathBuf, Option<SystemTime>)>;

fn fingerprint(settings: &RosterSettings) -> Fingerprint {
    roster_sources(settings)
        .into_iter()
        .map(|source| {
            let modified = std::fs::metadata(source.path()).and_then(|m| m.modified()).ok();
            (source.path().to_path_buf(), modified)
        })
        .collect()
}

struct CachedRoster {
    fingerprint: Fingerprint,
    guests: Arc<Vec<Guest>>,
}

/// Parsed roster kept for the process lifetime, reloaded whenever any
/// candidate file appears, disappears or changes modification time.
pub struct RosterCache {
    settings: RosterSettings,
    cached: Mutex<Option<CachedRoster>>,
}

impl RosterCache {
    pub fn new(settings: RosterSettings) -> Self {
        Self {
            settings,
            cached: Mutex::new(None),
        }
    }

    pub fn guests(&self) -> Arc<Vec<Guest>> {
        let current = fingerprint(&self.settings);

        if let Ok(cached) = self.cached.lock() {
            if let Some(entry) = cached.as_ref().filter(|entry| entry.fingerprint == current) {
                return Arc::clone(&entry.guests);
            }
        }

        // Parse outside the lock; a concurrent reload just does the same work twice
        let guests = Arc::new(load_roster(&self.settings));
        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some(CachedRoster {
                fingerprint: current,
                guests: Arc::clone(&guests),
            });
        }
        guests
    }
}
