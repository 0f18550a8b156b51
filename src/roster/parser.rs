//! Roster parsers for spreadsheet grids.
//!
//! A roster export comes in one of two layouts:
//!
//! * a grid with a recognizable header row somewhere near the top, where only
//!   the first guest of a party block carries the party id ([`HeaderGridParser`]);
//! * a plain table whose first row holds arbitrary column titles, read as keyed
//!   records ([`KeyedRecordParser`]).
//!
//! [`detect_parser`] picks the right one for a grid.

use super::Guest;
use log::debug;
use std::collections::HashMap;

/// How many leading rows are scanned for a header.
pub const HEADER_SCAN_ROWS: usize = 25;

pub const NAME_HEADERS: &[&str] = &["name", "full name", "fullname", "guest", "guest name", "name of guest"];
pub const PARTY_HEADERS: &[&str] = &["party", "group", "household", "family", "party id", "partyid", "party_id"];

const RECORD_NAME_KEYS: &[&str] = &[
    "name",
    "full name",
    "fullname",
    "full_name",
    "guest",
    "guest name",
    "name of guest",
];
const RECORD_FIRST_NAME_KEYS: &[&str] = &["first", "first name", "given name"];
const RECORD_LAST_NAME_KEYS: &[&str] = &["last", "last name", "surname", "family name"];

/// Turns a grid of cell text into guests.
pub trait RosterParser {
    fn parse(&self, grid: &[Vec<String>]) -> Vec<Guest>;

    /// Short label for logging.
    fn layout(&self) -> &'static str;
}

fn header_key(cell: &str) -> String {
    cell.trim().to_lowercase()
}

/// Parser for grids with an explicit header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderGridParser {
    pub header_row: usize,
    pub name_col: usize,
    pub party_col: Option<usize>,
}

impl HeaderGridParser {
    /// Find the first row within the scan window that has a name-like header cell.
    pub fn detect(grid: &[Vec<String>]) -> Option<Self> {
        grid.iter().take(HEADER_SCAN_ROWS).enumerate().find_map(|(row_idx, row)| {
            let keys: Vec<String> = row.iter().map(|c| header_key(c)).collect();
            let name_col = keys.iter().position(|k| NAME_HEADERS.contains(&k.as_str()))?;
            let party_col = keys.iter().position(|k| PARTY_HEADERS.contains(&k.as_str()));
            Some(HeaderGridParser {
                header_row: row_idx,
                name_col,
                party_col,
            })
        })
    }
}

impl RosterParser for HeaderGridParser {
    fn parse(&self, grid: &[Vec<String>]) -> Vec<Guest> {
        let cell = |row: &[String], col: usize| row.get(col).map(|c| c.trim().to_string()).unwrap_or_default();

        // Blank party cells inherit the last party id seen above them
        let (guests, _) = grid.iter().skip(self.header_row + 1).fold(
            (Vec::new(), None::<String>),
            |(mut guests, current_party), row| {
                let name = cell(row, self.name_col);
                if name.is_empty() {
                    return (guests, current_party);
                }

                let raw_party = self.party_col.map(|col| cell(row, col)).unwrap_or_default();
                let party = if raw_party.is_empty() { current_party } else { Some(raw_party) };

                guests.push(Guest::new(name, party.clone()));
                (guests, party)
            },
        );

        guests
    }

    fn layout(&self) -> &'static str {
        "header-grid"
    }
}

/// Parser for tables read as records keyed by the first row.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedRecordParser;

impl KeyedRecordParser {
    fn pick<'a>(record: &HashMap<String, &'a str>, keys: &[&str]) -> Option<&'a str> {
        keys.iter()
            .filter_map(|key| record.get(*key).copied())
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

impl RosterParser for KeyedRecordParser {
    fn parse(&self, grid: &[Vec<String>]) -> Vec<Guest> {
        let Some((header, rows)) = grid.split_first() else {
            return Vec::new();
        };
        let keys: Vec<String> = header.iter().map(|c| header_key(c)).collect();

        rows.iter()
            .filter_map(|row| {
                let mut record: HashMap<String, &str> = HashMap::new();
                for (key, value) in keys.iter().zip(row.iter()) {
                    if !key.is_empty() {
                        record.entry(key.clone()).or_insert(value.as_str());
                    }
                }

                let name = match Self::pick(&record, RECORD_NAME_KEYS) {
                    Some(direct) => direct.to_string(),
                    None => [
                        Self::pick(&record, RECORD_FIRST_NAME_KEYS),
                        Self::pick(&record, RECORD_LAST_NAME_KEYS),
                    ]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" "),
                };
                if name.is_empty() {
                    return None;
                }

                let party = Self::pick(&record, PARTY_HEADERS).map(str::to_string);
                Some(Guest::new(name, party))
            })
            .collect()
    }

    fn layout(&self) -> &'static str {
        "keyed-records"
    }
}

/// Choose the header-grid parser when a header row is found, else keyed records.
pub fn detect_parser(grid: &[Vec<String>]) -> Box<dyn RosterParser + Send + Sync> {
    match HeaderGridParser::detect(grid) {
        Some(parser) => Box::new(parser),
        None => Box::new(KeyedRecordParser),
    }
}

/// Detect the layout and parse in one go.
pub fn parse_grid(grid: &[Vec<String>]) -> Vec<Guest> {
    let parser = detect_parser(grid);
    debug!("Parsing {} roster rows as {}", grid.len(), parser.layout());
    parser.parse(grid)
}
