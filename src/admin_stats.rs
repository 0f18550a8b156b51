//! Summary of the RSVP response log for the admin dashboard.

use crate::error::RsvpResult;
use crate::store::SheetStore;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

static YES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^y(es)?$").expect("static regex"));
static NO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^no$").expect("static regex"));

pub const RECENT_LIMIT: usize = 10;

// Response log columns
const EMAIL_COL: usize = 1;
const ATTENDING_COL: usize = 2;
const PLUS_ONE_COL: usize = 4;
const TIMESTAMP_COL: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpStats {
    pub total: usize,
    pub yes: usize,
    pub no: usize,
    pub plus_ones: usize,
    pub unique_emails: usize,
    pub last_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub stats: RsvpStats,
    pub recent: Vec<Vec<String>>,
    pub sheet_url: Option<String>,
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|c| c.trim()).unwrap_or("")
}

/// Parse the timestamp formats a response log tends to contain.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%m/%d/%Y, %I:%M:%S %p"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Compute stats over log rows laid out as `[Name, Email, Attending, Dietary, PlusOne, Timestamp]`.
pub fn compute_stats(rows: &[Vec<String>], timezone: Tz) -> (RsvpStats, Vec<Vec<String>>) {
    let has_header = rows
        .first()
        .is_some_and(|first| cell(first, 0) == "Name" && cell(first, EMAIL_COL) == "Email");
    let entries = if has_header { &rows[1..] } else { rows };

    let mut stats = RsvpStats {
        total: entries.len(),
        ..RsvpStats::default()
    };
    let mut emails = HashSet::new();
    let mut last: Option<DateTime<Utc>> = None;

    for row in entries {
        let attending = cell(row, ATTENDING_COL);
        if YES_RE.is_match(attending) {
            stats.yes += 1;
        } else if NO_RE.is_match(attending) {
            stats.no += 1;
        }
        if !cell(row, PLUS_ONE_COL).is_empty() {
            stats.plus_ones += 1;
        }
        let email = cell(row, EMAIL_COL);
        if !email.is_empty() {
            emails.insert(email.to_lowercase());
        }
        if let Some(ts) = parse_timestamp(cell(row, TIMESTAMP_COL)) {
            if last.map_or(true, |current| ts > current) {
                last = Some(ts);
            }
        }
    }

    stats.unique_emails = emails.len();
    stats.last_response = last.map(|ts| {
        ts.with_timezone(&timezone)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string()
    });

    let recent = entries.iter().rev().take(RECENT_LIMIT).cloned().collect();
    (stats, recent)
}

/// Read the response range and build the dashboard report.
pub async fn load_report(
    store: &dyn SheetStore,
    range: &str,
    sheet_url: Option<String>,
    timezone: Tz,
) -> RsvpResult<StatsReport> {
    let rows = store.read_rows(range).await?;
    let (stats, recent) = compute_stats(&rows, timezone);
    Ok(StatsReport {
        stats,
        recent,
        sheet_url,
    })
}
