//! RSVP submissions and their reconciliation into the guest-list sheet.

mod reconcile;
mod service;

pub use reconcile::*;
pub use service::*;

use crate::config::UpdateModeSettings;
use crate::error::{RsvpError, RsvpResult};
use crate::store::quote_tab;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").expect("static regex"));
static COLUMN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("static regex"));

pub const APPEND_MODE_DISABLED: &str = "Append mode disabled. Configure GOOGLE_SHEETS_NAME_ANCHOR, GOOGLE_SHEETS_ATTENDING_COL, and GOOGLE_SHEETS_DIETARY_COL to update existing rows.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attendance {
    #[serde(alias = "yes")]
    Yes,
    #[serde(alias = "no")]
    No,
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attendance::Yes => f.write_str("Yes"),
            Attendance::No => f.write_str("No"),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One guest's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RsvpResponse {
    pub name: String,
    pub attending: Attendance,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dietary_restrictions: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub staying: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_one_name: Option<String>,
}

/// Request body of the RSVP endpoint: either a single guest's fields at the
/// top level or a `responses` array for a whole party.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RsvpSubmission {
    #[serde(rename = "responses", default)]
    pub responses: Option<Vec<RsvpResponse>>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub attending: Option<Attendance>,
    pub dietary_restrictions: Option<String>,
    pub plus_one_name: Option<String>,
    pub staying: Option<String>,
    pub contact_email: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl RsvpSubmission {
    pub fn is_party(&self) -> bool {
        self.responses.as_ref().is_some_and(|list| !list.is_empty())
    }

    /// Flatten either shape into a list of responses.
    pub fn responses(&self) -> RsvpResult<Vec<RsvpResponse>> {
        if let Some(list) = self.responses.as_ref().filter(|list| !list.is_empty()) {
            return Ok(list.clone());
        }

        let name = non_blank(self.name.as_ref())
            .ok_or_else(|| RsvpError::InvalidRequest("No RSVP responses supplied".to_string()))?;
        let attending = self
            .attending
            .ok_or_else(|| RsvpError::InvalidRequest("Attending is required".to_string()))?;

        Ok(vec![RsvpResponse {
            name: name.to_string(),
            attending,
            dietary_restrictions: self.dietary_restrictions.clone().unwrap_or_default(),
            staying: self.staying.clone().unwrap_or_default(),
            plus_one_name: non_blank(self.plus_one_name.as_ref()).map(str::to_string),
        }])
    }

    /// Where the guest confirmation goes.
    pub fn contact_email(&self) -> Option<&str> {
        non_blank(self.contact_email.as_ref())
    }

    /// Address recorded alongside the RSVP in the document log.
    pub fn reply_email(&self) -> Option<&str> {
        non_blank(self.email.as_ref()).or_else(|| self.contact_email())
    }
}

/// Where RSVP fields are written in the guest-list tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTarget {
    pub tab: String,
    pub name_col: String,
    pub header_row: usize,
    pub attending_col: String,
    pub dietary_col: String,
    pub staying_col: Option<String>,
}

fn column(key: &str, raw: &str) -> RsvpResult<String> {
    let raw = raw.trim();
    if COLUMN_RE.is_match(raw) {
        Ok(raw.to_uppercase())
    } else {
        Err(RsvpError::configuration(format!("Invalid {}: {}", key, raw)))
    }
}

impl UpdateTarget {
    /// Validate update-mode settings. There is no append fallback, so missing
    /// settings are a configuration error.
    pub fn from_settings(tab: &str, settings: &UpdateModeSettings) -> RsvpResult<Self> {
        let (Some(anchor), Some(attending), Some(dietary)) = (
            settings.name_anchor.as_deref(),
            settings.attending_col.as_deref(),
            settings.dietary_col.as_deref(),
        ) else {
            return Err(RsvpError::configuration(APPEND_MODE_DISABLED));
        };

        let invalid_anchor = || RsvpError::configuration(format!("Invalid GOOGLE_SHEETS_NAME_ANCHOR: {}", anchor));
        let caps = ANCHOR_RE.captures(anchor.trim()).ok_or_else(invalid_anchor)?;
        let header_row: usize = caps[2].parse().map_err(|_| invalid_anchor())?;
        if header_row == 0 {
            return Err(invalid_anchor());
        }

        Ok(UpdateTarget {
            tab: tab.to_string(),
            name_col: caps[1].to_uppercase(),
            header_row,
            attending_col: column("GOOGLE_SHEETS_ATTENDING_COL", attending)?,
            dietary_col: column("GOOGLE_SHEETS_DIETARY_COL", dietary)?,
            staying_col: settings
                .staying_col
                .as_deref()
                .map(|raw| column("GOOGLE_SHEETS_STAYING_COL", raw))
                .transpose()?,
        })
    }

    pub fn first_data_row(&self) -> usize {
        self.header_row + 1
    }

    /// The open-ended name column range below the header, e.g. `'Guest List'!C6:C`.
    pub fn name_range(&self) -> String {
        format!(
            "{}!{}{}:{}",
            quote_tab(&self.tab),
            self.name_col,
            self.first_data_row(),
            self.name_col
        )
    }
}
