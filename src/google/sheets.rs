use super::{api_url, send_authorized, ServiceAccountAuth};
use crate::error::{RsvpError, RsvpResult};
use crate::store::{CellUpdate, SheetStore};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google Sheets v4 values API.
pub struct GoogleSheets {
    client: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    spreadsheet_id: Option<String>,
}

impl GoogleSheets {
    pub fn new(client: reqwest::Client, auth: Arc<ServiceAccountAuth>, spreadsheet_id: Option<String>) -> Self {
        Self {
            client,
            auth,
            spreadsheet_id,
        }
    }

    fn spreadsheet_id(&self) -> RsvpResult<&str> {
        self.spreadsheet_id.as_deref().ok_or_else(|| {
            RsvpError::configuration(
                "Missing Google Sheet ID. Set GOOGLE_SHEETS_SPREADSHEET_ID or GOOGLE_SHEETS_SPREADSHEET_URL, and share the sheet with the service account email.",
            )
        })
    }

    async fn get_values(&self, range: &str, major_dimension: &str) -> RsvpResult<Vec<Vec<String>>> {
        let url = api_url(SHEETS_API_BASE, &[self.spreadsheet_id()?, "values", range])?;
        debug!("Reading range {} ({})", range, major_dimension);

        let request = self.client.get(url).query(&[("majorDimension", major_dimension)]);
        let body: ValueRange = send_authorized(&self.auth, request).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|line| line.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn read_column(&self, range: &str) -> RsvpResult<Vec<String>> {
        let mut columns = self.get_values(range, "COLUMNS").await?;
        Ok(if columns.is_empty() { Vec::new() } else { columns.swap_remove(0) })
    }

    async fn read_rows(&self, range: &str) -> RsvpResult<Vec<Vec<String>>> {
        self.get_values(range, "ROWS").await
    }

    async fn batch_update(&self, updates: &[CellUpdate]) -> RsvpResult<()> {
        let url = api_url(SHEETS_API_BASE, &[self.spreadsheet_id()?, "values:batchUpdate"])?;
        let data: Vec<Value> = updates
            .iter()
            .map(|update| json!({ "range": update.range, "values": [[update.value]] }))
            .collect();
        debug!("Writing {} cells", data.len());

        let request = self.client.post(url).json(&json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        }));
        send_authorized(&self.auth, request).await?;
        Ok(())
    }
}
