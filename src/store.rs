//! Backing-store seams: the spreadsheet holding the guest list and the
//! optional document RSVPs are mirrored into.

use crate::error::RsvpResult;
use async_trait::async_trait;
use serde::Serialize;

/// A single-cell write, addressed by an A1 range like `'Guest List'!I12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellUpdate {
    pub range: String,
    pub value: String,
}

impl CellUpdate {
    pub fn new(tab: &str, column: &str, row: usize, value: impl Into<String>) -> Self {
        Self {
            range: format!("{}!{}{}", quote_tab(tab), column, row),
            value: value.into(),
        }
    }
}

/// Quote a tab name for use in an A1 range. Embedded quotes are doubled.
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read a single column range, top to bottom. Trailing empty cells are not returned.
    async fn read_column(&self, range: &str) -> RsvpResult<Vec<String>>;

    /// Read a rectangular range row by row.
    async fn read_rows(&self, range: &str) -> RsvpResult<Vec<Vec<String>>>;

    /// Apply all updates in one call.
    async fn batch_update(&self, updates: &[CellUpdate]) -> RsvpResult<()>;
}

#[async_trait]
pub trait DocumentLog: Send + Sync {
    /// Append each line, newline-terminated, at the end of the document.
    async fn append_lines(&self, lines: &[String]) -> RsvpResult<()>;
}
