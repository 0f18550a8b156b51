use super::{api_url, send_authorized, ServiceAccountAuth};
use crate::error::{RsvpError, RsvpResult};
use crate::store::DocumentLog;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1/documents";

/// Appends RSVP lines to the end of a Google Doc.
pub struct GoogleDocs {
    client: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    document_id: String,
}

impl GoogleDocs {
    pub fn new(client: reqwest::Client, auth: Arc<ServiceAccountAuth>, document_id: String) -> Self {
        Self {
            client,
            auth,
            document_id,
        }
    }
}

#[async_trait]
impl DocumentLog for GoogleDocs {
    async fn append_lines(&self, lines: &[String]) -> RsvpResult<()> {
        let endpoint = format!("{}:batchUpdate", self.document_id);
        let url = api_url(DOCS_API_BASE, &[endpoint.as_str()])?;
        let requests: Vec<Value> = lines
            .iter()
            .map(|line| json!({ "insertText": { "endOfSegmentLocation": {}, "text": format!("{}\n", line) } }))
            .collect();

        let request = self.client.post(url).json(&json!({ "requests": requests }));
        send_authorized(&self.auth, request)
            .await
            .map_err(|e| RsvpError::Notification(format!("Document log append failed: {}", e)))?;
        Ok(())
    }
}
