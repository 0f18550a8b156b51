//! Google Sheets and Docs clients over the REST APIs.

mod auth;
mod docs;
mod sheets;

pub use auth::*;
pub use docs::*;
pub use sheets::*;

use crate::error::{RsvpError, RsvpResult};
use reqwest::{RequestBuilder, Response};
use url::Url;

/// Build a URL by appending percent-encoded path segments to `base`.
pub(crate) fn api_url(base: &str, segments: &[&str]) -> RsvpResult<Url> {
    let mut url = Url::parse(base).map_err(|e| RsvpError::configuration(format!("Invalid API base URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| RsvpError::configuration(format!("API base URL cannot take a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send an authorized request and turn non-2xx responses into errors.
pub(crate) async fn send_authorized(auth: &ServiceAccountAuth, request: RequestBuilder) -> RsvpResult<Response> {
    let token = auth.access_token().await?;
    let response = request.bearer_auth(token).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(RsvpError::backing_store(format!("Google API returned {}: {}", status, error_text)));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_encodes_ranges() -> RsvpResult<()> {
        let url = api_url(SHEETS_API_BASE, &["abc123", "values", "'Guest List'!C6:C"])?;
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Guest%20List'!C6:C"
        );

        let url = api_url(DOCS_API_BASE, &["doc-1:batchUpdate"])?;
        assert_eq!(url.as_str(), "https://docs.googleapis.com/v1/documents/doc-1:batchUpdate");
        Ok(())
    }
}
