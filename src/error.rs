//! Error types for guest lookup and RSVP reconciliation.

use axum::http::StatusCode;
use std::fmt;

/// Phases a single reconciliation call moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Validating,
    Fetching,
    Matching,
    Writing,
    NotifyingBestEffort,
    Done,
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcilePhase::Validating => "validating",
            ReconcilePhase::Fetching => "fetching",
            ReconcilePhase::Matching => "matching",
            ReconcilePhase::Writing => "writing",
            ReconcilePhase::NotifyingBestEffort => "notifying",
            ReconcilePhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Custom error type for RSVP operations
#[derive(Debug, thiserror::Error)]
pub enum RsvpError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Backing store error: {0}")]
    BackingStore(String),
    #[error("Notification failed: {0}")]
    Notification(String),
    #[error("RSVP reconciliation failed while {phase}: {source}")]
    ReconcileFailure {
        phase: ReconcilePhase,
        #[source]
        source: Box<RsvpError>,
    },
}

impl RsvpError {
    pub fn configuration(message: impl Into<String>) -> Self {
        RsvpError::Configuration(message.into())
    }

    pub fn backing_store(message: impl Into<String>) -> Self {
        RsvpError::BackingStore(message.into())
    }

    /// Attach the phase the error surfaced in, keeping the innermost cause.
    pub fn in_phase(self, phase: ReconcilePhase) -> Self {
        match self {
            already @ RsvpError::ReconcileFailure { .. } => already,
            other => RsvpError::ReconcileFailure {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, unwrapping any phase annotation.
    pub fn root(&self) -> &RsvpError {
        match self {
            RsvpError::ReconcileFailure { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            RsvpError::Configuration(_) | RsvpError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for RsvpError {
    fn from(err: reqwest::Error) -> Self {
        RsvpError::BackingStore(err.to_string())
    }
}

pub type RsvpResult<T> = Result<T, RsvpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_root_cause() {
        let config = RsvpError::configuration("Append mode disabled").in_phase(ReconcilePhase::Validating);
        assert_eq!(config.status_code(), StatusCode::BAD_REQUEST);

        let store = RsvpError::backing_store("quota exceeded").in_phase(ReconcilePhase::Writing);
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.to_string().contains("while writing"));
    }

    #[test]
    fn test_in_phase_keeps_first_phase() {
        let err = RsvpError::backing_store("timeout")
            .in_phase(ReconcilePhase::Fetching)
            .in_phase(ReconcilePhase::Writing);
        match err {
            RsvpError::ReconcileFailure { phase, .. } => assert_eq!(phase, ReconcilePhase::Fetching),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
