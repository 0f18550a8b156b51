use super::{reconcile, ReconcileOutcome, RsvpResponse, RsvpSubmission, UpdateTarget};
use crate::config::UpdateModeSettings;
use crate::error::{ReconcilePhase, RsvpError, RsvpResult};
use crate::notify::{document_log_lines, Notifier};
use crate::store::{DocumentLog, SheetStore};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Runs one RSVP submission end to end: validation, reconciliation against
/// the sheet, then the best-effort document log and emails.
pub struct RsvpService {
    sheets: Arc<dyn SheetStore>,
    document_log: Option<Arc<dyn DocumentLog>>,
    notifier: Notifier,
    tab: String,
    update: UpdateModeSettings,
    timezone: Tz,
}

struct Received {
    request_id: Uuid,
    at: DateTime<Utc>,
    timezone: Tz,
}

impl Received {
    fn iso(&self) -> String {
        self.at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn local(&self) -> String {
        self.at
            .with_timezone(&self.timezone)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string()
    }
}

impl RsvpService {
    pub fn new(sheets: Arc<dyn SheetStore>, tab: impl Into<String>, update: UpdateModeSettings) -> Self {
        Self {
            sheets,
            document_log: None,
            notifier: Notifier::disabled(),
            tab: tab.into(),
            update,
            timezone: Tz::UTC,
        }
    }

    pub fn with_document_log(mut self, document_log: Arc<dyn DocumentLog>) -> Self {
        self.document_log = Some(document_log);
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Handle a raw RSVP payload. Only validation, configuration and
    /// backing-store failures are returned; notification problems are logged.
    pub async fn submit(&self, payload: &Value) -> RsvpResult<ReconcileOutcome> {
        let received = Received {
            request_id: Uuid::new_v4(),
            at: Utc::now(),
            timezone: self.timezone,
        };
        info!("RSVP[{}]: Submission received", received.request_id);

        match self.process(payload, &received).await {
            Ok(outcome) => {
                debug!("RSVP[{}]: {}", received.request_id, ReconcilePhase::Done);
                Ok(outcome)
            }
            Err(e) => {
                error!("RSVP[{}]: {}", received.request_id, e);
                match self.notifier.send_failure_notice(payload, &received.iso()).await {
                    Ok(true) => info!("RSVP[{}]: Failure notice sent", received.request_id),
                    Ok(false) => {}
                    Err(notify_err) => {
                        error!("RSVP[{}]: Failure notice failed: {}", received.request_id, notify_err)
                    }
                }
                Err(e)
            }
        }
    }

    async fn process(&self, payload: &Value, received: &Received) -> RsvpResult<ReconcileOutcome> {
        let id = received.request_id;
        debug!("RSVP[{}]: {}", id, ReconcilePhase::Validating);

        let target = UpdateTarget::from_settings(&self.tab, &self.update)
            .map_err(|e| e.in_phase(ReconcilePhase::Validating))?;
        let submission: RsvpSubmission = serde_json::from_value(payload.clone()).map_err(|e| {
            RsvpError::InvalidRequest(format!("Invalid RSVP payload: {}", e)).in_phase(ReconcilePhase::Validating)
        })?;
        let responses = submission
            .responses()
            .map_err(|e| e.in_phase(ReconcilePhase::Validating))?;

        let outcome = reconcile(self.sheets.as_ref(), &target, &responses).await?;
        for name in &outcome.not_found {
            warn!("RSVP[{}]: No guest-list row for '{}'", id, name);
        }
        info!(
            "RSVP[{}]: Updated {} of {} guests",
            id,
            outcome.updated,
            responses.len()
        );

        debug!("RSVP[{}]: {}", id, ReconcilePhase::NotifyingBestEffort);
        self.notify_best_effort(&submission, &responses, received).await;

        Ok(outcome)
    }

    /// The three side effects run concurrently; a failure in one is logged
    /// and has no effect on the others.
    async fn notify_best_effort(&self, submission: &RsvpSubmission, responses: &[RsvpResponse], received: &Received) {
        let id = received.request_id;
        let timestamp = received.iso();

        let document = async {
            let Some(log) = &self.document_log else {
                return;
            };
            let lines = document_log_lines(responses, submission.reply_email(), &timestamp);
            match log.append_lines(&lines).await {
                Ok(()) => debug!("RSVP[{}]: Appended {} lines to document log", id, lines.len()),
                Err(e) => error!("RSVP[{}]: Failed to append to document log: {}", id, e),
            }
        };

        let guest = async {
            let Some(to) = submission.contact_email() else {
                return;
            };
            match self.notifier.send_guest_confirmation(to, responses, &received.local()).await {
                Ok(sent) => debug!("RSVP[{}]: Guest confirmation sent: {}", id, sent),
                Err(e) => error!("RSVP[{}]: Guest confirmation email failed: {}", id, e),
            }
        };

        let internal = async {
            match self
                .notifier
                .send_internal_notice(responses, submission.is_party(), &timestamp)
                .await
            {
                Ok(sent) => debug!("RSVP[{}]: Internal notice sent: {}", id, sent),
                Err(e) => error!("RSVP[{}]: Email notification failed: {}", id, e),
            }
        };

        futures::join!(document, guest, internal);
    }
}
