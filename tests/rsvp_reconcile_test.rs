mod common;

use axum::http::StatusCode;
use common::{notifier, update_mode, FakeDocument, FakeMailer, FakeSheets};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wedding_rsvp::config::UpdateModeSettings;
use wedding_rsvp::notify::FAILURE_SUBJECT;
use wedding_rsvp::rsvp::{RsvpService, APPEND_MODE_DISABLED};
use wedding_rsvp::store::CellUpdate;
use wedding_rsvp::RsvpError;

fn service(sheets: &Arc<FakeSheets>, mailer: &Arc<FakeMailer>, document: &Arc<FakeDocument>) -> RsvpService {
    RsvpService::new(sheets.clone(), "Guest List", update_mode())
        .with_notifier(notifier(mailer))
        .with_document_log(document.clone())
}

#[tokio::test]
async fn test_partial_batch_updates_matched_rows() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith", "Bob Smith", "Carol Jones"]));
    let mailer = Arc::new(FakeMailer::default());
    let document = Arc::new(FakeDocument::default());

    let outcome = service(&sheets, &mailer, &document)
        .submit(&json!({
            "responses": [
                {"Name": "alice smith", "Attending": "Yes", "DietaryRestrictions": "vegan"},
                {"Name": "Zed Unknown", "Attending": "No"},
                {"Name": "Carol Jones ", "Attending": "No", "DietaryRestrictions": ""}
            ],
            "ContactEmail": "alice@example.com"
        }))
        .await
        .expect("reconcile succeeds");

    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.not_found, vec!["Zed Unknown"]);

    let writes = sheets.written();
    assert_eq!(writes.len(), 1, "all cells go out in one batch");
    assert_eq!(
        writes[0],
        vec![
            CellUpdate::new("Guest List", "I", 6, "Yes"),
            CellUpdate::new("Guest List", "L", 6, "vegan"),
            CellUpdate::new("Guest List", "I", 8, "No"),
            CellUpdate::new("Guest List", "L", 8, ""),
        ]
    );

    assert_eq!(document.lines.lock().unwrap().len(), 3);
    let mut subjects = mailer.subjects();
    subjects.sort();
    assert_eq!(subjects, vec!["RSVP (party, 3 guests)", "RSVP received — thank you!"]);
}

#[tokio::test]
async fn test_unknown_guest_never_creates_rows() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith"]));
    let mailer = Arc::new(FakeMailer::default());
    let document = Arc::new(FakeDocument::default());

    let outcome = service(&sheets, &mailer, &document)
        .submit(&json!({"Name": "Mallory", "Attending": "Yes"}))
        .await
        .expect("reconcile succeeds");

    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.not_found, vec!["Mallory"]);
    assert!(sheets.written().is_empty());
}

#[tokio::test]
async fn test_blank_party_member_is_not_written_to_empty_row() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith", "", "Bob Smith"]));
    let mailer = Arc::new(FakeMailer::default());
    let document = Arc::new(FakeDocument::default());

    let outcome = service(&sheets, &mailer, &document)
        .submit(&json!({"responses": [{"Name": "  ", "Attending": "Yes"}]}))
        .await
        .expect("reconcile succeeds");

    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.not_found, vec!["  "]);
    assert!(sheets.written().is_empty());
}

#[tokio::test]
async fn test_missing_update_mode_is_a_configuration_error() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith"]));
    let mailer = Arc::new(FakeMailer::default());
    let service = RsvpService::new(sheets.clone(), "Guest List", UpdateModeSettings::default())
        .with_notifier(notifier(&mailer));

    let err = service
        .submit(&json!({"Name": "Alice Smith", "Attending": "Yes"}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.root().to_string(), APPEND_MODE_DISABLED);
    assert_eq!(sheets.read_count(), 0);
    assert!(sheets.written().is_empty());
    assert_eq!(mailer.subjects(), vec![FAILURE_SUBJECT]);
}

#[tokio::test]
async fn test_store_failure_sends_failure_notice() {
    let sheets = Arc::new(FakeSheets {
        fail_writes: true,
        ..FakeSheets::with_names(&["Alice Smith"])
    });
    let mailer = Arc::new(FakeMailer::default());
    let document = Arc::new(FakeDocument::default());

    let err = service(&sheets, &mailer, &document)
        .submit(&json!({"Name": "Alice Smith", "Attending": "Yes", "ContactEmail": "alice@example.com"}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(matches!(err.root(), RsvpError::BackingStore(_)));
    assert_eq!(mailer.subjects(), vec![FAILURE_SUBJECT]);
    assert!(mailer.sent.lock().unwrap()[0].body.contains("\"Name\":\"Alice Smith\""));
    assert!(document.lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_failures_are_not_surfaced() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith"]));
    let mailer = Arc::new(FakeMailer {
        fail: true,
        ..FakeMailer::default()
    });
    let document = Arc::new(FakeDocument {
        fail: true,
        ..FakeDocument::default()
    });

    let outcome = service(&sheets, &mailer, &document)
        .submit(&json!({"Name": "Alice Smith", "Attending": "no", "ContactEmail": "alice@example.com"}))
        .await
        .expect("notification failures are swallowed");

    assert_eq!(outcome.updated, 1);
    assert_eq!(sheets.written().len(), 1);
}

#[tokio::test]
async fn test_guest_confirmation_needs_contact_email() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith"]));
    let mailer = Arc::new(FakeMailer::default());
    let document = Arc::new(FakeDocument::default());

    service(&sheets, &mailer, &document)
        .submit(&json!({"Name": "Alice Smith", "Attending": "Yes", "Email": "alice@example.com"}))
        .await
        .expect("reconcile succeeds");

    assert_eq!(mailer.subjects(), vec!["RSVP (Alice Smith)"]);
    let lines = document.lines.lock().unwrap();
    assert!(lines[0].starts_with("RSVP — Alice Smith | alice@example.com | Attending: Yes"));
}

#[tokio::test]
async fn test_empty_submission_is_rejected_before_any_read() {
    let sheets = Arc::new(FakeSheets::with_names(&["Alice Smith"]));
    let mailer = Arc::new(FakeMailer::default());
    let document = Arc::new(FakeDocument::default());

    let err = service(&sheets, &mailer, &document)
        .submit(&json!({"responses": []}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(sheets.read_count(), 0);
}
