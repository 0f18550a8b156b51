#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wedding_rsvp::config::UpdateModeSettings;
use wedding_rsvp::notify::{EmailMessage, Mailer, Notifier};
use wedding_rsvp::store::{CellUpdate, DocumentLog, SheetStore};
use wedding_rsvp::{RsvpError, RsvpResult};

/// In-memory guest-list sheet recording every call made against it.
#[derive(Default)]
pub struct FakeSheets {
    pub names: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub reads: AtomicUsize,
    pub writes: Mutex<Vec<Vec<CellUpdate>>>,
}

impl FakeSheets {
    pub fn with_names(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<Vec<CellUpdate>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetStore for FakeSheets {
    async fn read_column(&self, _range: &str) -> RsvpResult<Vec<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(RsvpError::backing_store("read refused"));
        }
        Ok(self.names.clone())
    }

    async fn read_rows(&self, _range: &str) -> RsvpResult<Vec<Vec<String>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(RsvpError::backing_store("read refused"));
        }
        Ok(self.rows.clone())
    }

    async fn batch_update(&self, updates: &[CellUpdate]) -> RsvpResult<()> {
        if self.fail_writes {
            return Err(RsvpError::backing_store("write refused"));
        }
        self.writes.lock().unwrap().push(updates.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDocument {
    pub fail: bool,
    pub lines: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentLog for FakeDocument {
    async fn append_lines(&self, lines: &[String]) -> RsvpResult<()> {
        if self.fail {
            return Err(RsvpError::Notification("document unavailable".to_string()));
        }
        self.lines.lock().unwrap().extend_from_slice(lines);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl FakeMailer {
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.subject.clone()).collect()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: EmailMessage) -> RsvpResult<()> {
        if self.fail {
            return Err(RsvpError::Notification("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub fn notifier(mailer: &Arc<FakeMailer>) -> Notifier {
    let mailer: Arc<dyn Mailer> = mailer.clone();
    Notifier::new(
        Some(mailer),
        Some("rsvp@example.com".to_string()),
        Some("couple@example.com".to_string()),
    )
}

pub fn update_mode() -> UpdateModeSettings {
    UpdateModeSettings {
        name_anchor: Some("C5".to_string()),
        attending_col: Some("I".to_string()),
        dietary_col: Some("L".to_string()),
        staying_col: None,
    }
}
