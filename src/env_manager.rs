use log::{info, warn};
use std::env;

/// Variables the RSVP endpoint cannot work without.
pub const REQUIRED_ENV_VARS: &[&str] = &[
    "GOOGLE_SHEETS_CLIENT_EMAIL",
    "GOOGLE_SHEETS_NAME_ANCHOR",
    "GOOGLE_SHEETS_ATTENDING_COL",
    "GOOGLE_SHEETS_DIETARY_COL",
];

// Names of optional environment variables
pub const OPTIONAL_ENV_VARS: &[&str] = &[
    "GOOGLE_SHEETS_PRIVATE_KEY",
    "GOOGLE_SHEETS_PRIVATE_KEY_BASE64",
    "GOOGLE_SHEETS_SPREADSHEET_ID",
    "GOOGLE_SHEETS_SPREADSHEET_URL",
    "RESPONSES_SHEET_URL",
    "GOOGLE_SHEETS_RANGE",
    "GOOGLE_SHEETS_TAB",
    "GOOGLE_SHEETS_STAYING_COL",
    "GOOGLE_DOCS_DOCUMENT_ID",
    "SMTP_HOST",
    "SMTP_PORT",
    "SMTP_SECURE",
    "SMTP_USER",
    "SMTP_PASS",
    "NOTIFY_EMAIL_FROM",
    "NOTIFY_EMAIL_TO",
    "GUESTLIST_DIR",
    "GUESTLIST_SHEET_NAME",
    "GUESTLIST_SHEET_INDEX",
    "HERO_IMAGES_DIR",
    "RSVP_BIND_ADDR",
    "RSVP_HTTP_TIMEOUT_SECS",
    "RSVP_TIMEZONE",
];

/// Load a `.env` file if there is one. A missing file is fine in production
/// where the variables come from the host.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => info!("No .env file found, using process environment"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}

/// Returns false when any required variable is missing or blank.
pub fn check_env_vars() -> bool {
    let mut all_present = true;

    for var in REQUIRED_ENV_VARS {
        if !is_set(var) {
            warn!("Missing required environment variable: {}", var);
            all_present = false;
        }
    }

    if !is_set("GOOGLE_SHEETS_PRIVATE_KEY") && !is_set("GOOGLE_SHEETS_PRIVATE_KEY_BASE64") {
        warn!("Neither GOOGLE_SHEETS_PRIVATE_KEY nor GOOGLE_SHEETS_PRIVATE_KEY_BASE64 is set");
        all_present = false;
    }

    all_present
}

/// Log which variables are set. Values are never printed, only their length.
pub fn print_env_status() {
    info!("Environment variables status:");
    for var in REQUIRED_ENV_VARS.iter().chain(OPTIONAL_ENV_VARS) {
        match env::var(var) {
            Ok(val) if !val.trim().is_empty() => info!("  {} is SET (length: {})", var, val.len()),
            _ => info!("  {} is NOT SET", var),
        }
    }
}

fn is_set(name: &str) -> bool {
    env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}
