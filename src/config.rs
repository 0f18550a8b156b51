use anyhow::{anyhow, Context, Result};
use base64::Engine;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

static SPREADSHEET_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"spreadsheets/d/([a-zA-Z0-9-_]+)").expect("static regex"));

const DEFAULT_RANGE: &str = "Sheet1!A:F";
const DEFAULT_TAB: &str = "Guest List";
const DEFAULT_GUESTLIST_DIR: &str = "data";
const DEFAULT_HERO_DIR: &str = "public/hero";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Service-account credentials for the Google APIs.
#[derive(Debug)]
pub struct GoogleCredentials {
    pub client_email: String,
    pub private_key: SecretString,
}

/// Raw update-mode settings; validated per request into an `UpdateTarget`.
#[derive(Debug, Default, Clone)]
pub struct UpdateModeSettings {
    pub name_anchor: Option<String>,
    pub attending_col: Option<String>,
    pub dietary_col: Option<String>,
    pub staying_col: Option<String>,
}

#[derive(Debug)]
pub struct SheetSettings {
    pub spreadsheet_id: Option<String>,
    /// Range read by the admin stats endpoint.
    pub range: String,
    /// Tab holding the guest list that RSVPs are written into.
    pub tab: String,
    pub update: UpdateModeSettings,
    /// Public link to the responses sheet, surfaced on the admin dashboard.
    pub responses_sheet_url: Option<String>,
}

#[derive(Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub from: Option<String>,
    pub notify_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RosterSettings {
    pub dir: PathBuf,
    pub sheet_name: Option<String>,
    pub sheet_index: Option<usize>,
}

#[derive(Debug)]
pub struct Settings {
    pub credentials: Option<GoogleCredentials>,
    pub sheet: SheetSettings,
    pub document_id: Option<String>,
    pub smtp: Option<SmtpSettings>,
    pub roster: RosterSettings,
    pub hero_images_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub http_timeout: Duration,
    pub timezone: Tz,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_map(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup. Blank values count as unset.
    pub fn from_env_map<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credentials = match get("GOOGLE_SHEETS_CLIENT_EMAIL") {
            Some(client_email) => {
                let key = resolve_private_key(
                    get("GOOGLE_SHEETS_PRIVATE_KEY").as_deref(),
                    get("GOOGLE_SHEETS_PRIVATE_KEY_BASE64").as_deref(),
                )?;
                key.map(|key| GoogleCredentials {
                    client_email,
                    private_key: SecretString::from(key),
                })
            }
            None => None,
        };

        let responses_sheet_url = get("RESPONSES_SHEET_URL");
        let spreadsheet_id = get("GOOGLE_SHEETS_SPREADSHEET_ID")
            .or_else(|| get("GOOGLE_SHEETS_SPREADSHEET_URL").and_then(|url| extract_spreadsheet_id(&url)))
            .or_else(|| responses_sheet_url.as_deref().and_then(extract_spreadsheet_id));

        let sheet = SheetSettings {
            spreadsheet_id,
            range: get("GOOGLE_SHEETS_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string()),
            tab: get("GOOGLE_SHEETS_TAB").unwrap_or_else(|| DEFAULT_TAB.to_string()),
            update: UpdateModeSettings {
                name_anchor: get("GOOGLE_SHEETS_NAME_ANCHOR"),
                attending_col: get("GOOGLE_SHEETS_ATTENDING_COL"),
                dietary_col: get("GOOGLE_SHEETS_DIETARY_COL"),
                staying_col: get("GOOGLE_SHEETS_STAYING_COL"),
            },
            responses_sheet_url,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw.parse().with_context(|| format!("Invalid SMTP_PORT: {}", raw))?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(SmtpSettings {
                    host,
                    port,
                    secure: get("SMTP_SECURE").is_some_and(|v| v.eq_ignore_ascii_case("true")),
                    user: get("SMTP_USER"),
                    password: get("SMTP_PASS").map(SecretString::from),
                    from: get("NOTIFY_EMAIL_FROM"),
                    notify_to: get("NOTIFY_EMAIL_TO"),
                })
            }
            None => None,
        };

        // A non-numeric index is ignored rather than rejected
        let roster = RosterSettings {
            dir: PathBuf::from(get("GUESTLIST_DIR").unwrap_or_else(|| DEFAULT_GUESTLIST_DIR.to_string())),
            sheet_name: get("GUESTLIST_SHEET_NAME"),
            sheet_index: get("GUESTLIST_SHEET_INDEX").and_then(|v| v.parse().ok()),
        };

        let bind_raw = get("RSVP_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .with_context(|| format!("Invalid RSVP_BIND_ADDR: {}", bind_raw))?;

        let http_timeout = match get("RSVP_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("Invalid RSVP_HTTP_TIMEOUT_SECS: {}", raw))?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let timezone = match get("RSVP_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("Invalid RSVP_TIMEZONE '{}': {}", name, e))?,
            None => Tz::UTC,
        };

        Ok(Settings {
            credentials,
            sheet,
            document_id: get("GOOGLE_DOCS_DOCUMENT_ID"),
            smtp,
            roster,
            hero_images_dir: PathBuf::from(get("HERO_IMAGES_DIR").unwrap_or_else(|| DEFAULT_HERO_DIR.to_string())),
            bind_addr,
            http_timeout,
            timezone,
        })
    }
}

/// Pull the spreadsheet id out of a full Google Sheets URL.
pub fn extract_spreadsheet_id(url: &str) -> Option<String> {
    SPREADSHEET_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve the PEM private key from either the plain or the base64 variable.
///
/// Keys pasted into env files usually carry literal `\n` sequences and
/// sometimes surrounding quotes; both are cleaned up here.
pub fn resolve_private_key(plain: Option<&str>, base64_encoded: Option<&str>) -> Result<Option<String>> {
    let raw = match (plain, base64_encoded) {
        (Some(key), _) => key.to_string(),
        (None, Some(encoded)) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .context("GOOGLE_SHEETS_PRIVATE_KEY_BASE64 is not valid base64")?;
            String::from_utf8(bytes).context("Decoded private key is not UTF-8")?
        }
        (None, None) => return Ok(None),
    };

    let mut key = raw.replace("\\n", "\n").trim().to_string();
    let quoted = (key.starts_with('"') && key.ends_with('"')) || (key.starts_with('\'') && key.ends_with('\''));
    if quoted && key.len() >= 2 {
        key = key[1..key.len() - 1].to_string();
    }

    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_env_map(|key| map.get(key).cloned())
    }

    #[test]
    fn test_settings_defaults() -> Result<()> {
        let settings = settings_from(&[])?;
        assert!(settings.credentials.is_none());
        assert!(settings.smtp.is_none());
        assert_eq!(settings.sheet.range, "Sheet1!A:F");
        assert_eq!(settings.sheet.tab, "Guest List");
        assert_eq!(settings.roster.dir, PathBuf::from("data"));
        assert_eq!(settings.bind_addr.port(), 3000);
        assert_eq!(settings.http_timeout, Duration::from_secs(15));
        assert_eq!(settings.timezone, Tz::UTC);
        Ok(())
    }

    #[test]
    fn test_spreadsheet_id_from_url() -> Result<()> {
        let settings = settings_from(&[(
            "GOOGLE_SHEETS_SPREADSHEET_URL",
            "https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0",
        )])?;
        assert_eq!(settings.sheet.spreadsheet_id.as_deref(), Some("1AbC-d_9"));

        let direct = settings_from(&[
            ("GOOGLE_SHEETS_SPREADSHEET_ID", "direct-id"),
            ("GOOGLE_SHEETS_SPREADSHEET_URL", "https://docs.google.com/spreadsheets/d/other/edit"),
        ])?;
        assert_eq!(direct.sheet.spreadsheet_id.as_deref(), Some("direct-id"));
        Ok(())
    }

    #[test]
    fn test_private_key_cleanup() -> Result<()> {
        let key = resolve_private_key(Some("\"-----BEGIN KEY-----\\nabc\\n-----END KEY-----\""), None)?;
        assert_eq!(key.as_deref(), Some("-----BEGIN KEY-----\nabc\n-----END KEY-----"));

        let encoded = base64::engine::general_purpose::STANDARD.encode("line1\nline2\n");
        let key = resolve_private_key(None, Some(&encoded))?;
        assert_eq!(key.as_deref(), Some("line1\nline2"));

        assert!(resolve_private_key(None, Some("%%%not-base64")).is_err());
        assert!(resolve_private_key(None, None)?.is_none());
        Ok(())
    }

    #[test]
    fn test_smtp_settings() -> Result<()> {
        let settings = settings_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_SECURE", "TRUE"),
            ("SMTP_PASS", "hunter2"),
            ("NOTIFY_EMAIL_TO", "couple@example.com"),
        ])?;
        let smtp = settings.smtp.expect("smtp configured");
        assert_eq!(smtp.port, 587);
        assert!(smtp.secure);
        assert_eq!(smtp.password.as_ref().map(|p| p.expose_secret()), Some("hunter2"));
        assert_eq!(smtp.notify_to.as_deref(), Some("couple@example.com"));

        assert!(settings_from(&[("SMTP_HOST", "h"), ("SMTP_PORT", "abc")]).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        assert!(settings_from(&[("RSVP_TIMEZONE", "Mars/Olympus")]).is_err());
    }
}
