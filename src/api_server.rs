use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use log::{debug, error, info};
use tokio::net::TcpListener;

use crate::admin_stats::{load_report, StatsReport};
use crate::config::Settings;
use crate::google::{GoogleDocs, GoogleSheets, ServiceAccountAuth};
use crate::guest_lookup::{lookup, MatchCandidate};
use crate::hero_images::list_hero_images;
use crate::notify::{Mailer, Notifier, SmtpMailer};
use crate::roster::{normalize_name, RosterCache};
use crate::rsvp::RsvpService;
use crate::store::SheetStore;

/// Where the admin dashboard reads its response log from.
pub struct StatsSource {
    pub spreadsheet_configured: bool,
    pub range: String,
    pub sheet_url: Option<String>,
}

// API state shared across handlers
pub struct ApiState {
    pub roster: Arc<RosterCache>,
    pub rsvp: RsvpService,
    pub sheets: Arc<dyn SheetStore>,
    pub stats: StatsSource,
    pub hero_images_dir: PathBuf,
    pub timezone: Tz,
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct LookupResponse {
    pub matches: Vec<MatchCandidate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponseBody {
    pub ok: bool,
    pub mode: &'static str,
    pub updated: usize,
    pub not_found: Vec<String>,
}

#[derive(Serialize)]
pub struct HeroImagesResponse {
    pub images: Vec<String>,
}

// Health check endpoint
async fn health_check() -> &'static str {
    "Wedding RSVP API is running"
}

async fn guest_lookup_handler(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<LookupResponse>, ApiError> {
    let query = payload
        .ok()
        .and_then(|Json(request)| request.name)
        .filter(|name| !normalize_name(name).is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Name is required"))?;

    let roster = Arc::clone(&state.roster);
    let guests = tokio::task::spawn_blocking(move || roster.guests())
        .await
        .map_err(|e| {
            error!("Guest lookup failed: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed")
        })?;

    let matches = lookup(&guests, &query);
    debug!("Guest lookup for '{}' returned {} matches", query, matches.len());
    Ok(Json(LookupResponse { matches }))
}

async fn rsvp_handler(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RsvpResponseBody>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    match state.rsvp.submit(&payload).await {
        Ok(outcome) => Ok(Json(RsvpResponseBody {
            ok: true,
            mode: "update",
            updated: outcome.updated,
            not_found: outcome.not_found,
        })),
        Err(e) => {
            let status = e.status_code();
            let message = if status == StatusCode::BAD_REQUEST {
                e.root().to_string()
            } else {
                "Failed to save RSVP".to_string()
            };
            Err(ApiError::new(status, message))
        }
    }
}

async fn admin_stats_handler(State(state): State<Arc<ApiState>>) -> Response {
    if !state.stats.spreadsheet_configured {
        return ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Missing spreadsheet ID").into_response();
    }

    match load_report(
        state.sheets.as_ref(),
        &state.stats.range,
        state.stats.sheet_url.clone(),
        state.timezone,
    )
    .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Admin stats failed: {}", e);
            let empty = StatsReport::default();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": e.root().to_string(),
                    "stats": empty.stats,
                    "recent": empty.recent,
                })),
            )
                .into_response()
        }
    }
}

async fn hero_images_handler(State(state): State<Arc<ApiState>>) -> Result<Json<HeroImagesResponse>, ApiError> {
    let dir = state.hero_images_dir.clone();
    let listed = tokio::task::spawn_blocking(move || list_hero_images(&dir))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result);

    match listed {
        Ok(images) => Ok(Json(HeroImagesResponse { images })),
        Err(e) => {
            error!("Failed to read hero images: {}", e);
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read images"))
        }
    }
}

/// Wrong verbs get a JSON body alongside the `Allow` header.
fn only(route: MethodRouter<Arc<ApiState>>, allow: &'static str) -> MethodRouter<Arc<ApiState>> {
    route.fallback(move || async move {
        let mut response = ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static(allow));
        response
    })
}

/// Build the router around already-constructed state.
pub fn build_router(state: Arc<ApiState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/guest-lookup", only(post(guest_lookup_handler), "POST"))
        .route("/api/rsvp", only(post(rsvp_handler), "POST"))
        .route("/api/admin-stats", only(get(admin_stats_handler), "GET"))
        .route("/api/hero-images", only(get(hero_images_handler), "GET"))
        .layer(cors)
        .with_state(state)
}

/// Wire the Google clients, mailer and roster cache from settings.
pub fn build_state(settings: &Settings) -> Result<ApiState> {
    let client = reqwest::Client::builder()
        .timeout(settings.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let auth = Arc::new(ServiceAccountAuth::new(client.clone(), settings.credentials.as_ref())?);
    if !auth.is_configured() {
        info!("Google credentials not configured; RSVP writes and admin stats will fail");
    }

    let sheets: Arc<dyn SheetStore> = Arc::new(GoogleSheets::new(
        client.clone(),
        Arc::clone(&auth),
        settings.sheet.spreadsheet_id.clone(),
    ));

    let notifier = match &settings.smtp {
        Some(smtp) => {
            let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(smtp, settings.http_timeout)?);
            Notifier::new(Some(mailer), smtp.from.clone(), smtp.notify_to.clone())
        }
        None => {
            info!("SMTP not configured; notification emails disabled");
            Notifier::disabled()
        }
    };

    let mut rsvp = RsvpService::new(Arc::clone(&sheets), settings.sheet.tab.clone(), settings.sheet.update.clone())
        .with_notifier(notifier)
        .with_timezone(settings.timezone);
    if let Some(document_id) = &settings.document_id {
        rsvp = rsvp.with_document_log(Arc::new(GoogleDocs::new(client, auth, document_id.clone())));
    }

    Ok(ApiState {
        roster: Arc::new(RosterCache::new(settings.roster.clone())),
        rsvp,
        sheets,
        stats: StatsSource {
            spreadsheet_configured: settings.sheet.spreadsheet_id.is_some(),
            range: settings.sheet.range.clone(),
            sheet_url: settings.sheet.responses_sheet_url.clone(),
        },
        hero_images_dir: settings.hero_images_dir.clone(),
        timezone: settings.timezone,
    })
}

pub async fn start_api_server(settings: Settings) -> Result<()> {
    let state = Arc::new(build_state(&settings)?);
    let app = build_router(state);

    let addr = settings.bind_addr;
    info!("API server starting on http://{}", addr);

    // Create a TcpListener first, then pass it to serve
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind to address: {}", e))?;

    info!("API server successfully bound to {}. Waiting for connections...", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Failed to start API server: {}", e))?;

    Ok(())
}
