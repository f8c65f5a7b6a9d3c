mod acl;
pub mod auth;
mod config;
mod game;
mod journey;
mod log;
mod mission;
mod pages;
mod points;
mod quiz;
pub mod session;
mod user;

use crate::storage::{StorageError, Store};
use axum::extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::{
    Json, Router,
    http::{Method, StatusCode, header},
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
pub use config::{AppConfig, ConfigError};
use journey_shared::api::{ApiResponse, HealthDto};
use journey_shared::validate::ValidationError;
use mime_guess::from_path;
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info_span;
use uuid::Uuid;

/// Message returned for every unexpected failure; details stay in the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    tz: Tz,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Result<Self, ConfigError> {
        let tz = config.timezone()?;
        Ok(Self {
            config,
            store,
            tz,
            shutdown: CancellationToken::new(),
        })
    }

    /// Calendar date in the configured zone; daily missions reset on it.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin/missions", get(mission::admin_list))
        .route("/admin/missions/create", post(mission::admin_create))
        .route(
            "/admin/missions/{id}",
            put(mission::admin_update).delete(mission::admin_delete),
        )
        .route("/admin/quizzes/create", post(quiz::admin_create))
        .route("/admin/quizzes/{id}", put(quiz::admin_update))
        .route("/admin/quizzes/{id}/results", get(quiz::admin_results))
        .route("/admin/quizzes/{id}/stats", get(quiz::admin_stats))
        .route("/admin/games/create", post(game::admin_create))
        .route("/admin/games/{id}", put(game::admin_update))
        .route("/admin/games/{id}/stats", get(game::admin_stats))
        .layer(middleware::from_fn(acl::require_admin));

    // Browsing the catalog needs no account
    let catalog = Router::new()
        .route("/quizzes", get(quiz::list))
        .route("/quizzes/{id}", get(quiz::detail))
        .route("/quizzes/{id}/details", get(pages::quiz_details))
        .route("/games", get(game::list))
        .route("/games/search", get(game::search))
        .route("/games/difficulty/{difficulty}", get(game::by_difficulty))
        .route("/games/display", get(pages::games))
        .route("/games/{id}", get(game::detail))
        .route("/games/{id}/details", get(pages::game_details));

    let api = Router::new()
        .route("/profile/update", post(user::update_profile))
        .route("/profile/delete", post(user::delete_account))
        .route(
            "/profile/avatar",
            post(user::upload_avatar)
                .layer(DefaultBodyLimit::max(user::MAX_AVATAR_BYTES + 64 * 1024)),
        )
        .route("/missions", get(mission::list))
        .route("/missions/history/all", get(mission::history))
        .route("/missions/{id}", get(mission::detail))
        .route("/missions/{id}/complete", post(mission::complete))
        .route("/missions/{id}/availability", get(mission::availability))
        .route("/quizzes/{id}/submit", post(quiz::submit))
        .route("/quizzes/{id}/result", get(quiz::result))
        .route("/quiz-history", get(quiz::history))
        .route("/games/{id}/complete", post(game::complete))
        .route("/games/{id}/rate", post(game::rate))
        .route("/api/starting/status", get(journey::starting_status))
        .route("/api/starting/create", post(journey::create_starting))
        .route("/api/starting/stats", get(journey::starting_stats))
        .route("/api/starting/progress", get(journey::starting_progress))
        .route("/api/starting/{id}", put(journey::update_starting))
        .route("/api/ending", get(journey::current_ending))
        .route("/api/endings", get(journey::list_endings))
        .route("/api/ending/create", post(journey::create_ending))
        .route("/api/ending/summary", get(journey::ending_summary))
        .route("/api/ending/stats", get(journey::ending_stats))
        .route("/api/ending/{id}", get(journey::ending_by_id))
        .route(
            "/api/journey/completion-check",
            get(journey::completion_check),
        )
        .route("/api/activity-log", get(log::activity_log))
        .route("/api/onboarding-info", get(log::onboarding_info))
        .route("/api/missions-completed", get(log::missions_completed))
        .route(
            "/api/missions/{id}/completion-details",
            get(log::mission_completion_details),
        )
        .route("/api/volunteer-activities", get(log::volunteer_activities))
        .route("/api/volunteer/{id}/details", get(log::volunteer_details))
        .route("/api/volunteer/{id}/register", post(log::register_volunteer))
        .route("/api/friends", get(log::friends))
        .route("/api/friends/{id}/details", get(log::friendship_details))
        .route("/api/friends/{id}/request", post(log::request_friend))
        .route("/api/friends/{id}/accept", post(log::accept_friend))
        .route("/api/points/history", get(points::history))
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_user,
        ));

    let private_pages = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/profile", get(pages::profile))
        .route("/starting", get(pages::starting))
        .route("/ending", get(pages::ending))
        .route("/ending/summary/display", get(pages::ending_summary))
        .route("/ending/{id}", get(pages::ending_detail))
        .route("/activity-log", get(pages::activity_log))
        .route("/quizzes/{id}/result/display", get(pages::quiz_result))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_page_user,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            user_id = tracing::field::Empty,
            role = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/", get(pages::home))
        .route("/register", get(pages::register_page).post(auth::register))
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/static/{*path}", get(serve_static))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .merge(catalog)
        .merge(api)
        .merge(private_pages)
        .fallback(pages::not_found)
        .with_state(state.clone())
        .layer(session::layer(&state))
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Static assets and uploads may be cached; everything else is per-user
    if !(path.starts_with("/static/") || path.starts_with("/uploads/")) {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
    }

    Ok(resp)
}

/// A positive numeric path id; anything else is a 400 in the JSON envelope.
pub struct Id(pub i32);

impl<S: Send + Sync> FromRequestParts<S> for Id {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("Invalid ID"))?;
        parse_id(&raw)
            .map(Id)
            .ok_or_else(|| AppError::bad_request("Invalid ID"))
    }
}

/// JSON request body. Malformed or mistyped bodies are a 400 in the JSON
/// envelope instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(v)) => Ok(Self(v)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

/// Query string, rejected the same way as [`JsonBody`].
pub struct Params<T>(pub T);

impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(v)) => Ok(Self(v)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|v| *v > 0)
}

/// Blank strings count as absent.
fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

pub fn ok<T>(data: T, message: impl Into<String>) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data, message)))
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(m) => AppError::NotFound(m),
            StorageError::Conflict(m) => AppError::BadRequest(m),
            StorageError::InvalidInput(m) => AppError::BadRequest(m),
            other => AppError::internal(other),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        AppError::internal(format!("session: {e}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request"),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m, "unauthorized"),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m, "forbidden"),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found"),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(detail) => {
                tracing::error!(status = %StatusCode::INTERNAL_SERVER_ERROR, kind = "internal", detail = %detail, "request failed");
                let body = Json(ApiResponse::error(INTERNAL_ERROR_MESSAGE));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };
        tracing::warn!(status = %status, kind = kind, message = %msg, "request failed");
        (status, Json(ApiResponse::error(msg))).into_response()
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct StaticAssets;

async fn serve_static(Path(path): Path<String>) -> AxumResponse {
    let Some(asset) = StaticAssets::get(&path) else {
        return (StatusCode::NOT_FOUND, "asset not found").into_response();
    };
    let mime = from_path(&path).first_or_octet_stream();
    let mut resp = AxumResponse::new(axum::body::Body::from(asset.data.into_owned()));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_str(mime.as_ref())
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    resp
}
