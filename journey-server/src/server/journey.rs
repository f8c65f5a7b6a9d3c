//! Starting and ending records that bracket a user's onboarding journey.

use axum::Json;
use axum::extract::{Extension, State};
use journey_shared::api::{
    ApiResponse, BookendCreateReq, BookendPatchReq, EndingDto, EndingStatsDto, EndingSummaryDto,
    JourneyCompletionDto, StartingDto, StartingProgressDto, StartingStatsDto,
};
use journey_shared::domain::{ENDING_DEFAULT_STATUS, STARTING_DEFAULT_STATUS};

use super::auth::AuthCtx;
use super::{ApiResult, AppError, AppState, Id, JsonBody, non_blank, ok};
use crate::storage::models::{Ending, Starting, StartingPatch};
use crate::storage::rfc3339;

const MISSING_FIELDS: &str = "Missing required fields: title and description";

pub(super) fn starting_dto(s: Starting) -> StartingDto {
    StartingDto {
        starting_id: s.id,
        user_id: s.user_id,
        title: s.title,
        description: s.description,
        status: s.status,
        start_date: rfc3339(s.start_date),
        created_at: rfc3339(s.created_at),
    }
}

pub(super) fn ending_dto(e: Ending) -> EndingDto {
    EndingDto {
        ending_id: e.id,
        user_id: e.user_id,
        title: e.title,
        description: e.description,
        status: e.status,
        completion_date: rfc3339(e.completion_date),
        created_at: rfc3339(e.created_at),
    }
}

/// Title and description are both required; status falls back to `default`.
fn bookend_fields(
    body: BookendCreateReq,
    default: &str,
) -> Result<(String, String, String), AppError> {
    let (Some(title), Some(description)) = (non_blank(body.title), non_blank(body.description))
    else {
        return Err(AppError::bad_request(MISSING_FIELDS));
    };
    let status = non_blank(body.status).unwrap_or_else(|| default.to_string());
    Ok((title, description, status))
}

pub async fn starting_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Option<StartingDto>> {
    match state.store.latest_starting(auth.user_id).await? {
        Some(s) => ok(Some(starting_dto(s)), "Starting journey retrieved successfully"),
        None => ok(None, "No starting journey found"),
    }
}

pub async fn create_starting(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    JsonBody(body): JsonBody<BookendCreateReq>,
) -> ApiResult<StartingDto> {
    let (title, description, status) = bookend_fields(body, STARTING_DEFAULT_STATUS)?;
    let s = state
        .store
        .create_starting(auth.user_id, &title, &description, &status)
        .await?;
    tracing::info!(user_id = auth.user_id, starting_id = s.id, "journey started");
    ok(starting_dto(s), "Starting journey created successfully")
}

pub async fn update_starting(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
    JsonBody(body): JsonBody<BookendPatchReq>,
) -> ApiResult<StartingDto> {
    let patch = StartingPatch {
        title: non_blank(body.title),
        description: non_blank(body.description),
        status: non_blank(body.status),
    };
    let s = state.store.update_starting(id, auth.user_id, patch).await?;
    ok(starting_dto(s), "Starting journey updated successfully")
}

pub async fn starting_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<StartingStatsDto> {
    let stats = state.store.starting_stats(auth.user_id).await?;
    ok(stats, "Starting statistics retrieved successfully")
}

pub async fn starting_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<StartingProgressDto> {
    let progress = state.store.starting_progress(auth.user_id).await?;
    ok(progress, "Journey progress retrieved successfully")
}

pub async fn current_ending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Option<EndingDto>> {
    match state.store.current_ending(auth.user_id).await? {
        Some(e) => ok(Some(ending_dto(e)), "Ending retrieved successfully"),
        None => ok(None, "No ending found"),
    }
}

pub async fn list_endings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Vec<EndingDto>> {
    let items = state
        .store
        .list_endings(auth.user_id)
        .await?
        .into_iter()
        .map(ending_dto)
        .collect();
    Ok(Json(ApiResponse::list(items, "Endings retrieved successfully")))
}

pub async fn create_ending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    JsonBody(body): JsonBody<BookendCreateReq>,
) -> ApiResult<EndingDto> {
    let (title, description, status) = bookend_fields(body, ENDING_DEFAULT_STATUS)?;
    let e = state
        .store
        .create_ending(auth.user_id, &title, &description, &status)
        .await?;
    tracing::info!(user_id = auth.user_id, ending_id = e.id, "journey ended");
    ok(ending_dto(e), "Ending created successfully")
}

pub async fn ending_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<EndingSummaryDto> {
    let summary = state.store.ending_summary(auth.user_id).await?;
    ok(summary, "Journey summary retrieved successfully")
}

pub async fn ending_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<EndingStatsDto> {
    let stats = state.store.ending_stats(auth.user_id).await?;
    ok(stats, "Ending statistics retrieved successfully")
}

pub async fn ending_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<EndingDto> {
    let e = state.store.ending_for_user(id, auth.user_id).await?;
    ok(ending_dto(e), "Ending retrieved successfully")
}

pub async fn completion_check(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<JourneyCompletionDto> {
    let journey_completed = state.store.journey_completed(auth.user_id).await?;
    ok(
        JourneyCompletionDto { journey_completed },
        "Journey completion status retrieved successfully",
    )
}
