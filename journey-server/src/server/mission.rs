use axum::Json;
use axum::extract::{Extension, State};
use journey_shared::api::{
    ApiResponse, MissionAvailabilityDto, MissionCompleteResp, MissionCompletionDto,
    MissionCreateReq, MissionDto, MissionPatchReq, UserMissionDto,
};
use journey_shared::validate::validate_reward_points;

use super::auth::AuthCtx;
use super::{ApiResult, AppError, AppState, Id, JsonBody, non_blank, ok};
use crate::storage::models::{Mission, MissionPatch, NewMission};
use crate::storage::{now_utc, rfc3339};

pub(super) fn mission_dto(m: Mission) -> MissionDto {
    MissionDto {
        mission_id: m.id,
        title: m.title,
        description: m.description,
        reward_points: m.reward_points,
        category: m.category,
        difficulty: m.difficulty,
        created_at: rfc3339(m.created_at),
    }
}

pub(super) fn user_mission(m: Mission, completed_today: bool, completion_count: i64) -> UserMissionDto {
    UserMissionDto {
        mission: mission_dto(m),
        completed_today,
        completion_count,
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Vec<UserMissionDto>> {
    let rows = state
        .store
        .missions_for_user(auth.user_id, state.today())
        .await?;
    let items = rows
        .into_iter()
        .map(|(m, today, count)| user_mission(m, today, count))
        .collect();
    Ok(Json(ApiResponse::list(items, "Missions retrieved successfully")))
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<UserMissionDto> {
    let (m, today, count) = state
        .store
        .mission_for_user(auth.user_id, id, state.today())
        .await?;
    ok(
        user_mission(m, today, count),
        "Mission retrieved successfully",
    )
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<MissionCompleteResp> {
    let outcome = state
        .store
        .complete_mission(auth.user_id, id, state.today())
        .await?;
    let reward = outcome.mission.reward_points;
    let message = if reward > 0 {
        format!("Mission completed! You earned {reward} points.")
    } else {
        "Mission completed successfully!".to_string()
    };
    ok(
        MissionCompleteResp {
            mission_id: outcome.mission.id,
            reward_points: reward,
            completed_at: rfc3339(outcome.completed_at),
            user_total_points: outcome.user_total_points,
        },
        message,
    )
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Vec<MissionCompletionDto>> {
    let rows = state.store.mission_history(auth.user_id).await?;
    let items = rows
        .into_iter()
        .map(|(c, m)| MissionCompletionDto {
            completion_id: c.id,
            mission_id: m.id,
            title: m.title,
            reward_points: m.reward_points,
            completed_date: c.completed_date.to_string(),
            completed_at: rfc3339(c.completed_at),
        })
        .collect();
    Ok(Json(ApiResponse::list(
        items,
        "Mission history retrieved successfully",
    )))
}

pub async fn availability(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<MissionAvailabilityDto> {
    let available = state
        .store
        .mission_available(auth.user_id, id, state.today())
        .await?;
    let message = if available {
        "Mission is available"
    } else {
        "Mission already completed today"
    };
    ok(
        MissionAvailabilityDto {
            mission_id: id,
            available,
            completed_today: !available,
        },
        message,
    )
}

pub async fn admin_list(State(state): State<AppState>) -> ApiResult<Vec<MissionDto>> {
    let items = state
        .store
        .list_missions()
        .await?
        .into_iter()
        .map(mission_dto)
        .collect();
    Ok(Json(ApiResponse::list(items, "Missions retrieved successfully")))
}

pub async fn admin_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    JsonBody(body): JsonBody<MissionCreateReq>,
) -> ApiResult<MissionDto> {
    let (Some(title), Some(description)) = (non_blank(body.title), non_blank(body.description))
    else {
        return Err(AppError::bad_request(
            "Missing required fields: title and description",
        ));
    };
    let reward_points = body.reward_points.unwrap_or(0);
    validate_reward_points(reward_points)?;
    let now = now_utc();
    let m = state
        .store
        .create_mission(NewMission {
            title,
            description,
            reward_points,
            category: non_blank(body.category),
            difficulty: non_blank(body.difficulty),
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(admin = auth.user_id, mission_id = m.id, "mission created");
    ok(mission_dto(m), "Mission created successfully")
}

pub async fn admin_update(
    State(state): State<AppState>,
    Id(id): Id,
    JsonBody(body): JsonBody<MissionPatchReq>,
) -> ApiResult<MissionDto> {
    if let Some(r) = body.reward_points {
        validate_reward_points(r)?;
    }
    let patch = MissionPatch {
        title: non_blank(body.title),
        description: non_blank(body.description),
        reward_points: body.reward_points,
        category: non_blank(body.category),
        difficulty: non_blank(body.difficulty),
        updated_at: None,
    };
    let m = state.store.update_mission(id, patch).await?;
    ok(mission_dto(m), "Mission updated successfully")
}

pub async fn admin_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.store.delete_mission(id).await?;
    tracing::info!(admin = auth.user_id, mission_id = id, "mission deleted");
    Ok(Json(ApiResponse::message("Mission deleted successfully")))
}
