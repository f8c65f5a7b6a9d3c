//! Activity log, volunteering and friend endpoints.

use axum::Json;
use axum::extract::{Extension, State};
use journey_shared::api::{
    ActivityLogDto, ApiResponse, CompletedMissionDto, FriendsDto, FriendshipDetailDto,
    FriendshipDto, MissionCompletionDetailDto, OnboardingInfoDto, VolunteerActivityDto,
    VolunteerRegistrationDto,
};
use journey_shared::domain::FriendshipStatus;

use super::auth::AuthCtx;
use super::{ApiResult, AppState, Id, ok};
use crate::storage::models::Friendship;
use crate::storage::rfc3339;

fn friendship_dto(f: Friendship) -> FriendshipDto {
    FriendshipDto {
        friendship_id: f.id,
        user_id_1: f.user_id_1,
        user_id_2: f.user_id_2,
        status: f.status.parse().unwrap_or(FriendshipStatus::Pending),
    }
}

pub async fn activity_log(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<ActivityLogDto> {
    let log = state.store.activity_log(auth.user_id).await?;
    ok(log, "Activity log retrieved successfully")
}

pub async fn onboarding_info(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<OnboardingInfoDto> {
    let info = state.store.onboarding_info(auth.user_id).await?;
    ok(info, "Onboarding information retrieved successfully")
}

pub async fn missions_completed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Vec<CompletedMissionDto>> {
    let items = state.store.completed_missions(auth.user_id).await?;
    Ok(Json(ApiResponse::list(
        items,
        "Completed missions retrieved successfully",
    )))
}

pub async fn mission_completion_details(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<MissionCompletionDetailDto> {
    let details = state
        .store
        .mission_completion_details(auth.user_id, id)
        .await?;
    ok(details, "Mission completion details retrieved successfully")
}

pub async fn volunteer_activities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<Vec<VolunteerActivityDto>> {
    let items = state.store.volunteer_activities_for(auth.user_id).await?;
    Ok(Json(ApiResponse::list(
        items,
        "Volunteer activities retrieved successfully",
    )))
}

pub async fn volunteer_details(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<VolunteerActivityDto> {
    let details = state.store.volunteer_details(auth.user_id, id).await?;
    ok(details, "Volunteer activity details retrieved successfully")
}

pub async fn register_volunteer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<VolunteerRegistrationDto> {
    let reg = state.store.register_volunteer(auth.user_id, id).await?;
    ok(
        VolunteerRegistrationDto {
            volunteer_id: reg.volunteer_id,
            registration_date: rfc3339(reg.registration_date),
            status: reg.status,
        },
        "Registered for volunteer activity successfully",
    )
}

pub async fn friends(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<FriendsDto> {
    let friends = state.store.list_friends(auth.user_id).await?;
    ok(
        FriendsDto {
            total_friends: friends.len(),
            friends,
        },
        "Friends retrieved successfully",
    )
}

pub async fn friendship_details(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<FriendshipDetailDto> {
    let details = state.store.friendship_details(auth.user_id, id).await?;
    ok(details, "Friendship details retrieved successfully")
}

pub async fn request_friend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<FriendshipDto> {
    let f = state.store.request_friend(auth.user_id, id).await?;
    ok(friendship_dto(f), "Friend request sent")
}

pub async fn accept_friend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<FriendshipDto> {
    let f = state.store.accept_friend(auth.user_id, id).await?;
    ok(friendship_dto(f), "Friend request accepted")
}
