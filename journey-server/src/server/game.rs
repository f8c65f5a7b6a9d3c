use axum::Json;
use axum::extract::{Extension, Path, State};
use journey_shared::api::{
    ApiResponse, GameCompleteResp, GameCreateReq, GameDetailDto, GameDto, GamePatchReq,
    GameRateReq, GameRatingDto, GameSearchQuery, GameStatsDto,
};
use journey_shared::validate::{ValidationError, validate_rating, validate_reward_points};

use super::auth::AuthCtx;
use super::quiz::parse_status;
use super::{ApiResult, AppError, AppState, Id, JsonBody, Params, non_blank, ok};
use crate::storage::models::{Game, GamePatch, NewGame};
use crate::storage::{now_utc, rfc3339};

pub(super) fn game_dto(g: Game) -> GameDto {
    GameDto {
        game_id: g.id,
        status: g.status.parse().unwrap_or_default(),
        title: g.title,
        description: g.description,
        genre: g.genre,
        difficulty_level: g.difficulty_level,
        reward_points: g.reward_points,
        image_url: g.image_url,
        created_at: rfc3339(g.created_at),
        updated_at: rfc3339(g.updated_at),
    }
}

fn game_list(games: Vec<Game>, message: &str) -> ApiResult<Vec<GameDto>> {
    let items = games.into_iter().map(game_dto).collect();
    Ok(Json(ApiResponse::list(items, message)))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<GameDto>> {
    let games = state.store.list_active_games().await?;
    game_list(games, "Games retrieved successfully")
}

pub async fn search(
    State(state): State<AppState>,
    Params(q): Params<GameSearchQuery>,
) -> ApiResult<Vec<GameDto>> {
    let Some(term) = non_blank(q.q) else {
        return Err(AppError::bad_request("Search query is required"));
    };
    let games = state.store.search_games(&term).await?;
    game_list(games, "Search completed successfully")
}

pub async fn by_difficulty(
    State(state): State<AppState>,
    Path(difficulty): Path<String>,
) -> ApiResult<Vec<GameDto>> {
    let games = state.store.games_by_difficulty(&difficulty).await?;
    game_list(games, "Games retrieved successfully")
}

pub async fn detail(State(state): State<AppState>, Id(id): Id) -> ApiResult<GameDetailDto> {
    let (game, total_completions, average_rating) = state.store.game_detail(id).await?;
    ok(
        GameDetailDto {
            game: game_dto(game),
            total_completions,
            average_rating,
        },
        "Game retrieved successfully",
    )
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<GameCompleteResp> {
    let outcome = state.store.complete_game(auth.user_id, id).await?;
    let reward = outcome.game.reward_points;
    let message = if reward > 0 {
        format!("Game completed! You earned {reward} points.")
    } else {
        "Game completed successfully!".to_string()
    };
    ok(
        GameCompleteResp {
            game_id: outcome.game.id,
            reward_points: reward,
            completed_at: rfc3339(outcome.completed_at),
            user_total_points: outcome.user_total_points,
        },
        message,
    )
}

pub async fn rate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
    JsonBody(body): JsonBody<GameRateReq>,
) -> ApiResult<GameRatingDto> {
    validate_rating(body.rating)?;
    let average_rating = state.store.rate_game(auth.user_id, id, body.rating).await?;
    ok(
        GameRatingDto {
            game_id: id,
            rating: body.rating,
            average_rating,
        },
        "Game rated successfully",
    )
}

pub async fn admin_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    JsonBody(body): JsonBody<GameCreateReq>,
) -> ApiResult<GameDto> {
    let Some(title) = non_blank(body.title) else {
        return Err(AppError::bad_request("Game title is required"));
    };
    let reward_points = body.reward_points.unwrap_or(0);
    validate_reward_points(reward_points)?;
    let status = parse_status(body.status)?.unwrap_or_default();
    let now = now_utc();
    let game = state
        .store
        .create_game(NewGame {
            title,
            description: non_blank(body.description),
            genre: non_blank(body.genre),
            difficulty_level: non_blank(body.difficulty_level),
            reward_points,
            image_url: non_blank(body.image_url),
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    tracing::info!(admin = auth.user_id, game_id = game.id, "game created");
    ok(game_dto(game), "Game created successfully")
}

pub async fn admin_update(
    State(state): State<AppState>,
    Id(id): Id,
    JsonBody(body): JsonBody<GamePatchReq>,
) -> ApiResult<GameDto> {
    if let Some(r) = body.reward_points {
        validate_reward_points(r)?;
    }
    let patch = GamePatch {
        title: non_blank(body.title),
        description: non_blank(body.description),
        genre: non_blank(body.genre),
        difficulty_level: non_blank(body.difficulty_level),
        reward_points: body.reward_points,
        image_url: non_blank(body.image_url),
        status: parse_status(body.status)?.map(|s| s.as_str().to_string()),
        updated_at: None,
    };
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate.into());
    }
    let game = state.store.update_game(id, patch).await?;
    ok(game_dto(game), "Game updated successfully")
}

pub async fn admin_stats(State(state): State<AppState>, Id(id): Id) -> ApiResult<GameStatsDto> {
    let stats = state.store.game_stats(id).await?;
    ok(stats, "Game statistics retrieved successfully")
}
