use axum::extract::{Extension, State};
use journey_shared::api::{PageQuery, PointAwardDto, PointsHistoryDto};
use journey_shared::domain::PointSource;

use super::auth::AuthCtx;
use super::{ApiResult, AppError, AppState, Params, ok};
use crate::storage::models::PointAward;
use crate::storage::rfc3339;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

fn award_dto(a: PointAward) -> Result<PointAwardDto, AppError> {
    let source: PointSource = a.source.parse().map_err(AppError::internal)?;
    Ok(PointAwardDto {
        award_id: a.id,
        source,
        source_id: a.source_id,
        points: a.points,
        description: a.description,
        created_at: rfc3339(a.created_at),
    })
}

/// Page numbers start at 1; `per_page` is clamped to 1..=100.
fn paging(q: &PageQuery) -> (i64, i64) {
    let page = q.page.unwrap_or(1).max(1);
    let per_page = q.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Params(q): Params<PageQuery>,
) -> ApiResult<PointsHistoryDto> {
    let (page, per_page) = paging(&q);
    let (rows, total) = state
        .store
        .list_point_awards(auth.user_id, page, per_page)
        .await?;
    let items = rows
        .into_iter()
        .map(award_dto)
        .collect::<Result<Vec<_>, _>>()?;
    ok(
        PointsHistoryDto {
            page,
            per_page,
            total,
            total_points: auth.total_points,
            items,
        },
        "Points history retrieved successfully",
    )
}
