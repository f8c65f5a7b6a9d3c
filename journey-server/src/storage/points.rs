use diesel::prelude::*;

use super::models::{NewPointAward, PointAward};
use super::schema::{point_awards, users};
use super::{Store, StorageError, now_utc};
use journey_shared::domain::PointSource;

/// Credits `points` to the user and writes the matching ledger row. Must run
/// inside the caller's transaction. Returns the user's new total.
pub(super) fn award_points(
    conn: &mut SqliteConnection,
    user_id: i32,
    source: PointSource,
    source_id: i32,
    points: i32,
    description: &str,
) -> Result<i32, StorageError> {
    if points > 0 {
        let now = now_utc();
        diesel::update(users::table.find(user_id))
            .set((
                users::total_points.eq(users::total_points + points),
                users::updated_at.eq(now),
            ))
            .execute(conn)?;
        diesel::insert_into(point_awards::table)
            .values(&NewPointAward {
                user_id,
                source: source.as_str(),
                source_id,
                points,
                description,
                created_at: now,
            })
            .execute(conn)?;
    }
    users::table
        .find(user_id)
        .select(users::total_points)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| StorageError::NotFound("User not found".into()))
}

impl Store {
    /// One page of the user's awards, newest first, plus the total row count.
    pub async fn list_point_awards(
        &self,
        user_id: i32,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<PointAward>, i64), StorageError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;
        self.blocking(move |conn| {
            let total = point_awards::table
                .filter(point_awards::user_id.eq(user_id))
                .count()
                .get_result::<i64>(conn)?;
            let rows = point_awards::table
                .filter(point_awards::user_id.eq(user_id))
                .order((point_awards::created_at.desc(), point_awards::id.desc()))
                .offset(offset)
                .limit(per_page)
                .select(PointAward::as_select())
                .load(conn)?;
            Ok((rows, total))
        })
        .await
    }

    pub async fn ledger_sum(&self, user_id: i32) -> Result<i64, StorageError> {
        use diesel::dsl::sum;
        self.blocking(move |conn| {
            let s: Option<i64> = point_awards::table
                .filter(point_awards::user_id.eq(user_id))
                .select(sum(point_awards::points))
                .first(conn)?;
            Ok(s.unwrap_or(0))
        })
        .await
    }
}
