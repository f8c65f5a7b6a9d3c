use diesel::prelude::*;

use super::log::{friend_count, missions_completed, quizzes_passed, volunteer_activity_count};
use super::models::{Ending, NewEnding, User};
use super::schema::{endings, startings, users};
use super::{Store, StorageError, conflict_on_unique, now_utc, rfc3339};
use journey_shared::api::{EndingStatsDto, EndingSummaryDto};
use journey_shared::domain::ENDING_DEFAULT_STATUS;

pub const ENDING_NOT_FOUND: &str = "Ending not found";

fn endings_of(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<Ending>, StorageError> {
    Ok(endings::table
        .filter(endings::user_id.eq(user_id))
        .order((endings::completion_date.desc(), endings::id.desc()))
        .select(Ending::as_select())
        .load(conn)?)
}

impl Store {
    pub async fn current_ending(&self, user_id: i32) -> Result<Option<Ending>, StorageError> {
        self.blocking(move |conn| Ok(endings_of(conn, user_id)?.into_iter().next()))
            .await
    }

    pub async fn list_endings(&self, user_id: i32) -> Result<Vec<Ending>, StorageError> {
        self.blocking(move |conn| endings_of(conn, user_id)).await
    }

    /// Another user's ending reads as not found.
    pub async fn ending_for_user(
        &self,
        ending_id: i32,
        user_id: i32,
    ) -> Result<Ending, StorageError> {
        self.blocking(move |conn| {
            endings::table
                .filter(endings::id.eq(ending_id))
                .filter(endings::user_id.eq(user_id))
                .select(Ending::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| StorageError::NotFound(ENDING_NOT_FOUND.into()))
        })
        .await
    }

    /// Closes the journey. Requires a starting record and allows one ending per user.
    pub async fn create_ending(
        &self,
        user_id: i32,
        title: &str,
        description: &str,
        status: &str,
    ) -> Result<Ending, StorageError> {
        let (title, description, status) =
            (title.to_string(), description.to_string(), status.to_string());
        self.blocking(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Ending, StorageError> {
                let started = startings::table
                    .filter(startings::user_id.eq(user_id))
                    .count()
                    .get_result::<i64>(conn)?;
                if started == 0 {
                    return Err(StorageError::InvalidInput(
                        "Start your journey before recording its ending".into(),
                    ));
                }
                let now = now_utc();
                diesel::insert_into(endings::table)
                    .values(&NewEnding {
                        user_id,
                        title: &title,
                        description: &description,
                        status: &status,
                        completion_date: now,
                        created_at: now,
                    })
                    .returning(Ending::as_returning())
                    .get_result(conn)
                    .map_err(|e| conflict_on_unique(e, "Journey ending already recorded"))
            })
        })
        .await
    }

    pub async fn ending_summary(&self, user_id: i32) -> Result<EndingSummaryDto, StorageError> {
        use diesel::dsl::max;
        self.blocking(move |conn| {
            let user = users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| StorageError::NotFound("User not found".into()))?;
            let last = endings::table
                .filter(endings::user_id.eq(user_id))
                .select(max(endings::completion_date))
                .first::<Option<chrono::NaiveDateTime>>(conn)?;
            Ok(EndingSummaryDto {
                user_id: user.id,
                name: user.name,
                email: user.email,
                age: user.age,
                total_points: user.total_points,
                missions_completed: missions_completed(conn, user_id)?,
                quizzes_passed: quizzes_passed(conn, user_id)?,
                volunteer_activities: volunteer_activity_count(conn, user_id)?,
                total_friends: friend_count(conn, user_id)?,
                last_ending_date: last.map(rfc3339),
            })
        })
        .await
    }

    pub async fn ending_stats(&self, user_id: i32) -> Result<EndingStatsDto, StorageError> {
        self.blocking(move |conn| {
            let all = endings_of(conn, user_id)?;
            let latest = all.first();
            Ok(EndingStatsDto {
                total_endings: all.len() as i64,
                most_recent_ending: latest.map(|e| rfc3339(e.completion_date)),
                latest_status: latest.map(|e| e.status.clone()),
            })
        })
        .await
    }

    /// `true` once the user has an ending in the completed state.
    pub async fn journey_completed(&self, user_id: i32) -> Result<bool, StorageError> {
        self.blocking(move |conn| {
            let n = endings::table
                .filter(endings::user_id.eq(user_id))
                .filter(endings::status.eq(ENDING_DEFAULT_STATUS))
                .count()
                .get_result::<i64>(conn)?;
            Ok(n > 0)
        })
        .await
    }
}
