use diesel::prelude::*;

use super::log::{missions_completed, quizzes_passed, volunteer_activity_count};
use super::models::{NewStarting, Starting, StartingPatch};
use super::schema::{startings, users};
use super::{Store, StorageError, conflict_on_unique, now_utc, rfc3339};
use journey_shared::api::{StartingProgressDto, StartingStatsDto};

pub const STARTING_NOT_FOUND: &str = "Starting journey not found";

fn starting_of(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<Starting>, StorageError> {
    Ok(startings::table
        .filter(startings::user_id.eq(user_id))
        .order(startings::start_date.desc())
        .select(Starting::as_select())
        .first(conn)
        .optional()?)
}

impl Store {
    pub async fn latest_starting(&self, user_id: i32) -> Result<Option<Starting>, StorageError> {
        self.blocking(move |conn| starting_of(conn, user_id)).await
    }

    /// A user starts the journey once.
    pub async fn create_starting(
        &self,
        user_id: i32,
        title: &str,
        description: &str,
        status: &str,
    ) -> Result<Starting, StorageError> {
        let (title, description, status) =
            (title.to_string(), description.to_string(), status.to_string());
        self.blocking(move |conn| {
            let now = now_utc();
            diesel::insert_into(startings::table)
                .values(&NewStarting {
                    user_id,
                    title: &title,
                    description: &description,
                    status: &status,
                    start_date: now,
                    created_at: now,
                })
                .returning(Starting::as_returning())
                .get_result(conn)
                .map_err(|e| conflict_on_unique(e, "Journey already started"))
        })
        .await
    }

    /// Only the owner's record can be patched.
    pub async fn update_starting(
        &self,
        starting_id: i32,
        user_id: i32,
        patch: StartingPatch,
    ) -> Result<Starting, StorageError> {
        if patch.is_empty() {
            return Err(StorageError::InvalidInput("No fields to update".into()));
        }
        self.blocking(move |conn| {
            diesel::update(
                startings::table
                    .filter(startings::id.eq(starting_id))
                    .filter(startings::user_id.eq(user_id)),
            )
            .set(&patch)
            .returning(Starting::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Starting not found".into()))
        })
        .await
    }

    pub async fn starting_stats(&self, user_id: i32) -> Result<StartingStatsDto, StorageError> {
        use diesel::dsl::{max, min};
        self.blocking(move |conn| {
            let total_startings = startings::table
                .filter(startings::user_id.eq(user_id))
                .count()
                .get_result::<i64>(conn)?;
            let (first, latest) = startings::table
                .filter(startings::user_id.eq(user_id))
                .select((min(startings::start_date), max(startings::start_date)))
                .first::<(Option<chrono::NaiveDateTime>, Option<chrono::NaiveDateTime>)>(conn)?;
            let current_status = starting_of(conn, user_id)?.map(|s| s.status);
            Ok(StartingStatsDto {
                total_startings,
                first_start_date: first.map(rfc3339),
                latest_start_date: latest.map(rfc3339),
                current_status,
            })
        })
        .await
    }

    /// Counts accumulated since the journey began.
    pub async fn starting_progress(
        &self,
        user_id: i32,
    ) -> Result<StartingProgressDto, StorageError> {
        self.blocking(move |conn| {
            let starting = starting_of(conn, user_id)?
                .ok_or_else(|| StorageError::NotFound(STARTING_NOT_FOUND.into()))?;
            let total_points = users::table
                .find(user_id)
                .select(users::total_points)
                .first::<i32>(conn)?;
            Ok(StartingProgressDto {
                starting_id: starting.id,
                title: starting.title,
                status: starting.status,
                start_date: rfc3339(starting.start_date),
                missions_completed: missions_completed(conn, user_id)?,
                quizzes_passed: quizzes_passed(conn, user_id)?,
                volunteer_activities: volunteer_activity_count(conn, user_id)?,
                total_points,
            })
        })
        .await
    }
}
