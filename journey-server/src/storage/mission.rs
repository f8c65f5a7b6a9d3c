use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use tracing::{info, trace};

use super::models::{Mission, MissionCompletion, MissionPatch, NewMission, NewMissionCompletion};
use super::points::award_points;
use super::schema::{mission_completions, missions};
use super::{Store, StorageError, conflict_on_unique, is_unique_violation, now_utc};
use journey_shared::domain::PointSource;

pub const MISSION_NOT_FOUND: &str = "Mission not found";
pub const ALREADY_COMPLETED_TODAY: &str = "Mission already completed today. Come back tomorrow!";

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub mission: Mission,
    pub completed_at: NaiveDateTime,
    pub user_total_points: i32,
}

impl Store {
    pub async fn list_missions(&self) -> Result<Vec<Mission>, StorageError> {
        self.blocking(|conn| {
            Ok(missions::table
                .order(missions::id.asc())
                .select(Mission::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_mission(&self, mission_id: i32) -> Result<Option<Mission>, StorageError> {
        self.blocking(move |conn| {
            Ok(missions::table
                .find(mission_id)
                .select(Mission::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Every mission with the user's `completed_today` flag and lifetime count.
    pub async fn missions_for_user(
        &self,
        user_id: i32,
        today: NaiveDate,
    ) -> Result<Vec<(Mission, bool, i64)>, StorageError> {
        self.blocking(move |conn| {
            let all = missions::table
                .order(missions::id.asc())
                .select(Mission::as_select())
                .load(conn)?;
            let counts: HashMap<i32, i64> = mission_completions::table
                .filter(mission_completions::user_id.eq(user_id))
                .group_by(mission_completions::mission_id)
                .select((
                    mission_completions::mission_id,
                    diesel::dsl::count(mission_completions::id),
                ))
                .load::<(i32, i64)>(conn)?
                .into_iter()
                .collect();
            let done_today: HashSet<i32> = mission_completions::table
                .filter(mission_completions::user_id.eq(user_id))
                .filter(mission_completions::completed_date.eq(today))
                .select(mission_completions::mission_id)
                .load::<i32>(conn)?
                .into_iter()
                .collect();
            Ok(all
                .into_iter()
                .map(|m| {
                    let count = counts.get(&m.id).copied().unwrap_or(0);
                    let today = done_today.contains(&m.id);
                    (m, today, count)
                })
                .collect())
        })
        .await
    }

    pub async fn mission_for_user(
        &self,
        user_id: i32,
        mission_id: i32,
        today: NaiveDate,
    ) -> Result<(Mission, bool, i64), StorageError> {
        self.blocking(move |conn| {
            let mission = missions::table
                .find(mission_id)
                .select(Mission::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| StorageError::NotFound(MISSION_NOT_FOUND.into()))?;
            let count = mission_completions::table
                .filter(mission_completions::user_id.eq(user_id))
                .filter(mission_completions::mission_id.eq(mission_id))
                .count()
                .get_result::<i64>(conn)?;
            let today = completed_on(conn, user_id, mission_id, today)?;
            Ok((mission, today, count))
        })
        .await
    }

    /// Records today's completion and awards the mission's points in one
    /// immediate transaction. The `(user, mission, date)` unique index backs
    /// up the explicit check when two requests race.
    pub async fn complete_mission(
        &self,
        user_id: i32,
        mission_id: i32,
        today: NaiveDate,
    ) -> Result<CompletionOutcome, StorageError> {
        trace!(user_id, mission_id, %today, "complete_mission starting");
        let outcome = self
            .blocking(move |conn| {
                conn.immediate_transaction(|conn| -> Result<CompletionOutcome, StorageError> {
                    let mission = missions::table
                        .find(mission_id)
                        .select(Mission::as_select())
                        .first(conn)
                        .optional()?
                        .ok_or_else(|| StorageError::NotFound(MISSION_NOT_FOUND.into()))?;
                    if completed_on(conn, user_id, mission_id, today)? {
                        return Err(StorageError::Conflict(ALREADY_COMPLETED_TODAY.into()));
                    }
                    let now = now_utc();
                    diesel::insert_into(mission_completions::table)
                        .values(&NewMissionCompletion {
                            user_id,
                            mission_id,
                            completed_date: today,
                            completed_at: now,
                        })
                        .execute(conn)
                        .map_err(|e| {
                            if is_unique_violation(&e) {
                                StorageError::Conflict(ALREADY_COMPLETED_TODAY.into())
                            } else {
                                StorageError::Database(e)
                            }
                        })?;
                    let total = award_points(
                        conn,
                        user_id,
                        PointSource::Mission,
                        mission.id,
                        mission.reward_points,
                        &mission.title,
                    )?;
                    Ok(CompletionOutcome {
                        mission,
                        completed_at: now,
                        user_total_points: total,
                    })
                })
            })
            .await?;
        info!(
            user_id,
            mission_id,
            reward = outcome.mission.reward_points,
            total = outcome.user_total_points,
            "mission completed"
        );
        Ok(outcome)
    }

    /// `true` when the mission can still be completed today.
    pub async fn mission_available(
        &self,
        user_id: i32,
        mission_id: i32,
        today: NaiveDate,
    ) -> Result<bool, StorageError> {
        self.blocking(move |conn| {
            let exists = missions::table
                .find(mission_id)
                .count()
                .get_result::<i64>(conn)?
                > 0;
            if !exists {
                return Err(StorageError::NotFound(MISSION_NOT_FOUND.into()));
            }
            Ok(!completed_on(conn, user_id, mission_id, today)?)
        })
        .await
    }

    /// The user's completions, newest first.
    pub async fn mission_history(
        &self,
        user_id: i32,
    ) -> Result<Vec<(MissionCompletion, Mission)>, StorageError> {
        self.blocking(move |conn| {
            Ok(mission_completions::table
                .inner_join(missions::table)
                .filter(mission_completions::user_id.eq(user_id))
                .order((
                    mission_completions::completed_at.desc(),
                    mission_completions::id.desc(),
                ))
                .select((MissionCompletion::as_select(), Mission::as_select()))
                .load(conn)?)
        })
        .await
    }

    pub async fn create_mission(&self, new: NewMission) -> Result<Mission, StorageError> {
        self.blocking(move |conn| {
            diesel::insert_into(missions::table)
                .values(&new)
                .returning(Mission::as_returning())
                .get_result(conn)
                .map_err(|e| conflict_on_unique(e, "A mission with this title already exists"))
        })
        .await
    }

    pub async fn update_mission(
        &self,
        mission_id: i32,
        patch: MissionPatch,
    ) -> Result<Mission, StorageError> {
        if patch.is_empty() {
            return Err(StorageError::InvalidInput(
                "At least one field is required to update".into(),
            ));
        }
        self.blocking(move |conn| {
            let patch = MissionPatch {
                updated_at: Some(now_utc()),
                ..patch
            };
            diesel::update(missions::table.find(mission_id))
                .set(&patch)
                .returning(Mission::as_returning())
                .get_result(conn)
                .optional()
                .map_err(|e| conflict_on_unique(e, "A mission with this title already exists"))?
                .ok_or_else(|| StorageError::NotFound(MISSION_NOT_FOUND.into()))
        })
        .await
    }

    pub async fn delete_mission(&self, mission_id: i32) -> Result<(), StorageError> {
        self.blocking(move |conn| {
            let n = diesel::delete(missions::table.find(mission_id)).execute(conn)?;
            if n == 0 {
                return Err(StorageError::NotFound(MISSION_NOT_FOUND.into()));
            }
            Ok(())
        })
        .await
    }
}

fn completed_on(
    conn: &mut SqliteConnection,
    user_id: i32,
    mission_id: i32,
    day: NaiveDate,
) -> Result<bool, StorageError> {
    let n = mission_completions::table
        .filter(mission_completions::user_id.eq(user_id))
        .filter(mission_completions::mission_id.eq(mission_id))
        .filter(mission_completions::completed_date.eq(day))
        .count()
        .get_result::<i64>(conn)?;
    Ok(n > 0)
}
