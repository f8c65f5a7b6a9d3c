//! Activity log, volunteering and friendships.

use std::collections::HashMap;

use diesel::dsl::count;
use diesel::expression_methods::AggregateExpressionMethods;
use diesel::prelude::*;
use tracing::info;

use super::models::{
    Friendship, Mission, MissionCompletion, NewFriendship, NewVolunteerRegistration, User,
    VolunteerActivity, VolunteerRegistration,
};
use super::schema::{
    friendships, mission_completions, missions, quiz_results, users, volunteer_activities,
    volunteer_registrations,
};
use super::{Store, StorageError, conflict_on_unique, now_utc, rfc3339};
use journey_shared::api::{
    ActivityLogDto, CompletedMissionDto, FriendDto, FriendshipDetailDto,
    MissionCompletionDetailDto, OnboardingInfoDto, VolunteerActivityDto,
};
use journey_shared::domain::FriendshipStatus;

pub(super) fn missions_completed(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<i64, StorageError> {
    Ok(mission_completions::table
        .filter(mission_completions::user_id.eq(user_id))
        .count()
        .get_result(conn)?)
}

pub(super) fn quizzes_passed(conn: &mut SqliteConnection, user_id: i32) -> Result<i64, StorageError> {
    Ok(quiz_results::table
        .filter(quiz_results::user_id.eq(user_id))
        .filter(quiz_results::passed.eq(true))
        .count()
        .get_result(conn)?)
}

pub(super) fn volunteer_activity_count(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<i64, StorageError> {
    Ok(volunteer_registrations::table
        .filter(volunteer_registrations::user_id.eq(user_id))
        .select(count(volunteer_registrations::volunteer_id).aggregate_distinct())
        .get_result(conn)?)
}

/// Accepted friendships involving the user; each pair is stored once.
pub(super) fn friend_count(conn: &mut SqliteConnection, user_id: i32) -> Result<i64, StorageError> {
    Ok(friendships::table
        .filter(
            friendships::user_id_1
                .eq(user_id)
                .or(friendships::user_id_2.eq(user_id)),
        )
        .filter(friendships::status.eq(FriendshipStatus::Accepted.as_str()))
        .count()
        .get_result(conn)?)
}

fn load_user(conn: &mut SqliteConnection, user_id: i32) -> Result<User, StorageError> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| StorageError::NotFound("User not found".into()))
}

fn pair_row(
    conn: &mut SqliteConnection,
    a: i32,
    b: i32,
) -> Result<Option<Friendship>, StorageError> {
    Ok(friendships::table
        .filter(
            (friendships::user_id_1.eq(a).and(friendships::user_id_2.eq(b)))
                .or(friendships::user_id_1.eq(b).and(friendships::user_id_2.eq(a))),
        )
        .select(Friendship::as_select())
        .first(conn)
        .optional()?)
}

fn parse_friendship_status(raw: &str) -> Result<FriendshipStatus, StorageError> {
    raw.parse()
        .map_err(|e: journey_shared::domain::UnknownVariant| StorageError::InvalidInput(e.to_string()))
}

fn volunteer_totals(conn: &mut SqliteConnection) -> Result<HashMap<i32, i64>, StorageError> {
    Ok(volunteer_registrations::table
        .group_by(volunteer_registrations::volunteer_id)
        .select((
            volunteer_registrations::volunteer_id,
            diesel::dsl::count(volunteer_registrations::id),
        ))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect())
}

fn volunteer_dto(
    activity: VolunteerActivity,
    registration: VolunteerRegistration,
    total_volunteers: i64,
) -> VolunteerActivityDto {
    VolunteerActivityDto {
        volunteer_id: activity.id,
        activity_name: activity.title,
        description: activity.description,
        location: activity.location,
        registration_date: rfc3339(registration.registration_date),
        status: registration.status,
        start_date: activity.start_date.map(|d| d.to_string()),
        end_date: activity.end_date.map(|d| d.to_string()),
        total_volunteers,
    }
}

impl Store {
    pub async fn onboarding_info(&self, user_id: i32) -> Result<OnboardingInfoDto, StorageError> {
        self.blocking(move |conn| {
            let user = load_user(conn, user_id)?;
            Ok(OnboardingInfoDto {
                user_id: user.id,
                onboarding_date: rfc3339(user.created_at),
            })
        })
        .await
    }

    /// One entry per completion, newest first, each carrying how many times
    /// the user has completed that mission overall.
    pub async fn completed_missions(
        &self,
        user_id: i32,
    ) -> Result<Vec<CompletedMissionDto>, StorageError> {
        self.blocking(move |conn| {
            let rows = mission_completions::table
                .inner_join(missions::table)
                .filter(mission_completions::user_id.eq(user_id))
                .order((
                    mission_completions::completed_at.desc(),
                    mission_completions::id.desc(),
                ))
                .select((MissionCompletion::as_select(), Mission::as_select()))
                .load::<(MissionCompletion, Mission)>(conn)?;
            let mut per_mission: HashMap<i32, i64> = HashMap::new();
            for (c, _) in &rows {
                *per_mission.entry(c.mission_id).or_default() += 1;
            }
            Ok(rows
                .into_iter()
                .map(|(c, m)| CompletedMissionDto {
                    mission_id: m.id,
                    mission_name: m.title,
                    description: m.description,
                    reward_points: m.reward_points,
                    completed_date: c.completed_date.to_string(),
                    total_times_completed: per_mission.get(&c.mission_id).copied().unwrap_or(0),
                })
                .collect())
        })
        .await
    }

    pub async fn mission_completion_details(
        &self,
        user_id: i32,
        mission_id: i32,
    ) -> Result<MissionCompletionDetailDto, StorageError> {
        self.blocking(move |conn| {
            let rows = mission_completions::table
                .inner_join(missions::table)
                .filter(mission_completions::user_id.eq(user_id))
                .filter(mission_completions::mission_id.eq(mission_id))
                .order(mission_completions::completed_at.desc())
                .select((MissionCompletion::as_select(), Mission::as_select()))
                .load::<(MissionCompletion, Mission)>(conn)?;
            let count = rows.len() as i64;
            let (last, mission) = rows
                .into_iter()
                .next()
                .ok_or_else(|| StorageError::NotFound("Mission completion not found".into()))?;
            Ok(MissionCompletionDetailDto {
                mission_id: mission.id,
                mission_name: mission.title,
                description: mission.description,
                reward_points: mission.reward_points,
                last_completed_date: last.completed_date.to_string(),
                completion_count: count,
            })
        })
        .await
    }

    pub async fn volunteer_activities_for(
        &self,
        user_id: i32,
    ) -> Result<Vec<VolunteerActivityDto>, StorageError> {
        self.blocking(move |conn| {
            let rows = volunteer_registrations::table
                .inner_join(volunteer_activities::table)
                .filter(volunteer_registrations::user_id.eq(user_id))
                .order(volunteer_registrations::registration_date.desc())
                .select((
                    VolunteerActivity::as_select(),
                    VolunteerRegistration::as_select(),
                ))
                .load::<(VolunteerActivity, VolunteerRegistration)>(conn)?;
            let totals = volunteer_totals(conn)?;
            Ok(rows
                .into_iter()
                .map(|(a, r)| {
                    let total = totals.get(&a.id).copied().unwrap_or(0);
                    volunteer_dto(a, r, total)
                })
                .collect())
        })
        .await
    }

    pub async fn volunteer_details(
        &self,
        user_id: i32,
        volunteer_id: i32,
    ) -> Result<VolunteerActivityDto, StorageError> {
        self.blocking(move |conn| {
            let (a, r) = volunteer_registrations::table
                .inner_join(volunteer_activities::table)
                .filter(volunteer_registrations::user_id.eq(user_id))
                .filter(volunteer_registrations::volunteer_id.eq(volunteer_id))
                .select((
                    VolunteerActivity::as_select(),
                    VolunteerRegistration::as_select(),
                ))
                .first::<(VolunteerActivity, VolunteerRegistration)>(conn)
                .optional()?
                .ok_or_else(|| StorageError::NotFound("Volunteer activity not found".into()))?;
            let total = volunteer_registrations::table
                .filter(volunteer_registrations::volunteer_id.eq(volunteer_id))
                .count()
                .get_result::<i64>(conn)?;
            Ok(volunteer_dto(a, r, total))
        })
        .await
    }

    pub async fn register_volunteer(
        &self,
        user_id: i32,
        volunteer_id: i32,
    ) -> Result<VolunteerRegistration, StorageError> {
        self.blocking(move |conn| {
            let exists = volunteer_activities::table
                .find(volunteer_id)
                .count()
                .get_result::<i64>(conn)?;
            if exists == 0 {
                return Err(StorageError::NotFound("Volunteer activity not found".into()));
            }
            diesel::insert_into(volunteer_registrations::table)
                .values(&NewVolunteerRegistration {
                    user_id,
                    volunteer_id,
                    registration_date: now_utc(),
                    status: "registered",
                })
                .returning(VolunteerRegistration::as_returning())
                .get_result(conn)
                .map_err(|e| conflict_on_unique(e, "Already registered for this activity"))
        })
        .await
    }

    /// Accepted friends, newest friendship first.
    pub async fn list_friends(&self, user_id: i32) -> Result<Vec<FriendDto>, StorageError> {
        self.blocking(move |conn| {
            let rows = friendships::table
                .filter(
                    friendships::user_id_1
                        .eq(user_id)
                        .or(friendships::user_id_2.eq(user_id)),
                )
                .filter(friendships::status.eq(FriendshipStatus::Accepted.as_str()))
                .order((friendships::created_at.desc(), friendships::id.desc()))
                .select(Friendship::as_select())
                .load(conn)?;
            let ids: Vec<i32> = rows.iter().map(|f| f.counterparty(user_id)).collect();
            let people: HashMap<i32, User> = users::table
                .filter(users::id.eq_any(ids))
                .select(User::as_select())
                .load(conn)?
                .into_iter()
                .map(|u| (u.id, u))
                .collect();
            let mut out = Vec::with_capacity(rows.len());
            for f in rows {
                let Some(friend) = people.get(&f.counterparty(user_id)) else {
                    continue;
                };
                out.push(FriendDto {
                    friend_id: friend.id,
                    friend_name: friend.name.clone(),
                    friend_age: friend.age,
                    friend_email: friend.email.clone(),
                    friendship_date: rfc3339(f.created_at),
                    friendship_status: parse_friendship_status(&f.status)?,
                });
            }
            Ok(out)
        })
        .await
    }

    pub async fn friendship_details(
        &self,
        user_id: i32,
        friend_id: i32,
    ) -> Result<FriendshipDetailDto, StorageError> {
        self.blocking(move |conn| {
            let f = pair_row(conn, user_id, friend_id)?
                .ok_or_else(|| StorageError::NotFound("Friendship not found".into()))?;
            let friend = load_user(conn, f.counterparty(user_id))?;
            Ok(FriendshipDetailDto {
                friendship_id: f.id,
                friend_id: friend.id,
                friend_name: friend.name,
                friend_age: friend.age,
                friend_email: friend.email,
                friendship_date: rfc3339(f.created_at),
                last_interaction: rfc3339(f.updated_at),
                friendship_status: parse_friendship_status(&f.status)?,
            })
        })
        .await
    }

    /// Stores a pending pair with the requester as `user_id_1`.
    pub async fn request_friend(
        &self,
        user_id: i32,
        target_id: i32,
    ) -> Result<Friendship, StorageError> {
        if user_id == target_id {
            return Err(StorageError::InvalidInput(
                "You cannot send a friend request to yourself".into(),
            ));
        }
        let row = self
            .blocking(move |conn| {
                conn.immediate_transaction(|conn| -> Result<Friendship, StorageError> {
                    load_user(conn, target_id)?;
                    if pair_row(conn, user_id, target_id)?.is_some() {
                        return Err(StorageError::Conflict("Friendship already exists".into()));
                    }
                    let now = now_utc();
                    diesel::insert_into(friendships::table)
                        .values(&NewFriendship {
                            user_id_1: user_id,
                            user_id_2: target_id,
                            status: FriendshipStatus::Pending.as_str(),
                            created_at: now,
                            updated_at: now,
                        })
                        .returning(Friendship::as_returning())
                        .get_result(conn)
                        .map_err(|e| conflict_on_unique(e, "Friendship already exists"))
                })
            })
            .await?;
        info!(from = user_id, to = target_id, "friend request sent");
        Ok(row)
    }

    /// Accepts a pending request that `requester_id` sent to `user_id`.
    pub async fn accept_friend(
        &self,
        user_id: i32,
        requester_id: i32,
    ) -> Result<Friendship, StorageError> {
        self.blocking(move |conn| {
            diesel::update(
                friendships::table
                    .filter(friendships::user_id_1.eq(requester_id))
                    .filter(friendships::user_id_2.eq(user_id))
                    .filter(friendships::status.eq(FriendshipStatus::Pending.as_str())),
            )
            .set((
                friendships::status.eq(FriendshipStatus::Accepted.as_str()),
                friendships::updated_at.eq(now_utc()),
            ))
            .returning(Friendship::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| StorageError::NotFound("Friend request not found".into()))
        })
        .await
    }

    pub async fn activity_log(&self, user_id: i32) -> Result<ActivityLogDto, StorageError> {
        self.blocking(move |conn| {
            let user = load_user(conn, user_id)?;
            Ok(ActivityLogDto {
                user_id: user.id,
                name: user.name,
                email: user.email,
                age: user.age,
                onboarding_date: rfc3339(user.created_at),
                total_missions_completed: missions_completed(conn, user_id)?,
                total_volunteer_activities: volunteer_activity_count(conn, user_id)?,
                total_friends: friend_count(conn, user_id)?,
                total_points: user.total_points,
            })
        })
        .await
    }
}
