//! Starting/ending bookends, the activity log and friendships.

use serde::{Deserialize, Serialize};

use crate::domain::FriendshipStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartingDto {
    pub starting_id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub start_date: String,
    pub created_at: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BookendCreateReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BookendPatchReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartingStatsDto {
    pub total_startings: i64,
    pub first_start_date: Option<String>,
    pub latest_start_date: Option<String>,
    pub current_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartingProgressDto {
    pub starting_id: i32,
    pub title: String,
    pub status: String,
    pub start_date: String,
    pub missions_completed: i64,
    pub quizzes_passed: i64,
    pub volunteer_activities: i64,
    pub total_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingDto {
    pub ending_id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub completion_date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingSummaryDto {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub total_points: i32,
    pub missions_completed: i64,
    pub quizzes_passed: i64,
    pub volunteer_activities: i64,
    pub total_friends: i64,
    pub last_ending_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingStatsDto {
    pub total_endings: i64,
    pub most_recent_ending: Option<String>,
    pub latest_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyCompletionDto {
    pub journey_completed: bool,
}

// Activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingInfoDto {
    pub user_id: i32,
    pub onboarding_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedMissionDto {
    pub mission_id: i32,
    pub mission_name: String,
    pub description: String,
    pub reward_points: i32,
    pub completed_date: String,
    pub total_times_completed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionCompletionDetailDto {
    pub mission_id: i32,
    pub mission_name: String,
    pub description: String,
    pub reward_points: i32,
    pub last_completed_date: String,
    pub completion_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerActivityDto {
    pub volunteer_id: i32,
    pub activity_name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub registration_date: String,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_volunteers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerRegistrationDto {
    pub volunteer_id: i32,
    pub registration_date: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendDto {
    pub friend_id: i32,
    pub friend_name: String,
    pub friend_age: i32,
    pub friend_email: String,
    pub friendship_date: String,
    pub friendship_status: FriendshipStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendsDto {
    pub total_friends: usize,
    pub friends: Vec<FriendDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipDetailDto {
    pub friendship_id: i32,
    pub friend_id: i32,
    pub friend_name: String,
    pub friend_age: i32,
    pub friend_email: String,
    pub friendship_date: String,
    pub last_interaction: String,
    pub friendship_status: FriendshipStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipDto {
    pub friendship_id: i32,
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub status: FriendshipStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogDto {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub onboarding_date: String,
    pub total_missions_completed: i64,
    pub total_volunteer_activities: i64,
    pub total_friends: i64,
    pub total_points: i32,
}
