//! Missions, quizzes and games.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::CatalogStatus;

// Missions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDto {
    pub mission_id: i32,
    pub title: String,
    pub description: String,
    pub reward_points: i32,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: String,
}

/// A mission as seen by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMissionDto {
    #[serde(flatten)]
    pub mission: MissionDto,
    pub completed_today: bool,
    pub completion_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionCompleteResp {
    pub mission_id: i32,
    pub reward_points: i32,
    pub completed_at: String,
    pub user_total_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionCompletionDto {
    pub completion_id: i32,
    pub mission_id: i32,
    pub title: String,
    pub reward_points: i32,
    pub completed_date: String, // YYYY-MM-DD
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionAvailabilityDto {
    pub mission_id: i32,
    pub available: bool,
    pub completed_today: bool,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MissionCreateReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_points: Option<i32>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MissionPatchReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_points: Option<i32>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

// Quizzes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDto {
    pub quiz_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: i32,
    pub time_limit: Option<i32>,
    pub passing_score: i32,
    pub status: CatalogStatus,
    pub created_at: String,
    pub updated_at: String,
    pub question_count: i64,
}

/// Question as shown to a player; the correct answer is never sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestionDto {
    pub question_id: i32,
    pub question_text: String,
    pub question_type: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDetailDto {
    #[serde(flatten)]
    pub quiz: QuizDto,
    pub questions: Vec<QuizQuestionDto>,
}

/// Keys are question ids, values are option letters.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QuizSubmitReq {
    pub answers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmitResp {
    pub result_id: i32,
    pub score: f64,
    pub passed: bool,
    pub reward_earned: i32,
    pub total_questions: usize,
    pub correct_answers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResultDto {
    pub result_id: i32,
    pub quiz_id: i32,
    pub quiz_title: String,
    pub score: f64,
    pub passed: bool,
    pub reward_earned: i32,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizHistoryDto {
    pub total_quizzes_attempted: usize,
    pub history: Vec<QuizResultDto>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QuizQuestionInput {
    pub question_text: String,
    #[serde(default = "default_question_type")]
    pub question_type: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: String,
}

fn default_question_type() -> String {
    "multiple_choice".to_string()
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QuizCreateReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: Option<i32>,
    pub time_limit: Option<i32>,
    pub passing_score: Option<i32>,
    pub status: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuizQuestionInput>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QuizPatchReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: Option<i32>,
    pub time_limit: Option<i32>,
    pub passing_score: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttemptDto {
    pub result_id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub score: f64,
    pub passed: bool,
    pub reward_earned: i32,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizStatsDto {
    pub quiz_id: i32,
    pub title: String,
    pub total_attempts: i64,
    pub unique_users: i64,
    pub passed_count: i64,
    pub average_score: Option<f64>,
    pub question_count: i64,
}

// Games
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDto {
    pub game_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: i32,
    pub image_url: Option<String>,
    pub status: CatalogStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDetailDto {
    #[serde(flatten)]
    pub game: GameDto,
    pub total_completions: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GameCreateReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: Option<i32>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GamePatchReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: Option<i32>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GameSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRateReq {
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRatingDto {
    pub game_id: i32,
    pub rating: i32,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCompleteResp {
    pub game_id: i32,
    pub reward_points: i32,
    pub completed_at: String,
    pub user_total_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatsDto {
    pub game_id: i32,
    pub title: String,
    pub total_completions: i64,
    pub unique_players: i64,
    pub average_rating: Option<f64>,
    pub total_ratings: i64,
    pub total_rewards_distributed: i64,
}
