use crate::storage::schema::{
    endings, friendships, game_completions, game_ratings, games, mission_completions, missions,
    point_awards, quiz_questions, quiz_results, quizzes, sessions, startings, users,
    volunteer_activities, volunteer_registrations,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i32,
    pub total_points: i32,
    pub role: String,
    pub profile_image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub age: i32,
    pub role: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub updated_at: Option<NaiveDateTime>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = missions)]
pub struct Mission {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub reward_points: i32,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = missions)]
pub struct NewMission {
    pub title: String,
    pub description: String,
    pub reward_points: i32,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = missions)]
pub struct MissionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_points: Option<i32>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

impl MissionPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.reward_points.is_none()
            && self.category.is_none()
            && self.difficulty.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = mission_completions)]
#[diesel(belongs_to(Mission, foreign_key = mission_id))]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct MissionCompletion {
    pub id: i32,
    pub user_id: i32,
    pub mission_id: i32,
    pub completed_date: NaiveDate,
    pub completed_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = mission_completions)]
pub struct NewMissionCompletion {
    pub user_id: i32,
    pub mission_id: i32,
    pub completed_date: NaiveDate,
    pub completed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = quizzes)]
pub struct Quiz {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: i32,
    pub time_limit: Option<i32>,
    pub passing_score: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quizzes)]
pub struct NewQuiz {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: i32,
    pub time_limit: Option<i32>,
    pub passing_score: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = quizzes)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: Option<i32>,
    pub time_limit: Option<i32>,
    pub passing_score: Option<i32>,
    pub status: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

impl QuizPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.difficulty_level.is_none()
            && self.reward_points.is_none()
            && self.time_limit.is_none()
            && self.passing_score.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = quiz_questions)]
#[diesel(belongs_to(Quiz, foreign_key = quiz_id))]
pub struct QuizQuestion {
    pub id: i32,
    pub quiz_id: i32,
    pub question_text: String,
    pub question_type: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quiz_questions)]
pub struct NewQuizQuestion {
    pub quiz_id: i32,
    pub question_text: String,
    pub question_type: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = quiz_results)]
#[diesel(belongs_to(Quiz, foreign_key = quiz_id))]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct QuizResult {
    pub id: i32,
    pub user_id: i32,
    pub quiz_id: i32,
    pub score: f64,
    pub passed: bool,
    pub reward_earned: i32,
    pub submitted_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = quiz_results)]
pub struct NewQuizResult {
    pub user_id: i32,
    pub quiz_id: i32,
    pub score: f64,
    pub passed: bool,
    pub reward_earned: i32,
    pub submitted_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = games)]
pub struct Game {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: i32,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = games)]
pub struct NewGame {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: i32,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = games)]
pub struct GamePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub reward_points: Option<i32>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

impl GamePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.genre.is_none()
            && self.difficulty_level.is_none()
            && self.reward_points.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
    }
}

#[derive(Insertable)]
#[diesel(table_name = game_completions)]
pub struct NewGameCompletion {
    pub user_id: i32,
    pub game_id: i32,
    pub completed_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = game_ratings)]
pub struct NewGameRating {
    pub user_id: i32,
    pub game_id: i32,
    pub rating: i32,
    pub rated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = startings)]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct Starting {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub start_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = startings)]
pub struct NewStarting<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub start_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = startings)]
pub struct StartingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl StartingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = endings)]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct Ending {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub completion_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = endings)]
pub struct NewEnding<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub completion_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = friendships)]
pub struct Friendship {
    pub id: i32,
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Friendship {
    /// The other side of the pair as seen by `me`.
    pub fn counterparty(&self, me: i32) -> i32 {
        if self.user_id_1 == me {
            self.user_id_2
        } else {
            self.user_id_1
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = friendships)]
pub struct NewFriendship<'a> {
    pub user_id_1: i32,
    pub user_id_2: i32,
    pub status: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = volunteer_activities)]
pub struct VolunteerActivity {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = volunteer_activities)]
pub struct NewVolunteerActivity {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = volunteer_registrations)]
#[diesel(belongs_to(VolunteerActivity, foreign_key = volunteer_id))]
pub struct VolunteerRegistration {
    pub id: i32,
    pub user_id: i32,
    pub volunteer_id: i32,
    pub registration_date: NaiveDateTime,
    pub status: String,
}

#[derive(Insertable)]
#[diesel(table_name = volunteer_registrations)]
pub struct NewVolunteerRegistration<'a> {
    pub user_id: i32,
    pub volunteer_id: i32,
    pub registration_date: NaiveDateTime,
    pub status: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = point_awards)]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct PointAward {
    pub id: i32,
    pub user_id: i32,
    pub source: String,
    pub source_id: i32,
    pub points: i32,
    pub description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = point_awards)]
pub struct NewPointAward<'a> {
    pub user_id: i32,
    pub source: &'a str,
    pub source_id: i32,
    pub points: i32,
    pub description: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
pub struct SessionRow {
    pub id: String,
    pub data: String,
    pub expires_at: i64,
}
