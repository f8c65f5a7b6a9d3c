//! Catalog entries declared in the config file and upserted at startup.

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Deserialize;
use tracing::info;

use super::models::{NewGame, NewMission, NewQuiz, NewQuizQuestion, NewVolunteerActivity};
use super::schema::{games, missions, quiz_questions, quizzes, volunteer_activities};
use super::{Store, StorageError, now_utc};
use journey_shared::domain::CatalogStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct MissionSeed {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reward_points: i32,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSeed {
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
    "multiple_choice".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizSeed {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub reward_points: i32,
    pub time_limit: Option<i32>,
    #[serde(default = "default_passing_score")]
    pub passing_score: i32,
    #[serde(default)]
    pub status: CatalogStatus,
    #[serde(default)]
    pub questions: Vec<QuestionSeed>,
}

fn default_passing_score() -> i32 {
    70
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameSeed {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub reward_points: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: CatalogStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolunteerSeed {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub missions: Vec<MissionSeed>,
    #[serde(default)]
    pub quizzes: Vec<QuizSeed>,
    #[serde(default)]
    pub games: Vec<GameSeed>,
    #[serde(default)]
    pub volunteer_activities: Vec<VolunteerSeed>,
}

impl CatalogSeed {
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
            && self.quizzes.is_empty()
            && self.games.is_empty()
            && self.volunteer_activities.is_empty()
    }
}

impl Store {
    /// Upserts every seeded entry by title. A seeded quiz gets its questions
    /// only while it has none, so submitted answers keep matching ids.
    pub async fn seed_catalog(&self, seed: &CatalogSeed) -> Result<(), StorageError> {
        if seed.is_empty() {
            return Ok(());
        }
        let counts = (
            seed.missions.len(),
            seed.quizzes.len(),
            seed.games.len(),
            seed.volunteer_activities.len(),
        );
        let seed = seed.clone();
        self.blocking(move |conn| {
            conn.immediate_transaction(|conn| -> Result<(), StorageError> {
                let now = now_utc();
                for m in &seed.missions {
                    let row = NewMission {
                        title: m.title.clone(),
                        description: m.description.clone(),
                        reward_points: m.reward_points,
                        category: m.category.clone(),
                        difficulty: m.difficulty.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    diesel::insert_into(missions::table)
                        .values(&row)
                        .on_conflict(missions::title)
                        .do_update()
                        .set((
                            missions::description.eq(&row.description),
                            missions::reward_points.eq(row.reward_points),
                            missions::category.eq(&row.category),
                            missions::difficulty.eq(&row.difficulty),
                            missions::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                }

                for q in &seed.quizzes {
                    let row = NewQuiz {
                        title: q.title.clone(),
                        description: q.description.clone(),
                        category: q.category.clone(),
                        difficulty_level: q.difficulty_level.clone(),
                        reward_points: q.reward_points,
                        time_limit: q.time_limit,
                        passing_score: q.passing_score,
                        status: q.status.as_str().to_string(),
                        created_at: now,
                        updated_at: now,
                    };
                    let quiz_id: i32 = diesel::insert_into(quizzes::table)
                        .values(&row)
                        .on_conflict(quizzes::title)
                        .do_update()
                        .set((
                            quizzes::description.eq(&row.description),
                            quizzes::category.eq(&row.category),
                            quizzes::difficulty_level.eq(&row.difficulty_level),
                            quizzes::reward_points.eq(row.reward_points),
                            quizzes::time_limit.eq(row.time_limit),
                            quizzes::passing_score.eq(row.passing_score),
                            quizzes::status.eq(&row.status),
                            quizzes::updated_at.eq(now),
                        ))
                        .returning(quizzes::id)
                        .get_result(conn)?;
                    let existing = quiz_questions::table
                        .filter(quiz_questions::quiz_id.eq(quiz_id))
                        .count()
                        .get_result::<i64>(conn)?;
                    if existing > 0 || q.questions.is_empty() {
                        continue;
                    }
                    let rows: Vec<NewQuizQuestion> = q
                        .questions
                        .iter()
                        .map(|qs| NewQuizQuestion {
                            quiz_id,
                            question_text: qs.question_text.clone(),
                            question_type: qs.question_type.clone(),
                            option_a: qs.option_a.clone(),
                            option_b: qs.option_b.clone(),
                            option_c: qs.option_c.clone(),
                            option_d: qs.option_d.clone(),
                            correct_answer: qs.correct_answer.trim().to_uppercase(),
                        })
                        .collect();
                    diesel::insert_into(quiz_questions::table)
                        .values(&rows)
                        .execute(conn)?;
                }

                for g in &seed.games {
                    let row = NewGame {
                        title: g.title.clone(),
                        description: g.description.clone(),
                        genre: g.genre.clone(),
                        difficulty_level: g.difficulty_level.clone(),
                        reward_points: g.reward_points,
                        image_url: g.image_url.clone(),
                        status: g.status.as_str().to_string(),
                        created_at: now,
                        updated_at: now,
                    };
                    diesel::insert_into(games::table)
                        .values(&row)
                        .on_conflict(games::title)
                        .do_update()
                        .set((
                            games::description.eq(&row.description),
                            games::genre.eq(&row.genre),
                            games::difficulty_level.eq(&row.difficulty_level),
                            games::reward_points.eq(row.reward_points),
                            games::image_url.eq(&row.image_url),
                            games::status.eq(&row.status),
                            games::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                }

                for v in &seed.volunteer_activities {
                    let row = NewVolunteerActivity {
                        title: v.title.clone(),
                        description: v.description.clone(),
                        location: v.location.clone(),
                        start_date: v.start_date,
                        end_date: v.end_date,
                        created_at: now,
                    };
                    diesel::insert_into(volunteer_activities::table)
                        .values(&row)
                        .on_conflict(volunteer_activities::title)
                        .do_update()
                        .set((
                            volunteer_activities::description.eq(&row.description),
                            volunteer_activities::location.eq(&row.location),
                            volunteer_activities::start_date.eq(row.start_date),
                            volunteer_activities::end_date.eq(row.end_date),
                        ))
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await?;
        let (missions, quizzes, games, volunteer_activities) = counts;
        info!(missions, quizzes, games, volunteer_activities, "catalog seeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_defaults_apply() {
        let yaml = r#"
missions:
  - title: Say hello
    reward_points: 10
quizzes:
  - title: Basics
    questions:
      - question_text: Pick A
        option_a: First
        correct_answer: a
volunteer_activities:
  - title: Park cleanup
    start_date: 2025-05-01
"#;
        let seed: CatalogSeed = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.missions[0].description, "");
        assert_eq!(seed.quizzes[0].passing_score, 70);
        assert_eq!(seed.quizzes[0].status, CatalogStatus::Active);
        assert_eq!(seed.quizzes[0].questions[0].question_type, "multiple_choice");
        assert!(seed.games.is_empty());
        assert_eq!(
            seed.volunteer_activities[0].start_date,
            NaiveDate::from_ymd_opt(2025, 5, 1)
        );
        assert!(!seed.is_empty());
        assert!(CatalogSeed::default().is_empty());
    }
}
