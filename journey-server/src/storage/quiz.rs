use std::collections::HashMap;

use diesel::prelude::*;
use tracing::info;

use super::models::{
    NewQuiz, NewQuizQuestion, NewQuizResult, Quiz, QuizPatch, QuizQuestion, QuizResult,
};
use super::points::award_points;
use super::schema::{quiz_questions, quiz_results, quizzes, users};
use super::{Store, StorageError, conflict_on_unique, now_utc};
use journey_shared::api::QuizStatsDto;
use journey_shared::domain::{CatalogStatus, PointSource};

pub const QUIZ_NOT_FOUND: &str = "Quiz not found";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizScore {
    pub score: f64,
    pub passed: bool,
    pub correct: usize,
    pub total: usize,
}

/// Counts exact matches against each question's correct option. A quiz with
/// no questions scores 0.
pub fn score_answers(
    questions: &[QuizQuestion],
    answers: &HashMap<i32, String>,
    passing_score: i32,
) -> QuizScore {
    let total = questions.len();
    let correct = questions
        .iter()
        .filter(|q| answers.get(&q.id).is_some_and(|a| *a == q.correct_answer))
        .count();
    let score = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };
    QuizScore {
        score,
        passed: score >= f64::from(passing_score),
        correct,
        total,
    }
}

#[derive(Debug, Clone)]
pub struct QuizOutcome {
    pub result: QuizResult,
    pub score: QuizScore,
    pub user_total_points: i32,
}

fn question_counts(conn: &mut SqliteConnection) -> Result<HashMap<i32, i64>, StorageError> {
    Ok(quiz_questions::table
        .group_by(quiz_questions::quiz_id)
        .select((quiz_questions::quiz_id, diesel::dsl::count(quiz_questions::id)))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect())
}

fn load_quiz(conn: &mut SqliteConnection, quiz_id: i32) -> Result<Quiz, StorageError> {
    quizzes::table
        .find(quiz_id)
        .select(Quiz::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| StorageError::NotFound(QUIZ_NOT_FOUND.into()))
}

impl Store {
    /// Active quizzes, newest first, with their question counts.
    pub async fn list_active_quizzes(&self) -> Result<Vec<(Quiz, i64)>, StorageError> {
        self.blocking(|conn| {
            let rows = quizzes::table
                .filter(quizzes::status.eq(CatalogStatus::Active.as_str()))
                .order((quizzes::created_at.desc(), quizzes::id.desc()))
                .select(Quiz::as_select())
                .load(conn)?;
            let counts = question_counts(conn)?;
            Ok(rows
                .into_iter()
                .map(|q| {
                    let n = counts.get(&q.id).copied().unwrap_or(0);
                    (q, n)
                })
                .collect())
        })
        .await
    }

    pub async fn get_quiz_with_questions(
        &self,
        quiz_id: i32,
    ) -> Result<(Quiz, Vec<QuizQuestion>), StorageError> {
        self.blocking(move |conn| {
            let quiz = load_quiz(conn, quiz_id)?;
            let questions = QuizQuestion::belonging_to(&quiz)
                .order(quiz_questions::id.asc())
                .select(QuizQuestion::as_select())
                .load(conn)?;
            Ok((quiz, questions))
        })
        .await
    }

    /// Scores the answers, stores a result row and awards the reward on a
    /// pass, all in one immediate transaction.
    pub async fn submit_quiz(
        &self,
        user_id: i32,
        quiz_id: i32,
        answers: HashMap<i32, String>,
    ) -> Result<QuizOutcome, StorageError> {
        let outcome = self
            .blocking(move |conn| {
                conn.immediate_transaction(|conn| -> Result<QuizOutcome, StorageError> {
                    let quiz = load_quiz(conn, quiz_id)?;
                    if quiz.status != CatalogStatus::Active.as_str() {
                        return Err(StorageError::InvalidInput(
                            "Quiz is not available for submission".into(),
                        ));
                    }
                    let questions = QuizQuestion::belonging_to(&quiz)
                        .select(QuizQuestion::as_select())
                        .load(conn)?;
                    let score = score_answers(&questions, &answers, quiz.passing_score);
                    let reward = if score.passed { quiz.reward_points } else { 0 };
                    let result = diesel::insert_into(quiz_results::table)
                        .values(&NewQuizResult {
                            user_id,
                            quiz_id,
                            score: score.score,
                            passed: score.passed,
                            reward_earned: reward,
                            submitted_at: now_utc(),
                        })
                        .returning(QuizResult::as_returning())
                        .get_result(conn)?;
                    let total = award_points(
                        conn,
                        user_id,
                        PointSource::Quiz,
                        quiz.id,
                        reward,
                        &quiz.title,
                    )?;
                    Ok(QuizOutcome {
                        result,
                        score,
                        user_total_points: total,
                    })
                })
            })
            .await?;
        info!(
            user_id,
            quiz_id,
            score = outcome.score.score,
            passed = outcome.score.passed,
            "quiz submitted"
        );
        Ok(outcome)
    }

    /// Newest result by `submitted_at`, ties broken by id.
    pub async fn latest_quiz_result(
        &self,
        user_id: i32,
        quiz_id: i32,
    ) -> Result<Option<(QuizResult, String)>, StorageError> {
        self.blocking(move |conn| {
            Ok(quiz_results::table
                .inner_join(quizzes::table)
                .filter(quiz_results::user_id.eq(user_id))
                .filter(quiz_results::quiz_id.eq(quiz_id))
                .order((quiz_results::submitted_at.desc(), quiz_results::id.desc()))
                .select((QuizResult::as_select(), quizzes::title))
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn quiz_history(
        &self,
        user_id: i32,
    ) -> Result<Vec<(QuizResult, String)>, StorageError> {
        self.blocking(move |conn| {
            Ok(quiz_results::table
                .inner_join(quizzes::table)
                .filter(quiz_results::user_id.eq(user_id))
                .order((quiz_results::submitted_at.desc(), quiz_results::id.desc()))
                .select((QuizResult::as_select(), quizzes::title))
                .load(conn)?)
        })
        .await
    }

    /// Inserts the quiz and its question bank together.
    pub async fn create_quiz(
        &self,
        new: NewQuiz,
        questions: Vec<NewQuizQuestion>,
    ) -> Result<(Quiz, i64), StorageError> {
        self.blocking(move |conn| {
            conn.immediate_transaction(|conn| -> Result<(Quiz, i64), StorageError> {
                let quiz = diesel::insert_into(quizzes::table)
                    .values(&new)
                    .returning(Quiz::as_returning())
                    .get_result(conn)
                    .map_err(|e| conflict_on_unique(e, "A quiz with this title already exists"))?;
                let rows: Vec<NewQuizQuestion> = questions
                    .into_iter()
                    .map(|q| NewQuizQuestion {
                        quiz_id: quiz.id,
                        ..q
                    })
                    .collect();
                if rows.is_empty() {
                    return Ok((quiz, 0));
                }
                let n = diesel::insert_into(quiz_questions::table)
                    .values(&rows)
                    .execute(conn)?;
                Ok((quiz, n as i64))
            })
        })
        .await
    }

    pub async fn update_quiz(&self, quiz_id: i32, patch: QuizPatch) -> Result<Quiz, StorageError> {
        if patch.is_empty() {
            return Err(StorageError::InvalidInput(
                "At least one field is required to update".into(),
            ));
        }
        self.blocking(move |conn| {
            let patch = QuizPatch {
                updated_at: Some(now_utc()),
                ..patch
            };
            diesel::update(quizzes::table.find(quiz_id))
                .set(&patch)
                .returning(Quiz::as_returning())
                .get_result(conn)
                .optional()
                .map_err(|e| conflict_on_unique(e, "A quiz with this title already exists"))?
                .ok_or_else(|| StorageError::NotFound(QUIZ_NOT_FOUND.into()))
        })
        .await
    }

    /// Every submission for the quiz with the submitter's name, newest first.
    pub async fn quiz_attempts(
        &self,
        quiz_id: i32,
    ) -> Result<Vec<(QuizResult, String)>, StorageError> {
        self.blocking(move |conn| {
            load_quiz(conn, quiz_id)?;
            Ok(quiz_results::table
                .inner_join(users::table)
                .filter(quiz_results::quiz_id.eq(quiz_id))
                .order((quiz_results::submitted_at.desc(), quiz_results::id.desc()))
                .select((QuizResult::as_select(), users::name))
                .load(conn)?)
        })
        .await
    }

    pub async fn quiz_stats(&self, quiz_id: i32) -> Result<QuizStatsDto, StorageError> {
        use diesel::dsl::{avg, count};
        use diesel::expression_methods::AggregateExpressionMethods;
        self.blocking(move |conn| {
            let quiz = load_quiz(conn, quiz_id)?;
            let total_attempts = quiz_results::table
                .filter(quiz_results::quiz_id.eq(quiz_id))
                .count()
                .get_result::<i64>(conn)?;
            let unique_users = quiz_results::table
                .filter(quiz_results::quiz_id.eq(quiz_id))
                .select(count(quiz_results::user_id).aggregate_distinct())
                .get_result::<i64>(conn)?;
            let passed_count = quiz_results::table
                .filter(quiz_results::quiz_id.eq(quiz_id))
                .filter(quiz_results::passed.eq(true))
                .count()
                .get_result::<i64>(conn)?;
            let average_score = quiz_results::table
                .filter(quiz_results::quiz_id.eq(quiz_id))
                .select(avg(quiz_results::score))
                .get_result::<Option<f64>>(conn)?;
            let question_count = quiz_questions::table
                .filter(quiz_questions::quiz_id.eq(quiz_id))
                .count()
                .get_result::<i64>(conn)?;
            Ok(QuizStatsDto {
                quiz_id: quiz.id,
                title: quiz.title,
                total_attempts,
                unique_users,
                passed_count,
                average_score,
                question_count,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: i32, correct: &str) -> QuizQuestion {
        QuizQuestion {
            id,
            quiz_id: 1,
            question_text: format!("question {id}"),
            question_type: "multiple_choice".into(),
            option_a: Some("a".into()),
            option_b: Some("b".into()),
            option_c: None,
            option_d: None,
            correct_answer: correct.into(),
        }
    }

    fn answers(pairs: &[(i32, &str)]) -> HashMap<i32, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn scores_percentage_of_exact_matches() {
        let qs = [q(1, "A"), q(2, "B"), q(3, "C"), q(4, "D")];
        let s = score_answers(&qs, &answers(&[(1, "A"), (2, "B"), (3, "c")]), 50);
        assert_eq!(s.correct, 2);
        assert_eq!(s.total, 4);
        assert_eq!(s.score, 50.0);
        assert!(s.passed);
    }

    #[test]
    fn fails_below_threshold() {
        let qs = [q(1, "A"), q(2, "B"), q(3, "C")];
        let s = score_answers(&qs, &answers(&[(1, "A")]), 70);
        assert!(s.score > 33.0 && s.score < 34.0);
        assert!(!s.passed);
    }

    #[test]
    fn empty_quiz_scores_zero_and_fails_positive_threshold() {
        let s = score_answers(&[], &answers(&[(1, "A")]), 60);
        assert_eq!(s.score, 0.0);
        assert!(!s.passed);
        assert_eq!(s.total, 0);
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let qs = [q(1, "A")];
        let s = score_answers(&qs, &answers(&[(99, "A"), (1, "A")]), 100);
        assert_eq!(s.score, 100.0);
        assert!(s.passed);
    }
}
