use std::collections::{BTreeMap, HashMap};

use axum::Json;
use axum::extract::{Extension, State};
use journey_shared::api::{
    ApiResponse, QuizAttemptDto, QuizCreateReq, QuizDetailDto, QuizDto, QuizHistoryDto,
    QuizPatchReq, QuizQuestionDto, QuizResultDto, QuizStatsDto, QuizSubmitReq, QuizSubmitResp,
};
use journey_shared::domain::CatalogStatus;
use journey_shared::validate::{
    ValidationError, validate_passing_score, validate_reward_points, validate_time_limit,
};

use super::auth::AuthCtx;
use super::{ApiResult, AppError, AppState, Id, JsonBody, non_blank, ok};
use crate::storage::models::{NewQuiz, NewQuizQuestion, Quiz, QuizPatch, QuizQuestion, QuizResult};
use crate::storage::{now_utc, rfc3339};

const DEFAULT_PASSING_SCORE: i32 = 70;

/// Unknown strings are rejected with the allowed set in the message.
pub(super) fn parse_status(raw: Option<String>) -> Result<Option<CatalogStatus>, ValidationError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(s) => s
            .to_ascii_lowercase()
            .parse()
            .map(Some)
            .map_err(|_| ValidationError::InvalidStatus),
    }
}

pub(super) fn quiz_dto(q: Quiz, question_count: i64) -> QuizDto {
    QuizDto {
        quiz_id: q.id,
        status: q.status.parse().unwrap_or_default(),
        title: q.title,
        description: q.description,
        category: q.category,
        difficulty_level: q.difficulty_level,
        reward_points: q.reward_points,
        time_limit: q.time_limit,
        passing_score: q.passing_score,
        created_at: rfc3339(q.created_at),
        updated_at: rfc3339(q.updated_at),
        question_count,
    }
}

pub(super) fn question_dto(q: QuizQuestion) -> QuizQuestionDto {
    QuizQuestionDto {
        question_id: q.id,
        question_text: q.question_text,
        question_type: q.question_type,
        option_a: q.option_a,
        option_b: q.option_b,
        option_c: q.option_c,
        option_d: q.option_d,
    }
}

pub(super) fn result_dto(r: QuizResult, quiz_title: String) -> QuizResultDto {
    QuizResultDto {
        result_id: r.id,
        quiz_id: r.quiz_id,
        quiz_title,
        score: r.score,
        passed: r.passed,
        reward_earned: r.reward_earned,
        submitted_at: rfc3339(r.submitted_at),
    }
}

/// Keys that are not question ids are dropped; letters are compared
/// uppercased.
fn normalize_answers(raw: BTreeMap<String, String>) -> HashMap<i32, String> {
    raw.into_iter()
        .filter_map(|(k, v)| {
            let id = k.trim().parse::<i32>().ok()?;
            Some((id, v.trim().to_ascii_uppercase()))
        })
        .collect()
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<QuizDto>> {
    let items = state
        .store
        .list_active_quizzes()
        .await?
        .into_iter()
        .map(|(q, n)| quiz_dto(q, n))
        .collect();
    Ok(Json(ApiResponse::list(items, "Quizzes retrieved successfully")))
}

pub async fn detail(State(state): State<AppState>, Id(id): Id) -> ApiResult<QuizDetailDto> {
    let (quiz, questions) = state.store.get_quiz_with_questions(id).await?;
    let n = questions.len() as i64;
    ok(
        QuizDetailDto {
            quiz: quiz_dto(quiz, n),
            questions: questions.into_iter().map(question_dto).collect(),
        },
        "Quiz retrieved successfully",
    )
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
    JsonBody(body): JsonBody<QuizSubmitReq>,
) -> ApiResult<QuizSubmitResp> {
    let Some(answers) = body.answers else {
        return Err(AppError::bad_request("Quiz answers are required"));
    };
    let outcome = state
        .store
        .submit_quiz(auth.user_id, id, normalize_answers(answers))
        .await?;
    let message = if outcome.score.passed {
        "Quiz passed! You earned points."
    } else {
        "Quiz completed. Better luck next time!"
    };
    ok(
        QuizSubmitResp {
            result_id: outcome.result.id,
            score: outcome.score.score,
            passed: outcome.score.passed,
            reward_earned: outcome.result.reward_earned,
            total_questions: outcome.score.total,
            correct_answers: outcome.score.correct,
        },
        message,
    )
}

pub async fn result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Id(id): Id,
) -> ApiResult<QuizResultDto> {
    let Some((r, title)) = state.store.latest_quiz_result(auth.user_id, id).await? else {
        return Err(AppError::not_found("No quiz result found"));
    };
    ok(result_dto(r, title), "Quiz result retrieved successfully")
}

pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> ApiResult<QuizHistoryDto> {
    let history: Vec<QuizResultDto> = state
        .store
        .quiz_history(auth.user_id)
        .await?
        .into_iter()
        .map(|(r, t)| result_dto(r, t))
        .collect();
    ok(
        QuizHistoryDto {
            total_quizzes_attempted: history.len(),
            history,
        },
        "Quiz history retrieved successfully",
    )
}

pub async fn admin_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    JsonBody(body): JsonBody<QuizCreateReq>,
) -> ApiResult<QuizDto> {
    let Some(title) = non_blank(body.title) else {
        return Err(AppError::bad_request("Quiz title is required"));
    };
    let reward_points = body.reward_points.unwrap_or(0);
    validate_reward_points(reward_points)?;
    if let Some(t) = body.time_limit {
        validate_time_limit(t)?;
    }
    let passing_score = body.passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
    validate_passing_score(passing_score)?;
    let status = parse_status(body.status)?.unwrap_or_default();

    let mut questions = Vec::with_capacity(body.questions.len());
    for q in body.questions {
        let text = q.question_text.trim().to_string();
        let answer = q.correct_answer.trim().to_ascii_uppercase();
        if text.is_empty() || answer.is_empty() {
            return Err(AppError::bad_request(
                "Each question needs question_text and correct_answer",
            ));
        }
        questions.push(NewQuizQuestion {
            quiz_id: 0,
            question_text: text,
            question_type: q.question_type,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
            correct_answer: answer,
        });
    }

    let now = now_utc();
    let (quiz, n) = state
        .store
        .create_quiz(
            NewQuiz {
                title,
                description: non_blank(body.description),
                category: non_blank(body.category),
                difficulty_level: non_blank(body.difficulty_level),
                reward_points,
                time_limit: body.time_limit,
                passing_score,
                status: status.as_str().to_string(),
                created_at: now,
                updated_at: now,
            },
            questions,
        )
        .await?;
    tracing::info!(admin = auth.user_id, quiz_id = quiz.id, questions = n, "quiz created");
    ok(quiz_dto(quiz, n), "Quiz created successfully")
}

pub async fn admin_update(
    State(state): State<AppState>,
    Id(id): Id,
    JsonBody(body): JsonBody<QuizPatchReq>,
) -> ApiResult<QuizDto> {
    if let Some(r) = body.reward_points {
        validate_reward_points(r)?;
    }
    if let Some(t) = body.time_limit {
        validate_time_limit(t)?;
    }
    if let Some(p) = body.passing_score {
        validate_passing_score(p)?;
    }
    let patch = QuizPatch {
        title: non_blank(body.title),
        description: non_blank(body.description),
        category: non_blank(body.category),
        difficulty_level: non_blank(body.difficulty_level),
        reward_points: body.reward_points,
        time_limit: body.time_limit,
        passing_score: body.passing_score,
        status: parse_status(body.status)?.map(|s| s.as_str().to_string()),
        updated_at: None,
    };
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate.into());
    }
    let quiz = state.store.update_quiz(id, patch).await?;
    let (_, questions) = state.store.get_quiz_with_questions(quiz.id).await?;
    ok(
        quiz_dto(quiz, questions.len() as i64),
        "Quiz updated successfully",
    )
}

pub async fn admin_results(
    State(state): State<AppState>,
    Id(id): Id,
) -> ApiResult<Vec<QuizAttemptDto>> {
    let items = state
        .store
        .quiz_attempts(id)
        .await?
        .into_iter()
        .map(|(r, user_name)| QuizAttemptDto {
            result_id: r.id,
            user_id: r.user_id,
            user_name,
            score: r.score,
            passed: r.passed,
            reward_earned: r.reward_earned,
            submitted_at: rfc3339(r.submitted_at),
        })
        .collect();
    Ok(Json(ApiResponse::list(
        items,
        "Quiz results retrieved successfully",
    )))
}

pub async fn admin_stats(State(state): State<AppState>, Id(id): Id) -> ApiResult<QuizStatsDto> {
    let stats = state.store.quiz_stats(id).await?;
    ok(stats, "Quiz statistics retrieved successfully")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_are_keyed_by_question_id() {
        let raw = BTreeMap::from([
            ("3".to_string(), " b ".to_string()),
            ("x".to_string(), "A".to_string()),
            ("7".to_string(), "c".to_string()),
        ]);
        let got = normalize_answers(raw);
        assert_eq!(got.len(), 2);
        assert_eq!(got.get(&3).map(String::as_str), Some("B"));
        assert_eq!(got.get(&7).map(String::as_str), Some("C"));
    }

    #[test]
    fn status_must_be_in_the_allowed_set() {
        assert_eq!(parse_status(None), Ok(None));
        assert_eq!(parse_status(Some(" ".into())), Ok(None));
        assert_eq!(
            parse_status(Some("Archived".into())),
            Ok(Some(CatalogStatus::Archived))
        );
        assert_eq!(
            parse_status(Some("deleted".into())),
            Err(ValidationError::InvalidStatus)
        );
    }
}
