use chrono::NaiveDateTime;
use diesel::dsl::count;
use diesel::expression_methods::AggregateExpressionMethods;
use diesel::prelude::*;
use tracing::info;

use super::models::{Game, GamePatch, NewGame, NewGameCompletion, NewGameRating};
use super::points::award_points;
use super::schema::{game_completions, game_ratings, games};
use super::{Store, StorageError, conflict_on_unique, now_utc};
use journey_shared::api::GameStatsDto;
use journey_shared::domain::{CatalogStatus, PointSource};

pub const GAME_NOT_FOUND: &str = "Game not found";

#[derive(Debug, Clone)]
pub struct GamePlayOutcome {
    pub game: Game,
    pub completed_at: NaiveDateTime,
    pub user_total_points: i32,
}

/// `%` and `_` in user input match literally.
fn like_escape(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn load_game(conn: &mut SqliteConnection, game_id: i32) -> Result<Game, StorageError> {
    games::table
        .find(game_id)
        .select(Game::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| StorageError::NotFound(GAME_NOT_FOUND.into()))
}

fn average_rating(conn: &mut SqliteConnection, game_id: i32) -> Result<Option<f64>, StorageError> {
    let ratings = game_ratings::table
        .filter(game_ratings::game_id.eq(game_id))
        .select(game_ratings::rating)
        .load::<i32>(conn)?;
    Ok(mean(&ratings))
}

fn mean(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    Some(sum as f64 / values.len() as f64)
}

fn completion_count(conn: &mut SqliteConnection, game_id: i32) -> Result<i64, StorageError> {
    Ok(game_completions::table
        .filter(game_completions::game_id.eq(game_id))
        .count()
        .get_result::<i64>(conn)?)
}

impl Store {
    pub async fn list_active_games(&self) -> Result<Vec<Game>, StorageError> {
        self.blocking(|conn| {
            Ok(games::table
                .filter(games::status.eq(CatalogStatus::Active.as_str()))
                .order((games::created_at.desc(), games::id.desc()))
                .select(Game::as_select())
                .load(conn)?)
        })
        .await
    }

    /// The game with its completion count and average rating.
    pub async fn game_detail(
        &self,
        game_id: i32,
    ) -> Result<(Game, i64, Option<f64>), StorageError> {
        self.blocking(move |conn| {
            let game = load_game(conn, game_id)?;
            let completions = completion_count(conn, game_id)?;
            let rating = average_rating(conn, game_id)?;
            Ok((game, completions, rating))
        })
        .await
    }

    /// Case-insensitive substring match over title, genre and description.
    pub async fn search_games(&self, term: &str) -> Result<Vec<Game>, StorageError> {
        let pattern = format!("%{}%", like_escape(term.trim()));
        self.blocking(move |conn| {
            Ok(games::table
                .filter(games::status.eq(CatalogStatus::Active.as_str()))
                .filter(
                    games::title
                        .like(&pattern)
                        .escape('\\')
                        .or(games::genre.like(&pattern).escape('\\'))
                        .or(games::description.like(&pattern).escape('\\')),
                )
                .order(games::title.asc())
                .select(Game::as_select())
                .load(conn)?)
        })
        .await
    }

    /// Active games whose difficulty matches, ignoring case.
    pub async fn games_by_difficulty(&self, difficulty: &str) -> Result<Vec<Game>, StorageError> {
        let pattern = like_escape(difficulty.trim());
        self.blocking(move |conn| {
            Ok(games::table
                .filter(games::status.eq(CatalogStatus::Active.as_str()))
                .filter(games::difficulty_level.like(&pattern).escape('\\'))
                .order(games::title.asc())
                .select(Game::as_select())
                .load(conn)?)
        })
        .await
    }

    /// Records a play-through and awards the game's points. No daily limit.
    pub async fn complete_game(
        &self,
        user_id: i32,
        game_id: i32,
    ) -> Result<GamePlayOutcome, StorageError> {
        let outcome = self
            .blocking(move |conn| {
                conn.immediate_transaction(|conn| -> Result<GamePlayOutcome, StorageError> {
                    let game = load_game(conn, game_id)?;
                    if game.status != CatalogStatus::Active.as_str() {
                        return Err(StorageError::InvalidInput("Game is not available".into()));
                    }
                    let now = now_utc();
                    diesel::insert_into(game_completions::table)
                        .values(&NewGameCompletion {
                            user_id,
                            game_id,
                            completed_at: now,
                        })
                        .execute(conn)?;
                    let total = award_points(
                        conn,
                        user_id,
                        PointSource::Game,
                        game.id,
                        game.reward_points,
                        &game.title,
                    )?;
                    Ok(GamePlayOutcome {
                        game,
                        completed_at: now,
                        user_total_points: total,
                    })
                })
            })
            .await?;
        info!(user_id, game_id, total = outcome.user_total_points, "game completed");
        Ok(outcome)
    }

    /// Creates or replaces the user's rating; returns the new average.
    pub async fn rate_game(
        &self,
        user_id: i32,
        game_id: i32,
        rating: i32,
    ) -> Result<Option<f64>, StorageError> {
        self.blocking(move |conn| {
            load_game(conn, game_id)?;
            let now = now_utc();
            diesel::insert_into(game_ratings::table)
                .values(&NewGameRating {
                    user_id,
                    game_id,
                    rating,
                    rated_at: now,
                })
                .on_conflict((game_ratings::user_id, game_ratings::game_id))
                .do_update()
                .set((
                    game_ratings::rating.eq(rating),
                    game_ratings::rated_at.eq(now),
                ))
                .execute(conn)?;
            average_rating(conn, game_id)
        })
        .await
    }

    pub async fn create_game(&self, new: NewGame) -> Result<Game, StorageError> {
        self.blocking(move |conn| {
            diesel::insert_into(games::table)
                .values(&new)
                .returning(Game::as_returning())
                .get_result(conn)
                .map_err(|e| conflict_on_unique(e, "A game with this title already exists"))
        })
        .await
    }

    pub async fn update_game(&self, game_id: i32, patch: GamePatch) -> Result<Game, StorageError> {
        if patch.is_empty() {
            return Err(StorageError::InvalidInput(
                "At least one field is required to update".into(),
            ));
        }
        self.blocking(move |conn| {
            let patch = GamePatch {
                updated_at: Some(now_utc()),
                ..patch
            };
            diesel::update(games::table.find(game_id))
                .set(&patch)
                .returning(Game::as_returning())
                .get_result(conn)
                .optional()
                .map_err(|e| conflict_on_unique(e, "A game with this title already exists"))?
                .ok_or_else(|| StorageError::NotFound(GAME_NOT_FOUND.into()))
        })
        .await
    }

    pub async fn game_stats(&self, game_id: i32) -> Result<GameStatsDto, StorageError> {
        self.blocking(move |conn| {
            let game = load_game(conn, game_id)?;
            let total_completions = completion_count(conn, game_id)?;
            let unique_players = game_completions::table
                .filter(game_completions::game_id.eq(game_id))
                .select(count(game_completions::user_id).aggregate_distinct())
                .get_result::<i64>(conn)?;
            let average_rating = average_rating(conn, game_id)?;
            let total_ratings = game_ratings::table
                .filter(game_ratings::game_id.eq(game_id))
                .count()
                .get_result::<i64>(conn)?;
            Ok(GameStatsDto {
                game_id: game.id,
                title: game.title,
                total_completions,
                unique_players,
                average_rating,
                total_ratings,
                total_rewards_distributed: i64::from(game.reward_points) * total_completions,
            })
        })
        .await
    }
}
