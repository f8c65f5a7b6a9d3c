//! Server-rendered HTML pages. Templates are embedded at build time and
//! rendered with tinytemplate; `head.html` and `foot.html` are shared
//! partials called from every page.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use journey_shared::api::{
    CompletedMissionDto, EndingDto, FriendDto, GameDetailDto, StartingDto, UserMissionDto,
};
use rust_embed::RustEmbed;
use serde::Serialize;
use serde_json::Value;
use tinytemplate::TinyTemplate;
use tower_sessions::Session;

use super::auth::{AuthCtx, current_user};
use super::{AppError, AppState, game, journey, mission, parse_id, quiz, user};
use crate::storage::StorageError;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// What `head.html` and `foot.html` see; pages pass it on with
/// `{{ call head with page }}`.
#[derive(Serialize)]
struct Shell<'a> {
    title: &'a str,
    user: Option<&'a AuthCtx>,
    error: Option<&'a str>,
    success: Option<&'a str>,
}

#[derive(Serialize)]
struct PageCtx<'a, T: Serialize> {
    page: Shell<'a>,
    data: Option<T>,
}

fn template_source(name: &str) -> Result<String, AppError> {
    let file = Templates::get(name)
        .ok_or_else(|| AppError::internal(format!("template {name} missing")))?;
    String::from_utf8(file.data.into_owned())
        .map_err(|e| AppError::internal(format!("template {name}: {e}")))
}

/// Scores and averages are shown with one decimal.
fn one_decimal(v: &Value, out: &mut String) -> tinytemplate::error::Result<()> {
    match v.as_f64() {
        Some(f) => {
            out.push_str(&format!("{f:.1}"));
            Ok(())
        }
        None => tinytemplate::format(v, out),
    }
}

fn render<C: Serialize>(page: &str, ctx: &C) -> Result<String, AppError> {
    let head = template_source("head.html")?;
    let foot = template_source("foot.html")?;
    let body = template_source(&format!("{page}.html"))?;
    let mut tt = TinyTemplate::new();
    tt.add_formatter("one_decimal", one_decimal);
    tt.add_template("head", &head)
        .map_err(|e| AppError::internal(format!("template head: {e}")))?;
    tt.add_template("foot", &foot)
        .map_err(|e| AppError::internal(format!("template foot: {e}")))?;
    tt.add_template(page, &body)
        .map_err(|e| AppError::internal(format!("template {page}: {e}")))?;
    tt.render(page, ctx)
        .map_err(|e| AppError::internal(format!("render {page}: {e}")))
}

struct Page<'a> {
    template: &'a str,
    title: &'a str,
    status: StatusCode,
    user: Option<&'a AuthCtx>,
    error: Option<&'a str>,
    success: Option<&'a str>,
}

impl<'a> Page<'a> {
    fn new(template: &'a str, title: &'a str, user: Option<&'a AuthCtx>) -> Self {
        Self {
            template,
            title,
            status: StatusCode::OK,
            user,
            error: None,
            success: None,
        }
    }

    fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn error(mut self, msg: &'a str) -> Self {
        self.error = Some(msg);
        self
    }

    fn success(mut self, msg: Option<&'a str>) -> Self {
        self.success = msg;
        self
    }

    fn show<T: Serialize>(self, data: Option<T>) -> Result<Response, AppError> {
        let html = render(
            self.template,
            &PageCtx {
                page: Shell {
                    title: self.title,
                    user: self.user,
                    error: self.error,
                    success: self.success,
                },
                data,
            },
        )?;
        Ok((self.status, Html(html)).into_response())
    }

    /// Missing records render the page with a 404 and the storage message;
    /// other failures propagate.
    fn show_result<T: Serialize>(self, res: Result<T, StorageError>) -> Result<Response, AppError> {
        match res {
            Ok(data) => self.show(Some(data)),
            Err(StorageError::NotFound(msg)) => {
                self.status(StatusCode::NOT_FOUND).error(&msg).show(None::<T>)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn bad_id(self) -> Result<Response, AppError> {
        self.status(StatusCode::BAD_REQUEST)
            .error("Invalid ID")
            .show(None::<()>)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum AuthPage {
    Register,
    Login,
}

/// Renders the register or login form with an optional flash message.
pub fn auth_page(
    page: AuthPage,
    status: StatusCode,
    error: Option<&str>,
    success: Option<&str>,
) -> Result<Response, AppError> {
    let (template, title) = match page {
        AuthPage::Register => ("register", "Register"),
        AuthPage::Login => ("login", "Log in"),
    };
    let mut p = Page::new(template, title, None).status(status).success(success);
    if let Some(e) = error {
        p = p.error(e);
    }
    p.show(None::<()>)
}

pub async fn register_page() -> Result<Response, AppError> {
    auth_page(AuthPage::Register, StatusCode::OK, None, None)
}

pub async fn login_page() -> Result<Response, AppError> {
    auth_page(AuthPage::Login, StatusCode::OK, None, None)
}

pub async fn home(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let user = current_user(&state, &session).await?;
    Page::new("home", "Welcome", user.as_ref()).show(None::<()>)
}

pub async fn not_found() -> Result<Response, AppError> {
    Page::new("not_found", "Page not found", None)
        .status(StatusCode::NOT_FOUND)
        .show(None::<()>)
}

#[derive(Serialize)]
struct DashboardData {
    missions: Vec<UserMissionDto>,
    completed_today: usize,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Response, AppError> {
    let missions: Vec<UserMissionDto> = state
        .store
        .missions_for_user(auth.user_id, state.today())
        .await?
        .into_iter()
        .map(|(m, today, count)| mission::user_mission(m, today, count))
        .collect();
    let completed_today = missions.iter().filter(|m| m.completed_today).count();
    Page::new("dashboard", "Dashboard", Some(&auth)).show(Some(DashboardData {
        missions,
        completed_today,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Response, AppError> {
    let res = state
        .store
        .get_user(auth.user_id)
        .await
        .and_then(|u| u.ok_or_else(|| StorageError::NotFound("User not found".into())))
        .map(user::user_dto);
    Page::new("profile", "Profile", Some(&auth)).show_result(res)
}

#[derive(Serialize)]
struct StartingData {
    starting: Option<StartingDto>,
}

pub async fn starting(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Response, AppError> {
    let starting = state
        .store
        .latest_starting(auth.user_id)
        .await?
        .map(journey::starting_dto);
    Page::new("starting", "Start your journey", Some(&auth)).show(Some(StartingData { starting }))
}

#[derive(Serialize)]
struct EndingData {
    ending: Option<EndingDto>,
}

pub async fn ending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Response, AppError> {
    let ending = state
        .store
        .current_ending(auth.user_id)
        .await?
        .map(journey::ending_dto);
    let page = Page::new("ending", "Your journey's end", Some(&auth));
    let page = if ending.is_none() {
        page.success(Some("No ending information available yet"))
    } else {
        page
    };
    page.show(Some(EndingData { ending }))
}

pub async fn ending_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Response, AppError> {
    let res = state.store.ending_summary(auth.user_id).await;
    Page::new("ending_summary", "Journey summary", Some(&auth)).show_result(res)
}

pub async fn ending_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let page = Page::new("ending_detail", "Ending", Some(&auth));
    let Some(id) = parse_id(&raw) else {
        return page.bad_id();
    };
    let res = state
        .store
        .ending_for_user(id, auth.user_id)
        .await
        .map(journey::ending_dto);
    page.show_result(res)
}

#[derive(Serialize)]
struct ActivityData {
    log: journey_shared::api::ActivityLogDto,
    missions: Vec<CompletedMissionDto>,
    friends: Vec<FriendDto>,
}

pub async fn activity_log(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Response, AppError> {
    let page = Page::new("activity_log", "Activity log", Some(&auth));
    let log = match state.store.activity_log(auth.user_id).await {
        Ok(log) => log,
        Err(e) => return page.show_result(Err::<ActivityData, _>(e)),
    };
    let missions = state.store.completed_missions(auth.user_id).await?;
    let friends = state.store.list_friends(auth.user_id).await?;
    page.show(Some(ActivityData {
        log,
        missions,
        friends,
    }))
}

pub async fn quiz_details(
    State(state): State<AppState>,
    session: Session,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let user = current_user(&state, &session).await?;
    let page = Page::new("quiz_details", "Quiz", user.as_ref());
    let Some(id) = parse_id(&raw) else {
        return page.bad_id();
    };
    let res = state
        .store
        .get_quiz_with_questions(id)
        .await
        .map(|(q, questions)| {
            let n = questions.len() as i64;
            journey_shared::api::QuizDetailDto {
                quiz: quiz::quiz_dto(q, n),
                questions: questions.into_iter().map(quiz::question_dto).collect(),
            }
        });
    page.show_result(res)
}

pub async fn quiz_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let page = Page::new("quiz_result", "Quiz result", Some(&auth));
    let Some(id) = parse_id(&raw) else {
        return page.bad_id();
    };
    let res = state
        .store
        .latest_quiz_result(auth.user_id, id)
        .await
        .and_then(|r| r.ok_or_else(|| StorageError::NotFound("No quiz result found".into())))
        .map(|(r, title)| quiz::result_dto(r, title));
    page.show_result(res)
}

#[derive(Serialize)]
struct GamesData {
    games: Vec<journey_shared::api::GameDto>,
}

pub async fn games(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let user = current_user(&state, &session).await?;
    let games = state
        .store
        .list_active_games()
        .await?
        .into_iter()
        .map(game::game_dto)
        .collect();
    Page::new("games", "Games", user.as_ref()).show(Some(GamesData { games }))
}

pub async fn game_details(
    State(state): State<AppState>,
    session: Session,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let user = current_user(&state, &session).await?;
    let page = Page::new("game_details", "Game", user.as_ref());
    let Some(id) = parse_id(&raw) else {
        return page.bad_id();
    };
    let res = state
        .store
        .game_detail(id)
        .await
        .map(|(g, total_completions, average_rating)| GameDetailDto {
            game: game::game_dto(g),
            total_completions,
            average_rating,
        });
    page.show_result(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_page_template_parses() {
        for page in [
            "home",
            "register",
            "login",
            "dashboard",
            "profile",
            "starting",
            "ending",
            "ending_summary",
            "ending_detail",
            "activity_log",
            "quiz_details",
            "quiz_result",
            "games",
            "game_details",
            "not_found",
        ] {
            let ctx = PageCtx::<()> {
                page: Shell {
                    title: "t",
                    user: None,
                    error: None,
                    success: None,
                },
                data: None,
            };
            let html = render(page, &ctx).unwrap_or_else(|e| panic!("{page}: {e:?}"));
            assert!(html.contains("</html>"), "{page} is missing the footer");
        }
    }

    #[test]
    fn flash_messages_are_escaped() {
        let html = auth_page(
            AuthPage::Login,
            StatusCode::UNAUTHORIZED,
            Some("<b>nope</b>"),
            None,
        )
        .map(|r| r.status());
        assert_eq!(html.ok(), Some(StatusCode::UNAUTHORIZED));
        let ctx = PageCtx::<()> {
            page: Shell {
                title: "Log in",
                user: None,
                error: Some("<b>nope</b>"),
                success: None,
            },
            data: None,
        };
        let html = render("login", &ctx).unwrap();
        assert!(html.contains("&lt;b&gt;nope"));
        assert!(!html.contains("<b>nope"));
    }

    #[test]
    fn signed_in_shell_shows_the_user() {
        let user = AuthCtx {
            user_id: 7,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            age: 30,
            total_points: 120,
            role: journey_shared::auth::Role::User,
            profile_image: None,
        };
        let ctx = PageCtx::<()> {
            page: Shell {
                title: "Welcome",
                user: Some(&user),
                error: None,
                success: Some("Saved"),
            },
            data: None,
        };
        let html = render("home", &ctx).unwrap();
        assert!(html.contains("Good to see you again, Ada."));
        assert!(html.contains("120 pts"));
        assert!(html.contains("/logout"));
        assert!(html.contains("Saved"));
    }

    #[test]
    fn scores_render_with_one_decimal() {
        let mut out = String::new();
        one_decimal(&serde_json::json!(66.6666), &mut out).unwrap();
        assert_eq!(out, "66.7");
    }
}
