//! Cookie-session REST client for scripted consumers and tests.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::endpoints as ep;
use super::*;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
    #[error("server refused: {0}")]
    Refused(String),
}

/// Holds the session cookie between calls; one client per logged-in user.
#[derive(Debug, Clone)]
pub struct JourneyClient {
    base: String,
    http: reqwest::Client,
}

impl JourneyClient {
    pub fn new(base: impl Into<String>) -> Result<Self, RestError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RestError::Http(e.to_string()))?;
        Ok(Self {
            base: base.into(),
            http,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RestError> {
        req.send().await.map_err(|e| RestError::Http(e.to_string()))
    }

    async fn post_form(
        &self,
        url: String,
        pairs: &[(&str, &str)],
    ) -> Result<reqwest::Response, RestError> {
        let req = self
            .http
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(ep::form_body(pairs));
        self.send(req).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, RestError> {
        let res = self.send(self.http.get(url)).await?;
        handle_envelope(res).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, RestError> {
        let res = self.send(self.http.post(url).json(body)).await?;
        handle_envelope(res).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, url: String) -> Result<T, RestError> {
        let res = self.send(self.http.post(url)).await?;
        handle_envelope(res).await
    }

    /// Registration answers with an HTML page; success is status 201.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        age: i32,
    ) -> Result<(), RestError> {
        let age = age.to_string();
        let res = self
            .post_form(
                ep::register(&self.base),
                &[
                    ("name", name),
                    ("email", email),
                    ("password", password),
                    ("passwordConfirm", password),
                    ("age", &age),
                ],
            )
            .await?;
        expect_status(res, StatusCode::CREATED).await
    }

    /// Login answers with a redirect to the dashboard and sets the cookie.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), RestError> {
        let res = self
            .post_form(
                ep::login(&self.base),
                &[("email", email), ("password", password)],
            )
            .await?;
        expect_status(res, StatusCode::SEE_OTHER).await
    }

    pub async fn logout(&self) -> Result<(), RestError> {
        let res = self.send(self.http.get(ep::logout(&self.base))).await?;
        expect_status(res, StatusCode::SEE_OTHER).await
    }

    pub async fn update_profile(&self, req: &ProfileUpdateReq) -> Result<UserDto, RestError> {
        self.post_json(ep::profile_update(&self.base), req).await
    }

    pub async fn missions(&self) -> Result<Vec<UserMissionDto>, RestError> {
        self.get_json(ep::missions(&self.base)).await
    }

    pub async fn mission(&self, id: i32) -> Result<UserMissionDto, RestError> {
        self.get_json(ep::mission(&self.base, id)).await
    }

    pub async fn complete_mission(&self, id: i32) -> Result<MissionCompleteResp, RestError> {
        self.post_empty(ep::mission_complete(&self.base, id)).await
    }

    pub async fn mission_history(&self) -> Result<Vec<MissionCompletionDto>, RestError> {
        self.get_json(ep::mission_history(&self.base)).await
    }

    pub async fn quizzes(&self) -> Result<Vec<QuizDto>, RestError> {
        self.get_json(ep::quizzes(&self.base)).await
    }

    pub async fn quiz(&self, id: i32) -> Result<QuizDetailDto, RestError> {
        self.get_json(ep::quiz(&self.base, id)).await
    }

    pub async fn submit_quiz(
        &self,
        id: i32,
        answers: BTreeMap<String, String>,
    ) -> Result<QuizSubmitResp, RestError> {
        let body = QuizSubmitReq {
            answers: Some(answers),
        };
        self.post_json(ep::quiz_submit(&self.base, id), &body).await
    }

    pub async fn quiz_result(&self, id: i32) -> Result<QuizResultDto, RestError> {
        self.get_json(ep::quiz_result(&self.base, id)).await
    }

    pub async fn games(&self) -> Result<Vec<GameDto>, RestError> {
        self.get_json(ep::games(&self.base)).await
    }

    pub async fn search_games(&self, q: &str) -> Result<Vec<GameDto>, RestError> {
        self.get_json(ep::games_search(&self.base, q)).await
    }

    pub async fn complete_game(&self, id: i32) -> Result<GameCompleteResp, RestError> {
        self.post_empty(ep::game_complete(&self.base, id)).await
    }

    pub async fn rate_game(&self, id: i32, rating: i32) -> Result<GameRatingDto, RestError> {
        self.post_json(ep::game_rate(&self.base, id), &GameRateReq { rating })
            .await
    }

    pub async fn activity_log(&self) -> Result<ActivityLogDto, RestError> {
        self.get_json(ep::activity_log(&self.base)).await
    }

    pub async fn friends(&self) -> Result<FriendsDto, RestError> {
        self.get_json(ep::friends(&self.base)).await
    }

    pub async fn request_friend(&self, user_id: i32) -> Result<FriendshipDto, RestError> {
        self.post_empty(ep::friend_request(&self.base, user_id))
            .await
    }

    pub async fn accept_friend(&self, user_id: i32) -> Result<FriendshipDto, RestError> {
        self.post_empty(ep::friend_accept(&self.base, user_id))
            .await
    }

    /// `None` until the user has started the journey.
    pub async fn starting_status(&self) -> Result<Option<StartingDto>, RestError> {
        let res = self.send(self.http.get(ep::starting_status(&self.base))).await?;
        handle_envelope_opt(res).await
    }

    pub async fn create_starting(&self, req: &BookendCreateReq) -> Result<StartingDto, RestError> {
        self.post_json(ep::starting_create(&self.base), req).await
    }

    pub async fn create_ending(&self, req: &BookendCreateReq) -> Result<EndingDto, RestError> {
        self.post_json(ep::ending_create(&self.base), req).await
    }

    pub async fn journey_completed(&self) -> Result<bool, RestError> {
        let dto: JourneyCompletionDto = self.get_json(ep::journey_completion(&self.base)).await?;
        Ok(dto.journey_completed)
    }

    pub async fn points_history(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<PointsHistoryDto, RestError> {
        self.get_json(ep::points_history(&self.base, page, per_page))
            .await
    }
}

async fn expect_status(res: reqwest::Response, expected: StatusCode) -> Result<(), RestError> {
    let status = res.status();
    if status == expected {
        return Ok(());
    }
    let body = res.text().await.unwrap_or_default();
    Err(RestError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Unwraps `data` from the envelope; a non-2xx status or `success: false`
/// becomes an error carrying the server's message.
async fn handle_envelope<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, RestError> {
    handle_envelope_opt(res)
        .await?
        .ok_or_else(|| RestError::Serde("response carried no data".to_string()))
}

async fn handle_envelope_opt<T: DeserializeOwned>(
    res: reqwest::Response,
) -> Result<Option<T>, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let env = res
        .json::<ApiResponse<T>>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))?;
    if !env.success {
        return Err(RestError::Refused(env.message));
    }
    Ok(env.data)
}
