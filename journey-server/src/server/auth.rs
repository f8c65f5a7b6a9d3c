use axum::Form;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use journey_shared::api::{LoginForm, RegisterForm};
use journey_shared::auth::Role;
use journey_shared::validate::{ValidationError, validate_registration};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{Span, error, info, warn};

use super::pages::{self, AuthPage};
use super::{AppError, AppState};
use crate::storage::NewAccountRow;
use crate::storage::models::User;

/// Session key holding the logged-in user's projection.
const USER_KEY: &str = "journey.user";

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const LOGIN_REQUIRED: &str = "Please log in to continue";

/// What the session remembers about the user between requests. Checked
/// against the database on every authenticated request and rewritten only
/// when it went stale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub total_points: i32,
    pub role: Role,
}

impl SessionUser {
    fn from_row(u: &User) -> Self {
        Self {
            user_id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            age: u.age,
            total_points: u.total_points,
            role: u.role.parse().unwrap_or_default(),
        }
    }

    /// The projection of `u` if it differs from `self`.
    fn refreshed(&self, u: &User) -> Option<Self> {
        let fresh = Self::from_row(u);
        (fresh != *self).then_some(fresh)
    }
}

/// The authenticated caller, inserted into request extensions by the auth
/// middleware and extracted by handlers with `Extension<AuthCtx>`.
#[derive(Clone, Debug, Serialize)]
pub struct AuthCtx {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub total_points: i32,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl AuthCtx {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Loads the caller behind `session`, or `None` when nobody is logged in.
/// A session pointing at a deleted account is flushed.
pub async fn current_user(
    state: &AppState,
    session: &Session,
) -> Result<Option<AuthCtx>, AppError> {
    let Some(cached) = session.get::<SessionUser>(USER_KEY).await? else {
        return Ok(None);
    };
    let Some(user) = state.store.get_user(cached.user_id).await? else {
        warn!(user_id = cached.user_id, "auth: session user no longer exists");
        session.flush().await?;
        return Ok(None);
    };
    let fresh = match cached.refreshed(&user) {
        Some(fresh) => {
            session.insert(USER_KEY, &fresh).await?;
            fresh
        }
        None => cached,
    };
    Ok(Some(AuthCtx {
        user_id: fresh.user_id,
        name: fresh.name,
        email: fresh.email,
        age: fresh.age,
        total_points: fresh.total_points,
        role: fresh.role,
        profile_image: user.profile_image,
    }))
}

fn session_of(req: &Request<axum::body::Body>) -> Result<Session, AppError> {
    req.extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::internal("session layer missing"))
}

fn record_span(auth: &AuthCtx) {
    let span = Span::current();
    span.record("user_id", auth.user_id);
    span.record("role", tracing::field::display(auth.role));
}

/// JSON routes: anonymous callers get 401 in the envelope.
pub async fn require_api_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = session_of(&req)?;
    let Some(auth) = current_user(&state, &session).await? else {
        return Err(AppError::unauthorized(LOGIN_REQUIRED));
    };
    record_span(&auth);
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Page routes: anonymous callers are sent to the login page.
pub async fn require_page_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = session_of(&req)?;
    let Some(auth) = current_user(&state, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };
    record_span(&auth);
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(AppError::internal)?
        .map_err(|e| {
            error!(error = %e, "register: bcrypt hash failed");
            AppError::internal(e)
        })
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(AppError::internal)?
        .map_err(|e| {
            error!(error = %e, "login: bcrypt verify failed");
            AppError::internal(e)
        })
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let account = match validate_registration(&form) {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "register: rejected form");
            return pages::auth_page(
                AuthPage::Register,
                StatusCode::BAD_REQUEST,
                Some(&e.to_string()),
                None,
            );
        }
    };
    let email = account.email.to_lowercase();
    let password_hash = hash_password(account.password).await?;
    let created = state
        .store
        .create_user(NewAccountRow {
            name: account.name,
            email: email.clone(),
            password_hash,
            age: account.age,
        })
        .await;
    let user = match created {
        Ok(u) => u,
        Err(crate::storage::StorageError::Conflict(msg)) => {
            warn!(%email, "register: duplicate email");
            return pages::auth_page(
                AuthPage::Register,
                StatusCode::BAD_REQUEST,
                Some(&msg),
                None,
            );
        }
        Err(e) => return Err(e.into()),
    };
    if state
        .config
        .admin_emails
        .iter()
        .any(|a| a.trim().eq_ignore_ascii_case(&email))
    {
        state.store.set_role_by_email(&email, Role::Admin).await?;
    }
    info!(user_id = user.id, "user registered");
    pages::auth_page(
        AuthPage::Register,
        StatusCode::CREATED,
        None,
        Some("Registration successful! Please log in."),
    )
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.as_deref().map(str::trim).unwrap_or_default();
    let password = form.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        let msg = ValidationError::MissingCredentials.to_string();
        return pages::auth_page(
            AuthPage::Login,
            StatusCode::BAD_REQUEST,
            Some(&msg),
            None,
        );
    }
    let email = email.to_lowercase();
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(%email, "login: unknown email");
        return pages::auth_page(
            AuthPage::Login,
            StatusCode::UNAUTHORIZED,
            Some(INVALID_CREDENTIALS),
            None,
        );
    };
    if !verify_password(password, user.password.clone()).await? {
        warn!(user_id = user.id, "login: invalid password");
        return pages::auth_page(
            AuthPage::Login,
            StatusCode::UNAUTHORIZED,
            Some(INVALID_CREDENTIALS),
            None,
        );
    }
    // New id on privilege change
    session.cycle_id().await?;
    session.insert(USER_KEY, SessionUser::from_row(&user)).await?;
    info!(user_id = user.id, "user logged in");
    Ok(Redirect::to("/dashboard").into_response())
}

pub async fn logout(session: Session) -> Result<Response, AppError> {
    if let Some(u) = session.get::<SessionUser>(USER_KEY).await? {
        info!(user_id = u.user_id, "user logged out");
    }
    session.flush().await?;
    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn row(total_points: i32, role: &str) -> User {
        User {
            id: 7,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hash".into(),
            age: 30,
            total_points,
            role: role.into(),
            profile_image: None,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn unchanged_user_keeps_the_cached_session() {
        let cached = SessionUser::from_row(&row(50, "user"));
        assert!(cached.refreshed(&row(50, "user")).is_none());
    }

    #[test]
    fn stale_session_is_refreshed() {
        let cached = SessionUser::from_row(&row(50, "user"));
        let fresh = cached.refreshed(&row(70, "user")).unwrap();
        assert_eq!(fresh.total_points, 70);
        let promoted = cached.refreshed(&row(50, "admin")).unwrap();
        assert!(promoted.role.is_admin());
    }
}
