use super::{AppError, auth::AuthCtx};
use axum::response::Response;
use axum::{
    extract::OriginalUri,
    http::Request,
    middleware::Next,
};

pub const ADMIN_REQUIRED: &str = "Access denied. Admin privileges required.";

/// Admin-only routes. Runs after the auth middleware has attached `AuthCtx`.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|orig| orig.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let Some(auth) = req.extensions().get::<AuthCtx>() else {
        return Err(AppError::unauthorized("Please log in to continue"));
    };
    if !auth.is_admin() {
        tracing::warn!(
            method = %req.method(),
            path = %path,
            user_id = auth.user_id,
            role = %auth.role,
            "ACL: admin route denied"
        );
        return Err(AppError::forbidden(ADMIN_REQUIRED));
    }
    Ok(next.run(req).await)
}
