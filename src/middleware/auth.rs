use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, auth::CurrentUser, error::AppError};

/// Validates the bearer token and exposes the caller as [`CurrentUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| {
            tracing::debug!("request without bearer token");
            AppError::Unauthorized
        })?;

    let claims = state.validator.validate(bearer.token()).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(CurrentUser::from(claims));
    Ok(next.run(req).await)
}

/// Must run inside [`auth_middleware`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;

    if !user.claims.is_admin() {
        tracing::info!(user = %user.id, "admin route refused");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
