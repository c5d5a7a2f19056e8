use axum::{extract::Extension, response::IntoResponse};

use crate::{auth::CurrentUser, utils::success_to_api_response};

use super::model::MeResponse;

/// Echoes the identity carried by the caller's token.
pub async fn me(Extension(user): Extension<CurrentUser>) -> impl IntoResponse {
    success_to_api_response(MeResponse::from(&user))
}
