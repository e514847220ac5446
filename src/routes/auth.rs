use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use chrono::Utc;

use crate::AppState;
use crate::error::Result;
use crate::models::{Credentials, Session};

/// Create an account and sign straight in
///
/// Returns 409 Conflict if the email is already registered.
pub async fn sign_up(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>)> {
    let Json(credentials) = payload?;

    let user_id = state.store.create_user(credentials).await?;
    let session = state.sessions.issue(&user_id, Utc::now().timestamp());

    Ok((StatusCode::CREATED, Json(session)))
}

/// Exchange an email/password pair for a session token
pub async fn sign_in(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Session>> {
    let Json(credentials) = payload?;

    let user_id = state.store.authenticate(credentials).await?;

    Ok(Json(state.sessions.issue(&user_id, Utc::now().timestamp())))
}
