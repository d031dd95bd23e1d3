//! Session lifecycle handlers: register, start, update, stop, read.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::location::parse_timestamp,
    models::session::{
        SessionResponse, StartSessionRequest, StopSessionRequest, StopSessionResponse,
        UpdateSessionRequest, UpdateSessionResponse,
    },
    state::AppState,
    types::{EventId, SessionId},
};

pub async fn register_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(event_id): Path<EventId>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.tracker.register(event_id, auth.user_id).await?;
    Ok(Json(session.into()))
}

pub async fn start_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let start_time = payload
        .start_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;
    let session = state
        .tracker
        .start_session(session_id, auth.user_id, start_time)
        .await?;
    Ok(Json(session.into()))
}

pub async fn update_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<UpdateSessionResponse>, AppError> {
    payload.validate()?;
    let outcome = state
        .tracker
        .update_session(
            session_id,
            auth.user_id,
            payload.locations,
            payload.elapsed_time_seconds,
        )
        .await?;
    Ok(Json(UpdateSessionResponse {
        total_distance_meters: outcome.session.elapsed_distance_meters,
        messages_to_play: outcome
            .messages_to_play
            .into_iter()
            .map(Into::into)
            .collect(),
    }))
}

pub async fn stop_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<StopSessionRequest>,
) -> Result<Json<StopSessionResponse>, AppError> {
    payload.validate()?;
    let session = state
        .tracker
        .stop_session(
            session_id,
            auth.user_id,
            payload.locations,
            payload.elapsed_time_seconds,
        )
        .await?;
    Ok(Json(StopSessionResponse {
        status: session.status,
    }))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.tracker.get_session(session_id, auth.user_id).await?;
    Ok(Json(session.into()))
}
