//! Voice-message trigger creation.
//!
//! The audio itself is uploaded to blob storage by the supporter web app;
//! this endpoint receives the resulting public URL and the trigger
//! threshold.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::voice_message::{CreateVoiceMessageRequest, VoiceMessageResponse},
    state::AppState,
    types::SessionId,
};

pub async fn create_voice_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<CreateVoiceMessageRequest>,
) -> Result<Json<VoiceMessageResponse>, AppError> {
    payload.validate()?;
    tracing::debug!(
        session_id = %session_id,
        supporter_id = %auth.user_id,
        "cheer submitted"
    );
    let message = state
        .tracker
        .create_voice_message(session_id, payload)
        .await?;
    Ok(Json(message.into()))
}
