#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::models::{
    location::{LocationPoint, LocationSample},
    session::{
        SessionResponse, SessionStatus, StartSessionRequest, StopSessionRequest,
        StopSessionResponse, UpdateSessionRequest, UpdateSessionResponse,
    },
    voice_message::{CreateVoiceMessageRequest, TriggerType, VoiceMessageResponse},
};
use crate::types::{EventId, SessionId, UserId, VoiceMessageId};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        register_doc,
        start_doc,
        update_doc,
        stop_doc,
        get_session_doc,
        create_message_doc,
        health_doc
    ),
    components(schemas(
        EventId,
        SessionId,
        UserId,
        VoiceMessageId,
        LocationPoint,
        LocationSample,
        SessionResponse,
        SessionStatus,
        StartSessionRequest,
        StopSessionRequest,
        StopSessionResponse,
        UpdateSessionRequest,
        UpdateSessionResponse,
        CreateVoiceMessageRequest,
        TriggerType,
        VoiceMessageResponse
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Sessions", description = "Live run tracking"),
        (name = "Cheers", description = "Voice-message triggers")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let mut bearer = Http::new(HttpAuthScheme::Bearer);
            bearer.bearer_format = Some("JWT".to_string());
            components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/register",
    params(("event_id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Registered (or pre-existing) session", body = SessionResponse),
        (status = 401, description = "Missing or invalid credential")
    ),
    tag = "Sessions",
    security(("BearerAuth" = []))
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/start",
    params(("id" = String, Path, description = "Session id")),
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session is now active", body = SessionResponse),
        (status = 409, description = "Session already started or completed")
    ),
    tag = "Sessions",
    security(("BearerAuth" = []))
)]
fn start_doc() {}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/update",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "New running total and any newly fired cheers", body = UpdateSessionResponse),
        (status = 409, description = "Session is not active")
    ),
    tag = "Sessions",
    security(("BearerAuth" = []))
)]
fn update_doc() {}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/stop",
    params(("id" = String, Path, description = "Session id")),
    request_body = StopSessionRequest,
    responses(
        (status = 200, description = "Session completed (idempotent)", body = StopSessionResponse)
    ),
    tag = "Sessions",
    security(("BearerAuth" = []))
)]
fn stop_doc() {}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionResponse),
        (status = 403, description = "Session belongs to another user")
    ),
    tag = "Sessions",
    security(("BearerAuth" = []))
)]
fn get_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/messages",
    params(("id" = String, Path, description = "Session id")),
    request_body = CreateVoiceMessageRequest,
    responses(
        (status = 200, description = "Trigger created", body = VoiceMessageResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Cheers",
    security(("BearerAuth" = []))
)]
fn create_message_doc() {}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Liveness probe")),
    tag = "Sessions",
    security(())
)]
fn health_doc() {}
