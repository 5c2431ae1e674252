// src/handlers/sessions.rs
//! Session endpoints - a thin JSON adapter over `Studio`

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::captions::CaptionSettings;
use crate::types::{CharacterField, ImageSettings, SceneField, ScenePreferences};
use crate::voices::AudioPreferencesUpdate;
use crate::workflow::{ErrorKind, Stage, Studio, StudioError};
use crate::AppState;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(Uuid),
    Studio(StudioError),
}

impl From<StudioError> for ApiError {
    fn from(err: StudioError) -> Self {
        ApiError::Studio(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyInProgress
        | ErrorKind::StageBlocked
        | ErrorKind::PreferencesLocked
        | ErrorKind::NotEditing
        | ErrorKind::StaleResult
        | ErrorKind::Playback => StatusCode::CONFLICT,
        ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Transport | ErrorKind::ServerRejected | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "success": false,
                    "kind": ErrorKind::NotFound,
                    "message": format!("Session {} not found", id),
                })),
            )
                .into_response(),
            ApiError::Studio(err) => {
                let kind = err.kind();
                (
                    status_for(kind),
                    Json(json!({
                        "success": false,
                        "kind": kind,
                        "message": err.user_message(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

type ApiResult = Result<Response, ApiError>;

async fn session(state: &AppState, id: Uuid) -> Result<Arc<Studio>, ApiError> {
    state
        .registry
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}

fn ok<T: serde::Serialize>(body: T) -> ApiResult {
    Ok((StatusCode::OK, Json(body)).into_response())
}

// ============================================================================
// REQUEST BODIES
// ============================================================================

#[derive(Deserialize)]
pub struct ScriptRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct AddCharacterRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct EditTargetRequest {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct CharacterEditRequest {
    pub field: CharacterField,
    pub value: String,
}

#[derive(Deserialize)]
pub struct SceneEditRequest {
    pub field: SceneField,
    pub value: String,
}

#[derive(Deserialize, Default)]
pub struct SceneImageBody {
    #[serde(default)]
    pub image_settings: Option<ImageSettings>,
}

#[derive(Deserialize, Default)]
pub struct SynthesizeBody {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct GoToRequest {
    /// 1-based stage number.
    pub stage: u8,
}

// ============================================================================
// SESSIONS
// ============================================================================

/// POST /api/sessions - Start a new session
pub async fn create_session(Extension(state): Extension<Arc<AppState>>) -> ApiResult {
    let studio = state.registry.create().await;
    Ok((StatusCode::CREATED, Json(studio.snapshot())).into_response())
}

/// GET /api/sessions - List live sessions
pub async fn list_sessions(Extension(state): Extension<Arc<AppState>>) -> ApiResult {
    let sessions = state.registry.list().await;
    ok(json!({ "count": sessions.len(), "sessions": sessions }))
}

/// GET /api/sessions/:id - Full session snapshot
pub async fn get_session(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    ok(session(&state, id).await?.snapshot())
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    if state.registry.remove(id).await {
        ok(json!({ "success": true }))
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

// ============================================================================
// SCRIPT & CHARACTERS
// ============================================================================

/// PUT /api/sessions/:id/script - Store script text without analyzing it
pub async fn set_script(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<ScriptRequest>,
) -> ApiResult {
    session(&state, id).await?.set_script_text(body.text);
    ok(json!({ "success": true }))
}

/// POST /api/sessions/:id/analyze
pub async fn analyze_script(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<ScriptRequest>,
) -> ApiResult {
    let studio = session(&state, id).await?;
    ok(studio.analyze_script(body.text).await?)
}

/// POST /api/sessions/:id/characters
pub async fn add_character(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<AddCharacterRequest>,
) -> ApiResult {
    let index = session(&state, id)
        .await?
        .add_character(&body.name, &body.description)?;
    Ok((StatusCode::CREATED, Json(json!({ "index": index }))).into_response())
}

/// PUT /api/sessions/:id/character-edit - Open one character for editing
pub async fn begin_character_edit(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<EditTargetRequest>,
) -> ApiResult {
    session(&state, id).await?.begin_character_edit(body.index)?;
    ok(json!({ "editing": body.index }))
}

/// DELETE /api/sessions/:id/character-edit
pub async fn end_character_edit(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    session(&state, id).await?.end_character_edit();
    ok(json!({ "editing": null }))
}

/// PATCH /api/sessions/:id/characters/:index
pub async fn edit_character(
    Path((id, index)): Path<(Uuid, usize)>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<CharacterEditRequest>,
) -> ApiResult {
    session(&state, id)
        .await?
        .edit_character(index, body.field, body.value)?;
    ok(json!({ "success": true }))
}

// ============================================================================
// SCENES
// ============================================================================

/// PUT /api/sessions/:id/scene-preferences
pub async fn set_scene_preferences(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(prefs): Json<ScenePreferences>,
) -> ApiResult {
    ok(session(&state, id).await?.set_scene_preferences(prefs)?)
}

/// POST /api/sessions/:id/scenes - Generate (or regenerate) the scene list
pub async fn generate_scenes(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    let studio = session(&state, id).await?;
    ok(studio.generate_scenes().await?)
}

/// PUT /api/sessions/:id/scene-edit - Open one scene for editing
pub async fn begin_scene_edit(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<EditTargetRequest>,
) -> ApiResult {
    session(&state, id).await?.begin_scene_edit(body.index)?;
    ok(json!({ "editing": body.index }))
}

/// DELETE /api/sessions/:id/scene-edit
pub async fn end_scene_edit(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    session(&state, id).await?.end_scene_edit();
    ok(json!({ "editing": null }))
}

/// PATCH /api/sessions/:id/scenes/:index
pub async fn edit_scene(
    Path((id, index)): Path<(Uuid, usize)>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<SceneEditRequest>,
) -> ApiResult {
    session(&state, id)
        .await?
        .edit_scene(index, body.field, body.value)?;
    ok(json!({ "success": true }))
}

/// POST /api/sessions/:id/scenes/:index/images
pub async fn generate_scene_image(
    Path((id, index)): Path<(Uuid, usize)>,
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<SceneImageBody>>,
) -> ApiResult {
    let settings = body
        .and_then(|Json(b)| b.image_settings)
        .unwrap_or_default();
    let studio = session(&state, id).await?;
    ok(studio.generate_scene_image(index, settings).await?)
}

/// GET /api/sessions/:id/scenes/:index/images/:image/download
pub async fn download_scene_image(
    Path((id, index, image)): Path<(Uuid, usize, usize)>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    ok(session(&state, id).await?.scene_image_download(index, image)?)
}

// ============================================================================
// AUDIO
// ============================================================================

/// PUT /api/sessions/:id/audio-preferences
pub async fn set_audio_preferences(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(update): Json<AudioPreferencesUpdate>,
) -> ApiResult {
    ok(session(&state, id).await?.set_audio_preferences(update)?)
}

/// POST /api/sessions/:id/audio - Narrate the given text or the script
pub async fn synthesize_audio(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<SynthesizeBody>>,
) -> ApiResult {
    let text = body.and_then(|Json(b)| b.text);
    let studio = session(&state, id).await?;
    ok(studio.synthesize_audio(text).await?)
}

/// POST /api/sessions/:id/audio/play-pause
pub async fn play_pause(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    let audio_state = session(&state, id).await?.play_pause()?;
    ok(json!({ "state": audio_state }))
}

/// POST /api/sessions/:id/audio/reset
pub async fn reset_audio(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    let studio = session(&state, id).await?;
    studio.reset_audio();
    ok(json!({ "state": studio.audio_state() }))
}

/// GET /api/sessions/:id/audio/download
pub async fn download_audio(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    ok(session(&state, id).await?.audio_download()?)
}

// ============================================================================
// CAPTIONS & STAGES
// ============================================================================

/// PUT /api/sessions/:id/captions
pub async fn set_captions(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(settings): Json<CaptionSettings>,
) -> ApiResult {
    session(&state, id).await?.set_caption_settings(settings)?;
    ok(json!({ "success": true }))
}

fn stage_response(studio: &Studio) -> ApiResult {
    ok(json!({
        "current_stage": studio.current_stage(),
        "steps": studio.steps(),
    }))
}

/// GET /api/sessions/:id/stage
pub async fn get_stage(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    stage_response(&*session(&state, id).await?)
}

/// PUT /api/sessions/:id/stage - Jump to a stage by number
pub async fn go_to_stage(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<GoToRequest>,
) -> ApiResult {
    let stage = Stage::from_number(body.stage).ok_or_else(|| {
        StudioError::InvalidInput(format!("Stage must be between 1 and 5, got {}", body.stage))
    })?;
    let studio = session(&state, id).await?;
    studio.go_to(stage)?;
    stage_response(&studio)
}

/// POST /api/sessions/:id/stage/advance
pub async fn advance_stage(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    let studio = session(&state, id).await?;
    studio.advance()?;
    stage_response(&studio)
}

/// POST /api/sessions/:id/stage/retreat
pub async fn retreat_stage(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    let studio = session(&state, id).await?;
    studio.retreat();
    stage_response(&studio)
}

/// POST /api/sessions/:id/finalize
pub async fn finalize(
    Path(id): Path<Uuid>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult {
    ok(session(&state, id).await?.finalize()?)
}

// ============================================================================
// CATALOG
// ============================================================================

/// GET /api/voices - Engine, language and voice catalog
pub async fn list_voices() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "engines": crate::voices::engines() })))
}

/// Routes for session management
pub fn session_routes() -> Router {
    Router::new()
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/script", put(set_script))
        .route("/api/sessions/:id/analyze", post(analyze_script))
        .route("/api/sessions/:id/characters", post(add_character))
        .route("/api/sessions/:id/characters/:index", axum::routing::patch(edit_character))
        .route(
            "/api/sessions/:id/character-edit",
            put(begin_character_edit).delete(end_character_edit),
        )
        .route("/api/sessions/:id/scene-preferences", put(set_scene_preferences))
        .route("/api/sessions/:id/scenes", post(generate_scenes))
        .route("/api/sessions/:id/scenes/:index", axum::routing::patch(edit_scene))
        .route("/api/sessions/:id/scene-edit", put(begin_scene_edit).delete(end_scene_edit))
        .route("/api/sessions/:id/scenes/:index/images", post(generate_scene_image))
        .route(
            "/api/sessions/:id/scenes/:index/images/:image/download",
            get(download_scene_image),
        )
        .route("/api/sessions/:id/audio-preferences", put(set_audio_preferences))
        .route("/api/sessions/:id/audio", post(synthesize_audio))
        .route("/api/sessions/:id/audio/play-pause", post(play_pause))
        .route("/api/sessions/:id/audio/reset", post(reset_audio))
        .route("/api/sessions/:id/audio/download", get(download_audio))
        .route("/api/sessions/:id/captions", put(set_captions))
        .route("/api/sessions/:id/stage", get(get_stage).put(go_to_stage))
        .route("/api/sessions/:id/stage/advance", post(advance_stage))
        .route("/api/sessions/:id/stage/retreat", post(retreat_stage))
        .route("/api/sessions/:id/finalize", post(finalize))
        .route("/api/voices", get(list_voices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Capability, GenerationFailure};
    use crate::workflow::GateKey;

    #[test]
    fn error_kinds_map_to_http_statuses() {
        let cases = [
            (StudioError::InvalidInput("empty".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (StudioError::AlreadyInProgress(GateKey::Audio), StatusCode::CONFLICT),
            (StudioError::QuotaExceeded { index: 0, limit: 3 }, StatusCode::TOO_MANY_REQUESTS),
            (StudioError::SceneNotFound { index: 9, len: 2 }, StatusCode::NOT_FOUND),
            (StudioError::PreferencesLocked, StatusCode::CONFLICT),
            (
                StudioError::generation(Capability::AnalyzeScript, GenerationFailure::transport("down")),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn unknown_session_is_404() {
        let response = ApiError::SessionNotFound(Uuid::new_v4()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
