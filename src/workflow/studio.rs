// workflow/studio.rs - One production session: stage flow, artifacts and generation calls
//
// All mutable state sits behind one std Mutex. It is only ever taken in short
// synchronous sections and never held across an `.await`, so the backend
// calls are the only suspension points.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::audio_session::{AudioSession, AudioState, PlaybackDevice};
use super::editor::{CharacterEditor, ReplaceOutcome, SceneEditor};
use super::error::StudioError;
use super::gate::{GateKey, RequestGate};
use super::quota::{GenerationQuota, SceneSlot};
use super::stage::{Stage, StageController, StepView};
use super::store::{ArtifactStore, StageError};
use crate::captions::CaptionSettings;
use crate::generation::{
    AnalysisPayload, AnalysisRequest, Capability, GenerationBackend, SceneImageRequest, SceneRecord,
    ScenesRequest, SynthesisRequest,
};
use crate::types::{
    AssetDownload, CharacterField, GeneratedAudio, ImageSettings, Scene, SceneField, ScenePreferences,
    ScriptAnalysis, MAX_IMAGES_PER_SCENE,
};
use crate::voices::{AudioPreferences, AudioPreferencesUpdate};

const SUMMARY_DESCRIPTION_CHARS: usize = 100;

struct SessionState {
    controller: StageController,
    store: ArtifactStore,
    gate: RequestGate,
    quota: GenerationQuota<SceneSlot>,
    scene_editor: SceneEditor,
    character_editor: CharacterEditor,
    audio: AudioSession,
    updated_at: DateTime<Utc>,
}

impl SessionState {
    fn new(device: Box<dyn PlaybackDevice>) -> Self {
        Self {
            controller: StageController::new(),
            store: ArtifactStore::default(),
            gate: RequestGate::new(),
            quota: GenerationQuota::new(MAX_IMAGES_PER_SCENE),
            scene_editor: SceneEditor::default(),
            character_editor: CharacterEditor::default(),
            audio: AudioSession::new(device),
            updated_at: Utc::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn lock_state(inner: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    // A panic inside a critical section leaves plain data behind; keep serving.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Admission for one outstanding call. Settled explicitly when the result is
/// applied; if the future is dropped first, `Drop` gives the gate key and any
/// quota reservation back.
struct InFlight {
    inner: Arc<Mutex<SessionState>>,
    key: GateKey,
    slot: Option<SceneSlot>,
    settled: bool,
}

impl InFlight {
    fn settle(mut self, state: &mut SessionState) {
        state.gate.end(self.key);
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = lock_state(&self.inner);
        state.gate.end(self.key);
        if let Some(slot) = self.slot {
            state.quota.release(&slot);
        }
        if self.key == GateKey::Audio && state.audio.state() == AudioState::Loading {
            state.audio.fail("Audio generation was cancelled");
        }
        tracing::warn!("{} abandoned before its result arrived", self.key);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneImageOutcome {
    pub index: usize,
    pub image_url: String,
    pub generated_image_count: usize,
    pub remaining_images: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub scene_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioView {
    pub state: AudioState,
    pub audio: Option<GeneratedAudio>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_stage: Stage,
    pub steps: Vec<StepView>,
    pub script_text: String,
    pub analysis: Option<ScriptAnalysis>,
    pub scenes: Vec<Scene>,
    pub scene_epoch: u64,
    pub scene_preferences: ScenePreferences,
    pub editing_scene: Option<usize>,
    pub editing_character: Option<usize>,
    pub audio_preferences: AudioPreferences,
    pub audio: AudioView,
    pub captions: CaptionSettings,
    pub in_flight: Vec<GateKey>,
    pub errors: Vec<(Stage, StageError)>,
}

/// Lightweight listing entry for the registry.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub title: Option<String>,
    pub current_stage: Stage,
    pub scene_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub calls_in_flight: usize,
}

pub struct Studio {
    id: Uuid,
    created_at: DateTime<Utc>,
    inner: Arc<Mutex<SessionState>>,
    backend: Arc<dyn GenerationBackend>,
}

impl Studio {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self::with_playback(backend, Box::new(super::audio_session::HeadlessPlayback::default()))
    }

    pub fn with_playback(backend: Arc<dyn GenerationBackend>, device: Box<dyn PlaybackDevice>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            inner: Arc::new(Mutex::new(SessionState::new(device))),
            backend,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.inner)
    }

    fn admit(&self, state: &mut SessionState, key: GateKey) -> Result<InFlight, StudioError> {
        if !state.gate.begin(key) {
            tracing::warn!("Session {}: {} rejected, already in flight", self.id, key);
            return Err(StudioError::AlreadyInProgress(key));
        }
        Ok(InFlight {
            inner: self.inner.clone(),
            key,
            slot: None,
            settled: false,
        })
    }

    // ------------------------------------------------------------------
    // Script
    // ------------------------------------------------------------------

    pub fn set_script_text(&self, text: String) {
        let mut state = self.lock();
        state.store.set_script_text(text);
        state.touch();
    }

    /// Rejects blank input before any call is made.
    pub async fn analyze_script(&self, text: String) -> Result<ScriptAnalysis, StudioError> {
        let (ticket, request) = {
            let mut state = self.lock();
            if text.trim().is_empty() {
                let err = StudioError::InvalidInput("Please enter a script to analyze".to_string());
                state.store.record_error(Stage::Script, &err);
                return Err(err);
            }
            let ticket = self.admit(&mut state, GateKey::Analysis)?;
            state.store.set_script_text(text.clone());
            state.store.clear_error(Stage::Script);
            state.touch();
            (ticket, AnalysisRequest { story: text })
        };

        tracing::info!("Session {}: analyzing script ({} chars)", self.id, request.story.chars().count());
        let result = self.backend.analyze_script(&request).await;

        let mut state = self.lock();
        ticket.settle(&mut state);
        state.touch();
        match result {
            Ok(analysis) => {
                tracing::info!(
                    "Session {}: analysis '{}' with {} characters",
                    self.id,
                    analysis.title,
                    analysis.characters.len()
                );
                state.store.set_analysis(analysis.clone());
                state.character_editor.on_new_analysis();
                Ok(analysis)
            }
            Err(failure) => {
                tracing::error!("Session {}: analyzeScript failed: {}", self.id, failure);
                let err = StudioError::generation(Capability::AnalyzeScript, failure);
                state.store.record_error(Stage::Script, &err);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Characters
    // ------------------------------------------------------------------

    pub fn add_character(&self, name: &str, description: &str) -> Result<usize, StudioError> {
        let mut state = self.lock();
        let SessionState {
            store,
            character_editor,
            ..
        } = &mut *state;
        let index = character_editor.add(store, name, description)?;
        state.touch();
        Ok(index)
    }

    pub fn begin_character_edit(&self, index: usize) -> Result<(), StudioError> {
        let mut state = self.lock();
        let SessionState {
            store,
            character_editor,
            ..
        } = &mut *state;
        character_editor.begin_edit(store, index)
    }

    pub fn end_character_edit(&self) {
        self.lock().character_editor.exit_edit();
    }

    pub fn edit_character(&self, index: usize, field: CharacterField, value: String) -> Result<(), StudioError> {
        let mut state = self.lock();
        let SessionState {
            store,
            character_editor,
            ..
        } = &mut *state;
        character_editor.edit_field(store, index, field, value)?;
        state.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scenes
    // ------------------------------------------------------------------

    pub fn set_scene_preferences(&self, prefs: ScenePreferences) -> Result<ScenePreferences, StudioError> {
        let mut state = self.lock();
        if state.gate.is_in_flight(GateKey::Scenes) {
            return Err(StudioError::PreferencesLocked);
        }
        state.store.set_scene_preferences(prefs);
        state.touch();
        Ok(prefs)
    }

    /// A success replaces the entire scene list, local edits included.
    pub async fn generate_scenes(&self) -> Result<ReplaceOutcome, StudioError> {
        let (ticket, request) = {
            let mut state = self.lock();
            let analysis = match state.store.analysis() {
                Some(analysis) => AnalysisPayload::from(analysis),
                None => {
                    let err = StudioError::InvalidInput("Analyze the script before generating scenes".to_string());
                    state.store.record_error(Stage::Scenes, &err);
                    return Err(err);
                }
            };
            let ticket = self.admit(&mut state, GateKey::Scenes)?;
            state.store.clear_error(Stage::Scenes);
            let request = ScenesRequest {
                story: state.store.script_text().to_string(),
                analysis,
                preferences: state.store.scene_preferences(),
            };
            (ticket, request)
        };

        tracing::info!("Session {}: generating scenes", self.id);
        let result = self.backend.generate_scenes(&request).await;

        let mut state = self.lock();
        ticket.settle(&mut state);
        state.touch();
        match result {
            Ok(scenes) => {
                let SessionState {
                    store, scene_editor, ..
                } = &mut *state;
                let outcome = scene_editor.replace_all(store.scene_board_mut(), scenes);
                tracing::info!(
                    "Session {}: {} scenes stored (epoch {})",
                    self.id,
                    outcome.scene_count,
                    outcome.epoch
                );
                Ok(outcome)
            }
            Err(failure) => {
                tracing::error!("Session {}: generateScenes failed: {}", self.id, failure);
                let err = StudioError::generation(Capability::GenerateScenes, failure);
                state.store.record_error(Stage::Scenes, &err);
                Err(err)
            }
        }
    }

    pub fn begin_scene_edit(&self, index: usize) -> Result<(), StudioError> {
        let mut state = self.lock();
        let SessionState {
            store, scene_editor, ..
        } = &mut *state;
        scene_editor.begin_edit(store.scene_board(), index)
    }

    pub fn end_scene_edit(&self) {
        self.lock().scene_editor.exit_edit();
    }

    pub fn edit_scene(&self, index: usize, field: SceneField, value: String) -> Result<(), StudioError> {
        let mut state = self.lock();
        let SessionState {
            store, scene_editor, ..
        } = &mut *state;
        scene_editor.edit_field(store.scene_board_mut(), index, field, value)?;
        state.touch();
        Ok(())
    }

    /// Gate first (one call per scene), then quota (at most three images).
    pub async fn generate_scene_image(
        &self,
        index: usize,
        settings: ImageSettings,
    ) -> Result<SceneImageOutcome, StudioError> {
        let (ticket, request, slot) = {
            let mut state = self.lock();
            let board = state.store.scene_board();
            let (record, generated, slot) = match board.get(index) {
                Some(scene) => (
                    SceneRecord::from(scene),
                    scene.generated_image_count(),
                    SceneSlot {
                        epoch: board.epoch(),
                        index,
                    },
                ),
                None => {
                    return Err(StudioError::SceneNotFound {
                        index,
                        len: board.len(),
                    })
                }
            };

            let mut ticket = self.admit(&mut state, GateKey::SceneImage(index))?;
            if !state.quota.try_reserve(slot, generated) {
                tracing::warn!("Session {}: scene {} image quota exhausted", self.id, index);
                ticket.settle(&mut state);
                return Err(StudioError::QuotaExceeded {
                    index,
                    limit: state.quota.limit(),
                });
            }
            ticket.slot = Some(slot);
            state.store.clear_error(Stage::Scenes);
            (
                ticket,
                SceneImageRequest {
                    scene: record,
                    image_settings: settings,
                },
                slot,
            )
        };

        tracing::info!("Session {}: generating image for scene {}", self.id, index);
        let result = self.backend.generate_scene_image(&request).await;

        let mut state = self.lock();
        ticket.settle(&mut state);
        state.touch();

        let url = match result {
            Ok(url) => url,
            Err(failure) => {
                state.quota.release(&slot);
                tracing::error!("Session {}: generateSceneImage({}) failed: {}", self.id, index, failure);
                let err = StudioError::generation(Capability::GenerateSceneImage, failure);
                state.store.record_error(Stage::Scenes, &err);
                return Err(err);
            }
        };

        let SessionState { store, quota, .. } = &mut *state;
        let board = store.scene_board_mut();
        if board.epoch() != slot.epoch {
            quota.release(&slot);
            tracing::warn!(
                "Session {}: image for scene {} landed on replaced scene list (epoch {} != {})",
                self.id,
                index,
                slot.epoch,
                board.epoch()
            );
            return Err(StudioError::StaleResult { index });
        }
        let scene = match board.get_mut(index) {
            Some(scene) => scene,
            None => {
                quota.release(&slot);
                return Err(StudioError::StaleResult { index });
            }
        };
        let count = match quota.commit(&slot, scene, url.clone()) {
            Some(count) => count,
            None => {
                return Err(StudioError::QuotaExceeded {
                    index,
                    limit: quota.limit(),
                })
            }
        };
        tracing::info!("Session {}: scene {} now has {} images", self.id, index, count);
        Ok(SceneImageOutcome {
            index,
            image_url: url,
            generated_image_count: count,
            remaining_images: scene.remaining_images(),
        })
    }

    pub fn scene_image_download(&self, index: usize, image: usize) -> Result<AssetDownload, StudioError> {
        let state = self.lock();
        let board = state.store.scene_board();
        let scene = board.get(index).ok_or(StudioError::SceneNotFound {
            index,
            len: board.len(),
        })?;
        let url = scene.image_urls().get(image).ok_or_else(|| {
            StudioError::InvalidInput(format!("Scene {} has no image {}", index + 1, image + 1))
        })?;
        Ok(AssetDownload {
            url: url.clone(),
            file_name: format!("scene_{}_{}.jpg", index, Utc::now().timestamp_millis()),
        })
    }

    // ------------------------------------------------------------------
    // Audio
    // ------------------------------------------------------------------

    pub fn set_audio_preferences(&self, update: AudioPreferencesUpdate) -> Result<AudioPreferences, StudioError> {
        let mut state = self.lock();
        update.apply(state.store.audio_preferences_mut())?;
        state.touch();
        Ok(state.store.audio_preferences().clone())
    }

    /// Narrates `text`, or the script when none is given. The previous
    /// narration is released before the request goes out.
    pub async fn synthesize_audio(&self, text: Option<String>) -> Result<GeneratedAudio, StudioError> {
        let (ticket, request) = {
            let mut state = self.lock();
            let text = text.unwrap_or_else(|| state.store.script_text().to_string());
            if text.trim().is_empty() {
                let err = StudioError::InvalidInput("There is no text to narrate".to_string());
                state.store.record_error(Stage::Audio, &err);
                return Err(err);
            }
            let ticket = self.admit(&mut state, GateKey::Audio)?;
            state.store.clear_error(Stage::Audio);
            state.audio.begin_synthesis();
            let request = SynthesisRequest::new(&text, state.store.audio_preferences());
            (ticket, request)
        };

        tracing::info!(
            "Session {}: synthesizing {} chars with {}/{}",
            self.id,
            request.text.chars().count(),
            request.engine.as_str(),
            request.voice_settings.voice_id
        );
        let result = self.backend.synthesize_audio(&request).await;

        let mut state = self.lock();
        ticket.settle(&mut state);
        state.touch();
        match result {
            Ok(audio) => {
                state.audio.complete(audio.clone());
                Ok(audio)
            }
            Err(failure) => {
                tracing::error!("Session {}: synthesizeAudio failed: {}", self.id, failure);
                let err = StudioError::generation(Capability::SynthesizeAudio, failure);
                state.audio.fail(err.user_message());
                state.store.record_error(Stage::Audio, &err);
                Err(err)
            }
        }
    }

    pub fn play_pause(&self) -> Result<AudioState, StudioError> {
        Ok(self.lock().audio.play_pause()?)
    }

    pub fn reset_audio(&self) {
        self.lock().audio.reset();
    }

    pub fn audio_download(&self) -> Result<AssetDownload, StudioError> {
        Ok(self.lock().audio.download()?)
    }

    // ------------------------------------------------------------------
    // Captions
    // ------------------------------------------------------------------

    pub fn set_caption_settings(&self, settings: CaptionSettings) -> Result<(), StudioError> {
        let mut state = self.lock();
        state.store.set_captions(settings)?;
        state.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------

    pub fn current_stage(&self) -> Stage {
        self.lock().controller.current()
    }

    pub fn advance(&self) -> Result<Stage, StudioError> {
        let mut state = self.lock();
        let SessionState { controller, store, .. } = &mut *state;
        Ok(controller.advance(store)?)
    }

    pub fn retreat(&self) -> Stage {
        self.lock().controller.retreat()
    }

    pub fn go_to(&self, stage: Stage) -> Result<Stage, StudioError> {
        let mut state = self.lock();
        let SessionState { controller, store, .. } = &mut *state;
        Ok(controller.go_to(stage, store)?)
    }

    pub fn steps(&self) -> Vec<StepView> {
        self.lock().controller.steps()
    }

    /// Only available from the Render stage.
    pub fn finalize(&self) -> Result<ProjectSummary, StudioError> {
        let state = self.lock();
        if state.controller.current() != Stage::Render {
            return Err(StudioError::InvalidInput(format!(
                "Finish is only available at the {} stage",
                Stage::Render
            )));
        }
        let title = state
            .store
            .analysis()
            .map(|a| a.title.clone())
            .unwrap_or_else(|| "New Script".to_string());
        let excerpt: String = state
            .store
            .script_text()
            .chars()
            .take(SUMMARY_DESCRIPTION_CHARS)
            .collect();
        let summary = ProjectSummary {
            id: self.id,
            title,
            description: format!("{}...", excerpt),
            status: ProjectStatus::Active,
            scene_count: state.store.scenes().len(),
            created_at: self.created_at,
            updated_at: state.updated_at,
        };
        tracing::info!("Session {}: finalized '{}'", self.id, summary.title);
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            updated_at: state.updated_at,
            current_stage: state.controller.current(),
            steps: state.controller.steps(),
            script_text: state.store.script_text().to_string(),
            analysis: state.store.analysis().cloned(),
            scenes: state.store.scenes().to_vec(),
            scene_epoch: state.store.scene_board().epoch(),
            scene_preferences: state.store.scene_preferences(),
            editing_scene: state.scene_editor.cursor().editing(),
            editing_character: state.character_editor.cursor().editing(),
            audio_preferences: state.store.audio_preferences().clone(),
            audio: AudioView {
                state: state.audio.state(),
                audio: state.audio.audio().cloned(),
                error: state.audio.last_error().map(str::to_string),
            },
            captions: state.store.captions().clone(),
            in_flight: state.gate.in_flight(),
            errors: state
                .store
                .errors()
                .iter()
                .map(|(stage, err)| (*stage, err.clone()))
                .collect(),
        }
    }

    pub fn info(&self) -> SessionInfo {
        let state = self.lock();
        SessionInfo {
            id: self.id,
            title: state.store.analysis().map(|a| a.title.clone()),
            current_stage: state.controller.current(),
            scene_count: state.store.scenes().len(),
            created_at: self.created_at,
            updated_at: state.updated_at,
            calls_in_flight: state.gate.in_flight().len(),
        }
    }

    pub fn scene(&self, index: usize) -> Option<Scene> {
        self.lock().store.scene_board().get(index).cloned()
    }

    pub fn audio_state(&self) -> AudioState {
        self.lock().audio.state()
    }
}
