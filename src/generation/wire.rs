// generation/wire.rs - Request payloads and response parsing for the generation services
//
// Parsing is kept free of I/O so every failure classification can be exercised
// without a server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::failure::GenerationFailure;
use super::sanitize::sanitize_for_speech;
use crate::types::{
    Character, GeneratedAudio, ImageSettings, Scene, ScenePreferences, ScriptAnalysis, StorySetting,
};
use crate::voices::{AudioPreferences, SpeechEngine};

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub story: String,
}

/// Analysis as the services exchange it (`story_title` rather than `title`).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPayload {
    pub story_title: String,
    pub characters: Vec<Character>,
    pub setting: StorySetting,
    pub plot: Vec<String>,
    pub moral: String,
}

impl From<&ScriptAnalysis> for AnalysisPayload {
    fn from(analysis: &ScriptAnalysis) -> Self {
        Self {
            story_title: analysis.title.clone(),
            characters: analysis.characters.clone(),
            setting: analysis.setting.clone(),
            plot: analysis.plot.clone(),
            moral: analysis.moral.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenesRequest {
    pub story: String,
    pub analysis: AnalysisPayload,
    pub preferences: ScenePreferences,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub expressiveness: String,
    #[serde(default)]
    pub visual_details: String,
    #[serde(default)]
    pub timeline: String,
}

impl From<&Scene> for SceneRecord {
    fn from(scene: &Scene) -> Self {
        Self {
            scene: scene.description.clone(),
            setting: scene.setting.clone(),
            time_of_day: scene.time_of_day.clone(),
            background: scene.background.clone(),
            mood: scene.mood.clone(),
            expressiveness: scene.expressiveness.clone(),
            visual_details: scene.visual_details.clone(),
            timeline: scene.timeline.clone(),
        }
    }
}

impl From<SceneRecord> for Scene {
    // Anything image-related the service might echo back is ignored:
    // a freshly generated scene always starts with no images.
    fn from(record: SceneRecord) -> Self {
        let mut scene = Scene::default();
        scene.description = record.scene;
        scene.setting = record.setting;
        scene.time_of_day = record.time_of_day;
        scene.background = record.background;
        scene.mood = record.mood;
        scene.expressiveness = record.expressiveness;
        scene.visual_details = record.visual_details;
        scene.timeline = record.timeline;
        scene
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneImageRequest {
    #[serde(flatten)]
    pub scene: SceneRecord,
    pub image_settings: ImageSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceSettingsPayload {
    pub language_code: String,
    pub voice_id: String,
    pub engine: SpeechEngine,
    pub speech_rate: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioSettingsPayload {
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynthesisRequest {
    pub engine: SpeechEngine,
    pub voice_settings: VoiceSettingsPayload,
    pub audio_settings: AudioSettingsPayload,
    pub text: String,
    pub ssml_enabled: bool,
}

impl SynthesisRequest {
    /// Builds the payload from preferences; `text` is truncated and sanitized here
    /// so no caller can send raw input upstream.
    pub fn new(text: &str, prefs: &AudioPreferences) -> Self {
        Self {
            engine: prefs.engine(),
            voice_settings: VoiceSettingsPayload {
                language_code: prefs.language_code().to_string(),
                voice_id: prefs.voice_id().to_string(),
                engine: prefs.engine(),
                speech_rate: prefs.speech_rate(),
            },
            audio_settings: AudioSettingsPayload {
                sample_rate: prefs.sample_rate(),
            },
            text: sanitize_for_speech(text),
            ssml_enabled: prefs.ssml(),
        }
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Deserialize)]
struct CharacterRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

/// Plot points arrive either as plain strings or as `{ "event": ... }` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlotPoint {
    Text(String),
    Event { event: String },
}

impl PlotPoint {
    fn into_text(self) -> String {
        match self {
            PlotPoint::Text(text) => text,
            PlotPoint::Event { event } => event,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisRecord {
    story_title: Option<String>,
    #[serde(default)]
    characters: Vec<CharacterRecord>,
    #[serde(default)]
    setting: Option<StorySetting>,
    #[serde(default)]
    plot: Vec<PlotPoint>,
    #[serde(default)]
    moral: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRecord {
    status: Option<String>,
    image_url: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AudioRecord {
    audio_url: Option<String>,
    duration: Option<f64>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Best-effort error text from a failure body: a JSON `message`/`error` field,
/// otherwise the raw text.
fn rejection_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "errorMessage"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return text.trim().to_string();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        trimmed.to_string()
    }
}

fn json_body(status: u16, body: &str) -> Result<Value, GenerationFailure> {
    if !is_success(status) {
        return Err(GenerationFailure::rejected(status, rejection_message(status, body)));
    }
    serde_json::from_str(body)
        .map_err(|e| GenerationFailure::malformed(format!("Response is not JSON: {}", e)))
}

pub fn parse_analysis(status: u16, body: &str) -> Result<ScriptAnalysis, GenerationFailure> {
    let value = json_body(status, body)?;
    let record: AnalysisRecord = serde_json::from_value(value)
        .map_err(|e| GenerationFailure::malformed(format!("Unexpected analysis shape: {}", e)))?;

    let title = record
        .story_title
        .ok_or_else(|| GenerationFailure::malformed("Analysis is missing story_title"))?;

    Ok(ScriptAnalysis {
        title,
        characters: record
            .characters
            .into_iter()
            .map(|c| Character::new(c.name, c.description))
            .collect(),
        setting: record.setting.unwrap_or_default(),
        plot: record.plot.into_iter().map(PlotPoint::into_text).collect(),
        moral: record.moral.unwrap_or_default(),
    })
}

pub fn parse_scenes(status: u16, body: &str) -> Result<Vec<Scene>, GenerationFailure> {
    let value = json_body(status, body)?;
    if !value.is_array() {
        return Err(GenerationFailure::malformed("Scene response is not an array"));
    }
    let records: Vec<SceneRecord> = serde_json::from_value(value)
        .map_err(|e| GenerationFailure::malformed(format!("Unexpected scene shape: {}", e)))?;
    Ok(records.into_iter().map(Scene::from).collect())
}

pub fn parse_scene_image(status: u16, body: &str) -> Result<String, GenerationFailure> {
    let value = json_body(status, body)?;
    let record: ImageRecord = serde_json::from_value(value)
        .map_err(|e| GenerationFailure::malformed(format!("Unexpected image shape: {}", e)))?;

    match record.status.as_deref() {
        Some("success") => {}
        other => {
            // A body that explains itself is a rejection; a bare bad status is not.
            if let Some(message) = record.message.or(record.error) {
                return Err(GenerationFailure::rejected(status, message));
            }
            return Err(GenerationFailure::malformed(format!(
                "Image status was {:?}",
                other.unwrap_or("missing")
            )));
        }
    }

    match record.image_url {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(GenerationFailure::malformed("Image response is missing image_url")),
    }
}

pub fn parse_audio(status: u16, body: &str) -> Result<GeneratedAudio, GenerationFailure> {
    let value = json_body(status, body)?;
    let record: AudioRecord = serde_json::from_value(value)
        .map_err(|e| GenerationFailure::malformed(format!("Unexpected audio shape: {}", e)))?;
    match record.audio_url {
        Some(url) if !url.trim().is_empty() => Ok(GeneratedAudio {
            url,
            duration: record.duration,
        }),
        _ => Err(GenerationFailure::malformed("Audio response is missing audio_url")),
    }
}
