// workflow/store.rs - Canonical in-memory artifacts of one session
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::error::{ErrorKind, StudioError};
use super::stage::Stage;
use crate::captions::{CaptionError, CaptionSettings};
use crate::types::{Scene, ScenePreferences, ScriptAnalysis};
use crate::voices::AudioPreferences;

/// The ordered scene list plus an epoch bumped on every wholesale replace.
/// Anything that remembers a scene by position also remembers the epoch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneBoard {
    scenes: Vec<Scene>,
    epoch: u64,
}

impl SceneBoard {
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Scene> {
        self.scenes.get_mut(index)
    }

    pub fn replace(&mut self, scenes: Vec<Scene>) -> u64 {
        self.scenes = scenes;
        self.epoch += 1;
        self.epoch
    }
}

/// Last failure seen by a stage, kept until the next attempt is admitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    script_text: String,
    analysis: Option<ScriptAnalysis>,
    scenes: SceneBoard,
    scene_preferences: ScenePreferences,
    audio_preferences: AudioPreferences,
    captions: CaptionSettings,
    errors: BTreeMap<Stage, StageError>,
}

impl ArtifactStore {
    pub fn script_text(&self) -> &str {
        &self.script_text
    }

    pub fn set_script_text(&mut self, text: impl Into<String>) {
        self.script_text = text.into();
    }

    pub fn analysis(&self) -> Option<&ScriptAnalysis> {
        self.analysis.as_ref()
    }

    pub fn analysis_mut(&mut self) -> Option<&mut ScriptAnalysis> {
        self.analysis.as_mut()
    }

    /// A new analysis always replaces the previous one whole.
    pub fn set_analysis(&mut self, analysis: ScriptAnalysis) {
        self.analysis = Some(analysis);
    }

    pub fn scenes(&self) -> &[Scene] {
        self.scenes.scenes()
    }

    pub fn scene_board(&self) -> &SceneBoard {
        &self.scenes
    }

    pub fn scene_board_mut(&mut self) -> &mut SceneBoard {
        &mut self.scenes
    }

    pub fn replace_scenes(&mut self, scenes: Vec<Scene>) -> u64 {
        self.scenes.replace(scenes)
    }

    pub fn scene_preferences(&self) -> ScenePreferences {
        self.scene_preferences
    }

    pub fn set_scene_preferences(&mut self, prefs: ScenePreferences) {
        self.scene_preferences = prefs;
    }

    pub fn audio_preferences(&self) -> &AudioPreferences {
        &self.audio_preferences
    }

    pub fn audio_preferences_mut(&mut self) -> &mut AudioPreferences {
        &mut self.audio_preferences
    }

    pub fn captions(&self) -> &CaptionSettings {
        &self.captions
    }

    /// Invalid settings are rejected and the stored ones kept.
    pub fn set_captions(&mut self, settings: CaptionSettings) -> Result<(), CaptionError> {
        settings.validate()?;
        self.captions = settings;
        Ok(())
    }

    pub fn record_error(&mut self, stage: Stage, err: &StudioError) {
        self.errors.insert(
            stage,
            StageError {
                kind: err.kind(),
                message: err.user_message(),
                occurred_at: Utc::now(),
            },
        );
    }

    pub fn clear_error(&mut self, stage: Stage) {
        self.errors.remove(&stage);
    }

    pub fn error(&self, stage: Stage) -> Option<&StageError> {
        self.errors.get(&stage)
    }

    pub fn errors(&self) -> &BTreeMap<Stage, StageError> {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_bumps_epoch() {
        let mut store = ArtifactStore::default();
        assert_eq!(store.scene_board().epoch(), 0);
        assert_eq!(store.replace_scenes(vec![Scene::default(); 2]), 1);
        assert_eq!(store.replace_scenes(vec![]), 2);
        assert!(store.scenes().is_empty());
    }

    #[test]
    fn invalid_captions_keep_previous_settings() {
        let mut store = ArtifactStore::default();
        let mut bad = CaptionSettings::default();
        bad.font.size = 0;
        assert!(store.set_captions(bad).is_err());
        assert_eq!(store.captions(), &CaptionSettings::default());
    }

    #[test]
    fn errors_are_per_stage() {
        let mut store = ArtifactStore::default();
        store.record_error(Stage::Script, &StudioError::InvalidInput("Please enter a script".into()));
        assert_eq!(store.error(Stage::Script).map(|e| e.kind), Some(ErrorKind::InvalidInput));
        assert!(store.error(Stage::Scenes).is_none());

        store.clear_error(Stage::Script);
        assert!(store.errors().is_empty());
    }
}
