// types.rs - Artifact data model shared by every stage
use serde::{Deserialize, Serialize};

/// Hard cap on successful image generations for a single scene.
pub const MAX_IMAGES_PER_SCENE: usize = 3;

// ============================================================================
// SCRIPT ANALYSIS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub description: String,
}

impl Character {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterField {
    Name,
    Description,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySetting {
    pub location: String,
    pub time: String,
}

/// Result of a script analysis call. Replaced wholesale by every new analysis;
/// only the character list is edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptAnalysis {
    pub title: String,
    pub characters: Vec<Character>,
    pub setting: StorySetting,
    pub plot: Vec<String>,
    pub moral: String,
}

// ============================================================================
// SCENES
// ============================================================================

/// One generated scene. Image bookkeeping is private so that
/// `generated_image_count == image_urls.len() <= MAX_IMAGES_PER_SCENE` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scene {
    pub description: String,
    pub setting: String,
    pub time_of_day: String,
    pub background: String,
    pub mood: String,
    pub expressiveness: String,
    pub visual_details: String,
    pub timeline: String,
    image_urls: Vec<String>,
    generated_image_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneField {
    Description,
    Setting,
    TimeOfDay,
    Background,
    Mood,
    Expressiveness,
    VisualDetails,
    Timeline,
}

impl SceneField {
    pub const ALL: [SceneField; 8] = [
        SceneField::Description,
        SceneField::Setting,
        SceneField::TimeOfDay,
        SceneField::Background,
        SceneField::Mood,
        SceneField::Expressiveness,
        SceneField::VisualDetails,
        SceneField::Timeline,
    ];
}

impl Scene {
    pub fn image_urls(&self) -> &[String] {
        &self.image_urls
    }

    pub fn generated_image_count(&self) -> usize {
        self.generated_image_count
    }

    pub fn remaining_images(&self) -> usize {
        MAX_IMAGES_PER_SCENE.saturating_sub(self.generated_image_count)
    }

    pub fn field(&self, field: SceneField) -> &str {
        match field {
            SceneField::Description => &self.description,
            SceneField::Setting => &self.setting,
            SceneField::TimeOfDay => &self.time_of_day,
            SceneField::Background => &self.background,
            SceneField::Mood => &self.mood,
            SceneField::Expressiveness => &self.expressiveness,
            SceneField::VisualDetails => &self.visual_details,
            SceneField::Timeline => &self.timeline,
        }
    }

    pub fn set_field(&mut self, field: SceneField, value: String) {
        let slot = match field {
            SceneField::Description => &mut self.description,
            SceneField::Setting => &mut self.setting,
            SceneField::TimeOfDay => &mut self.time_of_day,
            SceneField::Background => &mut self.background,
            SceneField::Mood => &mut self.mood,
            SceneField::Expressiveness => &mut self.expressiveness,
            SceneField::VisualDetails => &mut self.visual_details,
            SceneField::Timeline => &mut self.timeline,
        };
        *slot = value;
    }

    /// Appends a generated image. Returns the new count, or `None` when the
    /// scene is already at the cap (the scene is left untouched).
    pub fn push_image(&mut self, url: String) -> Option<usize> {
        if self.generated_image_count >= MAX_IMAGES_PER_SCENE {
            return None;
        }
        self.image_urls.push(url);
        self.generated_image_count = self.image_urls.len();
        Some(self.generated_image_count)
    }
}

// ============================================================================
// SCENE PREFERENCES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    #[default]
    Drama,
    Comedy,
    Action,
    Thriller,
    Romance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualStyle {
    #[default]
    Realistic,
    Stylized,
    Minimalist,
    Cinematic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Light,
    #[default]
    Neutral,
    Dark,
    Intense,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    Slow,
    #[default]
    Moderate,
    Fast,
    Dynamic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePreferences {
    pub genre: Genre,
    pub style: VisualStyle,
    pub tone: Tone,
    pub pacing: Pacing,
}

// ============================================================================
// MEDIA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            engine: None,
            resolution: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAudio {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Instructions for the file layer; the core never performs the transfer itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDownload {
    pub url: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_image_stops_at_cap() {
        let mut scene = Scene::default();
        for i in 0..MAX_IMAGES_PER_SCENE {
            assert_eq!(scene.push_image(format!("https://img/{}", i)), Some(i + 1));
        }
        assert_eq!(scene.push_image("https://img/overflow".to_string()), None);
        assert_eq!(scene.generated_image_count(), MAX_IMAGES_PER_SCENE);
        assert_eq!(scene.image_urls().len(), MAX_IMAGES_PER_SCENE);
        assert_eq!(scene.remaining_images(), 0);
    }

    #[test]
    fn set_field_touches_only_that_field() {
        let mut scene = Scene {
            description: "tea pours".to_string(),
            mood: "calm".to_string(),
            ..Scene::default()
        };
        scene.set_field(SceneField::Mood, "tense".to_string());
        assert_eq!(scene.field(SceneField::Mood), "tense");
        assert_eq!(scene.field(SceneField::Description), "tea pours");
    }

    #[test]
    fn preference_defaults_match_first_run() {
        let prefs = ScenePreferences::default();
        assert_eq!(prefs.genre, Genre::Drama);
        assert_eq!(prefs.style, VisualStyle::Realistic);
        assert_eq!(prefs.tone, Tone::Neutral);
        assert_eq!(prefs.pacing, Pacing::Moderate);
        let json = serde_json::to_value(prefs).unwrap();
        assert_eq!(json["genre"], "drama");
        assert_eq!(json["pacing"], "moderate");
    }
}
