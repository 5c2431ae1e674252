// captions.rs - Caption styling configuration (client-local, never generated remotely)
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptionError {
    #[error("Invalid caption setting '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl CaptionError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalPosition {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalPosition {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    Fade,
    Slide,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaptionFormat {
    Srt,
    Vtt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Sentence,
    Word,
    Character,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSettings {
    pub family: String,
    pub size: u32,
    pub weight: String,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSettings {
    pub vertical: VerticalPosition,
    pub horizontal: HorizontalPosition,
    pub padding_bottom: u32,
    pub padding_left: u32,
    pub padding_right: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSettings {
    pub background_color: String,
    pub text_align: HorizontalPosition,
    pub line_height: f32,
    pub max_width: String,
    pub border_radius: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSettings {
    #[serde(rename = "type")]
    pub kind: AnimationType,
    pub duration: f32,
    pub delay: f32,
    pub easing: String,
}

/// Seconds per word, clamped into `[min_duration, max_duration]` per caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    pub word_duration: f32,
    pub min_duration: f32,
    pub max_duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilitySettings {
    pub enabled: bool,
    pub font_size: String,
    pub contrast: Contrast,
    pub screen_reader_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSettings {
    #[serde(rename = "type")]
    pub kind: CaptionFormat,
    pub split_strategy: SplitStrategy,
    pub max_lines_per_caption: u32,
    pub max_characters_per_line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSettings {
    pub primary: String,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSettings {
    pub font: FontSettings,
    pub position: PositionSettings,
    pub style: StyleSettings,
    pub animation: AnimationSettings,
    pub timing: TimingSettings,
    pub accessibility: AccessibilitySettings,
    pub format: FormatSettings,
    pub language: LanguageSettings,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            font: FontSettings {
                family: "Arial".to_string(),
                size: 48,
                weight: "bold".to_string(),
                color: "#FFFFFF".to_string(),
                stroke_color: "#000000".to_string(),
                stroke_width: 2,
            },
            position: PositionSettings {
                vertical: VerticalPosition::Bottom,
                horizontal: HorizontalPosition::Center,
                padding_bottom: 50,
                padding_left: 0,
                padding_right: 0,
            },
            style: StyleSettings {
                background_color: "rgba(0, 0, 0, 0.5)".to_string(),
                text_align: HorizontalPosition::Center,
                line_height: 1.5,
                max_width: "80%".to_string(),
                border_radius: 8,
                padding: 12,
            },
            animation: AnimationSettings {
                kind: AnimationType::Fade,
                duration: 0.5,
                delay: 0.2,
                easing: "ease-in-out".to_string(),
            },
            timing: TimingSettings {
                word_duration: 0.3,
                min_duration: 2.0,
                max_duration: 6.0,
            },
            accessibility: AccessibilitySettings {
                enabled: true,
                font_size: "1.2em".to_string(),
                contrast: Contrast::High,
                screen_reader_only: false,
            },
            format: FormatSettings {
                kind: CaptionFormat::Srt,
                split_strategy: SplitStrategy::Sentence,
                max_lines_per_caption: 2,
                max_characters_per_line: 42,
            },
            language: LanguageSettings {
                primary: "en-US".to_string(),
                fallback: "en".to_string(),
            },
        }
    }
}

impl CaptionSettings {
    pub fn validate(&self) -> Result<(), CaptionError> {
        if self.font.family.trim().is_empty() {
            return Err(CaptionError::invalid("font.family", "must not be empty"));
        }
        if self.font.size == 0 {
            return Err(CaptionError::invalid("font.size", "must be greater than zero"));
        }
        if !(self.style.line_height > 0.0) {
            return Err(CaptionError::invalid("style.line_height", "must be positive"));
        }
        if self.animation.duration < 0.0 || self.animation.delay < 0.0 {
            return Err(CaptionError::invalid("animation", "duration and delay must not be negative"));
        }

        let timing = &self.timing;
        if !(timing.word_duration > 0.0) {
            return Err(CaptionError::invalid("timing.word_duration", "must be positive"));
        }
        if !(timing.min_duration > 0.0) {
            return Err(CaptionError::invalid("timing.min_duration", "must be positive"));
        }
        if timing.min_duration > timing.max_duration {
            return Err(CaptionError::invalid(
                "timing",
                format!(
                    "min_duration {} exceeds max_duration {}",
                    timing.min_duration, timing.max_duration
                ),
            ));
        }

        if self.format.max_lines_per_caption == 0 {
            return Err(CaptionError::invalid("format.max_lines_per_caption", "must be at least 1"));
        }
        if self.format.max_characters_per_line == 0 {
            return Err(CaptionError::invalid("format.max_characters_per_line", "must be at least 1"));
        }
        if self.language.primary.trim().is_empty() {
            return Err(CaptionError::invalid("language.primary", "must not be empty"));
        }
        Ok(())
    }
}
