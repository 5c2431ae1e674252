// voices.rs - Speech engine catalog and audio preferences
//
// Languages and voices are only valid relative to an engine, so preferences
// are changed through setters that re-derive the dependent fields instead of
// being written field by field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_SPEECH_RATE: u16 = 20;
pub const MAX_SPEECH_RATE: u16 = 200;
pub const SUPPORTED_SAMPLE_RATES: [u32; 4] = [8000, 16000, 22050, 24000];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeechEngine {
    #[default]
    Generative,
    LongForm,
    Neural,
    Standard,
}

impl SpeechEngine {
    pub const ALL: [SpeechEngine; 4] = [
        SpeechEngine::Generative,
        SpeechEngine::LongForm,
        SpeechEngine::Neural,
        SpeechEngine::Standard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechEngine::Generative => "generative",
            SpeechEngine::LongForm => "long-form",
            SpeechEngine::Neural => "neural",
            SpeechEngine::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

#[derive(Debug, Serialize)]
pub struct VoiceEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: Gender,
}

#[derive(Debug, Serialize)]
pub struct EngineLanguage {
    pub code: &'static str,
    pub name: &'static str,
    pub region: &'static str,
    pub voices: &'static [VoiceEntry],
}

#[derive(Debug, Serialize)]
pub struct EngineEntry {
    pub id: SpeechEngine,
    pub title: &'static str,
    pub description: &'static str,
    pub languages: &'static [EngineLanguage],
}

const fn voice(id: &'static str, name: &'static str, gender: Gender) -> VoiceEntry {
    VoiceEntry { id, name, gender }
}

// ============================================================================
// CATALOG
// ============================================================================

static CATALOG: [EngineEntry; 4] = [
    EngineEntry {
        id: SpeechEngine::Generative,
        title: "Generative",
        description: "Produces the most expressive and adaptive speech using Generative AI",
        languages: &[
            EngineLanguage {
                code: "en-US",
                name: "English",
                region: "United States",
                voices: &[
                    voice("Ruth", "Ruth", Gender::Female),
                    voice("Amy", "Amy", Gender::Female),
                    voice("Matthew", "Matthew", Gender::Male),
                    voice("Stephen", "Stephen", Gender::Male),
                    voice("Olivia", "Olivia", Gender::Female),
                    voice("Joanna", "Joanna", Gender::Female),
                    voice("Danielle", "Danielle", Gender::Female),
                ],
            },
            EngineLanguage {
                code: "es-ES",
                name: "Spanish",
                region: "Spain",
                voices: &[
                    voice("Pedro", "Pedro", Gender::Male),
                    voice("Andrés", "Andrés", Gender::Male),
                    voice("Sergio", "Sergio", Gender::Male),
                ],
            },
            EngineLanguage {
                code: "fr-FR",
                name: "French",
                region: "France",
                voices: &[
                    voice("Léa", "Léa", Gender::Female),
                    voice("Rémi", "Rémi", Gender::Male),
                ],
            },
            EngineLanguage {
                code: "hi-IN",
                name: "Hindi",
                region: "India",
                voices: &[voice("Kajal", "Kajal", Gender::Female)],
            },
            EngineLanguage {
                code: "it-IT",
                name: "Italian",
                region: "Italy",
                voices: &[voice("Bianca", "Bianca", Gender::Female)],
            },
        ],
    },
    EngineEntry {
        id: SpeechEngine::LongForm,
        title: "Long-Form",
        description: "Produces the most natural sounding speech for longer content",
        languages: &[
            EngineLanguage {
                code: "en-US",
                name: "English",
                region: "United States",
                voices: &[
                    voice("Patrick", "Patrick", Gender::Male),
                    voice("Ruth", "Ruth", Gender::Female),
                    voice("Danielle", "Danielle", Gender::Female),
                    voice("Gregory", "Gregory", Gender::Male),
                ],
            },
            EngineLanguage {
                code: "es-ES",
                name: "Spanish",
                region: "Spain",
                voices: &[
                    voice("Alba", "Alba", Gender::Female),
                    voice("Raúl", "Raúl", Gender::Male),
                ],
            },
        ],
    },
    EngineEntry {
        id: SpeechEngine::Neural,
        title: "Neural",
        description: "Produces more natural and human-like speech than Standard Engine",
        languages: &[
            EngineLanguage {
                code: "en-US",
                name: "English",
                region: "United States",
                voices: &[
                    voice("Joanna", "Joanna", Gender::Female),
                    voice("Matthew", "Matthew", Gender::Male),
                    voice("Danielle", "Danielle", Gender::Female),
                    voice("Gregory", "Gregory", Gender::Male),
                ],
            },
            EngineLanguage {
                code: "en-IN",
                name: "English",
                region: "India",
                voices: &[voice("Aditi", "Aditi", Gender::Female)], // bilingual en-IN / hi-IN
            },
            EngineLanguage {
                code: "hi-IN",
                name: "Hindi",
                region: "India",
                voices: &[voice("Aditi", "Aditi", Gender::Female)],
            },
            EngineLanguage {
                code: "es-ES",
                name: "Spanish",
                region: "Spain",
                voices: &[voice("Lucia", "Lucia", Gender::Female)],
            },
            EngineLanguage {
                code: "tr-TR",
                name: "Turkish",
                region: "Turkey",
                voices: &[voice("Burcu", "Burcu", Gender::Female)],
            },
        ],
    },
    EngineEntry {
        id: SpeechEngine::Standard,
        title: "Standard",
        description: "Produces natural-sounding speech",
        languages: &[EngineLanguage {
            code: "en-US",
            name: "English",
            region: "United States",
            voices: &[
                voice("Joanna", "Joanna", Gender::Female),
                voice("Matthew", "Matthew", Gender::Male),
                voice("Ivy", "Ivy", Gender::Female),
                voice("Justin", "Justin", Gender::Male),
                voice("Kendra", "Kendra", Gender::Female),
            ],
        }],
    },
];

pub fn engines() -> &'static [EngineEntry] {
    &CATALOG
}

pub fn engine(id: SpeechEngine) -> &'static EngineEntry {
    // every SpeechEngine variant has exactly one catalog row
    CATALOG
        .iter()
        .find(|entry| entry.id == id)
        .unwrap_or(&CATALOG[0])
}

pub fn languages(id: SpeechEngine) -> &'static [EngineLanguage] {
    engine(id).languages
}

pub fn language(id: SpeechEngine, code: &str) -> Option<&'static EngineLanguage> {
    languages(id).iter().find(|lang| lang.code == code)
}

pub fn voices(id: SpeechEngine, code: &str) -> &'static [VoiceEntry] {
    language(id, code).map(|lang| lang.voices).unwrap_or(&[])
}

/// First advertised language/voice pair for an engine.
pub fn default_voice(id: SpeechEngine) -> (&'static str, &'static str) {
    let lang = &languages(id)[0];
    (lang.code, lang.voices[0].id)
}

// ============================================================================
// PREFERENCES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Language '{language}' is not available for the {engine} engine")]
    UnsupportedLanguage { engine: &'static str, language: String },

    #[error("Voice '{voice}' is not available for {language} on the {engine} engine")]
    UnsupportedVoice {
        engine: &'static str,
        language: String,
        voice: String,
    },

    #[error("Speech rate {0} is outside 20..=200")]
    SpeechRateOutOfRange(u16),

    #[error("Sample rate {0} Hz is not supported")]
    UnsupportedSampleRate(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPreferences {
    engine: SpeechEngine,
    language_code: String,
    voice_id: String,
    sample_rate: u32,
    speech_rate: u16,
    ssml: bool,
}

impl Default for AudioPreferences {
    fn default() -> Self {
        let engine = SpeechEngine::default();
        let (language_code, voice_id) = default_voice(engine);
        Self {
            engine,
            language_code: language_code.to_string(),
            voice_id: voice_id.to_string(),
            sample_rate: 22050,
            speech_rate: 100,
            ssml: false,
        }
    }
}

impl AudioPreferences {
    pub fn engine(&self) -> SpeechEngine {
        self.engine
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn speech_rate(&self) -> u16 {
        self.speech_rate
    }

    pub fn ssml(&self) -> bool {
        self.ssml
    }

    /// Switching engines lands on the engine's first language and voice.
    /// Re-selecting the current engine keeps both.
    pub fn set_engine(&mut self, engine: SpeechEngine) {
        if engine == self.engine {
            return;
        }
        let (language_code, voice_id) = default_voice(engine);
        tracing::debug!(
            "Audio engine {} -> {}, voice reset to {}/{}",
            self.engine.as_str(),
            engine.as_str(),
            language_code,
            voice_id
        );
        self.engine = engine;
        self.language_code = language_code.to_string();
        self.voice_id = voice_id.to_string();
    }

    pub fn set_language(&mut self, code: &str) -> Result<(), VoiceError> {
        let lang = language(self.engine, code).ok_or_else(|| VoiceError::UnsupportedLanguage {
            engine: self.engine.as_str(),
            language: code.to_string(),
        })?;
        self.language_code = lang.code.to_string();
        self.voice_id = lang.voices[0].id.to_string();
        Ok(())
    }

    pub fn set_voice(&mut self, voice_id: &str) -> Result<(), VoiceError> {
        let known = voices(self.engine, &self.language_code)
            .iter()
            .any(|v| v.id == voice_id);
        if !known {
            return Err(VoiceError::UnsupportedVoice {
                engine: self.engine.as_str(),
                language: self.language_code.clone(),
                voice: voice_id.to_string(),
            });
        }
        self.voice_id = voice_id.to_string();
        Ok(())
    }

    pub fn set_speech_rate(&mut self, rate: u16) -> Result<(), VoiceError> {
        if !(MIN_SPEECH_RATE..=MAX_SPEECH_RATE).contains(&rate) {
            return Err(VoiceError::SpeechRateOutOfRange(rate));
        }
        self.speech_rate = rate;
        Ok(())
    }

    pub fn set_sample_rate(&mut self, hz: u32) -> Result<(), VoiceError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&hz) {
            return Err(VoiceError::UnsupportedSampleRate(hz));
        }
        self.sample_rate = hz;
        Ok(())
    }

    pub fn set_ssml(&mut self, enabled: bool) {
        self.ssml = enabled;
    }
}

/// Partial update as sent by the presentation layer. Applied parent-first
/// (engine, then language, then voice) so a single request can pick a full
/// combination under a new engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioPreferencesUpdate {
    pub engine: Option<SpeechEngine>,
    pub language_code: Option<String>,
    pub voice_id: Option<String>,
    pub sample_rate: Option<u32>,
    pub speech_rate: Option<u16>,
    pub ssml: Option<bool>,
}

impl AudioPreferencesUpdate {
    /// Validates against a copy first; `prefs` is only replaced when every
    /// field was accepted.
    pub fn apply(&self, prefs: &mut AudioPreferences) -> Result<(), VoiceError> {
        let mut next = prefs.clone();
        if let Some(engine) = self.engine {
            next.set_engine(engine);
        }
        if let Some(ref code) = self.language_code {
            next.set_language(code)?;
        }
        if let Some(ref voice_id) = self.voice_id {
            next.set_voice(voice_id)?;
        }
        if let Some(hz) = self.sample_rate {
            next.set_sample_rate(hz)?;
        }
        if let Some(rate) = self.speech_rate {
            next.set_speech_rate(rate)?;
        }
        if let Some(ssml) = self.ssml {
            next.set_ssml(ssml);
        }
        *prefs = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_has_a_catalog_row_with_voices() {
        for id in SpeechEngine::ALL {
            let entry = engine(id);
            assert_eq!(entry.id, id);
            assert!(!entry.languages.is_empty());
            for lang in entry.languages {
                assert!(!lang.voices.is_empty(), "{} {} has no voices", id.as_str(), lang.code);
            }
        }
    }

    #[test]
    fn defaults_are_generative_ruth() {
        let prefs = AudioPreferences::default();
        assert_eq!(prefs.engine(), SpeechEngine::Generative);
        assert_eq!(prefs.language_code(), "en-US");
        assert_eq!(prefs.voice_id(), "Ruth");
        assert_eq!(prefs.speech_rate(), 100);
        assert!(!prefs.ssml());
    }

    #[test]
    fn switching_to_standard_resets_to_first_standard_voice() {
        let mut prefs = AudioPreferences::default();
        // Ruth is not offered by the standard engine
        assert!(voices(SpeechEngine::Standard, "en-US").iter().all(|v| v.id != "Ruth"));

        prefs.set_engine(SpeechEngine::Standard);
        assert_eq!(prefs.language_code(), "en-US");
        assert_eq!(prefs.voice_id(), "Joanna");
    }

    #[test]
    fn engine_reset_applies_even_when_language_survives() {
        let mut prefs = AudioPreferences::default();
        prefs.set_language("fr-FR").unwrap();
        assert_eq!(prefs.voice_id(), "Léa");

        prefs.set_engine(SpeechEngine::Neural);
        assert_eq!(prefs.language_code(), "en-US");
        assert_eq!(prefs.voice_id(), "Joanna");
    }

    #[test]
    fn language_and_voice_must_belong_to_engine() {
        let mut prefs = AudioPreferences::default();
        assert!(matches!(
            prefs.set_language("tr-TR"),
            Err(VoiceError::UnsupportedLanguage { .. })
        ));
        assert!(matches!(
            prefs.set_voice("Kendra"),
            Err(VoiceError::UnsupportedVoice { .. })
        ));
        assert_eq!(prefs.voice_id(), "Ruth");
    }

    #[test]
    fn speech_and_sample_rate_bounds() {
        let mut prefs = AudioPreferences::default();
        assert!(prefs.set_speech_rate(20).is_ok());
        assert!(prefs.set_speech_rate(200).is_ok());
        assert_eq!(prefs.set_speech_rate(19), Err(VoiceError::SpeechRateOutOfRange(19)));
        assert_eq!(prefs.set_speech_rate(201), Err(VoiceError::SpeechRateOutOfRange(201)));
        assert_eq!(prefs.speech_rate(), 200);

        assert!(prefs.set_sample_rate(16000).is_ok());
        assert_eq!(prefs.set_sample_rate(44100), Err(VoiceError::UnsupportedSampleRate(44100)));
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut prefs = AudioPreferences::default();
        let update = AudioPreferencesUpdate {
            engine: Some(SpeechEngine::Neural),
            language_code: Some("hi-IN".to_string()),
            speech_rate: Some(500),
            ..AudioPreferencesUpdate::default()
        };
        assert!(update.apply(&mut prefs).is_err());
        assert_eq!(prefs, AudioPreferences::default());

        let update = AudioPreferencesUpdate {
            engine: Some(SpeechEngine::Neural),
            language_code: Some("hi-IN".to_string()),
            voice_id: Some("Aditi".to_string()),
            ..AudioPreferencesUpdate::default()
        };
        update.apply(&mut prefs).unwrap();
        assert_eq!(prefs.engine(), SpeechEngine::Neural);
        assert_eq!(prefs.language_code(), "hi-IN");
        assert_eq!(prefs.voice_id(), "Aditi");
    }

    #[test]
    fn same_engine_update_keeps_language_and_voice() {
        let mut prefs = AudioPreferences::default();
        prefs.set_language("fr-FR").unwrap();
        prefs.set_voice("Rémi").unwrap();

        let update = AudioPreferencesUpdate {
            engine: Some(SpeechEngine::Generative),
            speech_rate: Some(150),
            ..AudioPreferencesUpdate::default()
        };
        update.apply(&mut prefs).unwrap();
        assert_eq!(prefs.language_code(), "fr-FR");
        assert_eq!(prefs.voice_id(), "Rémi");
        assert_eq!(prefs.speech_rate(), 150);
    }
}
