// workflow/audio_session.rs - Lifecycle of the single generated narration
use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

use crate::types::{AssetDownload, GeneratedAudio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Failed,
}

impl AudioState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioState::Idle => "idle",
            AudioState::Loading => "loading",
            AudioState::Ready => "ready",
            AudioState::Playing => "playing",
            AudioState::Paused => "paused",
            AudioState::Failed => "failed",
        }
    }

    /// States in which a narration artifact is held.
    pub fn has_audio(&self) -> bool {
        matches!(self, AudioState::Ready | AudioState::Playing | AudioState::Paused)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("No audio has been generated yet")]
    NoAudio,

    #[error("Audio is not available while {}", .0.as_str())]
    NotReady(AudioState),

    #[error("Audio playback failed: {0}")]
    Playback(String),
}

/// Device-level playback primitive. Implementations own the actual sound
/// output; the session only sequences calls.
pub trait PlaybackDevice: Send {
    fn load(&mut self, url: &str) -> Result<(), String>;
    fn play(&mut self) -> Result<(), String>;
    fn pause(&mut self) -> Result<(), String>;
    fn unload(&mut self);
}

/// Server-side stand-in for a real player: it checks the resource is a
/// loadable URL and tracks nothing else.
#[derive(Debug, Default)]
pub struct HeadlessPlayback {
    loaded: Option<Url>,
}

impl PlaybackDevice for HeadlessPlayback {
    fn load(&mut self, url: &str) -> Result<(), String> {
        let parsed = Url::parse(url).map_err(|e| format!("Cannot load '{}': {}", url, e))?;
        self.loaded = Some(parsed);
        Ok(())
    }

    fn play(&mut self) -> Result<(), String> {
        match self.loaded {
            Some(_) => Ok(()),
            None => Err("nothing loaded".to_string()),
        }
    }

    fn pause(&mut self) -> Result<(), String> {
        self.play()
    }

    fn unload(&mut self) {
        self.loaded = None;
    }
}

pub struct AudioSession {
    state: AudioState,
    audio: Option<GeneratedAudio>,
    device: Box<dyn PlaybackDevice>,
    loaded: bool,
    last_error: Option<String>,
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("state", &self.state)
            .field("audio", &self.audio)
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new(Box::new(HeadlessPlayback::default()))
    }
}

impl AudioSession {
    pub fn new(device: Box<dyn PlaybackDevice>) -> Self {
        Self {
            state: AudioState::Idle,
            audio: None,
            device,
            loaded: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn audio(&self) -> Option<&GeneratedAudio> {
        self.audio.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Any state back to Idle; the previous resource is released.
    pub fn reset(&mut self) {
        if self.loaded {
            self.device.unload();
            self.loaded = false;
        }
        if self.audio.take().is_some() {
            tracing::debug!("Released previous narration");
        }
        self.last_error = None;
        self.state = AudioState::Idle;
    }

    /// Called right before a synthesis request goes out.
    pub fn begin_synthesis(&mut self) {
        self.reset();
        self.state = AudioState::Loading;
    }

    pub fn complete(&mut self, audio: GeneratedAudio) {
        tracing::info!("Narration ready: {}", audio.url);
        self.audio = Some(audio);
        self.loaded = false;
        self.last_error = None;
        self.state = AudioState::Ready;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.audio = None;
        self.loaded = false;
        self.last_error = Some(message.into());
        self.state = AudioState::Failed;
    }

    /// Toggles Playing/Paused, loading the resource on first use.
    pub fn play_pause(&mut self) -> Result<AudioState, AudioError> {
        match self.state {
            AudioState::Ready => {
                if !self.loaded {
                    let url = match self.audio {
                        Some(ref audio) => audio.url.clone(),
                        None => return Err(AudioError::NoAudio),
                    };
                    if let Err(e) = self.device.load(&url) {
                        tracing::error!("Narration load failed: {}", e);
                        self.fail(e.clone());
                        return Err(AudioError::Playback(e));
                    }
                    self.loaded = true;
                }
                self.device.play().map_err(AudioError::Playback)?;
                self.state = AudioState::Playing;
            }
            AudioState::Playing => {
                self.device.pause().map_err(AudioError::Playback)?;
                self.state = AudioState::Paused;
            }
            AudioState::Paused => {
                self.device.play().map_err(AudioError::Playback)?;
                self.state = AudioState::Playing;
            }
            AudioState::Loading => return Err(AudioError::NotReady(AudioState::Loading)),
            AudioState::Idle | AudioState::Failed => return Err(AudioError::NoAudio),
        }
        Ok(self.state)
    }

    /// Describes the download; playback state is untouched. Requires a held
    /// narration, so Ready as well as Playing and Paused qualify; Idle,
    /// Loading and Failed do not.
    pub fn download(&self) -> Result<AssetDownload, AudioError> {
        if !self.state.has_audio() {
            return Err(match self.state {
                AudioState::Loading => AudioError::NotReady(AudioState::Loading),
                _ => AudioError::NoAudio,
            });
        }
        let audio = self.audio.as_ref().ok_or(AudioError::NoAudio)?;
        Ok(AssetDownload {
            url: audio.url.clone(),
            file_name: format!("narration_{}.mp3", Utc::now().timestamp_millis()),
        })
    }
}
