// workflow/error.rs - Outcome taxonomy of studio operations
use serde::Serialize;
use thiserror::Error;

use super::audio_session::AudioError;
use super::gate::GateKey;
use super::stage::StageBlocked;
use crate::captions::CaptionError;
use crate::generation::{Capability, GenerationFailure};
use crate::voices::VoiceError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudioError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} is already in progress")]
    AlreadyInProgress(GateKey),

    #[error("Scene {} already has the maximum of {} images", .index + 1, .limit)]
    QuotaExceeded { index: usize, limit: usize },

    #[error("Scene {} does not exist ({} scenes)", .index + 1, .len)]
    SceneNotFound { index: usize, len: usize },

    #[error("Character {} does not exist ({} characters)", .index + 1, .len)]
    CharacterNotFound { index: usize, len: usize },

    #[error("{} {} is not being edited", .list, .index + 1)]
    NotEditing { list: &'static str, index: usize },

    #[error("Scene preferences cannot change while scenes are being generated")]
    PreferencesLocked,

    #[error(transparent)]
    StageBlocked(#[from] StageBlocked),

    #[error("The image for scene {} arrived after the scenes were regenerated and was discarded", .index + 1)]
    StaleResult { index: usize },

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Captions(#[from] CaptionError),

    #[error("{capability} failed: {failure}")]
    Generation {
        capability: Capability,
        failure: GenerationFailure,
    },
}

/// Stable, serializable classification of a `StudioError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    AlreadyInProgress,
    QuotaExceeded,
    NotFound,
    NotEditing,
    PreferencesLocked,
    StageBlocked,
    StaleResult,
    Playback,
    Transport,
    ServerRejected,
    MalformedResponse,
}

impl StudioError {
    pub fn generation(capability: Capability, failure: GenerationFailure) -> Self {
        Self::Generation { capability, failure }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StudioError::InvalidInput(_) | StudioError::Voice(_) | StudioError::Captions(_) => ErrorKind::InvalidInput,
            StudioError::AlreadyInProgress(_) => ErrorKind::AlreadyInProgress,
            StudioError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            StudioError::SceneNotFound { .. } | StudioError::CharacterNotFound { .. } => ErrorKind::NotFound,
            StudioError::NotEditing { .. } => ErrorKind::NotEditing,
            StudioError::PreferencesLocked => ErrorKind::PreferencesLocked,
            StudioError::StageBlocked(_) => ErrorKind::StageBlocked,
            StudioError::StaleResult { .. } => ErrorKind::StaleResult,
            StudioError::Audio(_) => ErrorKind::Playback,
            StudioError::Generation { failure, .. } => match failure {
                GenerationFailure::Transport(_) => ErrorKind::Transport,
                GenerationFailure::ServerRejected { .. } => ErrorKind::ServerRejected,
                GenerationFailure::MalformedResponse(_) => ErrorKind::MalformedResponse,
            },
        }
    }

    /// Message fit for the user: server rejections verbatim, other generation
    /// failures generic, everything else its own description.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Generation { capability, failure } => failure.user_message(*capability),
            other => other.to_string(),
        }
    }
}
