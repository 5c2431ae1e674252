// generation/failure.rs - Classified outcome of a failed generation call
use std::fmt;
use thiserror::Error;

/// The four remote capabilities the studio consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    AnalyzeScript,
    GenerateScenes,
    GenerateSceneImage,
    SynthesizeAudio,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::AnalyzeScript => "analyzeScript",
            Capability::GenerateScenes => "generateScenes",
            Capability::GenerateSceneImage => "generateSceneImage",
            Capability::SynthesizeAudio => "synthesizeAudio",
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Capability::AnalyzeScript => "analyze script",
            Capability::GenerateScenes => "generate scenes",
            Capability::GenerateSceneImage => "generate image",
            Capability::SynthesizeAudio => "generate audio",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// No connectivity, refused connection, timeout, broken body stream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx answer, or a 2xx answer whose body reports failure.
    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// 2xx answer missing the fields the capability promises.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationFailure {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::ServerRejected {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Text shown to the user. Server messages pass through verbatim,
    /// everything else gets a generic line for the capability.
    pub fn user_message(&self, capability: Capability) -> String {
        match self {
            GenerationFailure::ServerRejected { message, .. } => message.clone(),
            GenerationFailure::Transport(_) => format!(
                "Could not reach the service to {}. Please check your connection and try again.",
                capability.action()
            ),
            GenerationFailure::MalformedResponse(_) => {
                format!("Failed to {}. Please try again.", capability.action())
            }
        }
    }
}

impl From<reqwest::Error> for GenerationFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationFailure::MalformedResponse(format!("Undecodable body: {}", err))
        } else {
            GenerationFailure::Transport(err.to_string())
        }
    }
}
