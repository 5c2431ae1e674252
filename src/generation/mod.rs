// generation/mod.rs - Contract with the remote generation services
//
// Every call is a single attempt. Retrying is the user's decision and goes
// back through the studio's gate and quota checks.

pub mod failure;
pub mod http_client;
pub mod sanitize;
pub mod wire;

use async_trait::async_trait;

use crate::types::{GeneratedAudio, Scene, ScriptAnalysis};

pub use failure::{Capability, GenerationFailure};
pub use http_client::HttpGenerationClient;
pub use sanitize::{sanitize_for_speech, SPEECH_TEXT_LIMIT};
pub use wire::{AnalysisPayload, AnalysisRequest, SceneImageRequest, SceneRecord, ScenesRequest, SynthesisRequest};

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn analyze_script(&self, request: &AnalysisRequest) -> Result<ScriptAnalysis, GenerationFailure>;

    async fn generate_scenes(&self, request: &ScenesRequest) -> Result<Vec<Scene>, GenerationFailure>;

    /// Returns the URL of the new image.
    async fn generate_scene_image(&self, request: &SceneImageRequest) -> Result<String, GenerationFailure>;

    async fn synthesize_audio(&self, request: &SynthesisRequest) -> Result<GeneratedAudio, GenerationFailure>;
}
