// generation/http_client.rs - reqwest implementation of GenerationBackend
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::failure::{Capability, GenerationFailure};
use super::wire::{self, AnalysisRequest, SceneImageRequest, ScenesRequest, SynthesisRequest};
use super::GenerationBackend;
use crate::config::{GenerationEndpoints, StudioConfig};
use crate::types::{GeneratedAudio, Scene, ScriptAnalysis};

#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: Client,
    endpoints: GenerationEndpoints,
    api_key: Option<String>,
}

impl HttpGenerationClient {
    pub fn new(endpoints: GenerationEndpoints, timeout: Duration, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoints,
            api_key,
        })
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.endpoints.clone(), config.timeout, config.api_key.clone())
    }

    fn endpoint(&self, capability: Capability) -> &str {
        match capability {
            Capability::AnalyzeScript => &self.endpoints.analyze_script,
            Capability::GenerateScenes => &self.endpoints.generate_scenes,
            Capability::GenerateSceneImage => &self.endpoints.generate_scene_image,
            Capability::SynthesizeAudio => &self.endpoints.synthesize_audio,
        }
    }

    /// One POST, one answer. Returns the status and raw body for the parsers.
    async fn post<T: Serialize + ?Sized>(
        &self,
        capability: Capability,
        body: &T,
    ) -> Result<(u16, String), GenerationFailure> {
        let url = self.endpoint(capability);
        let mut request = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                tracing::warn!("{} unreachable at {}: {}", capability, url, e);
            } else {
                tracing::error!("{} request error: {}", capability, e);
            }
            GenerationFailure::from(e)
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(GenerationFailure::from)?;

        tracing::debug!("{} response (status {}): {} bytes", capability, status, text.len());
        Ok((status, text))
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    async fn analyze_script(&self, request: &AnalysisRequest) -> Result<ScriptAnalysis, GenerationFailure> {
        tracing::debug!("analyzeScript: {} chars of story", request.story.chars().count());
        let (status, body) = self.post(Capability::AnalyzeScript, request).await?;
        wire::parse_analysis(status, &body)
    }

    async fn generate_scenes(&self, request: &ScenesRequest) -> Result<Vec<Scene>, GenerationFailure> {
        tracing::debug!(
            "generateScenes: {} characters, {} plot points",
            request.analysis.characters.len(),
            request.analysis.plot.len()
        );
        let (status, body) = self.post(Capability::GenerateScenes, request).await?;
        wire::parse_scenes(status, &body)
    }

    async fn generate_scene_image(&self, request: &SceneImageRequest) -> Result<String, GenerationFailure> {
        tracing::debug!(
            "generateSceneImage: {}x{}",
            request.image_settings.width,
            request.image_settings.height
        );
        let (status, body) = self.post(Capability::GenerateSceneImage, request).await?;
        wire::parse_scene_image(status, &body)
    }

    async fn synthesize_audio(&self, request: &SynthesisRequest) -> Result<GeneratedAudio, GenerationFailure> {
        tracing::debug!(
            "synthesizeAudio: engine={} voice={} {} chars",
            request.engine.as_str(),
            request.voice_settings.voice_id,
            request.text.len()
        );
        let (status, body) = self.post(Capability::SynthesizeAudio, request).await?;
        wire::parse_audio(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_service_is_a_transport_failure() {
        // Port 9 on loopback: nothing listens there, so the connection is refused.
        let client = HttpGenerationClient::new(
            GenerationEndpoints::from_base("http://127.0.0.1:9"),
            Duration::from_secs(5),
            None,
        )
        .unwrap();
        let result = client
            .analyze_script(&AnalysisRequest {
                story: "A cup overflows".to_string(),
            })
            .await;
        assert!(matches!(result, Err(GenerationFailure::Transport(_))));
    }

    #[test]
    fn endpoints_follow_capability() {
        let client = HttpGenerationClient::new(
            GenerationEndpoints::from_base("http://gen.local"),
            Duration::from_secs(1),
            Some("key".to_string()),
        )
        .unwrap();
        assert_eq!(client.endpoint(Capability::GenerateScenes), "http://gen.local/generate-scenes");
        assert_eq!(client.endpoint(Capability::SynthesizeAudio), "http://gen.local/synthesize-audio");
    }
}
