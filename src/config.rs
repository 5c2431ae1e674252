// config.rs - Runtime configuration read from the environment
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Endpoints of the four generation capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationEndpoints {
    pub analyze_script: String,
    pub generate_scenes: String,
    pub generate_scene_image: String,
    pub synthesize_audio: String,
}

impl GenerationEndpoints {
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            analyze_script: format!("{}/analyze-script", base),
            generate_scenes: format!("{}/generate-scenes", base),
            generate_scene_image: format!("{}/generate-scene-image", base),
            synthesize_audio: format!("{}/synthesize-audio", base),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub bind_addr: SocketAddr,
    pub endpoints: GenerationEndpoints,
    pub timeout: Duration,
    pub api_key: Option<String>,
    /// Sessions untouched for this long are dropped by the idle sweep.
    pub session_idle_ttl: Duration,
}

impl StudioConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env` but reads through `lookup`, so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_raw = read("STUDIO_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = bind_raw.trim().parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "STUDIO_BIND_ADDR",
            reason: format!("'{}' is not a socket address ({})", bind_raw, e),
        })?;

        let base = read("GENERATION_BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string());
        let defaults = GenerationEndpoints::from_base(base.trim());
        let endpoints = GenerationEndpoints {
            analyze_script: read("ANALYZE_SCRIPT_URL").unwrap_or(defaults.analyze_script),
            generate_scenes: read("GENERATE_SCENES_URL").unwrap_or(defaults.generate_scenes),
            generate_scene_image: read("GENERATE_SCENE_IMAGE_URL")
                .unwrap_or(defaults.generate_scene_image),
            synthesize_audio: read("SYNTHESIZE_AUDIO_URL").unwrap_or(defaults.synthesize_audio),
        };

        let timeout_secs = match read("GENERATION_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "GENERATION_TIMEOUT_SECS",
                reason: format!("'{}' is not a number of seconds ({})", raw, e),
            })?,
            None => 120,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "GENERATION_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let idle_ttl_secs = match read("SESSION_IDLE_TTL_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "SESSION_IDLE_TTL_SECS",
                reason: format!("'{}' is not a number of seconds ({})", raw, e),
            })?,
            None => 3600,
        };
        if idle_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_IDLE_TTL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            endpoints,
            timeout: Duration::from_secs(timeout_secs),
            api_key: read("GENERATION_API_KEY"),
            session_idle_ttl: Duration::from_secs(idle_ttl_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = StudioConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.endpoints.analyze_script, "http://localhost:8080/analyze-script");
        assert_eq!(config.endpoints.synthesize_audio, "http://localhost:8080/synthesize-audio");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.api_key.is_none());
        assert_eq!(config.session_idle_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn base_url_and_overrides() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("GENERATION_BASE_URL", "https://gen.example.com/"),
            ("GENERATE_SCENE_IMAGE_URL", "https://images.example.com/v2/render"),
            ("GENERATION_API_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.endpoints.generate_scenes, "https://gen.example.com/generate-scenes");
        assert_eq!(config.endpoints.generate_scene_image, "https://images.example.com/v2/render");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn bad_values_are_reported() {
        let err = StudioConfig::from_lookup(lookup(&[("STUDIO_BIND_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STUDIO_BIND_ADDR", .. }));

        let err = StudioConfig::from_lookup(lookup(&[("GENERATION_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "GENERATION_TIMEOUT_SECS", .. }));

        let err = StudioConfig::from_lookup(lookup(&[("GENERATION_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "GENERATION_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn session_idle_ttl_is_configurable() {
        let config = StudioConfig::from_lookup(lookup(&[("SESSION_IDLE_TTL_SECS", "900")])).unwrap();
        assert_eq!(config.session_idle_ttl, Duration::from_secs(900));

        let err = StudioConfig::from_lookup(lookup(&[("SESSION_IDLE_TTL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SESSION_IDLE_TTL_SECS", .. }));
    }
}
