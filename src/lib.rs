// lib.rs - Main library file that exports all modules
use std::sync::Arc;

pub mod captions;
pub mod config;
pub mod generation;
pub mod handlers;
pub mod middleware;
pub mod types;
pub mod voices;
pub mod workflow;

// Re-export commonly used types for convenience
pub use config::{ConfigError, StudioConfig};
pub use generation::{GenerationBackend, GenerationFailure, HttpGenerationClient};
pub use types::*;
pub use workflow::{SessionRegistry, Stage, Studio, StudioError};

// AppState holds the session registry and the configuration it was built from
pub struct AppState {
    pub registry: workflow::SharedSessionRegistry,
    pub config: StudioConfig,
}

impl AppState {
    pub fn new(config: StudioConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(backend)),
            config,
        }
    }
}
