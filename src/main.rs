use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use story_studio::{handlers, middleware, AppState, HttpGenerationClient, StudioConfig};

const IDLE_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match StudioConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let client = match HttpGenerationClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("❌ Failed to build generation client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Generation endpoints:");
    tracing::info!("  analyzeScript      -> {}", config.endpoints.analyze_script);
    tracing::info!("  generateScenes     -> {}", config.endpoints.generate_scenes);
    tracing::info!("  generateSceneImage -> {}", config.endpoints.generate_scene_image);
    tracing::info!("  synthesizeAudio    -> {}", config.endpoints.synthesize_audio);
    tracing::info!(
        "Timeout {}s, API key {}",
        config.timeout.as_secs(),
        if config.api_key.is_some() { "✅" } else { "❌" }
    );

    let bind_addr = config.bind_addr;
    let idle_ttl = config.session_idle_ttl;
    let shared_state = Arc::new(AppState::new(config, Arc::new(client)));
    tracing::info!("🎬 Session registry initialized (idle TTL {}s)", idle_ttl.as_secs());

    spawn_idle_sweep(shared_state.clone(), idle_ttl);

    let app = Router::new()
        .merge(handlers::sessions::session_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("❌ Cannot bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {}", bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}

/// Periodically drops sessions nobody has touched within `idle_ttl`.
fn spawn_idle_sweep(state: Arc<AppState>, idle_ttl: std::time::Duration) {
    let max_idle = match chrono::Duration::from_std(idle_ttl) {
        Ok(max_idle) => max_idle,
        Err(e) => {
            tracing::warn!("Idle session sweep disabled: {}", e);
            return;
        }
    };
    let period = idle_ttl.min(IDLE_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = state.registry.cleanup_idle_sessions(max_idle).await;
            if removed > 0 {
                tracing::info!("🧹 Removed {} idle session(s)", removed);
            }
        }
    });
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,story_studio=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,story_studio=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("🎬 Story Studio starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.registry.len().await,
        "generation": {
            "analyze_script": state.config.endpoints.analyze_script,
            "generate_scenes": state.config.endpoints.generate_scenes,
            "generate_scene_image": state.config.endpoints.generate_scene_image,
            "synthesize_audio": state.config.endpoints.synthesize_audio,
            "timeout_secs": state.config.timeout.as_secs(),
        },
        "endpoints": {
            "status": "/api/status",
            "voices": "/api/voices",
            "sessions": "/api/sessions",
        }
    }))
}
