use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// Session id carried in `/api/sessions/:id/...` URIs, if any.
pub fn session_id_from_path(path: &str) -> Option<Uuid> {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some("api"), Some("sessions"), Some(id)) => Uuid::parse_str(id).ok(),
        _ => None,
    }
}

/// Request logging middleware that adds structured logging for all HTTP requests
pub async fn request_logging_middleware(req: Request, next: Next) -> Result<Response, StatusCode> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());
    let session = session_id_from_path(uri.path())
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_owned());

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %matched_path,
        session = %session,
        "incoming request"
    );

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    // Generation round trips dominate latency; 5xx here are mostly upstream 502s.
    match status.as_u16() {
        200..=399 => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                session = %session,
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "request completed"
            );
        }
        400..=499 => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                session = %session,
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "request completed (client error)"
            );
        }
        _ => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                session = %session,
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "request completed (server error)"
            );
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_session_from_nested_paths() {
        let id = Uuid::new_v4();
        let path = format!("/api/sessions/{}/scenes/2/images", id);
        assert_eq!(session_id_from_path(&path), Some(id));
        assert_eq!(session_id_from_path("/api/sessions"), None);
        assert_eq!(session_id_from_path("/api/voices"), None);
        assert_eq!(session_id_from_path("/api/sessions/not-a-uuid"), None);
    }
}
