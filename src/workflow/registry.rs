// workflow/registry.rs - Live sessions, in memory only
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::studio::{SessionInfo, Studio};
use crate::generation::GenerationBackend;

/// Sessions die with the process; nothing here is persisted.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Studio>>>>,
    backend: Arc<dyn GenerationBackend>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend,
        }
    }

    pub async fn create(&self) -> Arc<Studio> {
        let studio = Arc::new(Studio::new(self.backend.clone()));
        let mut sessions = self.sessions.write().await;
        sessions.insert(studio.id(), studio.clone());
        tracing::info!("🎬 Created session: {}", studio.id());
        studio
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Studio>> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).cloned()
    }

    /// Newest first.
    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos: Vec<SessionInfo> = sessions.values().map(|s| s.info()).collect();
        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        infos
    }

    /// Calls still in flight for a removed session complete against the
    /// detached `Studio` and are then dropped with it.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&id).is_some();
        if removed {
            tracing::info!("🗑️ Removed session: {}", id);
        }
        removed
    }

    /// Drops sessions untouched for longer than `max_idle`. Returns how many
    /// were removed.
    pub async fn cleanup_idle_sessions(&self, max_idle: chrono::Duration) -> usize {
        self.remove_idle_since(Utc::now() - max_idle).await
    }

    /// Sessions with a generation call still outstanding are kept regardless
    /// of age.
    async fn remove_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;

        let to_remove: Vec<Uuid> = sessions
            .values()
            .map(|studio| studio.info())
            .filter(|info| info.updated_at < cutoff && info.calls_in_flight == 0)
            .map(|info| info.id)
            .collect();

        for id in &to_remove {
            sessions.remove(id);
            tracing::debug!("🗑️ Cleaned up idle session: {}", id);
        }
        to_remove.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub type SharedSessionRegistry = Arc<SessionRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::studio::tests::FakeBackend;

    #[tokio::test]
    async fn create_get_remove() {
        let registry = SessionRegistry::new(Arc::new(FakeBackend::new()));
        let a = registry.create().await;
        let b = registry.create().await;
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len().await, 2);

        assert!(registry.get(a.id()).await.is_some());
        assert_eq!(registry.list().await.len(), 2);

        assert!(registry.remove(a.id()).await);
        assert!(!registry.remove(a.id()).await);
        assert!(registry.get(a.id()).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let registry = SessionRegistry::new(Arc::new(FakeBackend::new()));
        let a = registry.create().await;
        let b = registry.create().await;

        a.analyze_script("A cup overflows.".to_string()).await.unwrap();
        assert!(a.snapshot().analysis.is_some());
        assert!(b.snapshot().analysis.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_are_cleaned_up() {
        let registry = SessionRegistry::new(Arc::new(FakeBackend::new()));
        let stale = registry.create().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let cutoff = Utc::now();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let fresh = registry.create().await;

        assert_eq!(registry.remove_idle_since(cutoff).await, 1);
        assert!(registry.get(stale.id()).await.is_none());
        assert!(registry.get(fresh.id()).await.is_some());

        // A generous idle window keeps everything
        assert_eq!(registry.cleanup_idle_sessions(chrono::Duration::hours(1)).await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn activity_keeps_a_session_alive() {
        let registry = SessionRegistry::new(Arc::new(FakeBackend::new()));
        let studio = registry.create().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let cutoff = Utc::now();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        studio.set_script_text("A cup overflows.".to_string());

        assert_eq!(registry.remove_idle_since(cutoff).await, 0);
        assert!(registry.get(studio.id()).await.is_some());
    }
}
