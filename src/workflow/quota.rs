// workflow/quota.rs - Per-artifact cap on successful generations
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use crate::types::Scene;

/// Identity of a scene for quota purposes: its position within one
/// generation of the scene list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SceneSlot {
    pub epoch: u64,
    pub index: usize,
}

/// Tracks reservations that are still in flight. The committed count lives on
/// the artifact itself and is passed in, so the two can never disagree.
#[derive(Debug, Clone)]
pub struct GenerationQuota<K> {
    limit: usize,
    pending: HashMap<K, usize>,
}

impl<K: Hash + Eq + Clone> GenerationQuota<K> {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            pending: HashMap::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn pending(&self, key: &K) -> usize {
        self.pending.get(key).copied().unwrap_or(0)
    }

    /// Admits one more generation if `generated + pending < limit`.
    /// A refusal has no side effect.
    pub fn try_reserve(&mut self, key: K, generated: usize) -> bool {
        let pending = self.pending(&key);
        if generated + pending >= self.limit {
            return false;
        }
        self.pending.insert(key, pending + 1);
        true
    }

    /// Drops one reservation without counting it (the call failed).
    pub fn release(&mut self, key: &K) {
        if let Some(count) = self.pending.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.pending.remove(key);
            }
        }
    }

    /// Turns one reservation into a stored image on `scene`.
    /// Returns the scene's new image count.
    pub fn commit(&mut self, key: &K, scene: &mut Scene, url: String) -> Option<usize> {
        self.release(key);
        scene.push_image(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_IMAGES_PER_SCENE;

    #[test]
    fn admits_only_up_to_remaining_capacity() {
        let mut quota = GenerationQuota::new(MAX_IMAGES_PER_SCENE);
        let slot = SceneSlot { epoch: 1, index: 0 };

        // one image already stored: two more may be reserved
        let admitted = (0..6).filter(|_| quota.try_reserve(slot, 1)).count();
        assert_eq!(admitted, 2);
        assert_eq!(quota.pending(&slot), 2);
    }

    #[test]
    fn release_frees_capacity_commit_consumes_it() {
        let mut quota = GenerationQuota::new(MAX_IMAGES_PER_SCENE);
        let slot = SceneSlot { epoch: 1, index: 3 };
        let mut scene = Scene::default();

        assert!(quota.try_reserve(slot, scene.generated_image_count()));
        quota.release(&slot);
        assert_eq!(quota.pending(&slot), 0);
        assert_eq!(scene.generated_image_count(), 0);

        for i in 0..MAX_IMAGES_PER_SCENE {
            assert!(quota.try_reserve(slot, scene.generated_image_count()));
            assert_eq!(quota.commit(&slot, &mut scene, format!("https://img/{}", i)), Some(i + 1));
        }
        assert!(!quota.try_reserve(slot, scene.generated_image_count()));
        assert_eq!(scene.image_urls().len(), MAX_IMAGES_PER_SCENE);
    }

    #[test]
    fn keys_are_independent() {
        let mut quota = GenerationQuota::new(1);
        assert!(quota.try_reserve(SceneSlot { epoch: 1, index: 0 }, 0));
        assert!(quota.try_reserve(SceneSlot { epoch: 1, index: 1 }, 0));
        assert!(quota.try_reserve(SceneSlot { epoch: 2, index: 0 }, 0));
        assert!(!quota.try_reserve(SceneSlot { epoch: 1, index: 0 }, 0));
    }
}
