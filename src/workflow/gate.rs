// workflow/gate.rs - At most one outstanding generation call per artifact key
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum GateKey {
    Analysis,
    Scenes,
    /// Keyed by position in the current scene list.
    SceneImage(usize),
    Audio,
}

impl fmt::Display for GateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateKey::Analysis => f.write_str("Script analysis"),
            GateKey::Scenes => f.write_str("Scene generation"),
            GateKey::SceneImage(index) => write!(f, "Image generation for scene {}", index + 1),
            GateKey::Audio => f.write_str("Audio generation"),
        }
    }
}

/// Rejects, never queues: a second `begin` for a busy key returns false and
/// the caller must not issue the call.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    in_flight: BTreeSet<GateKey>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, key: GateKey) -> bool {
        self.in_flight.insert(key)
    }

    /// Clears the key whatever the outcome was.
    pub fn end(&mut self, key: GateKey) {
        self.in_flight.remove(&key);
    }

    pub fn is_in_flight(&self, key: GateKey) -> bool {
        self.in_flight.contains(&key)
    }

    pub fn in_flight(&self) -> Vec<GateKey> {
        self.in_flight.iter().copied().collect()
    }
}
