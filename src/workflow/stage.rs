// workflow/stage.rs - The five production stages and the controller moving between them
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::store::ArtifactStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Script,
    Scenes,
    Audio,
    Captions,
    Render,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Script,
        Stage::Scenes,
        Stage::Audio,
        Stage::Captions,
        Stage::Render,
    ];

    /// 1-based position as shown on the stage indicator.
    pub fn number(&self) -> u8 {
        match self {
            Stage::Script => 1,
            Stage::Scenes => 2,
            Stage::Audio => 3,
            Stage::Captions => 4,
            Stage::Render => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.number() == n)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Script => "Script",
            Stage::Scenes => "Scenes",
            Stage::Audio => "Audio",
            Stage::Captions => "Captions",
            Stage::Render => "Render",
        }
    }

    pub fn next(&self) -> Option<Stage> {
        Stage::from_number(self.number() + 1)
    }

    pub fn prev(&self) -> Option<Stage> {
        self.number().checked_sub(1).and_then(Stage::from_number)
    }

    /// What must exist before the user may leave this stage forward.
    pub fn exit_requirement(&self) -> Option<Requirement> {
        match self {
            Stage::Script => Some(Requirement::ScriptAnalysis),
            Stage::Scenes => Some(Requirement::Scenes),
            // Audio, Captions and Render are deliberately lenient.
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    ScriptAnalysis,
    Scenes,
}

impl Requirement {
    pub fn is_met(&self, store: &ArtifactStore) -> bool {
        match self {
            Requirement::ScriptAnalysis => store.analysis().is_some(),
            Requirement::Scenes => !store.scenes().is_empty(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::ScriptAnalysis => f.write_str("analyze the script first"),
            Requirement::Scenes => f.write_str("generate at least one scene first"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cannot move to {target}: {missing}")]
pub struct StageBlocked {
    pub target: Stage,
    pub missing: Requirement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub stage: Stage,
    pub number: u8,
    pub title: &'static str,
    pub status: StepStatus,
}

/// Owns `current_stage`. A stage is reachable when every stage before it has
/// its exit requirement met; that single rule covers `advance` and `go_to`.
#[derive(Debug, Clone)]
pub struct StageController {
    current: Stage,
}

impl Default for StageController {
    fn default() -> Self {
        Self::new()
    }
}

impl StageController {
    pub fn new() -> Self {
        Self {
            current: Stage::Script,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// First unmet requirement on the way to `target`, if any.
    pub fn blocker(target: Stage, store: &ArtifactStore) -> Option<StageBlocked> {
        Stage::ALL
            .iter()
            .take_while(|s| **s < target)
            .filter_map(|s| s.exit_requirement())
            .find(|req| !req.is_met(store))
            .map(|missing| StageBlocked { target, missing })
    }

    pub fn go_to(&mut self, target: Stage, store: &ArtifactStore) -> Result<Stage, StageBlocked> {
        if target > self.current {
            if let Some(blocked) = Self::blocker(target, store) {
                tracing::warn!("Stage move {} -> {} blocked: {}", self.current, target, blocked.missing);
                return Err(blocked);
            }
        }
        if target != self.current {
            tracing::info!("Stage {} -> {}", self.current, target);
            self.current = target;
        }
        Ok(self.current)
    }

    /// No-op at the last stage.
    pub fn advance(&mut self, store: &ArtifactStore) -> Result<Stage, StageBlocked> {
        match self.current.next() {
            Some(next) => self.go_to(next, store),
            None => Ok(self.current),
        }
    }

    /// No-op at the first stage. Artifacts of the stage being left are kept.
    pub fn retreat(&mut self) -> Stage {
        if let Some(prev) = self.current.prev() {
            tracing::info!("Stage {} -> {}", self.current, prev);
            self.current = prev;
        }
        self.current
    }

    pub fn step_status(&self, stage: Stage) -> StepStatus {
        if stage < self.current {
            StepStatus::Completed
        } else if stage == self.current {
            StepStatus::Active
        } else {
            StepStatus::Upcoming
        }
    }

    pub fn steps(&self) -> Vec<StepView> {
        Stage::ALL
            .iter()
            .map(|&stage| StepView {
                stage,
                number: stage.number(),
                title: stage.title(),
                status: self.step_status(stage),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Scene, ScriptAnalysis, StorySetting};

    fn analysis() -> ScriptAnalysis {
        ScriptAnalysis {
            title: "Empty Cup".to_string(),
            characters: vec![],
            setting: StorySetting::default(),
            plot: vec![],
            moral: String::new(),
        }
    }

    #[test]
    fn advance_from_script_needs_analysis() {
        let mut store = ArtifactStore::default();
        let mut controller = StageController::new();

        let err = controller.advance(&store).unwrap_err();
        assert_eq!(err.missing, Requirement::ScriptAnalysis);
        assert_eq!(controller.current(), Stage::Script);

        store.set_analysis(analysis());
        assert_eq!(controller.advance(&store), Ok(Stage::Scenes));
    }

    #[test]
    fn retreat_from_first_stage_is_noop() {
        let mut controller = StageController::new();
        assert_eq!(controller.retreat(), Stage::Script);
    }

    #[test]
    fn advance_stays_at_render() {
        let mut store = ArtifactStore::default();
        store.set_analysis(analysis());
        store.replace_scenes(vec![Scene::default()]);

        let mut controller = StageController::new();
        for _ in 0..10 {
            controller.advance(&store).unwrap();
        }
        assert_eq!(controller.current(), Stage::Render);
    }

    #[test]
    fn jumps_follow_the_same_rule_as_advance() {
        let mut store = ArtifactStore::default();
        store.set_analysis(analysis());
        let mut controller = StageController::new();

        // Scenes is reachable, Audio is not until scenes exist.
        assert_eq!(controller.go_to(Stage::Scenes, &store), Ok(Stage::Scenes));
        let blocked = controller.go_to(Stage::Render, &store).unwrap_err();
        assert_eq!(blocked.target, Stage::Render);
        assert_eq!(blocked.missing, Requirement::Scenes);
        assert_eq!(controller.current(), Stage::Scenes);

        store.replace_scenes(vec![Scene::default()]);
        assert_eq!(controller.go_to(Stage::Render, &store), Ok(Stage::Render));

        // Backward jumps are never blocked, even with artifacts missing.
        let empty = ArtifactStore::default();
        assert_eq!(controller.go_to(Stage::Audio, &empty), Ok(Stage::Audio));
        assert_eq!(controller.go_to(Stage::Script, &empty), Ok(Stage::Script));
    }

    #[test]
    fn step_status_relative_to_current() {
        let mut store = ArtifactStore::default();
        store.set_analysis(analysis());
        let mut controller = StageController::new();
        controller.advance(&store).unwrap();

        let steps = controller.steps();
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert_eq!(steps[1].status, StepStatus::Active);
        assert_eq!(steps[4].status, StepStatus::Upcoming);
        assert_eq!(steps[4].title, "Render");
        assert_eq!(steps[2].number, 3);
    }
}
