// workflow/editor.rs - Reconciling local list edits with wholesale regeneration
//
// Two operations are kept apart on purpose: `replace_all` for a fresh
// generation result and `edit_field` for a single typed change. Field edits
// are applied immediately, never buffered.

use serde::Serialize;

use super::error::StudioError;
use super::store::{ArtifactStore, SceneBoard};
use crate::types::{Character, CharacterField, Scene, SceneField};

/// Exclusive edit mode over one list: at most one index open at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCursor {
    editing: Option<usize>,
}

impl EditCursor {
    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    pub fn is_editing(&self, index: usize) -> bool {
        self.editing == Some(index)
    }

    /// Opens `index`, silently closing whatever was open.
    /// Returns the index that was closed, if different.
    pub fn begin(&mut self, index: usize) -> Option<usize> {
        let previous = self.editing.replace(index);
        previous.filter(|&p| p != index)
    }

    pub fn exit(&mut self) {
        self.editing = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    pub scene_count: usize,
    pub epoch: u64,
    /// True when field edits made since the previous replace were overwritten.
    pub discarded_local_edits: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SceneEditor {
    cursor: EditCursor,
    edited_since_replace: bool,
}

impl SceneEditor {
    pub fn cursor(&self) -> EditCursor {
        self.cursor
    }

    pub fn has_local_edits(&self) -> bool {
        self.edited_since_replace
    }

    pub fn begin_edit(&mut self, board: &SceneBoard, index: usize) -> Result<(), StudioError> {
        if board.get(index).is_none() {
            return Err(StudioError::SceneNotFound {
                index,
                len: board.len(),
            });
        }
        if let Some(closed) = self.cursor.begin(index) {
            tracing::debug!("Scene {} edit closed by opening scene {}", closed, index);
        }
        Ok(())
    }

    pub fn exit_edit(&mut self) {
        self.cursor.exit();
    }

    /// Regeneration wins: the whole list is swapped, pending edits are lost
    /// and edit mode is closed.
    pub fn replace_all(&mut self, board: &mut SceneBoard, scenes: Vec<Scene>) -> ReplaceOutcome {
        let discarded_local_edits = self.edited_since_replace;
        if discarded_local_edits {
            tracing::warn!(
                "Scene regeneration replaced {} scenes that had local edits",
                board.len()
            );
        }
        let scene_count = scenes.len();
        let epoch = board.replace(scenes);
        self.cursor.exit();
        self.edited_since_replace = false;
        ReplaceOutcome {
            scene_count,
            epoch,
            discarded_local_edits,
        }
    }

    /// Writes one field of one scene; every other scene and field is untouched.
    pub fn edit_field(
        &mut self,
        board: &mut SceneBoard,
        index: usize,
        field: SceneField,
        value: String,
    ) -> Result<(), StudioError> {
        let len = board.len();
        let scene = board
            .get_mut(index)
            .ok_or(StudioError::SceneNotFound { index, len })?;
        if !self.cursor.is_editing(index) {
            return Err(StudioError::NotEditing { list: "Scene", index });
        }
        scene.set_field(field, value);
        self.edited_since_replace = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CharacterEditor {
    cursor: EditCursor,
}

impl CharacterEditor {
    pub fn cursor(&self) -> EditCursor {
        self.cursor
    }

    fn characters_len(store: &ArtifactStore) -> usize {
        store.analysis().map(|a| a.characters.len()).unwrap_or(0)
    }

    pub fn begin_edit(&mut self, store: &ArtifactStore, index: usize) -> Result<(), StudioError> {
        let len = Self::characters_len(store);
        if index >= len {
            return Err(StudioError::CharacterNotFound { index, len });
        }
        self.cursor.begin(index);
        Ok(())
    }

    pub fn exit_edit(&mut self) {
        self.cursor.exit();
    }

    /// A new analysis invalidates every character position.
    pub fn on_new_analysis(&mut self) {
        self.cursor.exit();
    }

    /// Appends a character; the trimmed name must not be empty.
    /// Returns the index of the new character.
    pub fn add(&mut self, store: &mut ArtifactStore, name: &str, description: &str) -> Result<usize, StudioError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StudioError::InvalidInput("Character name cannot be empty".to_string()));
        }
        let analysis = store
            .analysis_mut()
            .ok_or_else(|| StudioError::InvalidInput("Analyze the script before adding characters".to_string()))?;
        analysis
            .characters
            .push(Character::new(name, description.trim()));
        Ok(analysis.characters.len() - 1)
    }

    /// Applied as typed; a name may be empty while it is being retyped.
    pub fn edit_field(
        &mut self,
        store: &mut ArtifactStore,
        index: usize,
        field: CharacterField,
        value: String,
    ) -> Result<(), StudioError> {
        let len = Self::characters_len(store);
        let character = store
            .analysis_mut()
            .and_then(|a| a.characters.get_mut(index))
            .ok_or(StudioError::CharacterNotFound { index, len })?;
        if !self.cursor.is_editing(index) {
            return Err(StudioError::NotEditing { list: "Character", index });
        }
        match field {
            CharacterField::Name => character.name = value,
            CharacterField::Description => character.description = value,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScriptAnalysis, StorySetting};

    fn scene(description: &str) -> Scene {
        let mut s = Scene::default();
        s.description = description.to_string();
        s.mood = "calm".to_string();
        s
    }

    fn board_with(n: usize) -> SceneBoard {
        let mut board = SceneBoard::default();
        board.replace((0..n).map(|i| scene(&format!("scene {}", i))).collect());
        board
    }

    #[test]
    fn cursor_is_exclusive() {
        let mut cursor = EditCursor::default();
        assert_eq!(cursor.begin(1), None);
        assert_eq!(cursor.begin(4), Some(1));
        assert!(!cursor.is_editing(1));
        assert!(cursor.is_editing(4));
        assert_eq!(cursor.begin(4), None);
    }

    #[test]
    fn edit_touches_only_the_target_field_of_the_target_scene() {
        let mut board = board_with(4);
        let before = board.scenes().to_vec();
        let mut editor = SceneEditor::default();

        editor.begin_edit(&board, 2).unwrap();
        editor
            .edit_field(&mut board, 2, SceneField::Mood, "ominous".to_string())
            .unwrap();

        for i in [0, 1, 3] {
            assert_eq!(board.scenes()[i], before[i]);
        }
        let edited = &board.scenes()[2];
        assert_eq!(edited.mood, "ominous");
        for field in SceneField::ALL.iter().filter(|f| **f != SceneField::Mood) {
            assert_eq!(edited.field(*field), before[2].field(*field));
        }
    }

    #[test]
    fn opening_another_scene_closes_the_first_without_losing_edits() {
        let mut board = board_with(3);
        let mut editor = SceneEditor::default();

        editor.begin_edit(&board, 0).unwrap();
        editor
            .edit_field(&mut board, 0, SceneField::Timeline, "dawn".to_string())
            .unwrap();
        editor.begin_edit(&board, 1).unwrap();

        assert_eq!(board.scenes()[0].timeline, "dawn");
        assert_eq!(
            editor.edit_field(&mut board, 0, SceneField::Timeline, "dusk".to_string()),
            Err(StudioError::NotEditing { list: "Scene", index: 0 })
        );
    }

    #[test]
    fn regeneration_replaces_everything_and_reports_lost_edits() {
        let mut board = board_with(5);
        let mut editor = SceneEditor::default();
        editor.begin_edit(&board, 4).unwrap();
        editor
            .edit_field(&mut board, 4, SceneField::Description, "my rewrite".to_string())
            .unwrap();

        let fresh = vec![scene("a"), scene("b"), scene("c")];
        let outcome = editor.replace_all(&mut board, fresh.clone());

        assert_eq!(board.scenes(), fresh.as_slice());
        assert!(outcome.discarded_local_edits);
        assert_eq!(outcome.scene_count, 3);
        assert_eq!(editor.cursor().editing(), None);
        assert!(board.scenes().iter().all(|s| s.description != "my rewrite"));

        let again = editor.replace_all(&mut board, vec![scene("d")]);
        assert!(!again.discarded_local_edits);
    }

    #[test]
    fn out_of_range_scene_is_reported() {
        let board = board_with(2);
        let mut editor = SceneEditor::default();
        assert_eq!(
            editor.begin_edit(&board, 7),
            Err(StudioError::SceneNotFound { index: 7, len: 2 })
        );
    }

    fn store_with_cast() -> ArtifactStore {
        let mut store = ArtifactStore::default();
        store.set_analysis(ScriptAnalysis {
            title: "Empty Your Cup".to_string(),
            characters: vec![Character::new("Master", "Zen teacher"), Character::new("Student", "Scholar")],
            setting: StorySetting::default(),
            plot: vec![],
            moral: String::new(),
        });
        store
    }

    #[test]
    fn character_add_requires_a_name() {
        let mut store = store_with_cast();
        let mut editor = CharacterEditor::default();
        assert!(matches!(
            editor.add(&mut store, "   ", "nobody"),
            Err(StudioError::InvalidInput(_))
        ));
        assert_eq!(editor.add(&mut store, " Monk ", "silent"), Ok(2));
        assert_eq!(store.analysis().unwrap().characters[2].name, "Monk");
    }

    #[test]
    fn character_add_without_analysis_is_rejected() {
        let mut store = ArtifactStore::default();
        let mut editor = CharacterEditor::default();
        assert!(matches!(
            editor.add(&mut store, "Monk", ""),
            Err(StudioError::InvalidInput(_))
        ));
    }

    #[test]
    fn character_edit_requires_edit_mode() {
        let mut store = store_with_cast();
        let mut editor = CharacterEditor::default();
        assert!(matches!(
            editor.edit_field(&mut store, 1, CharacterField::Name, "Pupil".into()),
            Err(StudioError::NotEditing { .. })
        ));

        editor.begin_edit(&store, 1).unwrap();
        editor
            .edit_field(&mut store, 1, CharacterField::Name, String::new())
            .unwrap();
        let cast = &store.analysis().unwrap().characters;
        assert_eq!(cast[1].name, "");
        assert_eq!(cast[1].description, "Scholar");
        assert_eq!(cast[0], Character::new("Master", "Zen teacher"));

        assert_eq!(
            editor.begin_edit(&store, 5),
            Err(StudioError::CharacterNotFound { index: 5, len: 2 })
        );
    }
}
