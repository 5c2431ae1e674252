// Workflow orchestration - stages, artifacts and the rules around generation calls
pub mod audio_session;
pub mod editor;
pub mod error;
pub mod gate;
pub mod quota;
pub mod registry;
pub mod stage;
pub mod store;
pub mod studio;

pub use audio_session::{AudioError, AudioSession, AudioState, HeadlessPlayback, PlaybackDevice};
pub use editor::{CharacterEditor, EditCursor, ReplaceOutcome, SceneEditor};
pub use error::{ErrorKind, StudioError};
pub use gate::{GateKey, RequestGate};
pub use quota::{GenerationQuota, SceneSlot};
pub use registry::{SessionRegistry, SharedSessionRegistry};
pub use stage::{Requirement, Stage, StageBlocked, StageController, StepStatus, StepView};
pub use store::{ArtifactStore, SceneBoard, StageError};
pub use studio::{ProjectSummary, SceneImageOutcome, SessionInfo, SessionSnapshot, Studio};
