mod ids;
mod progress;
mod script;

pub use ids::{ChoiceKey, SaveKey, SectionId};
pub use progress::{ChoiceStatus, PendingChoice, ProgressState, STATE_VERSION, sanitize};
pub use script::{
    Block, ChoiceBlock, ChoiceOption, FeedbackLoopModel, ImageLayout, ImageRef, JournalBlock,
    JournalPrompt, LessonScript, MissionChallenge, ScriptError, Section, Widget,
};
