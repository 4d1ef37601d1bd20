mod lesson_vm;
mod status_vm;

pub use lesson_vm::{
    BlockVm, ChoiceOptionVm, ChoiceVm, FeedbackLoopVm, ImageVm, JournalVm, LessonIntent, LessonVm,
    PromptVm, SectionVm, move_node, project_lesson, section_dom_id, tint_hue,
};
pub use status_vm::{StatusPillVm, map_save_status};
