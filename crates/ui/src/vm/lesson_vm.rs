use lesson_core::model::{
    Block, ChoiceBlock, ChoiceKey, ChoiceStatus, ImageLayout, ImageRef, JournalBlock,
    LessonScript, ProgressState, SaveKey, Section, SectionId, Widget,
};
use lesson_core::reveal::RevealEngine;
use services::LessonAction;

/// Everything the lesson page renders, derived from script and progress alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonVm {
    pub title: String,
    pub sections: Vec<SectionVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionVm {
    pub id: SectionId,
    pub dom_id: String,
    pub title: String,
    /// Hue of the card's background tint, rotating with reveal position.
    pub tint_hue: u16,
    pub blocks: Vec<BlockVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockVm {
    Text {
        text: String,
    },
    TextImage {
        text: String,
        image: ImageVm,
        image_first: bool,
    },
    ImageCenter {
        image: ImageVm,
    },
    Dropdown {
        title: String,
        text: String,
    },
    RevealButton {
        label: String,
        target: SectionId,
    },
    Choice(ChoiceVm),
    Journal(JournalVm),
    FeedbackLoop(FeedbackLoopVm),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageVm {
    pub filename: String,
    pub placeholder: String,
    pub position_note: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceVm {
    pub title: String,
    pub key: ChoiceKey,
    pub options: Vec<ChoiceOptionVm>,
    /// Feedback of the selection awaiting "Continue".
    pub pending_feedback: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceOptionVm {
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptVm {
    pub title: String,
    pub prompt: String,
    pub key: SaveKey,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalVm {
    pub main: PromptVm,
    pub challenge: Option<PromptVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackLoopVm {
    pub title: String,
    pub instructions: String,
    pub nodes: Vec<String>,
}

/// What the learner did on the lesson page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LessonIntent {
    Reveal(SectionId),
    Choose { key: ChoiceKey, label: String },
    Continue(ChoiceKey),
    EditJournal { key: SaveKey, text: String },
    StartOver,
}

impl LessonIntent {
    #[must_use]
    pub fn into_action(self) -> LessonAction {
        match self {
            LessonIntent::Reveal(target) => LessonAction::Advance { target },
            LessonIntent::Choose { key, label } => LessonAction::SelectChoice { key, label },
            LessonIntent::Continue(key) => LessonAction::ConfirmChoice { key },
            LessonIntent::EditJournal { key, text } => LessonAction::RecordJournal { key, text },
            LessonIntent::StartOver => LessonAction::Reset,
        }
    }
}

/// Moves the node at `from` to position `to`, shifting the nodes in between.
/// Out-of-range positions leave `order` as it is.
pub fn move_node(order: &mut Vec<usize>, from: usize, to: usize) {
    if from >= order.len() || to >= order.len() || from == to {
        return;
    }
    let node = order.remove(from);
    order.insert(to, node);
}

#[must_use]
pub fn section_dom_id(id: &SectionId) -> String {
    format!("section-{id}")
}

#[must_use]
pub fn tint_hue(position: usize) -> u16 {
    // Bounded by the modulo, so the narrowing is lossless.
    u16::try_from(position.wrapping_mul(35) % 360).unwrap_or(0)
}

/// Projects the visible lesson. Rendering the result twice gives the same page.
#[must_use]
pub fn project_lesson(script: &LessonScript, state: &ProgressState) -> LessonVm {
    let sections = RevealEngine::new(script)
        .visible_sections(state)
        .into_iter()
        .enumerate()
        .map(|(position, section)| map_section(section, position, state))
        .collect();

    LessonVm {
        title: script.title().to_owned(),
        sections,
    }
}

fn map_section(section: &Section, position: usize, state: &ProgressState) -> SectionVm {
    SectionVm {
        id: section.id.clone(),
        dom_id: section_dom_id(&section.id),
        title: section.title.clone(),
        tint_hue: tint_hue(position),
        blocks: section
            .blocks
            .iter()
            .map(|block| map_block(block, state))
            .collect(),
    }
}

fn map_block(block: &Block, state: &ProgressState) -> BlockVm {
    match block {
        Block::Text { text } => BlockVm::Text { text: text.clone() },
        Block::TextImage {
            layout,
            text,
            image,
        } => BlockVm::TextImage {
            text: text.clone(),
            image: map_image(image),
            image_first: *layout == ImageLayout::ImageLeft,
        },
        Block::ImageCenter { image } => BlockVm::ImageCenter {
            image: map_image(image),
        },
        Block::Dropdown { title, text } => BlockVm::Dropdown {
            title: title.clone(),
            text: text.clone(),
        },
        Block::ButtonReveal { label, reveal } => BlockVm::RevealButton {
            label: label.clone(),
            target: reveal.clone(),
        },
        Block::Choice(choice) => BlockVm::Choice(map_choice(choice, state)),
        Block::Journal(journal) => BlockVm::Journal(map_journal(journal, state)),
        Block::Widget {
            widget: Widget::FeedbackLoop(model),
        } => BlockVm::FeedbackLoop(FeedbackLoopVm {
            title: model.title.clone(),
            instructions: model.instructions.clone(),
            nodes: model.nodes.clone(),
        }),
    }
}

fn map_image(image: &ImageRef) -> ImageVm {
    ImageVm {
        filename: image.filename.clone(),
        placeholder: format!(
            "Image Placeholder\n{0}\n(Upload to ./images/{0})",
            image.filename
        ),
        position_note: image.position_note.clone(),
    }
}

fn map_choice(choice: &ChoiceBlock, state: &ProgressState) -> ChoiceVm {
    let status = state.choice_status(choice.choice_key.as_str());
    let selected = match &status {
        ChoiceStatus::Unselected => None,
        ChoiceStatus::Pending(label) | ChoiceStatus::Confirmed(label) => Some(label.as_str()),
    };
    let pending_feedback = state
        .pending_for(choice.choice_key.as_str())
        .map(|pending| pending.feedback_text.clone());

    ChoiceVm {
        title: choice.title.clone(),
        key: choice.choice_key.clone(),
        options: choice
            .options
            .iter()
            .map(|opt| ChoiceOptionVm {
                label: opt.label.clone(),
                selected: selected == Some(opt.label.as_str()),
            })
            .collect(),
        pending_feedback,
    }
}

fn map_journal(journal: &JournalBlock, state: &ProgressState) -> JournalVm {
    let prompt = |title: &str, prompt: &str, key: &SaveKey| PromptVm {
        title: title.to_owned(),
        prompt: prompt.to_owned(),
        key: key.clone(),
        text: state.journal(key.as_str()).unwrap_or_default().to_owned(),
    };

    JournalVm {
        main: prompt(&journal.title, &journal.prompt, &journal.save_key),
        challenge: journal
            .mission_challenge
            .as_ref()
            .map(|mission| prompt(&mission.title, &mission.prompt, &mission.save_key)),
    }
}
