use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChoiceKey, SaveKey, SectionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Authoring defects detected while loading a lesson script.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScriptError {
    #[error("lesson script has no sections")]
    NoSections,

    #[error("section id cannot be empty")]
    EmptySectionId,

    #[error("duplicate section id `{0}`")]
    DuplicateSection(SectionId),

    #[error("duplicate choice key `{0}`")]
    DuplicateChoiceKey(ChoiceKey),

    #[error("duplicate save key `{0}`")]
    DuplicateSaveKey(SaveKey),

    #[error("choice `{0}` has no options")]
    EmptyChoice(ChoiceKey),

    #[error("choice `{key}` repeats option label `{label}`")]
    DuplicateOptionLabel { key: ChoiceKey, label: String },

    #[error("section `{section}` reveals unknown section `{target}`")]
    UnknownRevealTarget {
        section: SectionId,
        target: SectionId,
    },

    #[error("lesson script is not valid JSON: {0}")]
    Parse(String),
}

//
// ─── BLOCKS ────────────────────────────────────────────────────────────────────
//

/// Where the image sits relative to its text in a `text+image` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageLayout {
    #[serde(rename = "imageLeft")]
    ImageLeft,
    #[default]
    #[serde(rename = "imageRight")]
    ImageRight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(rename = "positionNote", default)]
    pub position_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Button label; also the value stored as the learner's selection.
    pub label: String,
    pub feedback: String,
    #[serde(rename = "continueReveal")]
    pub continue_reveal: SectionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceBlock {
    pub title: String,
    #[serde(rename = "choiceKey")]
    pub choice_key: ChoiceKey,
    pub options: Vec<ChoiceOption>,
}

impl ChoiceBlock {
    #[must_use]
    pub fn option(&self, label: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|opt| opt.label == label)
    }
}

/// Optional deeper-dive prompt nested under a journal prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionChallenge {
    pub title: String,
    pub prompt: String,
    #[serde(rename = "saveKey")]
    pub save_key: SaveKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalBlock {
    pub title: String,
    pub prompt: String,
    #[serde(rename = "saveKey")]
    pub save_key: SaveKey,
    #[serde(
        rename = "missionChallenge",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mission_challenge: Option<MissionChallenge>,
}

/// Node labels arranged in a cycle, e.g. fewer trees -> hotter ground -> more fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLoopModel {
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Widget {
    #[serde(rename = "feedbackLoop")]
    FeedbackLoop(FeedbackLoopModel),
}

/// One piece of content within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "text+image")]
    TextImage {
        #[serde(default)]
        layout: ImageLayout,
        text: String,
        image: ImageRef,
    },

    #[serde(rename = "imageCenter")]
    ImageCenter { image: ImageRef },

    #[serde(rename = "dropdown")]
    Dropdown { title: String, text: String },

    #[serde(rename = "buttonReveal")]
    ButtonReveal { label: String, reveal: SectionId },

    #[serde(rename = "choice")]
    Choice(ChoiceBlock),

    #[serde(rename = "journal")]
    Journal(JournalBlock),

    #[serde(rename = "widget")]
    Widget { widget: Widget },
}

impl Block {
    /// Section ids this block can reveal.
    #[must_use]
    pub fn reveal_targets(&self) -> Vec<&SectionId> {
        match self {
            Block::ButtonReveal { reveal, .. } => vec![reveal],
            Block::Choice(choice) => choice
                .options
                .iter()
                .map(|opt| &opt.continue_reveal)
                .collect(),
            Block::Text { .. }
            | Block::TextImage { .. }
            | Block::ImageCenter { .. }
            | Block::Dropdown { .. }
            | Block::Journal(_)
            | Block::Widget { .. } => Vec::new(),
        }
    }

    /// Response keys owned by this block (primary prompt first).
    #[must_use]
    pub fn save_keys(&self) -> Vec<&SaveKey> {
        match self {
            Block::Journal(journal) => {
                let mut keys = vec![&journal.save_key];
                if let Some(mission) = &journal.mission_challenge {
                    keys.push(&mission.save_key);
                }
                keys
            }
            _ => Vec::new(),
        }
    }
}

//
// ─── SECTIONS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn choices(&self) -> impl Iterator<Item = &ChoiceBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Choice(choice) => Some(choice),
            _ => None,
        })
    }

    pub fn journals(&self) -> impl Iterator<Item = &JournalBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Journal(journal) => Some(journal),
            _ => None,
        })
    }
}

//
// ─── SCRIPT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Deserialize)]
struct ScriptDraft {
    #[serde(rename = "lessonTitle")]
    title: String,
    sections: Vec<Section>,
}

/// The static, validated lesson: an ordered list of sections.
///
/// The first section is the entry section, revealed for every learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScriptDraft")]
pub struct LessonScript {
    #[serde(rename = "lessonTitle")]
    title: String,
    sections: Vec<Section>,
    #[serde(skip)]
    entry: SectionId,
}

impl TryFrom<ScriptDraft> for LessonScript {
    type Error = ScriptError;

    fn try_from(draft: ScriptDraft) -> Result<Self, Self::Error> {
        Self::new(draft.title, draft.sections)
    }
}

impl LessonScript {
    /// Builds a script and checks its referential invariants.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError` when ids are duplicated or a reveal target is unknown.
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Result<Self, ScriptError> {
        let entry = sections
            .first()
            .map(|section| section.id.clone())
            .ok_or(ScriptError::NoSections)?;
        let script = Self {
            title: title.into(),
            sections,
            entry,
        };
        script.validate()?;
        Ok(script)
    }

    /// Parses and validates a JSON lesson script.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` for malformed JSON, or a validation error.
    pub fn from_json(raw: &str) -> Result<Self, ScriptError> {
        serde_json::from_str::<ScriptDraft>(raw)
            .map_err(|err| ScriptError::Parse(err.to_string()))
            .and_then(Self::try_from)
    }

    /// Checks id uniqueness and that every reveal target names an existing section.
    ///
    /// # Errors
    ///
    /// Returns the first `ScriptError` found, in script order.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.sections.is_empty() {
            return Err(ScriptError::NoSections);
        }

        let mut section_ids = HashSet::new();
        for section in &self.sections {
            if section.id.is_blank() {
                return Err(ScriptError::EmptySectionId);
            }
            if !section_ids.insert(section.id.as_str()) {
                return Err(ScriptError::DuplicateSection(section.id.clone()));
            }
        }

        let mut choice_keys = HashSet::new();
        let mut save_keys = HashSet::new();
        for section in &self.sections {
            for block in &section.blocks {
                for target in block.reveal_targets() {
                    if !section_ids.contains(target.as_str()) {
                        return Err(ScriptError::UnknownRevealTarget {
                            section: section.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
                for key in block.save_keys() {
                    if !save_keys.insert(key.as_str()) {
                        return Err(ScriptError::DuplicateSaveKey(key.clone()));
                    }
                }
                if let Block::Choice(choice) = block {
                    if !choice_keys.insert(choice.choice_key.as_str()) {
                        return Err(ScriptError::DuplicateChoiceKey(choice.choice_key.clone()));
                    }
                    if choice.options.is_empty() {
                        return Err(ScriptError::EmptyChoice(choice.choice_key.clone()));
                    }
                    let mut labels = HashSet::new();
                    for opt in &choice.options {
                        if !labels.insert(opt.label.as_str()) {
                            return Err(ScriptError::DuplicateOptionLabel {
                                key: choice.choice_key.clone(),
                                label: opt.label.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The designated entry section, always first in `revealed`.
    #[must_use]
    pub fn entry_id(&self) -> &SectionId {
        &self.entry
    }

    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id.as_str() == id)
    }

    #[must_use]
    pub fn choice(&self, key: &str) -> Option<&ChoiceBlock> {
        self.sections
            .iter()
            .flat_map(Section::choices)
            .find(|choice| choice.choice_key.as_str() == key)
    }

    /// The section hosting the choice block with this key.
    #[must_use]
    pub fn section_containing_choice(&self, key: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.choices().any(|choice| choice.choice_key.as_str() == key))
    }

    /// Every written-response prompt of a section, journals first then their
    /// mission challenges, in block order.
    #[must_use]
    pub fn journal_prompts_in(&self, id: &str) -> Vec<JournalPrompt<'_>> {
        let Some(section) = self.section(id) else {
            return Vec::new();
        };
        let mut prompts = Vec::new();
        for journal in section.journals() {
            prompts.push(JournalPrompt {
                title: &journal.title,
                prompt: &journal.prompt,
                save_key: &journal.save_key,
            });
            if let Some(challenge) = &journal.mission_challenge {
                prompts.push(JournalPrompt {
                    title: &challenge.title,
                    prompt: &challenge.prompt,
                    save_key: &challenge.save_key,
                });
            }
        }
        prompts
    }
}

/// A borrowed view of one prompt that stores free text under `save_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalPrompt<'a> {
    pub title: &'a str,
    pub prompt: &'a str,
    pub save_key: &'a SaveKey,
}
