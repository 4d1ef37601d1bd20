//! Reveal engine: which sections are visible, and how learner actions change that.
//!
//! Every operation here is a synchronous mutation of a [`ProgressState`]; persistence
//! and rendering are left to the caller, driven by the returned [`RevealOutcome`].

use thiserror::Error;

use crate::model::{
    ChoiceKey, LessonScript, PendingChoice, ProgressState, SaveKey, Section, SectionId,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RevealError {
    #[error("no choice block with key `{0}`")]
    UnknownChoice(ChoiceKey),

    #[error("choice `{key}` has no option labelled `{label}`")]
    UnknownOption { key: ChoiceKey, label: String },
}

/// What an action did to the progress state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Nothing changed (idempotent advance, same-label reselect, confirm without pending).
    Unchanged,
    /// A section was appended to `revealed`.
    Revealed { section: SectionId },
    /// A selection was recorded and now awaits confirmation.
    ChoicePending { key: ChoiceKey, pruned: usize },
    /// A pending selection was confirmed; the view should scroll to `scroll_to`.
    ChoiceConfirmed {
        key: ChoiceKey,
        scroll_to: SectionId,
        pruned: usize,
    },
    /// Journal text was overwritten.
    JournalUpdated { key: SaveKey },
}

impl RevealOutcome {
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !matches!(self, RevealOutcome::Unchanged)
    }

    /// Section the view should bring into focus, if any.
    #[must_use]
    pub fn scroll_target(&self) -> Option<&SectionId> {
        match self {
            RevealOutcome::Revealed { section } => Some(section),
            RevealOutcome::ChoiceConfirmed { scroll_to, .. } => Some(scroll_to),
            _ => None,
        }
    }
}

/// Applies learner actions to a `ProgressState` under the lesson's branching rules.
#[derive(Debug, Clone, Copy)]
pub struct RevealEngine<'a> {
    script: &'a LessonScript,
}

impl<'a> RevealEngine<'a> {
    #[must_use]
    pub fn new(script: &'a LessonScript) -> Self {
        Self { script }
    }

    #[must_use]
    pub fn script(&self) -> &'a LessonScript {
        self.script
    }

    /// A fresh state for this script: only the entry section revealed.
    #[must_use]
    pub fn initial_state(&self) -> ProgressState {
        ProgressState::new(self.script.entry_id().clone())
    }

    /// Revealed sections in reveal order. Ids missing from the script are skipped.
    #[must_use]
    pub fn visible_sections(&self, state: &ProgressState) -> Vec<&'a Section> {
        state
            .revealed()
            .iter()
            .filter_map(|id| self.script.section(id.as_str()))
            .collect()
    }

    /// Appends `target` to `revealed` unless it is already there.
    pub fn advance(&self, state: &mut ProgressState, target: &SectionId) -> RevealOutcome {
        if state.push_revealed(target.clone()) {
            RevealOutcome::Revealed {
                section: target.clone(),
            }
        } else {
            RevealOutcome::Unchanged
        }
    }

    /// Records `label` for `key` and stages its feedback without revealing the branch.
    ///
    /// Switching away from a previously made selection first retracts every section
    /// revealed after the one hosting the choice.
    ///
    /// # Errors
    ///
    /// Returns `RevealError` when the key or label is not in the script; the state is
    /// left untouched.
    pub fn select_choice(
        &self,
        state: &mut ProgressState,
        key: &ChoiceKey,
        label: &str,
    ) -> Result<RevealOutcome, RevealError> {
        let choice = self
            .script
            .choice(key.as_str())
            .ok_or_else(|| RevealError::UnknownChoice(key.clone()))?;
        let option = choice
            .option(label)
            .ok_or_else(|| RevealError::UnknownOption {
                key: key.clone(),
                label: label.to_owned(),
            })?;

        let previous = state.choice(key.as_str()).map(str::to_owned);
        let pruned = match previous.as_deref() {
            Some(prev) if prev == label => return Ok(RevealOutcome::Unchanged),
            Some(_) => self.prune_to_host(state, key),
            None => 0,
        };

        state.set_choice(key.clone(), option.label.clone());
        state.set_pending(
            key.clone(),
            PendingChoice {
                feedback_text: option.feedback.clone(),
                continue_reveal: option.continue_reveal.clone(),
            },
        );

        Ok(RevealOutcome::ChoicePending {
            key: key.clone(),
            pruned,
        })
    }

    /// Confirms a pending selection and reveals its branch.
    ///
    /// The prune is re-applied here as well, which covers pending state that arrived
    /// through a resume code after later sections were already revealed.
    pub fn confirm_choice(&self, state: &mut ProgressState, key: &ChoiceKey) -> RevealOutcome {
        if state.pending_for(key.as_str()).is_none() {
            return RevealOutcome::Unchanged;
        }
        let pruned = self.prune_to_host(state, key);
        let Some(pending) = state.take_pending(key.as_str()) else {
            return RevealOutcome::Unchanged;
        };
        self.advance(state, &pending.continue_reveal);

        RevealOutcome::ChoiceConfirmed {
            key: key.clone(),
            scroll_to: pending.continue_reveal,
            pruned,
        }
    }

    /// Overwrites the stored response for `key`.
    pub fn record_journal_text(
        &self,
        state: &mut ProgressState,
        key: &SaveKey,
        text: impl Into<String>,
    ) -> RevealOutcome {
        state.set_journal(key.clone(), text.into());
        RevealOutcome::JournalUpdated { key: key.clone() }
    }

    fn prune_to_host(&self, state: &mut ProgressState, key: &ChoiceKey) -> usize {
        self.script
            .section_containing_choice(key.as_str())
            .map_or(0, |host| state.truncate_after(host.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::eco_responders;
    use crate::model::{Block, ChoiceBlock, ChoiceOption, ChoiceStatus};

    const NOAA: &str = "Analyze NOAA Weather Data First";
    const FIELD: &str = "Go Straight to the Fire Zone for Field Observation";

    fn ids(state: &ProgressState) -> Vec<&str> {
        state.revealed().iter().map(SectionId::as_str).collect()
    }

    fn section(id: &str, blocks: Vec<Block>) -> Section {
        Section {
            id: SectionId::new(id),
            title: id.to_uppercase(),
            blocks,
        }
    }

    /// A -> B (choice x: opt1 -> C, opt2 -> E), C -> D.
    fn branching_script() -> LessonScript {
        let option = |label: &str, target: &str| ChoiceOption {
            label: label.into(),
            feedback: format!("{label} feedback"),
            continue_reveal: SectionId::new(target),
        };
        let button = |target: &str| Block::ButtonReveal {
            label: "Next".into(),
            reveal: SectionId::new(target),
        };
        LessonScript::new(
            "Branching",
            vec![
                section("A", vec![button("B")]),
                section(
                    "B",
                    vec![Block::Choice(ChoiceBlock {
                        title: "Pick".into(),
                        choice_key: ChoiceKey::new("x"),
                        options: vec![option("opt1", "C"), option("opt2", "E")],
                    })],
                ),
                section("C", vec![button("D")]),
                section("D", vec![]),
                section("E", vec![]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn linear_happy_path() {
        let script = eco_responders().unwrap();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        let outcome = engine.advance(&mut state, &SectionId::new("the_call"));
        assert_eq!(ids(&state), ["hello", "the_call"]);
        assert_eq!(outcome.scroll_target().map(SectionId::as_str), Some("the_call"));
    }

    #[test]
    fn advance_is_idempotent() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        assert!(engine.advance(&mut state, &SectionId::new("B")).is_changed());
        assert_eq!(
            engine.advance(&mut state, &SectionId::new("B")),
            RevealOutcome::Unchanged
        );
        assert_eq!(ids(&state), ["A", "B"]);
    }

    #[test]
    fn selecting_does_not_reveal_branch() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        engine.advance(&mut state, &SectionId::new("B"));
        let key = ChoiceKey::new("x");

        engine.select_choice(&mut state, &key, "opt1").unwrap();

        assert_eq!(ids(&state), ["A", "B"]);
        assert_eq!(state.choice_status("x"), ChoiceStatus::Pending("opt1".into()));
        assert_eq!(
            state.pending_for("x").map(|p| p.feedback_text.as_str()),
            Some("opt1 feedback")
        );
    }

    #[test]
    fn switching_retracts_branch_and_everything_after() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        let key = ChoiceKey::new("x");
        engine.advance(&mut state, &SectionId::new("B"));
        engine.select_choice(&mut state, &key, "opt1").unwrap();
        engine.confirm_choice(&mut state, &key);
        engine.advance(&mut state, &SectionId::new("D"));
        assert_eq!(ids(&state), ["A", "B", "C", "D"]);

        let outcome = engine.select_choice(&mut state, &key, "opt2").unwrap();

        assert_eq!(outcome, RevealOutcome::ChoicePending { key: key.clone(), pruned: 2 });
        assert_eq!(ids(&state), ["A", "B"]);
        assert_eq!(state.choice_status("x"), ChoiceStatus::Pending("opt2".into()));
    }

    #[test]
    fn reselecting_confirmed_label_is_noop() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        let key = ChoiceKey::new("x");
        engine.advance(&mut state, &SectionId::new("B"));
        engine.select_choice(&mut state, &key, "opt1").unwrap();
        engine.confirm_choice(&mut state, &key);
        let before = state.clone();

        let outcome = engine.select_choice(&mut state, &key, "opt1").unwrap();

        assert_eq!(outcome, RevealOutcome::Unchanged);
        assert_eq!(state, before);
        assert_eq!(state.choice_status("x"), ChoiceStatus::Confirmed("opt1".into()));
    }

    #[test]
    fn confirm_without_pending_is_noop() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        assert_eq!(
            engine.confirm_choice(&mut state, &ChoiceKey::new("x")),
            RevealOutcome::Unchanged
        );
    }

    #[test]
    fn confirm_prunes_sections_restored_after_pending() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let value = serde_json::json!({
            "revealed": ["A", "B", "C", "D"],
            "choices": { "x": "opt2" },
            "pendingContinues": { "x": { "feedbackText": "fb", "continueReveal": "E" } }
        });
        let mut state = crate::model::sanitize(&value, script.entry_id());

        let outcome = engine.confirm_choice(&mut state, &ChoiceKey::new("x"));

        assert_eq!(ids(&state), ["A", "B", "E"]);
        assert_eq!(outcome.scroll_target().map(SectionId::as_str), Some("E"));
        assert_eq!(state.choice_status("x"), ChoiceStatus::Confirmed("opt2".into()));
    }

    #[test]
    fn unknown_choice_or_option_leaves_state() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        let before = state.clone();
        assert_eq!(
            engine.select_choice(&mut state, &ChoiceKey::new("nope"), "opt1"),
            Err(RevealError::UnknownChoice(ChoiceKey::new("nope")))
        );
        assert!(matches!(
            engine.select_choice(&mut state, &ChoiceKey::new("x"), "opt9"),
            Err(RevealError::UnknownOption { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn visible_sections_skip_dangling_ids() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let state = crate::model::sanitize(
            &serde_json::json!({ "revealed": ["A", "ghost", "B"] }),
            script.entry_id(),
        );
        let titles: Vec<&str> = engine
            .visible_sections(&state)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[test]
    fn branch_then_switch_scenario() {
        let script = eco_responders().unwrap();
        let engine = RevealEngine::new(&script);
        let key = ChoiceKey::new("the_call_path");
        let mut state = engine.initial_state();
        engine.advance(&mut state, &SectionId::new("the_call"));

        engine.select_choice(&mut state, &key, NOAA).unwrap();
        let expected_feedback = &script.choice("the_call_path").unwrap().options[0].feedback;
        assert_eq!(
            state.pending_for("the_call_path").map(|p| &p.feedback_text),
            Some(expected_feedback)
        );
        assert_eq!(ids(&state), ["hello", "the_call"]);

        engine.confirm_choice(&mut state, &key);
        assert_eq!(ids(&state), ["hello", "the_call", "noaa_path"]);

        engine.select_choice(&mut state, &key, FIELD).unwrap();
        assert_eq!(ids(&state), ["hello", "the_call"]);

        engine.confirm_choice(&mut state, &key);
        assert_eq!(ids(&state), ["hello", "the_call", "field_path"]);
        assert!(!state.is_revealed("noaa_path"));
    }

    #[test]
    fn journal_text_overwrites() {
        let script = branching_script();
        let engine = RevealEngine::new(&script);
        let mut state = engine.initial_state();
        let key = SaveKey::new("j");
        engine.record_journal_text(&mut state, &key, "first");
        engine.record_journal_text(&mut state, &key, "second");
        assert_eq!(state.journal("j"), Some("second"));
    }
}
